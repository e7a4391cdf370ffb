//! Core types and trait definitions for Larder.
//!
//! This crate is deliberately free of HTTP and database dependencies. It owns
//! the domain model, the [`store::RecipeStore`] abstraction, and the access
//! policy every client routes its permission checks through.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod error;
pub mod import;
pub mod paths;
pub mod policy;
pub mod recipe;
pub mod session;
pub mod store;
pub mod subject;

pub use error::{Error, Result};
