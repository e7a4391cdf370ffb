//! The `RecipeStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g. `larder-store-sqlite`).
//! Higher layers (`larder-api`, `larder-server`) depend on this abstraction,
//! not on any concrete backend.
//!
//! The store makes no authorization decisions. Callers that need them go
//! through [`crate::policy`].

use std::future::Future;

use crate::{
  recipe::{NewRecipe, Recipe, RecipeId, RecipePatch},
  session::{Session, SessionToken},
  subject::{NewUser, Role, Subject, UserId},
};

// ─── Query type ──────────────────────────────────────────────────────────────

/// Parameters for [`RecipeStore::list_recipes`].
#[derive(Debug, Clone, Default)]
pub struct RecipeQuery {
  /// Case-insensitive substring match over title and instructions.
  pub text:     Option<String>,
  /// Exact category match.
  pub category: Option<String>,
  pub owner_id: Option<UserId>,
  pub limit:    Option<usize>,
  pub offset:   Option<usize>,
}

// ─── Errors ──────────────────────────────────────────────────────────────────

/// Backend errors, classified just enough for callers to react to them.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  /// The write collided with existing data, such as a taken username.
  fn is_conflict(&self) -> bool { false }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a Larder store backend.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait RecipeStore: Send + Sync {
  type Error: StoreError;

  // ── Users ─────────────────────────────────────────────────────────────

  /// Register a new user. Returns an error if the username is taken.
  fn add_user(
    &self,
    input: NewUser,
  ) -> impl Future<Output = Result<Subject, Self::Error>> + Send + '_;

  /// Retrieve a user by id. Returns `None` if not found.
  fn get_user(
    &self,
    id: UserId,
  ) -> impl Future<Output = Result<Option<Subject>, Self::Error>> + Send + '_;

  fn get_user_by_username<'a>(
    &'a self,
    username: &'a str,
  ) -> impl Future<Output = Result<Option<Subject>, Self::Error>> + Send + 'a;

  fn list_users(
    &self,
  ) -> impl Future<Output = Result<Vec<Subject>, Self::Error>> + Send + '_;

  /// Change a user's role. Returns `None` if the user does not exist.
  fn set_role(
    &self,
    id: UserId,
    role: Role,
  ) -> impl Future<Output = Result<Option<Subject>, Self::Error>> + Send + '_;

  /// Return the user if `password` matches verbatim.
  fn verify_credentials<'a>(
    &'a self,
    username: &'a str,
    password: &'a str,
  ) -> impl Future<Output = Result<Option<Subject>, Self::Error>> + Send + 'a;

  // ── Sessions ──────────────────────────────────────────────────────────

  /// Issue a fresh session token for `user_id`.
  fn open_session(
    &self,
    user_id: UserId,
  ) -> impl Future<Output = Result<Session, Self::Error>> + Send + '_;

  /// Resolve a stored session reference to its subject. Unknown tokens and
  /// tokens whose user no longer exists both yield `None`.
  fn resolve_session<'a>(
    &'a self,
    token: &'a SessionToken,
  ) -> impl Future<Output = Result<Option<Subject>, Self::Error>> + Send + 'a;

  /// Invalidate a session. Returns `false` if the token was unknown.
  fn close_session<'a>(
    &'a self,
    token: &'a SessionToken,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  // ── Recipes ───────────────────────────────────────────────────────────

  /// Persist a new recipe owned by `input.owner_id`.
  fn add_recipe(
    &self,
    input: NewRecipe,
  ) -> impl Future<Output = Result<Recipe, Self::Error>> + Send + '_;

  fn get_recipe(
    &self,
    id: RecipeId,
  ) -> impl Future<Output = Result<Option<Recipe>, Self::Error>> + Send + '_;

  /// Newest first.
  fn list_recipes<'a>(
    &'a self,
    query: &'a RecipeQuery,
  ) -> impl Future<Output = Result<Vec<Recipe>, Self::Error>> + Send + 'a;

  /// Apply `patch` and return the updated recipe, or `None` if absent.
  /// The owner is never changed.
  fn update_recipe(
    &self,
    id: RecipeId,
    patch: RecipePatch,
  ) -> impl Future<Output = Result<Option<Recipe>, Self::Error>> + Send + '_;

  /// Returns `false` if the recipe did not exist.
  fn delete_recipe(
    &self,
    id: RecipeId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;
}
