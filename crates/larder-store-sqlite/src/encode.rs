//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings (microseconds, `Z`)
//! so they sort lexically. Ingredient lists are compact JSON. UUIDs are
//! hyphenated lowercase strings.

use chrono::{DateTime, SecondsFormat, SubsecRound as _, Utc};
use larder_core::{
  recipe::{Ingredient, Recipe, RecipeId},
  subject::{Role, Subject, UserId},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

/// The current time at the precision the store keeps, so values read back
/// compare equal to the ones handed out.
pub fn now() -> DateTime<Utc> { Utc::now().trunc_subsecs(6) }

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Role ─────────────────────────────────────────────────────────────────────

pub fn encode_role(r: Role) -> &'static str { r.as_str() }

pub fn decode_role(s: &str) -> Result<Role> { Ok(s.parse()?) }

// ─── Ingredients ──────────────────────────────────────────────────────────────

pub fn encode_ingredients(items: &[Ingredient]) -> Result<String> {
  Ok(serde_json::to_string(items)?)
}

pub fn decode_ingredients(s: &str) -> Result<Vec<Ingredient>> {
  Ok(serde_json::from_str(s)?)
}

// ─── Raw row types ────────────────────────────────────────────────────────────

/// A `users` row as read from SQLite, before decoding.
pub struct RawSubject {
  pub user_id:    String,
  pub username:   String,
  pub role:       String,
  pub created_at: String,
}

impl RawSubject {
  pub const COLUMNS: &'static str = "user_id, username, role, created_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:    row.get(0)?,
      username:   row.get(1)?,
      role:       row.get(2)?,
      created_at: row.get(3)?,
    })
  }

  pub fn into_subject(self) -> Result<Subject> {
    Ok(Subject {
      id:         UserId(decode_uuid(&self.user_id)?),
      username:   self.username,
      role:       decode_role(&self.role)?,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

/// A `recipes` row as read from SQLite, before decoding.
pub struct RawRecipe {
  pub recipe_id:    String,
  pub owner_id:     String,
  pub title:        String,
  pub category:     Option<String>,
  pub ingredients:  String,
  pub instructions: String,
  pub image_url:    Option<String>,
  pub source_ref:   Option<String>,
  pub created_at:   String,
  pub updated_at:   String,
}

impl RawRecipe {
  pub const COLUMNS: &'static str = "recipe_id, owner_id, title, category, \
     ingredients, instructions, image_url, source_ref, created_at, updated_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      recipe_id:    row.get(0)?,
      owner_id:     row.get(1)?,
      title:        row.get(2)?,
      category:     row.get(3)?,
      ingredients:  row.get(4)?,
      instructions: row.get(5)?,
      image_url:    row.get(6)?,
      source_ref:   row.get(7)?,
      created_at:   row.get(8)?,
      updated_at:   row.get(9)?,
    })
  }

  pub fn into_recipe(self) -> Result<Recipe> {
    Ok(Recipe {
      id:           RecipeId(decode_uuid(&self.recipe_id)?),
      owner_id:     UserId(decode_uuid(&self.owner_id)?),
      title:        self.title,
      category:     self.category,
      ingredients:  decode_ingredients(&self.ingredients)?,
      instructions: self.instructions,
      image_url:    self.image_url,
      source_ref:   self.source_ref,
      created_at:   decode_dt(&self.created_at)?,
      updated_at:   decode_dt(&self.updated_at)?,
    })
  }
}
