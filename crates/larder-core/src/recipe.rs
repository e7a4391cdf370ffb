//! Recipe — the only resource the access policy reasons about.
//!
//! A recipe has exactly one owner, fixed when it is created. Nothing in this
//! module can change `owner_id` after the fact: [`RecipePatch`] has no owner
//! field.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, subject::UserId};

/// Opaque, unique identifier of a recipe.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct RecipeId(pub Uuid);

impl RecipeId {
  pub fn new() -> Self { Self(Uuid::new_v4()) }
}

impl Default for RecipeId {
  fn default() -> Self { Self::new() }
}

impl fmt::Display for RecipeId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { self.0.fmt(f) }
}

impl FromStr for RecipeId {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> { Ok(Self(Uuid::parse_str(s)?)) }
}

/// One line of an ingredient list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient {
  pub name:    String,
  /// Free-text quantity, e.g. "2 tbsp".
  pub measure: Option<String>,
}

impl Ingredient {
  /// Parse the `name[:measure]` shorthand used on the command line.
  pub fn parse_shorthand(s: &str) -> Option<Self> {
    let (name, measure) = match s.split_once(':') {
      Some((n, m)) => (n.trim(), Some(m.trim())),
      None => (s.trim(), None),
    };
    if name.is_empty() {
      return None;
    }
    Some(Self {
      name:    name.to_owned(),
      measure: measure.filter(|m| !m.is_empty()).map(str::to_owned),
    })
  }
}

/// A stored recipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
  pub id:           RecipeId,
  /// The subject who created the recipe. Immutable.
  pub owner_id:     UserId,
  pub title:        String,
  pub category:     Option<String>,
  pub ingredients:  Vec<Ingredient>,
  pub instructions: String,
  pub image_url:    Option<String>,
  /// Identifier in the upstream catalog this recipe was imported from.
  pub source_ref:   Option<String>,
  pub created_at:   DateTime<Utc>,
  pub updated_at:   DateTime<Utc>,
}

/// Input to [`crate::store::RecipeStore::add_recipe`].
/// Identifiers and timestamps are always assigned by the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewRecipe {
  pub owner_id:     UserId,
  pub title:        String,
  pub category:     Option<String>,
  #[serde(default)]
  pub ingredients:  Vec<Ingredient>,
  #[serde(default)]
  pub instructions: String,
  pub image_url:    Option<String>,
  pub source_ref:   Option<String>,
}

impl NewRecipe {
  /// Convenience constructor with all optional fields empty.
  pub fn new(owner_id: UserId, title: impl Into<String>) -> Self {
    Self {
      owner_id,
      title: title.into(),
      category: None,
      ingredients: Vec::new(),
      instructions: String::new(),
      image_url: None,
      source_ref: None,
    }
  }
}

/// A partial update. `None` leaves the field unchanged.
///
/// The optional columns take `Some(None)` to clear them; on the wire that is
/// an explicit `null`, while an absent key leaves the field alone.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecipePatch {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub title:        Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "present")]
  pub category:     Option<Option<String>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub ingredients:  Option<Vec<Ingredient>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub instructions: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "present")]
  pub image_url:    Option<Option<String>>,
}

/// A key that is present, even as `null`, becomes `Some`.
fn present<'de, D>(de: D) -> Result<Option<Option<String>>, D::Error>
where
  D: serde::Deserializer<'de>,
{
  Option::<String>::deserialize(de).map(Some)
}

impl RecipePatch {
  pub fn is_empty(&self) -> bool {
    self.title.is_none()
      && self.category.is_none()
      && self.ingredients.is_none()
      && self.instructions.is_none()
      && self.image_url.is_none()
  }

  /// Apply the patch in place and stamp `updated_at`.
  pub fn apply(self, recipe: &mut Recipe, now: DateTime<Utc>) {
    if let Some(title) = self.title {
      recipe.title = title;
    }
    if let Some(category) = self.category {
      recipe.category = category;
    }
    if let Some(ingredients) = self.ingredients {
      recipe.ingredients = ingredients;
    }
    if let Some(instructions) = self.instructions {
      recipe.instructions = instructions;
    }
    if let Some(image_url) = self.image_url {
      recipe.image_url = image_url;
    }
    recipe.updated_at = now;
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn recipe() -> Recipe {
    let at = Utc::now();
    Recipe {
      id:           RecipeId::new(),
      owner_id:     UserId::new(),
      title:        "Shakshuka".into(),
      category:     Some("Breakfast".into()),
      ingredients:  vec![],
      instructions: "Simmer.".into(),
      image_url:    None,
      source_ref:   None,
      created_at:   at,
      updated_at:   at,
    }
  }

  #[test]
  fn patch_touches_only_given_fields() {
    let mut r = recipe();
    let owner = r.owner_id;
    let later = r.updated_at + chrono::Duration::seconds(5);

    RecipePatch {
      title: Some("Green shakshuka".into()),
      ..Default::default()
    }
    .apply(&mut r, later);

    assert_eq!(r.title, "Green shakshuka");
    assert_eq!(r.category.as_deref(), Some("Breakfast"));
    assert_eq!(r.owner_id, owner);
    assert_eq!(r.updated_at, later);
  }

  #[test]
  fn patch_can_clear_optional_fields() {
    let mut r = recipe();
    r.image_url = Some("https://example.com/s.jpg".into());

    RecipePatch { category: Some(None), ..Default::default() }.apply(&mut r, Utc::now());
    assert_eq!(r.category, None);
    assert!(r.image_url.is_some());

    RecipePatch { image_url: Some(None), ..Default::default() }.apply(&mut r, Utc::now());
    assert_eq!(r.image_url, None);
  }

  #[test]
  fn patch_distinguishes_null_from_absent() {
    let patch: RecipePatch =
      serde_json::from_str(r#"{"category": null, "title": "Soup"}"#).unwrap();
    assert_eq!(patch.category, Some(None));
    assert_eq!(patch.image_url, None);
    assert!(!patch.is_empty());

    let patch: RecipePatch = serde_json::from_str(r#"{"image_url": "x.png"}"#).unwrap();
    assert_eq!(patch.image_url, Some(Some("x.png".into())));
    assert!(patch.category.is_none());

    // Unset fields stay off the wire so they cannot be read back as a clear.
    let wire = serde_json::to_value(RecipePatch {
      category: Some(None),
      ..Default::default()
    })
    .unwrap();
    assert_eq!(wire, serde_json::json!({ "category": null }));
  }

  #[test]
  fn ingredient_shorthand() {
    assert_eq!(
      Ingredient::parse_shorthand("eggs: 4"),
      Some(Ingredient { name: "eggs".into(), measure: Some("4".into()) })
    );
    assert_eq!(
      Ingredient::parse_shorthand("salt"),
      Some(Ingredient { name: "salt".into(), measure: None })
    );
    assert_eq!(Ingredient::parse_shorthand(" :2 cups"), None);
  }
}
