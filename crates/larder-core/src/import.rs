//! Upstream meal-catalog records and their normalisation into [`NewRecipe`].
//!
//! Catalog dumps key the record id as either `idMeal` or `id`, and spread
//! ingredients across numbered `strIngredientN` / `strMeasureN` columns. All
//! of that is folded into one canonical shape here, before anything else in
//! the system sees the record.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use crate::{
  Result,
  recipe::{Ingredient, NewRecipe},
  subject::UserId,
};

/// A catalog file: either `{"meals": [...]}` or a bare array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum MealFeed {
  Wrapped { meals: Option<Vec<MealRecord>> },
  Bare(Vec<MealRecord>),
}

impl MealFeed {
  pub fn from_json(raw: &str) -> Result<Self> { Ok(serde_json::from_str(raw)?) }

  pub fn into_records(self) -> Vec<MealRecord> {
    match self {
      Self::Wrapped { meals } => meals.unwrap_or_default(),
      Self::Bare(meals) => meals,
    }
  }
}

/// One upstream record, as loosely shaped as the catalog publishes it.
#[derive(Debug, Deserialize)]
pub struct MealRecord {
  #[serde(alias = "idMeal", default, deserialize_with = "string_or_number")]
  pub id:           Option<String>,
  /// Empty when the record has none; such records are not importable.
  #[serde(alias = "strMeal", default)]
  pub title:        String,
  #[serde(alias = "strCategory")]
  pub category:     Option<String>,
  #[serde(alias = "strInstructions", default)]
  pub instructions: Option<String>,
  #[serde(alias = "strMealThumb", alias = "image")]
  pub image_url:    Option<String>,
  /// Everything else, including the numbered ingredient columns.
  #[serde(flatten)]
  pub rest:         BTreeMap<String, Value>,
}

impl MealRecord {
  /// Ingredients in column order, skipping blank slots.
  pub fn ingredients(&self) -> Vec<Ingredient> {
    let mut numbered: Vec<(u32, Ingredient)> = self
      .rest
      .iter()
      .filter_map(|(key, value)| {
        let n: u32 = key.strip_prefix("strIngredient")?.parse().ok()?;
        let name = non_blank(value)?;
        let measure = self
          .rest
          .get(&format!("strMeasure{n}"))
          .and_then(non_blank);
        Some((n, Ingredient { name, measure }))
      })
      .collect();
    numbered.sort_by_key(|(n, _)| *n);
    numbered.into_iter().map(|(_, i)| i).collect()
  }

  /// Normalise into a recipe owned by `owner_id`. The upstream id becomes
  /// the recipe's `source_ref`.
  pub fn into_new_recipe(self, owner_id: UserId) -> NewRecipe {
    let ingredients = self.ingredients();
    NewRecipe {
      owner_id,
      title: self.title.trim().to_owned(),
      category: self.category.filter(|c| !c.trim().is_empty()),
      ingredients,
      instructions: self.instructions.unwrap_or_default(),
      image_url: self.image_url.filter(|u| !u.trim().is_empty()),
      source_ref: self.id,
    }
  }
}

fn non_blank(value: &Value) -> Option<String> {
  value
    .as_str()
    .map(str::trim)
    .filter(|s| !s.is_empty())
    .map(str::to_owned)
}

fn string_or_number<'de, D>(de: D) -> std::result::Result<Option<String>, D::Error>
where
  D: serde::Deserializer<'de>,
{
  Ok(match Option::<Value>::deserialize(de)? {
    Some(Value::String(s)) => Some(s),
    Some(Value::Number(n)) => Some(n.to_string()),
    _ => None,
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  const CATALOG: &str = r#"{
    "meals": [{
      "idMeal": "52772",
      "strMeal": "Teriyaki Chicken Casserole",
      "strCategory": "Chicken",
      "strInstructions": "Preheat oven to 350.",
      "strMealThumb": "https://example.com/t.jpg",
      "strIngredient2": "chicken thighs",
      "strMeasure2": "2 lb",
      "strIngredient1": "soy sauce",
      "strMeasure1": "3/4 cup",
      "strIngredient3": "",
      "strMeasure3": " ",
      "strIngredient10": "rice",
      "strMeasure10": null,
      "strTags": "Meat,Casserole"
    }]
  }"#;

  #[test]
  fn meal_db_record_normalises() {
    let records = MealFeed::from_json(CATALOG).unwrap().into_records();
    assert_eq!(records.len(), 1);

    let owner = UserId::new();
    let recipe = records.into_iter().next().unwrap().into_new_recipe(owner);

    assert_eq!(recipe.owner_id, owner);
    assert_eq!(recipe.source_ref.as_deref(), Some("52772"));
    assert_eq!(recipe.title, "Teriyaki Chicken Casserole");
    assert_eq!(recipe.category.as_deref(), Some("Chicken"));
    assert_eq!(recipe.image_url.as_deref(), Some("https://example.com/t.jpg"));

    let names: Vec<_> = recipe.ingredients.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, ["soy sauce", "chicken thighs", "rice"]);
    assert_eq!(recipe.ingredients[0].measure.as_deref(), Some("3/4 cup"));
    assert_eq!(recipe.ingredients[2].measure, None);
  }

  #[test]
  fn plain_id_key_and_bare_array() {
    let raw = r#"[{"id": 7, "title": "Toast"}]"#;
    let records = MealFeed::from_json(raw).unwrap().into_records();
    let recipe = records.into_iter().next().unwrap().into_new_recipe(UserId::new());
    assert_eq!(recipe.source_ref.as_deref(), Some("7"));
    assert_eq!(recipe.title, "Toast");
    assert!(recipe.ingredients.is_empty());
  }

  #[test]
  fn untitled_record_does_not_sink_the_feed() {
    let raw = r#"{"meals": [{"idMeal": "1"}, {"idMeal": "2", "strMeal": " Pie "}]}"#;
    let recipes: Vec<_> = MealFeed::from_json(raw)
      .unwrap()
      .into_records()
      .into_iter()
      .map(|r| r.into_new_recipe(UserId::new()))
      .collect();
    assert_eq!(recipes.len(), 2);
    assert!(recipes[0].title.is_empty());
    assert_eq!(recipes[0].source_ref.as_deref(), Some("1"));
    assert_eq!(recipes[1].title, "Pie");
  }

  #[test]
  fn empty_search_result_has_no_records() {
    let records = MealFeed::from_json(r#"{"meals": null}"#).unwrap().into_records();
    assert!(records.is_empty());
  }
}
