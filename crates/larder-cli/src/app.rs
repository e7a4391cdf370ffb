//! Command handlers.
//!
//! Every handler runs after the session has been resolved and the command's
//! [`Guard`] has passed. Recipe- and user-scoped checks happen here, after
//! the target has been loaded, so "not found" is reported as such and never
//! as a permission problem.

use std::path::Path;

use anyhow::{Context, Result, bail};
use larder_core::{
  import::MealFeed,
  policy::{self, Decision, Guard},
  recipe::{Ingredient, NewRecipe, Recipe, RecipeId, RecipePatch},
  session::{AuthState, Lookup},
  store::RecipeQuery,
  subject::{Role, Subject, UserId},
};

use crate::{client::ApiClient, session_file::SessionFile};

// ─── Outcome ──────────────────────────────────────────────────────────────────

/// How a command ended, short of a transport or I/O failure.
#[derive(Debug, PartialEq, Eq)]
pub enum Outcome {
  Done,
  Denied(Decision),
  NotFound(String),
}

impl From<Decision> for Outcome {
  fn from(d: Decision) -> Self {
    match d {
      Decision::Allow => Self::Done,
      deny => Self::Denied(deny),
    }
  }
}

// ─── Input types ──────────────────────────────────────────────────────────────

/// Fields shared by `recipes new` and `recipes edit`.
#[derive(Debug, Default, Clone)]
pub struct RecipeFields {
  pub title:           Option<String>,
  pub category:        Option<String>,
  pub instructions:    Option<String>,
  pub image_url:       Option<String>,
  /// `name[:measure]` shorthand; replaces the whole list when given.
  pub ingredients:     Vec<String>,
  pub clear_category:  bool,
  pub clear_image_url: bool,
}

impl RecipeFields {
  fn parsed_ingredients(&self) -> Result<Option<Vec<Ingredient>>> {
    if self.ingredients.is_empty() {
      return Ok(None);
    }
    self
      .ingredients
      .iter()
      .map(|s| {
        Ingredient::parse_shorthand(s)
          .with_context(|| format!("invalid ingredient {s:?}; expected name[:measure]"))
      })
      .collect::<Result<Vec<_>>>()
      .map(Some)
  }

  fn into_patch(self) -> Result<RecipePatch> {
    let ingredients = self.parsed_ingredients()?;
    let category = if self.clear_category { Some(None) } else { self.category.map(Some) };
    let image_url = if self.clear_image_url { Some(None) } else { self.image_url.map(Some) };
    Ok(RecipePatch {
      title: self.title,
      category,
      ingredients,
      instructions: self.instructions,
      image_url,
    })
  }
}

// ─── App ──────────────────────────────────────────────────────────────────────

/// Top-level client state: the API, the stored session, and where we stand
/// with respect to authentication.
pub struct App {
  pub client:   ApiClient,
  pub sessions: SessionFile,
  pub auth:     AuthState,
}

impl App {
  pub fn new(client: ApiClient, sessions: SessionFile) -> Self {
    Self { client, sessions, auth: AuthState::Unresolved }
  }

  /// Resolve the stored session once.
  ///
  /// A token the server no longer knows is forgotten. One that could not be
  /// checked, say because the server is down, is kept for the next run.
  pub async fn resolve_session(&mut self) -> Result<()> {
    tracing::debug!("checking session");
    let token = self.sessions.load()?;
    let (auth, lookup) = AuthState::resolve(&self.client, token.as_ref()).await;
    self.auth = auth;

    if lookup == Lookup::Unknown {
      self.sessions.clear()?;
    }
    Ok(())
  }

  /// Evaluate a command's guard against the resolved subject.
  pub fn check(&self, guard: Guard) -> Result<Decision> { Ok(self.auth.check(guard)?) }

  fn subject(&self) -> Result<Option<&Subject>> { Ok(self.auth.subject()?) }

  /// The subject of a command whose guard already required one.
  fn require_subject(&self) -> Result<&Subject> {
    self
      .subject()?
      .context("command guard let an anonymous caller through")
  }

  // ── Session commands ──────────────────────────────────────────────────────

  pub async fn register(&self, username: &str, password: &str, chef: bool) -> Result<Outcome> {
    let role = if chef { Role::Chef } else { Role::User };
    let subject = self.client.register(username, password, role).await?;
    println!("Registered {} ({}). Run `larder login` to sign in.", subject.username, subject.role);
    Ok(Outcome::Done)
  }

  pub async fn login(&mut self, username: &str, password: &str) -> Result<Outcome> {
    let Some(login) = self.client.login(username, password).await? else {
      bail!("invalid username or password");
    };
    self.sessions.save(&login.token)?;
    tracing::debug!(path = %self.sessions.path().display(), "session saved");
    println!("Logged in as {} ({}).", login.subject.username, login.subject.role);
    self.auth = AuthState::Authenticated(login.subject);
    Ok(Outcome::Done)
  }

  pub async fn logout(&mut self) -> Result<Outcome> {
    if let Some(token) = self.sessions.load()? {
      // The local session is dropped even if the server is unreachable.
      if let Err(e) = self.client.logout(&token).await {
        tracing::warn!(error = %e, "server-side logout failed");
      }
    }
    self.sessions.clear()?;
    self.auth.logout();
    println!("Logged out.");
    Ok(Outcome::Done)
  }

  pub fn whoami(&self) -> Result<Outcome> {
    let me = self.require_subject()?;
    println!("{} ({}) {}", me.username, me.role, me.id);
    Ok(Outcome::Done)
  }

  // ── Recipes ───────────────────────────────────────────────────────────────

  pub async fn list_recipes(&self, mut query: RecipeQuery, mine: bool) -> Result<Outcome> {
    if mine {
      query.owner_id = Some(self.require_subject()?.id);
    }
    let recipes = self.client.list_recipes(&query).await?;
    if recipes.is_empty() {
      println!("No recipes.");
    }
    for r in &recipes {
      println!(
        "{}  {}{}",
        r.id,
        r.title,
        r.category.as_deref().map(|c| format!(" [{c}]")).unwrap_or_default()
      );
    }
    Ok(Outcome::Done)
  }

  pub async fn show_recipe(&self, id: RecipeId) -> Result<Outcome> {
    let Some(recipe) = self.client.get_recipe(id).await? else {
      return Ok(Outcome::NotFound(format!("recipe {id}")));
    };
    print!("{}", render_recipe(&recipe));

    // Hint at what the current subject may do, without deciding anything new.
    let me = self.subject()?;
    if policy::can_edit_recipe(me, &recipe) {
      println!("\nYou can edit or delete this recipe.");
    }
    Ok(Outcome::Done)
  }

  pub async fn new_recipe(&self, fields: RecipeFields) -> Result<Outcome> {
    let me = self.require_subject()?;
    let ingredients = fields.parsed_ingredients()?.unwrap_or_default();
    let Some(title) = fields.title else {
      bail!("--title is required");
    };

    let input = NewRecipe {
      category: fields.category,
      ingredients,
      instructions: fields.instructions.unwrap_or_default(),
      image_url: fields.image_url,
      ..NewRecipe::new(me.id, title)
    };
    let recipe = self.client.create_recipe(&input).await?;
    println!("Created {}  {}", recipe.id, recipe.title);
    Ok(Outcome::Done)
  }

  pub async fn edit_recipe(&self, id: RecipeId, fields: RecipeFields) -> Result<Outcome> {
    let patch = fields.into_patch()?;
    if patch.is_empty() {
      bail!("nothing to change; pass at least one field");
    }

    let Some(recipe) = self.client.get_recipe(id).await? else {
      return Ok(Outcome::NotFound(format!("recipe {id}")));
    };
    let me = self.subject()?;
    let decision = policy::authorize(me, policy::can_edit_recipe(me, &recipe));
    if !decision.is_allowed() {
      return Ok(decision.into());
    }

    match self.client.update_recipe(id, &patch).await? {
      Some(updated) => {
        println!("Updated {}  {}", updated.id, updated.title);
        Ok(Outcome::Done)
      }
      None => Ok(Outcome::NotFound(format!("recipe {id}"))),
    }
  }

  pub async fn delete_recipe(&self, id: RecipeId) -> Result<Outcome> {
    let Some(recipe) = self.client.get_recipe(id).await? else {
      return Ok(Outcome::NotFound(format!("recipe {id}")));
    };
    let me = self.subject()?;
    let decision = policy::authorize(me, policy::can_delete_recipe(me, &recipe));
    if !decision.is_allowed() {
      return Ok(decision.into());
    }

    if !self.client.delete_recipe(id).await? {
      return Ok(Outcome::NotFound(format!("recipe {id}")));
    }
    println!("Deleted {}  {}", recipe.id, recipe.title);
    Ok(Outcome::Done)
  }

  pub async fn import_recipes(&self, path: &Path) -> Result<Outcome> {
    let me = self.require_subject()?;
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("reading {}", path.display()))?;
    let records = MealFeed::from_json(&raw)
      .with_context(|| format!("parsing {}", path.display()))?
      .into_records();

    let mut imported = 0usize;
    for record in records {
      let input = record.into_new_recipe(me.id);
      if input.title.is_empty() {
        tracing::warn!(source_ref = ?input.source_ref, "skipping record without a title");
        continue;
      }
      let recipe = self.client.create_recipe(&input).await?;
      tracing::debug!(recipe = %recipe.id, source_ref = ?recipe.source_ref, "imported");
      imported += 1;
    }
    println!("Imported {imported} recipe(s) from {}.", path.display());
    Ok(Outcome::Done)
  }

  // ── Users ─────────────────────────────────────────────────────────────────

  pub async fn list_users(&self) -> Result<Outcome> {
    for u in self.client.list_users().await? {
      println!("{}  {:<20} {}", u.id, u.username, u.role);
    }
    Ok(Outcome::Done)
  }

  pub async fn set_role(&self, id: UserId, role: Role) -> Result<Outcome> {
    let Some(target) = self.client.get_user(id).await? else {
      return Ok(Outcome::NotFound(format!("user {id}")));
    };
    let me = self.subject()?;
    let decision = policy::authorize(me, policy::can_assign_role(me, &target));
    if !decision.is_allowed() {
      return Ok(decision.into());
    }

    let updated = self.client.set_role(id, role).await?;
    println!("{} is now {}.", updated.username, updated.role);
    Ok(Outcome::Done)
  }
}

/// Multi-line, human-readable recipe.
pub fn render_recipe(r: &Recipe) -> String {
  let mut out = format!("{}\n", r.title);
  if let Some(c) = &r.category {
    out.push_str(&format!("Category: {c}\n"));
  }
  if let Some(src) = &r.source_ref {
    out.push_str(&format!("Imported from: {src}\n"));
  }
  if !r.ingredients.is_empty() {
    out.push_str("\nIngredients:\n");
    for i in &r.ingredients {
      match &i.measure {
        Some(m) => out.push_str(&format!("  - {} ({m})\n", i.name)),
        None => out.push_str(&format!("  - {}\n", i.name)),
      }
    }
  }
  if !r.instructions.is_empty() {
    out.push_str(&format!("\n{}\n", r.instructions));
  }
  out
}
