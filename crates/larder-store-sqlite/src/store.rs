//! [`SqliteStore`] — the SQLite implementation of [`RecipeStore`].

use std::path::Path;

use rusqlite::OptionalExtension as _;

use larder_core::{
  recipe::{NewRecipe, Recipe, RecipeId, RecipePatch},
  session::{Session, SessionToken},
  store::{RecipeQuery, RecipeStore},
  subject::{NewUser, Role, Subject, UserId},
};

use crate::{
  Error, Result,
  encode::{
    RawRecipe, RawSubject, encode_dt, encode_ingredients, encode_role, encode_uuid,
    now,
  },
  schema::SCHEMA,
};

/// Page size used when a query does not set `limit`.
const DEFAULT_LIMIT: usize = 100;

/// Escape `LIKE` wildcards so user text matches literally.
fn escape_like(text: &str) -> String {
  let mut out = String::with_capacity(text.len());
  for c in text.chars() {
    if matches!(c, '\\' | '%' | '_') {
      out.push('\\');
    }
    out.push(c);
  }
  out
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Larder store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  #[cfg(test)]
  pub(crate) fn conn_for_tests(&self) -> &tokio_rusqlite::Connection { &self.conn }

  /// Fetch a single user row by an arbitrary unique column.
  async fn user_where(&self, column: &'static str, value: String) -> Result<Option<Subject>> {
    let raw: Option<RawSubject> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {} FROM users WHERE {column} = ?1", RawSubject::COLUMNS),
            rusqlite::params![value],
            RawSubject::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawSubject::into_subject).transpose()
  }
}

// ─── RecipeStore impl ────────────────────────────────────────────────────────

impl RecipeStore for SqliteStore {
  type Error = Error;

  // ── Users ─────────────────────────────────────────────────────────────────

  async fn add_user(&self, input: NewUser) -> Result<Subject> {
    let subject = Subject {
      id:         UserId::new(),
      username:   input.username,
      role:       input.role,
      created_at: now(),
    };

    let id_str   = encode_uuid(subject.id.0);
    let username = subject.username.clone();
    let password = input.password;
    let role_str = encode_role(subject.role).to_owned();
    let at_str   = encode_dt(subject.created_at);

    let inserted: bool = self
      .conn
      .call(move |conn| {
        let taken = conn
          .query_row(
            "SELECT 1 FROM users WHERE username = ?1",
            rusqlite::params![username],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        if taken {
          return Ok(false);
        }

        conn.execute(
          "INSERT INTO users (user_id, username, password, role, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![id_str, username, password, role_str, at_str],
        )?;
        Ok(true)
      })
      .await?;

    if !inserted {
      return Err(Error::UsernameTaken(subject.username));
    }

    tracing::debug!(user = %subject.username, role = %subject.role, "user added");
    Ok(subject)
  }

  async fn get_user(&self, id: UserId) -> Result<Option<Subject>> {
    self.user_where("user_id", encode_uuid(id.0)).await
  }

  async fn get_user_by_username(&self, username: &str) -> Result<Option<Subject>> {
    self.user_where("username", username.to_owned()).await
  }

  async fn list_users(&self) -> Result<Vec<Subject>> {
    let raws: Vec<RawSubject> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {} FROM users ORDER BY username",
          RawSubject::COLUMNS
        ))?;
        let rows = stmt
          .query_map([], RawSubject::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSubject::into_subject).collect()
  }

  async fn set_role(&self, id: UserId, role: Role) -> Result<Option<Subject>> {
    let id_str   = encode_uuid(id.0);
    let role_str = encode_role(role).to_owned();

    let changed: usize = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE users SET role = ?2 WHERE user_id = ?1",
          rusqlite::params![id_str, role_str],
        )?)
      })
      .await?;

    if changed == 0 {
      return Ok(None);
    }
    self.get_user(id).await
  }

  async fn verify_credentials(
    &self,
    username: &str,
    password: &str,
  ) -> Result<Option<Subject>> {
    let username = username.to_owned();
    let password = password.to_owned();

    let raw: Option<RawSubject> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!(
              "SELECT {} FROM users WHERE username = ?1 AND password = ?2",
              RawSubject::COLUMNS
            ),
            rusqlite::params![username, password],
            RawSubject::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawSubject::into_subject).transpose()
  }

  // ── Sessions ──────────────────────────────────────────────────────────────

  async fn open_session(&self, user_id: UserId) -> Result<Session> {
    if self.get_user(user_id).await?.is_none() {
      return Err(Error::UserNotFound(user_id));
    }

    let session = Session {
      token: SessionToken::generate(),
      user_id,
      created_at: now(),
    };

    let token_str = session.token.as_str().to_owned();
    let user_str  = encode_uuid(user_id.0);
    let at_str    = encode_dt(session.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO sessions (token, user_id, created_at) VALUES (?1, ?2, ?3)",
          rusqlite::params![token_str, user_str, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(session)
  }

  async fn resolve_session(&self, token: &SessionToken) -> Result<Option<Subject>> {
    let token_str = token.as_str().to_owned();

    let raw: Option<RawSubject> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT u.user_id, u.username, u.role, u.created_at
             FROM sessions s
             JOIN users u ON u.user_id = s.user_id
             WHERE s.token = ?1",
            rusqlite::params![token_str],
            RawSubject::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawSubject::into_subject).transpose()
  }

  async fn close_session(&self, token: &SessionToken) -> Result<bool> {
    let token_str = token.as_str().to_owned();

    let removed: usize = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM sessions WHERE token = ?1",
          rusqlite::params![token_str],
        )?)
      })
      .await?;

    Ok(removed > 0)
  }

  // ── Recipes ───────────────────────────────────────────────────────────────

  async fn add_recipe(&self, input: NewRecipe) -> Result<Recipe> {
    if self.get_user(input.owner_id).await?.is_none() {
      return Err(Error::UserNotFound(input.owner_id));
    }

    let created = now();
    let recipe = Recipe {
      id:           RecipeId::new(),
      owner_id:     input.owner_id,
      title:        input.title,
      category:     input.category,
      ingredients:  input.ingredients,
      instructions: input.instructions,
      image_url:    input.image_url,
      source_ref:   input.source_ref,
      created_at:   created,
      updated_at:   created,
    };

    let id_str          = encode_uuid(recipe.id.0);
    let owner_str       = encode_uuid(recipe.owner_id.0);
    let title           = recipe.title.clone();
    let category        = recipe.category.clone();
    let ingredients_str = encode_ingredients(&recipe.ingredients)?;
    let instructions    = recipe.instructions.clone();
    let image_url       = recipe.image_url.clone();
    let source_ref      = recipe.source_ref.clone();
    let at_str          = encode_dt(created);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO recipes (
             recipe_id, owner_id, title, category, ingredients,
             instructions, image_url, source_ref, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)",
          rusqlite::params![
            id_str,
            owner_str,
            title,
            category,
            ingredients_str,
            instructions,
            image_url,
            source_ref,
            at_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    tracing::debug!(recipe = %recipe.id, owner = %recipe.owner_id, "recipe added");
    Ok(recipe)
  }

  async fn get_recipe(&self, id: RecipeId) -> Result<Option<Recipe>> {
    let id_str = encode_uuid(id.0);

    let raw: Option<RawRecipe> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {} FROM recipes WHERE recipe_id = ?1", RawRecipe::COLUMNS),
            rusqlite::params![id_str],
            RawRecipe::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawRecipe::into_recipe).transpose()
  }

  async fn list_recipes(&self, query: &RecipeQuery) -> Result<Vec<Recipe>> {
    let text_pattern = query.text.as_deref().map(|t| format!("%{}%", escape_like(t)));
    let category     = query.category.clone();
    let owner_str    = query.owner_id.map(|o| encode_uuid(o.0));
    // A negative LIMIT means "unbounded" to SQLite, so clamp instead of wrapping.
    let limit_val    = i64::try_from(query.limit.unwrap_or(DEFAULT_LIMIT)).unwrap_or(i64::MAX);
    let offset_val   = i64::try_from(query.offset.unwrap_or(0)).unwrap_or(i64::MAX);

    let raws: Vec<RawRecipe> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {} FROM recipes
           WHERE (?1 IS NULL OR title LIKE ?1 ESCAPE '\\' OR instructions LIKE ?1 ESCAPE '\\')
             AND (?2 IS NULL OR category = ?2)
             AND (?3 IS NULL OR owner_id = ?3)
           ORDER BY created_at DESC, rowid DESC
           LIMIT ?4 OFFSET ?5",
          RawRecipe::COLUMNS
        ))?;
        let rows = stmt
          .query_map(
            rusqlite::params![text_pattern, category, owner_str, limit_val, offset_val],
            RawRecipe::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawRecipe::into_recipe).collect()
  }

  async fn update_recipe(
    &self,
    id:    RecipeId,
    patch: RecipePatch,
  ) -> Result<Option<Recipe>> {
    let mut recipe = match self.get_recipe(id).await? {
      Some(r) => r,
      None    => return Ok(None),
    };
    patch.apply(&mut recipe, now());

    let id_str          = encode_uuid(recipe.id.0);
    let title           = recipe.title.clone();
    let category        = recipe.category.clone();
    let ingredients_str = encode_ingredients(&recipe.ingredients)?;
    let instructions    = recipe.instructions.clone();
    let image_url       = recipe.image_url.clone();
    let at_str          = encode_dt(recipe.updated_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE recipes
           SET title = ?2, category = ?3, ingredients = ?4,
               instructions = ?5, image_url = ?6, updated_at = ?7
           WHERE recipe_id = ?1",
          rusqlite::params![
            id_str,
            title,
            category,
            ingredients_str,
            instructions,
            image_url,
            at_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(Some(recipe))
  }

  async fn delete_recipe(&self, id: RecipeId) -> Result<bool> {
    let id_str = encode_uuid(id.0);

    let removed: usize = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM recipes WHERE recipe_id = ?1",
          rusqlite::params![id_str],
        )?)
      })
      .await?;

    Ok(removed > 0)
  }
}
