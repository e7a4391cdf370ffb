//! SQL schema for the Larder SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    user_id     TEXT PRIMARY KEY,
    username    TEXT NOT NULL UNIQUE,
    password    TEXT NOT NULL,       -- compared verbatim; not a credential store
    role        TEXT NOT NULL,       -- 'user' | 'chef' | 'admin'
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS sessions (
    token       TEXT PRIMARY KEY,
    user_id     TEXT NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS recipes (
    recipe_id     TEXT PRIMARY KEY,
    owner_id      TEXT NOT NULL REFERENCES users(user_id),
    title         TEXT NOT NULL,
    category      TEXT,
    ingredients   TEXT NOT NULL DEFAULT '[]',   -- JSON array of Ingredient
    instructions  TEXT NOT NULL DEFAULT '',
    image_url     TEXT,
    source_ref    TEXT,
    created_at    TEXT NOT NULL,
    updated_at    TEXT NOT NULL
);

-- Ownership is fixed at creation.
CREATE TRIGGER IF NOT EXISTS recipes_owner_immutable
BEFORE UPDATE OF owner_id ON recipes
WHEN NEW.owner_id IS NOT OLD.owner_id
BEGIN
    SELECT RAISE(ABORT, 'recipe owner is immutable');
END;

CREATE INDEX IF NOT EXISTS recipes_owner_idx    ON recipes(owner_id);
CREATE INDEX IF NOT EXISTS recipes_category_idx ON recipes(category);
CREATE INDEX IF NOT EXISTS recipes_created_idx  ON recipes(created_at);
CREATE INDEX IF NOT EXISTS sessions_user_idx    ON sessions(user_id);

PRAGMA user_version = 1;
";
