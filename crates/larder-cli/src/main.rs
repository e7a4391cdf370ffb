//! `larder` — command-line client for the Larder recipe service.
//!
//! # Usage
//!
//! ```
//! larder --url http://localhost:8080 login alice secret
//! larder recipes list --category Dessert
//! larder recipes edit 3f0c… --title "Better soup"
//! ```
//!
//! Exit status: 0 on success, 1 on error, 2 when the access policy denies
//! the command, 3 when its target does not exist.

mod app;
mod client;
mod feedback;
mod session_file;

use std::{path::PathBuf, process::ExitCode};

use anyhow::{Context, Result};
use app::{App, Outcome, RecipeFields};
use clap::{Args as ClapArgs, Parser, Subcommand};
use client::ApiClient;
use larder_core::{
  policy::{ADMINISTRATORS, Decision, Guard, RECIPE_MANAGERS},
  recipe::RecipeId,
  store::RecipeQuery,
  subject::{Role, UserId},
};
use serde::Deserialize;
use session_file::SessionFile;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

const DEFAULT_URL: &str = "http://localhost:8080";
const DEFAULT_SESSION_FILE: &str = "~/.larder/session.toml";

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "larder", about = "Browse and manage recipes on a Larder server")]
struct Args {
  /// Path to a TOML config file (url, session_file).
  #[arg(short, long, value_name = "FILE")]
  config: Option<PathBuf>,

  /// Base URL of the larder server (default: http://localhost:8080).
  #[arg(long, env = "LARDER_URL")]
  url: Option<String>,

  /// Where the session token is kept (default: ~/.larder/session.toml).
  #[arg(long, env = "LARDER_SESSION", value_name = "FILE")]
  session_file: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Create an account.
  Register {
    username: String,
    password: String,
    /// Register as a chef, able to publish recipes.
    #[arg(long)]
    chef:     bool,
  },
  /// Sign in and remember the session.
  Login { username: String, password: String },
  /// End the current session.
  Logout,
  /// Show the signed-in user.
  Whoami,
  #[command(subcommand)]
  Recipes(RecipeCommand),
  #[command(subcommand)]
  Users(UserCommand),
}

#[derive(Subcommand, Debug)]
enum RecipeCommand {
  /// List recipes, newest first.
  List {
    #[arg(long)]
    category: Option<String>,
    /// Case-insensitive match on title or instructions.
    #[arg(long)]
    text:     Option<String>,
    /// Only recipes you own.
    #[arg(long)]
    mine:     bool,
    #[arg(long)]
    limit:    Option<usize>,
    #[arg(long)]
    offset:   Option<usize>,
  },
  /// Show one recipe.
  Show { id: RecipeId },
  /// Publish a new recipe.
  New(FieldArgs),
  /// Change a recipe you own.
  Edit {
    id:     RecipeId,
    #[command(flatten)]
    fields: FieldArgs,
  },
  /// Delete a recipe you own.
  Delete { id: RecipeId },
  /// Import recipes from a meal catalog JSON file.
  Import { file: PathBuf },
}

#[derive(Subcommand, Debug)]
enum UserCommand {
  /// List all users.
  List,
  /// Change another user's role.
  SetRole { id: UserId, role: Role },
}

#[derive(ClapArgs, Debug)]
struct FieldArgs {
  #[arg(long)]
  title:           Option<String>,
  #[arg(long)]
  category:        Option<String>,
  #[arg(long)]
  instructions:    Option<String>,
  #[arg(long)]
  image_url:       Option<String>,
  /// Ingredient as `name[:measure]`; repeat for several.
  #[arg(short, long = "ingredient", value_name = "NAME[:MEASURE]")]
  ingredients:     Vec<String>,
  /// Remove the category (edit only).
  #[arg(long, conflicts_with = "category")]
  clear_category:  bool,
  /// Remove the image (edit only).
  #[arg(long, conflicts_with = "image_url")]
  clear_image_url: bool,
}

impl From<FieldArgs> for RecipeFields {
  fn from(a: FieldArgs) -> Self {
    Self {
      title:           a.title,
      category:        a.category,
      instructions:    a.instructions,
      image_url:       a.image_url,
      ingredients:     a.ingredients,
      clear_category:  a.clear_category,
      clear_image_url: a.clear_image_url,
    }
  }
}

impl Command {
  /// Coarse gate checked before the command runs. Per-recipe and per-user
  /// checks happen inside the handlers once the target is loaded.
  fn guard(&self) -> Guard {
    match self {
      Self::Register { .. } | Self::Login { .. } => Guard::Public,
      Self::Logout | Self::Whoami => Guard::Protected,
      Self::Recipes(cmd) => match cmd {
        RecipeCommand::List { mine: true, .. } => Guard::Protected,
        RecipeCommand::List { .. } | RecipeCommand::Show { .. } => Guard::Public,
        RecipeCommand::New(_) | RecipeCommand::Import { .. } => Guard::Roles(RECIPE_MANAGERS),
        RecipeCommand::Edit { .. } | RecipeCommand::Delete { .. } => Guard::Protected,
      },
      Self::Users(_) => Guard::Roles(ADMINISTRATORS),
    }
  }
}

// ─── Config file ──────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default)]
struct ConfigFile {
  url:          Option<String>,
  session_file: Option<PathBuf>,
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<ExitCode> {
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy(),
    )
    .init();

  let args = Args::parse();

  let file_cfg: ConfigFile = if let Some(path) = &args.config {
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&raw).context("parsing config file")?
  } else {
    ConfigFile::default()
  };

  // CLI flags override config file, which overrides defaults.
  let url = args
    .url
    .or(file_cfg.url)
    .unwrap_or_else(|| DEFAULT_URL.to_owned());
  let session_path = args
    .session_file
    .or(file_cfg.session_file)
    .unwrap_or_else(|| PathBuf::from(DEFAULT_SESSION_FILE));

  let mut app = App::new(ApiClient::new(url)?, SessionFile::new(session_path));

  // Login and register don't care who is signed in, so skip the round trip.
  if !matches!(args.command, Command::Login { .. } | Command::Register { .. }) {
    app.resolve_session().await?;
  }

  let decision = match args.command.guard() {
    Guard::Public => Decision::Allow,
    guard => app.check(guard)?,
  };
  let outcome = if decision.is_allowed() {
    run(&mut app, args.command).await?
  } else {
    Outcome::Denied(decision)
  };

  Ok(ExitCode::from(report(outcome)))
}

async fn run(app: &mut App, command: Command) -> Result<Outcome> {
  match command {
    Command::Register { username, password, chef } => app.register(&username, &password, chef).await,
    Command::Login { username, password } => app.login(&username, &password).await,
    Command::Logout => app.logout().await,
    Command::Whoami => app.whoami(),
    Command::Recipes(cmd) => match cmd {
      RecipeCommand::List { category, text, mine, limit, offset } => {
        let query = RecipeQuery { text, category, owner_id: None, limit, offset };
        app.list_recipes(query, mine).await
      }
      RecipeCommand::Show { id } => app.show_recipe(id).await,
      RecipeCommand::New(fields) => app.new_recipe(fields.into()).await,
      RecipeCommand::Edit { id, fields } => app.edit_recipe(id, fields.into()).await,
      RecipeCommand::Delete { id } => app.delete_recipe(id).await,
      RecipeCommand::Import { file } => app.import_recipes(&file).await,
    },
    Command::Users(cmd) => match cmd {
      UserCommand::List => app.list_users().await,
      UserCommand::SetRole { id, role } => app.set_role(id, role).await,
    },
  }
}

/// Print whatever the user needs to see and pick the exit status.
fn report(outcome: Outcome) -> u8 {
  match outcome {
    Outcome::Done | Outcome::Denied(Decision::Allow) => 0,
    Outcome::Denied(Decision::Deny { reason, redirect }) => {
      eprintln!("{}", feedback::denial_line(reason, redirect));
      2
    }
    Outcome::NotFound(what) => {
      eprintln!("Not found: {what}");
      3
    }
  }
}
