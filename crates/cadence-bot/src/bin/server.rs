//! Cadence server binary.
//!
//! Reads `config.toml` (or the path given with `--config`) plus `CADENCE_*`
//! environment overrides, opens the action store, starts the websocket bus
//! and the recurring actions machine, and serves the admin API.
//!
//! # Password hash generation
//!
//! To generate the argon2 PHC string for `api.password_hash`:
//!
//! ```
//! cargo run -p cadence-bot --bin server -- --hash-password
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
use axum::Router;
use cadence_api::{ApiState, AuthConfig, api_router};
use cadence_bot::{
  DatabaseBackend, DatabaseConfig, LoggingTriviaGameMachine, RelayListener, chat::chat_router,
  load_config,
};
use cadence_bus::{ChatBandManager, WebsocketBus};
use cadence_core::{
  clock::{Clock, SystemClock},
  language::LanguagesRepository,
  provider::{SettingsProvider, UsersProvider},
};
use cadence_engine::{CooldownMap, Dependencies, RecurringActionsMachine};
use cadence_providers::{
  JsonLocationsRepository, JsonSettingsRepository, JsonUsersRepository, OpenWeatherProvider,
  SettingsTriviaGameBuilder, TransparentWotdProvider, TwitchLiveProvider,
};
use cadence_store::{Database, SqlActionStore, SqlMostRecentStore};
use clap::Parser;
use rand::{SeedableRng, rngs::StdRng};
use rand_core::OsRng;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Cadence recurring chat actions server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Print the argon2 hash for a password entered on stdin and exit.
  #[arg(long)]
  hash_password: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  if cli.hash_password {
    let password = read_password()?;
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
      .hash_password(password.as_bytes(), &salt)
      .map_err(|e| anyhow::anyhow!("argon2 error: {e}"))?
      .to_string();
    println!("{hash}");
    return Ok(());
  }

  let config = load_config(&cli.config, None).context("failed to read configuration")?;

  // ─── Storage ───────────────────────────────────────────────────────────────

  let languages = LanguagesRepository::new();
  let db = open_database(&config.database).await?;
  let actions = Arc::new(SqlActionStore::new(db.clone(), languages));
  let most_recent = Arc::new(SqlMostRecentStore::new(db));

  // ─── Providers ─────────────────────────────────────────────────────────────

  let clock: Arc<dyn Clock> = Arc::new(SystemClock);
  let settings = Arc::new(JsonSettingsRepository::new(expand_tilde(&config.settings_file)));
  let settings_dyn: Arc<dyn SettingsProvider> = settings.clone();
  let users: Arc<dyn UsersProvider> =
    Arc::new(JsonUsersRepository::new(expand_tilde(&config.users_file)));

  let deps = Dependencies {
    clock:          clock.clone(),
    actions:        actions.clone(),
    most_recent:    most_recent.clone(),
    users:          users.clone(),
    locations:      Arc::new(JsonLocationsRepository::new(expand_tilde(&config.locations_file))),
    weather:        Arc::new(
      OpenWeatherProvider::new(config.openweather_api_key.clone(), clock.clone())
        .context("failed to build weather client")?,
    ),
    wotd:           Arc::new(
      TransparentWotdProvider::new(clock.clone()).context("failed to build word client")?,
    ),
    is_live:        Arc::new(
      TwitchLiveProvider::new(
        config.twitch_client_id.clone(),
        config.twitch_app_token.clone(),
        clock.clone(),
      )
      .context("failed to build Twitch client")?,
    ),
    trivia_builder: Arc::new(SettingsTriviaGameBuilder::new(users, settings.clone())),
    trivia_machine: Arc::new(LoggingTriviaGameMachine),
  };

  // ─── Bus and engine ────────────────────────────────────────────────────────

  let bus = WebsocketBus::new(config.bus.clone(), clock.clone(), settings_dyn.clone())
    .context("invalid bus configuration")?;
  bus.start().context("failed to start websocket bus")?;

  let machine = RecurringActionsMachine::new(config.engine.clone(), deps, StdRng::from_entropy())
    .context("invalid engine configuration")?;
  machine.set_listener(Some(Arc::new(RelayListener::new(bus.clone()))));
  machine.start().context("failed to start recurring actions machine")?;

  let band = Arc::new(ChatBandManager::new(
    bus,
    CooldownMap::new(clock, settings_dyn),
    expand_tilde(&config.chat_band_file),
  ));

  // ─── Admin API ─────────────────────────────────────────────────────────────

  if !config.api.is_enabled() {
    tracing::warn!("api.password_hash is empty; admin API disabled");
    tokio::signal::ctrl_c().await.context("failed to wait for ctrl-c")?;
    return Ok(());
  }

  let auth = Arc::new(AuthConfig {
    username:      config.api.username.clone(),
    password_hash: config.api.password_hash.clone(),
  });
  let state = ApiState { actions, most_recent, languages };
  let app = Router::new()
    .nest("/api", api_router(state, auth.clone()))
    .nest("/chat", chat_router(band, auth));

  let address = config.api.address();
  tracing::info!("admin API listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app)
    .with_graceful_shutdown(async {
      tokio::signal::ctrl_c().await.ok();
    })
    .await
    .context("server error")?;

  Ok(())
}

async fn open_database(config: &DatabaseConfig) -> anyhow::Result<Database> {
  match config.kind {
    DatabaseBackend::Sqlite => {
      let path = expand_tilde(&config.path);
      Database::open_sqlite(&path)
        .await
        .with_context(|| format!("failed to open database at {path:?}"))
    }
    DatabaseBackend::Postgres => {
      let url = config
        .url
        .as_deref()
        .context("database.url is required for postgres")?;
      Database::connect_postgres(url)
        .await
        .context("failed to connect to postgres")
    }
  }
}

/// Read a password from stdin.
fn read_password() -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  print!("Password: ");
  io::stdout().flush().ok();
  let mut line = String::new();
  io::stdin().lock().read_line(&mut line)?;
  Ok(line.trim_end_matches(['\n', '\r']).to_string())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
