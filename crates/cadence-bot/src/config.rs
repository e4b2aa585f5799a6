//! `config.toml` plus `CADENCE_*` environment overrides.

use std::{
  collections::HashMap,
  path::{Path, PathBuf},
};

use cadence_bus::BusConfig;
use cadence_engine::EngineConfig;
use serde::Deserialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseBackend {
  #[default]
  Sqlite,
  Postgres,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
  pub kind: DatabaseBackend,
  /// SQLite file, used when `kind = "sqlite"`.
  pub path: PathBuf,
  /// Connection URL, required when `kind = "postgres"`.
  pub url:  Option<String>,
}

impl Default for DatabaseConfig {
  fn default() -> Self {
    Self { kind: DatabaseBackend::Sqlite, path: PathBuf::from("cadence.sqlite"), url: None }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
  pub host:          String,
  pub port:          u16,
  pub username:      String,
  /// argon2 PHC string; generate one with `server --hash-password`. The
  /// admin API stays off while this is empty.
  pub password_hash: String,
}

impl Default for ApiConfig {
  fn default() -> Self {
    Self {
      host:          "127.0.0.1".into(),
      port:          8080,
      username:      "admin".into(),
      password_hash: String::new(),
    }
  }
}

impl ApiConfig {
  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  pub fn is_enabled(&self) -> bool { !self.password_hash.trim().is_empty() }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct BotConfig {
  pub database:            DatabaseConfig,
  pub engine:              EngineConfig,
  pub bus:                 BusConfig,
  pub api:                 ApiConfig,
  pub users_file:          PathBuf,
  pub locations_file:      PathBuf,
  pub settings_file:       PathBuf,
  pub chat_band_file:      PathBuf,
  pub openweather_api_key: String,
  pub twitch_client_id:    String,
  pub twitch_app_token:    String,
}

impl Default for BotConfig {
  fn default() -> Self {
    Self {
      database:            DatabaseConfig::default(),
      engine:              EngineConfig::default(),
      bus:                 BusConfig::default(),
      api:                 ApiConfig::default(),
      users_file:          PathBuf::from("users.json"),
      locations_file:      PathBuf::from("locations.json"),
      settings_file:       PathBuf::from("settings.json"),
      chat_band_file:      PathBuf::from("chatBand.json"),
      openweather_api_key: String::new(),
      twitch_client_id:    String::new(),
      twitch_app_token:    String::new(),
    }
  }
}

/// Read `path` (optional) and overlay `CADENCE_*` variables, e.g.
/// `CADENCE_API__PORT=9000`. `env` replaces the process environment when
/// given.
pub fn load_config(
  path: &Path,
  env: Option<HashMap<String, String>>,
) -> Result<BotConfig, config::ConfigError> {
  config::Config::builder()
    .add_source(config::File::from(path).required(false))
    .add_source(
      config::Environment::with_prefix("CADENCE")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
        .source(env),
    )
    .build()?
    .try_deserialize()
}
