//! Process-wide settings read from a JSON file.

use std::{path::PathBuf, time::Duration};

use async_trait::async_trait;
use cadence_core::provider::SettingsProvider;
use serde::Deserialize;
use tokio::sync::RwLock;

use crate::{Result, file::read_json};

/// Missing keys take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
  pub debug_logging_enabled:          bool,
  pub super_trivia_cooldown_seconds:  u64,
  pub super_trivia_game_points:       u32,
  pub super_trivia_game_seconds:      u32,
  pub super_trivia_per_user_attempts: u32,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      debug_logging_enabled:          false,
      super_trivia_cooldown_seconds:  300,
      super_trivia_game_points:       25,
      super_trivia_game_seconds:      60,
      super_trivia_per_user_attempts: 2,
    }
  }
}

/// Reads the file on first use and caches it until
/// [`SettingsProvider::clear_caches`].
///
/// An unreadable file is logged once and cached as all defaults, so a missing
/// file is not re-read on every lookup.
pub struct JsonSettingsRepository {
  path:  PathBuf,
  cache: RwLock<Option<Settings>>,
}

impl JsonSettingsRepository {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self { path: path.into(), cache: RwLock::new(None) }
  }

  /// Read the file, bypassing the cache and surfacing file errors.
  pub async fn read(&self) -> Result<Settings> { read_json(&self.path).await }

  pub async fn settings(&self) -> Settings {
    if let Some(settings) = self.cache.read().await.as_ref() {
      return settings.clone();
    }
    let mut cache = self.cache.write().await;
    if let Some(settings) = cache.as_ref() {
      return settings.clone();
    }
    let settings = self.read().await.unwrap_or_else(|e| {
      tracing::warn!(path = %self.path.display(), "using default settings: {e}");
      Settings::default()
    });
    *cache = Some(settings.clone());
    settings
  }
}

#[async_trait]
impl SettingsProvider for JsonSettingsRepository {
  async fn is_debug_logging_enabled(&self) -> bool {
    self.settings().await.debug_logging_enabled
  }

  async fn super_trivia_cooldown(&self) -> Duration {
    Duration::from_secs(self.settings().await.super_trivia_cooldown_seconds)
  }

  async fn clear_caches(&self) {
    *self.cache.write().await = None;
  }
}
