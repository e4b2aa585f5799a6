//! Collaborators the engine consumes.
//!
//! Each is a narrow async query. Implementations may fail for any reason
//! (network, rate limits, decoding); the engine logs the error and skips the
//! current channel, so errors are plain `anyhow::Error`s.

use std::{collections::HashMap, time::Duration};

use async_trait::async_trait;

use crate::{
  event::RecurringEvent,
  language::LanguageEntry,
  trivia::SuperTriviaGame,
  user::User,
  weather::{Location, WeatherReport},
  wotd::WordOfTheDayResponse,
};

/// Most handles a single live check may carry.
pub const MAX_LIVE_CHECK_HANDLES: usize = 100;

#[async_trait]
pub trait IsLiveProvider: Send + Sync {
  /// One batch call for up to [`MAX_LIVE_CHECK_HANDLES`] handles. Handles
  /// missing from the answer are treated as offline by callers.
  async fn is_live(&self, handles: &[String]) -> anyhow::Result<HashMap<String, bool>>;
}

#[async_trait]
pub trait WeatherProvider: Send + Sync {
  async fn fetch_weather(&self, location: &Location) -> anyhow::Result<WeatherReport>;
}

#[async_trait]
pub trait WotdProvider: Send + Sync {
  async fn fetch_wotd(&self, language: &LanguageEntry) -> anyhow::Result<WordOfTheDayResponse>;
}

#[async_trait]
pub trait LocationsProvider: Send + Sync {
  async fn get_location(&self, location_id: &str) -> anyhow::Result<Location>;
}

#[async_trait]
pub trait TriviaGameBuilder: Send + Sync {
  /// `Ok(None)` means the channel cannot host a game right now.
  async fn create_new_super_trivia_game(
    &self,
    channel: &str,
    number_of_games: u32,
  ) -> anyhow::Result<Option<SuperTriviaGame>>;
}

/// Runs trivia games in chat. Submission is fire-and-forget.
pub trait TriviaGameMachine: Send + Sync {
  fn submit(&self, game: SuperTriviaGame);
}

#[async_trait]
pub trait UsersProvider: Send + Sync {
  async fn get_all_enabled(&self) -> anyhow::Result<Vec<User>>;

  async fn get_user(&self, handle: &str) -> anyhow::Result<Option<User>>;
}

/// The single downstream consumer of recurring events.
#[async_trait]
pub trait RecurringEventListener: Send + Sync {
  async fn on_event(&self, event: RecurringEvent) -> anyhow::Result<()>;
}

/// Process-wide settings, read from a file and cached until cleared.
#[async_trait]
pub trait SettingsProvider: Send + Sync {
  async fn is_debug_logging_enabled(&self) -> bool;

  /// Default spacing between super trivia games on one channel.
  async fn super_trivia_cooldown(&self) -> Duration;

  async fn clear_caches(&self);
}
