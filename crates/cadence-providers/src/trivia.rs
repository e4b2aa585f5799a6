//! Builds super trivia games from user flags and the settings file.

use std::sync::Arc;

use async_trait::async_trait;
use cadence_core::{
  normalize_channel,
  provider::{TriviaGameBuilder, UsersProvider},
  trivia::SuperTriviaGame,
};

use crate::JsonSettingsRepository;

pub struct SettingsTriviaGameBuilder {
  users:    Arc<dyn UsersProvider>,
  settings: Arc<JsonSettingsRepository>,
}

impl SettingsTriviaGameBuilder {
  pub fn new(users: Arc<dyn UsersProvider>, settings: Arc<JsonSettingsRepository>) -> Self {
    Self { users, settings }
  }
}

#[async_trait]
impl TriviaGameBuilder for SettingsTriviaGameBuilder {
  async fn create_new_super_trivia_game(
    &self,
    channel: &str,
    number_of_games: u32,
  ) -> anyhow::Result<Option<SuperTriviaGame>> {
    anyhow::ensure!(number_of_games >= 1, "number of games must be at least 1");

    let channel = normalize_channel(channel);
    let Some(user) = self.users.get_user(&channel).await? else {
      tracing::debug!(%channel, "no user configured; not building a super trivia game");
      return Ok(None);
    };
    if !user.is_super_trivia_game_enabled {
      return Ok(None);
    }

    let settings = self.settings.settings().await;
    Ok(Some(SuperTriviaGame {
      channel,
      number_of_games,
      points_for_winning: settings.super_trivia_game_points,
      seconds_to_live: settings.super_trivia_game_seconds,
      per_user_attempts: settings.super_trivia_per_user_attempts,
    }))
  }
}
