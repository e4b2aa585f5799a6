//! Per-channel user configuration, as consumed by the engine.

use serde::{Deserialize, Serialize};

/// One broadcaster the bot is configured for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
  /// Lowercased Twitch handle.
  pub handle:                        String,
  pub user_id:                       String,
  pub is_enabled:                    bool,
  pub are_recurring_actions_enabled: bool,
  pub location_id:                   Option<String>,
  pub is_super_trivia_game_enabled:  bool,
}

impl User {
  /// Recurring actions only run for channels with both flags set.
  pub fn wants_recurring_actions(&self) -> bool {
    self.is_enabled && self.are_recurring_actions_enabled
  }
}
