//! Super trivia games handed from the engine to the game machine.

use serde::Serialize;

/// Everything the game machine needs to run one super trivia round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuperTriviaGame {
  pub channel:             String,
  pub number_of_games:     u32,
  pub points_for_winning:  u32,
  pub seconds_to_live:     u32,
  pub per_user_attempts:   u32,
}
