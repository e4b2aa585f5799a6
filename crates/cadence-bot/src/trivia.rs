use cadence_core::{provider::TriviaGameMachine, trivia::SuperTriviaGame};

/// Stands in for the chat trivia runner, which lives outside this
/// repository: games are logged and discarded.
#[derive(Debug, Default)]
pub struct LoggingTriviaGameMachine;

impl TriviaGameMachine for LoggingTriviaGameMachine {
  fn submit(&self, game: SuperTriviaGame) {
    tracing::info!(
      channel = %game.channel,
      games = game.number_of_games,
      points = game.points_for_winning,
      seconds = game.seconds_to_live,
      attempts = game.per_user_attempts,
      "super trivia game submitted"
    );
  }
}
