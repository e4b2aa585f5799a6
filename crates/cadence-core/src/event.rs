//! Events produced by firing a recurring action.

use serde::Serialize;

use crate::{
  action::ActionKind, language::LanguageEntry, weather::WeatherReport,
  wotd::WordOfTheDayResponse,
};

/// A fired action, ready for the listener. Carries no timestamp; listeners
/// that need one add their own.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum RecurringEvent {
  SuperTrivia {
    channel: String,
  },
  Weather {
    channel:     String,
    alerts_only: bool,
    report:      WeatherReport,
  },
  WordOfTheDay {
    channel:  String,
    language: LanguageEntry,
    response: WordOfTheDayResponse,
  },
}

impl RecurringEvent {
  pub fn channel(&self) -> &str {
    match self {
      RecurringEvent::SuperTrivia { channel }
      | RecurringEvent::Weather { channel, .. }
      | RecurringEvent::WordOfTheDay { channel, .. } => channel,
    }
  }

  pub fn kind(&self) -> ActionKind {
    match self {
      RecurringEvent::SuperTrivia { .. } => ActionKind::SuperTrivia,
      RecurringEvent::Weather { .. } => ActionKind::Weather,
      RecurringEvent::WordOfTheDay { .. } => ActionKind::WordOfTheDay,
    }
  }

  /// The chat line a chat-sending listener posts for this event.
  pub fn to_message(&self) -> String {
    match self {
      RecurringEvent::SuperTrivia { .. } => {
        "🏁 A super trivia game is about to start, get ready!".to_owned()
      }
      RecurringEvent::Weather { alerts_only: true, report, .. } => {
        format!("🚨 {}", report.alerts.join(" "))
      }
      RecurringEvent::Weather { report, .. } => report.to_message(),
      RecurringEvent::WordOfTheDay { response, .. } => response.to_message(),
    }
  }
}
