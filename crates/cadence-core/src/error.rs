//! Error types for `cadence-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unknown action kind: {0:?}")]
  UnknownActionKind(String),

  #[error("unknown language code: {0:?}")]
  UnknownLanguage(String),

  #[error("minutes between must be at least 1, got {0}")]
  InvalidInterval(i64),

  #[error("action for {channel} is {actual}, expected {expected}")]
  KindMismatch {
    channel:  String,
    expected: crate::action::ActionKind,
    actual:   crate::action::ActionKind,
  },

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
