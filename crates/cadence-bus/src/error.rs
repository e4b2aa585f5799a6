//! Error type for `cadence-bus`.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid event: {0}")]
  InvalidEvent(&'static str),

  #[error("{field} = {value} is out of bounds")]
  OutOfBounds { field: &'static str, value: u64 },

  #[error("no tokio runtime is running")]
  NoRuntime,

  #[error("could not read {path}: {source}")]
  Io {
    path:   PathBuf,
    source: std::io::Error,
  },

  #[error("malformed chat band file: {0}")]
  Json(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
