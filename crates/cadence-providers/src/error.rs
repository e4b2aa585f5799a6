//! Error type for `cadence-providers`.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  /// Only the path is kept; query strings may carry API keys.
  #[error("{path} returned {status}")]
  Status {
    path:   String,
    status: reqwest::StatusCode,
  },

  #[error("xml error: {0}")]
  Xml(String),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("failed to read {path}: {source}")]
  Io {
    path:   PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("malformed response: {0}")]
  Malformed(String),

  #[error("unknown location id: {0:?}")]
  UnknownLocation(String),

  #[error("{0} has no word of the day source")]
  NoWotdSource(&'static str),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
