//! Error type for `cadence-store`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] cadence_core::Error),

  #[error("sqlite error: {0}")]
  Sqlite(#[from] tokio_rusqlite::Error),

  #[error("postgres error: {0}")]
  Postgres(#[from] sqlx::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A row did not have the shape a query expected.
  #[error("row decode error: {0}")]
  Decode(String),

  #[error("unsupported column type: {0}")]
  UnsupportedColumnType(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
