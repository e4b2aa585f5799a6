//! Error type for `cadence-engine`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("{field} = {value} is out of bounds [{min}, {max}]")]
  OutOfBounds {
    field: &'static str,
    value: u64,
    min:   u64,
    max:   u64,
  },

  /// The listener has stalled and the queue stayed full for the whole
  /// enqueue timeout. The event is dropped.
  #[error("event queue is full")]
  QueueFull,

  #[error("no tokio runtime is running")]
  NoRuntime,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
