//! Engine tunables and their bounds.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// All durations are whole seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
  pub refresh_sleep_seconds:          u64,
  pub queue_sleep_seconds:            u64,
  pub queue_timeout_seconds:          u64,
  pub super_trivia_countdown_seconds: u64,
  pub global_cooldown_seconds:        u64,
  pub queue_capacity:                 usize,
}

impl Default for EngineConfig {
  fn default() -> Self {
    Self {
      refresh_sleep_seconds:          90,
      queue_sleep_seconds:            3,
      queue_timeout_seconds:          3,
      super_trivia_countdown_seconds: 5,
      global_cooldown_seconds:        3 * 60,
      queue_capacity:                 256,
    }
  }
}

fn check(field: &'static str, value: u64, min: u64, max: u64) -> Result<()> {
  if (min..=max).contains(&value) {
    Ok(())
  } else {
    Err(Error::OutOfBounds { field, value, min, max })
  }
}

impl EngineConfig {
  pub fn validate(&self) -> Result<()> {
    check("refresh_sleep_seconds", self.refresh_sleep_seconds, 30, 600)?;
    check("queue_sleep_seconds", self.queue_sleep_seconds, 1, 10)?;
    check("queue_timeout_seconds", self.queue_timeout_seconds, 1, 5)?;
    check("super_trivia_countdown_seconds", self.super_trivia_countdown_seconds, 3, 10)?;
    check("queue_capacity", self.queue_capacity as u64, 1, u64::MAX)?;
    Ok(())
  }

  pub fn refresh_sleep(&self) -> Duration { Duration::from_secs(self.refresh_sleep_seconds) }

  pub fn queue_sleep(&self) -> Duration { Duration::from_secs(self.queue_sleep_seconds) }

  pub fn queue_timeout(&self) -> Duration { Duration::from_secs(self.queue_timeout_seconds) }

  pub fn super_trivia_countdown(&self) -> Duration {
    Duration::from_secs(self.super_trivia_countdown_seconds)
  }

  pub fn global_cooldown(&self) -> Duration { Duration::from_secs(self.global_cooldown_seconds) }
}
