use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusConfig {
  pub host:          String,
  pub port:          u16,
  /// Pause between drains on each connection, and between server restarts.
  pub sleep_seconds: u64,
  /// Events older than this are never sent.
  pub ttl_seconds:   u64,
}

impl Default for BusConfig {
  fn default() -> Self {
    Self {
      host:          "0.0.0.0".into(),
      port:          8765,
      sleep_seconds: 5,
      ttl_seconds:   30,
    }
  }
}

impl BusConfig {
  pub fn validate(&self) -> Result<()> {
    if self.port == 0 {
      return Err(Error::OutOfBounds { field: "port", value: 0 });
    }
    if self.sleep_seconds < 3 {
      return Err(Error::OutOfBounds { field: "sleep_seconds", value: self.sleep_seconds });
    }
    if self.ttl_seconds == 0 {
      return Err(Error::OutOfBounds { field: "ttl_seconds", value: 0 });
    }
    Ok(())
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  pub fn sleep(&self) -> Duration { Duration::from_secs(self.sleep_seconds) }

  pub fn ttl(&self) -> Duration { Duration::from_secs(self.ttl_seconds) }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn defaults_are_valid() {
    let config = BusConfig::default();
    config.validate().unwrap();
    assert_eq!(config.address(), "0.0.0.0:8765");
  }

  #[test]
  fn aggressive_sleep_is_rejected() {
    let config = BusConfig { sleep_seconds: 2, ..Default::default() };
    assert!(matches!(
      config.validate(),
      Err(Error::OutOfBounds { field: "sleep_seconds", value: 2 })
    ));
  }

  #[test]
  fn zero_ttl_is_rejected() {
    let config = BusConfig { ttl_seconds: 0, ..Default::default() };
    assert!(config.validate().is_err());
  }
}
