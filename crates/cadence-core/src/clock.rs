//! Time source used by the engine.
//!
//! Everything that reads the wall clock or waits goes through [`Clock`], so
//! tests can substitute [`VirtualClock`] and run thousands of ticks without
//! real sleeping.

use std::{
  sync::{Arc, Mutex},
  time::Duration,
};

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};

#[async_trait]
pub trait Clock: Send + Sync {
  /// Current wall time in UTC.
  fn now(&self) -> DateTime<Utc>;

  /// Suspend the current task for at least `duration`.
  async fn sleep(&self, duration: Duration);
}

// ─── System ──────────────────────────────────────────────────────────────────

/// Real time: `chrono` for the wall clock, tokio for sleeping.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
  fn now(&self) -> DateTime<Utc> { Utc::now() }

  async fn sleep(&self, duration: Duration) { tokio::time::sleep(duration).await }
}

// ─── Virtual ─────────────────────────────────────────────────────────────────

/// A manually driven clock.
///
/// `sleep` advances the clock by the requested duration and then yields to
/// the runtime, so a loop that sleeps between iterations runs at full speed
/// while observing consistent timestamps.
#[derive(Debug, Clone)]
pub struct VirtualClock {
  now: Arc<Mutex<DateTime<Utc>>>,
}

impl VirtualClock {
  pub fn new(start: DateTime<Utc>) -> Self {
    Self { now: Arc::new(Mutex::new(start)) }
  }

  /// Move the clock forward without yielding.
  pub fn advance(&self, duration: Duration) {
    let Ok(delta) = TimeDelta::from_std(duration) else {
      return;
    };
    let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
    *now += delta;
  }

  pub fn set(&self, instant: DateTime<Utc>) {
    *self.now.lock().unwrap_or_else(|e| e.into_inner()) = instant;
  }
}

#[async_trait]
impl Clock for VirtualClock {
  fn now(&self) -> DateTime<Utc> {
    *self.now.lock().unwrap_or_else(|e| e.into_inner())
  }

  async fn sleep(&self, duration: Duration) {
    self.advance(duration);
    tokio::task::yield_now().await;
  }
}

/// `true` when at least `required` has passed between `since` and `now`.
///
/// A `since` in the future (clock moved backwards) never counts as elapsed.
pub fn has_elapsed(
  since: DateTime<Utc>,
  now: DateTime<Utc>,
  required: Duration,
) -> bool {
  (now - since).to_std().map(|e| e >= required).unwrap_or(false)
}
