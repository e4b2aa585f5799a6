//! Per-key debounce, e.g. for super trivia started outside the scheduler.

use std::{sync::Arc, time::Duration};

use cadence_core::{clock::Clock, normalize_channel, provider::SettingsProvider};
use chrono::{DateTime, TimeDelta, Utc};
use dashmap::{DashMap, mapref::entry::Entry};

/// Keys are normalised like channel handles, so `"Streamer"` and
/// `"streamer"` share one slot.
pub struct CooldownMap {
  ready_at: DashMap<String, DateTime<Utc>>,
  clock:    Arc<dyn Clock>,
  settings: Arc<dyn SettingsProvider>,
}

fn delta(d: Duration) -> TimeDelta { TimeDelta::from_std(d).unwrap_or(TimeDelta::MAX) }

impl CooldownMap {
  pub fn new(clock: Arc<dyn Clock>, settings: Arc<dyn SettingsProvider>) -> Self {
    Self { ready_at: DashMap::new(), clock, settings }
  }

  /// True when `key` has never been updated or its cooldown has passed.
  pub fn is_ready(&self, key: &str) -> bool {
    let now = self.clock.now();
    self
      .ready_at
      .get(&normalize_channel(key))
      .is_none_or(|ready_at| now >= *ready_at)
  }

  pub fn update(&self, key: &str, cooldown: Duration) {
    let ready_at = self.clock.now() + delta(cooldown);
    self.ready_at.insert(normalize_channel(key), ready_at);
  }

  /// Check and start a new cooldown in one step. Returns whether `key` was
  /// ready.
  pub fn is_ready_and_update(&self, key: &str, cooldown: Duration) -> bool {
    let now = self.clock.now();
    match self.ready_at.entry(normalize_channel(key)) {
      Entry::Occupied(mut entry) => {
        if now < *entry.get() {
          return false;
        }
        entry.insert(now + delta(cooldown));
        true
      }
      Entry::Vacant(entry) => {
        entry.insert(now + delta(cooldown));
        true
      }
    }
  }

  /// [`update`](Self::update) with the settings' super trivia spacing.
  ///
  /// For callers that start super trivia outside the scheduler, such as a
  /// chat command. The server binary has no such path and only uses the
  /// explicit-duration methods.
  pub async fn update_with_default(&self, key: &str) {
    let cooldown = self.settings.super_trivia_cooldown().await;
    self.update(key, cooldown);
  }

  pub fn clear(&self) { self.ready_at.clear(); }
}
