//! The `ActionStore` and `MostRecentStore` traits.
//!
//! Implemented by storage backends (e.g. `cadence-store`). The engine and the
//! admin API depend on these abstractions, not on any concrete backend.

use std::future::Future;

use chrono::{DateTime, Utc};

use crate::action::{
  ActionKind, MostRecentRecord, RecurringAction, SuperTriviaPatch, WeatherPatch,
  WordOfTheDayPatch,
};

// ─── Actions ─────────────────────────────────────────────────────────────────

/// Per-channel, per-kind recurring action configuration.
///
/// All methods return `Send` futures so the trait can be used from spawned
/// tokio tasks and axum handlers.
pub trait ActionStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Read one action. `None` means "not configured".
  ///
  /// A row whose hints cannot be interpreted comes back with
  /// `enabled == false` rather than as an error.
  fn get_action<'a>(
    &'a self,
    channel: &'a str,
    kind: ActionKind,
  ) -> impl Future<Output = Result<Option<RecurringAction>, Self::Error>> + Send + 'a;

  /// Every configured action for a channel, in kind order.
  fn list_actions<'a>(
    &'a self,
    channel: &'a str,
  ) -> impl Future<Output = Result<Vec<RecurringAction>, Self::Error>> + Send + 'a;

  /// Upsert by (channel, kind).
  fn set_action(
    &self,
    action: RecurringAction,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Partial updates ───────────────────────────────────────────────────

  /// Patch (or create, from defaults) the channel's weather action and
  /// return the stored result.
  fn configure_weather<'a>(
    &'a self,
    channel: &'a str,
    patch: WeatherPatch,
  ) -> impl Future<Output = Result<RecurringAction, Self::Error>> + Send + 'a;

  fn configure_word_of_the_day<'a>(
    &'a self,
    channel: &'a str,
    patch: WordOfTheDayPatch,
  ) -> impl Future<Output = Result<RecurringAction, Self::Error>> + Send + 'a;

  fn configure_super_trivia<'a>(
    &'a self,
    channel: &'a str,
    patch: SuperTriviaPatch,
  ) -> impl Future<Output = Result<RecurringAction, Self::Error>> + Send + 'a;
}

// ─── Most recent ─────────────────────────────────────────────────────────────

/// One row per channel recording the last fired action.
pub trait MostRecentStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn get<'a>(
    &'a self,
    channel: &'a str,
  ) -> impl Future<Output = Result<Option<MostRecentRecord>, Self::Error>> + Send + 'a;

  /// Blind upsert.
  fn set<'a>(
    &'a self,
    channel: &'a str,
    kind: ActionKind,
    fired_at: DateTime<Utc>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}
