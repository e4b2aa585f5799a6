//! Core types and trait definitions for the Cadence recurring action engine.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! All other crates depend on it; storage backends, data providers and the
//! engine itself meet at the traits defined here.

// We intentionally use native `async fn` in traits for the store seams.
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod action;
pub mod clock;
pub mod error;
pub mod event;
pub mod language;
pub mod provider;
pub mod store;
pub mod trivia;
pub mod user;
pub mod weather;
pub mod wotd;

pub use error::{Error, Result};

/// Normalise a Twitch handle to the form used as a key everywhere.
pub fn normalize_channel(channel: &str) -> String {
  channel.trim().to_lowercase()
}
