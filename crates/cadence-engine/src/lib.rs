//! The recurring action engine.
//!
//! [`RecurringActionsMachine`] runs two independent loops on the current
//! tokio runtime: a refresh loop that decides which action, if any, fires on
//! each live channel, and a [`ListenerPump`] that hands the resulting events
//! to the registered listener through an [`EventQueue`].

pub mod config;
pub mod cooldown;
pub mod error;
pub mod pump;
pub mod queue;
pub mod scheduler;

pub use config::EngineConfig;
pub use cooldown::CooldownMap;
pub use error::{Error, Result};
pub use pump::ListenerPump;
pub use queue::EventQueue;
pub use scheduler::{Dependencies, RecurringActionsMachine};

#[cfg(test)]
mod tests;
