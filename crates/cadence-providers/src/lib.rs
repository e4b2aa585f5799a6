//! Concrete data providers for the Cadence engine.
//!
//! HTTP-backed providers (weather, word of the day, live checks) share one
//! [`reqwest`] client configuration and cache their answers in a
//! [`TimedCache`]. File-backed repositories (users, locations, settings) read
//! JSON once and keep it until their caches are cleared.

pub mod cache;
pub mod error;
mod file;
pub mod http;
pub mod locations;
pub mod settings;
pub mod trivia;
pub mod twitch;
pub mod users;
pub mod weather;
pub mod wotd;

pub use cache::TimedCache;
pub use error::{Error, Result};
pub use locations::JsonLocationsRepository;
pub use settings::{JsonSettingsRepository, Settings};
pub use trivia::SettingsTriviaGameBuilder;
pub use twitch::TwitchLiveProvider;
pub use users::JsonUsersRepository;
pub use weather::OpenWeatherProvider;
pub use wotd::TransparentWotdProvider;
