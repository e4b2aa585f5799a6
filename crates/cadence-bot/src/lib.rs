//! Wiring for the Cadence server binary: configuration, the event listener
//! that connects the engine to chat and the websocket bus, and the chat
//! intake route.

pub mod chat;
pub mod config;
pub mod listener;
pub mod trivia;

pub use config::{ApiConfig, BotConfig, DatabaseBackend, DatabaseConfig, load_config};
pub use listener::RelayListener;
pub use trivia::LoggingTriviaGameMachine;
