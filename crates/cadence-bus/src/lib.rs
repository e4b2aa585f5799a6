//! Websocket fan-out for overlay clients.
//!
//! [`WebsocketBus`] keeps a short, time-bounded log of JSON events and serves
//! it to every connected websocket client. [`ChatBandManager`] is one of its
//! producers: it turns key phrases typed in chat into instrument cues.

pub mod bus;
pub mod chat_band;
pub mod config;
pub mod error;

pub use bus::WebsocketBus;
pub use chat_band::{ChatBandInstrument, ChatBandManager, ChatBandMember};
pub use config::BusConfig;
pub use error::{Error, Result};
