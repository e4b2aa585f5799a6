//! SQL persistence for recurring actions and the per-channel most recent
//! action record.
//!
//! Two backends sit behind one small connection contract: an embedded SQLite
//! file on [`tokio_rusqlite`], and a PostgreSQL pool on [`sqlx`]. The stores
//! write every query once against that contract.

mod actions;
mod db;
mod encode;
mod most_recent;
mod schema;

pub mod error;

pub use actions::SqlActionStore;
pub use db::{Conn, Database, DatabaseKind, DbValue, Row};
pub use error::{Error, Result};
pub use most_recent::SqlMostRecentStore;
