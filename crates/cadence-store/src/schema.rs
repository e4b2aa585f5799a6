//! SQL schema for both backends.
//!
//! Executed once when a [`Database`](crate::db::Database) is opened. Every
//! statement is idempotent, so reopening an existing database is harmless.
//! Handle columns compare case-insensitively: `COLLATE NOCASE` in SQLite,
//! `citext` in PostgreSQL.

use crate::db::DatabaseKind;

const SQLITE: &[&str] = &[
  "CREATE TABLE IF NOT EXISTS recurringaction (
    channel         TEXT    NOT NULL COLLATE NOCASE,
    kind            TEXT    NOT NULL COLLATE NOCASE,  -- 'super_trivia' | 'weather' | 'word_of_the_day'
    enabled         INTEGER NOT NULL DEFAULT 1,
    minutes_between INTEGER DEFAULT NULL,
    hints           TEXT    DEFAULT NULL,             -- JSON object, kind-specific
    PRIMARY KEY (channel, kind)
  )",
  "CREATE TABLE IF NOT EXISTS mostrecentaction (
    channel  TEXT NOT NULL PRIMARY KEY COLLATE NOCASE,
    kind     TEXT NOT NULL,
    fired_at TEXT NOT NULL                            -- RFC 3339, UTC
  )",
];

const POSTGRES: &[&str] = &[
  "CREATE EXTENSION IF NOT EXISTS citext",
  "CREATE TABLE IF NOT EXISTS recurringaction (
    channel         public.citext NOT NULL,
    kind            public.citext NOT NULL,
    enabled         boolean       NOT NULL DEFAULT true,
    minutes_between integer       DEFAULT NULL,
    hints           text          DEFAULT NULL,
    PRIMARY KEY (channel, kind)
  )",
  "CREATE TABLE IF NOT EXISTS mostrecentaction (
    channel  public.citext NOT NULL PRIMARY KEY,
    kind     text          NOT NULL,
    fired_at text          NOT NULL
  )",
];

pub fn statements(kind: DatabaseKind) -> &'static [&'static str] {
  match kind {
    DatabaseKind::Sqlite => SQLITE,
    DatabaseKind::Postgres => POSTGRES,
  }
}
