//! A small connection contract over two SQL backends.
//!
//! Queries are written once with `?` placeholders and positional arguments;
//! each backend adapts them. Rows come back as positional [`DbValue`] cells.

mod postgres;
mod sqlite;

use std::path::Path;

use crate::{Error, Result, schema};

pub use postgres::PostgresDatabase;
pub use sqlite::SqliteDatabase;

// ─── Values ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum DbValue {
  Null,
  Integer(i64),
  Real(f64),
  Text(String),
  Bool(bool),
}

impl From<i64> for DbValue {
  fn from(v: i64) -> Self { DbValue::Integer(v) }
}

impl From<bool> for DbValue {
  fn from(v: bool) -> Self { DbValue::Bool(v) }
}

impl From<String> for DbValue {
  fn from(v: String) -> Self { DbValue::Text(v) }
}

impl From<&str> for DbValue {
  fn from(v: &str) -> Self { DbValue::Text(v.to_owned()) }
}

impl<T: Into<DbValue>> From<Option<T>> for DbValue {
  fn from(v: Option<T>) -> Self { v.map_or(DbValue::Null, Into::into) }
}

/// One result row, cells in `SELECT` order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row(pub Vec<DbValue>);

impl Row {
  fn cell(&self, idx: usize) -> Result<&DbValue> {
    self
      .0
      .get(idx)
      .ok_or_else(|| Error::Decode(format!("no column {idx} in row of {}", self.0.len())))
  }

  pub fn opt_text(&self, idx: usize) -> Result<Option<String>> {
    match self.cell(idx)? {
      DbValue::Null => Ok(None),
      DbValue::Text(s) => Ok(Some(s.clone())),
      other => Err(Error::Decode(format!("column {idx}: expected text, got {other:?}"))),
    }
  }

  pub fn text(&self, idx: usize) -> Result<String> {
    self
      .opt_text(idx)?
      .ok_or_else(|| Error::Decode(format!("column {idx}: unexpected NULL")))
  }

  pub fn opt_int(&self, idx: usize) -> Result<Option<i64>> {
    match self.cell(idx)? {
      DbValue::Null => Ok(None),
      DbValue::Integer(v) => Ok(Some(*v)),
      other => Err(Error::Decode(format!("column {idx}: expected integer, got {other:?}"))),
    }
  }

  /// Accepts native booleans and the 0/1 integers SQLite stores them as.
  pub fn bool(&self, idx: usize) -> Result<bool> {
    match self.cell(idx)? {
      DbValue::Bool(b) => Ok(*b),
      DbValue::Integer(v) => Ok(*v != 0),
      other => Err(Error::Decode(format!("column {idx}: expected bool, got {other:?}"))),
    }
  }
}

// ─── Database ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseKind {
  Sqlite,
  Postgres,
}

/// A handle to one of the supported backends.
///
/// Cloning is cheap; both variants share their underlying connection or pool.
#[derive(Clone)]
pub enum Database {
  Sqlite(SqliteDatabase),
  Postgres(PostgresDatabase),
}

impl Database {
  /// Open (or create) an SQLite file and initialise the schema.
  pub async fn open_sqlite(path: impl AsRef<Path>) -> Result<Self> {
    let db = Database::Sqlite(SqliteDatabase::open(path).await?);
    db.init_schema().await?;
    Ok(db)
  }

  /// An in-memory SQLite database; useful for testing.
  pub async fn open_sqlite_in_memory() -> Result<Self> {
    let db = Database::Sqlite(SqliteDatabase::open_in_memory().await?);
    db.init_schema().await?;
    Ok(db)
  }

  /// Connect a pool to `url` and initialise the schema.
  pub async fn connect_postgres(url: &str) -> Result<Self> {
    let db = Database::Postgres(PostgresDatabase::connect(url).await?);
    db.init_schema().await?;
    Ok(db)
  }

  pub fn kind(&self) -> DatabaseKind {
    match self {
      Database::Sqlite(_) => DatabaseKind::Sqlite,
      Database::Postgres(_) => DatabaseKind::Postgres,
    }
  }

  pub async fn connect(&self) -> Result<Conn> {
    match self {
      Database::Sqlite(db) => Ok(Conn::Sqlite(db.connection())),
      Database::Postgres(db) => Ok(Conn::Postgres(db.acquire().await?)),
    }
  }

  async fn init_schema(&self) -> Result<()> {
    let mut conn = self.connect().await?;
    for statement in schema::statements(self.kind()) {
      conn.exec(statement, &[]).await?;
    }
    conn.close().await
  }
}

// ─── Connection ──────────────────────────────────────────────────────────────

/// One connection. Every call runs as its own implicit transaction.
pub enum Conn {
  Sqlite(tokio_rusqlite::Connection),
  Postgres(sqlx::pool::PoolConnection<sqlx::Postgres>),
}

impl Conn {
  /// Execute a statement; returns the number of affected rows.
  pub async fn exec(&mut self, sql: &str, args: &[DbValue]) -> Result<u64> {
    match self {
      Conn::Sqlite(conn) => sqlite::exec(conn, sql, args).await,
      Conn::Postgres(conn) => postgres::exec(conn, sql, args).await,
    }
  }

  pub async fn fetch_row(&mut self, sql: &str, args: &[DbValue]) -> Result<Option<Row>> {
    match self {
      Conn::Sqlite(conn) => Ok(sqlite::fetch_rows(conn, sql, args).await?.into_iter().next()),
      Conn::Postgres(conn) => postgres::fetch_row(conn, sql, args).await,
    }
  }

  pub async fn fetch_rows(&mut self, sql: &str, args: &[DbValue]) -> Result<Vec<Row>> {
    match self {
      Conn::Sqlite(conn) => sqlite::fetch_rows(conn, sql, args).await,
      Conn::Postgres(conn) => postgres::fetch_rows(conn, sql, args).await,
    }
  }

  /// Release the connection. Pooled connections go back to the pool; the
  /// shared SQLite connection stays open for other callers.
  pub async fn close(self) -> Result<()> {
    match self {
      Conn::Sqlite(_) => Ok(()),
      Conn::Postgres(conn) => {
        drop(conn);
        Ok(())
      }
    }
  }
}
