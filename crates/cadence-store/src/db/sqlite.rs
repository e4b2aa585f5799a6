//! Embedded backend on [`tokio_rusqlite`], so all database access runs on a
//! dedicated thread without blocking the async runtime.

use std::path::Path;

use rusqlite::types::{ToSqlOutput, Value, ValueRef};

use super::{DbValue, Row};
use crate::Result;

#[derive(Clone)]
pub struct SqliteDatabase {
  conn: tokio_rusqlite::Connection,
}

impl SqliteDatabase {
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    conn
      .call(|conn| {
        conn.execute_batch("PRAGMA journal_mode = WAL;")?;
        Ok(())
      })
      .await?;
    Ok(Self { conn })
  }

  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    Ok(Self { conn })
  }

  /// The connection is reference-counted; clones talk to the same thread.
  pub(super) fn connection(&self) -> tokio_rusqlite::Connection { self.conn.clone() }
}

impl rusqlite::ToSql for DbValue {
  fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
    Ok(match self {
      DbValue::Null => ToSqlOutput::Owned(Value::Null),
      DbValue::Integer(v) => ToSqlOutput::Owned(Value::Integer(*v)),
      DbValue::Real(v) => ToSqlOutput::Owned(Value::Real(*v)),
      DbValue::Text(v) => ToSqlOutput::Borrowed(ValueRef::Text(v.as_bytes())),
      DbValue::Bool(v) => ToSqlOutput::Owned(Value::Integer(i64::from(*v))),
    })
  }
}

fn decode_cell(value: ValueRef<'_>) -> DbValue {
  match value {
    ValueRef::Null => DbValue::Null,
    ValueRef::Integer(v) => DbValue::Integer(v),
    ValueRef::Real(v) => DbValue::Real(v),
    ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
      DbValue::Text(String::from_utf8_lossy(bytes).into_owned())
    }
  }
}

pub(super) async fn exec(
  conn: &tokio_rusqlite::Connection,
  sql: &str,
  args: &[DbValue],
) -> Result<u64> {
  let sql  = sql.to_owned();
  let args = args.to_vec();
  let changed = conn
    .call(move |conn| {
      let n = conn.execute(&sql, rusqlite::params_from_iter(args.iter()))?;
      Ok(n)
    })
    .await?;
  Ok(changed as u64)
}

pub(super) async fn fetch_rows(
  conn: &tokio_rusqlite::Connection,
  sql: &str,
  args: &[DbValue],
) -> Result<Vec<Row>> {
  let sql  = sql.to_owned();
  let args = args.to_vec();
  let rows = conn
    .call(move |conn| {
      let mut stmt = conn.prepare(&sql)?;
      let columns = stmt.column_count();
      let rows = stmt
        .query_map(rusqlite::params_from_iter(args.iter()), |row| {
          (0..columns)
            .map(|i| row.get_ref(i).map(decode_cell))
            .collect::<rusqlite::Result<Vec<_>>>()
            .map(Row)
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
      Ok(rows)
    })
    .await?;
  Ok(rows)
}
