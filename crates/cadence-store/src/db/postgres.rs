//! Networked backend on a [`sqlx`] PostgreSQL pool.

use std::time::Duration;

use sqlx::{
  Column as _, PgConnection, Postgres, Row as _, TypeInfo as _, ValueRef as _,
  pool::PoolConnection,
  postgres::{PgArguments, PgPool, PgPoolOptions, PgRow},
  query::Query,
};

use super::{DbValue, Row};
use crate::{Error, Result};

const MAX_CONNECTIONS: u32 = 5;
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone)]
pub struct PostgresDatabase {
  pool: PgPool,
}

impl PostgresDatabase {
  pub async fn connect(url: &str) -> Result<Self> {
    let pool = PgPoolOptions::new()
      .max_connections(MAX_CONNECTIONS)
      .acquire_timeout(ACQUIRE_TIMEOUT)
      .connect(url)
      .await?;
    Ok(Self { pool })
  }

  pub(super) async fn acquire(&self) -> Result<PoolConnection<Postgres>> {
    Ok(self.pool.acquire().await?)
  }
}

/// Rewrite `?` placeholders to `$1, $2, …`, leaving quoted literals alone.
pub(crate) fn numbered_placeholders(sql: &str) -> String {
  let mut out = String::with_capacity(sql.len() + 8);
  let mut next = 1;
  let mut in_literal = false;
  for c in sql.chars() {
    match c {
      '\'' => {
        in_literal = !in_literal;
        out.push(c);
      }
      '?' if !in_literal => {
        out.push('$');
        out.push_str(&next.to_string());
        next += 1;
      }
      _ => out.push(c),
    }
  }
  out
}

fn bind_all<'q>(sql: &'q str, args: &'q [DbValue]) -> Query<'q, Postgres, PgArguments> {
  args.iter().fold(sqlx::query(sql), |query, arg| match arg {
    // An untyped NULL is bound as int8; Postgres casts it on assignment to
    // both integer and text columns.
    DbValue::Null => query.bind(None::<i64>),
    DbValue::Integer(v) => query.bind(*v),
    DbValue::Real(v) => query.bind(*v),
    DbValue::Text(v) => query.bind(v.as_str()),
    DbValue::Bool(v) => query.bind(*v),
  })
}

fn decode_row(row: &PgRow) -> Result<Row> {
  let mut cells = Vec::with_capacity(row.len());
  for (i, column) in row.columns().iter().enumerate() {
    if row.try_get_raw(i)?.is_null() {
      cells.push(DbValue::Null);
      continue;
    }
    let type_name = column.type_info().name().to_ascii_uppercase();
    let cell = match type_name.as_str() {
      "BOOL" => DbValue::Bool(row.try_get::<bool, _>(i)?),
      "INT2" => DbValue::Integer(i64::from(row.try_get::<i16, _>(i)?)),
      "INT4" => DbValue::Integer(i64::from(row.try_get::<i32, _>(i)?)),
      "INT8" => DbValue::Integer(row.try_get::<i64, _>(i)?),
      "FLOAT4" => DbValue::Real(f64::from(row.try_get::<f32, _>(i)?)),
      "FLOAT8" => DbValue::Real(row.try_get::<f64, _>(i)?),
      // citext is an extension type; its wire format is plain text.
      "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" | "CITEXT" => {
        DbValue::Text(row.try_get_unchecked::<String, _>(i)?)
      }
      _ => return Err(Error::UnsupportedColumnType(type_name)),
    };
    cells.push(cell);
  }
  Ok(Row(cells))
}

pub(super) async fn exec(
  conn: &mut PgConnection,
  sql: &str,
  args: &[DbValue],
) -> Result<u64> {
  let sql = numbered_placeholders(sql);
  let done = bind_all(&sql, args).execute(conn).await?;
  Ok(done.rows_affected())
}

pub(super) async fn fetch_row(
  conn: &mut PgConnection,
  sql: &str,
  args: &[DbValue],
) -> Result<Option<Row>> {
  let sql = numbered_placeholders(sql);
  let row = bind_all(&sql, args).fetch_optional(conn).await?;
  row.as_ref().map(decode_row).transpose()
}

pub(super) async fn fetch_rows(
  conn: &mut PgConnection,
  sql: &str,
  args: &[DbValue],
) -> Result<Vec<Row>> {
  let sql = numbered_placeholders(sql);
  let rows = bind_all(&sql, args).fetch_all(conn).await?;
  rows.iter().map(decode_row).collect()
}
