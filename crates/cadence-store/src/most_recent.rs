//! [`SqlMostRecentStore`], the SQL implementation of [`MostRecentStore`].

use cadence_core::{
  action::{ActionKind, MostRecentRecord},
  normalize_channel,
  store::MostRecentStore,
};
use chrono::{DateTime, Utc};

use crate::{
  Error, Result,
  db::{Database, DbValue},
  encode::{MOST_RECENT_COLUMNS, decode_most_recent, encode_dt, encode_kind},
};

/// One row per channel in `mostrecentaction`. No in-memory cache.
#[derive(Clone)]
pub struct SqlMostRecentStore {
  db: Database,
}

impl SqlMostRecentStore {
  pub fn new(db: Database) -> Self { Self { db } }
}

impl MostRecentStore for SqlMostRecentStore {
  type Error = Error;

  async fn get(&self, channel: &str) -> Result<Option<MostRecentRecord>> {
    let mut conn = self.db.connect().await?;
    let row = conn
      .fetch_row(
        &format!("SELECT {MOST_RECENT_COLUMNS} FROM mostrecentaction WHERE channel = ?"),
        &[DbValue::from(normalize_channel(channel))],
      )
      .await?;
    conn.close().await?;
    row.as_ref().map(decode_most_recent).transpose()
  }

  async fn set(&self, channel: &str, kind: ActionKind, fired_at: DateTime<Utc>) -> Result<()> {
    let mut conn = self.db.connect().await?;
    conn
      .exec(
        "INSERT INTO mostrecentaction (channel, kind, fired_at)
         VALUES (?, ?, ?)
         ON CONFLICT (channel) DO UPDATE SET
           kind     = excluded.kind,
           fired_at = excluded.fired_at",
        &[
          DbValue::from(normalize_channel(channel)),
          DbValue::from(encode_kind(kind)),
          DbValue::from(encode_dt(fired_at)),
        ],
      )
      .await?;
    conn.close().await
  }
}
