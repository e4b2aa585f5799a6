//! [`SqlActionStore`], the SQL implementation of [`ActionStore`].

use std::{
  collections::HashSet,
  sync::{Arc, Mutex},
};

use cadence_core::{
  action::{
    ActionKind, ActionPatch, RecurringAction, SuperTriviaPatch, WeatherPatch,
    WordOfTheDayPatch,
  },
  language::LanguagesRepository,
  normalize_channel,
  store::ActionStore,
};

use crate::{
  Error, Result,
  db::{Database, DbValue},
  encode::{ACTION_COLUMNS, DecodedAction, RawAction, encode_hints, encode_kind},
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// Recurring action configuration backed by the `recurringaction` table.
///
/// Cloning is cheap; clones share the database handle and the set of rows
/// already reported as misconfigured.
#[derive(Clone)]
pub struct SqlActionStore {
  db:        Database,
  languages: LanguagesRepository,
  reported:  Arc<Mutex<HashSet<(String, ActionKind)>>>,
}

impl SqlActionStore {
  pub fn new(db: Database, languages: LanguagesRepository) -> Self {
    Self {
      db,
      languages,
      reported: Arc::new(Mutex::new(HashSet::new())),
    }
  }

  /// Log a misconfigured row once per process lifetime.
  fn report(&self, decoded: &DecodedAction) {
    let Some(problem) = &decoded.problem else {
      return;
    };
    let key = (decoded.action.channel.clone(), decoded.action.kind());
    let first = self
      .reported
      .lock()
      .unwrap_or_else(|e| e.into_inner())
      .insert(key);
    if first {
      tracing::warn!(
        channel = %decoded.action.channel,
        kind = %decoded.action.kind(),
        "recurring action is misconfigured and will be treated as disabled: {problem}"
      );
    }
  }

  fn forget_report(&self, channel: &str, kind: ActionKind) {
    self
      .reported
      .lock()
      .unwrap_or_else(|e| e.into_inner())
      .remove(&(channel.to_owned(), kind));
  }

  #[cfg(test)]
  pub(crate) fn reported_count(&self) -> usize {
    self.reported.lock().unwrap_or_else(|e| e.into_inner()).len()
  }

  fn decode(&self, raw: RawAction) -> Result<RecurringAction> {
    let decoded = raw.into_action(&self.languages)?;
    self.report(&decoded);
    Ok(decoded.action)
  }

  async fn fetch_raw(&self, channel: &str, kind: ActionKind) -> Result<Option<RawAction>> {
    let mut conn = self.db.connect().await?;
    let row = conn
      .fetch_row(
        &format!("SELECT {ACTION_COLUMNS} FROM recurringaction WHERE channel = ? AND kind = ?"),
        &[DbValue::from(channel), DbValue::from(encode_kind(kind))],
      )
      .await?;
    conn.close().await?;
    row.map(|row| RawAction::from_row(&row)).transpose()
  }

  /// Patches start from the stored row, not the disabled-when-misconfigured
  /// view `get_action` returns, so a partial update never loses settings.
  async fn configure(&self, channel: &str, patch: ActionPatch) -> Result<RecurringAction> {
    let channel = normalize_channel(channel);
    let kind = patch.kind();
    let mut action = match self.fetch_raw(&channel, kind).await? {
      Some(raw) => raw.into_stored(&self.languages)?,
      None => RecurringAction::default_for(&channel, kind),
    };
    action.apply(patch, &self.languages)?;
    self.set_action(action.clone()).await?;
    Ok(action)
  }
}

// ─── ActionStore impl ────────────────────────────────────────────────────────

impl ActionStore for SqlActionStore {
  type Error = Error;

  async fn get_action(&self, channel: &str, kind: ActionKind) -> Result<Option<RecurringAction>> {
    let channel = normalize_channel(channel);
    self
      .fetch_raw(&channel, kind)
      .await?
      .map(|raw| self.decode(raw))
      .transpose()
  }

  async fn list_actions(&self, channel: &str) -> Result<Vec<RecurringAction>> {
    let channel = normalize_channel(channel);
    let mut conn = self.db.connect().await?;
    let rows = conn
      .fetch_rows(
        &format!("SELECT {ACTION_COLUMNS} FROM recurringaction WHERE channel = ? ORDER BY kind"),
        &[DbValue::from(channel)],
      )
      .await?;
    conn.close().await?;

    let mut actions = Vec::with_capacity(rows.len());
    for row in rows {
      match self.decode(RawAction::from_row(&row)?) {
        Ok(action) => actions.push(action),
        Err(e) => tracing::warn!("skipping unreadable recurring action row: {e}"),
      }
    }
    Ok(actions)
  }

  async fn set_action(&self, action: RecurringAction) -> Result<()> {
    action.validate()?;
    let channel = normalize_channel(&action.channel);
    let kind    = action.kind();
    let hints   = encode_hints(&action.hints)?;

    let mut conn = self.db.connect().await?;
    conn
      .exec(
        "INSERT INTO recurringaction (channel, kind, enabled, minutes_between, hints)
         VALUES (?, ?, ?, ?, ?)
         ON CONFLICT (channel, kind) DO UPDATE SET
           enabled         = excluded.enabled,
           minutes_between = excluded.minutes_between,
           hints           = excluded.hints",
        &[
          DbValue::from(channel.as_str()),
          DbValue::from(encode_kind(kind)),
          DbValue::from(action.enabled),
          DbValue::from(action.minutes_between.map(i64::from)),
          DbValue::from(hints),
        ],
      )
      .await?;
    conn.close().await?;

    self.forget_report(&channel, kind);
    Ok(())
  }

  async fn configure_weather(&self, channel: &str, patch: WeatherPatch) -> Result<RecurringAction> {
    self.configure(channel, ActionPatch::Weather(patch)).await
  }

  async fn configure_word_of_the_day(
    &self,
    channel: &str,
    patch: WordOfTheDayPatch,
  ) -> Result<RecurringAction> {
    self.configure(channel, ActionPatch::WordOfTheDay(patch)).await
  }

  async fn configure_super_trivia(
    &self,
    channel: &str,
    patch: SuperTriviaPatch,
  ) -> Result<RecurringAction> {
    self.configure(channel, ActionPatch::SuperTrivia(patch)).await
  }
}
