//! Handlers for `/channels/{channel}/actions` endpoints.
//!
//! | Method  | Path | Notes |
//! |---------|------|-------|
//! | `GET`   | `/channels/{channel}/actions` | Every configured action |
//! | `GET`   | `/channels/{channel}/actions/{kind}` | 404 if not configured |
//! | `PUT`   | `/channels/{channel}/actions/{kind}` | Replace; omitted fields take defaults |
//! | `PATCH` | `/channels/{channel}/actions/{kind}` | Update only the given fields |
//!
//! Bodies use the patch shape of the kind, e.g.
//! `{"enabled":true,"minutesBetween":30,"alertsOnly":false}` for weather or
//! `{"languageCode":"ja"}` for word of the day. `"minutesBetween": null`
//! resets the interval to the kind's default.

use axum::{
  Json,
  extract::{Path, State},
};
use cadence_core::{
  action::{ActionKind, ActionPatch, RecurringAction},
  store::{ActionStore, MostRecentStore},
};
use serde_json::Value;

use crate::{ApiState, error::ApiError};

fn parse_kind(kind: &str) -> Result<ActionKind, ApiError> { Ok(ActionKind::parse(kind)?) }

// ─── List ────────────────────────────────────────────────────────────────────

/// `GET /channels/{channel}/actions`
pub async fn list<A, M>(
  State(state): State<ApiState<A, M>>,
  Path(channel): Path<String>,
) -> Result<Json<Vec<RecurringAction>>, ApiError>
where
  A: ActionStore,
  M: MostRecentStore,
{
  let actions = state.actions.list_actions(&channel).await.map_err(ApiError::store)?;
  Ok(Json(actions))
}

// ─── Get one ─────────────────────────────────────────────────────────────────

/// `GET /channels/{channel}/actions/{kind}`
pub async fn get_one<A, M>(
  State(state): State<ApiState<A, M>>,
  Path((channel, kind)): Path<(String, String)>,
) -> Result<Json<RecurringAction>, ApiError>
where
  A: ActionStore,
  M: MostRecentStore,
{
  let kind = parse_kind(&kind)?;
  let action = state
    .actions
    .get_action(&channel, kind)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("no {kind} action for {channel}")))?;
  Ok(Json(action))
}

// ─── Replace ─────────────────────────────────────────────────────────────────

/// `PUT /channels/{channel}/actions/{kind}`
pub async fn replace<A, M>(
  State(state): State<ApiState<A, M>>,
  Path((channel, kind)): Path<(String, String)>,
  Json(body): Json<Value>,
) -> Result<Json<RecurringAction>, ApiError>
where
  A: ActionStore,
  M: MostRecentStore,
{
  let kind = parse_kind(&kind)?;
  let patch = ActionPatch::from_json(kind, body)?;
  let mut action = RecurringAction::default_for(&channel, kind);
  action.apply(patch, &state.languages)?;

  state.actions.set_action(action.clone()).await.map_err(ApiError::store)?;
  tracing::info!(channel = %action.channel, %kind, "action replaced");
  Ok(Json(action))
}

// ─── Update ──────────────────────────────────────────────────────────────────

/// `PATCH /channels/{channel}/actions/{kind}`
pub async fn update<A, M>(
  State(state): State<ApiState<A, M>>,
  Path((channel, kind)): Path<(String, String)>,
  Json(body): Json<Value>,
) -> Result<Json<RecurringAction>, ApiError>
where
  A: ActionStore,
  M: MostRecentStore,
{
  let kind = parse_kind(&kind)?;
  let patch = ActionPatch::from_json(kind, body)?;

  // Validate against a scratch action, so a bad language code or interval is
  // a 400 and never reaches the store. The store patches the stored row.
  RecurringAction::default_for(&channel, kind).apply(patch.clone(), &state.languages)?;

  let stored = match patch {
    ActionPatch::Weather(p) => state.actions.configure_weather(&channel, p).await,
    ActionPatch::WordOfTheDay(p) => state.actions.configure_word_of_the_day(&channel, p).await,
    ActionPatch::SuperTrivia(p) => state.actions.configure_super_trivia(&channel, p).await,
  }
  .map_err(ApiError::store)?;
  tracing::info!(channel = %stored.channel, %kind, "action updated");
  Ok(Json(stored))
}
