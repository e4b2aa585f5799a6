//! `GET /channels/{channel}/most-recent`: the last action fired on a channel.

use axum::{
  Json,
  extract::{Path, State},
};
use cadence_core::{
  action::MostRecentRecord,
  store::{ActionStore, MostRecentStore},
};

use crate::{ApiState, error::ApiError};

pub async fn get_one<A, M>(
  State(state): State<ApiState<A, M>>,
  Path(channel): Path<String>,
) -> Result<Json<MostRecentRecord>, ApiError>
where
  A: ActionStore,
  M: MostRecentStore,
{
  let record = state
    .most_recent
    .get(&channel)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("nothing has fired on {channel}")))?;
  Ok(Json(record))
}
