//! `GET /languages`: languages usable for word of the day.

use axum::{Json, extract::State};
use cadence_core::{
  language::{LanguageEntry, LanguageFilter},
  store::{ActionStore, MostRecentStore},
};

use crate::ApiState;

pub async fn list<A, M>(State(state): State<ApiState<A, M>>) -> Json<Vec<LanguageEntry>>
where
  A: ActionStore,
  M: MostRecentStore,
{
  Json(state.languages.entries(LanguageFilter::wotd()))
}
