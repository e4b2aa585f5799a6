//! Chat intake. The Twitch chat connection lives outside this process and
//! forwards each message here so the chat band can react to it.

use std::sync::Arc;

use axum::{Json, Router, extract::State, middleware, routing::post};
use cadence_api::{ApiError, AuthConfig, auth::require_auth};
use cadence_bus::ChatBandManager;
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;

#[derive(Debug, Deserialize)]
pub struct ChatMessage {
  pub channel: String,
  pub author:  String,
  pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ChatOutcome {
  pub played: bool,
}

pub fn chat_router(band: Arc<ChatBandManager>, auth: Arc<AuthConfig>) -> Router<()> {
  Router::new()
    .route("/messages", post(receive_message))
    .route_layer(middleware::from_fn_with_state(auth, require_auth))
    .layer(TraceLayer::new_for_http())
    .with_state(band)
}

async fn receive_message(
  State(band): State<Arc<ChatBandManager>>,
  Json(msg): Json<ChatMessage>,
) -> Result<Json<ChatOutcome>, ApiError> {
  let played = band
    .play_instrument_for_message(&msg.channel, &msg.author, &msg.message)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(ChatOutcome { played }))
}
