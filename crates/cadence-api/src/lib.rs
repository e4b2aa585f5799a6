//! JSON admin API for Cadence.
//!
//! Exposes an axum [`Router`] over any [`ActionStore`] / [`MostRecentStore`]
//! pair, behind HTTP basic auth. TLS is the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", cadence_api::api_router(state, auth))
//! ```

pub mod actions;
pub mod auth;
pub mod error;
pub mod languages;
pub mod most_recent;

use std::sync::Arc;

use axum::{Router, middleware, routing::get};
use cadence_core::{
  language::LanguagesRepository,
  store::{ActionStore, MostRecentStore},
};
use tower_http::trace::TraceLayer;

pub use auth::AuthConfig;
pub use error::ApiError;

/// Shared state threaded through all handlers.
pub struct ApiState<A, M> {
  pub actions:     Arc<A>,
  pub most_recent: Arc<M>,
  pub languages:   LanguagesRepository,
}

impl<A, M> Clone for ApiState<A, M> {
  fn clone(&self) -> Self {
    Self {
      actions:     self.actions.clone(),
      most_recent: self.most_recent.clone(),
      languages:   self.languages,
    }
  }
}

/// Build the API router. Every route requires `auth`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<A, M>(state: ApiState<A, M>, auth: Arc<AuthConfig>) -> Router<()>
where
  A: ActionStore + 'static,
  M: MostRecentStore + 'static,
{
  Router::new()
    // Actions
    .route("/channels/{channel}/actions", get(actions::list::<A, M>))
    .route(
      "/channels/{channel}/actions/{kind}",
      get(actions::get_one::<A, M>)
        .put(actions::replace::<A, M>)
        .patch(actions::update::<A, M>),
    )
    // History
    .route("/channels/{channel}/most-recent", get(most_recent::get_one::<A, M>))
    // Reference data
    .route("/languages", get(languages::list::<A, M>))
    .route_layer(middleware::from_fn_with_state(auth, auth::require_auth))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

#[cfg(test)]
mod tests;
