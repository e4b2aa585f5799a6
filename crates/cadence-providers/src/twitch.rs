//! Live checks against the Twitch helix streams endpoint.

use std::{collections::HashMap, sync::Arc, time::Duration};

use async_trait::async_trait;
use cadence_core::{
  clock::Clock,
  normalize_channel,
  provider::{IsLiveProvider, MAX_LIVE_CHECK_HANDLES},
};
use reqwest::Client;
use serde::Deserialize;

use crate::{
  Result, TimedCache,
  http::{build_client, send_checked, trim_base},
};

pub const TWITCH_BASE_URL: &str = "https://api.twitch.tv";

const CACHE_TTL: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Deserialize)]
struct StreamsResponse {
  #[serde(default)]
  data: Vec<Stream>,
}

#[derive(Debug, Deserialize)]
struct Stream {
  user_login: String,
  #[serde(rename = "type", default)]
  kind:       String,
}

/// Authenticates with a statically configured app access token.
pub struct TwitchLiveProvider {
  client:    Client,
  client_id: String,
  app_token: String,
  base_url:  String,
  cache:     TimedCache<String, bool>,
}

impl TwitchLiveProvider {
  pub fn new(
    client_id: impl Into<String>,
    app_token: impl Into<String>,
    clock: Arc<dyn Clock>,
  ) -> Result<Self> {
    Ok(Self {
      client:    build_client()?,
      client_id: client_id.into(),
      app_token: app_token.into(),
      base_url:  TWITCH_BASE_URL.to_owned(),
      cache:     TimedCache::new(CACHE_TTL, clock),
    })
  }

  pub fn with_base_url(mut self, base_url: &str) -> Self {
    self.base_url = trim_base(base_url);
    self
  }

  pub fn clear_caches(&self) { self.cache.clear(); }

  /// One request for at most [`MAX_LIVE_CHECK_HANDLES`] handles.
  async fn fetch_chunk(&self, handles: &[String]) -> Result<HashMap<String, bool>> {
    let mut query: Vec<(&str, &str)> = handles.iter().map(|h| ("user_login", h.as_str())).collect();
    query.push(("first", "100"));

    let req = self
      .client
      .get(format!("{}/helix/streams", self.base_url))
      .header("Client-Id", &self.client_id)
      .bearer_auth(&self.app_token)
      .query(&query);
    let body: StreamsResponse = send_checked(req).await?.json().await?;

    let mut live: HashMap<String, bool> = handles.iter().map(|h| (h.clone(), false)).collect();
    for stream in body.data {
      if stream.kind.eq_ignore_ascii_case("live") {
        live.insert(normalize_channel(&stream.user_login), true);
      }
    }
    Ok(live)
  }
}

#[async_trait]
impl IsLiveProvider for TwitchLiveProvider {
  async fn is_live(&self, handles: &[String]) -> anyhow::Result<HashMap<String, bool>> {
    let mut answer = HashMap::with_capacity(handles.len());
    let mut unknown = Vec::new();
    for handle in handles.iter().map(|h| normalize_channel(h)) {
      match self.cache.get(&handle) {
        Some(live) => {
          answer.insert(handle, live);
        }
        None if !unknown.contains(&handle) => unknown.push(handle),
        None => {}
      }
    }

    for chunk in unknown.chunks(MAX_LIVE_CHECK_HANDLES) {
      let fetched = self.fetch_chunk(chunk).await?;
      for handle in chunk {
        let live = fetched.get(handle).copied().unwrap_or(false);
        self.cache.insert(handle.clone(), live);
        answer.insert(handle.clone(), live);
      }
    }
    Ok(answer)
  }
}
