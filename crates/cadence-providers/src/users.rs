//! Users read from a JSON file keyed by Twitch handle.
//!
//! ```json
//! { "streamer": { "userId": "1234", "isEnabled": true,
//!                 "areRecurringActionsEnabled": true, "locationId": "tokyo",
//!                 "isSuperTriviaGameEnabled": true } }
//! ```

use std::{collections::BTreeMap, path::PathBuf, sync::Arc};

use async_trait::async_trait;
use cadence_core::{normalize_channel, provider::UsersProvider, user::User};
use serde::Deserialize;
use tokio::sync::RwLock;

use crate::{Result, file::read_json};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserJson {
  user_id:                       String,
  #[serde(default = "enabled")]
  is_enabled:                    bool,
  #[serde(default)]
  are_recurring_actions_enabled: bool,
  #[serde(default)]
  location_id:                   Option<String>,
  #[serde(default)]
  is_super_trivia_game_enabled:  bool,
}

fn enabled() -> bool { true }

/// The file is read on first use and kept until [`clear_caches`].
///
/// [`clear_caches`]: JsonUsersRepository::clear_caches
pub struct JsonUsersRepository {
  path:  PathBuf,
  cache: RwLock<Option<Arc<Vec<User>>>>,
}

impl JsonUsersRepository {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self { path: path.into(), cache: RwLock::new(None) }
  }

  /// Every user in the file, sorted by handle.
  pub async fn get_all(&self) -> Result<Arc<Vec<User>>> {
    if let Some(users) = self.cache.read().await.as_ref() {
      return Ok(users.clone());
    }

    let mut cache = self.cache.write().await;
    if let Some(users) = cache.as_ref() {
      return Ok(users.clone());
    }
    let raw: BTreeMap<String, UserJson> = read_json(&self.path).await?;
    let users: Arc<Vec<User>> = Arc::new(
      raw
        .into_iter()
        .map(|(handle, u)| User {
          handle:                        normalize_channel(&handle),
          user_id:                       u.user_id,
          is_enabled:                    u.is_enabled,
          are_recurring_actions_enabled: u.are_recurring_actions_enabled,
          location_id:                   u.location_id,
          is_super_trivia_game_enabled:  u.is_super_trivia_game_enabled,
        })
        .collect(),
    );
    tracing::debug!(path = %self.path.display(), count = users.len(), "users loaded");
    *cache = Some(users.clone());
    Ok(users)
  }

  pub async fn clear_caches(&self) { *self.cache.write().await = None; }
}

#[async_trait]
impl UsersProvider for JsonUsersRepository {
  async fn get_all_enabled(&self) -> anyhow::Result<Vec<User>> {
    Ok(self.get_all().await?.iter().filter(|u| u.is_enabled).cloned().collect())
  }

  async fn get_user(&self, handle: &str) -> anyhow::Result<Option<User>> {
    let handle = normalize_channel(handle);
    Ok(self.get_all().await?.iter().find(|u| u.handle == handle).cloned())
  }
}
