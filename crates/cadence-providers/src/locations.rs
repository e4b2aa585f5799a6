//! Locations read from a JSON file keyed by location id.
//!
//! ```json
//! { "tokyo": { "name": "Tokyo", "lat": 35.6762, "lon": 139.6503,
//!              "timeZone": "Asia/Tokyo" } }
//! ```

use std::{
  collections::HashMap,
  path::PathBuf,
  sync::Arc,
};

use async_trait::async_trait;
use cadence_core::{provider::LocationsProvider, weather::Location};
use serde::Deserialize;
use tokio::sync::RwLock;

use crate::{Error, Result, file::read_json};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LocationJson {
  name:      String,
  lat:       f64,
  lon:       f64,
  time_zone: String,
}

type LocationMap = HashMap<String, Location>;

pub struct JsonLocationsRepository {
  path:  PathBuf,
  cache: RwLock<Option<Arc<LocationMap>>>,
}

impl JsonLocationsRepository {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self { path: path.into(), cache: RwLock::new(None) }
  }

  async fn locations(&self) -> Result<Arc<LocationMap>> {
    if let Some(map) = self.cache.read().await.as_ref() {
      return Ok(map.clone());
    }

    let mut cache = self.cache.write().await;
    if let Some(map) = cache.as_ref() {
      return Ok(map.clone());
    }
    let raw: HashMap<String, LocationJson> = read_json(&self.path).await?;
    let map: Arc<LocationMap> = Arc::new(
      raw
        .into_iter()
        .map(|(id, l)| {
          let location = Location {
            location_id: id.clone(),
            name:        l.name,
            latitude:    l.lat,
            longitude:   l.lon,
            time_zone:   l.time_zone,
          };
          (id.to_lowercase(), location)
        })
        .collect(),
    );
    *cache = Some(map.clone());
    Ok(map)
  }

  /// Case-insensitive lookup by id.
  pub async fn get(&self, location_id: &str) -> Result<Location> {
    self
      .locations()
      .await?
      .get(&location_id.trim().to_lowercase())
      .cloned()
      .ok_or_else(|| Error::UnknownLocation(location_id.to_owned()))
  }

  pub async fn clear_caches(&self) { *self.cache.write().await = None; }
}

#[async_trait]
impl LocationsProvider for JsonLocationsRepository {
  async fn get_location(&self, location_id: &str) -> anyhow::Result<Location> {
    Ok(self.get(location_id).await?)
  }
}
