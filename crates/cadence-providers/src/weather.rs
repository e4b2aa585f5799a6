//! Weather reports from the OpenWeather one-call and air pollution APIs.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use cadence_core::{
  clock::Clock,
  provider::WeatherProvider,
  weather::{AirQualityIndex, Location, UvIndex, WeatherReport},
};
use reqwest::Client;
use serde::Deserialize;

use crate::{
  Error, Result, TimedCache,
  http::{build_client, send_checked, trim_base},
};

pub const OPENWEATHER_BASE_URL: &str = "https://api.openweathermap.org";

const MAX_ALERTS: usize = 2;
const CACHE_TTL: Duration = Duration::from_secs(20 * 60);

// ─── Wire types ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct OneCall {
  current: Current,
  #[serde(default)]
  daily:   Vec<Daily>,
  #[serde(default)]
  alerts:  Vec<Alert>,
}

#[derive(Debug, Deserialize)]
struct Current {
  humidity: f64,
  pressure: f64,
  temp:     f64,
  uvi:      f64,
  sunrise:  i64,
  sunset:   i64,
  #[serde(default)]
  weather:  Vec<Condition>,
}

#[derive(Debug, Deserialize)]
struct Daily {
  sunrise: i64,
  sunset:  i64,
  temp:    DailyTemp,
  #[serde(default)]
  weather: Vec<Condition>,
}

#[derive(Debug, Deserialize)]
struct DailyTemp {
  min: f64,
  max: f64,
}

#[derive(Debug, Deserialize)]
struct Condition {
  id:          Option<u32>,
  description: String,
}

#[derive(Debug, Deserialize)]
struct Alert {
  event:       Option<String>,
  sender_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AirPollution {
  #[serde(default)]
  list: Vec<AirPollutionEntry>,
}

#[derive(Debug, Deserialize)]
struct AirPollutionEntry {
  main: AirPollutionMain,
}

#[derive(Debug, Deserialize)]
struct AirPollutionMain {
  aqi: Option<i64>,
}

// ─── Formatting ──────────────────────────────────────────────────────────────

/// Icon for an OpenWeather condition code, where one is defined.
fn condition_icon(id: u32) -> Option<&'static str> {
  Some(match id {
    200..=202 | 221 | 230..=232 => "⛈️",
    210..=212 => "🌩️",
    300 | 301 | 310 | 311 | 313 | 500 => "☔",
    501..=504 | 520..=522 | 531 => "🌧️",
    600 | 601 => "❄️",
    602 => "🌨️",
    711 | 721 | 731 | 741 => "🌫️",
    762 => "🌋",
    771 => "🌬",
    781 => "🌪️",
    801..=804 => "☁️",
    _ => return None,
  })
}

fn prettify_condition(condition: &Condition) -> String {
  match condition.id.and_then(condition_icon) {
    Some(icon) => format!("{icon} {}", condition.description),
    None => condition.description.clone(),
  }
}

fn format_alerts(alerts: &[Alert]) -> Vec<String> {
  alerts
    .iter()
    .filter_map(|alert| {
      let event = alert.event.as_deref().filter(|e| !e.is_empty())?;
      Some(match alert.sender_name.as_deref().filter(|s| !s.is_empty()) {
        Some(sender) => format!("Alert from {sender}: {event}."),
        None => format!("Alert: {event}."),
      })
    })
    .take(MAX_ALERTS)
    .collect()
}

/// The first daily entry strictly after the current day.
fn choose_tomorrow(one_call: &OneCall) -> Option<&Daily> {
  one_call.daily.iter().find(|day| {
    day.sunrise > one_call.current.sunrise && day.sunset > one_call.current.sunset
  })
}

fn build_report(one_call: OneCall, air_quality: Option<AirQualityIndex>) -> Result<WeatherReport> {
  let tomorrow = choose_tomorrow(&one_call)
    .ok_or_else(|| Error::Malformed("no daily forecast after the current day".into()))?;

  Ok(WeatherReport {
    temperature: one_call.current.temp,
    humidity: one_call.current.humidity.round() as u32,
    pressure: one_call.current.pressure.round() as u32,
    uv_index: UvIndex::from_uvi(one_call.current.uvi),
    air_quality,
    conditions: one_call.current.weather.iter().map(prettify_condition).collect(),
    tomorrow_low: tomorrow.temp.min,
    tomorrow_high: tomorrow.temp.max,
    tomorrow_conditions: tomorrow.weather.iter().map(|c| c.description.clone()).collect(),
    alerts: format_alerts(&one_call.alerts),
  })
}

// ─── Provider ────────────────────────────────────────────────────────────────

/// Reports are cached per location id for 20 minutes.
pub struct OpenWeatherProvider {
  client:   Client,
  api_key:  String,
  base_url: String,
  cache:    TimedCache<String, WeatherReport>,
}

impl OpenWeatherProvider {
  pub fn new(api_key: impl Into<String>, clock: Arc<dyn Clock>) -> Result<Self> {
    Ok(Self {
      client:   build_client()?,
      api_key:  api_key.into(),
      base_url: OPENWEATHER_BASE_URL.to_owned(),
      cache:    TimedCache::new(CACHE_TTL, clock),
    })
  }

  /// Point the provider at another host, e.g. a mock server.
  pub fn with_base_url(mut self, base_url: &str) -> Self {
    self.base_url = trim_base(base_url);
    self
  }

  pub fn clear_caches(&self) {
    self.cache.clear();
    tracing::debug!("weather cache cleared");
  }

  fn coordinates(&self, location: &Location) -> Vec<(&'static str, String)> {
    vec![
      ("appid", self.api_key.clone()),
      ("lat", location.latitude.to_string()),
      ("lon", location.longitude.to_string()),
    ]
  }

  async fn fetch_one_call(&self, location: &Location) -> Result<OneCall> {
    let req = self
      .client
      .get(format!("{}/data/2.5/onecall", self.base_url))
      .query(&self.coordinates(location))
      .query(&[("exclude", "minutely,hourly"), ("units", "metric")]);
    Ok(send_checked(req).await?.json().await?)
  }

  async fn fetch_air_quality(&self, location: &Location) -> Result<Option<AirQualityIndex>> {
    let req = self
      .client
      .get(format!("{}/data/2.5/air_pollution", self.base_url))
      .query(&self.coordinates(location));
    let body: AirPollution = send_checked(req).await?.json().await?;
    Ok(
      body
        .list
        .first()
        .and_then(|entry| entry.main.aqi)
        .and_then(AirQualityIndex::from_scale),
    )
  }

  async fn fetch_uncached(&self, location: &Location) -> Result<WeatherReport> {
    tracing::info!(
      location = %location.location_id,
      "fetching weather for {}", location.name
    );
    let one_call = self.fetch_one_call(location).await?;

    // Air quality is an optional extra; a failure here does not sink the
    // whole report.
    let air_quality = match self.fetch_air_quality(location).await {
      Ok(aqi) => aqi,
      Err(e) => {
        tracing::warn!(location = %location.location_id, "air quality unavailable: {e}");
        None
      }
    };
    build_report(one_call, air_quality)
  }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
  async fn fetch_weather(&self, location: &Location) -> anyhow::Result<WeatherReport> {
    if let Some(report) = self.cache.get(&location.location_id) {
      return Ok(report);
    }
    let report = self.fetch_uncached(location).await?;
    self.cache.insert(location.location_id.clone(), report.clone());
    Ok(report)
  }
}
