//! Weather reports and the locations they are fetched for.

use serde::{Deserialize, Serialize};

// ─── Location ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
  pub location_id: String,
  pub name:        String,
  pub latitude:    f64,
  pub longitude:   f64,
  pub time_zone:   String,
}

// ─── Buckets ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UvIndex {
  Low,
  ModerateHigh,
  VeryHighExtreme,
}

impl UvIndex {
  pub fn from_uvi(uvi: f64) -> Self {
    if uvi < 3.0 {
      Self::Low
    } else if uvi < 8.0 {
      Self::ModerateHigh
    } else {
      Self::VeryHighExtreme
    }
  }

  pub fn label(&self) -> &'static str {
    match self {
      Self::Low => "low",
      Self::ModerateHigh => "moderate to high",
      Self::VeryHighExtreme => "very high to extreme",
    }
  }
}

/// OpenWeather's 1 to 5 air quality scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AirQualityIndex {
  Good,
  Fair,
  Moderate,
  Poor,
  VeryPoor,
}

impl AirQualityIndex {
  pub fn from_scale(value: i64) -> Option<Self> {
    match value {
      1 => Some(Self::Good),
      2 => Some(Self::Fair),
      3 => Some(Self::Moderate),
      4 => Some(Self::Poor),
      5 => Some(Self::VeryPoor),
      _ => None,
    }
  }

  pub fn label(&self) -> &'static str {
    match self {
      Self::Good => "good",
      Self::Fair => "fair",
      Self::Moderate => "moderate",
      Self::Poor => "poor",
      Self::VeryPoor => "very poor",
    }
  }
}

// ─── Report ──────────────────────────────────────────────────────────────────

/// A materialised weather report. Temperatures are in °C.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherReport {
  pub temperature:          f64,
  pub humidity:             u32,
  pub pressure:             u32,
  pub uv_index:             UvIndex,
  pub air_quality:          Option<AirQualityIndex>,
  /// Current conditions, already prettified with an icon where known.
  pub conditions:           Vec<String>,
  pub tomorrow_low:         f64,
  pub tomorrow_high:        f64,
  pub tomorrow_conditions:  Vec<String>,
  pub alerts:               Vec<String>,
}

fn to_fahrenheit(celsius: f64) -> f64 { celsius * 9.0 / 5.0 + 32.0 }

impl WeatherReport {
  pub fn has_alerts(&self) -> bool { !self.alerts.is_empty() }

  /// Render the report as a single chat line.
  pub fn to_message(&self) -> String {
    let mut out = format!(
      "🌡 Temperature is {:.0}°C ({:.0}°F), humidity is {}%, ",
      self.temperature,
      to_fahrenheit(self.temperature),
      self.humidity,
    );
    if let Some(aqi) = self.air_quality {
      out.push_str(&format!("air quality is {}, ", aqi.label()));
    }
    out.push_str(&format!(
      "UV index is {}, and pressure is {} hPa. ",
      self.uv_index.label(),
      self.pressure,
    ));
    if !self.conditions.is_empty() {
      out.push_str(&format!("Current conditions: {}. ", self.conditions.join(", ")));
    }
    out.push_str(&format!(
      "Tomorrow has a low of {:.0}°C ({:.0}°F) and a high of {:.0}°C ({:.0}°F). ",
      self.tomorrow_low,
      to_fahrenheit(self.tomorrow_low),
      self.tomorrow_high,
      to_fahrenheit(self.tomorrow_high),
    ));
    if !self.tomorrow_conditions.is_empty() {
      out.push_str(&format!(
        "Tomorrow's conditions: {}. ",
        self.tomorrow_conditions.join(", ")
      ));
    }
    if self.has_alerts() {
      out.push_str(&format!("🚨 {}", self.alerts.join(" ")));
    }
    out.trim_end().to_owned()
  }
}
