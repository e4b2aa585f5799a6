//! Recurring actions: the per-channel, per-kind configuration the scheduler
//! fires from.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use strum::{Display, EnumString};

use crate::{
  Error, Result,
  language::{LanguageEntry, LanguagesRepository},
  normalize_channel,
};

// ─── Kind ────────────────────────────────────────────────────────────────────

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
#[strum(ascii_case_insensitive)]
pub enum ActionKind {
  SuperTrivia,
  Weather,
  WordOfTheDay,
}

impl ActionKind {
  pub const ALL: [ActionKind; 3] =
    [ActionKind::SuperTrivia, ActionKind::Weather, ActionKind::WordOfTheDay];

  /// Interval used when a channel does not override `minutes_between`.
  pub fn default_minutes(self) -> u32 {
    match self {
      ActionKind::SuperTrivia => 10,
      ActionKind::Weather => 120,
      ActionKind::WordOfTheDay => 60,
    }
  }

  /// The string stored in the `kind` column.
  pub fn as_str(self) -> &'static str {
    match self {
      ActionKind::SuperTrivia => "super_trivia",
      ActionKind::Weather => "weather",
      ActionKind::WordOfTheDay => "word_of_the_day",
    }
  }

  pub fn parse(s: &str) -> Result<Self> {
    s.parse()
      .map_err(|_| Error::UnknownActionKind(s.to_owned()))
  }
}

// ─── Action ──────────────────────────────────────────────────────────────────

/// Kind-specific configuration carried by an action.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ActionHints {
  SuperTrivia,
  Weather {
    /// Only fire when the report carries at least one alert.
    alerts_only: bool,
  },
  WordOfTheDay {
    /// `None` makes the action impossible to fire; it is skipped, not
    /// treated as an error.
    language: Option<LanguageEntry>,
  },
}

impl ActionHints {
  pub fn kind(&self) -> ActionKind {
    match self {
      ActionHints::SuperTrivia => ActionKind::SuperTrivia,
      ActionHints::Weather { .. } => ActionKind::Weather,
      ActionHints::WordOfTheDay { .. } => ActionKind::WordOfTheDay,
    }
  }

  /// Hints for a freshly configured action of `kind`.
  pub fn default_for(kind: ActionKind) -> Self {
    match kind {
      ActionKind::SuperTrivia => ActionHints::SuperTrivia,
      ActionKind::Weather => ActionHints::Weather { alerts_only: false },
      ActionKind::WordOfTheDay => ActionHints::WordOfTheDay { language: None },
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurringAction {
  pub channel:         String,
  pub enabled:         bool,
  /// `None` falls back to [`ActionKind::default_minutes`].
  pub minutes_between: Option<u32>,
  #[serde(flatten)]
  pub hints:           ActionHints,
}

impl RecurringAction {
  pub fn new(channel: &str, hints: ActionHints) -> Self {
    Self {
      channel: normalize_channel(channel),
      enabled: true,
      minutes_between: None,
      hints,
    }
  }

  /// An enabled action of `kind` with default interval and hints.
  pub fn default_for(channel: &str, kind: ActionKind) -> Self {
    Self::new(channel, ActionHints::default_for(kind))
  }

  pub fn kind(&self) -> ActionKind { self.hints.kind() }

  pub fn minutes(&self) -> u32 {
    self
      .minutes_between
      .unwrap_or_else(|| self.kind().default_minutes())
  }

  pub fn interval(&self) -> Duration {
    Duration::from_secs(u64::from(self.minutes()) * 60)
  }

  pub fn validate(&self) -> Result<()> {
    match self.minutes_between {
      Some(0) => Err(Error::InvalidInterval(0)),
      _ => Ok(()),
    }
  }

  /// Apply a partial update. The patch must target this action's kind.
  pub fn apply(
    &mut self,
    patch: ActionPatch,
    languages: &LanguagesRepository,
  ) -> Result<()> {
    if patch.kind() != self.kind() {
      return Err(Error::KindMismatch {
        channel:  self.channel.clone(),
        expected: self.kind(),
        actual:   patch.kind(),
      });
    }

    let common = patch.common();
    let minutes_between = match common.minutes_between {
      Some(Some(minutes)) => Some(Some(
        u32::try_from(minutes)
          .ok()
          .filter(|m| *m >= 1)
          .ok_or(Error::InvalidInterval(minutes))?,
      )),
      other => other.map(|_| None),
    };

    match (&mut self.hints, &patch) {
      (ActionHints::Weather { alerts_only }, ActionPatch::Weather(p)) => {
        if let Some(value) = p.alerts_only {
          *alerts_only = value;
        }
      }
      (ActionHints::WordOfTheDay { language }, ActionPatch::WordOfTheDay(p)) => {
        if let Some(code) = &p.language_code {
          *language = Some(languages.require_language_for_wotd_code(code)?);
        }
      }
      _ => {}
    }

    if let Some(enabled) = common.enabled {
      self.enabled = enabled;
    }
    if let Some(minutes) = minutes_between {
      self.minutes_between = minutes;
    }
    Ok(())
  }
}

// ─── Patches ─────────────────────────────────────────────────────────────────

/// Distinguishes an absent field (`None`) from an explicit `null`
/// (`Some(None)`), so a patch can reset `minutesBetween` to the default.
fn double_option<'de, D, T>(de: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
  D: Deserializer<'de>,
  T: Deserialize<'de>,
{
  Deserialize::deserialize(de).map(Some)
}

/// Fields every patch shares.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommonPatch {
  pub enabled:         Option<bool>,
  pub minutes_between: Option<Option<i64>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherPatch {
  #[serde(default)]
  pub enabled:         Option<bool>,
  #[serde(default, deserialize_with = "double_option")]
  pub minutes_between: Option<Option<i64>>,
  #[serde(default)]
  pub alerts_only:     Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordOfTheDayPatch {
  #[serde(default)]
  pub enabled:         Option<bool>,
  #[serde(default, deserialize_with = "double_option")]
  pub minutes_between: Option<Option<i64>>,
  #[serde(default)]
  pub language_code:   Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuperTriviaPatch {
  #[serde(default)]
  pub enabled:         Option<bool>,
  #[serde(default, deserialize_with = "double_option")]
  pub minutes_between: Option<Option<i64>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionPatch {
  SuperTrivia(SuperTriviaPatch),
  Weather(WeatherPatch),
  WordOfTheDay(WordOfTheDayPatch),
}

impl ActionPatch {
  pub fn kind(&self) -> ActionKind {
    match self {
      ActionPatch::SuperTrivia(_) => ActionKind::SuperTrivia,
      ActionPatch::Weather(_) => ActionKind::Weather,
      ActionPatch::WordOfTheDay(_) => ActionKind::WordOfTheDay,
    }
  }

  pub fn common(&self) -> CommonPatch {
    match self {
      ActionPatch::SuperTrivia(p) => CommonPatch {
        enabled:         p.enabled,
        minutes_between: p.minutes_between,
      },
      ActionPatch::Weather(p) => CommonPatch {
        enabled:         p.enabled,
        minutes_between: p.minutes_between,
      },
      ActionPatch::WordOfTheDay(p) => CommonPatch {
        enabled:         p.enabled,
        minutes_between: p.minutes_between,
      },
    }
  }

  /// Parse a JSON patch body for `kind`.
  pub fn from_json(kind: ActionKind, value: serde_json::Value) -> Result<Self> {
    Ok(match kind {
      ActionKind::SuperTrivia => ActionPatch::SuperTrivia(serde_json::from_value(value)?),
      ActionKind::Weather => ActionPatch::Weather(serde_json::from_value(value)?),
      ActionKind::WordOfTheDay => {
        ActionPatch::WordOfTheDay(serde_json::from_value(value)?)
      }
    })
  }
}

// ─── Most recent ─────────────────────────────────────────────────────────────

/// The last action fired on a channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MostRecentRecord {
  pub channel:  String,
  pub kind:     ActionKind,
  pub fired_at: DateTime<Utc>,
}
