//! Encoding and decoding helpers between domain types and the plain
//! representations stored in SQL columns.
//!
//! Timestamps are stored as RFC 3339 strings in UTC. Kind-specific hints are
//! one compact JSON object per row, so both tables keep a uniform shape
//! across kinds.

use cadence_core::{
  action::{ActionHints, ActionKind, MostRecentRecord, RecurringAction},
  language::LanguagesRepository,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result, db::Row};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── ActionKind ──────────────────────────────────────────────────────────────

pub fn encode_kind(kind: ActionKind) -> &'static str { kind.as_str() }

pub fn decode_kind(s: &str) -> Result<ActionKind> { Ok(ActionKind::parse(s)?) }

// ─── Hints ───────────────────────────────────────────────────────────────────

/// The JSON shape of the `hints` column. Missing keys decode to `None`.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HintsJson {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  alerts_only:   Option<bool>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  language_code: Option<String>,
}

pub fn encode_hints(hints: &ActionHints) -> Result<String> {
  let json = match hints {
    ActionHints::SuperTrivia => HintsJson::default(),
    ActionHints::Weather { alerts_only } => HintsJson {
      alerts_only: Some(*alerts_only),
      ..Default::default()
    },
    ActionHints::WordOfTheDay { language } => HintsJson {
      language_code: language.and_then(|l| l.wotd_code).map(str::to_owned),
      ..Default::default()
    },
  };
  Ok(serde_json::to_string(&json)?)
}

/// Why a stored row cannot be used as configured.
pub type ConfigProblem = String;

fn decode_hints(
  kind: ActionKind,
  raw: Option<&str>,
  languages: &LanguagesRepository,
) -> Result<ActionHints, ConfigProblem> {
  let json: HintsJson = match raw.map(str::trim) {
    None | Some("") => HintsJson::default(),
    Some(s) => serde_json::from_str(s).map_err(|e| format!("malformed hints {s:?}: {e}"))?,
  };

  Ok(match kind {
    ActionKind::SuperTrivia => ActionHints::SuperTrivia,
    ActionKind::Weather => ActionHints::Weather {
      alerts_only: json.alerts_only.unwrap_or(false),
    },
    ActionKind::WordOfTheDay => {
      let language = json
        .language_code
        .map(|code| {
          languages
            .language_for_wotd_code(&code)
            .ok_or_else(|| format!("unknown language code {code:?}"))
        })
        .transpose()?;
      ActionHints::WordOfTheDay { language }
    }
  })
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column order shared by every `recurringaction` query.
pub const ACTION_COLUMNS: &str = "channel, kind, enabled, minutes_between, hints";

/// Raw values read directly from a `recurringaction` row.
#[derive(Debug)]
pub struct RawAction {
  pub channel:         String,
  pub kind:            String,
  pub enabled:         bool,
  pub minutes_between: Option<i64>,
  pub hints:           Option<String>,
}

/// A decoded action plus, when the row is misconfigured, the reason it was
/// forced to disabled.
pub struct DecodedAction {
  pub action:  RecurringAction,
  pub problem: Option<ConfigProblem>,
}

impl RawAction {
  pub fn from_row(row: &Row) -> Result<Self> {
    Ok(Self {
      channel:         row.text(0)?,
      kind:            row.text(1)?,
      enabled:         row.bool(2)?,
      minutes_between: row.opt_int(3)?,
      hints:           row.opt_text(4)?,
    })
  }

  pub fn into_action(self, languages: &LanguagesRepository) -> Result<DecodedAction> {
    let kind = decode_kind(&self.kind)?;
    let channel = cadence_core::normalize_channel(&self.channel);

    let minutes = match self.minutes_between {
      None => Ok(None),
      Some(m) => u32::try_from(m)
        .ok()
        .filter(|m| *m >= 1)
        .map(Some)
        .ok_or_else(|| format!("invalid minutes between {m}")),
    };
    let hints = decode_hints(kind, self.hints.as_deref(), languages);

    let decoded = match (minutes, hints) {
      (Ok(minutes_between), Ok(hints)) => {
        let missing_language =
          matches!(hints, ActionHints::WordOfTheDay { language: None }) && self.enabled;
        DecodedAction {
          action:  RecurringAction {
            channel,
            enabled: self.enabled && !missing_language,
            minutes_between,
            hints,
          },
          problem: missing_language.then(|| "enabled without a language code".to_owned()),
        }
      }
      (Err(problem), _) | (_, Err(problem)) => DecodedAction {
        action:  RecurringAction {
          channel,
          enabled: false,
          minutes_between: None,
          hints: ActionHints::default_for(kind),
        },
        problem: Some(problem),
      },
    };
    Ok(decoded)
  }

  /// The row as stored, for partial updates. Unlike [`into_action`]
  /// nothing is forced to disabled; only an interval or hints that cannot be
  /// read fall back to the kind's defaults.
  ///
  /// [`into_action`]: RawAction::into_action
  pub fn into_stored(self, languages: &LanguagesRepository) -> Result<RecurringAction> {
    let kind = decode_kind(&self.kind)?;
    let minutes_between = self
      .minutes_between
      .and_then(|m| u32::try_from(m).ok())
      .filter(|m| *m >= 1);
    let hints = decode_hints(kind, self.hints.as_deref(), languages)
      .unwrap_or_else(|_| ActionHints::default_for(kind));
    Ok(RecurringAction {
      channel: cadence_core::normalize_channel(&self.channel),
      enabled: self.enabled,
      minutes_between,
      hints,
    })
  }
}

pub const MOST_RECENT_COLUMNS: &str = "channel, kind, fired_at";

pub fn decode_most_recent(row: &Row) -> Result<MostRecentRecord> {
  Ok(MostRecentRecord {
    channel:  cadence_core::normalize_channel(&row.text(0)?),
    kind:     decode_kind(&row.text(1)?)?,
    fired_at: decode_dt(&row.text(2)?)?,
  })
}
