//! The static language table used by word-of-the-day actions and chat
//! commands.

use serde::Serialize;

use crate::{Error, Result};

/// One supported language.
///
/// ISO 639-1 and word-of-the-day codes are optional: some languages can be
/// translated into but have no daily word source, and a couple of word
/// sources target learners rather than a language proper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageEntry {
  pub command_names: &'static [&'static str],
  pub name:          &'static str,
  pub flag:          Option<&'static str>,
  pub iso6391_code:  Option<&'static str>,
  pub wotd_code:     Option<&'static str>,
}

impl LanguageEntry {
  /// The first alias; used when listing languages to users.
  pub fn primary_command_name(&self) -> &'static str {
    self.command_names.first().copied().unwrap_or(self.name)
  }

  pub fn has_iso6391_code(&self) -> bool { self.iso6391_code.is_some() }

  pub fn has_wotd_code(&self) -> bool { self.wotd_code.is_some() }

  /// Flag and name, e.g. `🇯🇵 Japanese`.
  pub fn display_name(&self) -> String {
    match self.flag {
      Some(flag) => format!("{flag} {}", self.name),
      None => self.name.to_owned(),
    }
  }

  fn matches_alias(&self, alias: &str) -> bool {
    self
      .command_names
      .iter()
      .any(|name| name.to_lowercase() == alias)
  }
}

// ─── Filter ──────────────────────────────────────────────────────────────────

/// Restricts lookups to entries with (or without) the optional codes.
/// `None` means "don't care".
#[derive(Debug, Clone, Copy, Default)]
pub struct LanguageFilter {
  pub has_iso6391: Option<bool>,
  pub has_wotd_code: Option<bool>,
}

impl LanguageFilter {
  pub fn wotd() -> Self {
    Self { has_iso6391: None, has_wotd_code: Some(true) }
  }

  fn accepts(&self, entry: &LanguageEntry) -> bool {
    self.has_iso6391.is_none_or(|want| want == entry.has_iso6391_code())
      && self.has_wotd_code.is_none_or(|want| want == entry.has_wotd_code())
  }
}

// ─── Repository ──────────────────────────────────────────────────────────────

/// Read-only view over the language table.
#[derive(Debug, Clone, Copy)]
pub struct LanguagesRepository {
  entries: &'static [LanguageEntry],
}

impl Default for LanguagesRepository {
  fn default() -> Self { Self { entries: LANGUAGES } }
}

impl LanguagesRepository {
  pub fn new() -> Self { Self::default() }

  pub fn entries(&self, filter: LanguageFilter) -> Vec<LanguageEntry> {
    self
      .entries
      .iter()
      .filter(|e| filter.accepts(e))
      .copied()
      .collect()
  }

  /// Case-insensitive alias lookup.
  pub fn language_for_command(
    &self,
    command: &str,
    filter: LanguageFilter,
  ) -> Option<LanguageEntry> {
    let alias = command.trim().to_lowercase();
    if alias.is_empty() {
      return None;
    }
    self
      .entries
      .iter()
      .filter(|e| filter.accepts(e))
      .find(|e| e.matches_alias(&alias))
      .copied()
  }

  /// Resolve a stored word-of-the-day language code.
  ///
  /// The code is matched against word source codes first and then against
  /// command aliases of entries that have a word source, so both `korean`
  /// and `ko` resolve to Korean.
  pub fn language_for_wotd_code(&self, code: &str) -> Option<LanguageEntry> {
    let code = code.trim().to_lowercase();
    if code.is_empty() {
      return None;
    }
    self
      .entries
      .iter()
      .find(|e| e.wotd_code.is_some_and(|c| c.eq_ignore_ascii_case(&code)))
      .copied()
      .or_else(|| self.language_for_command(&code, LanguageFilter::wotd()))
  }

  pub fn require_language_for_wotd_code(&self, code: &str) -> Result<LanguageEntry> {
    self
      .language_for_wotd_code(code)
      .ok_or_else(|| Error::UnknownLanguage(code.to_owned()))
  }

  /// Primary command names of every entry with a word source, sorted and
  /// joined, e.g. for a `!wotd` help message.
  pub fn wotd_language_list(&self, delimiter: &str) -> String {
    let mut names: Vec<&str> = self
      .entries(LanguageFilter::wotd())
      .iter()
      .map(LanguageEntry::primary_command_name)
      .collect();
    names.sort_by_key(|n| n.to_lowercase());
    names.join(delimiter)
  }
}

// ─── Table ───────────────────────────────────────────────────────────────────

const LANGUAGES: &[LanguageEntry] = &[
  LanguageEntry {
    command_names: &["de", "deutsche", "german", "germany"],
    name:          "German",
    flag:          Some("🇩🇪"),
    iso6391_code:  Some("de"),
    wotd_code:     Some("de"),
  },
  LanguageEntry {
    command_names: &["en", "eng", "english", "英語"],
    name:          "English",
    flag:          Some("🇬🇧"),
    iso6391_code:  Some("en"),
    wotd_code:     None,
  },
  LanguageEntry {
    command_names: &["en-es"],
    name:          "English for Spanish speakers",
    flag:          None,
    iso6391_code:  None,
    wotd_code:     Some("en-es"),
  },
  LanguageEntry {
    command_names: &["en-pt"],
    name:          "English for Portuguese speakers",
    flag:          None,
    iso6391_code:  None,
    wotd_code:     Some("en-pt"),
  },
  LanguageEntry {
    command_names: &["es", "español", "sp", "spanish"],
    name:          "Spanish",
    flag:          None,
    iso6391_code:  Some("es"),
    wotd_code:     Some("es"),
  },
  LanguageEntry {
    command_names: &["fr", "français", "france", "french"],
    name:          "French",
    flag:          Some("🇫🇷"),
    iso6391_code:  Some("fr"),
    wotd_code:     Some("fr"),
  },
  LanguageEntry {
    command_names: &["el", "greek"],
    name:          "Greek",
    flag:          Some("🇬🇷"),
    iso6391_code:  Some("el"),
    wotd_code:     None,
  },
  LanguageEntry {
    command_names: &["hi", "hin", "hindi"],
    name:          "Hindi",
    flag:          Some("🇮🇳"),
    iso6391_code:  Some("hi"),
    wotd_code:     Some("hindi"),
  },
  LanguageEntry {
    command_names: &["it", "italian", "italiano", "italy"],
    name:          "Italian",
    flag:          Some("🇮🇹"),
    iso6391_code:  Some("it"),
    wotd_code:     Some("it"),
  },
  LanguageEntry {
    command_names: &["ja", "japan", "japanese", "jp", "日本語", "にほんご"],
    name:          "Japanese",
    flag:          Some("🇯🇵"),
    iso6391_code:  Some("ja"),
    wotd_code:     Some("ja"),
  },
  LanguageEntry {
    command_names: &["ko", "korea", "korean", "한국어"],
    name:          "Korean",
    flag:          Some("🇰🇷"),
    iso6391_code:  Some("ko"),
    wotd_code:     Some("korean"),
  },
  LanguageEntry {
    command_names: &["la", "latin"],
    name:          "Latin",
    flag:          None,
    iso6391_code:  Some("la"),
    wotd_code:     None,
  },
  LanguageEntry {
    command_names: &["nl", "dutch", "nederlands", "netherlands", "vlaams"],
    name:          "Dutch",
    flag:          Some("🇳🇱"),
    iso6391_code:  Some("nl"),
    wotd_code:     Some("nl"),
  },
  LanguageEntry {
    command_names: &["no", "norsk", "norway", "norwegian"],
    name:          "Norwegian",
    flag:          Some("🇳🇴"),
    iso6391_code:  Some("no"),
    wotd_code:     Some("norwegian"),
  },
  LanguageEntry {
    command_names: &["po", "poland", "polish"],
    name:          "Polish",
    flag:          Some("🇵🇱"),
    iso6391_code:  Some("pl"),
    wotd_code:     Some("polish"),
  },
  LanguageEntry {
    command_names: &["pt", "portuguese", "português"],
    name:          "Portuguese",
    flag:          Some("🇵🇹"),
    iso6391_code:  Some("pt"),
    wotd_code:     Some("pt"),
  },
  LanguageEntry {
    command_names: &["ru", "russia", "russian", "русский"],
    name:          "Russian",
    flag:          Some("🇷🇺"),
    iso6391_code:  Some("ru"),
    wotd_code:     Some("ru"),
  },
  LanguageEntry {
    command_names: &["se", "sv", "svenska", "sw", "sweden", "swedish"],
    name:          "Swedish",
    flag:          Some("🇸🇪"),
    iso6391_code:  Some("sv"),
    wotd_code:     Some("swedish"),
  },
  LanguageEntry {
    command_names: &["th", "thai"],
    name:          "Thai",
    flag:          Some("🇹🇭"),
    iso6391_code:  Some("th"),
    wotd_code:     None,
  },
  LanguageEntry {
    command_names: &["zh", "chinese", "china", "中文"],
    name:          "Chinese",
    flag:          Some("🇨🇳"),
    iso6391_code:  Some("zh"),
    wotd_code:     Some("zh"),
  },
];
