//! Word-of-the-day responses.

use serde::Serialize;

use crate::language::LanguageEntry;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WordOfTheDayResponse {
  pub language:         LanguageEntry,
  pub word:             String,
  pub definition:       String,
  pub transliteration:  Option<String>,
  pub foreign_example:  Option<String>,
  pub english_example:  Option<String>,
}

impl WordOfTheDayResponse {
  /// Both halves of the example pair are present.
  pub fn has_examples(&self) -> bool {
    self.foreign_example.is_some() && self.english_example.is_some()
  }

  pub fn to_message(&self) -> String {
    let mut out = format!(
      "{} Word of the day: {}",
      self.language.display_name(),
      self.word
    );
    if let Some(t) = &self.transliteration {
      out.push_str(&format!(" ({t})"));
    }
    out.push_str(&format!(" means {}", self.definition));
    if let (Some(foreign), Some(english)) = (&self.foreign_example, &self.english_example) {
      out.push_str(&format!(". Example: {foreign} {english}"));
    }
    out
  }
}
