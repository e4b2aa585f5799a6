//! Word of the day from transparent.com's RSS widget feed.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use cadence_core::{
  clock::Clock, language::LanguageEntry, provider::WotdProvider, wotd::WordOfTheDayResponse,
};
use quick_xml::events::Event;
use reqwest::Client;

use crate::{
  Error, Result, TimedCache,
  http::{build_client, send_checked, trim_base},
};

pub const TRANSPARENT_BASE_URL: &str = "https://wotd.transparent.com";

const CACHE_TTL: Duration = Duration::from_secs(60 * 60);

// ─── Parsing ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
enum Field {
  Word,
  Translation,
  EnglishPhrase,
  ForeignPhrase,
  Transliteration,
}

fn field_for(local: &[u8]) -> Option<Field> {
  match local {
    b"word" => Some(Field::Word),
    b"translation" => Some(Field::Translation),
    b"enphrase" => Some(Field::EnglishPhrase),
    b"fnphrase" => Some(Field::ForeignPhrase),
    b"transliteratedWord" => Some(Field::Transliteration),
    _ => None,
  }
}

fn local_name(name: &[u8]) -> &[u8] {
  match name.iter().rposition(|&b| b == b':') {
    Some(pos) => &name[pos + 1..],
    None => name,
  }
}

#[derive(Debug, Default)]
struct WordsElement {
  word:            String,
  translation:     String,
  english_phrase:  String,
  foreign_phrase:  String,
  transliteration: String,
}

impl WordsElement {
  fn slot(&mut self, field: Field) -> &mut String {
    match field {
      Field::Word => &mut self.word,
      Field::Translation => &mut self.translation,
      Field::EnglishPhrase => &mut self.english_phrase,
      Field::ForeignPhrase => &mut self.foreign_phrase,
      Field::Transliteration => &mut self.transliteration,
    }
  }
}

fn cleaned(s: String) -> Option<String> {
  let trimmed = s.trim();
  (!trimmed.is_empty()).then(|| trimmed.to_owned())
}

/// Parse the `words` element of a widget feed.
pub fn parse_wotd_xml(language: LanguageEntry, xml: &[u8]) -> Result<WordOfTheDayResponse> {
  let mut reader = quick_xml::Reader::from_reader(xml);
  reader.config_mut().trim_text(true);

  let mut words = WordsElement::default();
  let mut in_words = false;
  let mut saw_words = false;
  let mut current: Option<Field> = None;
  let mut buf = Vec::new();

  loop {
    match reader.read_event_into(&mut buf) {
      Ok(Event::Start(ref e)) => {
        let name = e.name();
        let local = local_name(name.as_ref());
        if local == b"words" {
          in_words = true;
          saw_words = true;
        } else if in_words {
          current = field_for(local);
        }
      }
      Ok(Event::Text(e)) => {
        if let Some(field) = current {
          let text = e.unescape().map_err(|e| Error::Xml(e.to_string()))?;
          words.slot(field).push_str(&text);
        }
      }
      Ok(Event::CData(e)) => {
        if let Some(field) = current {
          words.slot(field).push_str(&String::from_utf8_lossy(&e.into_inner()));
        }
      }
      Ok(Event::End(ref e)) => {
        let name = e.name();
        if local_name(name.as_ref()) == b"words" {
          in_words = false;
        }
        current = None;
      }
      Ok(Event::Eof) => break,
      Err(e) => return Err(Error::Xml(e.to_string())),
      _ => {}
    }
    buf.clear();
  }

  if !saw_words {
    return Err(Error::Malformed("feed has no words element".into()));
  }
  let word = cleaned(words.word)
    .ok_or_else(|| Error::Malformed("feed has no word".into()))?;
  let definition = cleaned(words.translation)
    .ok_or_else(|| Error::Malformed("feed has no translation".into()))?;

  Ok(WordOfTheDayResponse {
    language,
    word,
    definition,
    transliteration: cleaned(words.transliteration),
    foreign_example: cleaned(words.foreign_phrase),
    english_example: cleaned(words.english_phrase),
  })
}

// ─── Provider ────────────────────────────────────────────────────────────────

/// Responses are cached per source code for one hour.
pub struct TransparentWotdProvider {
  client:   Client,
  base_url: String,
  cache:    TimedCache<&'static str, WordOfTheDayResponse>,
}

impl TransparentWotdProvider {
  pub fn new(clock: Arc<dyn Clock>) -> Result<Self> {
    Ok(Self {
      client:   build_client()?,
      base_url: TRANSPARENT_BASE_URL.to_owned(),
      cache:    TimedCache::new(CACHE_TTL, clock),
    })
  }

  pub fn with_base_url(mut self, base_url: &str) -> Self {
    self.base_url = trim_base(base_url);
    self
  }

  pub fn clear_caches(&self) { self.cache.clear(); }

  async fn fetch_uncached(&self, language: LanguageEntry, code: &str) -> Result<WordOfTheDayResponse> {
    tracing::info!(code, "fetching word of the day for {}", language.name);
    let req = self
      .client
      .get(format!("{}/rss/{code}-widget.xml", self.base_url))
      .query(&[("t", "0")]);
    let body = send_checked(req).await?.bytes().await?;
    parse_wotd_xml(language, &body)
  }
}

#[async_trait]
impl WotdProvider for TransparentWotdProvider {
  async fn fetch_wotd(&self, language: &LanguageEntry) -> anyhow::Result<WordOfTheDayResponse> {
    let code = language
      .wotd_code
      .ok_or(Error::NoWotdSource(language.name))?;
    if let Some(response) = self.cache.get(code) {
      return Ok(response);
    }
    let response = self.fetch_uncached(*language, code).await?;
    self.cache.insert(code, response.clone());
    Ok(response)
  }
}
