//! Chat band: chatters with a key phrase get an instrument cue on the bus.

use std::{collections::HashMap, path::PathBuf, str::FromStr, time::Duration};

use cadence_engine::CooldownMap;
use cadence_providers::TimedCache;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::{Error, Result, WebsocketBus};

pub const CHAT_BAND_EVENT_TYPE: &str = "chatBand";

const EVENT_COOLDOWN: Duration = Duration::from_secs(5 * 60);
const MEMBER_CACHE_TTL: Duration = Duration::from_secs(15 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum ChatBandInstrument {
  Bass,
  Drums,
  Guitar,
  Piano,
  Saxophone,
  Synth,
  Trombone,
  Trumpet,
  Violin,
}

/// Serialises to the `eventData` of a chat band event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatBandMember {
  pub author:     String,
  pub instrument: ChatBandInstrument,
  pub key_phrase: String,
}

// ─── File ────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChatBandFile {
  #[serde(default)]
  debug_logging_enabled: bool,
  #[serde(default)]
  twitch_channels:       HashMap<String, HashMap<String, MemberEntry>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MemberEntry {
  #[serde(default = "enabled")]
  is_enabled: bool,
  instrument: String,
  key_phrase: String,
}

fn enabled() -> bool { true }

fn get_ignore_case<'a, V>(map: &'a HashMap<String, V>, key: &str) -> Option<(&'a String, &'a V)> {
  map.iter().find(|(k, _)| k.eq_ignore_ascii_case(key))
}

impl ChatBandFile {
  /// The enabled member for `author` on `channel`, if any.
  fn member(&self, channel: &str, author: &str) -> Option<ChatBandMember> {
    let (_, members) = get_ignore_case(&self.twitch_channels, channel)?;
    let (name, entry) = get_ignore_case(members, author)?;
    if !entry.is_enabled {
      return None;
    }
    let instrument = match ChatBandInstrument::from_str(entry.instrument.trim()) {
      Ok(instrument) => instrument,
      Err(_) => {
        tracing::warn!(%channel, author = %name, "unknown chat band instrument {:?}", entry.instrument);
        return None;
      }
    };
    Some(ChatBandMember {
      author: name.clone(),
      instrument,
      key_phrase: entry.key_phrase.trim().to_owned(),
    })
  }
}

// ─── Manager ─────────────────────────────────────────────────────────────────

pub struct ChatBandManager {
  bus:       WebsocketBus,
  cooldowns: CooldownMap,
  path:      PathBuf,
  /// Lookups by `channel:author`, misses included.
  members:   TimedCache<String, Option<ChatBandMember>>,
}

fn member_key(channel: &str, author: &str) -> String {
  format!("{}:{}", channel.to_lowercase(), author.to_lowercase())
}

impl ChatBandManager {
  pub fn new(bus: WebsocketBus, cooldowns: CooldownMap, path: impl Into<PathBuf>) -> Self {
    let members = TimedCache::new(MEMBER_CACHE_TTL, bus.clock());
    Self { bus, cooldowns, path: path.into(), members }
  }

  pub fn clear_caches(&self) {
    self.cooldowns.clear();
    self.members.clear();
    tracing::info!("chat band caches cleared");
  }

  async fn read_file(&self) -> Result<ChatBandFile> {
    let bytes = tokio::fs::read(&self.path)
      .await
      .map_err(|source| Error::Io { path: self.path.clone(), source })?;
    Ok(serde_json::from_slice(&bytes)?)
  }

  async fn find_member(&self, channel: &str, author: &str) -> Result<(Option<ChatBandMember>, bool)> {
    let key = member_key(channel, author);
    if let Some(member) = self.members.get(&key) {
      return Ok((member, false));
    }
    let file = self.read_file().await?;
    let member = file.member(channel, author);
    if file.debug_logging_enabled {
      tracing::debug!(%channel, %author, "caching chat band lookup: {member:?}");
    }
    self.members.insert(key, member.clone());
    Ok((member, file.debug_logging_enabled))
  }

  /// Publish an instrument cue when `message` is `author`'s key phrase and
  /// their cooldown has passed. Returns whether a cue was published.
  pub async fn play_instrument_for_message(
    &self,
    channel: &str,
    author: &str,
    message: &str,
  ) -> Result<bool> {
    let message = message.trim();
    if channel.trim().is_empty() || author.trim().is_empty() || message.is_empty() {
      return Ok(false);
    }

    let (member, debug) = self.find_member(channel, author).await?;
    let Some(member) = member.filter(|m| m.key_phrase == message) else {
      return Ok(false);
    };
    if !self.cooldowns.is_ready_and_update(&member_key(channel, author), EVENT_COOLDOWN) {
      return Ok(false);
    }

    if debug {
      tracing::debug!(%channel, "new chat band event: {member:?}");
    }
    let data = serde_json::to_value(&member)?;
    self.bus.publish(channel, CHAT_BAND_EVENT_TYPE, data).await?;
    Ok(true)
  }
}

#[cfg(test)]
mod tests {
  use std::{io::Write as _, sync::Arc};

  use async_trait::async_trait;
  use cadence_core::{
    clock::{Clock, VirtualClock},
    provider::SettingsProvider,
  };
  use chrono::Utc;
  use tempfile::NamedTempFile;
  use tokio::net::TcpListener;

  use super::*;
  use crate::BusConfig;

  struct QuietSettings;

  #[async_trait]
  impl SettingsProvider for QuietSettings {
    async fn is_debug_logging_enabled(&self) -> bool { false }

    async fn super_trivia_cooldown(&self) -> Duration { Duration::from_secs(300) }

    async fn clear_caches(&self) {}
  }

  const FILE: &str = r#"{
    "debugLoggingEnabled": true,
    "twitchChannels": {
      "Streamer": {
        "Drummer": {"instrument": "DRUMS", "keyPhrase": " ba dum tss "},
        "retired": {"isEnabled": false, "instrument": "bass", "keyPhrase": "thump"},
        "kazoo": {"instrument": "kazoo", "keyPhrase": "bzz"}
      }
    }
  }"#;

  struct Fixture {
    clock:   VirtualClock,
    bus:     WebsocketBus,
    manager: ChatBandManager,
    file:    NamedTempFile,
  }

  async fn fixture(started: bool) -> Fixture {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(FILE.as_bytes()).unwrap();

    let clock = VirtualClock::new(Utc::now());
    let clock_dyn: Arc<dyn Clock> = Arc::new(clock.clone());
    let settings: Arc<dyn SettingsProvider> = Arc::new(QuietSettings);
    let bus = WebsocketBus::new(BusConfig::default(), clock_dyn.clone(), settings.clone()).unwrap();
    if started {
      let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
      bus.start_with_listener(listener).unwrap();
    }
    let manager =
      ChatBandManager::new(bus.clone(), CooldownMap::new(clock_dyn, settings), file.path());
    Fixture { clock, bus, manager, file }
  }

  #[test]
  fn instruments_parse_case_insensitively() {
    assert_eq!("Saxophone".parse::<ChatBandInstrument>().unwrap(), ChatBandInstrument::Saxophone);
    assert_eq!(ChatBandInstrument::Trombone.to_string(), "trombone");
    assert!("kazoo".parse::<ChatBandInstrument>().is_err());
  }

  #[test]
  fn member_serialises_as_event_data() {
    let member = ChatBandMember {
      author:     "Drummer".into(),
      instrument: ChatBandInstrument::Drums,
      key_phrase: "ba dum tss".into(),
    };
    assert_eq!(
      serde_json::to_string(&member).unwrap(),
      r#"{"author":"Drummer","instrument":"drums","keyPhrase":"ba dum tss"}"#
    );
  }

  #[tokio::test]
  async fn key_phrase_publishes_once_per_cooldown() {
    let f = fixture(true).await;
    assert!(f.manager.play_instrument_for_message("streamer", "drummer", "ba dum tss").await.unwrap());
    assert_eq!(f.bus.len(), 1);

    assert!(!f.manager.play_instrument_for_message("streamer", "DRUMMER", "ba dum tss").await.unwrap());
    f.clock.advance(EVENT_COOLDOWN);
    assert!(f.manager.play_instrument_for_message("streamer", "drummer", "ba dum tss").await.unwrap());
    assert_eq!(f.bus.len(), 2);
  }

  #[tokio::test]
  async fn other_messages_are_ignored() {
    let f = fixture(true).await;
    let m = &f.manager;
    assert!(!m.play_instrument_for_message("streamer", "drummer", "BA DUM TSS").await.unwrap());
    assert!(!m.play_instrument_for_message("streamer", "retired", "thump").await.unwrap());
    assert!(!m.play_instrument_for_message("streamer", "kazoo", "bzz").await.unwrap());
    assert!(!m.play_instrument_for_message("streamer", "stranger", "ba dum tss").await.unwrap());
    assert!(!m.play_instrument_for_message("elsewhere", "drummer", "ba dum tss").await.unwrap());
    assert!(f.bus.is_empty());
  }

  #[tokio::test]
  async fn lookups_are_cached_until_cleared() {
    let f = fixture(false).await;
    f.manager.play_instrument_for_message("streamer", "drummer", "hello").await.unwrap();

    std::fs::write(f.file.path(), "not json").unwrap();
    assert!(f.manager.play_instrument_for_message("streamer", "drummer", "hello").await.is_ok());

    f.manager.clear_caches();
    assert!(matches!(
      f.manager.play_instrument_for_message("streamer", "drummer", "hello").await,
      Err(Error::Json(_))
    ));
  }

  #[tokio::test]
  async fn lookups_expire_with_the_bus_clock() {
    let f = fixture(false).await;
    f.manager.play_instrument_for_message("streamer", "drummer", "hello").await.unwrap();
    std::fs::write(f.file.path(), "not json").unwrap();

    f.clock.advance(MEMBER_CACHE_TTL - Duration::from_secs(1));
    assert!(f.manager.play_instrument_for_message("streamer", "drummer", "hello").await.is_ok());

    f.clock.advance(Duration::from_secs(1));
    assert!(matches!(
      f.manager.play_instrument_for_message("streamer", "drummer", "hello").await,
      Err(Error::Json(_))
    ));
  }

  #[tokio::test]
  async fn missing_file_is_an_error() {
    let f = fixture(false).await;
    let manager = ChatBandManager::new(
      f.bus.clone(),
      CooldownMap::new(Arc::new(f.clock.clone()), Arc::new(QuietSettings)),
      "/nonexistent/chat-band.json",
    );
    assert!(matches!(
      manager.play_instrument_for_message("streamer", "drummer", "ba dum tss").await,
      Err(Error::Io { .. })
    ));
  }
}
