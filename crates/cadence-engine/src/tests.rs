//! Scheduler scenarios on a virtual clock, against SQLite-backed stores and
//! in-memory providers.

use std::{
  collections::{HashMap, HashSet},
  sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
  },
  time::Duration,
};

use async_trait::async_trait;
use cadence_core::{
  action::{ActionHints, ActionKind, RecurringAction, WeatherPatch},
  clock::{Clock, VirtualClock},
  event::RecurringEvent,
  language::{LanguageEntry, LanguagesRepository},
  provider::{
    IsLiveProvider, LocationsProvider, RecurringEventListener, TriviaGameBuilder,
    TriviaGameMachine, UsersProvider, WeatherProvider, WotdProvider,
  },
  store::{ActionStore, MostRecentStore},
  trivia::SuperTriviaGame,
  user::User,
  weather::{Location, UvIndex, WeatherReport},
  wotd::WordOfTheDayResponse,
};
use cadence_store::{Database, SqlActionStore, SqlMostRecentStore};
use chrono::{DateTime, TimeZone, Utc};
use rand::{SeedableRng, rngs::StdRng};

use crate::{Dependencies, EngineConfig, RecurringActionsMachine};

// ─── Fakes ───────────────────────────────────────────────────────────────────

struct FakeUsers(Vec<User>);

#[async_trait]
impl UsersProvider for FakeUsers {
  async fn get_all_enabled(&self) -> anyhow::Result<Vec<User>> {
    Ok(self.0.iter().filter(|u| u.is_enabled).cloned().collect())
  }

  async fn get_user(&self, handle: &str) -> anyhow::Result<Option<User>> {
    Ok(self.0.iter().find(|u| u.handle == handle).cloned())
  }
}

struct FakeLocations;

#[async_trait]
impl LocationsProvider for FakeLocations {
  async fn get_location(&self, location_id: &str) -> anyhow::Result<Location> {
    Ok(Location {
      location_id: location_id.to_owned(),
      name:        "Tokyo".into(),
      latitude:    35.6762,
      longitude:   139.6503,
      time_zone:   "Asia/Tokyo".into(),
    })
  }
}

#[derive(Default)]
struct FakeWeather {
  alerts: Mutex<Vec<String>>,
  calls:  AtomicUsize,
}

#[async_trait]
impl WeatherProvider for FakeWeather {
  async fn fetch_weather(&self, _location: &Location) -> anyhow::Result<WeatherReport> {
    self.calls.fetch_add(1, Ordering::SeqCst);
    Ok(WeatherReport {
      temperature:         21.0,
      humidity:            40,
      pressure:            1013,
      uv_index:            UvIndex::Low,
      air_quality:         None,
      conditions:          vec![],
      tomorrow_low:        12.0,
      tomorrow_high:       24.0,
      tomorrow_conditions: vec![],
      alerts:              self.alerts.lock().unwrap().clone(),
    })
  }
}

/// Fails the first `failures` calls.
#[derive(Default)]
struct FakeWotd {
  failures: AtomicUsize,
}

#[async_trait]
impl WotdProvider for FakeWotd {
  async fn fetch_wotd(&self, language: &LanguageEntry) -> anyhow::Result<WordOfTheDayResponse> {
    if self
      .failures
      .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
      .is_ok()
    {
      anyhow::bail!("word source unavailable");
    }
    Ok(WordOfTheDayResponse {
      language:        *language,
      word:            "猫".into(),
      definition:      "cat".into(),
      transliteration: Some("neko".into()),
      foreign_example: None,
      english_example: None,
    })
  }
}

/// Everyone is live unless listed in `offline`.
#[derive(Default)]
struct FakeLive {
  offline:     Mutex<HashSet<String>>,
  batch_sizes: Mutex<Vec<usize>>,
}

impl FakeLive {
  fn set_live(&self, channel: &str, live: bool) {
    let mut offline = self.offline.lock().unwrap();
    if live {
      offline.remove(channel);
    } else {
      offline.insert(channel.to_owned());
    }
  }
}

#[async_trait]
impl IsLiveProvider for FakeLive {
  async fn is_live(&self, handles: &[String]) -> anyhow::Result<HashMap<String, bool>> {
    self.batch_sizes.lock().unwrap().push(handles.len());
    let offline = self.offline.lock().unwrap();
    Ok(handles.iter().map(|h| (h.clone(), !offline.contains(h))).collect())
  }
}

struct FakeBuilder;

#[async_trait]
impl TriviaGameBuilder for FakeBuilder {
  async fn create_new_super_trivia_game(
    &self,
    channel: &str,
    number_of_games: u32,
  ) -> anyhow::Result<Option<SuperTriviaGame>> {
    Ok(Some(SuperTriviaGame {
      channel: channel.to_owned(),
      number_of_games,
      points_for_winning: 25,
      seconds_to_live: 60,
      per_user_attempts: 2,
    }))
  }
}

#[derive(Default)]
struct RecordingMachine {
  games: Mutex<Vec<(SuperTriviaGame, DateTime<Utc>)>>,
  clock: Mutex<Option<VirtualClock>>,
}

impl TriviaGameMachine for RecordingMachine {
  fn submit(&self, game: SuperTriviaGame) {
    let at = self
      .clock
      .lock()
      .unwrap()
      .as_ref()
      .map(|c| c.now())
      .unwrap_or_else(Utc::now);
    self.games.lock().unwrap().push((game, at));
  }
}

#[derive(Default)]
struct RecordingListener {
  events: Mutex<Vec<RecurringEvent>>,
}

#[async_trait]
impl RecurringEventListener for RecordingListener {
  async fn on_event(&self, event: RecurringEvent) -> anyhow::Result<()> {
    self.events.lock().unwrap().push(event);
    Ok(())
  }
}

#[derive(Default)]
struct FailingListener {
  calls: AtomicUsize,
}

#[async_trait]
impl RecurringEventListener for FailingListener {
  async fn on_event(&self, _event: RecurringEvent) -> anyhow::Result<()> {
    let n = self.calls.fetch_add(1, Ordering::SeqCst);
    if n % 2 == 0 {
      anyhow::bail!("chat is down");
    }
    panic!("listener bug");
  }
}

// ─── Harness ─────────────────────────────────────────────────────────────────

type Engine = RecurringActionsMachine<SqlActionStore, SqlMostRecentStore>;

struct Harness {
  clock:       VirtualClock,
  actions:     Arc<SqlActionStore>,
  most_recent: Arc<SqlMostRecentStore>,
  weather:     Arc<FakeWeather>,
  wotd:        Arc<FakeWotd>,
  live:        Arc<FakeLive>,
  machine:     Arc<RecordingMachine>,
  engine:      Engine,
}

fn midnight() -> DateTime<Utc> { Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() }

fn user(handle: &str) -> User {
  User {
    handle:                        handle.to_owned(),
    user_id:                       format!("id-{handle}"),
    is_enabled:                    true,
    are_recurring_actions_enabled: true,
    location_id:                   Some("tokyo".into()),
    is_super_trivia_game_enabled:  true,
  }
}

async fn harness_with(users: Vec<User>, config: EngineConfig, seed: u64) -> Harness {
  let clock = VirtualClock::new(midnight());
  let db = Database::open_sqlite_in_memory().await.unwrap();
  let actions = Arc::new(SqlActionStore::new(db.clone(), LanguagesRepository::new()));
  let most_recent = Arc::new(SqlMostRecentStore::new(db));
  let weather = Arc::new(FakeWeather::default());
  let wotd = Arc::new(FakeWotd::default());
  let live = Arc::new(FakeLive::default());
  let machine = Arc::new(RecordingMachine::default());
  *machine.clock.lock().unwrap() = Some(clock.clone());

  let engine = RecurringActionsMachine::new(
    config,
    Dependencies {
      clock:          Arc::new(clock.clone()),
      actions:        actions.clone(),
      most_recent:    most_recent.clone(),
      users:          Arc::new(FakeUsers(users)),
      locations:      Arc::new(FakeLocations),
      weather:        weather.clone(),
      wotd:           wotd.clone(),
      is_live:        live.clone(),
      trivia_builder: Arc::new(FakeBuilder),
      trivia_machine: machine.clone(),
    },
    StdRng::seed_from_u64(seed),
  )
  .unwrap();

  Harness { clock, actions, most_recent, weather, wotd, live, machine, engine }
}

async fn harness(handles: &[&str]) -> Harness {
  harness_with(handles.iter().map(|h| user(h)).collect(), EngineConfig::default(), 7).await
}

fn action(channel: &str, hints: ActionHints, minutes: u32) -> RecurringAction {
  RecurringAction {
    channel:         channel.to_owned(),
    enabled:         true,
    minutes_between: Some(minutes),
    hints,
  }
}

fn weather(channel: &str, minutes: u32) -> RecurringAction {
  action(channel, ActionHints::Weather { alerts_only: false }, minutes)
}

fn japanese() -> Option<LanguageEntry> { LanguagesRepository::new().language_for_wotd_code("ja") }

const TICK: Duration = Duration::from_secs(90);

// ─── Scenarios ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn each_channel_fires_once_per_interval() {
  let h = harness(&["a", "b", "c"]).await;
  for channel in ["a", "b", "c"] {
    h.actions.set_action(weather(channel, 120)).await.unwrap();
  }

  assert_eq!(h.engine.refresh_once().await, 3);
  let mut channels: Vec<String> =
    h.engine.queue().drain().await.iter().map(|e| e.channel().to_owned()).collect();
  channels.sort();
  assert_eq!(channels, ["a", "b", "c"]);

  // 79 more ticks take the clock to 01:58:30; the 80th lands on 02:00.
  for tick in 1..=80 {
    h.clock.advance(TICK);
    let fired = h.engine.refresh_once().await;
    if tick < 80 {
      assert_eq!(fired, 0, "tick {tick} fired early");
    } else {
      assert_eq!(fired, 3);
    }
  }
  assert_eq!(h.engine.queue().drain().await.len(), 3);
}

#[tokio::test]
async fn alerts_only_without_alerts_does_not_fire() {
  let h = harness(&["a"]).await;
  h.actions
    .set_action(action("a", ActionHints::Weather { alerts_only: true }, 30))
    .await
    .unwrap();

  assert_eq!(h.engine.refresh_once().await, 0);
  assert!(h.engine.queue().is_empty());
  assert!(h.most_recent.get("a").await.unwrap().is_none());
  assert_eq!(h.weather.calls.load(Ordering::SeqCst), 1);

  *h.weather.alerts.lock().unwrap() = vec!["Alert: Flood.".into()];
  assert_eq!(h.engine.refresh_once().await, 1);
  let events = h.engine.queue().drain().await;
  assert_eq!(events[0].to_message(), "🚨 Alert: Flood.");
}

#[tokio::test]
async fn provider_failure_is_retried_next_tick() {
  let h = harness(&["a"]).await;
  h.actions
    .set_action(action("a", ActionHints::WordOfTheDay { language: japanese() }, 60))
    .await
    .unwrap();
  h.wotd.failures.store(1, Ordering::SeqCst);

  assert_eq!(h.engine.refresh_once().await, 0);
  assert!(h.engine.queue().is_empty());
  assert!(h.most_recent.get("a").await.unwrap().is_none());

  h.clock.advance(Duration::from_secs(60 * 60));
  assert_eq!(h.engine.refresh_once().await, 1);
  let record = h.most_recent.get("a").await.unwrap().unwrap();
  assert_eq!(record.kind, ActionKind::WordOfTheDay);
  assert_eq!(record.fired_at, h.clock.now());
  assert!(matches!(
    h.engine.queue().drain().await.as_slice(),
    [RecurringEvent::WordOfTheDay { .. }]
  ));
}

#[tokio::test]
async fn flapping_live_check_fires_super_trivia_once() {
  let h = harness(&["a"]).await;
  h.actions
    .set_action(action("a", ActionHints::SuperTrivia, 10))
    .await
    .unwrap();
  h.most_recent.set("a", ActionKind::Weather, midnight()).await.unwrap();
  h.clock.advance(Duration::from_secs(10 * 60));

  let mut fired = Vec::new();
  for live in [true, false, true] {
    h.live.set_live("a", live);
    fired.push(h.engine.refresh_once().await);
    h.clock.advance(TICK);
  }
  assert_eq!(fired, [1, 0, 0]);

  let events = h.engine.queue().drain().await;
  assert_eq!(events, [RecurringEvent::SuperTrivia { channel: "a".into() }]);

  let record = h.most_recent.get("a").await.unwrap().unwrap();
  assert_eq!(record.kind, ActionKind::SuperTrivia);
  assert!(record.fired_at >= midnight() + chrono::Duration::minutes(10));

  // The game is submitted only after the countdown.
  let games = h.machine.games.lock().unwrap();
  assert_eq!(games.len(), 1);
  assert_eq!(games[0].0.channel, "a");
  assert!(games[0].1 >= midnight() + chrono::Duration::minutes(10) + chrono::Duration::seconds(5));
}

#[tokio::test]
async fn offline_channels_get_nothing() {
  let h = harness(&["a", "b"]).await;
  h.actions.set_action(weather("a", 30)).await.unwrap();
  h.actions.set_action(weather("b", 30)).await.unwrap();
  h.live.set_live("b", false);

  assert_eq!(h.engine.refresh_once().await, 1);
  let events = h.engine.queue().drain().await;
  assert_eq!(events.len(), 1);
  assert_eq!(events[0].channel(), "a");
  assert!(h.most_recent.get("b").await.unwrap().is_none());
}

#[tokio::test]
async fn live_checks_are_batched() {
  let handles: Vec<String> = (0..250).map(|i| format!("user{i}")).collect();
  let h = harness_with(
    handles.iter().map(|h| user(h)).collect(),
    EngineConfig { queue_capacity: 1000, ..Default::default() },
    7,
  )
  .await;
  for handle in &handles {
    h.actions.set_action(weather(handle, 30)).await.unwrap();
  }

  assert_eq!(h.engine.refresh_once().await, 250);
  assert_eq!(*h.live.batch_sizes.lock().unwrap(), [100, 100, 50]);
}

#[tokio::test]
async fn channels_without_due_actions_skip_the_live_check() {
  let h = harness(&["a"]).await;
  assert_eq!(h.engine.refresh_once().await, 0);
  assert!(h.live.batch_sizes.lock().unwrap().is_empty());
}

#[tokio::test]
async fn most_recent_moves_only_when_enqueued() {
  let h = harness_with(
    vec![user("a"), user("b")],
    EngineConfig { queue_capacity: 1, ..Default::default() },
    7,
  )
  .await;
  h.actions.set_action(weather("a", 30)).await.unwrap();
  h.actions.set_action(weather("b", 30)).await.unwrap();

  assert_eq!(h.engine.refresh_once().await, 1);
  let events = h.engine.queue().drain().await;
  assert_eq!(events.len(), 1);

  let fired = events[0].channel().to_owned();
  let dropped = if fired == "a" { "b" } else { "a" };
  assert!(h.most_recent.get(&fired).await.unwrap().is_some());
  assert!(h.most_recent.get(dropped).await.unwrap().is_none());
}

#[tokio::test]
async fn weather_needs_a_location() {
  let mut nowhere = user("a");
  nowhere.location_id = None;
  let h = harness_with(vec![nowhere.clone()], EngineConfig::default(), 7).await;
  assert!(!h.engine.process_action(&nowhere, &weather("a", 30)).await);
  assert_eq!(h.weather.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn wotd_without_language_is_skipped() {
  let h = harness(&["a"]).await;
  let no_language = action("a", ActionHints::WordOfTheDay { language: None }, 60);
  assert!(!h.engine.process_action(&user("a"), &no_language).await);
}

#[tokio::test]
async fn users_without_recurring_actions_are_ignored() {
  let mut quiet = user("a");
  quiet.are_recurring_actions_enabled = false;
  let h = harness_with(vec![quiet], EngineConfig::default(), 7).await;
  h.actions.set_action(weather("a", 30)).await.unwrap();
  assert_eq!(h.engine.refresh_once().await, 0);
}

#[tokio::test]
async fn disabled_kind_is_never_due() {
  let h = harness(&["a"]).await;
  h.actions.set_action(weather("a", 30)).await.unwrap();
  h.actions
    .set_action(action("a", ActionHints::WordOfTheDay { language: japanese() }, 30))
    .await
    .unwrap();

  h.actions
    .configure_weather("a", WeatherPatch { enabled: Some(false), ..Default::default() })
    .await
    .unwrap();

  for _ in 0..50 {
    let due = h.engine.find_due_action("a").await.unwrap();
    assert_eq!(due.kind(), ActionKind::WordOfTheDay);
  }
}

#[tokio::test]
async fn global_cooldown_applies_across_kinds() {
  let h = harness(&["a"]).await;
  h.actions.set_action(action("a", ActionHints::SuperTrivia, 1)).await.unwrap();
  h.most_recent.set("a", ActionKind::Weather, midnight()).await.unwrap();

  h.clock.advance(Duration::from_secs(2 * 60));
  assert!(h.engine.find_due_action("a").await.is_none());
  h.clock.advance(Duration::from_secs(60));
  assert!(h.engine.find_due_action("a").await.is_some());
}

#[tokio::test]
async fn one_event_per_channel_per_tick() {
  let h = harness(&["a"]).await;
  h.actions.set_action(weather("a", 1)).await.unwrap();
  h.actions.set_action(action("a", ActionHints::SuperTrivia, 1)).await.unwrap();
  h.actions
    .set_action(action("a", ActionHints::WordOfTheDay { language: japanese() }, 1))
    .await
    .unwrap();

  assert_eq!(h.engine.refresh_once().await, 1);
  assert_eq!(h.engine.queue().drain().await.len(), 1);

  // Every interval has passed, the global cooldown has not.
  h.clock.advance(TICK);
  assert_eq!(h.engine.refresh_once().await, 0);
  assert!(h.engine.queue().drain().await.is_empty());

  h.clock.advance(Duration::from_secs(3 * 60));
  assert_eq!(h.engine.refresh_once().await, 1);
  assert_eq!(h.engine.queue().drain().await.len(), 1);
}

// ─── Fairness ────────────────────────────────────────────────────────────────

async fn all_kinds_due() -> Harness {
  let h = harness(&["a"]).await;
  h.actions.set_action(weather("a", 60)).await.unwrap();
  h.actions.set_action(action("a", ActionHints::SuperTrivia, 60)).await.unwrap();
  h.actions
    .set_action(action("a", ActionHints::WordOfTheDay { language: japanese() }, 60))
    .await
    .unwrap();
  h.most_recent.set("a", ActionKind::Weather, midnight()).await.unwrap();
  h.clock.advance(Duration::from_secs(60 * 60));
  h
}

async fn selection_counts(h: &Harness, ticks: usize) -> HashMap<ActionKind, usize> {
  let mut counts = HashMap::new();
  for _ in 0..ticks {
    let kind = h.engine.find_due_action("a").await.unwrap().kind();
    *counts.entry(kind).or_insert(0) += 1;
  }
  counts
}

#[tokio::test]
async fn kind_selection_is_balanced() {
  let h = all_kinds_due().await;
  let counts = selection_counts(&h, 30_000).await;
  for kind in ActionKind::ALL {
    let n = counts.get(&kind).copied().unwrap_or(0);
    assert!((9_500..=10_500).contains(&n), "{kind} selected {n} times");
  }
}

#[tokio::test]
async fn kind_selection_passes_chi_square() {
  let h = all_kinds_due().await;
  let ticks = 10_000;
  let counts = selection_counts(&h, ticks).await;
  let expected = ticks as f64 / 3.0;
  let chi_square: f64 = ActionKind::ALL
    .iter()
    .map(|kind| {
      let observed = counts.get(kind).copied().unwrap_or(0) as f64;
      (observed - expected).powi(2) / expected
    })
    .sum();
  // Critical value for two degrees of freedom at α = 0.01.
  assert!(chi_square < 9.21, "chi-square {chi_square:.2}");
}

// ─── Listener pump ───────────────────────────────────────────────────────────

fn trivia(channel: &str) -> RecurringEvent {
  RecurringEvent::SuperTrivia { channel: channel.to_owned() }
}

#[tokio::test]
async fn listener_sees_enqueue_order() {
  let h = harness(&[]).await;
  let listener = Arc::new(RecordingListener::default());
  h.engine.set_listener(Some(listener.clone()));

  for i in 0..20 {
    h.engine.queue().put(trivia(&format!("c{i}"))).await.unwrap();
  }
  assert_eq!(h.engine.pump().pump_once().await, 20);

  let seen: Vec<String> =
    listener.events.lock().unwrap().iter().map(|e| e.channel().to_owned()).collect();
  let expected: Vec<String> = (0..20).map(|i| format!("c{i}")).collect();
  assert_eq!(seen, expected);
}

#[tokio::test]
async fn failing_listener_does_not_stop_the_pump() {
  let h = harness(&[]).await;
  let listener = Arc::new(FailingListener::default());
  h.engine.set_listener(Some(listener.clone()));

  for i in 0..100 {
    h.engine.queue().put(trivia(&format!("c{i}"))).await.unwrap();
  }
  assert_eq!(h.engine.pump().pump_once().await, 100);
  assert!(h.engine.queue().is_empty());

  h.engine.queue().put(trivia("late")).await.unwrap();
  assert_eq!(h.engine.pump().pump_once().await, 1);
  assert_eq!(listener.calls.load(Ordering::SeqCst), 101);
}

#[tokio::test]
async fn events_wait_for_a_listener() {
  let h = harness(&[]).await;
  h.engine.queue().put(trivia("a")).await.unwrap();
  assert_eq!(h.engine.pump().pump_once().await, 0);
  assert_eq!(h.engine.queue().len(), 1);

  let listener = Arc::new(RecordingListener::default());
  h.engine.set_listener(Some(listener.clone()));
  assert_eq!(h.engine.pump().pump_once().await, 1);

  h.engine.set_listener(None);
  assert!(!h.engine.pump().has_listener());
}

// ─── Lifecycle ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn started_machine_delivers_events() {
  let h = harness(&["a"]).await;
  h.actions.set_action(weather("a", 120)).await.unwrap();
  let listener = Arc::new(RecordingListener::default());
  h.engine.set_listener(Some(listener.clone()));

  h.engine.start().unwrap();
  h.engine.start().unwrap();

  tokio::time::timeout(Duration::from_secs(5), async {
    while listener.events.lock().unwrap().is_empty() {
      tokio::task::yield_now().await;
    }
  })
  .await
  .expect("listener received an event");

  assert_eq!(listener.events.lock().unwrap()[0].kind(), ActionKind::Weather);
}

#[test]
fn start_needs_a_runtime() {
  let rt = tokio::runtime::Runtime::new().unwrap();
  let h = rt.block_on(harness(&["a"]));
  assert!(matches!(h.engine.start(), Err(crate::Error::NoRuntime)));
}

#[tokio::test]
async fn invalid_config_is_rejected() {
  let db = Database::open_sqlite_in_memory().await.unwrap();
  let result = RecurringActionsMachine::new(
    EngineConfig { queue_sleep_seconds: 0, ..Default::default() },
    Dependencies {
      clock:          Arc::new(VirtualClock::new(midnight())),
      actions:        Arc::new(SqlActionStore::new(db.clone(), LanguagesRepository::new())),
      most_recent:    Arc::new(SqlMostRecentStore::new(db)),
      users:          Arc::new(FakeUsers(vec![])),
      locations:      Arc::new(FakeLocations),
      weather:        Arc::new(FakeWeather::default()),
      wotd:           Arc::new(FakeWotd::default()),
      is_live:        Arc::new(FakeLive::default()),
      trivia_builder: Arc::new(FakeBuilder),
      trivia_machine: Arc::new(RecordingMachine::default()),
    },
    StdRng::seed_from_u64(1),
  );
  assert!(result.is_err());
}
