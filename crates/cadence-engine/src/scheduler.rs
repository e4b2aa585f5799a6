//! The refresh loop: which action fires on which channel, and when.

use std::{
  collections::HashMap,
  panic::AssertUnwindSafe,
  sync::{
    Arc, Mutex,
    atomic::{AtomicBool, Ordering},
  },
};

use cadence_core::{
  action::{ActionHints, ActionKind, MostRecentRecord, RecurringAction},
  clock::{Clock, has_elapsed},
  event::RecurringEvent,
  language::LanguageEntry,
  provider::{
    IsLiveProvider, LocationsProvider, MAX_LIVE_CHECK_HANDLES, RecurringEventListener,
    TriviaGameBuilder, TriviaGameMachine, UsersProvider, WeatherProvider, WotdProvider,
  },
  store::{ActionStore, MostRecentStore},
  user::User,
};
use futures::FutureExt as _;
use rand::{rngs::StdRng, seq::SliceRandom};

use crate::{EngineConfig, Error, EventQueue, ListenerPump, Result};

/// Everything the machine talks to, injected at construction.
pub struct Dependencies<A, M> {
  pub clock:          Arc<dyn Clock>,
  pub actions:        Arc<A>,
  pub most_recent:    Arc<M>,
  pub users:          Arc<dyn UsersProvider>,
  pub locations:      Arc<dyn LocationsProvider>,
  pub weather:        Arc<dyn WeatherProvider>,
  pub wotd:           Arc<dyn WotdProvider>,
  pub is_live:        Arc<dyn IsLiveProvider>,
  pub trivia_builder: Arc<dyn TriviaGameBuilder>,
  pub trivia_machine: Arc<dyn TriviaGameMachine>,
}

/// Cloning is cheap; clones drive the same machine.
pub struct RecurringActionsMachine<A, M> {
  inner: Arc<Inner<A, M>>,
}

impl<A, M> Clone for RecurringActionsMachine<A, M> {
  fn clone(&self) -> Self { Self { inner: self.inner.clone() } }
}

struct Inner<A, M> {
  config:  EngineConfig,
  deps:    Dependencies<A, M>,
  rng:     Mutex<StdRng>,
  queue:   Arc<EventQueue>,
  pump:    Arc<ListenerPump>,
  started: AtomicBool,
}

impl<A, M> RecurringActionsMachine<A, M>
where
  A: ActionStore + 'static,
  M: MostRecentStore + 'static,
{
  /// `rng` drives the kind order in [`find_due_action`](Self::find_due_action).
  pub fn new(config: EngineConfig, deps: Dependencies<A, M>, rng: StdRng) -> Result<Self> {
    config.validate()?;
    let queue = Arc::new(EventQueue::new(
      config.queue_capacity,
      config.queue_timeout(),
      deps.clock.clone(),
    ));
    let pump = Arc::new(ListenerPump::new(
      queue.clone(),
      deps.clock.clone(),
      config.queue_sleep(),
    ));
    Ok(Self {
      inner: Arc::new(Inner {
        config,
        deps,
        rng: Mutex::new(rng),
        queue,
        pump,
        started: AtomicBool::new(false),
      }),
    })
  }

  pub fn set_listener(&self, listener: Option<Arc<dyn RecurringEventListener>>) {
    self.inner.pump.set_listener(listener);
  }

  pub fn queue(&self) -> &Arc<EventQueue> { &self.inner.queue }

  pub fn pump(&self) -> &Arc<ListenerPump> { &self.inner.pump }

  /// Spawn the refresh loop and the listener pump on the current runtime.
  ///
  /// Calling this again is a no-op (with a warning).
  pub fn start(&self) -> Result<()> {
    let handle = tokio::runtime::Handle::try_current().map_err(|_| Error::NoRuntime)?;
    if self.inner.started.swap(true, Ordering::SeqCst) {
      tracing::warn!("recurring actions machine already started");
      return Ok(());
    }
    tracing::info!(
      refresh_seconds = self.inner.config.refresh_sleep_seconds,
      "starting recurring actions machine"
    );

    let inner = self.inner.clone();
    handle.spawn(async move {
      loop {
        if AssertUnwindSafe(inner.refresh_once()).catch_unwind().await.is_err() {
          tracing::error!("refresh panicked");
        }
        inner.deps.clock.sleep(inner.config.refresh_sleep()).await;
      }
    });

    let pump = self.inner.pump.clone();
    handle.spawn(async move { pump.run().await });
    Ok(())
  }

  /// One tick. Returns how many actions fired.
  pub async fn refresh_once(&self) -> usize { self.inner.refresh_once().await }

  /// The action to fire on `channel` now, if any.
  pub async fn find_due_action(&self, channel: &str) -> Option<RecurringAction> {
    self.inner.find_due_action(channel).await
  }

  /// Materialise and enqueue `action`'s event. `true` when an event was
  /// enqueued.
  pub async fn process_action(&self, user: &User, action: &RecurringAction) -> bool {
    self.inner.process_action(user, action).await
  }
}

impl<A, M> Inner<A, M>
where
  A: ActionStore,
  M: MostRecentStore,
{
  async fn refresh_once(&self) -> usize {
    let users = match self.deps.users.get_all_enabled().await {
      Ok(users) => users,
      Err(e) => {
        tracing::warn!("could not list users: {e:#}");
        return 0;
      }
    };

    let mut due = Vec::new();
    for user in users.into_iter().filter(User::wants_recurring_actions) {
      if let Some(action) = self.find_due_action(&user.handle).await {
        due.push((user, action));
      }
    }
    if due.is_empty() {
      return 0;
    }

    let live = self.live_channels(&due).await;
    let mut fired = 0;
    for (user, action) in due {
      if !live.get(&user.handle).copied().unwrap_or(false) {
        tracing::debug!(channel = %user.handle, "not live; skipping");
        continue;
      }
      if !self.process_action(&user, &action).await {
        continue;
      }
      fired += 1;
      let now = self.deps.clock.now();
      if let Err(e) = self.deps.most_recent.set(&user.handle, action.kind(), now).await {
        tracing::error!(channel = %user.handle, "could not record fired action: {e}");
      }
    }
    fired
  }

  /// One batched live check per chunk. A failed chunk counts as offline.
  async fn live_channels(&self, due: &[(User, RecurringAction)]) -> HashMap<String, bool> {
    let handles: Vec<String> = due.iter().map(|(user, _)| user.handle.clone()).collect();
    let mut live = HashMap::with_capacity(handles.len());
    for chunk in handles.chunks(MAX_LIVE_CHECK_HANDLES) {
      match self.deps.is_live.is_live(chunk).await {
        Ok(answer) => live.extend(answer),
        Err(e) => tracing::warn!(channels = chunk.len(), "live check failed: {e:#}"),
      }
    }
    live
  }

  fn shuffled_kinds(&self) -> [ActionKind; 3] {
    let mut kinds = ActionKind::ALL;
    let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
    kinds.shuffle(&mut *rng);
    kinds
  }

  fn is_due(&self, last: Option<&MostRecentRecord>, action: &RecurringAction) -> bool {
    let Some(last) = last else {
      return true;
    };
    let now = self.deps.clock.now();
    has_elapsed(last.fired_at, now, self.config.global_cooldown())
      && has_elapsed(last.fired_at, now, action.interval())
  }

  async fn find_due_action(&self, channel: &str) -> Option<RecurringAction> {
    let last = match self.deps.most_recent.get(channel).await {
      Ok(last) => last,
      Err(e) => {
        tracing::warn!(%channel, "could not read most recent action: {e}");
        return None;
      }
    };

    for kind in self.shuffled_kinds() {
      let action = match self.deps.actions.get_action(channel, kind).await {
        Ok(Some(action)) if action.enabled => action,
        Ok(_) => continue,
        Err(e) => {
          tracing::warn!(%channel, %kind, "could not read action: {e}");
          continue;
        }
      };
      if self.is_due(last.as_ref(), &action) {
        return Some(action);
      }
    }
    None
  }

  async fn process_action(&self, user: &User, action: &RecurringAction) -> bool {
    let result = match &action.hints {
      ActionHints::Weather { alerts_only } => self.process_weather(user, *alerts_only).await,
      ActionHints::WordOfTheDay { language } => self.process_wotd(user, *language).await,
      ActionHints::SuperTrivia => self.process_super_trivia(user).await,
    };
    match result {
      Ok(fired) => fired,
      Err(e) => {
        tracing::warn!(channel = %user.handle, kind = %action.kind(), "action failed: {e:#}");
        false
      }
    }
  }

  async fn process_weather(&self, user: &User, alerts_only: bool) -> anyhow::Result<bool> {
    let Some(location_id) = user.location_id.as_deref() else {
      tracing::debug!(channel = %user.handle, "no location configured for weather");
      return Ok(false);
    };
    let location = self.deps.locations.get_location(location_id).await?;
    let report = self.deps.weather.fetch_weather(&location).await?;
    if alerts_only && !report.has_alerts() {
      return Ok(false);
    }
    Ok(self.enqueue(RecurringEvent::Weather {
      channel: user.handle.clone(),
      alerts_only,
      report,
    })
    .await)
  }

  async fn process_wotd(
    &self,
    user: &User,
    language: Option<LanguageEntry>,
  ) -> anyhow::Result<bool> {
    let Some(language) = language else {
      return Ok(false);
    };
    let response = self.deps.wotd.fetch_wotd(&language).await?;
    Ok(self.enqueue(RecurringEvent::WordOfTheDay {
      channel: user.handle.clone(),
      language,
      response,
    })
    .await)
  }

  async fn process_super_trivia(&self, user: &User) -> anyhow::Result<bool> {
    let Some(game) = self
      .deps
      .trivia_builder
      .create_new_super_trivia_game(&user.handle, 1)
      .await?
    else {
      return Ok(false);
    };
    if !self.enqueue(RecurringEvent::SuperTrivia { channel: user.handle.clone() }).await {
      return Ok(false);
    }

    // Pre-roll so chat sees the announcement before the first question.
    self.deps.clock.sleep(self.config.super_trivia_countdown()).await;
    self.deps.trivia_machine.submit(game);
    Ok(true)
  }

  async fn enqueue(&self, event: RecurringEvent) -> bool {
    let channel = event.channel().to_owned();
    match self.queue.put(event).await {
      Ok(()) => true,
      Err(e) => {
        tracing::warn!(%channel, "dropping event: {e}");
        false
      }
    }
  }
}
