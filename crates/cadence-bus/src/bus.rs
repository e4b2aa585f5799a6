//! The websocket server and the shared, time-bounded event log behind it.

use std::{
  collections::VecDeque,
  sync::{
    Arc, Mutex, MutexGuard,
    atomic::{AtomicBool, Ordering},
  },
};

use axum::{
  Router,
  extract::{
    State, WebSocketUpgrade,
    ws::{Message, WebSocket},
  },
  response::Response,
};
use cadence_core::{clock::Clock, provider::SettingsProvider};
use chrono::{DateTime, TimeDelta, Utc};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::{BusConfig, Error, Result};

// ─── Frames ──────────────────────────────────────────────────────────────────

/// Rebuild `value` with every object's keys in ascending order.
fn sorted(value: Value) -> Value {
  match value {
    Value::Object(map) => {
      let mut entries: Vec<(String, Value)> = map.into_iter().collect();
      entries.sort_by(|a, b| a.0.cmp(&b.0));
      Value::Object(entries.into_iter().map(|(k, v)| (k, sorted(v))).collect())
    }
    Value::Array(items) => Value::Array(items.into_iter().map(sorted).collect()),
    other => other,
  }
}

fn frame(channel: &str, event_type: &str, event_data: Value) -> Result<String> {
  let event = json!({
    "twitchChannel": channel,
    "eventType":     event_type,
    "eventData":     event_data,
  });
  Ok(serde_json::to_string(&sorted(event))?)
}

// ─── Log ─────────────────────────────────────────────────────────────────────

struct LoggedEvent {
  seq:         u64,
  channel:     String,
  frame:       String,
  enqueued_at: DateTime<Utc>,
}

/// Shared by all connections. Each connection reads it through its own
/// cursor (the next sequence number it has not seen).
#[derive(Default)]
struct EventLog {
  next_seq: u64,
  items:    VecDeque<LoggedEvent>,
}

impl EventLog {
  fn push(&mut self, channel: String, frame: String, enqueued_at: DateTime<Utc>) {
    let seq = self.next_seq;
    self.next_seq += 1;
    self.items.push_back(LoggedEvent { seq, channel, frame, enqueued_at });
  }

  /// Drop events strictly older than `ttl`.
  fn prune(&mut self, now: DateTime<Utc>, ttl: TimeDelta, debug: bool) {
    self.items.retain(|item| {
      let keep = now - item.enqueued_at <= ttl;
      if !keep {
        tracing::info!(channel = %item.channel, seq = item.seq, "discarding expired websocket event");
        if debug {
          tracing::debug!("expired: {}", item.frame);
        }
      }
      keep
    });
  }

  fn oldest_seq(&self) -> u64 { self.items.front().map_or(self.next_seq, |item| item.seq) }

  /// Frames from `cursor` onwards, and the cursor to use next time.
  fn since(&self, cursor: u64) -> (Vec<String>, u64) {
    let frames = self
      .items
      .iter()
      .filter(|item| item.seq >= cursor)
      .map(|item| item.frame.clone())
      .collect();
    (frames, self.next_seq)
  }
}

// ─── Bus ─────────────────────────────────────────────────────────────────────

/// Cloning is cheap; clones publish into the same log.
#[derive(Clone)]
pub struct WebsocketBus {
  inner: Arc<Inner>,
}

struct Inner {
  config:   BusConfig,
  clock:    Arc<dyn Clock>,
  settings: Arc<dyn SettingsProvider>,
  log:      Mutex<EventLog>,
  started:  AtomicBool,
}

impl WebsocketBus {
  pub fn new(
    config: BusConfig,
    clock: Arc<dyn Clock>,
    settings: Arc<dyn SettingsProvider>,
  ) -> Result<Self> {
    config.validate()?;
    Ok(Self {
      inner: Arc::new(Inner {
        config,
        clock,
        settings,
        log: Mutex::new(EventLog::default()),
        started: AtomicBool::new(false),
      }),
    })
  }

  /// The clock events are stamped with.
  pub fn clock(&self) -> Arc<dyn Clock> { self.inner.clock.clone() }

  pub fn is_started(&self) -> bool { self.inner.started.load(Ordering::SeqCst) }

  /// Events currently retained, expired ones included until the next prune.
  pub fn len(&self) -> usize { self.inner.lock().items.len() }

  pub fn is_empty(&self) -> bool { self.len() == 0 }

  /// Offer an event to connected clients.
  ///
  /// `event_data` must be a non-empty JSON object. Before the bus is started
  /// the event is logged and dropped.
  pub async fn publish(&self, channel: &str, event_type: &str, event_data: Value) -> Result<()> {
    if channel.trim().is_empty() {
      return Err(Error::InvalidEvent("channel is empty"));
    }
    if event_type.trim().is_empty() {
      return Err(Error::InvalidEvent("event type is empty"));
    }
    if !matches!(&event_data, Value::Object(map) if !map.is_empty()) {
      return Err(Error::InvalidEvent("event data must be a non-empty object"));
    }
    let frame = frame(channel, event_type, event_data)?;

    if !self.is_started() {
      tracing::warn!(%channel, event_type, "websocket bus not started; dropping event: {frame}");
      return Ok(());
    }

    let debug = self.inner.settings.is_debug_logging_enabled().await;
    let now = self.inner.clock.now();
    let mut log = self.inner.lock();
    log.prune(now, self.inner.ttl(), debug);
    if debug {
      tracing::debug!(size = log.items.len() + 1, "queueing websocket event: {frame}");
    }
    log.push(channel.to_owned(), frame, now);
    Ok(())
  }

  /// An axum router that upgrades any request to a bus connection.
  pub fn router(&self) -> Router {
    Router::new()
      .fallback(upgrade)
      .layer(TraceLayer::new_for_http())
      .with_state(self.inner.clone())
  }

  /// Serve on the configured address from a background task, rebinding after
  /// a failure. A second call is a no-op.
  pub fn start(&self) -> Result<()> {
    let handle = tokio::runtime::Handle::try_current().map_err(|_| Error::NoRuntime)?;
    if !self.mark_started() {
      return Ok(());
    }
    let bus = self.clone();
    handle.spawn(async move { bus.run_server().await });
    Ok(())
  }

  /// Serve on an already bound listener, without retries.
  pub fn start_with_listener(&self, listener: TcpListener) -> Result<()> {
    let handle = tokio::runtime::Handle::try_current().map_err(|_| Error::NoRuntime)?;
    if !self.mark_started() {
      return Ok(());
    }
    let router = self.router();
    handle.spawn(async move {
      if let Err(e) = axum::serve(listener, router).await {
        tracing::error!("websocket bus stopped: {e}");
      }
    });
    Ok(())
  }

  fn mark_started(&self) -> bool {
    if self.inner.started.swap(true, Ordering::SeqCst) {
      tracing::warn!("websocket bus already started");
      return false;
    }
    tracing::info!(address = %self.inner.config.address(), "starting websocket bus");
    true
  }

  async fn run_server(&self) {
    let address = self.inner.config.address();
    loop {
      match TcpListener::bind(&address).await {
        Ok(listener) => {
          tracing::info!(%address, "websocket bus listening");
          match axum::serve(listener, self.router()).await {
            Ok(()) => {
              tracing::info!("websocket bus shut down");
              return;
            }
            Err(e) => tracing::error!("websocket bus failed: {e}"),
          }
        }
        Err(e) => tracing::error!(%address, "could not bind websocket bus: {e}"),
      }
      self.inner.clock.sleep(self.inner.config.sleep()).await;
    }
  }
}

impl Inner {
  fn lock(&self) -> MutexGuard<'_, EventLog> { self.log.lock().unwrap_or_else(|e| e.into_inner()) }

  fn ttl(&self) -> TimeDelta { TimeDelta::from_std(self.config.ttl()).unwrap_or(TimeDelta::MAX) }

  fn connect_cursor(&self, debug: bool) -> u64 {
    let mut log = self.lock();
    log.prune(self.clock.now(), self.ttl(), debug);
    log.oldest_seq()
  }

  fn drain_since(&self, cursor: u64, debug: bool) -> (Vec<String>, u64) {
    let mut log = self.lock();
    log.prune(self.clock.now(), self.ttl(), debug);
    log.since(cursor)
  }

  async fn serve_connection(self: Arc<Self>, mut socket: WebSocket) {
    let debug = self.settings.is_debug_logging_enabled().await;
    let mut cursor = self.connect_cursor(debug);
    tracing::info!(cursor, "websocket client connected");

    loop {
      let debug = self.settings.is_debug_logging_enabled().await;
      let (frames, next) = self.drain_since(cursor, debug);
      cursor = next;
      for frame in frames {
        if debug {
          tracing::debug!("sending websocket event: {frame}");
        }
        if let Err(e) = socket.send(Message::Text(frame.into())).await {
          tracing::info!("websocket send failed: {e}");
          return;
        }
      }

      tokio::select! {
        _ = self.clock.sleep(self.config.sleep()) => {}
        incoming = socket.recv() => match incoming {
          None | Some(Err(_)) | Some(Ok(Message::Close(_))) => break,
          Some(Ok(_)) => {}
        },
      }
    }
    tracing::info!("websocket client disconnected");
  }
}

async fn upgrade(State(inner): State<Arc<Inner>>, ws: WebSocketUpgrade) -> Response {
  ws.on_upgrade(move |socket| inner.serve_connection(socket))
}
