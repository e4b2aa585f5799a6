//! Delivers queued events to the single registered listener.

use std::{panic::AssertUnwindSafe, sync::Arc, time::Duration};

use arc_swap::ArcSwapOption;
use cadence_core::{clock::Clock, event::RecurringEvent, provider::RecurringEventListener};
use futures::FutureExt as _;

use crate::EventQueue;

type SharedListener = Arc<dyn RecurringEventListener>;

pub struct ListenerPump {
  queue:    Arc<EventQueue>,
  listener: ArcSwapOption<SharedListener>,
  clock:    Arc<dyn Clock>,
  sleep:    Duration,
}

impl ListenerPump {
  pub fn new(queue: Arc<EventQueue>, clock: Arc<dyn Clock>, sleep: Duration) -> Self {
    Self { queue, listener: ArcSwapOption::empty(), clock, sleep }
  }

  /// Replace (or remove) the listener. Takes effect at the next drain.
  pub fn set_listener(&self, listener: Option<SharedListener>) {
    self.listener.store(listener.map(Arc::new));
  }

  pub fn has_listener(&self) -> bool { self.listener.load().is_some() }

  /// Drain the queue into the current listener. Without a listener nothing
  /// is drained. Returns the number of events handed over.
  pub async fn pump_once(&self) -> usize {
    let Some(listener) = self.listener.load_full() else {
      return 0;
    };
    let events = self.queue.drain().await;
    let count = events.len();
    for event in events {
      deliver(listener.as_ref().as_ref(), event).await;
    }
    count
  }

  /// Sleep, pump, repeat. Never returns.
  pub async fn run(&self) {
    loop {
      self.clock.sleep(self.sleep).await;
      self.pump_once().await;
    }
  }
}

/// One event, isolated: errors and panics are logged and swallowed.
async fn deliver(listener: &dyn RecurringEventListener, event: RecurringEvent) {
  let channel = event.channel().to_owned();
  let kind = event.kind();
  match AssertUnwindSafe(listener.on_event(event)).catch_unwind().await {
    Ok(Ok(())) => {}
    Ok(Err(e)) => tracing::warn!(%channel, %kind, "listener failed: {e:#}"),
    Err(_) => tracing::error!(%channel, %kind, "listener panicked"),
  }
}
