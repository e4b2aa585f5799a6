//! Bounded FIFO between the scheduler and the listener pump.

use std::{sync::Arc, time::Duration};

use cadence_core::{clock::Clock, event::RecurringEvent};
use tokio::sync::{
  Mutex,
  mpsc::{self, error::TrySendError},
};

use crate::{Error, Result};

pub struct EventQueue {
  tx:      mpsc::Sender<RecurringEvent>,
  rx:      Mutex<mpsc::Receiver<RecurringEvent>>,
  timeout: Duration,
  clock:   Arc<dyn Clock>,
}

impl EventQueue {
  /// `capacity` must be at least 1.
  pub fn new(capacity: usize, timeout: Duration, clock: Arc<dyn Clock>) -> Self {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    Self { tx, rx: Mutex::new(rx), timeout, clock }
  }

  /// Enqueue `event`, waiting up to the timeout for room.
  pub async fn put(&self, event: RecurringEvent) -> Result<()> {
    let event = match self.tx.try_send(event) {
      Ok(()) => return Ok(()),
      Err(TrySendError::Full(event)) => event,
      // The receiver lives as long as the queue, so this cannot happen.
      Err(TrySendError::Closed(_)) => return Err(Error::QueueFull),
    };

    tokio::select! {
      permit = self.tx.reserve() => {
        permit.map_err(|_| Error::QueueFull)?.send(event);
        Ok(())
      }
      _ = self.clock.sleep(self.timeout) => Err(Error::QueueFull),
    }
  }

  /// Everything currently queued, oldest first. Never waits for new events.
  pub async fn drain(&self) -> Vec<RecurringEvent> {
    let mut rx = self.rx.lock().await;
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
      events.push(event);
    }
    events
  }

  pub fn len(&self) -> usize { self.tx.max_capacity() - self.tx.capacity() }

  pub fn is_empty(&self) -> bool { self.len() == 0 }
}
