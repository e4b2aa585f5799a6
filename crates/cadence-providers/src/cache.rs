//! A small map whose entries expire a fixed time after insertion.

use std::{
  borrow::Borrow,
  collections::HashMap,
  hash::Hash,
  sync::{Arc, Mutex},
  time::Duration,
};

use cadence_core::clock::{Clock, has_elapsed};
use chrono::{DateTime, Utc};

pub struct TimedCache<K, V> {
  ttl:     Duration,
  clock:   Arc<dyn Clock>,
  entries: Mutex<HashMap<K, (DateTime<Utc>, V)>>,
}

impl<K: Eq + Hash, V: Clone> TimedCache<K, V> {
  pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
    Self { ttl, clock, entries: Mutex::new(HashMap::new()) }
  }

  /// A clone of the live value for `key`. Expired entries are evicted.
  pub fn get<Q>(&self, key: &Q) -> Option<V>
  where
    K: Borrow<Q>,
    Q: Hash + Eq + ?Sized,
  {
    let now = self.clock.now();
    let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
    match entries.get(key) {
      Some((inserted, value)) if !has_elapsed(*inserted, now, self.ttl) => Some(value.clone()),
      Some(_) => {
        entries.remove(key);
        None
      }
      None => None,
    }
  }

  pub fn insert(&self, key: K, value: V) {
    let now = self.clock.now();
    self
      .entries
      .lock()
      .unwrap_or_else(|e| e.into_inner())
      .insert(key, (now, value));
  }

  pub fn clear(&self) {
    self.entries.lock().unwrap_or_else(|e| e.into_inner()).clear();
  }

  pub fn len(&self) -> usize {
    self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
  }

  pub fn is_empty(&self) -> bool { self.len() == 0 }
}
