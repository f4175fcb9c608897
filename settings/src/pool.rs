//! A process-local pool of named entities.
//!
//! Each name maps to a slot whose value is initialized at most once, so racing
//! callers asking for the same missing name run a single initializer and all
//! observe its result. Entities may expire after a time-to-live; whenever one
//! leaves the pool it is disposed and the optional [`EvictionListener`] is
//! told why.

use crate::listener::{EvictionListener, EvictionReason};
use crate::time;

use core::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use once_cell::sync::OnceCell;

/// Teardown hook run when a pooled entity is evicted.
pub trait Dispose {
  fn dispose(&self);
}

struct Pooled<V> {
  value: Arc<V>,
  expires_at: Option<DateTime<Utc>>,
}

impl<V> Pooled<V> {
  fn new(value: V, time_to_live: Option<Duration>) -> Self {
    Self {
      value: Arc::new(value),
      expires_at: time_to_live.map(time::absolute_expiration),
    }
  }

  #[inline]
  fn is_expired(&self) -> bool {
    self.expires_at.is_some_and(time::is_expired)
  }
}

struct Slot<V> {
  cell: OnceCell<Pooled<V>>,
}

/// A registry of entities keyed by name.
pub struct EntityPool<V> {
  slots: DashMap<String, Arc<Slot<V>>>,
  time_to_live: Option<Duration>,
  listener: Option<Arc<dyn EvictionListener<V>>>,
}

impl<V> fmt::Debug for EntityPool<V> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("EntityPool")
      .field("len", &self.slots.len())
      .field("time_to_live", &self.time_to_live)
      .field("has_listener", &self.listener.is_some())
      .finish()
  }
}

impl<V: Dispose + Send + Sync> Default for EntityPool<V> {
  fn default() -> Self {
    Self::new()
  }
}

impl<V: Dispose + Send + Sync> EntityPool<V> {
  /// Creates a pool whose entities never expire.
  pub fn new() -> Self {
    Self {
      slots: DashMap::new(),
      time_to_live: None,
      listener: None,
    }
  }

  /// Sets a time-to-live, counted from when each entity is inserted.
  pub fn time_to_live(mut self, duration: Duration) -> Self {
    self.time_to_live = Some(duration);
    self
  }

  pub fn eviction_listener<Listener>(mut self, listener: Listener) -> Self
  where
    Listener: EvictionListener<V> + 'static,
  {
    self.listener = Some(Arc::new(listener));
    self
  }

  /// Number of slots, including ones still initializing.
  pub fn len(&self) -> usize {
    self.slots.len()
  }

  pub fn is_empty(&self) -> bool {
    self.slots.is_empty()
  }

  /// Returns the live entity registered under `name`.
  pub fn get(&self, name: &str) -> Option<Arc<V>> {
    let slot = self.slots.get(name)?.value().clone();
    let pooled = slot.cell.get()?;
    if pooled.is_expired() {
      self.evict_slot(name, &slot, EvictionReason::Expired);
      return None;
    }
    Some(pooled.value.clone())
  }

  /// Returns the entity under `name`, running `init` to create it if needed.
  ///
  /// Concurrent callers for the same name block until the first initializer
  /// finishes and then share its result. If `init` fails nothing is
  /// published and the error is returned.
  pub fn get_or_try_insert_with<F, E>(&self, name: &str, init: F) -> Result<Arc<V>, E>
  where
    F: FnOnce() -> Result<V, E>,
  {
    let slot = loop {
      // Clone the slot out so the map shard is not locked while `init` runs.
      let slot = self
        .slots
        .entry(name.to_owned())
        .or_insert_with(|| Arc::new(Slot { cell: OnceCell::new() }))
        .value()
        .clone();

      if !slot.cell.get().is_some_and(Pooled::is_expired) {
        break slot;
      }
      self.evict_slot(name, &slot, EvictionReason::Expired);
    };

    let time_to_live = self.time_to_live;
    match slot
      .cell
      .get_or_try_init(|| init().map(|value| Pooled::new(value, time_to_live)))
    {
      Ok(pooled) => Ok(pooled.value.clone()),
      Err(err) => {
        self
          .slots
          .remove_if(name, |_, current| Arc::ptr_eq(current, &slot) && current.cell.get().is_none());
        Err(err)
      }
    }
  }

  /// Removes and disposes the entity under `name`. Returns whether one was
  /// present.
  ///
  /// An entity still being initialized is not removed; its slot must stay
  /// registered so the value it publishes is the one later lookups find.
  pub fn remove(&self, name: &str) -> bool {
    match self.slots.remove_if(name, |_, slot| slot.cell.get().is_some()) {
      Some((name, slot)) => self.dispose_slot(&name, &slot, EvictionReason::Invalidated),
      None => false,
    }
  }

  /// Removes and disposes every expired entity, returning how many left.
  pub fn purge_expired(&self) -> usize {
    let expired: Vec<(String, Arc<Slot<V>>)> = self
      .slots
      .iter()
      .filter(|entry| entry.value().cell.get().is_some_and(Pooled::is_expired))
      .map(|entry| (entry.key().clone(), entry.value().clone()))
      .collect();

    expired
      .into_iter()
      .filter(|(name, slot)| self.evict_slot(name, slot, EvictionReason::Expired))
      .count()
  }

  /// Removes and disposes every initialized entity.
  pub fn clear(&self) {
    let names: Vec<String> = self.slots.iter().map(|entry| entry.key().clone()).collect();
    for name in names {
      if let Some((name, slot)) = self.slots.remove_if(&name, |_, slot| slot.cell.get().is_some()) {
        self.dispose_slot(&name, &slot, EvictionReason::Closed);
      }
    }
  }

  /// Evicts `slot` if it is still the one registered under `name`.
  fn evict_slot(&self, name: &str, slot: &Arc<Slot<V>>, reason: EvictionReason) -> bool {
    match self.slots.remove_if(name, |_, current| Arc::ptr_eq(current, slot)) {
      Some((name, removed)) => self.dispose_slot(&name, &removed, reason),
      None => false,
    }
  }

  fn dispose_slot(&self, name: &str, slot: &Slot<V>, reason: EvictionReason) -> bool {
    let Some(pooled) = slot.cell.get() else {
      return false;
    };
    tracing::debug!(name, %reason, "evicting pooled entity");
    pooled.value.dispose();
    if let Some(listener) = &self.listener {
      listener.on_evict(name, pooled.value.clone(), reason);
    }
    true
  }
}
