//! Pluggable byte-oriented cache backends.
//!
//! A [`CacheBackend`] is the only thing the settings layer needs from a cache:
//! put bytes with an absolute expiration, read them back, remove them. It is
//! satisfied by [`MemoryBackend`] for a process-local cache, or by a thin
//! client wrapper around a distributed cache.

use crate::error::BoxError;
use crate::time;

use core::fmt;
use std::collections::HashMap;
use std::hash::{BuildHasher, Hash, Hasher};

use chrono::{DateTime, Utc};
use crossbeam_utils::CachePadded;
use parking_lot::RwLock;

/// A cache provider storing raw bytes under string keys.
///
/// Implementations must be thread-safe. Entries past their `expires_at` must
/// never be returned by [`get`](CacheBackend::get).
pub trait CacheBackend: Send + Sync {
  /// Stores `value` under `key`, replacing any previous entry.
  fn set(&self, key: &str, value: Vec<u8>, expires_at: DateTime<Utc>) -> Result<(), BoxError>;

  /// Returns the bytes stored under `key`, or `None` if absent or expired.
  fn get(&self, key: &str) -> Result<Option<Vec<u8>>, BoxError>;

  /// Removes `key`. Removing an absent key is not an error.
  fn remove(&self, key: &str) -> Result<(), BoxError>;
}

#[derive(Debug)]
struct StoredBytes {
  bytes: Vec<u8>,
  expires_at: DateTime<Utc>,
}

impl StoredBytes {
  #[inline]
  fn is_expired(&self) -> bool {
    time::is_expired(self.expires_at)
  }
}

type Shard = CachePadded<RwLock<HashMap<String, StoredBytes>>>;

/// An in-process [`CacheBackend`].
///
/// The map is partitioned into independently locked shards. Expired entries
/// are dropped lazily when they are read, or in bulk by
/// [`purge_expired`](MemoryBackend::purge_expired); no background thread is
/// spawned.
pub struct MemoryBackend<H = ahash::RandomState> {
  shards: Box<[Shard]>,
  hasher: H,
}

impl<H> fmt::Debug for MemoryBackend<H> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("MemoryBackend")
      .field("num_shards", &self.shards.len())
      .finish()
  }
}

impl Default for MemoryBackend {
  fn default() -> Self {
    Self::new()
  }
}

impl MemoryBackend {
  const DEFAULT_SHARDS: usize = 16;

  pub fn new() -> Self {
    Self::with_shards(Self::DEFAULT_SHARDS)
  }

  /// Creates a backend with `shards` partitions, rounded up to a power of two.
  pub fn with_shards(shards: usize) -> Self {
    Self::with_hasher(shards, ahash::RandomState::new())
  }
}

impl<H: BuildHasher> MemoryBackend<H> {
  pub fn with_hasher(shards: usize, hasher: H) -> Self {
    let num_shards = shards.max(1).next_power_of_two();
    let mut shards = Vec::with_capacity(num_shards);
    for _ in 0..num_shards {
      shards.push(CachePadded::new(RwLock::new(HashMap::new())));
    }

    Self {
      shards: shards.into_boxed_slice(),
      hasher,
    }
  }

  #[inline]
  fn shard(&self, key: &str) -> &RwLock<HashMap<String, StoredBytes>> {
    let mut state = self.hasher.build_hasher();
    key.hash(&mut state);
    let index = state.finish() as usize & (self.shards.len() - 1);
    &self.shards[index]
  }

  /// Number of stored entries, including expired ones not yet purged.
  pub fn len(&self) -> usize {
    self.shards.iter().map(|shard| shard.read().len()).sum()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Removes every expired entry and returns how many were dropped.
  pub fn purge_expired(&self) -> usize {
    let mut purged = 0;
    for shard in self.shards.iter() {
      let mut guard = shard.write();
      let before = guard.len();
      guard.retain(|_, stored| !stored.is_expired());
      purged += before - guard.len();
    }
    purged
  }

  pub fn clear(&self) {
    for shard in self.shards.iter() {
      shard.write().clear();
    }
  }
}

impl<H: BuildHasher + Send + Sync> CacheBackend for MemoryBackend<H> {
  fn set(&self, key: &str, value: Vec<u8>, expires_at: DateTime<Utc>) -> Result<(), BoxError> {
    let stored = StoredBytes {
      bytes: value,
      expires_at,
    };
    self.shard(key).write().insert(key.to_owned(), stored);
    Ok(())
  }

  fn get(&self, key: &str) -> Result<Option<Vec<u8>>, BoxError> {
    let shard = self.shard(key);

    // Scope the read guard
    {
      let guard = shard.read();
      match guard.get(key) {
        None => return Ok(None),
        Some(stored) if !stored.is_expired() => return Ok(Some(stored.bytes.clone())),
        Some(_) => {}
      }
    }

    // Expired: drop it under the write lock unless it was replaced meanwhile.
    let mut guard = shard.write();
    if guard.get(key).is_some_and(StoredBytes::is_expired) {
      guard.remove(key);
    }
    Ok(None)
  }

  fn remove(&self, key: &str) -> Result<(), BoxError> {
    self.shard(key).write().remove(key);
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::time::absolute_expiration;

  use std::time::Duration;

  #[test]
  fn test_set_get_remove() {
    let backend = MemoryBackend::new();
    let expires = absolute_expiration(Duration::from_secs(60));

    backend.set("a", b"one".to_vec(), expires).unwrap();
    assert_eq!(backend.get("a").unwrap().as_deref(), Some(&b"one"[..]));

    backend.remove("a").unwrap();
    assert_eq!(backend.get("a").unwrap(), None);
    // Absent keys are fine.
    backend.remove("a").unwrap();
    assert!(backend.is_empty());
  }

  #[test]
  fn test_expired_entry_is_dropped_on_read() {
    let backend = MemoryBackend::with_shards(1);
    backend
      .set("gone", b"x".to_vec(), absolute_expiration(Duration::ZERO))
      .unwrap();
    assert_eq!(backend.len(), 1);
    assert_eq!(backend.get("gone").unwrap(), None);
    assert_eq!(backend.len(), 0);
  }

  #[test]
  fn test_purge_expired() {
    let backend = MemoryBackend::with_shards(3);
    let live = absolute_expiration(Duration::from_secs(60));
    let dead = absolute_expiration(Duration::ZERO);
    for i in 0..10 {
      let expires = if i % 2 == 0 { live } else { dead };
      backend.set(&i.to_string(), vec![i as u8], expires).unwrap();
    }

    assert_eq!(backend.purge_expired(), 5);
    assert_eq!(backend.len(), 5);
    assert_eq!(backend.get("0").unwrap(), Some(vec![0]));
  }
}
