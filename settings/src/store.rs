//! The cache store adapter used by settings and managers.
//!
//! [`CacheStore`] wraps an injected [`CacheBackend`] and knows how to encode
//! the value kinds the settings layer caches:
//!
//! - scalar strings are stored as their UTF-8 bytes,
//! - string-to-string maps and key lists are stored as compact JSON.
//!
//! It also owns the striped locks that serialize cache mutations per
//! dictionary name.

use crate::backend::{CacheBackend, MemoryBackend};
use crate::error::{CodecError, Error, Result};
use crate::metrics::{Metrics, MetricsSnapshot};
use crate::time::{self, DEFAULT_CACHE_TIMEOUT, MIN_CACHE_TIMEOUT};

use core::fmt;
use std::collections::HashMap;
use std::hash::{BuildHasher, Hash, Hasher};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, MutexGuard};
use serde::de::DeserializeOwned;
use serde::Serialize;

const LOCK_STRIPES: usize = 64;

/// A swappable "put with expiration / get / remove" layer over a cache backend.
pub struct CacheStore {
  backend: Arc<dyn CacheBackend>,
  default_timeout: Duration,
  locks: Box<[Mutex<()>]>,
  lock_hasher: ahash::RandomState,
  metrics: Metrics,
}

impl fmt::Debug for CacheStore {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("CacheStore")
      .field("default_timeout", &self.default_timeout)
      .field("metrics", &self.metrics.snapshot())
      .finish_non_exhaustive()
  }
}

impl CacheStore {
  /// Creates a store over `backend`.
  ///
  /// Fails with [`Error::TimeoutTooShort`] when `default_timeout` is below
  /// [`MIN_CACHE_TIMEOUT`].
  pub fn new(backend: Arc<dyn CacheBackend>, default_timeout: Duration) -> Result<Self> {
    if default_timeout < MIN_CACHE_TIMEOUT {
      return Err(Error::TimeoutTooShort {
        timeout: default_timeout,
        minimum: MIN_CACHE_TIMEOUT,
      });
    }

    Ok(Self::from_parts(backend, default_timeout))
  }

  /// A store over a fresh [`MemoryBackend`] with [`DEFAULT_CACHE_TIMEOUT`].
  pub fn in_memory() -> Self {
    Self::from_parts(Arc::new(MemoryBackend::new()), DEFAULT_CACHE_TIMEOUT)
  }

  fn from_parts(backend: Arc<dyn CacheBackend>, default_timeout: Duration) -> Self {
    Self {
      backend,
      default_timeout,
      locks: (0..LOCK_STRIPES).map(|_| Mutex::new(())).collect(),
      lock_hasher: ahash::RandomState::new(),
      metrics: Metrics::default(),
    }
  }

  pub fn builder() -> CacheStoreBuilder {
    CacheStoreBuilder::default()
  }

  pub fn default_timeout(&self) -> Duration {
    self.default_timeout
  }

  pub fn backend(&self) -> &Arc<dyn CacheBackend> {
    &self.backend
  }

  pub fn metrics(&self) -> MetricsSnapshot {
    self.metrics.snapshot()
  }

  /// Acquires the mutual-exclusion domain of `dictionary_name`.
  ///
  /// Dictionaries are hashed onto a fixed set of lock stripes, so unrelated
  /// dictionaries rarely contend. Only one stripe is ever held at a time.
  pub fn lock_dictionary(&self, dictionary_name: &str) -> MutexGuard<'_, ()> {
    let mut state = self.lock_hasher.build_hasher();
    dictionary_name.hash(&mut state);
    let index = state.finish() as usize % self.locks.len();
    self.locks[index].lock()
  }

  // --- Writes ---

  pub fn add_string(&self, key: &str, value: &str, timeout: Duration) -> Result<()> {
    self.put_bytes(key, value.as_bytes().to_vec(), timeout)
  }

  pub fn add_map(&self, key: &str, map: &HashMap<String, String>, timeout: Duration) -> Result<()> {
    self.put_json(key, map, timeout)
  }

  /// Stores a list of settings keys, as used by the "get all" index.
  pub fn add_keys(&self, key: &str, keys: &[String], timeout: Duration) -> Result<()> {
    self.put_json(key, keys, timeout)
  }

  /// Removes `key`. Removing an absent key is not an error.
  pub fn remove(&self, key: &str) -> Result<()> {
    self.backend.remove(key)?;
    self.metrics.record_removal();
    tracing::trace!(key, "removed cache entry");
    Ok(())
  }

  // --- Reads ---

  /// Returns the string under `key`, `None` if absent or expired.
  pub fn get_string(&self, key: &str) -> Result<Option<String>> {
    let Some(bytes) = self.get_bytes(key)? else {
      return Ok(None);
    };
    let value = String::from_utf8(bytes).map_err(|source| codec_error(key, source))?;
    Ok(Some(value))
  }

  /// Returns the map under `key`. An empty map is a valid cached value and is
  /// returned as `Some`.
  pub fn get_map(&self, key: &str) -> Result<Option<HashMap<String, String>>> {
    self.get_json(key)
  }

  pub fn get_keys(&self, key: &str) -> Result<Option<Vec<String>>> {
    self.get_json(key)
  }

  // --- Internals ---

  fn put_json<T: Serialize + ?Sized>(&self, key: &str, value: &T, timeout: Duration) -> Result<()> {
    let bytes = serde_json::to_vec(value).map_err(|source| codec_error(key, source))?;
    self.put_bytes(key, bytes, timeout)
  }

  fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
    let Some(bytes) = self.get_bytes(key)? else {
      return Ok(None);
    };
    let value = serde_json::from_slice(&bytes).map_err(|source| codec_error(key, source))?;
    Ok(Some(value))
  }

  fn put_bytes(&self, key: &str, bytes: Vec<u8>, timeout: Duration) -> Result<()> {
    let expires_at = time::absolute_expiration(timeout);
    self.backend.set(key, bytes, expires_at)?;
    self.metrics.record_insert();
    tracing::trace!(key, ?timeout, "cached value");
    Ok(())
  }

  fn get_bytes(&self, key: &str) -> Result<Option<Vec<u8>>> {
    let found = self.backend.get(key)?;
    if found.is_some() {
      self.metrics.record_hit();
    } else {
      self.metrics.record_miss();
    }
    Ok(found)
  }
}

fn codec_error(key: &str, source: impl Into<CodecError>) -> Error {
  Error::Codec {
    key: key.to_owned(),
    source: source.into(),
  }
}

/// Builder for a [`CacheStore`].
#[derive(Default)]
pub struct CacheStoreBuilder {
  backend: Option<Arc<dyn CacheBackend>>,
  default_timeout: Option<Duration>,
}

impl fmt::Debug for CacheStoreBuilder {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("CacheStoreBuilder")
      .field("has_backend", &self.backend.is_some())
      .field("default_timeout", &self.default_timeout)
      .finish()
  }
}

impl CacheStoreBuilder {
  pub fn backend<B>(mut self, backend: B) -> Self
  where
    B: CacheBackend + 'static,
  {
    self.backend = Some(Arc::new(backend));
    self
  }

  pub fn shared_backend(mut self, backend: Arc<dyn CacheBackend>) -> Self {
    self.backend = Some(backend);
    self
  }

  /// Sets the timeout applied to entries; defaults to [`DEFAULT_CACHE_TIMEOUT`].
  pub fn default_timeout(mut self, timeout: Duration) -> Self {
    self.default_timeout = Some(timeout);
    self
  }

  pub fn build(self) -> Result<CacheStore> {
    let backend = self.backend.ok_or(Error::MissingBackend)?;
    CacheStore::new(backend, self.default_timeout.unwrap_or(DEFAULT_CACHE_TIMEOUT))
  }
}
