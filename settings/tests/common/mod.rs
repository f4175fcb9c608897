#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use fibre_settings::{
  BoxError, CacheMode, CacheStore, MemoryBackend, SettingsReader, SettingsResolver, SettingsWriter,
};
use parking_lot::Mutex;

pub const ENTRY_COUNT: usize = 10;

pub fn key(i: usize) -> String {
  format!("key{}", i)
}

pub fn value(i: usize) -> String {
  format!("value{}", i)
}

/// An in-memory dictionary that counts every call made into it.
#[derive(Debug)]
pub struct CountingSource {
  entries: Mutex<HashMap<String, String>>,
  /// When false, single-key reads behave as if the key did not exist.
  return_value: AtomicBool,
  pub get_calls: AtomicUsize,
  pub get_all_calls: AtomicUsize,
  pub set_calls: AtomicUsize,
}

impl Default for CountingSource {
  fn default() -> Self {
    Self::with_entries(HashMap::new())
  }
}

impl CountingSource {
  /// A source pre-filled with `key0..key9` mapped to `value0..value9`.
  pub fn populated() -> Self {
    Self::with_entries((0..ENTRY_COUNT).map(|i| (key(i), value(i))).collect())
  }

  pub fn with_entries(entries: HashMap<String, String>) -> Self {
    Self {
      entries: Mutex::new(entries),
      return_value: AtomicBool::new(true),
      get_calls: AtomicUsize::new(0),
      get_all_calls: AtomicUsize::new(0),
      set_calls: AtomicUsize::new(0),
    }
  }

  pub fn set_return_value(&self, enabled: bool) {
    self.return_value.store(enabled, Ordering::SeqCst);
  }

  /// Changes the stored data without going through the settings layer.
  pub fn put_behind_cache(&self, key: &str, value: &str) {
    self.entries.lock().insert(key.to_owned(), value.to_owned());
  }

  pub fn remove_behind_cache(&self, key: &str) {
    self.entries.lock().remove(key);
  }

  pub fn gets(&self) -> usize {
    self.get_calls.load(Ordering::SeqCst)
  }

  pub fn get_alls(&self) -> usize {
    self.get_all_calls.load(Ordering::SeqCst)
  }

  pub fn sets(&self) -> usize {
    self.set_calls.load(Ordering::SeqCst)
  }
}

impl SettingsReader for CountingSource {
  fn try_get_value(&self, key: &str) -> Result<Option<String>, BoxError> {
    self.get_calls.fetch_add(1, Ordering::SeqCst);
    if !self.return_value.load(Ordering::SeqCst) {
      return Ok(None);
    }
    Ok(self.entries.lock().get(key).cloned())
  }

  fn get_all_values(&self) -> Result<HashMap<String, String>, BoxError> {
    self.get_all_calls.fetch_add(1, Ordering::SeqCst);
    Ok(self.entries.lock().clone())
  }
}

impl SettingsWriter for CountingSource {
  fn set_value(&self, key: &str, value: &str) -> Result<(), BoxError> {
    self.set_calls.fetch_add(1, Ordering::SeqCst);
    self.entries.lock().insert(key.to_owned(), value.to_owned());
    Ok(())
  }
}

/// A source whose every call fails.
#[derive(Debug, Default)]
pub struct FailingSource;

impl SettingsReader for FailingSource {
  fn try_get_value(&self, _key: &str) -> Result<Option<String>, BoxError> {
    Err("backing store unavailable".into())
  }

  fn get_all_values(&self) -> Result<HashMap<String, String>, BoxError> {
    Err("backing store unavailable".into())
  }
}

impl SettingsWriter for FailingSource {
  fn set_value(&self, _key: &str, _value: &str) -> Result<(), BoxError> {
    Err("backing store unavailable".into())
  }
}

/// Resolves dictionaries from a fixed set of names and counts creations.
#[derive(Debug, Default)]
pub struct CountingResolver {
  known: Mutex<HashMap<String, Arc<CountingSource>>>,
  pub resolve_calls: AtomicUsize,
  pub create_calls: AtomicUsize,
  /// Artificial delay inside `create`, to widen race windows.
  create_delay: Option<Duration>,
}

impl CountingResolver {
  pub fn with_create_delay(mut self, delay: Duration) -> Self {
    self.create_delay = Some(delay);
    self
  }

  pub fn with_dictionary(self, name: &str) -> Self {
    self
      .known
      .lock()
      .insert(name.to_owned(), Arc::new(CountingSource::populated()));
    self
  }

  pub fn source(&self, name: &str) -> Option<Arc<CountingSource>> {
    self.known.lock().get(name).cloned()
  }

  pub fn creates(&self) -> usize {
    self.create_calls.load(Ordering::SeqCst)
  }

  pub fn resolves(&self) -> usize {
    self.resolve_calls.load(Ordering::SeqCst)
  }
}

impl SettingsResolver for CountingResolver {
  type Source = Arc<CountingSource>;

  fn try_resolve(&self, dictionary_name: &str) -> Result<Option<Self::Source>, BoxError> {
    self.resolve_calls.fetch_add(1, Ordering::SeqCst);
    Ok(self.known.lock().get(dictionary_name).cloned())
  }

  fn create(&self, dictionary_name: &str) -> Result<Self::Source, BoxError> {
    self.create_calls.fetch_add(1, Ordering::SeqCst);
    if let Some(delay) = self.create_delay {
      std::thread::sleep(delay);
    }
    let source = Arc::new(CountingSource::default());
    self.known.lock().insert(dictionary_name.to_owned(), source.clone());
    Ok(source)
  }
}

pub fn memory_store(timeout: Duration) -> Arc<CacheStore> {
  Arc::new(
    CacheStore::builder()
      .backend(MemoryBackend::new())
      .default_timeout(timeout)
      .build()
      .unwrap(),
  )
}

pub fn cached(timeout: Duration) -> CacheMode {
  CacheMode::enabled(memory_store(timeout))
}
