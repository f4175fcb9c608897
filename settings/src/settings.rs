//! Per-dictionary settings access with optional read-through caching.

use crate::error::{is_blank, validate_dictionary_name, validate_key, Error, Result};
use crate::keys;
use crate::pool::Dispose;
use crate::source::SettingsSource;
use crate::store::CacheStore;

use core::fmt;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::OnceCell;
use parking_lot::Mutex;

/// How a [`Settings`] or [`Manager`](crate::Manager) uses the cache.
#[derive(Debug, Clone, Default)]
pub enum CacheMode {
  /// Every call goes straight to the backing store.
  #[default]
  Disabled,
  /// Values are cached in `store`, each entry expiring `timeout` after it
  /// was written. A zero timeout makes entries expire immediately.
  Enabled {
    store: Arc<CacheStore>,
    timeout: Duration,
  },
}

impl CacheMode {
  /// Caching through `store` with the store's default timeout.
  pub fn enabled(store: Arc<CacheStore>) -> Self {
    let timeout = store.default_timeout();
    CacheMode::Enabled { store, timeout }
  }

  pub fn with_timeout(store: Arc<CacheStore>, timeout: Duration) -> Self {
    CacheMode::Enabled { store, timeout }
  }

  pub fn is_enabled(&self) -> bool {
    matches!(self, CacheMode::Enabled { .. })
  }

  pub fn timeout(&self) -> Option<Duration> {
    match self {
      CacheMode::Enabled { timeout, .. } => Some(*timeout),
      CacheMode::Disabled => None,
    }
  }

  pub fn store(&self) -> Option<&Arc<CacheStore>> {
    match self {
      CacheMode::Enabled { store, .. } => Some(store),
      CacheMode::Disabled => None,
    }
  }
}

/// Access to one dictionary of settings.
///
/// The cache mode is configured at most once through [`init`](Settings::init);
/// until then the entity behaves as if caching were disabled.
///
/// Cached values belong to the dictionary, not to the handle that wrote them:
/// other handles on the same store read the same entries, so dropping a
/// handle leaves them in place. Every key written on behalf of this handle is
/// remembered and can be removed explicitly with
/// [`release_cache_entries`](Settings::release_cache_entries).
pub struct Settings<S> {
  dictionary_name: String,
  source: S,
  mode: OnceCell<CacheMode>,
  registered_keys: Mutex<HashSet<String>>,
}

impl<S> fmt::Debug for Settings<S> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Settings")
      .field("dictionary_name", &self.dictionary_name)
      .field("mode", &self.mode.get())
      .finish_non_exhaustive()
  }
}

impl<S: SettingsSource> Settings<S> {
  /// Creates an uninitialized entity for `dictionary_name`.
  pub fn new(dictionary_name: impl Into<String>, source: S) -> Result<Self> {
    let dictionary_name = dictionary_name.into();
    validate_dictionary_name(&dictionary_name)?;
    Ok(Self {
      dictionary_name,
      source,
      mode: OnceCell::new(),
      registered_keys: Mutex::new(HashSet::new()),
    })
  }

  /// Creates an entity that is already initialized with `mode`.
  pub fn with_cache(dictionary_name: impl Into<String>, source: S, mode: CacheMode) -> Result<Self> {
    let settings = Self::new(dictionary_name, source)?;
    settings.init(mode);
    Ok(settings)
  }

  pub fn dictionary_name(&self) -> &str {
    &self.dictionary_name
  }

  pub fn source(&self) -> &S {
    &self.source
  }

  pub fn use_cache(&self) -> bool {
    self.mode.get().is_some_and(CacheMode::is_enabled)
  }

  /// The configured entry timeout, `None` while caching is not in effect.
  pub fn cache_timeout(&self) -> Option<Duration> {
    self.mode.get().and_then(CacheMode::timeout)
  }

  pub fn is_initialized(&self) -> bool {
    self.mode.get().is_some()
  }

  /// Configures caching. Only the first call has an effect; later calls are
  /// ignored and return `false`.
  pub fn init(&self, mode: CacheMode) -> bool {
    let mut applied = false;
    self.mode.get_or_init(|| {
      applied = true;
      mode
    });
    if !applied {
      tracing::trace!(dictionary = %self.dictionary_name, "settings already initialized, ignoring init");
    }
    applied
  }

  /// Writes `value` to the backing store and, when caching, to the cache.
  pub fn set(&self, key: &str, value: &str) -> Result<()> {
    validate_key(key)?;
    if is_blank(value) {
      return Err(Error::EmptyValue {
        key: key.to_owned(),
      });
    }

    let Some((store, timeout)) = self.cache() else {
      self.source.set_value(key, value)?;
      return Ok(());
    };

    let item_key = self.item_key(key)?;
    let index_key = self.index_key()?;
    let _guard = store.lock_dictionary(&self.dictionary_name);

    self.source.set_value(key, value)?;
    store.add_string(&item_key, value, timeout)?;
    self.register(item_key);

    // A key unknown to the cached index would be missing from `get_all` hits.
    if let Some(indexed) = store.get_keys(&index_key)? {
      if !indexed.iter().any(|k| k == key) {
        store.remove(&index_key)?;
      }
    }
    Ok(())
  }

  /// Applies [`set`](Settings::set) to every entry in order.
  ///
  /// There is no rollback: entries before a failing one stay written.
  pub fn set_many<I, K, V>(&self, entries: I) -> Result<()>
  where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
  {
    for (key, value) in entries {
      self.set(key.as_ref(), value.as_ref())?;
    }
    Ok(())
  }

  /// Returns the value for `key` or [`Error::KeyNotFound`].
  pub fn get(&self, key: &str) -> Result<String> {
    self
      .try_get(key)?
      .ok_or_else(|| Error::KeyNotFound(key.to_owned()))
  }

  /// Returns the value for `key`, or `default` when it does not exist.
  pub fn get_or(&self, key: &str, default: &str) -> Result<String> {
    Ok(self.try_get(key)?.unwrap_or_else(|| default.to_owned()))
  }

  /// Returns the value for `key`, `None` when it does not exist.
  pub fn try_get(&self, key: &str) -> Result<Option<String>> {
    validate_key(key)?;

    match self.cache() {
      Some((store, timeout)) => {
        let _guard = store.lock_dictionary(&self.dictionary_name);
        self.read_through(store, timeout, key)
      }
      None => Ok(self.source.try_get_value(key)?),
    }
  }

  /// Returns every key and value of the dictionary.
  ///
  /// With caching, a cached key index is resolved key by key through the same
  /// read-through path as [`get`](Settings::get), so entries evicted behind
  /// the index are reloaded instead of lost. Keys the backing store no longer
  /// knows are left out.
  pub fn get_all(&self) -> Result<HashMap<String, String>> {
    let Some((store, timeout)) = self.cache() else {
      return Ok(self.source.get_all_values()?);
    };

    let index_key = self.index_key()?;
    let _guard = store.lock_dictionary(&self.dictionary_name);

    if let Some(indexed) = store.get_keys(&index_key)? {
      tracing::debug!(dictionary = %self.dictionary_name, keys = indexed.len(), "get_all served from cached index");
      let mut values = HashMap::with_capacity(indexed.len());
      for key in indexed {
        if let Some(value) = self.read_through(store, timeout, &key)? {
          values.insert(key, value);
        }
      }
      return Ok(values);
    }

    tracing::debug!(dictionary = %self.dictionary_name, "get_all cache miss, loading dictionary");
    let values = self.source.get_all_values()?;
    let mut indexed = Vec::with_capacity(values.len());
    for (key, value) in &values {
      // Blank keys cannot be addressed through `get` and are not cached.
      let Some(item_key) = keys::item_key(&self.dictionary_name, key) else {
        continue;
      };
      store.add_string(&item_key, value, timeout)?;
      self.register(item_key);
      indexed.push(key.clone());
    }
    store.add_keys(&index_key, &indexed, timeout)?;
    self.register(index_key);

    Ok(values)
  }

  /// Removes every cache entry written on behalf of this handle.
  ///
  /// Other handles on the same dictionary and store lose those entries too
  /// and fall back to the backing store on their next read. All entries are
  /// attempted; the first failure is returned.
  pub fn release_cache_entries(&self) -> Result<()> {
    let Some(store) = self.mode.get().and_then(CacheMode::store) else {
      return Ok(());
    };

    let _guard = store.lock_dictionary(&self.dictionary_name);
    let registered: Vec<String> = self.registered_keys.lock().drain().collect();
    let mut first_error = None;
    for key in registered {
      if let Err(err) = store.remove(&key) {
        first_error.get_or_insert(err);
      }
    }
    match first_error {
      Some(err) => Err(err),
      None => Ok(()),
    }
  }

  // --- Internals ---

  fn cache(&self) -> Option<(&Arc<CacheStore>, Duration)> {
    match self.mode.get()? {
      CacheMode::Enabled { store, timeout } => Some((store, *timeout)),
      CacheMode::Disabled => None,
    }
  }

  /// Cache lookup with fallback to the backing store. The caller holds the
  /// dictionary lock.
  fn read_through(&self, store: &CacheStore, timeout: Duration, key: &str) -> Result<Option<String>> {
    let item_key = self.item_key(key)?;
    if let Some(value) = store.get_string(&item_key)? {
      tracing::debug!(dictionary = %self.dictionary_name, key, "cache hit");
      return Ok(Some(value));
    }

    tracing::debug!(dictionary = %self.dictionary_name, key, "cache miss");
    let Some(value) = self.source.try_get_value(key)? else {
      return Ok(None);
    };
    store.add_string(&item_key, &value, timeout)?;
    self.register(item_key);
    Ok(Some(value))
  }

  fn item_key(&self, key: &str) -> Result<String> {
    keys::item_key(&self.dictionary_name, key).ok_or(Error::EmptyKey)
  }

  fn index_key(&self) -> Result<String> {
    keys::all_items_key(&self.dictionary_name).ok_or(Error::EmptyDictionaryName)
  }

  fn register(&self, cache_key: String) {
    self.registered_keys.lock().insert(cache_key);
  }
}

impl<S: SettingsSource> Dispose for Settings<S> {
  fn dispose(&self) {
    tracing::debug!(
      dictionary = %self.dictionary_name,
      registered = self.registered_keys.lock().len(),
      "settings entity left the pool"
    );
  }
}
