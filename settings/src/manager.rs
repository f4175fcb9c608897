//! Resolution of [`Settings`] by dictionary name.

use crate::error::{validate_dictionary_name, Error, Result};
use crate::pool::EntityPool;
use crate::settings::{CacheMode, Settings};
use crate::source::SettingsResolver;

use core::fmt;
use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::OnceCell;

/// Settings entity type produced by a manager over resolver `R`.
pub type ManagedSettings<R> = Settings<<R as SettingsResolver>::Source>;

/// A registry of [`Settings`] entities backed by a [`SettingsResolver`].
///
/// Resolved entities are pooled by dictionary name, so repeated lookups return
/// the same instance until it is removed or expires from the pool. Every
/// lookup hands the manager's [`CacheMode`] to the entity; entities resolved
/// before [`init`](Manager::init) stay uninitialized and pick the mode up on
/// their next lookup afterwards.
pub struct Manager<R: SettingsResolver> {
  resolver: R,
  mode: OnceCell<CacheMode>,
  pool: EntityPool<ManagedSettings<R>>,
}

impl<R: SettingsResolver> fmt::Debug for Manager<R> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Manager")
      .field("mode", &self.mode.get())
      .field("pool", &self.pool)
      .finish_non_exhaustive()
  }
}

impl<R: SettingsResolver> Manager<R> {
  pub fn new(resolver: R) -> Self {
    Self::with_pool(resolver, EntityPool::new())
  }

  /// Uses a preconfigured pool, e.g. one with a time-to-live or an eviction
  /// listener.
  pub fn with_pool(resolver: R, pool: EntityPool<ManagedSettings<R>>) -> Self {
    Self {
      resolver,
      mode: OnceCell::new(),
      pool,
    }
  }

  /// Pooled entities are evicted and disposed `ttl` after they were resolved.
  pub fn with_entity_ttl(resolver: R, ttl: Duration) -> Self {
    Self::with_pool(resolver, EntityPool::new().time_to_live(ttl))
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
      tracing::trace!("manager already initialized, ignoring init");
    }
    applied
  }

  pub fn is_initialized(&self) -> bool {
    self.mode.get().is_some()
  }

  pub fn use_cache(&self) -> bool {
    self.mode.get().is_some_and(CacheMode::is_enabled)
  }

  pub fn cache_timeout(&self) -> Option<Duration> {
    self.mode.get().and_then(CacheMode::timeout)
  }

  pub fn resolver(&self) -> &R {
    &self.resolver
  }

  /// Number of pooled entities.
  pub fn len(&self) -> usize {
    self.pool.len()
  }

  pub fn is_empty(&self) -> bool {
    self.pool.is_empty()
  }

  /// Returns the settings of an existing dictionary.
  ///
  /// Looks in the pool first, then asks the resolver. Fails with
  /// [`Error::DictionaryNotFound`] when the resolver does not know the name.
  pub fn get_settings(&self, dictionary_name: &str) -> Result<Arc<ManagedSettings<R>>> {
    validate_dictionary_name(dictionary_name)?;

    if let Some(settings) = self.pool.get(dictionary_name) {
      return Ok(self.apply_mode(settings));
    }

    let settings = self.pool.get_or_try_insert_with(dictionary_name, || {
      match self.resolver.try_resolve(dictionary_name)? {
        Some(source) => self.build_settings(dictionary_name, source),
        None => Err(Error::DictionaryNotFound(dictionary_name.to_owned())),
      }
    })?;
    Ok(self.apply_mode(settings))
  }

  /// Returns the settings of a dictionary, creating the dictionary when the
  /// resolver does not know it.
  ///
  /// Racing first-time calls for the same name run the creation hook once
  /// and all receive the same entity.
  pub fn get_or_create_settings(&self, dictionary_name: &str) -> Result<Arc<ManagedSettings<R>>> {
    validate_dictionary_name(dictionary_name)?;

    let settings = self.pool.get_or_try_insert_with(dictionary_name, || {
      let source = match self.resolver.try_resolve(dictionary_name)? {
        Some(source) => source,
        None => {
          tracing::debug!(dictionary = dictionary_name, "creating dictionary");
          self.resolver.create(dictionary_name)?
        }
      };
      self.build_settings(dictionary_name, source)
    })?;
    Ok(self.apply_mode(settings))
  }

  /// Removes and disposes the pooled entity for `dictionary_name`.
  pub fn remove(&self, dictionary_name: &str) -> bool {
    self.pool.remove(dictionary_name)
  }

  /// Disposes every entity whose pool time-to-live has passed.
  pub fn purge_expired(&self) -> usize {
    self.pool.purge_expired()
  }

  /// Disposes every pooled entity. Cached values are left in the store.
  pub fn close(&self) {
    self.pool.clear();
  }

  fn build_settings(&self, dictionary_name: &str, source: R::Source) -> Result<ManagedSettings<R>> {
    tracing::debug!(dictionary = dictionary_name, use_cache = self.use_cache(), "resolved settings");
    Settings::new(dictionary_name, source)
  }

  fn apply_mode(&self, settings: Arc<ManagedSettings<R>>) -> Arc<ManagedSettings<R>> {
    if let Some(mode) = self.mode.get() {
      if !settings.is_initialized() {
        settings.init(mode.clone());
      }
    }
    settings
  }
}

impl<R: SettingsResolver> Drop for Manager<R> {
  fn drop(&mut self) {
    self.pool.clear();
  }
}
