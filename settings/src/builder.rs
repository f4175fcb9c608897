use crate::backend::CacheBackend;
use crate::error::{validate_dictionary_name, Error, Result};
use crate::manager::{ManagedSettings, Manager};
use crate::settings::CacheMode;
use crate::source::SettingsResolver;
use crate::store::CacheStore;

use core::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Fluent entry point tying a [`Manager`] to a cache configuration.
///
/// The cache mode is handed to the manager on the first lookup; since a
/// manager only accepts its first configuration, builders sharing one manager
/// cannot reconfigure it afterwards.
pub struct SettingsBuilder<R: SettingsResolver> {
  manager: Option<Arc<Manager<R>>>,
  mode: CacheMode,
}

impl<R: SettingsResolver> fmt::Debug for SettingsBuilder<R> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("SettingsBuilder")
      .field("has_manager", &self.manager.is_some())
      .field("mode", &self.mode)
      .finish()
  }
}

impl<R: SettingsResolver> Default for SettingsBuilder<R> {
  fn default() -> Self {
    Self::new()
  }
}

impl<R: SettingsResolver> SettingsBuilder<R> {
  pub fn new() -> Self {
    Self {
      manager: None,
      mode: CacheMode::Disabled,
    }
  }

  pub fn manager(self, manager: Manager<R>) -> Self {
    self.shared_manager(Arc::new(manager))
  }

  pub fn shared_manager(mut self, manager: Arc<Manager<R>>) -> Self {
    self.manager = Some(manager);
    self
  }

  /// Enables caching through `store` with the store's default timeout.
  pub fn cache_store(mut self, store: Arc<CacheStore>) -> Self {
    self.mode = CacheMode::enabled(store);
    self
  }

  /// Enables caching through a distributed cache client.
  ///
  /// Fails when `timeout` is below [`MIN_CACHE_TIMEOUT`](crate::MIN_CACHE_TIMEOUT).
  pub fn distributed_cache(mut self, backend: Arc<dyn CacheBackend>, timeout: Duration) -> Result<Self> {
    let store = CacheStore::new(backend, timeout)?;
    self.mode = CacheMode::enabled(Arc::new(store));
    Ok(self)
  }

  pub fn cache_mode(mut self, mode: CacheMode) -> Self {
    self.mode = mode;
    self
  }

  /// Returns the settings of an existing dictionary.
  pub fn get_settings(&self, dictionary_name: &str) -> Result<Arc<ManagedSettings<R>>> {
    validate_dictionary_name(dictionary_name)?;
    self.init_manager()?.get_settings(dictionary_name)
  }

  /// Returns the settings of a dictionary, creating it when missing.
  pub fn get_or_create_settings(&self, dictionary_name: &str) -> Result<Arc<ManagedSettings<R>>> {
    validate_dictionary_name(dictionary_name)?;
    self.init_manager()?.get_or_create_settings(dictionary_name)
  }

  fn init_manager(&self) -> Result<&Manager<R>> {
    let manager = self.manager.as_deref().ok_or(Error::ManagerNotSet)?;
    manager.init(self.mode.clone());
    Ok(manager)
  }
}
