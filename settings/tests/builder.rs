mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{key, memory_store, value, CountingResolver};
use fibre_settings::{CacheBackend, Error, Manager, MemoryBackend, SettingsBuilder, MIN_CACHE_TIMEOUT};

#[test]
fn test_lookup_without_manager_fails() {
  let builder = SettingsBuilder::<CountingResolver>::new();
  assert!(matches!(builder.get_settings("app"), Err(Error::ManagerNotSet)));
  assert!(matches!(builder.get_or_create_settings("app"), Err(Error::ManagerNotSet)));
}

#[test]
fn test_blank_name_is_checked_before_manager() {
  let builder = SettingsBuilder::<CountingResolver>::new();
  assert!(matches!(builder.get_settings(" "), Err(Error::EmptyDictionaryName)));
}

#[test]
fn test_distributed_cache_validates_timeout() {
  let backend: Arc<dyn CacheBackend> = Arc::new(MemoryBackend::new());
  let err = SettingsBuilder::<CountingResolver>::new()
    .distributed_cache(backend.clone(), Duration::from_millis(50))
    .unwrap_err();
  assert!(matches!(err, Error::TimeoutTooShort { minimum, .. } if minimum == MIN_CACHE_TIMEOUT));

  assert!(SettingsBuilder::<CountingResolver>::new()
    .distributed_cache(backend, MIN_CACHE_TIMEOUT)
    .is_ok());
}

#[test]
fn test_builder_configures_manager_on_first_lookup() {
  let manager = Arc::new(Manager::new(CountingResolver::default().with_dictionary("app")));
  let builder = SettingsBuilder::new()
    .shared_manager(manager.clone())
    .cache_store(memory_store(Duration::from_millis(250)));
  assert!(!manager.is_initialized());

  let settings = builder.get_settings("app").unwrap();
  assert!(manager.use_cache());
  assert_eq!(settings.cache_timeout(), Some(Duration::from_millis(250)));
  assert_eq!(settings.get(&key(1)).unwrap(), value(1));
}

#[test]
fn test_second_builder_cannot_reconfigure_manager() {
  let manager = Arc::new(Manager::new(CountingResolver::default().with_dictionary("app")));
  SettingsBuilder::new()
    .shared_manager(manager.clone())
    .get_settings("app")
    .unwrap();

  let settings = SettingsBuilder::new()
    .shared_manager(manager.clone())
    .cache_store(memory_store(Duration::from_secs(1)))
    .get_or_create_settings("app")
    .unwrap();
  assert!(!manager.use_cache());
  assert!(!settings.use_cache());
}

#[test]
fn test_get_or_create_through_builder() {
  let builder = SettingsBuilder::new().manager(Manager::new(CountingResolver::default()));
  let settings = builder.get_or_create_settings("created").unwrap();
  settings.set("k", "v").unwrap();
  assert_eq!(builder.get_settings("created").unwrap().get("k").unwrap(), "v");
}
