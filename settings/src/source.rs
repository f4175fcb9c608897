//! Hooks implemented by concrete backing stores.
//!
//! The settings layer never persists anything itself. A concrete store
//! implements [`SettingsReader`] and [`SettingsWriter`] for one dictionary, and
//! a [`SettingsResolver`] tells a [`Manager`](crate::Manager) how to find or
//! create those stores by dictionary name.
//!
//! Errors returned from hooks are passed back to the caller untouched as
//! [`Error::Backend`](crate::Error::Backend).

use crate::error::BoxError;

use std::collections::HashMap;
use std::sync::Arc;

/// Read access to one dictionary of a backing store.
pub trait SettingsReader: Send + Sync {
  /// Returns the value for `key`, or `None` when the store has no such key.
  fn try_get_value(&self, key: &str) -> Result<Option<String>, BoxError>;

  /// Returns every key and value in the dictionary.
  fn get_all_values(&self) -> Result<HashMap<String, String>, BoxError>;
}

/// Write access to one dictionary of a backing store.
pub trait SettingsWriter: Send + Sync {
  fn set_value(&self, key: &str, value: &str) -> Result<(), BoxError>;
}

/// A backing store usable by [`Settings`](crate::Settings).
pub trait SettingsSource: SettingsReader + SettingsWriter {}

impl<T: SettingsReader + SettingsWriter + ?Sized> SettingsSource for T {}

/// Locates and creates backing stores by dictionary name.
pub trait SettingsResolver: Send + Sync {
  type Source: SettingsSource + 'static;

  /// Returns the store for `dictionary_name` if the dictionary exists.
  fn try_resolve(&self, dictionary_name: &str) -> Result<Option<Self::Source>, BoxError>;

  /// Materializes a new dictionary named `dictionary_name`.
  fn create(&self, dictionary_name: &str) -> Result<Self::Source, BoxError>;
}

impl<T: SettingsReader + ?Sized> SettingsReader for Arc<T> {
  fn try_get_value(&self, key: &str) -> Result<Option<String>, BoxError> {
    (**self).try_get_value(key)
  }

  fn get_all_values(&self) -> Result<HashMap<String, String>, BoxError> {
    (**self).get_all_values()
  }
}

impl<T: SettingsWriter + ?Sized> SettingsWriter for Arc<T> {
  fn set_value(&self, key: &str, value: &str) -> Result<(), BoxError> {
    (**self).set_value(key, value)
  }
}

impl<T: SettingsResolver + ?Sized> SettingsResolver for Arc<T> {
  type Source = T::Source;

  fn try_resolve(&self, dictionary_name: &str) -> Result<Option<Self::Source>, BoxError> {
    (**self).try_resolve(dictionary_name)
  }

  fn create(&self, dictionary_name: &str) -> Result<Self::Source, BoxError> {
    (**self).create(dictionary_name)
  }
}
