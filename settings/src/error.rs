use std::time::Duration;

use thiserror::Error;

/// Error type produced by backing-store hooks and cache backends.
///
/// The library never inspects these; they are handed back to the caller as
/// [`Error::Backend`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The main error type for the `fibre_settings` library.
#[derive(Debug, Error)]
pub enum Error {
  #[error("The name of the dictionary cannot be empty or whitespace.")]
  EmptyDictionaryName,

  #[error("The settings key cannot be empty or whitespace.")]
  EmptyKey,

  #[error("The settings value for \"{key}\" cannot be empty or whitespace.")]
  EmptyValue { key: String },

  #[error("The cache timeout {timeout:?} cannot be lower than {minimum:?}.")]
  TimeoutTooShort { timeout: Duration, minimum: Duration },

  #[error("No cache backend was configured.")]
  MissingBackend,

  #[error("Manager object was not added.")]
  ManagerNotSet,

  #[error("Invalid settings configuration: {0}")]
  InvalidConfig(String),

  #[error("Failed to read settings configuration: {0}")]
  ConfigRead(#[from] std::io::Error),

  #[error("The key \"{0}\" was not found.")]
  KeyNotFound(String),

  #[error("The dictionary \"{0}\" was not found.")]
  DictionaryNotFound(String),

  #[error("Failed to encode or decode the cached value under '{key}': {source}")]
  Codec {
    key: String,
    #[source]
    source: CodecError,
  },

  #[error(transparent)]
  Backend(#[from] BoxError),
}

/// Why a cached value could not be encoded or decoded.
#[derive(Debug, Error)]
pub enum CodecError {
  #[error("invalid JSON: {0}")]
  Json(#[from] serde_json::Error),

  #[error("invalid UTF-8: {0}")]
  Utf8(#[from] std::string::FromUtf8Error),
}

impl Error {
  /// Returns `true` for errors caused by an invalid argument or configuration.
  pub fn is_config_error(&self) -> bool {
    matches!(
      self,
      Error::EmptyDictionaryName
        | Error::EmptyKey
        | Error::EmptyValue { .. }
        | Error::TimeoutTooShort { .. }
        | Error::MissingBackend
        | Error::ManagerNotSet
        | Error::InvalidConfig(_)
        | Error::ConfigRead(_)
    )
  }

  /// Returns `true` when a key or a dictionary could not be found.
  pub fn is_not_found(&self) -> bool {
    matches!(self, Error::KeyNotFound(_) | Error::DictionaryNotFound(_))
  }
}

/// A specialized `Result` type for `fibre_settings` operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Rejects empty and whitespace-only strings.
pub(crate) fn is_blank(value: &str) -> bool {
  value.trim().is_empty()
}

pub(crate) fn validate_dictionary_name(name: &str) -> Result<()> {
  if is_blank(name) {
    return Err(Error::EmptyDictionaryName);
  }
  Ok(())
}

pub(crate) fn validate_key(key: &str) -> Result<()> {
  if is_blank(key) {
    return Err(Error::EmptyKey);
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_error_classification() {
    assert!(Error::EmptyKey.is_config_error());
    assert!(Error::ManagerNotSet.is_config_error());
    assert!(!Error::EmptyKey.is_not_found());
    assert!(Error::KeyNotFound("a".into()).is_not_found());
    assert!(Error::DictionaryNotFound("d".into()).is_not_found());

    let backend: BoxError = "connection reset".into();
    let err = Error::from(backend);
    assert!(!err.is_config_error());
    assert!(!err.is_not_found());
    assert_eq!(err.to_string(), "connection reset");
  }

  #[test]
  fn test_blank_detection() {
    assert!(is_blank(""));
    assert!(is_blank("   \t"));
    assert!(!is_blank(" a "));
  }
}
