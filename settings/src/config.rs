//! File-driven cache configuration.
//!
//! ```yaml
//! cache:
//!   enabled: true
//!   timeout: 15m        # humantime string, or integer milliseconds
//!   entity_ttl: 1h      # optional
//! ```

use crate::backend::CacheBackend;
use crate::error::{Error, Result};
use crate::manager::Manager;
use crate::pool::EntityPool;
use crate::settings::CacheMode;
use crate::source::SettingsResolver;
use crate::store::CacheStore;
use crate::time::{self, DEFAULT_CACHE_TIMEOUT};

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Deserializer};

// --- Raw (as written in the file) ---

#[derive(Debug, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
struct ConfigRaw {
  #[serde(default)]
  cache: CacheSectionRaw,
}

#[derive(Debug, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
struct CacheSectionRaw {
  #[serde(default)] // Defaults to false if not present
  enabled: bool,
  #[serde(default)]
  timeout: Option<DurationRaw>,
  #[serde(default)]
  entity_ttl: Option<DurationRaw>,
}

#[derive(Debug, PartialEq)]
struct DurationRaw(Duration);

impl<'de> Deserialize<'de> for DurationRaw {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
      Millis(i64),
      Text(String),
    }

    match Repr::deserialize(deserializer)? {
      Repr::Millis(millis) => Ok(DurationRaw(time::timeout_from_millis(millis))),
      Repr::Text(text) => humantime::parse_duration(text.trim())
        .map(DurationRaw)
        .map_err(serde::de::Error::custom),
    }
  }
}

// --- Processed ---

/// Cache settings of a [`SettingsConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheSection {
  pub enabled: bool,
  /// Lifetime of cached values. Negative millisecond values were clamped to zero.
  pub timeout: Duration,
  /// Lifetime of pooled settings entities, `None` to keep them until removed.
  pub entity_ttl: Option<Duration>,
}

impl Default for CacheSection {
  fn default() -> Self {
    Self {
      enabled: false,
      timeout: DEFAULT_CACHE_TIMEOUT,
      entity_ttl: None,
    }
  }
}

/// Configuration for managers and settings, loadable from YAML or JSON.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SettingsConfig {
  pub cache: CacheSection,
}

impl SettingsConfig {
  pub fn from_yaml_str(input: &str) -> Result<Self> {
    let raw: ConfigRaw = serde_yaml::from_str(input).map_err(|e| Error::InvalidConfig(e.to_string()))?;
    Ok(Self::process(raw))
  }

  pub fn from_json_str(input: &str) -> Result<Self> {
    let raw: ConfigRaw = serde_json::from_str(input).map_err(|e| Error::InvalidConfig(e.to_string()))?;
    Ok(Self::process(raw))
  }

  /// Loads a `.json`, `.yaml` or `.yml` file.
  pub fn from_path(path: &Path) -> Result<Self> {
    let contents = fs::read_to_string(path)?;
    match path.extension().and_then(|ext| ext.to_str()) {
      Some("json") => Self::from_json_str(&contents),
      Some("yaml") | Some("yml") => Self::from_yaml_str(&contents),
      other => Err(Error::InvalidConfig(format!(
        "unsupported configuration file extension {:?} for {}",
        other,
        path.display()
      ))),
    }
  }

  fn process(raw: ConfigRaw) -> Self {
    let defaults = CacheSection::default();
    Self {
      cache: CacheSection {
        enabled: raw.cache.enabled,
        timeout: raw.cache.timeout.map_or(defaults.timeout, |d| d.0),
        entity_ttl: raw.cache.entity_ttl.map(|d| d.0),
      },
    }
  }

  /// Builds the cache mode described by this configuration over `backend`.
  ///
  /// The store keeps [`DEFAULT_CACHE_TIMEOUT`] as its default; entries
  /// written by settings use the configured `timeout`.
  pub fn cache_mode(&self, backend: Arc<dyn CacheBackend>) -> Result<CacheMode> {
    if !self.cache.enabled {
      return Ok(CacheMode::Disabled);
    }
    let store = CacheStore::new(backend, DEFAULT_CACHE_TIMEOUT)?;
    Ok(CacheMode::with_timeout(Arc::new(store), self.cache.timeout))
  }

  /// Creates a manager over `resolver`, initialized from this configuration.
  pub fn build_manager<R: SettingsResolver>(&self, resolver: R, backend: Arc<dyn CacheBackend>) -> Result<Manager<R>> {
    let mut pool = EntityPool::new();
    if let Some(ttl) = self.cache.entity_ttl {
      pool = pool.time_to_live(ttl);
    }
    let manager = Manager::with_pool(resolver, pool);
    manager.init(self.cache_mode(backend)?);
    Ok(manager)
  }
}
