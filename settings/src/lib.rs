//! Read-through cached access to named dictionaries of string settings.
//!
//! # Overview
//! - **Settings**: per-dictionary `get`/`set`/`get_all` over a pluggable
//!   backing store, with an optional read-through cache and a cached key index
//!   for `get_all`.
//! - **Manager**: resolves and creates [`Settings`] by dictionary name and
//!   pools the resolved entities, disposing them on removal or expiry.
//! - **CacheStore**: a typed adapter over any [`CacheBackend`], with absolute
//!   expiration and per-dictionary locking. [`MemoryBackend`] is the built-in
//!   in-process backend.
//! - **Configuration**: [`SettingsBuilder`] for code, [`SettingsConfig`] for
//!   YAML or JSON files.
//!
//! Concrete backing stores implement [`SettingsReader`], [`SettingsWriter`]
//! and, for use with a [`Manager`], [`SettingsResolver`].

pub mod backend;
pub mod builder;
pub mod config;
pub mod error;
pub mod keys;
pub mod listener;
pub mod manager;
pub mod metrics;
pub mod pool;
pub mod settings;
pub mod source;
pub mod store;
pub mod time;

pub use backend::{CacheBackend, MemoryBackend};
pub use builder::SettingsBuilder;
pub use config::{CacheSection, SettingsConfig};
pub use error::{BoxError, CodecError, Error, Result};
pub use listener::{EvictionListener, EvictionReason};
pub use manager::{ManagedSettings, Manager};
pub use metrics::MetricsSnapshot;
pub use pool::{Dispose, EntityPool};
pub use settings::{CacheMode, Settings};
pub use source::{SettingsReader, SettingsResolver, SettingsSource, SettingsWriter};
pub use store::{CacheStore, CacheStoreBuilder};
pub use time::{DEFAULT_CACHE_TIMEOUT, MIN_CACHE_TIMEOUT};
