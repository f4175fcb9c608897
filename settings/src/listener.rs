use std::fmt;
use std::sync::Arc;

/// Describes the reason an entity was removed from an [`EntityPool`](crate::EntityPool).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvictionReason {
  /// The entity outlived the pool's time-to-live.
  Expired,
  /// The entity was removed by name.
  Invalidated,
  /// The pool was cleared or its owner closed.
  Closed,
}

impl fmt::Display for EvictionReason {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      EvictionReason::Expired => write!(f, "evicted due to expiration (TTL)"),
      EvictionReason::Invalidated => write!(f, "manually invalidated"),
      EvictionReason::Closed => write!(f, "released on close"),
    }
  }
}

/// A listener notified when pooled entities are evicted.
///
/// `on_evict` runs on the thread that triggered the eviction, after the
/// entity has been disposed.
pub trait EvictionListener<V>: Send + Sync {
  fn on_evict(&self, name: &str, value: Arc<V>, reason: EvictionReason);
}
