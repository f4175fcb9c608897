use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crossbeam_utils::CachePadded;

/// Lock-free counters kept by a [`CacheStore`](crate::CacheStore).
#[derive(Debug, Default)]
pub(crate) struct Metrics {
  pub(crate) hits: CachePadded<AtomicU64>,
  pub(crate) misses: CachePadded<AtomicU64>,
  pub(crate) inserts: CachePadded<AtomicU64>,
  pub(crate) removals: CachePadded<AtomicU64>,
}

impl Metrics {
  #[inline]
  pub(crate) fn record_hit(&self) {
    self.hits.fetch_add(1, Ordering::Relaxed);
  }

  #[inline]
  pub(crate) fn record_miss(&self) {
    self.misses.fetch_add(1, Ordering::Relaxed);
  }

  #[inline]
  pub(crate) fn record_insert(&self) {
    self.inserts.fetch_add(1, Ordering::Relaxed);
  }

  #[inline]
  pub(crate) fn record_removal(&self) {
    self.removals.fetch_add(1, Ordering::Relaxed);
  }

  pub(crate) fn snapshot(&self) -> MetricsSnapshot {
    MetricsSnapshot {
      hits: self.hits.load(Ordering::Relaxed),
      misses: self.misses.load(Ordering::Relaxed),
      inserts: self.inserts.load(Ordering::Relaxed),
      removals: self.removals.load(Ordering::Relaxed),
    }
  }
}

/// A point-in-time copy of the cache store counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
  /// Lookups that found a live entry.
  pub hits: u64,
  /// Lookups that found nothing.
  pub misses: u64,
  pub inserts: u64,
  /// Explicit removals, whether or not the key was present.
  pub removals: u64,
}

impl MetricsSnapshot {
  /// Fraction of lookups that were hits, `0.0` when nothing was looked up.
  pub fn hit_ratio(&self) -> f64 {
    let total = self.hits + self.misses;
    if total == 0 {
      0.0
    } else {
      self.hits as f64 / total as f64
    }
  }
}

impl fmt::Display for MetricsSnapshot {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "hits={} misses={} inserts={} removals={} hit_ratio={:.2}",
      self.hits,
      self.misses,
      self.inserts,
      self.removals,
      self.hit_ratio()
    )
  }
}
