use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};

/// Default timeout for cached entries (15 minutes).
pub const DEFAULT_CACHE_TIMEOUT: Duration = Duration::from_millis(900_000);

/// Smallest timeout accepted by [`CacheStore`](crate::CacheStore).
pub const MIN_CACHE_TIMEOUT: Duration = Duration::from_millis(100);

/// Computes the absolute expiration of an entry inserted now.
///
/// A zero timeout yields "now", which every backend treats as already expired.
#[inline]
pub fn absolute_expiration(timeout: Duration) -> DateTime<Utc> {
  absolute_expiration_from(Utc::now(), timeout)
}

pub(crate) fn absolute_expiration_from(now: DateTime<Utc>, timeout: Duration) -> DateTime<Utc> {
  let delta = TimeDelta::from_std(timeout).unwrap_or(TimeDelta::MAX);
  now.checked_add_signed(delta).unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Converts a signed millisecond count into a timeout.
///
/// Negative values clamp to zero, i.e. immediate expiration.
#[inline]
pub fn timeout_from_millis(millis: i64) -> Duration {
  Duration::from_millis(millis.max(0) as u64)
}

#[inline]
pub(crate) fn is_expired(expires_at: DateTime<Utc>) -> bool {
  Utc::now() >= expires_at
}
