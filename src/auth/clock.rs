//! Time sources for TTL arithmetic.
//!
//! Every expiry decision in the crate goes through a [`Clock`] so tests can
//! move time forward without sleeping.

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// A wall clock reporting Unix time in whole seconds.
pub trait Clock: Send + Sync {
    /// Current Unix timestamp in seconds.
    fn now(&self) -> i64;
}

/// The system wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        // A clock set before 1970 reads as the epoch instead of panicking.
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0)
    }
}

/// A clock that only moves when told to.
///
/// # Example
///
/// ```rust
/// use wallet_auth::{Clock, ManualClock};
///
/// let clock = ManualClock::new(1_700_000_000);
/// clock.advance(120);
/// assert_eq!(clock.now(), 1_700_000_120);
/// ```
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    pub fn new(now: i64) -> Self {
        Self {
            now: AtomicI64::new(now),
        }
    }

    /// Moves the clock forward by `seconds`.
    pub fn advance(&self, seconds: i64) {
        self.now.fetch_add(seconds, Ordering::SeqCst);
    }

    pub fn set(&self, now: i64) {
        self.now.store(now, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Whether an absolute expiry has passed. An entry is still valid at the
/// exact second it expires.
pub(crate) fn is_past(expires_at: i64, now: i64) -> bool {
    now > expires_at
}

/// `now + ttl`, saturating at `i64::MAX` for TTLs too large to represent.
pub(crate) fn expiry_after(now: i64, ttl: Duration) -> i64 {
    now.saturating_add(i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_clock() {
        // Should be a reasonable timestamp (after year 2020)
        assert!(SystemClock.now() > 1577836800);
    }

    #[test]
    fn test_manual_clock_advance_and_set() {
        let clock = ManualClock::new(100);
        assert_eq!(clock.now(), 100);

        clock.advance(20);
        assert_eq!(clock.now(), 120);

        clock.set(5);
        assert_eq!(clock.now(), 5);
    }

    #[test]
    fn test_is_past() {
        assert!(!is_past(100, 99));
        assert!(!is_past(100, 100));
        assert!(is_past(100, 101));
    }

    #[test]
    fn test_expiry_after_saturates() {
        assert_eq!(expiry_after(100, Duration::from_secs(120)), 220);
        assert_eq!(expiry_after(1_700_000_000, Duration::MAX), i64::MAX);
        assert_eq!(
            expiry_after(1_700_000_000, Duration::from_secs(i64::MAX as u64)),
            i64::MAX
        );
    }
}
