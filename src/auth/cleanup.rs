//! Strategies deciding when the registry evicts expired nonces.
//!
//! Expiry is enforced lazily on consume, so eviction only bounds memory:
//! nonces that are requested but never used would otherwise stay in the map
//! until their identity asks again.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::auth::clock::{Clock, SystemClock};

/// Strategy for determining when to perform expired-nonce eviction.
#[async_trait]
pub trait CleanupStrategy: Send + Sync {
    /// Determines whether cleanup should be triggered.
    ///
    /// Called after each issued nonce.
    async fn should_cleanup(&self) -> bool;

    /// Marks that cleanup has been performed and resets internal state.
    async fn mark_as_cleaned(&self);
}

/// Triggers cleanup after `count_threshold` issued nonces or once
/// `time_threshold` has elapsed since the last cleanup, whichever comes first.
pub struct HybridCleanupStrategy {
    count_threshold: u32,
    time_threshold: Duration,
    request_count: AtomicU32,
    last_cleanup_time: AtomicI64,
    clock: Arc<dyn Clock>,
}

impl HybridCleanupStrategy {
    /// Creates a new hybrid cleanup strategy driven by the system clock.
    ///
    /// # Example
    ///
    /// ```
    /// use std::time::Duration;
    /// use wallet_auth::HybridCleanupStrategy;
    ///
    /// // Cleanup every 100 issued nonces or every 5 minutes
    /// let strategy = HybridCleanupStrategy::new(100, Duration::from_secs(300));
    /// ```
    pub fn new(count_threshold: u32, time_threshold: Duration) -> Self {
        Self::with_clock(count_threshold, time_threshold, Arc::new(SystemClock))
    }

    pub fn with_clock(count_threshold: u32, time_threshold: Duration, clock: Arc<dyn Clock>) -> Self {
        let now = clock.now();
        Self {
            count_threshold,
            time_threshold,
            request_count: AtomicU32::new(0),
            last_cleanup_time: AtomicI64::new(now),
            clock,
        }
    }
}

#[async_trait]
impl CleanupStrategy for HybridCleanupStrategy {
    async fn should_cleanup(&self) -> bool {
        let count = self.request_count.fetch_add(1, Ordering::SeqCst) + 1;
        if count >= self.count_threshold {
            return true;
        }

        let last_cleanup = self.last_cleanup_time.load(Ordering::SeqCst);
        let elapsed = self.clock.now().saturating_sub(last_cleanup);
        elapsed >= self.time_threshold.as_secs() as i64
    }

    async fn mark_as_cleaned(&self) {
        self.request_count.store(0, Ordering::SeqCst);
        self.last_cleanup_time
            .store(self.clock.now(), Ordering::SeqCst);
    }
}

impl Default for HybridCleanupStrategy {
    /// Uses a count threshold of 100 issued nonces and a time threshold of
    /// 5 minutes.
    fn default() -> Self {
        Self::new(100, Duration::from_secs(300))
    }
}

/// Wrapper for custom cleanup strategies provided via closures.
pub struct CustomCleanupStrategy<F, Fut>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = bool> + Send + 'static,
{
    strategy_fn: F,
}

impl<F, Fut> CustomCleanupStrategy<F, Fut>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = bool> + Send + 'static,
{
    pub fn new(strategy_fn: F) -> Self {
        Self { strategy_fn }
    }
}

#[async_trait]
impl<F, Fut> CleanupStrategy for CustomCleanupStrategy<F, Fut>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = bool> + Send + 'static,
{
    async fn should_cleanup(&self) -> bool {
        (self.strategy_fn)().await
    }

    async fn mark_as_cleaned(&self) {
        // State is owned by the closure
    }
}

/// Type alias for boxed cleanup strategies.
pub type BoxedCleanupStrategy = Box<dyn CleanupStrategy>;
