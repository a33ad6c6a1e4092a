use std::sync::Arc;
use std::time::Duration;

use crate::auth::cleanup::{BoxedCleanupStrategy, HybridCleanupStrategy};
use crate::auth::clock::{Clock, expiry_after, is_past};
use crate::auth::error::NonceError;
use crate::auth::identity::Identity;
use crate::auth::storage::{NonceEntry, NonceStore, StorageStats};

#[cfg(feature = "metrics")]
use crate::auth::metrics::{MetricEvent, MetricsCollector};

/// A function that generates unique nonce values.
///
/// Generated values must satisfy the EIP-4361 nonce grammar: at least eight
/// alphanumeric characters.
pub type NonceGeneratorFn = Box<dyn Fn() -> String + Send + Sync>;

/// Issues and single-use-consumes per-identity nonces.
///
/// Each identity has at most one outstanding nonce. Issuing again replaces
/// the previous one, consuming always removes it, whether or not it had
/// expired.
///
/// After every issued nonce the registry consults its cleanup strategy and,
/// when asked to, evicts expired entries on a background task.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use std::time::Duration;
/// use wallet_auth::{Identity, NonceError, NonceRegistry, SystemClock};
/// use wallet_auth::storage::MemoryNonceStore;
///
/// # async fn example() -> Result<(), NonceError> {
/// let registry = NonceRegistry::new(
///     Arc::new(MemoryNonceStore::new()),
///     Arc::new(SystemClock),
///     Duration::from_secs(120),
/// );
/// let alice = Identity::new("0xA11CE00000000000000000000000000000000000");
///
/// let nonce = registry.issue(&alice).await?;
/// assert_eq!(registry.consume(&alice).await?, nonce);
/// assert_eq!(registry.consume(&alice).await, Err(NonceError::NotFound));
/// # Ok(())
/// # }
/// ```
pub struct NonceRegistry<S: NonceStore> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    nonce_generator: NonceGeneratorFn,
    cleanup_strategy: BoxedCleanupStrategy,
    #[cfg(feature = "metrics")]
    metrics_collector: Option<Arc<dyn MetricsCollector>>,
}

impl<S: NonceStore + 'static> NonceRegistry<S> {
    /// Creates a registry with the default nonce generator and a hybrid
    /// cleanup strategy (100 issued nonces or 5 minutes).
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        let cleanup_strategy = Box::new(HybridCleanupStrategy::with_clock(
            100,
            Duration::from_secs(300),
            Arc::clone(&clock),
        ));
        Self {
            store,
            clock,
            ttl,
            nonce_generator: Box::new(generate_nonce),
            cleanup_strategy,
            #[cfg(feature = "metrics")]
            metrics_collector: None,
        }
    }

    /// Sets a custom nonce generator function.
    pub fn with_nonce_generator<F>(mut self, generator: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        self.nonce_generator = Box::new(generator);
        self
    }

    pub fn with_cleanup_strategy(mut self, cleanup_strategy: BoxedCleanupStrategy) -> Self {
        self.cleanup_strategy = cleanup_strategy;
        self
    }

    /// Reports background evictions to `collector`.
    #[cfg(feature = "metrics")]
    pub fn with_metrics_collector(mut self, collector: Arc<dyn MetricsCollector>) -> Self {
        self.metrics_collector = Some(collector);
        self
    }

    /// Issues a fresh nonce for `identity`, replacing any outstanding one.
    pub async fn issue(&self, identity: &Identity) -> Result<String, NonceError> {
        let nonce = (self.nonce_generator)();
        let expires_at = expiry_after(self.clock.now(), self.ttl);

        self.store
            .put(
                identity,
                NonceEntry {
                    nonce: nonce.clone(),
                    expires_at,
                },
            )
            .await?;
        tracing::debug!(%identity, expires_at, "Issued nonce");

        self.maybe_trigger_cleanup().await;

        Ok(nonce)
    }

    /// Removes and returns the outstanding nonce for `identity`.
    ///
    /// # Errors
    ///
    /// * [`NonceError::NotFound`] - nothing is outstanding, or a concurrent
    ///   consumer got there first
    /// * [`NonceError::Expired`] - the nonce outlived its TTL; it is removed
    ///   all the same
    pub async fn consume(&self, identity: &Identity) -> Result<String, NonceError> {
        let entry = self.store.take(identity).await?.ok_or_else(|| {
            tracing::debug!(%identity, "No outstanding nonce");
            NonceError::NotFound
        })?;

        if is_past(entry.expires_at, self.clock.now()) {
            tracing::debug!(%identity, expires_at = entry.expires_at, "Nonce expired");
            return Err(NonceError::Expired);
        }

        tracing::debug!(%identity, "Consumed nonce");
        Ok(entry.nonce)
    }

    /// Evicts every expired nonce now.
    pub async fn cleanup_expired(&self) -> Result<usize, NonceError> {
        self.store.cleanup_expired(self.clock.now()).await
    }

    pub async fn stats(&self) -> Result<StorageStats, NonceError> {
        self.store.get_stats().await
    }

    /// Returns the configured nonce TTL.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns a reference to the storage backend.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    async fn maybe_trigger_cleanup(&self) {
        if self.cleanup_strategy.should_cleanup().await {
            self.spawn_background_cleanup();
            self.cleanup_strategy.mark_as_cleaned().await;
        }
    }

    fn spawn_background_cleanup(&self) {
        let store = Arc::clone(&self.store);
        let now = self.clock.now();
        #[cfg(feature = "metrics")]
        let metrics_collector = self.metrics_collector.clone();

        tokio::spawn(async move {
            #[cfg(feature = "metrics")]
            let start = std::time::Instant::now();

            match store.cleanup_expired(now).await {
                Ok(removed) => {
                    tracing::debug!(removed, "Evicted expired nonces");
                    #[cfg(feature = "metrics")]
                    record(
                        metrics_collector,
                        MetricEvent::CleanupOperation {
                            items_cleaned: removed,
                            duration: start.elapsed(),
                        },
                    )
                    .await;
                }
                Err(e) => {
                    tracing::warn!("Background cleanup failed: {}", e);
                    #[cfg(feature = "metrics")]
                    record(
                        metrics_collector,
                        MetricEvent::Error {
                            error_code: e.code(),
                            error_message: e.to_string(),
                        },
                    )
                    .await;
                }
            }
        });
    }
}

#[cfg(feature = "metrics")]
async fn record(collector: Option<Arc<dyn MetricsCollector>>, event: MetricEvent) {
    if let Some(collector) = collector {
        collector.record_event(event).await;
    }
}

/// 128 random bits rendered as 32 lowercase hex characters.
#[cfg(feature = "default-generators")]
pub(crate) fn generate_nonce() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// 128 random bits rendered as 32 lowercase hex characters.
#[cfg(not(feature = "default-generators"))]
pub(crate) fn generate_nonce() -> String {
    use rand::RngCore;

    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}
