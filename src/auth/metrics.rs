//! Monitoring of sign-in activity.
//!
//! Collection is optional and enabled with the `metrics` feature. When a
//! collector is configured on the builder, [`AuthCore`](crate::AuthCore)
//! reports every nonce, verification and session it handles.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::auth::error::AuthError;

/// Counters tracked by the authentication core.
#[derive(Debug, Clone, Default)]
pub struct AuthMetrics {
    pub nonces_issued: u64,
    /// Nonces consumed, successfully or not
    pub nonces_consumed: u64,
    /// Consumptions that found no live nonce
    pub nonces_rejected: u64,
    pub verification_attempts: u64,
    pub verification_successes: u64,
    pub verification_failures: u64,
    pub sessions_minted: u64,
    pub cleanup_operations: u64,
    /// Total entries evicted by cleanup
    pub nonces_evicted: u64,
    pub error_counts: ErrorMetrics,
    pub performance: PerformanceMetrics,
}

/// Rejection counts by reason.
#[derive(Debug, Clone, Default)]
pub struct ErrorMetrics {
    pub malformed_message: u64,
    pub nonce_not_found: u64,
    pub nonce_expired: u64,
    pub nonce_mismatch: u64,
    pub domain_mismatch: u64,
    pub message_not_valid_now: u64,
    pub signature_mismatch: u64,
    pub storage_errors: u64,
    pub other_errors: u64,
}

#[derive(Debug, Clone, Default)]
pub struct PerformanceMetrics {
    /// Average time to issue a nonce (microseconds)
    pub avg_issue_time_us: u64,
    /// Average duration of a full sign-in attempt (microseconds)
    pub avg_verification_time_us: u64,
    pub sample_count: u64,
}

/// Events reported to a [`MetricsCollector`].
#[derive(Debug, Clone)]
pub enum MetricEvent {
    NonceIssued {
        duration: Duration,
    },
    NonceConsumed {
        /// `false` when the nonce was missing or expired
        success: bool,
    },
    /// A sign-in attempt finished
    VerificationAttempt {
        duration: Duration,
        success: bool,
    },
    SessionMinted,
    CleanupOperation {
        items_cleaned: usize,
        duration: Duration,
    },
    Error {
        /// One of the `code()` values of the crate's error types
        error_code: &'static str,
        error_message: String,
    },
}

/// Backend for collecting [`MetricEvent`]s.
///
/// Methods may be called concurrently from many tasks.
///
/// # Example Implementation
///
/// ```rust
/// use wallet_auth::{AuthError, AuthMetrics, MetricEvent, MetricsCollector};
/// use async_trait::async_trait;
/// use tokio::sync::RwLock;
///
/// #[derive(Default)]
/// pub struct SignInCounter {
///     metrics: RwLock<AuthMetrics>,
/// }
///
/// #[async_trait]
/// impl MetricsCollector for SignInCounter {
///     async fn record_event(&self, event: MetricEvent) {
///         if let MetricEvent::SessionMinted = event {
///             self.metrics.write().await.sessions_minted += 1;
///         }
///     }
///
///     async fn get_metrics(&self) -> Result<AuthMetrics, AuthError> {
///         Ok(self.metrics.read().await.clone())
///     }
///
///     async fn reset_metrics(&self) -> Result<(), AuthError> {
///         *self.metrics.write().await = AuthMetrics::default();
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait MetricsCollector: Send + Sync {
    /// Records one event. Must be cheap; it runs on the request path.
    async fn record_event(&self, event: MetricEvent);

    /// Point-in-time snapshot of all counters.
    async fn get_metrics(&self) -> Result<AuthMetrics, AuthError>;

    async fn reset_metrics(&self) -> Result<(), AuthError>;

    /// Flushes buffered events to an external system, if any.
    async fn flush(&self) -> Result<(), AuthError> {
        Ok(())
    }
}

/// Atomic counters kept in process memory.
///
/// # Example
///
/// ```rust
/// use wallet_auth::{InMemoryMetricsCollector, MetricEvent, MetricsCollector};
///
/// # async fn example() -> Result<(), wallet_auth::AuthError> {
/// let collector = InMemoryMetricsCollector::new();
/// collector.record_event(MetricEvent::SessionMinted).await;
///
/// let metrics = collector.get_metrics().await?;
/// assert_eq!(metrics.sessions_minted, 1);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct InMemoryMetricsCollector {
    nonces_issued: AtomicU64,
    nonces_consumed: AtomicU64,
    nonces_rejected: AtomicU64,
    verification_attempts: AtomicU64,
    verification_successes: AtomicU64,
    verification_failures: AtomicU64,
    sessions_minted: AtomicU64,
    cleanup_operations: AtomicU64,
    nonces_evicted: AtomicU64,

    malformed_message: AtomicU64,
    nonce_not_found: AtomicU64,
    nonce_expired: AtomicU64,
    nonce_mismatch: AtomicU64,
    domain_mismatch: AtomicU64,
    message_not_valid_now: AtomicU64,
    signature_mismatch: AtomicU64,
    storage_errors: AtomicU64,
    other_errors: AtomicU64,

    issue_time_total: AtomicU64,
    verification_time_total: AtomicU64,
    issue_samples: AtomicU64,
    verification_samples: AtomicU64,
}

impl InMemoryMetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    fn error_counter(&self, error_code: &str) -> &AtomicU64 {
        match error_code {
            "malformed_message" => &self.malformed_message,
            "nonce_not_found" => &self.nonce_not_found,
            "nonce_expired" => &self.nonce_expired,
            "nonce_mismatch" => &self.nonce_mismatch,
            "domain_mismatch" => &self.domain_mismatch,
            "message_not_valid_now" => &self.message_not_valid_now,
            "signature_mismatch" => &self.signature_mismatch,
            "storage_error" => &self.storage_errors,
            _ => &self.other_errors,
        }
    }

    fn counters(&self) -> [&AtomicU64; 22] {
        [
            &self.nonces_issued,
            &self.nonces_consumed,
            &self.nonces_rejected,
            &self.verification_attempts,
            &self.verification_successes,
            &self.verification_failures,
            &self.sessions_minted,
            &self.cleanup_operations,
            &self.nonces_evicted,
            &self.malformed_message,
            &self.nonce_not_found,
            &self.nonce_expired,
            &self.nonce_mismatch,
            &self.domain_mismatch,
            &self.message_not_valid_now,
            &self.signature_mismatch,
            &self.storage_errors,
            &self.other_errors,
            &self.issue_time_total,
            &self.verification_time_total,
            &self.issue_samples,
            &self.verification_samples,
        ]
    }
}

fn average(total: &AtomicU64, samples: u64) -> u64 {
    if samples > 0 {
        total.load(Ordering::Relaxed) / samples
    } else {
        0
    }
}

#[async_trait]
impl MetricsCollector for InMemoryMetricsCollector {
    async fn record_event(&self, event: MetricEvent) {
        match event {
            MetricEvent::NonceIssued { duration } => {
                self.nonces_issued.fetch_add(1, Ordering::Relaxed);
                self.issue_time_total
                    .fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
                self.issue_samples.fetch_add(1, Ordering::Relaxed);
            }
            MetricEvent::NonceConsumed { success } => {
                self.nonces_consumed.fetch_add(1, Ordering::Relaxed);
                if !success {
                    self.nonces_rejected.fetch_add(1, Ordering::Relaxed);
                }
            }
            MetricEvent::VerificationAttempt { duration, success } => {
                self.verification_attempts.fetch_add(1, Ordering::Relaxed);
                if success {
                    self.verification_successes.fetch_add(1, Ordering::Relaxed);
                } else {
                    self.verification_failures.fetch_add(1, Ordering::Relaxed);
                }
                self.verification_time_total
                    .fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
                self.verification_samples.fetch_add(1, Ordering::Relaxed);
            }
            MetricEvent::SessionMinted => {
                self.sessions_minted.fetch_add(1, Ordering::Relaxed);
            }
            MetricEvent::CleanupOperation { items_cleaned, .. } => {
                self.cleanup_operations.fetch_add(1, Ordering::Relaxed);
                self.nonces_evicted
                    .fetch_add(items_cleaned as u64, Ordering::Relaxed);
            }
            MetricEvent::Error { error_code, .. } => {
                self.error_counter(error_code)
                    .fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    async fn get_metrics(&self) -> Result<AuthMetrics, AuthError> {
        let load = |counter: &AtomicU64| counter.load(Ordering::Relaxed);
        let issue_samples = load(&self.issue_samples);
        let verification_samples = load(&self.verification_samples);

        Ok(AuthMetrics {
            nonces_issued: load(&self.nonces_issued),
            nonces_consumed: load(&self.nonces_consumed),
            nonces_rejected: load(&self.nonces_rejected),
            verification_attempts: load(&self.verification_attempts),
            verification_successes: load(&self.verification_successes),
            verification_failures: load(&self.verification_failures),
            sessions_minted: load(&self.sessions_minted),
            cleanup_operations: load(&self.cleanup_operations),
            nonces_evicted: load(&self.nonces_evicted),
            error_counts: ErrorMetrics {
                malformed_message: load(&self.malformed_message),
                nonce_not_found: load(&self.nonce_not_found),
                nonce_expired: load(&self.nonce_expired),
                nonce_mismatch: load(&self.nonce_mismatch),
                domain_mismatch: load(&self.domain_mismatch),
                message_not_valid_now: load(&self.message_not_valid_now),
                signature_mismatch: load(&self.signature_mismatch),
                storage_errors: load(&self.storage_errors),
                other_errors: load(&self.other_errors),
            },
            performance: PerformanceMetrics {
                avg_issue_time_us: average(&self.issue_time_total, issue_samples),
                avg_verification_time_us: average(
                    &self.verification_time_total,
                    verification_samples,
                ),
                sample_count: issue_samples + verification_samples,
            },
        })
    }

    async fn reset_metrics(&self) -> Result<(), AuthError> {
        for counter in self.counters() {
            counter.store(0, Ordering::Relaxed);
        }
        Ok(())
    }
}

/// Discards every event.
#[derive(Debug, Default)]
pub struct NoOpMetricsCollector;

impl NoOpMetricsCollector {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl MetricsCollector for NoOpMetricsCollector {
    async fn record_event(&self, _event: MetricEvent) {}

    async fn get_metrics(&self) -> Result<AuthMetrics, AuthError> {
        Ok(AuthMetrics::default())
    }

    async fn reset_metrics(&self) -> Result<(), AuthError> {
        Ok(())
    }
}
