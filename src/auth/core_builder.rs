use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::auth::cleanup::{BoxedCleanupStrategy, CustomCleanupStrategy, HybridCleanupStrategy};
use crate::auth::clock::{Clock, SystemClock};
use crate::auth::config::AuthConfig;
use crate::auth::core::AuthCore;
use crate::auth::error::AuthError;
use crate::auth::registry::{NonceGeneratorFn, NonceRegistry};
use crate::auth::session::SessionIssuer;
use crate::auth::signature::{HmacSha256Signer, SessionSigner};
use crate::auth::storage::{MemoryNonceStore, NonceStore};
use crate::auth::verifier::SignedMessageVerifier;
use crate::auth::wallet::WalletSignatureVerifier;

#[cfg(feature = "metrics")]
use crate::auth::metrics::{MetricsCollector, NoOpMetricsCollector};

enum CleanupSetting {
    Hybrid {
        count_threshold: u32,
        time_threshold: Duration,
    },
    Custom(BoxedCleanupStrategy),
}

/// A builder for [`AuthCore`].
///
/// Defaults to [`MemoryNonceStore`], the system clock, EIP-191 signature
/// checks and HMAC-SHA256 session tokens keyed with the configured secret.
#[must_use = "The builder does nothing unless `.build_and_init()` is called."]
pub struct AuthCoreBuilder<S: NonceStore> {
    config: AuthConfig,
    storage: Arc<S>,
    clock: Option<Arc<dyn Clock>>,
    wallet_verifier: Option<Arc<dyn WalletSignatureVerifier>>,
    session_signer: Option<Arc<dyn SessionSigner>>,
    nonce_generator: Option<NonceGeneratorFn>,
    cleanup: Option<CleanupSetting>,
    #[cfg(feature = "metrics")]
    metrics_collector: Option<Arc<dyn MetricsCollector>>,
}

impl AuthCoreBuilder<MemoryNonceStore> {
    pub(crate) fn new(config: AuthConfig) -> Self {
        Self {
            config,
            storage: Arc::new(MemoryNonceStore::new()),
            clock: None,
            wallet_verifier: None,
            session_signer: None,
            nonce_generator: None,
            cleanup: None,
            #[cfg(feature = "metrics")]
            metrics_collector: None,
        }
    }
}

impl<S: NonceStore + 'static> AuthCoreBuilder<S> {
    /// Uses `storage` instead of the default [`MemoryNonceStore`].
    pub fn with_storage<T: NonceStore + 'static>(self, storage: Arc<T>) -> AuthCoreBuilder<T> {
        AuthCoreBuilder {
            config: self.config,
            storage,
            clock: self.clock,
            wallet_verifier: self.wallet_verifier,
            session_signer: self.session_signer,
            nonce_generator: self.nonce_generator,
            cleanup: self.cleanup,
            #[cfg(feature = "metrics")]
            metrics_collector: self.metrics_collector,
        }
    }

    /// Sets the time source for every expiry decision.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Replaces the EIP-191 wallet signature check.
    pub fn with_signature_verifier(mut self, verifier: Arc<dyn WalletSignatureVerifier>) -> Self {
        self.wallet_verifier = Some(verifier);
        self
    }

    /// Replaces the HMAC-SHA256 session token signer.
    pub fn with_session_signer(mut self, signer: Arc<dyn SessionSigner>) -> Self {
        self.session_signer = Some(signer);
        self
    }

    pub fn with_nonce_generator<F>(mut self, generator: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        self.nonce_generator = Some(Box::new(generator));
        self
    }

    /// Configures expired-nonce eviction with custom hybrid thresholds.
    ///
    /// By default eviction runs after 100 issued nonces or 5 minutes,
    /// whichever comes first.
    ///
    /// # Example
    ///
    /// ```rust
    /// # use std::time::Duration;
    /// # use wallet_auth::{AuthConfig, AuthCore};
    /// #
    /// # async fn example() -> Result<(), wallet_auth::AuthError> {
    /// // Evict every 50 nonces or every 2 minutes
    /// let core = AuthCore::builder(AuthConfig::new(b"an example session secret of 32+ bytes"))
    ///     .with_hybrid_cleanup_thresholds(50, Duration::from_secs(120))
    ///     .build_and_init()
    ///     .await?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn with_hybrid_cleanup_thresholds(
        mut self,
        count_threshold: u32,
        time_threshold: Duration,
    ) -> Self {
        self.cleanup = Some(CleanupSetting::Hybrid {
            count_threshold,
            time_threshold,
        });
        self
    }

    /// Replaces the eviction strategy with a closure, called after every
    /// issued nonce.
    ///
    /// # Example
    ///
    /// ```rust
    /// # use std::sync::atomic::{AtomicU32, Ordering};
    /// # use std::sync::Arc;
    /// # use wallet_auth::{AuthConfig, AuthCore};
    /// #
    /// # async fn example() -> Result<(), wallet_auth::AuthError> {
    /// let counter = Arc::new(AtomicU32::new(0));
    /// let counter_clone = Arc::clone(&counter);
    ///
    /// // Evict on every 10th nonce
    /// let core = AuthCore::builder(AuthConfig::new(b"an example session secret of 32+ bytes"))
    ///     .with_custom_cleanup_strategy(move || {
    ///         let counter = Arc::clone(&counter_clone);
    ///         async move {
    ///             let count = counter.fetch_add(1, Ordering::SeqCst) + 1;
    ///             count % 10 == 0
    ///         }
    ///     })
    ///     .build_and_init()
    ///     .await?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn with_custom_cleanup_strategy<F, Fut>(mut self, strategy_fn: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = bool> + Send + 'static,
    {
        self.cleanup = Some(CleanupSetting::Custom(Box::new(CustomCleanupStrategy::new(
            strategy_fn,
        ))));
        self
    }

    #[cfg(feature = "metrics")]
    pub fn with_metrics_collector(mut self, collector: Arc<dyn MetricsCollector>) -> Self {
        self.metrics_collector = Some(collector);
        self
    }

    /// Builds the core and initializes its storage backend.
    ///
    /// Configuration warnings are logged; an empty session secret is an
    /// error unless a custom session signer was supplied.
    pub async fn build_and_init(self) -> Result<AuthCore<S>, AuthError> {
        for warning in self.config.validate() {
            tracing::warn!("{}", warning);
        }
        tracing::debug!("{}", self.config.summary());

        let session_signer = match self.session_signer {
            Some(signer) => signer,
            None if self.config.session_secret.is_empty() => {
                return Err(AuthError::Internal(
                    "Session secret must not be empty".to_string(),
                ));
            }
            None => Arc::new(HmacSha256Signer::new(self.config.session_secret.as_bytes())),
        };

        self.storage.init().await?;

        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        #[cfg(feature = "metrics")]
        let metrics_collector: Arc<dyn MetricsCollector> = self
            .metrics_collector
            .unwrap_or_else(|| Arc::new(NoOpMetricsCollector::new()));

        let mut registry =
            NonceRegistry::new(self.storage, Arc::clone(&clock), self.config.nonce_ttl);
        #[cfg(feature = "metrics")]
        {
            registry = registry.with_metrics_collector(Arc::clone(&metrics_collector));
        }
        if let Some(generator) = self.nonce_generator {
            registry = registry.with_nonce_generator(generator);
        }
        match self.cleanup {
            Some(CleanupSetting::Hybrid {
                count_threshold,
                time_threshold,
            }) => {
                registry = registry.with_cleanup_strategy(Box::new(
                    HybridCleanupStrategy::with_clock(
                        count_threshold,
                        time_threshold,
                        Arc::clone(&clock),
                    ),
                ));
            }
            Some(CleanupSetting::Custom(strategy)) => {
                registry = registry.with_cleanup_strategy(strategy);
            }
            None => {}
        }

        let mut verifier =
            SignedMessageVerifier::new().with_expected_domain(self.config.expected_domain.clone());
        if let Some(wallet_verifier) = self.wallet_verifier {
            verifier = verifier.with_wallet_verifier(wallet_verifier);
        }

        let sessions = SessionIssuer::new(
            session_signer,
            Arc::clone(&clock),
            self.config.session_ttl,
            self.config.cookie_name,
            self.config.secure_cookies,
        );

        Ok(AuthCore {
            registry,
            verifier,
            sessions,
            clock,
            #[cfg(feature = "metrics")]
            metrics_collector,
        })
    }
}
