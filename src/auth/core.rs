use std::fmt;
use std::sync::Arc;
#[cfg(feature = "metrics")]
use std::time::Instant;

use crate::auth::clock::Clock;
use crate::auth::core_builder::AuthCoreBuilder;
use crate::auth::config::AuthConfig;
use crate::auth::credential::CredentialStore;
use crate::auth::error::AuthError;
use crate::auth::identity::Identity;
use crate::auth::registry::NonceRegistry;
use crate::auth::session::{MintedSession, Session, SessionIssuer};
use crate::auth::storage::{MemoryNonceStore, NonceStore, StorageStats};
use crate::auth::verifier::SignedMessageVerifier;

#[cfg(feature = "metrics")]
use crate::auth::metrics::{AuthMetrics, MetricEvent, MetricsCollector};

/// Where a single sign-in attempt stands.
///
/// ```text
/// Unauthenticated -> NonceIssued -> Verifying -> Authenticated
///                                            \-> Rejected
/// ```
///
/// Every transition is logged at `debug` level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginState {
    Unauthenticated,
    NonceIssued,
    Verifying,
    Authenticated,
    Rejected,
}

impl LoginState {
    /// Whether the attempt is over.
    pub fn is_terminal(self) -> bool {
        matches!(self, LoginState::Authenticated | LoginState::Rejected)
    }
}

impl fmt::Display for LoginState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LoginState::Unauthenticated => "unauthenticated",
            LoginState::NonceIssued => "nonce_issued",
            LoginState::Verifying => "verifying",
            LoginState::Authenticated => "authenticated",
            LoginState::Rejected => "rejected",
        };
        f.write_str(name)
    }
}

fn transition(identity: &Identity, from: LoginState, to: LoginState) {
    tracing::debug!(%identity, %from, %to, "Login state transition");
}

/// The outcome of a successful sign-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignIn {
    pub identity: Identity,
    pub session: Session,
}

/// Wallet sign-in flows: nonce issuance, signed-message verification and
/// session management.
///
/// An attempt is only ever authenticated by a message that embeds the nonce
/// most recently issued to its address, carries a valid signature by that
/// address and arrives before the nonce expires. The nonce is consumed by
/// the attempt whatever its outcome.
///
/// Create one with [`AuthCore::builder`].
///
/// # Example
///
/// ```rust
/// use wallet_auth::{AuthConfig, AuthCore, AuthError, MemoryCredentialStore};
///
/// # async fn example() -> Result<(), AuthError> {
/// let core = AuthCore::builder(AuthConfig::new(b"an example session secret of 32+ bytes"))
///     .build_and_init()
///     .await?;
///
/// // The client embeds this nonce in the EIP-4361 message it asks the wallet to sign
/// let nonce = core
///     .request_nonce(Some("0xA11CE00000000000000000000000000000000000"))
///     .await?;
/// assert_eq!(nonce.len(), 32);
///
/// let mut jar = MemoryCredentialStore::new();
/// assert!(core.current_session(&jar).is_none());
/// core.end_session(&mut jar);
/// # Ok(())
/// # }
/// ```
pub struct AuthCore<S: NonceStore = MemoryNonceStore> {
    pub(crate) registry: NonceRegistry<S>,
    pub(crate) verifier: SignedMessageVerifier,
    pub(crate) sessions: SessionIssuer,
    pub(crate) clock: Arc<dyn Clock>,
    #[cfg(feature = "metrics")]
    pub(crate) metrics_collector: Arc<dyn MetricsCollector>,
}

impl AuthCore<MemoryNonceStore> {
    /// Starts building a core backed by [`MemoryNonceStore`].
    pub fn builder(config: AuthConfig) -> AuthCoreBuilder<MemoryNonceStore> {
        AuthCoreBuilder::new(config)
    }
}

impl<S: NonceStore + 'static> AuthCore<S> {
    /// Issues a nonce for `identity`.
    ///
    /// A missing or blank identity falls back to the shared
    /// [`ANONYMOUS_IDENTITY`](crate::ANONYMOUS_IDENTITY) slot. Only a storage
    /// failure can make this fail.
    pub async fn request_nonce(&self, identity: Option<&str>) -> Result<String, AuthError> {
        let identity = Identity::or_anonymous(identity);
        #[cfg(feature = "metrics")]
        let start = Instant::now();

        let nonce = match self.registry.issue(&identity).await {
            Ok(nonce) => nonce,
            Err(e) => {
                tracing::warn!(%identity, reason = e.code(), "Nonce issuance failed: {}", e);
                #[cfg(feature = "metrics")]
                self.record_error(e.code(), e.to_string()).await;
                return Err(e.into());
            }
        };

        transition(&identity, LoginState::Unauthenticated, LoginState::NonceIssued);
        #[cfg(feature = "metrics")]
        self.metrics_collector
            .record_event(MetricEvent::NonceIssued {
                duration: start.elapsed(),
            })
            .await;

        Ok(nonce)
    }

    /// Verifies a signed sign-in message and, on success, stores a session
    /// credential in `jar`.
    ///
    /// # Errors
    ///
    /// * [`AuthError::BadRequest`] - `raw` is not an EIP-4361 message; no
    ///   nonce is touched
    /// * [`AuthError::Unauthorized`] - no valid nonce was outstanding, or the
    ///   message failed verification; the nonce is gone either way
    /// * [`AuthError::Internal`] - storage or session signing failed
    ///
    /// `jar` is left untouched on every error.
    pub async fn verify_and_establish<J>(
        &self,
        raw: &str,
        signature: &str,
        jar: &mut J,
    ) -> Result<SignIn, AuthError>
    where
        J: CredentialStore + ?Sized,
    {
        #[cfg(feature = "metrics")]
        let start = Instant::now();

        let result = self.attempt_sign_in(raw, signature).await;

        #[cfg(feature = "metrics")]
        self.metrics_collector
            .record_event(MetricEvent::VerificationAttempt {
                duration: start.elapsed(),
                success: result.is_ok(),
            })
            .await;

        let (identity, minted) = result?;
        let attributes = self.sessions.cookie_attributes(&minted.session);
        jar.set(self.sessions.cookie_name(), minted.token, attributes);

        transition(&identity, LoginState::Verifying, LoginState::Authenticated);
        tracing::info!(%identity, expires_at = minted.session.expires_at, "Signed in");

        Ok(SignIn {
            identity,
            session: minted.session,
        })
    }

    async fn attempt_sign_in(
        &self,
        raw: &str,
        signature: &str,
    ) -> Result<(Identity, MintedSession), AuthError> {
        let message = match self.verifier.parse(raw) {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!(reason = e.code(), "Rejected sign-in message: {}", e);
                #[cfg(feature = "metrics")]
                self.record_error(e.code(), e.to_string()).await;
                return Err(e.into());
            }
        };

        let identity = message.identity();
        transition(&identity, LoginState::NonceIssued, LoginState::Verifying);

        let consumed = self.registry.consume(&identity).await;
        #[cfg(feature = "metrics")]
        self.metrics_collector
            .record_event(MetricEvent::NonceConsumed {
                success: consumed.is_ok(),
            })
            .await;

        let expected_nonce = match consumed {
            Ok(nonce) => nonce,
            Err(e) => {
                self.reject(&identity, e.code(), &e).await;
                return Err(e.into());
            }
        };

        if let Err(e) = self
            .verifier
            .verify(&message, signature, &expected_nonce, self.clock.now())
        {
            self.reject(&identity, e.code(), &e).await;
            return Err(e.into());
        }

        let minted = match self.sessions.mint(&identity) {
            Ok(minted) => minted,
            Err(e) => {
                tracing::error!(%identity, "Failed to mint session: {}", e);
                #[cfg(feature = "metrics")]
                self.record_error(e.code(), e.to_string()).await;
                return Err(e.into());
            }
        };
        #[cfg(feature = "metrics")]
        self.metrics_collector
            .record_event(MetricEvent::SessionMinted)
            .await;

        Ok((identity, minted))
    }

    async fn reject(&self, identity: &Identity, code: &'static str, error: &(dyn fmt::Display + Sync)) {
        transition(identity, LoginState::Verifying, LoginState::Rejected);
        tracing::warn!(%identity, reason = code, "Sign-in rejected: {}", error);
        #[cfg(feature = "metrics")]
        self.record_error(code, error.to_string()).await;
    }

    /// Returns the session carried by `jar`, if it holds a valid one.
    ///
    /// Missing, tampered and expired credentials all read as `None`.
    pub fn current_session<J>(&self, jar: &J) -> Option<Session>
    where
        J: CredentialStore + ?Sized,
    {
        let token = jar.get(self.sessions.cookie_name())?;
        match self.sessions.validate(&token) {
            Ok(session) => Some(session),
            Err(e) => {
                tracing::debug!(reason = e.code(), "Ignoring session credential");
                None
            }
        }
    }

    /// Removes the session credential from `jar`.
    ///
    /// The token itself stays valid until it expires; only the client's
    /// copy is dropped.
    pub fn end_session<J>(&self, jar: &mut J)
    where
        J: CredentialStore + ?Sized,
    {
        jar.clear(self.sessions.cookie_name());
        tracing::debug!("Session credential cleared");
    }

    /// Evicts expired nonces now, returning how many were removed.
    pub async fn cleanup_expired(&self) -> Result<usize, AuthError> {
        #[cfg(feature = "metrics")]
        let start = Instant::now();

        let removed = self.registry.cleanup_expired().await?;
        tracing::debug!(removed, "Evicted expired nonces");

        #[cfg(feature = "metrics")]
        self.metrics_collector
            .record_event(MetricEvent::CleanupOperation {
                items_cleaned: removed,
                duration: start.elapsed(),
            })
            .await;

        Ok(removed)
    }

    /// Statistics about outstanding nonces.
    pub async fn nonce_stats(&self) -> Result<StorageStats, AuthError> {
        Ok(self.registry.stats().await?)
    }

    /// Name of the cookie carrying the session token.
    pub fn cookie_name(&self) -> &str {
        self.sessions.cookie_name()
    }

    pub fn registry(&self) -> &NonceRegistry<S> {
        &self.registry
    }

    pub fn sessions(&self) -> &SessionIssuer {
        &self.sessions
    }

    /// Current metrics snapshot.
    #[cfg(feature = "metrics")]
    pub async fn get_metrics(&self) -> Result<AuthMetrics, AuthError> {
        self.metrics_collector.get_metrics().await
    }

    #[cfg(feature = "metrics")]
    async fn record_error(&self, error_code: &'static str, error_message: String) {
        self.metrics_collector
            .record_event(MetricEvent::Error {
                error_code,
                error_message,
            })
            .await;
    }
}
