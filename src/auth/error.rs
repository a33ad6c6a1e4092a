use thiserror::Error;

/// Errors raised by the nonce registry and its storage backends.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NonceError {
    /// No nonce is outstanding for the identity.
    ///
    /// # When This Occurs
    ///
    /// - No nonce was ever issued for the address
    /// - The nonce was already consumed (successfully or not)
    /// - The entry was evicted by background cleanup
    ///
    /// # Resolution
    ///
    /// The client should request a fresh nonce and sign a new message.
    #[error("No nonce found for this address")]
    NotFound,

    /// The nonce existed but its TTL has elapsed. The entry is removed as a
    /// side effect of the lookup that discovered it.
    #[error("Nonce expired")]
    Expired,

    /// The storage backend failed.
    #[error("Storage error: {0}")]
    Storage(String),
}

/// Errors raised while parsing or checking a signed sign-in message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerificationError {
    /// The raw text is not a well-formed EIP-4361 message.
    ///
    /// This is a terminal client error: resubmitting the same text can never
    /// succeed.
    #[error("Malformed sign-in message: {0}")]
    MalformedMessage(String),

    /// The nonce embedded in the message is not the one issued for the
    /// claimed address.
    #[error("Nonce mismatch")]
    NonceMismatch,

    /// The message was produced for a different domain than this service.
    #[error("Domain mismatch")]
    DomainMismatch,

    /// The message's own `Expiration Time` / `Not Before` window excludes the
    /// current time.
    #[error("Message is not valid at the current time")]
    MessageNotValidNow,

    /// The signature is malformed or was not produced by the claimed address.
    #[error("Signature mismatch: {0}")]
    SignatureMismatch(String),
}

/// Errors raised while minting or validating session tokens.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The token is malformed or its integrity check failed.
    #[error("Invalid session signature")]
    InvalidSignature,

    /// The token is intact but past its expiry.
    #[error("Session expired")]
    Expired,

    /// The signing key or claim encoding failed.
    #[error("Crypto error: {0}")]
    Crypto(String),
}

/// Errors surfaced to the caller of [`AuthCore`](crate::AuthCore).
///
/// Every reason an authentication attempt can be rejected collapses into the
/// single [`AuthError::Unauthorized`] variant, so a client cannot tell a
/// missing nonce from an expired one or a bad signature. The precise reason
/// is logged at `warn` level.
///
/// # Example
///
/// ```rust
/// use wallet_auth::{AuthConfig, AuthCore, AuthError, MemoryCredentialStore};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = AuthConfig::new(b"an example session secret of 32+ bytes");
/// let core = AuthCore::builder(config).build_and_init().await?;
/// let mut jar = MemoryCredentialStore::new();
///
/// match core.verify_and_establish("not a siwe message", "0x00", &mut jar).await {
///     Ok(sign_in) => println!("signed in as {}", sign_in.identity),
///     Err(AuthError::BadRequest(reason)) => println!("bad request: {reason}"),
///     Err(AuthError::Unauthorized) => println!("please request a new nonce"),
///     Err(e) => println!("other error: {e}"),
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Malformed client input. Never retried automatically.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Authentication failed. The client must restart the flow with a fresh
    /// nonce.
    #[error("Unauthorized")]
    Unauthorized,

    /// A backend or crypto failure unrelated to the client's input.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl NonceError {
    /// Stable short code, used in logs and metrics.
    pub fn code(&self) -> &'static str {
        match self {
            NonceError::NotFound => "nonce_not_found",
            NonceError::Expired => "nonce_expired",
            NonceError::Storage(_) => "storage_error",
        }
    }
}

impl VerificationError {
    /// Stable short code, used in logs and metrics.
    pub fn code(&self) -> &'static str {
        match self {
            VerificationError::MalformedMessage(_) => "malformed_message",
            VerificationError::NonceMismatch => "nonce_mismatch",
            VerificationError::DomainMismatch => "domain_mismatch",
            VerificationError::MessageNotValidNow => "message_not_valid_now",
            VerificationError::SignatureMismatch(_) => "signature_mismatch",
        }
    }
}

impl SessionError {
    /// Stable short code, used in logs and metrics.
    pub fn code(&self) -> &'static str {
        match self {
            SessionError::InvalidSignature => "invalid_session",
            SessionError::Expired => "session_expired",
            SessionError::Crypto(_) => "crypto_error",
        }
    }
}

impl From<NonceError> for AuthError {
    fn from(error: NonceError) -> Self {
        match error {
            NonceError::NotFound | NonceError::Expired => AuthError::Unauthorized,
            NonceError::Storage(reason) => AuthError::Internal(reason),
        }
    }
}

impl From<VerificationError> for AuthError {
    fn from(error: VerificationError) -> Self {
        match error {
            VerificationError::MalformedMessage(reason) => AuthError::BadRequest(reason),
            VerificationError::NonceMismatch
            | VerificationError::DomainMismatch
            | VerificationError::MessageNotValidNow
            | VerificationError::SignatureMismatch(_) => AuthError::Unauthorized,
        }
    }
}

impl From<SessionError> for AuthError {
    fn from(error: SessionError) -> Self {
        AuthError::Internal(error.to_string())
    }
}
