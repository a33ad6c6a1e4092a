//! Pluggable integrity protection for session tokens.
//!
//! Session tokens are stateless, so their only defence against forgery is
//! the MAC computed here. The crate ships HMAC-SHA256; other schemes can be
//! plugged in through [`SessionSigner`].

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::auth::error::SessionError;

/// Signs and verifies session token payloads.
///
/// # Implementation Notes
///
/// - `verify` must compare in constant time
/// - A malformed signature string is an [`SessionError::InvalidSignature`],
///   never a panic
///
/// # Example
///
/// ```rust
/// use wallet_auth::{SessionError, SessionSigner};
///
/// struct Unsigned;
///
/// impl SessionSigner for Unsigned {
///     fn name(&self) -> &'static str {
///         "none"
///     }
///
///     fn sign(&self, _payload: &[u8]) -> Result<String, SessionError> {
///         Ok(String::new())
///     }
///
///     fn verify(&self, _payload: &[u8], signature: &str) -> Result<(), SessionError> {
///         if signature.is_empty() {
///             Ok(())
///         } else {
///             Err(SessionError::InvalidSignature)
///         }
///     }
/// }
/// ```
pub trait SessionSigner: Send + Sync {
    /// Short identifier like "hmac-sha256".
    fn name(&self) -> &'static str;

    /// Returns the URL-safe encoded signature over `payload`.
    fn sign(&self, payload: &[u8]) -> Result<String, SessionError>;

    /// `Ok(())` if `signature` matches `payload`, otherwise
    /// [`SessionError::InvalidSignature`].
    fn verify(&self, payload: &[u8], signature: &str) -> Result<(), SessionError>;
}

/// HMAC-SHA256 keyed with the process-wide session secret.
///
/// ```rust
/// use wallet_auth::{HmacSha256Signer, SessionSigner};
///
/// let signer = HmacSha256Signer::new(b"my_secret_key");
/// let signature = signer.sign(b"payload")?;
/// signer.verify(b"payload", &signature)?;
/// # Ok::<(), wallet_auth::SessionError>(())
/// ```
pub struct HmacSha256Signer {
    key: Vec<u8>,
}

impl HmacSha256Signer {
    pub fn new(key: &[u8]) -> Self {
        Self { key: key.to_vec() }
    }

    fn create_hmac(&self) -> Result<Hmac<Sha256>, SessionError> {
        Hmac::<Sha256>::new_from_slice(&self.key)
            .map_err(|e| SessionError::Crypto(format!("Invalid HMAC key: {e}")))
    }
}

impl SessionSigner for HmacSha256Signer {
    fn name(&self) -> &'static str {
        "hmac-sha256"
    }

    fn sign(&self, payload: &[u8]) -> Result<String, SessionError> {
        let mut mac = self.create_hmac()?;
        mac.update(payload);
        Ok(URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes()))
    }

    fn verify(&self, payload: &[u8], signature: &str) -> Result<(), SessionError> {
        let provided = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| SessionError::InvalidSignature)?;

        let mut mac = self.create_hmac()?;
        mac.update(payload);
        mac.verify_slice(&provided)
            .map_err(|_| SessionError::InvalidSignature)
    }
}
