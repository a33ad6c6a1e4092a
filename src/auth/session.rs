use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};

use crate::auth::clock::{Clock, expiry_after, is_past};
use crate::auth::credential::{CookieAttributes, SameSite};
use crate::auth::error::SessionError;
use crate::auth::identity::Identity;
use crate::auth::signature::SessionSigner;

/// Proof that an identity signed in, valid until `expires_at`.
///
/// Sessions are stateless: nothing is stored server-side, the token alone
/// carries the claims and their signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    #[serde(rename = "address")]
    pub identity: Identity,
    /// Unix seconds
    #[serde(rename = "iat")]
    pub issued_at: i64,
    /// Unix seconds
    #[serde(rename = "exp")]
    pub expires_at: i64,
}

/// A freshly minted session together with its encoded token.
#[derive(Clone, PartialEq, Eq)]
pub struct MintedSession {
    pub token: String,
    pub session: Session,
}

impl fmt::Debug for MintedSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MintedSession")
            .field("token", &"<redacted>")
            .field("session", &self.session)
            .finish()
    }
}

/// Mints and validates session tokens.
///
/// A token is `base64url(claims) "." signature`, where the claims are the
/// JSON form of [`Session`] and the signature covers the encoded claims.
pub struct SessionIssuer {
    signer: Arc<dyn SessionSigner>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    cookie_name: String,
    secure_cookies: bool,
}

impl SessionIssuer {
    pub fn new(
        signer: Arc<dyn SessionSigner>,
        clock: Arc<dyn Clock>,
        ttl: Duration,
        cookie_name: impl Into<String>,
        secure_cookies: bool,
    ) -> Self {
        Self {
            signer,
            clock,
            ttl,
            cookie_name: cookie_name.into(),
            secure_cookies,
        }
    }

    /// Issues a session for `identity` lasting the configured TTL.
    pub fn mint(&self, identity: &Identity) -> Result<MintedSession, SessionError> {
        let issued_at = self.clock.now();
        let session = Session {
            identity: identity.clone(),
            issued_at,
            expires_at: expiry_after(issued_at, self.ttl),
        };

        let claims = serde_json::to_vec(&session)
            .map_err(|e| SessionError::Crypto(format!("Failed to encode claims: {e}")))?;
        let encoded = URL_SAFE_NO_PAD.encode(claims);
        let signature = self.signer.sign(encoded.as_bytes())?;

        Ok(MintedSession {
            token: format!("{encoded}.{signature}"),
            session,
        })
    }

    /// Checks the token's integrity and expiry and returns its claims.
    ///
    /// Any structural problem with the token is reported as
    /// [`SessionError::InvalidSignature`].
    pub fn validate(&self, token: &str) -> Result<Session, SessionError> {
        let (encoded, signature) = token
            .split_once('.')
            .ok_or(SessionError::InvalidSignature)?;

        self.signer.verify(encoded.as_bytes(), signature)?;

        let claims = URL_SAFE_NO_PAD
            .decode(encoded)
            .map_err(|_| SessionError::InvalidSignature)?;
        let session: Session =
            serde_json::from_slice(&claims).map_err(|_| SessionError::InvalidSignature)?;

        if is_past(session.expires_at, self.clock.now()) {
            return Err(SessionError::Expired);
        }

        Ok(session)
    }

    /// Cookie attributes for carrying `session`; the cookie lives exactly as
    /// long as the session.
    pub fn cookie_attributes(&self, session: &Session) -> CookieAttributes {
        CookieAttributes {
            http_only: true,
            same_site: SameSite::Lax,
            secure: self.secure_cookies,
            max_age: session.expires_at.saturating_sub(self.clock.now()).max(0),
            path: "/".to_string(),
        }
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}
