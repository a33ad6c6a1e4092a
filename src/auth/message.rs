//! The EIP-4361 sign-in envelope.

use std::fmt;
use std::str::FromStr;

use time::OffsetDateTime;

use crate::auth::error::VerificationError;
use crate::auth::identity::Identity;

/// A parsed EIP-4361 ("Sign-In with Ethereum") message.
///
/// Parsing is strict: missing mandatory fields, an address that is not
/// EIP-55 checksummed and unparseable timestamps are all rejected as
/// [`VerificationError::MalformedMessage`].
///
/// The `Display` output is the canonical serialization, which is exactly the
/// text a wallet signs.
#[derive(Debug, Clone)]
pub struct SignInMessage {
    inner: siwe::Message,
}

impl SignInMessage {
    /// Parses the plaintext a wallet was asked to sign.
    pub fn parse(raw: &str) -> Result<Self, VerificationError> {
        siwe::Message::from_str(raw.trim())
            .map(|inner| Self { inner })
            .map_err(|e| VerificationError::MalformedMessage(e.to_string()))
    }

    /// The address claiming to sign in, normalized to lowercase.
    pub fn identity(&self) -> Identity {
        Identity::from_address_bytes(&self.inner.address)
    }

    /// The address in its EIP-55 checksummed form, as it appears in the text.
    pub fn checksummed_address(&self) -> String {
        siwe::eip55(&self.inner.address)
    }

    pub fn nonce(&self) -> &str {
        &self.inner.nonce
    }

    /// The RFC 3986 authority requesting the sign-in.
    pub fn domain(&self) -> String {
        self.inner.domain.to_string()
    }

    pub fn statement(&self) -> Option<&str> {
        self.inner.statement.as_deref()
    }

    pub fn uri(&self) -> String {
        self.inner.uri.to_string()
    }

    pub fn chain_id(&self) -> u64 {
        self.inner.chain_id
    }

    pub fn issued_at(&self) -> String {
        self.inner.issued_at.to_string()
    }

    pub fn expiration_time(&self) -> Option<String> {
        self.inner.expiration_time.as_ref().map(ToString::to_string)
    }

    pub fn not_before(&self) -> Option<String> {
        self.inner.not_before.as_ref().map(ToString::to_string)
    }

    pub fn request_id(&self) -> Option<&str> {
        self.inner.request_id.as_deref()
    }

    /// Whether `now` (Unix seconds) lies inside the message's own
    /// `Not Before` / `Expiration Time` window. Messages without either
    /// field are valid at any time.
    pub fn is_valid_at(&self, now: i64) -> bool {
        match OffsetDateTime::from_unix_timestamp(now) {
            Ok(now) => self.inner.valid_at(&now),
            Err(_) => false,
        }
    }

    pub(crate) fn as_siwe(&self) -> &siwe::Message {
        &self.inner
    }
}

impl FromStr for SignInMessage {
    type Err = VerificationError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Self::parse(raw)
    }
}

impl fmt::Display for SignInMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.inner.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 1_700_000_000
    const ISSUED_AT: &str = "2023-11-14T22:13:20Z";

    fn message_text(address: &str, nonce: &str, extra: &str) -> String {
        format!(
            "example.com wants you to sign in with your Ethereum account:\n\
             {address}\n\
             \n\
             Sign in to the example app.\n\
             \n\
             URI: https://example.com/login\n\
             Version: 1\n\
             Chain ID: 1\n\
             Nonce: {nonce}\n\
             Issued At: {ISSUED_AT}{extra}"
        )
    }

    fn checksummed() -> String {
        siwe::eip55(&[0xab; 20])
    }

    #[test]
    fn test_parse_extracts_fields() {
        let message =
            SignInMessage::parse(&message_text(&checksummed(), "abcdef1234567890", "")).unwrap();

        assert_eq!(message.identity().as_str(), format!("0x{}", "ab".repeat(20)));
        assert_eq!(message.checksummed_address(), checksummed());
        assert_eq!(message.nonce(), "abcdef1234567890");
        assert_eq!(message.domain(), "example.com");
        assert_eq!(message.statement(), Some("Sign in to the example app."));
        assert_eq!(message.uri(), "https://example.com/login");
        assert_eq!(message.chain_id(), 1);
        assert_eq!(message.issued_at(), ISSUED_AT);
        assert_eq!(message.expiration_time(), None);
        assert_eq!(message.not_before(), None);
        assert_eq!(message.request_id(), None);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for raw in ["", "hello world", "example.com wants you to sign in"] {
            assert!(matches!(
                SignInMessage::parse(raw),
                Err(VerificationError::MalformedMessage(_))
            ));
        }
    }

    #[test]
    fn test_parse_rejects_missing_nonce() {
        let raw = message_text(&checksummed(), "abcdef1234567890", "")
            .replace("Nonce: abcdef1234567890\n", "");
        assert!(matches!(
            SignInMessage::parse(&raw),
            Err(VerificationError::MalformedMessage(_))
        ));
    }

    #[test]
    fn test_parse_rejects_bad_timestamp() {
        let raw = message_text(&checksummed(), "abcdef1234567890", "")
            .replace(ISSUED_AT, "yesterday");
        assert!(matches!(
            SignInMessage::parse(&raw),
            Err(VerificationError::MalformedMessage(_))
        ));
    }

    #[test]
    fn test_display_round_trips_to_same_fields() {
        let raw = message_text(&checksummed(), "abcdef1234567890", "");
        let message = SignInMessage::parse(&raw).unwrap();
        let reparsed = SignInMessage::parse(&message.to_string()).unwrap();

        assert_eq!(reparsed.identity(), message.identity());
        assert_eq!(reparsed.nonce(), message.nonce());
    }

    #[test]
    fn test_validity_window() {
        let raw = message_text(
            &checksummed(),
            "abcdef1234567890",
            "\nExpiration Time: 2023-11-14T22:18:20Z\nNot Before: 2023-11-14T22:13:20Z",
        );
        let message = SignInMessage::parse(&raw).unwrap();

        assert!(!message.is_valid_at(1_700_000_000 - 1));
        assert!(message.is_valid_at(1_700_000_000));
        assert!(message.is_valid_at(1_700_000_299));
        assert!(!message.is_valid_at(1_700_000_301));
    }

    #[test]
    fn test_message_without_window_is_always_valid() {
        let message =
            SignInMessage::parse(&message_text(&checksummed(), "abcdef1234567890", "")).unwrap();
        assert!(message.is_valid_at(0));
        assert!(message.is_valid_at(4_000_000_000));
    }
}
