use std::sync::Arc;

use crate::auth::error::VerificationError;
use crate::auth::identity::Identity;
use crate::auth::message::SignInMessage;
use crate::auth::wallet::{Eip191Verifier, WalletSignatureVerifier};

/// Verifies a signed sign-in message against the nonce the server issued.
///
/// Checks run in a fixed order and stop at the first failure:
///
/// 1. the embedded nonce equals the expected one ([`VerificationError::NonceMismatch`])
/// 2. the message domain matches the configured one, if any
///    ([`VerificationError::DomainMismatch`])
/// 3. the message's own validity window contains `now`
///    ([`VerificationError::MessageNotValidNow`])
/// 4. the signature was produced by the claimed address
///    ([`VerificationError::SignatureMismatch`])
///
/// The verifier holds no state between calls.
#[derive(Clone)]
pub struct SignedMessageVerifier {
    expected_domain: Option<String>,
    wallet: Arc<dyn WalletSignatureVerifier>,
}

impl SignedMessageVerifier {
    /// A verifier using [`Eip191Verifier`] that accepts any domain.
    pub fn new() -> Self {
        Self {
            expected_domain: None,
            wallet: Arc::new(Eip191Verifier),
        }
    }

    pub fn with_expected_domain(mut self, domain: Option<String>) -> Self {
        self.expected_domain = domain;
        self
    }

    pub fn with_wallet_verifier(mut self, wallet: Arc<dyn WalletSignatureVerifier>) -> Self {
        self.wallet = wallet;
        self
    }

    pub fn parse(&self, raw: &str) -> Result<SignInMessage, VerificationError> {
        SignInMessage::parse(raw)
    }

    /// Runs every check and returns the authenticated identity.
    pub fn verify(
        &self,
        message: &SignInMessage,
        signature: &str,
        expected_nonce: &str,
        now: i64,
    ) -> Result<Identity, VerificationError> {
        if message.nonce() != expected_nonce {
            return Err(VerificationError::NonceMismatch);
        }

        if let Some(expected) = &self.expected_domain {
            if !message.domain().eq_ignore_ascii_case(expected) {
                return Err(VerificationError::DomainMismatch);
            }
        }

        if !message.is_valid_at(now) {
            return Err(VerificationError::MessageNotValidNow);
        }

        self.wallet.verify(message, signature)?;

        Ok(message.identity())
    }

    /// Name of the configured wallet signature scheme.
    pub fn scheme(&self) -> &'static str {
        self.wallet.name()
    }
}

impl Default for SignedMessageVerifier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::testing::{ISSUED_AT_UNIX, TestWallet, sign_in_text, sign_in_text_with};

    const NONCE: &str = "abcdef1234567890";

    fn signed(wallet: &TestWallet, text: &str) -> (SignInMessage, String) {
        let message = SignInMessage::parse(text).unwrap();
        let signature = wallet.sign(&message);
        (message, signature)
    }

    #[test]
    fn test_verify_success_returns_lowercase_identity() {
        let wallet = TestWallet::new(0x11);
        let (message, signature) =
            signed(&wallet, &sign_in_text(&wallet.checksummed_address(), NONCE));

        let identity = SignedMessageVerifier::new()
            .verify(&message, &signature, NONCE, ISSUED_AT_UNIX)
            .unwrap();

        assert_eq!(identity, Identity::from_address_bytes(&wallet.address()));
        assert_eq!(identity.as_str(), identity.as_str().to_lowercase());
    }

    #[test]
    fn test_nonce_mismatch_is_checked_first() {
        let wallet = TestWallet::new(0x11);
        let (message, _) = signed(&wallet, &sign_in_text(&wallet.checksummed_address(), NONCE));

        // A garbage signature would also fail, but the nonce check wins
        let result =
            SignedMessageVerifier::new().verify(&message, "0x00", "0000000000000000", ISSUED_AT_UNIX);
        assert_eq!(result, Err(VerificationError::NonceMismatch));
    }

    #[test]
    fn test_domain_binding() {
        let wallet = TestWallet::new(0x11);
        let text = sign_in_text_with(&wallet.checksummed_address(), NONCE, "evil.example", "");
        let (message, signature) = signed(&wallet, &text);

        let unbound = SignedMessageVerifier::new();
        assert!(unbound.verify(&message, &signature, NONCE, ISSUED_AT_UNIX).is_ok());

        let bound = SignedMessageVerifier::new().with_expected_domain(Some("example.com".into()));
        assert_eq!(
            bound.verify(&message, &signature, NONCE, ISSUED_AT_UNIX),
            Err(VerificationError::DomainMismatch)
        );
    }

    #[test]
    fn test_domain_comparison_ignores_case() {
        let wallet = TestWallet::new(0x11);
        let (message, signature) =
            signed(&wallet, &sign_in_text(&wallet.checksummed_address(), NONCE));

        let verifier = SignedMessageVerifier::new().with_expected_domain(Some("Example.COM".into()));
        assert!(verifier.verify(&message, &signature, NONCE, ISSUED_AT_UNIX).is_ok());
    }

    #[test]
    fn test_expired_message_window() {
        let wallet = TestWallet::new(0x11);
        let text = sign_in_text_with(
            &wallet.checksummed_address(),
            NONCE,
            "example.com",
            "\nExpiration Time: 2023-11-14T22:18:20Z",
        );
        let (message, signature) = signed(&wallet, &text);
        let verifier = SignedMessageVerifier::new();

        assert!(verifier.verify(&message, &signature, NONCE, ISSUED_AT_UNIX + 60).is_ok());
        assert_eq!(
            verifier.verify(&message, &signature, NONCE, ISSUED_AT_UNIX + 600),
            Err(VerificationError::MessageNotValidNow)
        );
    }

    #[test]
    fn test_signature_by_other_wallet() {
        let alice = TestWallet::new(0x11);
        let mallory = TestWallet::new(0x22);
        let (message, _) = signed(&alice, &sign_in_text(&alice.checksummed_address(), NONCE));
        let forged = mallory.sign(&message);

        assert!(matches!(
            SignedMessageVerifier::new().verify(&message, &forged, NONCE, ISSUED_AT_UNIX),
            Err(VerificationError::SignatureMismatch(_))
        ));
    }

    #[test]
    fn test_custom_wallet_verifier() {
        struct RejectAll;

        impl WalletSignatureVerifier for RejectAll {
            fn name(&self) -> &'static str {
                "reject-all"
            }

            fn verify(&self, _: &SignInMessage, _: &str) -> Result<(), VerificationError> {
                Err(VerificationError::SignatureMismatch("rejected".to_string()))
            }
        }

        let wallet = TestWallet::new(0x11);
        let (message, signature) =
            signed(&wallet, &sign_in_text(&wallet.checksummed_address(), NONCE));
        let verifier = SignedMessageVerifier::new().with_wallet_verifier(Arc::new(RejectAll));

        assert_eq!(verifier.scheme(), "reject-all");
        assert_eq!(
            verifier.verify(&message, &signature, NONCE, ISSUED_AT_UNIX),
            Err(VerificationError::SignatureMismatch("rejected".to_string()))
        );
    }

    #[test]
    fn test_parse_delegates_to_message() {
        assert!(matches!(
            SignedMessageVerifier::new().parse("nope"),
            Err(VerificationError::MalformedMessage(_))
        ));
    }
}
