//! Wallet signature checks.
//!
//! The cryptography sits behind [`WalletSignatureVerifier`] so the core can be
//! driven by a fake in tests, or by a verifier that also understands
//! contract wallets.

use crate::auth::error::VerificationError;
use crate::auth::message::SignInMessage;

/// Checks that a signature over a sign-in message was produced by the key
/// behind the message's address.
///
/// # Example
///
/// ```rust
/// use wallet_auth::{SignInMessage, VerificationError, WalletSignatureVerifier};
///
/// /// Accepts only one well-known signature string.
/// struct FixedSignature(&'static str);
///
/// impl WalletSignatureVerifier for FixedSignature {
///     fn name(&self) -> &'static str {
///         "fixed"
///     }
///
///     fn verify(&self, _message: &SignInMessage, signature: &str) -> Result<(), VerificationError> {
///         if signature == self.0 {
///             Ok(())
///         } else {
///             Err(VerificationError::SignatureMismatch("unexpected signature".to_string()))
///         }
///     }
/// }
/// ```
pub trait WalletSignatureVerifier: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Returns `Ok(())` when `signature` is valid for `message`, otherwise
    /// [`VerificationError::SignatureMismatch`].
    fn verify(&self, message: &SignInMessage, signature: &str) -> Result<(), VerificationError>;
}

/// EIP-191 `personal_sign` over the canonical message text, recovered with
/// secp256k1.
///
/// The signature is the usual 65-byte `r || s || v` value, hex encoded with
/// an optional `0x` prefix. Both `v = 27/28` and `v = 0/1` are accepted.
#[derive(Debug, Default, Clone, Copy)]
pub struct Eip191Verifier;

impl Eip191Verifier {
    pub fn new() -> Self {
        Self
    }

    fn decode_signature(signature: &str) -> Result<[u8; 65], VerificationError> {
        let hex_part = signature
            .trim()
            .strip_prefix("0x")
            .unwrap_or(signature.trim());

        let bytes = hex::decode(hex_part).map_err(|e| {
            VerificationError::SignatureMismatch(format!("Invalid hex signature: {e}"))
        })?;

        bytes.try_into().map_err(|bytes: Vec<u8>| {
            VerificationError::SignatureMismatch(format!(
                "Expected 65 signature bytes, got {}",
                bytes.len()
            ))
        })
    }
}

impl WalletSignatureVerifier for Eip191Verifier {
    fn name(&self) -> &'static str {
        "eip191"
    }

    fn verify(&self, message: &SignInMessage, signature: &str) -> Result<(), VerificationError> {
        let signature = Self::decode_signature(signature)?;

        message
            .as_siwe()
            .verify_eip191(&signature)
            .map(|_| ())
            .map_err(|e| VerificationError::SignatureMismatch(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::testing::{TestWallet, sign_in_text};

    fn signed_by(wallet: &TestWallet) -> (SignInMessage, String) {
        let message =
            SignInMessage::parse(&sign_in_text(&wallet.checksummed_address(), "abcdef1234567890"))
                .unwrap();
        let signature = wallet.sign(&message);
        (message, signature)
    }

    #[test]
    fn test_valid_signature() {
        let wallet = TestWallet::new(0x11);
        let (message, signature) = signed_by(&wallet);

        assert!(Eip191Verifier.verify(&message, &signature).is_ok());
        // Without the prefix as well
        assert!(
            Eip191Verifier
                .verify(&message, signature.trim_start_matches("0x"))
                .is_ok()
        );

        // Recovery id as 0/1 instead of 27/28
        let mut bytes = hex::decode(signature.trim_start_matches("0x")).unwrap();
        bytes[64] -= 27;
        let raw_recovery_id = format!("0x{}", hex::encode(bytes));
        assert!(Eip191Verifier.verify(&message, &raw_recovery_id).is_ok());
    }

    #[test]
    fn test_signature_from_other_key() {
        let alice = TestWallet::new(0x11);
        let mallory = TestWallet::new(0x22);
        let (message, _) = signed_by(&alice);

        let forged = mallory.sign(&message);
        assert!(matches!(
            Eip191Verifier.verify(&message, &forged),
            Err(VerificationError::SignatureMismatch(_))
        ));
    }

    #[test]
    fn test_signature_over_other_message() {
        let wallet = TestWallet::new(0x11);
        let (message, _) = signed_by(&wallet);
        let other = SignInMessage::parse(&sign_in_text(
            &wallet.checksummed_address(),
            "ffffffff00000000",
        ))
        .unwrap();

        let signature = wallet.sign(&other);
        assert!(Eip191Verifier.verify(&message, &signature).is_err());
    }

    #[test]
    fn test_malformed_signature_strings() {
        let wallet = TestWallet::new(0x11);
        let (message, _) = signed_by(&wallet);

        for signature in ["", "0x", "not hex", "0x1234", &format!("0x{}", "00".repeat(65))] {
            assert!(matches!(
                Eip191Verifier.verify(&message, signature),
                Err(VerificationError::SignatureMismatch(_))
            ));
        }
    }
}
