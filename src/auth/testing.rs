//! Deterministic wallets and message text for unit tests.

use k256::ecdsa::SigningKey;
use k256::elliptic_curve::sec1::ToEncodedPoint;
use sha3::{Digest, Keccak256};

use crate::auth::message::SignInMessage;

/// `Issued At` of every generated message; Unix time 1_700_000_000.
pub(crate) const ISSUED_AT: &str = "2023-11-14T22:13:20Z";
pub(crate) const ISSUED_AT_UNIX: i64 = 1_700_000_000;

pub(crate) struct TestWallet {
    key: SigningKey,
}

impl TestWallet {
    pub(crate) fn new(seed: u8) -> Self {
        Self {
            key: SigningKey::from_slice(&[seed; 32]).unwrap(),
        }
    }

    pub(crate) fn address(&self) -> [u8; 20] {
        let public_key = k256::PublicKey::from(self.key.verifying_key());
        let point = public_key.to_encoded_point(false);
        let hash = Keccak256::digest(&point.as_bytes()[1..]);

        let mut address = [0u8; 20];
        address.copy_from_slice(&hash[12..]);
        address
    }

    pub(crate) fn checksummed_address(&self) -> String {
        siwe::eip55(&self.address())
    }

    /// `personal_sign` over the canonical text, `0x`-prefixed with `v = 27/28`.
    pub(crate) fn sign(&self, message: &SignInMessage) -> String {
        let hash = message.as_siwe().eip191_hash().unwrap();
        let (signature, recovery_id) = self.key.sign_prehash_recoverable(&hash).unwrap();

        let mut bytes = signature.to_bytes().to_vec();
        bytes.push(recovery_id.to_byte() + 27);
        format!("0x{}", hex::encode(bytes))
    }
}

pub(crate) fn sign_in_text(address: &str, nonce: &str) -> String {
    sign_in_text_with(address, nonce, "example.com", "")
}

pub(crate) fn sign_in_text_with(address: &str, nonce: &str, domain: &str, extra: &str) -> String {
    format!(
        "{domain} wants you to sign in with your Ethereum account:\n\
         {address}\n\
         \n\
         Sign in to the example app.\n\
         \n\
         URI: https://{domain}/login\n\
         Version: 1\n\
         Chain ID: 1\n\
         Nonce: {nonce}\n\
         Issued At: {ISSUED_AT}{extra}"
    )
}
