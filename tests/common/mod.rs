//! Shared helpers for integration tests: deterministic wallets and sign-in
//! message text.

#![allow(dead_code)]

use std::str::FromStr;

use k256::ecdsa::SigningKey;
use k256::elliptic_curve::sec1::ToEncodedPoint;
use sha3::{Digest, Keccak256};

pub const SECRET: &[u8] = b"integration test secret, 32+ bytes long";
pub const DOMAIN: &str = "app.example.com";

/// A secp256k1 key whose address is derived the way Ethereum does it.
pub struct TestWallet {
    key: SigningKey,
}

impl TestWallet {
    pub fn new(seed: u8) -> Self {
        Self {
            key: SigningKey::from_slice(&[seed; 32]).unwrap(),
        }
    }

    /// EIP-55 checksummed address.
    pub fn address(&self) -> String {
        let public_key = k256::PublicKey::from(self.key.verifying_key());
        let point = public_key.to_encoded_point(false);
        let hash = Keccak256::digest(&point.as_bytes()[1..]);

        let mut address = [0u8; 20];
        address.copy_from_slice(&hash[12..]);
        siwe::eip55(&address)
    }

    /// `personal_sign` over `text`, hex encoded with `v = 27/28`.
    pub fn sign(&self, text: &str) -> String {
        let message = siwe::Message::from_str(text).unwrap();
        let hash = message.eip191_hash().unwrap();
        let (signature, recovery_id) = self.key.sign_prehash_recoverable(&hash).unwrap();

        let mut bytes = signature.to_bytes().to_vec();
        bytes.push(recovery_id.to_byte() + 27);
        format!("0x{}", hex::encode(bytes))
    }
}

/// An EIP-4361 message for `address` embedding `nonce`.
pub fn sign_in_message(address: &str, nonce: &str) -> String {
    sign_in_message_for(DOMAIN, address, nonce)
}

pub fn sign_in_message_for(domain: &str, address: &str, nonce: &str) -> String {
    format!(
        "{domain} wants you to sign in with your Ethereum account:\n\
         {address}\n\
         \n\
         Sign in with Ethereum to the app.\n\
         \n\
         URI: https://{domain}\n\
         Version: 1\n\
         Chain ID: 1\n\
         Nonce: {nonce}\n\
         Issued At: 2023-11-14T22:13:20Z"
    )
}
