use std::fmt;

use serde::{Deserialize, Serialize};

/// Placeholder used when a nonce is requested without an address.
///
/// Every anonymous request shares this single slot, so a second anonymous
/// request replaces the nonce handed out to the first one.
pub const ANONYMOUS_IDENTITY: &str = "anonymous";

/// A wallet address, normalized to lowercase.
///
/// Addresses are compared case-insensitively: the EIP-55 checksummed form a
/// wallet signs and the lowercase form a frontend may send map to the same
/// identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    pub fn new(raw: &str) -> Self {
        Self(raw.trim().to_lowercase())
    }

    /// Builds an identity from an optional caller-supplied value, falling
    /// back to [`ANONYMOUS_IDENTITY`] when it is absent or blank.
    pub fn or_anonymous(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some(value) if !value.is_empty() => Self::new(value),
            _ => Self::anonymous(),
        }
    }

    pub fn anonymous() -> Self {
        Self(ANONYMOUS_IDENTITY.to_string())
    }

    /// Identity for a raw 20-byte Ethereum address.
    pub fn from_address_bytes(address: &[u8; 20]) -> Self {
        Self(format!("0x{}", hex::encode(address)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Identity {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Identity {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_is_lowercased() {
        let identity = Identity::new("0xAbCdEf0000000000000000000000000000000001");
        assert_eq!(
            identity.as_str(),
            "0xabcdef0000000000000000000000000000000001"
        );
        assert_eq!(
            identity,
            Identity::new("0xabcdef0000000000000000000000000000000001")
        );
    }

    #[test]
    fn test_or_anonymous_fallback() {
        assert_eq!(Identity::or_anonymous(None), Identity::anonymous());
        assert_eq!(Identity::or_anonymous(Some("")), Identity::anonymous());
        assert_eq!(Identity::or_anonymous(Some("   ")), Identity::anonymous());
        assert_eq!(Identity::or_anonymous(Some("0xAB")).as_str(), "0xab");
    }

    #[test]
    fn test_from_address_bytes() {
        let mut address = [0u8; 20];
        address[19] = 0xff;
        assert_eq!(
            Identity::from_address_bytes(&address).as_str(),
            "0x00000000000000000000000000000000000000ff"
        );
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let json = serde_json::to_string(&Identity::new("0xAB")).unwrap();
        assert_eq!(json, "\"0xab\"");
    }
}
