//! Where the session credential travels between requests.
//!
//! In a web deployment this is the browser's cookie jar; [`CredentialStore`]
//! abstracts it so the core never depends on an HTTP framework.

use std::collections::HashMap;

/// `SameSite` cookie policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

/// Transport attributes attached to a stored credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieAttributes {
    /// Hidden from page scripts
    pub http_only: bool,
    pub same_site: SameSite,
    /// Only sent over HTTPS
    pub secure: bool,
    /// Lifetime in seconds
    pub max_age: i64,
    pub path: String,
}

/// A named-credential jar scoped to one client.
pub trait CredentialStore {
    /// Returns the value of the credential `name`, if present.
    fn get(&self, name: &str) -> Option<String>;

    /// Stores `value` under `name`, replacing any previous value.
    fn set(&mut self, name: &str, value: String, attributes: CookieAttributes);

    /// Removes the credential `name`. Removing an absent credential is a
    /// no-op.
    fn clear(&mut self, name: &str);
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct StoredCredential {
    value: String,
    attributes: Option<CookieAttributes>,
}

/// An in-memory jar, standing in for a browser in tests and non-HTTP
/// callers.
///
/// # Example
///
/// ```rust
/// use wallet_auth::{CookieAttributes, CredentialStore, MemoryCredentialStore, SameSite};
///
/// let mut jar = MemoryCredentialStore::new();
/// jar.set(
///     "access_token",
///     "token".to_string(),
///     CookieAttributes {
///         http_only: true,
///         same_site: SameSite::Lax,
///         secure: true,
///         max_age: 60,
///         path: "/".to_string(),
///     },
/// );
/// assert_eq!(jar.get("access_token").as_deref(), Some("token"));
///
/// jar.clear("access_token");
/// assert!(jar.is_empty());
/// ```
#[derive(Debug, Default, Clone)]
pub struct MemoryCredentialStore {
    credentials: HashMap<String, StoredCredential>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A jar that already carries `name = value`, as a browser would send it
    /// back on a later request.
    pub fn with_credential(name: &str, value: &str) -> Self {
        let mut jar = Self::new();
        jar.credentials.insert(
            name.to_string(),
            StoredCredential {
                value: value.to_string(),
                attributes: None,
            },
        );
        jar
    }

    /// Attributes the credential was last set with.
    pub fn attributes(&self, name: &str) -> Option<&CookieAttributes> {
        self.credentials
            .get(name)
            .and_then(|stored| stored.attributes.as_ref())
    }

    pub fn len(&self) -> usize {
        self.credentials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty()
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self, name: &str) -> Option<String> {
        self.credentials.get(name).map(|stored| stored.value.clone())
    }

    fn set(&mut self, name: &str, value: String, attributes: CookieAttributes) {
        self.credentials.insert(
            name.to_string(),
            StoredCredential {
                value,
                attributes: Some(attributes),
            },
        );
    }

    fn clear(&mut self, name: &str) {
        self.credentials.remove(name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attributes(max_age: i64) -> CookieAttributes {
        CookieAttributes {
            http_only: true,
            same_site: SameSite::Lax,
            secure: false,
            max_age,
            path: "/".to_string(),
        }
    }

    #[test]
    fn test_set_replaces_value_and_attributes() {
        let mut jar = MemoryCredentialStore::new();

        jar.set("session", "first".to_string(), attributes(10));
        jar.set("session", "second".to_string(), attributes(20));

        assert_eq!(jar.len(), 1);
        assert_eq!(jar.get("session").as_deref(), Some("second"));
        assert_eq!(jar.attributes("session").map(|a| a.max_age), Some(20));
    }

    #[test]
    fn test_clear_is_idempotent() {
        let mut jar = MemoryCredentialStore::with_credential("session", "value");

        jar.clear("session");
        jar.clear("session");
        jar.clear("never-set");

        assert!(jar.is_empty());
        assert_eq!(jar.get("session"), None);
    }

    #[test]
    fn test_incoming_credential_has_no_attributes() {
        let jar = MemoryCredentialStore::with_credential("session", "value");

        assert_eq!(jar.get("session").as_deref(), Some("value"));
        assert_eq!(jar.attributes("session"), None);
    }
}
