//! Pluggable storage backends for outstanding nonces.
//!
//! The registry never touches a map directly: it goes through the
//! [`NonceStore`] trait, so tests and alternative deployments can supply
//! their own backend.

use async_trait::async_trait;

use crate::auth::error::NonceError;
use crate::auth::identity::Identity;

mod memory;
pub use memory::MemoryNonceStore;

/// An outstanding nonce for one identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NonceEntry {
    /// The nonce value the client must embed in its sign-in message
    pub nonce: String,
    /// Unix timestamp after which the nonce can no longer be consumed
    pub expires_at: i64,
}

/// Statistics about the nonce storage backend.
#[derive(Debug, Clone)]
pub struct StorageStats {
    /// Number of outstanding nonce entries, expired or not
    pub total_records: usize,
    /// Additional backend-specific information
    pub backend_info: String,
}

/// Abstract storage backend for per-identity nonces.
///
/// There is at most one entry per identity. Implementations must make
/// [`take`](NonceStore::take) atomic: if two callers race to take the same
/// identity, exactly one of them receives the entry.
///
/// # Example Implementation
///
/// ```rust
/// use wallet_auth::storage::{NonceEntry, NonceStore, StorageStats};
/// use wallet_auth::{Identity, NonceError};
/// use async_trait::async_trait;
/// use std::collections::HashMap;
/// use std::sync::Mutex;
///
/// #[derive(Default)]
/// pub struct MutexStore {
///     data: Mutex<HashMap<Identity, NonceEntry>>,
/// }
///
/// impl MutexStore {
///     fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<Identity, NonceEntry>>, NonceError> {
///         self.data.lock().map_err(|e| NonceError::Storage(e.to_string()))
///     }
/// }
///
/// #[async_trait]
/// impl NonceStore for MutexStore {
///     async fn put(&self, identity: &Identity, entry: NonceEntry) -> Result<(), NonceError> {
///         self.lock()?.insert(identity.clone(), entry);
///         Ok(())
///     }
///
///     async fn take(&self, identity: &Identity) -> Result<Option<NonceEntry>, NonceError> {
///         Ok(self.lock()?.remove(identity))
///     }
///
///     async fn peek(&self, identity: &Identity) -> Result<Option<NonceEntry>, NonceError> {
///         Ok(self.lock()?.get(identity).cloned())
///     }
///
///     async fn cleanup_expired(&self, now: i64) -> Result<usize, NonceError> {
///         let mut data = self.lock()?;
///         let before = data.len();
///         data.retain(|_, entry| entry.expires_at >= now);
///         Ok(before - data.len())
///     }
///
///     async fn get_stats(&self) -> Result<StorageStats, NonceError> {
///         Ok(StorageStats {
///             total_records: self.lock()?.len(),
///             backend_info: "Mutex storage".to_string(),
///         })
///     }
/// }
/// ```
#[async_trait]
pub trait NonceStore: Send + Sync {
    /// Optional backend initialization, called once by the builder.
    async fn init(&self) -> Result<(), NonceError> {
        Ok(())
    }

    /// Stores `entry` for `identity`, replacing any previous entry.
    async fn put(&self, identity: &Identity, entry: NonceEntry) -> Result<(), NonceError>;

    /// Removes and returns the entry for `identity`, if any.
    ///
    /// This is the single-use primitive: once it has returned an entry, no
    /// other caller can observe that entry again.
    async fn take(&self, identity: &Identity) -> Result<Option<NonceEntry>, NonceError>;

    /// Returns the entry for `identity` without removing it.
    async fn peek(&self, identity: &Identity) -> Result<Option<NonceEntry>, NonceError>;

    /// Removes every entry whose expiry is before `now`.
    ///
    /// # Returns
    ///
    /// * `Ok(count)` - Number of entries that were removed
    async fn cleanup_expired(&self, now: i64) -> Result<usize, NonceError>;

    /// Returns statistics about the storage backend.
    async fn get_stats(&self) -> Result<StorageStats, NonceError>;
}
