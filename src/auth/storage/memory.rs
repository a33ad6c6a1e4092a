//! In-memory storage backend.
//!
//! Nonces live for the lifetime of the process only, which is all a
//! single-instance deployment needs: an outstanding nonce is worthless after
//! a restart anyway, the client simply asks for a new one.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{NonceEntry, NonceStore, StorageStats};
use crate::auth::error::NonceError;
use crate::auth::identity::Identity;

/// A `HashMap` keyed by identity, behind a tokio `RwLock`.
///
/// [`take`](NonceStore::take) removes the entry under the write lock, so two
/// concurrent consumers of the same identity can never both receive it.
/// Expired entries are only dropped on `take`, on overwrite, or by
/// [`cleanup_expired`](NonceStore::cleanup_expired).
///
/// # Example
///
/// ```rust
/// use wallet_auth::storage::{MemoryNonceStore, NonceEntry, NonceStore};
/// use wallet_auth::Identity;
///
/// # async fn example() -> Result<(), wallet_auth::NonceError> {
/// let store = MemoryNonceStore::new();
/// let alice = Identity::new("0xA11CE00000000000000000000000000000000000");
///
/// store.put(&alice, NonceEntry { nonce: "abc12345".to_string(), expires_at: 100 }).await?;
/// assert!(store.take(&alice).await?.is_some());
/// assert!(store.take(&alice).await?.is_none());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default, Clone)]
pub struct MemoryNonceStore {
    data: Arc<RwLock<HashMap<Identity, NonceEntry>>>,
}

impl MemoryNonceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-allocates room for `capacity` identities.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Arc::new(RwLock::new(HashMap::with_capacity(capacity))),
        }
    }
}

#[async_trait]
impl NonceStore for MemoryNonceStore {
    async fn put(&self, identity: &Identity, entry: NonceEntry) -> Result<(), NonceError> {
        self.data.write().await.insert(identity.clone(), entry);
        Ok(())
    }

    async fn take(&self, identity: &Identity) -> Result<Option<NonceEntry>, NonceError> {
        Ok(self.data.write().await.remove(identity))
    }

    async fn peek(&self, identity: &Identity) -> Result<Option<NonceEntry>, NonceError> {
        Ok(self.data.read().await.get(identity).cloned())
    }

    async fn cleanup_expired(&self, now: i64) -> Result<usize, NonceError> {
        let mut data = self.data.write().await;
        let initial_count = data.len();
        data.retain(|_, entry| entry.expires_at >= now);
        Ok(initial_count - data.len())
    }

    async fn get_stats(&self) -> Result<StorageStats, NonceError> {
        let data = self.data.read().await;
        let memory_usage = data.len() * std::mem::size_of::<(Identity, NonceEntry)>();
        Ok(StorageStats {
            total_records: data.len(),
            backend_info: format!("In-memory HashMap storage (~{memory_usage} bytes)"),
        })
    }
}
