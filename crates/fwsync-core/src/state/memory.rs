// # Memory State Store
//
// In-memory implementation of StateStore.
//
// ## Purpose
//
// Keeps the address set for the lifetime of the process only. Every process
// start behaves like a first run: the change check reports "changed" and no
// rule is rewritten, because no previous address is known.
//
// ## When to Use
//
// - Tests
// - Embedding the engine in a long-lived process that schedules runs itself

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::Error;
use crate::model::AddressSet;
use crate::traits::state_store::StateStore;

/// In-memory state store implementation
///
/// Clones share the same underlying set.
///
/// # Example
///
/// ```rust,no_run
/// use fwsync_core::state::MemoryStateStore;
/// use fwsync_core::traits::StateStore;
/// use fwsync_core::AddressSet;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = MemoryStateStore::new();
///     assert!(store.load().await?.is_empty());
///
///     let current = AddressSet::from_lookups(Some("1.2.3.4".into()), None);
///     store.save(&current).await?;
///     assert_eq!(store.load().await?, current);
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryStateStore {
    inner: Arc<RwLock<AddressSet>>,
}

impl MemoryStateStore {
    /// Create a new empty memory state store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds `addresses`
    pub fn with_addresses(addresses: AddressSet) -> Self {
        Self {
            inner: Arc::new(RwLock::new(addresses)),
        }
    }

    /// Forget the saved set
    pub async fn clear(&self) {
        *self.inner.write().await = AddressSet::new();
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn load(&self) -> Result<AddressSet, Error> {
        Ok(self.inner.read().await.clone())
    }

    async fn save(&self, addresses: &AddressSet) -> Result<(), Error> {
        *self.inner.write().await = addresses.clone();
        Ok(())
    }
}
