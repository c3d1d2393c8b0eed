// # State Store Trait
//
// Defines the interface for persisting the last observed address set.
//
// ## Purpose
//
// The state store lets a run decide whether anything changed since the
// previous successful update, and tells the reconciler which addresses to
// look for inside the firewall rules.
//
// ## Implementations
//
// - File-based: a JSON array of strings
// - In-memory: tests and embedding
//
// ## Usage
//
// ```rust,ignore
// use fwsync_core::{AddressSet, StateStore};
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let store = /* StateStore implementation */;
//
//     let previous = store.load().await?;
//     let current = AddressSet::from_lookups(Some("1.2.3.4".into()), None);
//
//     if previous != current {
//         store.save(&current).await?;
//     }
//
//     Ok(())
// }
// ```

use async_trait::async_trait;

use crate::model::AddressSet;

/// Trait for state store implementations
///
/// # Trust Level: Trusted (Core Component)
///
/// ## Allowed Capabilities
/// - ✅ Perform I/O for persistent storage
///
/// ## Forbidden Capabilities
/// - ❌ Decide whether an update is needed (owned by the reconciler)
/// - ❌ Talk to the provider
///
/// ## Implementation Guidelines
///
/// - A record that has never been written is an empty set, not an error
/// - A record that exists but cannot be read is `Error::StateLoad`
/// - A failed write is `Error::StateSave`
/// - `save()` must be durable when it returns `Ok`
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Load the address set saved by the last successful run
    ///
    /// # Returns
    ///
    /// - `Ok(AddressSet)`: The saved set, or an empty set on first run
    /// - `Err(Error::StateLoad)`: The record is unreadable or corrupt
    async fn load(&self) -> Result<AddressSet, crate::Error>;

    /// Replace the saved address set
    ///
    /// # Returns
    ///
    /// - `Ok(())`: Successfully persisted
    /// - `Err(Error::StateSave)`: Storage error
    async fn save(&self, addresses: &AddressSet) -> Result<(), crate::Error>;
}
