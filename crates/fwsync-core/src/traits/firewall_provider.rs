// # Firewall Provider Trait
//
// Defines the interface for reading and replacing cloud firewalls via a
// provider API.
//
// ## Implementations
//
// - DigitalOcean: `fwsync-provider-digitalocean` crate
//
// ## Usage
//
// ```rust,ignore
// use fwsync_core::FirewallProvider;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let provider = /* FirewallProvider implementation */;
//
//     let firewall = provider.get_firewall("bb4b2611-3d72-467b-8602-280330ecd65c").await?;
//     let request = fwsync_core::model::FirewallRequest::from(&firewall);
//     provider.update_firewall(&firewall.id, &request).await?;
//
//     Ok(())
// }
// ```

use async_trait::async_trait;

use crate::model::{Firewall, FirewallPage, FirewallRequest};

/// Trait for cloud firewall provider implementations
///
/// # Trust Level: Untrusted
///
/// ## Allowed Capabilities
/// - ✅ Perform HTTP/HTTPS API calls to their endpoints only
/// - ✅ Parse provider-specific responses into the shared model
/// - ✅ Return success or failure
///
/// ## Forbidden Capabilities
/// - ❌ Implement retry logic or backoff
/// - ❌ Access the state store
/// - ❌ Rewrite rules (normalization and address swaps belong to the core)
/// - ❌ Page through listings on their own (the locator drives pagination)
///
/// Every method performs a single API call.
#[async_trait]
pub trait FirewallProvider: Send + Sync {
    /// Fetch one page of the firewalls visible to the credential
    ///
    /// # Parameters
    ///
    /// - `page`: 1-based page number
    /// - `per_page`: Page size requested from the provider
    async fn list_firewalls(
        &self,
        page: u32,
        per_page: u32,
    ) -> Result<FirewallPage, crate::Error>;

    /// Fetch a single firewall by identifier
    ///
    /// # Returns
    ///
    /// - `Ok(Firewall)`: The firewall
    /// - `Err(Error::NotFound)`: The identifier is unknown
    /// - `Err(Error)`: Any other failure
    async fn get_firewall(&self, id: &str) -> Result<Firewall, crate::Error>;

    /// Replace a firewall with the given document
    ///
    /// This is a full replace: anything absent from `request` is dropped by
    /// the provider.
    ///
    /// # Returns
    ///
    /// - `Ok(Firewall)`: The firewall as stored after the update
    /// - `Err(Error)`: The provider refused or could not be reached
    async fn update_firewall(
        &self,
        id: &str,
        request: &FirewallRequest,
    ) -> Result<Firewall, crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;

    /// Whether `update_firewall` only logs the document instead of sending it
    ///
    /// The engine never saves state after an update from a dry-run provider.
    fn is_dry_run(&self) -> bool {
        false
    }
}
