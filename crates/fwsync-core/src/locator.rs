//! Resolve a [`FirewallRef`] to the provider's current firewall

use tracing::debug;

use crate::error::{Error, Result};
use crate::model::{Firewall, FirewallRef};
use crate::traits::FirewallProvider;

/// Page size requested when listing firewalls
pub const LIST_PAGE_SIZE: u32 = 200;

/// Fetch the firewall named by `firewall`
///
/// By id this is a single point lookup. By name every page of the listing is
/// read and the first case-insensitive exact match, in listing order, wins.
pub async fn locate(provider: &dyn FirewallProvider, firewall: &FirewallRef) -> Result<Firewall> {
    match firewall {
        FirewallRef::Id(id) => provider.get_firewall(id).await,
        FirewallRef::Name(name) => {
            let all = list_all(provider).await?;
            first_named(all, name)
                .ok_or_else(|| Error::not_found(format!("no firewall named {:?}", name)))
        }
    }
}

/// Read every page of the provider's firewall listing
pub async fn list_all(provider: &dyn FirewallProvider) -> Result<Vec<Firewall>> {
    let mut firewalls = Vec::new();
    let mut page = 1;

    loop {
        let listing = provider.list_firewalls(page, LIST_PAGE_SIZE).await?;
        debug!(
            "Listed {} firewall(s) on page {} from {}",
            listing.firewalls.len(),
            page,
            provider.provider_name()
        );
        firewalls.extend(listing.firewalls);

        if !listing.has_next {
            return Ok(firewalls);
        }
        page += 1;
    }
}

fn first_named(firewalls: Vec<Firewall>, name: &str) -> Option<Firewall> {
    let wanted = name.to_lowercase();
    firewalls
        .into_iter()
        .find(|firewall| firewall.name.to_lowercase() == wanted)
}
