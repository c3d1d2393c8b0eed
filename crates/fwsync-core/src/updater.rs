//! Submit reconciled rules back to the provider

use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::model::{Firewall, FirewallRequest, InboundRule, OutboundRule};
use crate::traits::FirewallProvider;

/// Build the full replacement document for `firewall` with new rule lists
///
/// Name, compute-instance ids and tags are carried over from the firewall as
/// fetched; the update endpoint drops anything left out.
pub fn replacement_request(
    firewall: &Firewall,
    inbound_rules: Vec<InboundRule>,
    outbound_rules: Vec<OutboundRule>,
) -> FirewallRequest {
    FirewallRequest {
        name: firewall.name.clone(),
        inbound_rules,
        outbound_rules,
        droplet_ids: firewall.droplet_ids.clone(),
        tags: firewall.tags.clone(),
    }
}

/// Replace the firewall identified by `id`
///
/// Any provider failure is reported as `Error::UpdateRejected`.
pub async fn submit(
    provider: &dyn FirewallProvider,
    id: &str,
    request: &FirewallRequest,
) -> Result<Firewall> {
    debug!(
        "Submitting {} inbound / {} outbound rule(s) for firewall {}",
        request.inbound_rules.len(),
        request.outbound_rules.len(),
        id
    );

    let updated = provider
        .update_firewall(id, request)
        .await
        .map_err(|e| match e {
            Error::UpdateRejected(_) => e,
            other => Error::update_rejected(format!(
                "{} refused update of firewall {}: {}",
                provider.provider_name(),
                id,
                other
            )),
        })?;

    info!("Firewall {} ({}) updated", updated.name, updated.id);
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Protocol, Sources};

    #[test]
    fn replacement_keeps_attachments() {
        let firewall = Firewall {
            id: "fw-1".to_string(),
            name: "home".to_string(),
            status: Some("succeeded".to_string()),
            inbound_rules: Vec::new(),
            outbound_rules: Vec::new(),
            droplet_ids: vec![1, 2],
            tags: vec!["edge".to_string()],
            created_at: None,
        };
        let inbound = vec![InboundRule {
            protocol: Protocol::Tcp,
            port_range: Some("22".to_string()),
            sources: Sources::from_addresses(["1.1.1.2"]),
        }];

        let request = replacement_request(&firewall, inbound.clone(), Vec::new());
        assert_eq!(request.name, "home");
        assert_eq!(request.droplet_ids, vec![1, 2]);
        assert_eq!(request.tags, vec!["edge"]);
        assert_eq!(request.inbound_rules, inbound);
    }
}
