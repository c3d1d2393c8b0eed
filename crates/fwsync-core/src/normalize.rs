//! Read-path to write-path rule normalization
//!
//! The firewall read endpoints return rules the write endpoints refuse:
//!
//! - `icmp` rules come back with a `ports` value, but writes reject any
//!   `ports` field on an `icmp` rule
//! - "all ports" comes back as `"0"`, but writes only accept `"all"`
//!
//! Rules must pass through [`normalize_rules`] before they are sent back.
//! Normalizing an already normalized rule is a no-op.

use crate::model::{InboundRule, OutboundRule, Protocol};

/// Port range the read API uses for "all ports"
const READ_ALL_PORTS: &str = "0";

/// Port range the write API requires for "all ports"
pub const ALL_PORTS: &str = "all";

/// Rule fields the normalizer cares about
pub trait PortRule {
    fn protocol(&self) -> Protocol;
    fn port_range_mut(&mut self) -> &mut Option<String>;
}

impl PortRule for InboundRule {
    fn protocol(&self) -> Protocol {
        self.protocol
    }

    fn port_range_mut(&mut self) -> &mut Option<String> {
        &mut self.port_range
    }
}

impl PortRule for OutboundRule {
    fn protocol(&self) -> Protocol {
        self.protocol
    }

    fn port_range_mut(&mut self) -> &mut Option<String> {
        &mut self.port_range
    }
}

/// Make a single rule acceptable to the write API
pub fn normalize_rule<R: PortRule>(mut rule: R) -> R {
    let is_icmp = rule.protocol() == Protocol::Icmp;
    let ports = rule.port_range_mut();

    let normalized = match ports.take() {
        _ if is_icmp => None,
        Some(range) if range == READ_ALL_PORTS => Some(ALL_PORTS.to_string()),
        // An empty range serializes as `"ports": ""`, which the write API
        // treats like a missing field anyway
        Some(range) if range.is_empty() => None,
        other => other,
    };
    *ports = normalized;

    rule
}

/// Normalize every inbound and outbound rule of a firewall
pub fn normalize_rules(
    inbound: Vec<InboundRule>,
    outbound: Vec<OutboundRule>,
) -> (Vec<InboundRule>, Vec<OutboundRule>) {
    let inbound = inbound.into_iter().map(normalize_rule).collect();
    let outbound = outbound.into_iter().map(normalize_rule).collect();
    (inbound, outbound)
}
