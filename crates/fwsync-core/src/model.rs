//! Data model shared by the pipeline and the provider crates
//!
//! Wire names follow the DigitalOcean API v2 firewall schema. Empty lists and
//! absent port ranges are omitted when serialized, matching what the update
//! endpoint accepts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::Error;

/// Maximum number of addresses tracked per run (one IPv4 and one IPv6)
pub const MAX_ADDRESSES: usize = 2;

/// The host's public addresses, in resolver order `[ipv4?, ipv6?]`
///
/// Equality is ordered-sequence equality: same length, same elements, same
/// positions. `["a", "b"]` and `["b", "a"]` are different sets for the
/// purpose of change detection.
///
/// Serializes as a bare JSON array of strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct AddressSet(Vec<String>);

impl AddressSet {
    /// Create an empty address set (no prior state)
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Assemble a set from the two per-family lookups, IPv4 first
    pub fn from_lookups(ipv4: Option<String>, ipv6: Option<String>) -> Self {
        Self(ipv4.into_iter().chain(ipv6).collect())
    }

    /// First tracked address, if any
    pub fn first(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }

    /// Second tracked address, if any
    pub fn second(&self) -> Option<&str> {
        self.0.get(1).map(String::as_str)
    }

    /// Whether `address` is one of the tracked addresses
    pub fn contains(&self, address: &str) -> bool {
        self.0.iter().any(|a| a == address)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl TryFrom<Vec<String>> for AddressSet {
    type Error = Error;

    fn try_from(addresses: Vec<String>) -> Result<Self, Self::Error> {
        if addresses.len() > MAX_ADDRESSES {
            return Err(Error::invalid_input(format!(
                "address set holds at most {} entries, got {}",
                MAX_ADDRESSES,
                addresses.len()
            )));
        }
        Ok(Self(addresses))
    }
}

impl From<AddressSet> for Vec<String> {
    fn from(set: AddressSet) -> Self {
        set.0
    }
}

impl fmt::Display for AddressSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.0.join(", "))
    }
}

/// How the caller names the firewall to update
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "by", content = "value", rename_all = "snake_case")]
pub enum FirewallRef {
    /// Opaque provider identifier
    Id(String),
    /// Human-readable name, matched case-insensitively
    Name(String),
}

impl FirewallRef {
    /// Build a reference from the two optional CLI inputs
    ///
    /// Exactly one of `name` and `id` must be set. Empty strings count as
    /// unset.
    pub fn from_parts(name: Option<String>, id: Option<String>) -> Result<Self, Error> {
        let name = name.filter(|n| !n.is_empty());
        let id = id.filter(|i| !i.is_empty());

        match (name, id) {
            (Some(_), Some(_)) => Err(Error::config(
                "Specify either a firewall name or a firewall id, not both",
            )),
            (None, None) => Err(Error::config(
                "You must specify a firewall name or a firewall id",
            )),
            (Some(name), None) => Ok(Self::Name(name)),
            (None, Some(id)) => Ok(Self::Id(id)),
        }
    }
}

impl fmt::Display for FirewallRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FirewallRef::Id(id) => write!(f, "id={}", id),
            FirewallRef::Name(name) => write!(f, "name={}", name),
        }
    }
}

/// Transport protocol of a firewall rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Tcp,
    Udp,
    Icmp,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Protocol::Tcp => "tcp",
            Protocol::Udp => "udp",
            Protocol::Icmp => "icmp",
        };
        f.write_str(name)
    }
}

/// Traffic endpoints of a rule: literal addresses plus resource references
///
/// Only `addresses` is ever rewritten. The resource references pass through.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleTargets {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub addresses: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub droplet_ids: Vec<u64>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub load_balancer_uids: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub kubernetes_ids: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl RuleTargets {
    /// Targets made of literal addresses only
    pub fn from_addresses<I, S>(addresses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            addresses: addresses.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }
}

/// Where inbound traffic may come from
pub type Sources = RuleTargets;

/// Where outbound traffic may go
pub type Destinations = RuleTargets;

/// An inbound (ingress) rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundRule {
    pub protocol: Protocol,

    /// `"22"`, `"8000-9000"`, `"all"`, or absent
    #[serde(rename = "ports", default, skip_serializing_if = "Option::is_none")]
    pub port_range: Option<String>,

    #[serde(default)]
    pub sources: Sources,
}

/// An outbound (egress) rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundRule {
    pub protocol: Protocol,

    #[serde(rename = "ports", default, skip_serializing_if = "Option::is_none")]
    pub port_range: Option<String>,

    #[serde(default)]
    pub destinations: Destinations,
}

/// A firewall as returned by the provider's read endpoints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Firewall {
    pub id: String,

    pub name: String,

    /// Provisioning status, read-only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    #[serde(default)]
    pub inbound_rules: Vec<InboundRule>,

    #[serde(default)]
    pub outbound_rules: Vec<OutboundRule>,

    /// Compute instances the firewall is attached to
    #[serde(default)]
    pub droplet_ids: Vec<u64>,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Full replacement document for the update endpoint
///
/// Anything missing from this document is removed from the firewall.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirewallRequest {
    pub name: String,
    pub inbound_rules: Vec<InboundRule>,
    pub outbound_rules: Vec<OutboundRule>,
    pub droplet_ids: Vec<u64>,
    pub tags: Vec<String>,
}

impl From<&Firewall> for FirewallRequest {
    fn from(firewall: &Firewall) -> Self {
        Self {
            name: firewall.name.clone(),
            inbound_rules: firewall.inbound_rules.clone(),
            outbound_rules: firewall.outbound_rules.clone(),
            droplet_ids: firewall.droplet_ids.clone(),
            tags: firewall.tags.clone(),
        }
    }
}

/// One page of the provider's firewall listing
#[derive(Debug, Clone, Default)]
pub struct FirewallPage {
    pub firewalls: Vec<Firewall>,
    /// Whether another page follows this one
    pub has_next: bool,
}
