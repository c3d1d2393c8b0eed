// # IP Source Trait
//
// Defines the interface for discovering the host's public address over a
// single address family.
//
// ## Implementations
//
// - HTTP lookup pinned to IPv4 or IPv6: `fwsync-ip-http` crate
//
// ## Usage
//
// ```rust,ignore
// use fwsync_core::{IpFamily, IpSource};
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let source = /* IpSource implementation for IpFamily::V4 */;
//
//     let address = source.current().await?;
//     println!("public {} address: {}", source.family(), address);
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use std::fmt;

/// Address family a lookup is pinned to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IpFamily {
    V4,
    V6,
}

impl IpFamily {
    /// The family that is not this one
    pub fn other(self) -> Self {
        match self {
            IpFamily::V4 => IpFamily::V6,
            IpFamily::V6 => IpFamily::V4,
        }
    }
}

impl fmt::Display for IpFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IpFamily::V4 => f.write_str("ipv4"),
            IpFamily::V6 => f.write_str("ipv6"),
        }
    }
}

/// Trait for public address lookups
///
/// Each instance answers for exactly one address family and owns its own
/// transport. Two instances never share connection state, so the IPv4 and
/// IPv6 lookups can run side by side.
///
/// # Allowed
/// - ✅ One outbound request per `current()` call
/// - ✅ Return an error when the family is unreachable
///
/// # Forbidden
/// - ❌ Retrying or falling back to the other family
/// - ❌ Caching an address between calls
/// - ❌ Deciding whether the firewall needs an update
#[async_trait]
pub trait IpSource: Send + Sync {
    /// Fetch the current public address for this source's family
    ///
    /// The returned string is whatever the lookup service reported, trimmed
    /// of surrounding whitespace. It is treated as an opaque literal.
    ///
    /// # Returns
    ///
    /// - `Ok(String)`: The address literal
    /// - `Err(Error)`: The family is unreachable or the service misbehaved
    async fn current(&self) -> Result<String, crate::Error>;

    /// The address family this source is pinned to
    fn family(&self) -> IpFamily;
}
