//! Dual-stack public address resolution
//!
//! Runs one IPv4-pinned and one IPv6-pinned lookup side by side and
//! assembles the results into an [`AddressSet`]. Losing one family is
//! expected (IPv4-only and IPv6-only hosts exist) and only logged. Losing
//! both aborts the run.

use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::model::AddressSet;
use crate::traits::{IpFamily, IpSource};

/// Resolves the host's current public addresses
pub struct AddressResolver {
    ipv4: Box<dyn IpSource>,
    ipv6: Box<dyn IpSource>,
}

impl AddressResolver {
    /// Create a resolver from one source per family
    ///
    /// # Errors
    ///
    /// `Error::Config` if a source is pinned to the wrong family.
    pub fn new(ipv4: Box<dyn IpSource>, ipv6: Box<dyn IpSource>) -> Result<Self> {
        for (source, expected) in [(&ipv4, IpFamily::V4), (&ipv6, IpFamily::V6)] {
            if source.family() != expected {
                return Err(Error::config(format!(
                    "{} lookup slot was given a source pinned to {}",
                    expected,
                    source.family()
                )));
            }
        }

        Ok(Self { ipv4, ipv6 })
    }

    /// Look up both families and return `[ipv4?, ipv6?]`
    ///
    /// # Errors
    ///
    /// `Error::DualStackUnreachable` when neither lookup succeeds.
    pub async fn resolve(&self) -> Result<AddressSet> {
        let (ipv4, ipv6) = tokio::join!(self.ipv4.current(), self.ipv6.current());

        match (ipv4, ipv6) {
            (Err(v4_err), Err(v6_err)) => Err(Error::dual_stack_unreachable(v4_err, v6_err)),
            (ipv4, ipv6) => Ok(AddressSet::from_lookups(
                Self::report(IpFamily::V4, ipv4),
                Self::report(IpFamily::V6, ipv6),
            )),
        }
    }

    fn report(family: IpFamily, lookup: Result<String>) -> Option<String> {
        match lookup {
            Ok(address) => {
                info!("Current {} address: {}", family, address);
                Some(address)
            }
            Err(e) => {
                warn!(
                    "Failed to get the {} address, is this machine {} only? {}",
                    family,
                    family.other(),
                    e
                );
                None
            }
        }
    }
}
