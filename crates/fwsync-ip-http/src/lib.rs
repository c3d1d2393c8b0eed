// # HTTP IP Source
//
// This crate provides the public address lookup used by fwsync.
//
// ## Purpose
//
// A "what is my IP" service answers with the caller's address as plain text.
// Asking it once over IPv4 and once over IPv6 yields both public addresses
// of a dual-stack host.
//
// ## Family Pinning
//
// Each `HttpIpSource` owns a `reqwest::Client` bound to the unspecified
// local address of its family (`0.0.0.0` or `::`). The operating system can
// then only open sockets of that family, so a dual-stack service is forced
// to answer over the requested protocol. A host without connectivity in that
// family fails the lookup instead of silently answering with the other one.

use fwsync_core::traits::{IpFamily, IpSource};
use fwsync_core::{Error, Result};

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::time::Duration;

/// Default per-request timeout for address lookups
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// HTTP address lookup pinned to one IP family
#[derive(Debug)]
pub struct HttpIpSource {
    /// Lookup service URL
    url: String,

    /// Family the client is bound to
    family: IpFamily,

    /// HTTP client bound to the family's unspecified address
    client: reqwest::Client,
}

impl HttpIpSource {
    /// Create a lookup for `family` against `url` with the default timeout
    ///
    /// # Errors
    ///
    /// `Error::Config` if the HTTP client cannot be built.
    pub fn new(url: impl Into<String>, family: IpFamily) -> Result<Self> {
        Self::with_timeout(url, family, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Create a lookup with a custom per-request timeout
    pub fn with_timeout(url: impl Into<String>, family: IpFamily, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .local_address(Some(unspecified(family)))
            .timeout(timeout)
            .build()
            .map_err(|e| Error::config(format!("Failed to build {} HTTP client: {}", family, e)))?;

        Ok(Self {
            url: url.into(),
            family,
            client,
        })
    }

    /// Lookup service URL
    pub fn url(&self) -> &str {
        &self.url
    }

    async fn fetch(&self) -> Result<String> {
        let response = self.client.get(&self.url).send().await.map_err(|e| {
            Error::ip_source(format!("{} request to {} failed: {}", self.family, self.url, e))
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::ip_source(format!(
                "{} lookup at {} returned HTTP {}",
                self.family, self.url, status
            )));
        }

        let body = response.text().await.map_err(|e| {
            Error::ip_source(format!("Failed to read {} lookup response: {}", self.family, e))
        })?;

        parse_address(&body, self.family)
    }
}

#[async_trait::async_trait]
impl IpSource for HttpIpSource {
    async fn current(&self) -> Result<String> {
        let address = self.fetch().await?;
        tracing::debug!("{} lookup at {} answered {}", self.family, self.url, address);
        Ok(address)
    }

    fn family(&self) -> IpFamily {
        self.family
    }
}

fn unspecified(family: IpFamily) -> IpAddr {
    match family {
        IpFamily::V4 => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
        IpFamily::V6 => IpAddr::V6(Ipv6Addr::UNSPECIFIED),
    }
}

/// Trim a lookup response; the literal itself is passed through untouched
fn parse_address(body: &str, family: IpFamily) -> Result<String> {
    let text = body.trim();
    if text.is_empty() {
        return Err(Error::ip_source(format!("{} lookup returned an empty body", family)));
    }

    Ok(text.to_string())
}
