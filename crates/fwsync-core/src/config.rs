//! Configuration types for fwsync
//!
//! This module defines all configuration structures used throughout the crate.

use serde::{Deserialize, Serialize};

use crate::model::FirewallRef;

/// Lookup service queried when no URL is configured
pub const DEFAULT_IP_API: &str = "http://v4v6.ipv6-test.com/api/myip.php";

/// Main fwsync configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Public address lookup configuration
    #[serde(default)]
    pub ip_lookup: IpLookupConfig,

    /// Firewall provider configuration
    pub provider: ProviderConfig,

    /// State store configuration
    #[serde(default)]
    pub state_store: StateStoreConfig,

    /// Firewall to keep in sync
    pub firewall: FirewallRef,
}

impl SyncConfig {
    /// Create a configuration with default lookup and state settings
    pub fn new(provider: ProviderConfig, firewall: FirewallRef) -> Self {
        Self {
            ip_lookup: IpLookupConfig::default(),
            provider,
            state_store: StateStoreConfig::default(),
            firewall,
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.ip_lookup.validate()?;
        self.provider.validate()?;
        self.state_store.validate()?;

        match &self.firewall {
            FirewallRef::Id(id) if id.is_empty() => {
                Err(crate::Error::config("Firewall id cannot be empty"))
            }
            FirewallRef::Name(name) if name.is_empty() => {
                Err(crate::Error::config("Firewall name cannot be empty"))
            }
            _ => Ok(()),
        }
    }
}

/// Public address lookup configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpLookupConfig {
    /// URL answering with the caller's address as plain text
    #[serde(default = "default_ip_api")]
    pub url: String,

    /// Per-request timeout (in seconds)
    #[serde(default = "default_lookup_timeout_secs")]
    pub timeout_secs: u64,
}

impl IpLookupConfig {
    /// Validate the lookup configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.url.is_empty() {
            return Err(crate::Error::config("IP lookup URL cannot be empty"));
        }
        if !self.url.starts_with("http://") && !self.url.starts_with("https://") {
            return Err(crate::Error::config(format!(
                "IP lookup URL must use HTTP or HTTPS scheme. Got: {}",
                self.url
            )));
        }
        if !(1..=300).contains(&self.timeout_secs) {
            return Err(crate::Error::config(format!(
                "IP lookup timeout must be between 1 and 300 seconds. Got: {}",
                self.timeout_secs
            )));
        }
        Ok(())
    }
}

impl Default for IpLookupConfig {
    fn default() -> Self {
        Self {
            url: default_ip_api(),
            timeout_secs: default_lookup_timeout_secs(),
        }
    }
}

/// Firewall provider configuration
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderConfig {
    /// DigitalOcean cloud firewalls
    #[serde(rename = "digitalocean")]
    DigitalOcean {
        /// Personal access token with firewall read/write scope
        api_token: String,
        /// API base URL override (defaults to the public endpoint)
        #[serde(default)]
        api_base: Option<String>,
        /// Read everything, log the update payload, send nothing
        #[serde(default)]
        dry_run: bool,
    },
}

impl ProviderConfig {
    /// Validate the provider configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            ProviderConfig::DigitalOcean {
                api_token,
                api_base,
                ..
            } => {
                if api_token.is_empty() {
                    return Err(crate::Error::config(
                        "DigitalOcean API token cannot be empty",
                    ));
                }
                if let Some(base) = api_base
                    && !base.starts_with("http://")
                    && !base.starts_with("https://")
                {
                    return Err(crate::Error::config(format!(
                        "DigitalOcean API base must use HTTP or HTTPS scheme. Got: {}",
                        base
                    )));
                }
                Ok(())
            }
        }
    }

    /// Get the provider type name
    pub fn type_name(&self) -> &str {
        match self {
            ProviderConfig::DigitalOcean { .. } => "digitalocean",
        }
    }

    /// Whether remote writes are suppressed
    pub fn is_dry_run(&self) -> bool {
        match self {
            ProviderConfig::DigitalOcean { dry_run, .. } => *dry_run,
        }
    }
}

// Custom Debug implementation that hides the API token
impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderConfig::DigitalOcean {
                api_base, dry_run, ..
            } => f
                .debug_struct("DigitalOcean")
                .field("api_token", &"<REDACTED>")
                .field("api_base", api_base)
                .field("dry_run", dry_run)
                .finish(),
        }
    }
}

/// State store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StateStoreConfig {
    /// File-based state store
    File {
        /// Path to the address record
        path: String,
    },

    /// In-memory state store (not persistent)
    Memory,
}

impl StateStoreConfig {
    /// Validate the state store configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            StateStoreConfig::File { path } if path.is_empty() => {
                Err(crate::Error::config("State file path cannot be empty"))
            }
            _ => Ok(()),
        }
    }
}

impl Default for StateStoreConfig {
    fn default() -> Self {
        StateStoreConfig::File {
            path: crate::state::DEFAULT_STATE_FILE.to_string(),
        }
    }
}

fn default_ip_api() -> String {
    DEFAULT_IP_API.to_string()
}

fn default_lookup_timeout_secs() -> u64 {
    10
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(token: &str) -> ProviderConfig {
        ProviderConfig::DigitalOcean {
            api_token: token.to_string(),
            api_base: None,
            dry_run: false,
        }
    }

    #[test]
    fn defaults_are_valid() {
        let config = SyncConfig::new(provider("dop_v1_abc"), FirewallRef::Name("home".into()));
        assert!(config.validate().is_ok());
        assert_eq!(config.ip_lookup.url, DEFAULT_IP_API);
        assert!(matches!(
            config.state_store,
            StateStoreConfig::File { ref path } if path == "old_ips.json"
        ));
    }

    #[test]
    fn empty_token_is_rejected() {
        let config = SyncConfig::new(provider(""), FirewallRef::Id("abc".into()));
        assert!(config.validate().is_err());
    }

    #[test]
    fn lookup_url_scheme_is_checked() {
        let mut config = SyncConfig::new(provider("t"), FirewallRef::Id("abc".into()));
        config.ip_lookup.url = "ftp://example.com/ip".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn lookup_timeout_range_is_checked() {
        let mut config = SyncConfig::new(provider("t"), FirewallRef::Id("abc".into()));
        config.ip_lookup.timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn deserializes_from_json() {
        let config: SyncConfig = serde_json::from_value(serde_json::json!({
            "provider": { "type": "digitalocean", "api_token": "t", "dry_run": true },
            "state_store": { "type": "memory" },
            "firewall": { "by": "name", "value": "home" }
        }))
        .unwrap();

        assert!(config.provider.is_dry_run());
        assert_eq!(config.provider.type_name(), "digitalocean");
        assert_eq!(config.firewall, FirewallRef::Name("home".into()));
        assert_eq!(config.ip_lookup.timeout_secs, 10);
    }

    #[test]
    fn provider_tag_matches_type_name() {
        let json = serde_json::to_value(provider("t")).unwrap();
        assert_eq!(json["type"], provider("t").type_name());
    }

    #[test]
    fn api_token_not_exposed_in_debug() {
        let config = SyncConfig::new(
            provider("dop_v1_secret_token"),
            FirewallRef::Name("home".into()),
        );

        let debug_str = format!("{:?}", config);
        assert!(!debug_str.contains("dop_v1_secret_token"));
        assert!(debug_str.contains("<REDACTED>"));
    }
}
