//! Error types for the firewall sync pipeline
//!
//! Every failure aborts the current run. Nothing in this crate retries.

use thiserror::Error;

/// Result type alias for fwsync operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the firewall sync pipeline
#[derive(Error, Debug)]
pub enum Error {
    /// Neither the IPv4 nor the IPv6 lookup produced an address
    #[error("Both address lookups failed (ipv4: {ipv4}; ipv6: {ipv6})")]
    DualStackUnreachable {
        /// Failure reported by the IPv4 lookup
        ipv4: String,
        /// Failure reported by the IPv6 lookup
        ipv6: String,
    },

    /// The local address record exists but cannot be read or parsed
    #[error("Failed to load previous addresses: {0}")]
    StateLoad(String),

    /// The local address record could not be written after a remote update
    #[error("Firewall was updated but saving the new addresses failed: {0}")]
    StateSave(String),

    /// Firewall reference does not resolve
    #[error("Firewall not found: {0}")]
    NotFound(String),

    /// The provider refused the replacement document
    #[error("Firewall update rejected: {0}")]
    UpdateRejected(String),

    /// IP lookup errors for a single address family
    #[error("IP lookup error: {0}")]
    IpSource(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Local I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Provider-specific error
    #[error("Provider error ({provider}): {message}")]
    Provider {
        /// Provider name
        provider: String,
        /// Error message
        message: String,
    },

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a dual-stack failure from the two per-family failures
    pub fn dual_stack_unreachable(ipv4: impl ToString, ipv6: impl ToString) -> Self {
        Self::DualStackUnreachable {
            ipv4: ipv4.to_string(),
            ipv6: ipv6.to_string(),
        }
    }

    /// Create a state load error
    pub fn state_load(msg: impl Into<String>) -> Self {
        Self::StateLoad(msg.into())
    }

    /// Create a state save error
    pub fn state_save(msg: impl Into<String>) -> Self {
        Self::StateSave(msg.into())
    }

    /// Create a "not found" error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create an update rejection error
    pub fn update_rejected(msg: impl Into<String>) -> Self {
        Self::UpdateRejected(msg.into())
    }

    /// Create an IP lookup error
    pub fn ip_source(msg: impl Into<String>) -> Self {
        Self::IpSource(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a provider-specific error
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Whether the remote firewall may already reflect the new addresses
    ///
    /// Only a failed save after a successful update leaves local and remote
    /// state out of step.
    pub fn is_partial_success(&self) -> bool {
        matches!(self, Self::StateSave(_))
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
