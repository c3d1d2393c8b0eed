//! Core traits for the firewall sync pipeline
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`IpSource`]: Look up the host's public address over one address family
//! - [`FirewallProvider`]: Read and replace firewalls via a provider API
//! - [`StateStore`]: Persist the last observed address set between runs

pub mod ip_source;
pub mod firewall_provider;
pub mod state_store;

pub use ip_source::{IpFamily, IpSource};
pub use firewall_provider::FirewallProvider;
pub use state_store::StateStore;
