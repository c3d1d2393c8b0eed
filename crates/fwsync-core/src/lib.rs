// # fwsync-core
//
// Core library for keeping a cloud firewall's allow-list in step with the
// host's public IPv4/IPv6 addresses ("dynamic DNS for firewalls").
//
// ## Architecture Overview
//
// - **IpSource**: Trait for a public address lookup pinned to one family
// - **FirewallProvider**: Trait for listing, reading and replacing firewalls
// - **StateStore**: Trait for persisting the last observed address set
// - **AddressResolver**: Runs the IPv4 and IPv6 lookups and assembles an AddressSet
// - **normalize**: Fixes read-path rule quirks before rules are written back
// - **reconcile**: Decides whether anything changed and swaps stale addresses
// - **SyncEngine**: Runs load → resolve → locate → normalize → reconcile → update → save once
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Pure rule logic is separate from I/O collaborators
// 2. **One Shot**: A run is a linear pipeline; scheduling is external
// 3. **Fail Fast**: No retries; every error aborts the run before state is saved
// 4. **Library-First**: All core functionality can be used as a library

pub mod traits;
pub mod model;
pub mod normalize;
pub mod reconcile;
pub mod resolver;
pub mod locator;
pub mod updater;
pub mod engine;
pub mod config;
pub mod error;
pub mod state;

// Re-export core types for convenience
pub use traits::{FirewallProvider, IpFamily, IpSource, StateStore};
pub use model::{AddressSet, Firewall, FirewallRef, FirewallRequest, InboundRule, OutboundRule};
pub use reconcile::Reconciliation;
pub use resolver::AddressResolver;
pub use engine::{RunReport, SyncEngine};
pub use config::{IpLookupConfig, ProviderConfig, StateStoreConfig, SyncConfig};
pub use error::{Error, Result};
pub use state::{FileStateStore, MemoryStateStore};
