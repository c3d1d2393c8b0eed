//! One-shot sync engine
//!
//! The SyncEngine is responsible for:
//! - Loading the previously saved addresses
//! - Resolving the current public addresses
//! - Fetching, normalizing and reconciling the firewall when they differ
//! - Persisting the new addresses after a successful update
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌─────────────────┐
//! │ StateStore  │   │ AddressResolver │
//! │ (load)      │   │ (v4 ∥ v6)       │
//! └─────────────┘   └─────────────────┘
//!        │                   │
//!        └────────┬──────────┘
//!                 ▼
//!        ┌──────────────────┐   unchanged
//!        │ addresses_changed│ ─────────────▶ RunReport::Unchanged
//!        └──────────────────┘
//!                 │ changed
//!                 ▼
//!   locate ─▶ normalize_rules ─▶ reconcile ─▶ submit ─▶ StateStore (save)
//! ```
//!
//! ## Failure Semantics
//!
//! Every error aborts the run immediately. State is only written after the
//! provider accepted the update, so a rejected update is retried, with the
//! same diff, by the next invocation.

use crate::error::{Error, Result};
use crate::locator::locate;
use crate::model::{AddressSet, FirewallRef};
use crate::normalize::normalize_rules;
use crate::reconcile::{Reconciliation, addresses_changed, reconcile};
use crate::resolver::AddressResolver;
use crate::traits::{FirewallProvider, StateStore};
use crate::updater::{replacement_request, submit};
use tracing::{debug, error, info, warn};

/// What a run did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunReport {
    /// The addresses matched the saved set; no remote call was made
    Unchanged {
        addresses: AddressSet,
    },

    /// The firewall was replaced with reconciled rules
    Updated {
        firewall_id: String,
        firewall_name: String,
        /// Number of inbound rules whose sources were rewritten
        touched_rules: usize,
        previous: AddressSet,
        addresses: AddressSet,
        /// The update was only logged, not sent, and state was not saved
        dry_run: bool,
    },
}

/// Runs the address check and firewall update once
///
/// ## Lifecycle
///
/// 1. Create with [`SyncEngine::new()`]
/// 2. Call [`SyncEngine::run()`] once per invocation
///
/// Scheduling repeated runs is left to the caller (cron, a systemd timer).
pub struct SyncEngine {
    /// Dual-stack address lookups
    resolver: AddressResolver,

    /// Firewall API
    provider: Box<dyn FirewallProvider>,

    /// Last observed addresses
    state_store: Box<dyn StateStore>,

    /// Firewall to keep in sync
    firewall: FirewallRef,

    /// Skip saving state (the provider is not really writing)
    dry_run: bool,
}

impl SyncEngine {
    /// Create a new sync engine
    ///
    /// A dry-run provider puts the engine in dry-run mode.
    pub fn new(
        resolver: AddressResolver,
        provider: Box<dyn FirewallProvider>,
        state_store: Box<dyn StateStore>,
        firewall: FirewallRef,
    ) -> Self {
        let dry_run = provider.is_dry_run();
        Self {
            resolver,
            provider,
            state_store,
            firewall,
            dry_run,
        }
    }

    /// Leave the saved addresses alone after an update
    ///
    /// Cannot switch off the dry-run mode of a dry-run provider.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run || self.provider.is_dry_run();
        self
    }

    /// Run the pipeline once
    ///
    /// # Returns
    ///
    /// - `Ok(RunReport)`: No-op or successful update
    /// - `Err(Error)`: The first failure encountered; see [`Error`]
    pub async fn run(&self) -> Result<RunReport> {
        let previous = self.state_store.load().await?;
        debug!("Previous addresses: {}", previous);

        let current = self.resolver.resolve().await?;

        if !addresses_changed(&previous, &current) {
            info!("The addresses didn't change ({})", current);
            return Ok(RunReport::Unchanged { addresses: current });
        }

        info!("Addresses changed: {} -> {}", previous, current);

        let firewall = locate(self.provider.as_ref(), &self.firewall).await?;
        debug!(
            "Located firewall {} ({}) with {} inbound rule(s)",
            firewall.name,
            firewall.id,
            firewall.inbound_rules.len()
        );

        let (inbound, outbound) =
            normalize_rules(firewall.inbound_rules.clone(), firewall.outbound_rules.clone());

        let (rules, touched, addresses) = match reconcile(&previous, &current, inbound) {
            Reconciliation::Changed {
                rules,
                touched,
                addresses,
            } => (rules, touched, addresses),
            Reconciliation::Unchanged => {
                return Ok(RunReport::Unchanged { addresses: current });
            }
        };

        if touched.is_empty() && !previous.is_empty() {
            warn!(
                "No inbound rule of firewall {} references the previous addresses {}; \
                 the firewall may have been edited by hand or a previous save failed",
                firewall.name, previous
            );
        }
        for index in &touched {
            debug!("Rewrote sources of inbound rule #{}", index);
        }

        let request = replacement_request(&firewall, rules, outbound);
        let updated = submit(self.provider.as_ref(), &firewall.id, &request).await?;

        if self.dry_run {
            info!("Dry run: not saving addresses {}", addresses);
        } else {
            self.persist(&addresses).await?;
            info!("Firewall rules updated successfully.");
        }

        Ok(RunReport::Updated {
            firewall_id: updated.id,
            firewall_name: updated.name,
            touched_rules: touched.len(),
            previous,
            addresses,
            dry_run: self.dry_run,
        })
    }

    /// Save after a remote update, reporting failure as a divergence
    async fn persist(&self, addresses: &AddressSet) -> Result<()> {
        self.state_store.save(addresses).await.map_err(|e| {
            error!(
                "Firewall now allows {} but the local record was not updated: {}. \
                 Until the state file holds {}, later runs will find no rule \
                 referencing the saved addresses.",
                addresses, e, addresses
            );
            match e {
                Error::StateSave(_) => e,
                other => Error::state_save(other.to_string()),
            }
        })
    }
}
