//! Address reconciliation
//!
//! Given the previously saved addresses and the freshly resolved ones, decide
//! whether the firewall needs an update and rewrite the inbound rules that
//! reference a stale address.
//!
//! ```text
//! old = [1.1.1.1, 2001:db8::1]     new = [1.1.1.2, 2001:db8::1]
//!
//! sources [1.1.1.1, 9.9.9.9]   ->  [9.9.9.9, 1.1.1.2, 2001:db8::1]
//! sources [10.0.0.0/8]         ->  unchanged (no old address present)
//! ```
//!
//! Only entries equal to a known old address are acted on. An address the
//! tool has never saved is never removed.

use crate::model::{AddressSet, InboundRule};

/// Outcome of comparing old and new addresses against a rule set
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciliation {
    /// Old and new address sets are identical; nothing to send
    Unchanged,

    /// The address set changed
    Changed {
        /// Inbound rules with stale addresses swapped for fresh ones
        rules: Vec<InboundRule>,
        /// Indices into `rules` of the rules that were rewritten
        touched: Vec<usize>,
        /// The set to persist once the firewall update succeeds
        addresses: AddressSet,
    },
}

impl Reconciliation {
    pub fn is_changed(&self) -> bool {
        matches!(self, Reconciliation::Changed { .. })
    }

    /// Number of rules rewritten (zero when unchanged)
    pub fn touched_count(&self) -> usize {
        match self {
            Reconciliation::Unchanged => 0,
            Reconciliation::Changed { touched, .. } => touched.len(),
        }
    }
}

/// Ordered comparison of two address sets
///
/// A difference in length, in any element, or in element order is a change.
pub fn addresses_changed(old: &AddressSet, new: &AddressSet) -> bool {
    old != new
}

/// Swap stale addresses for fresh ones in a single rule
///
/// Returns `None` when the rule's sources contain none of the old addresses.
/// Otherwise every occurrence of every old address is dropped and each new
/// address is appended once, after the surviving entries.
pub fn swap_addresses(
    rule: &InboundRule,
    old: &AddressSet,
    new: &AddressSet,
) -> Option<InboundRule> {
    let addresses = &rule.sources.addresses;

    if !addresses.iter().any(|a| old.contains(a)) {
        return None;
    }

    let swapped = addresses
        .iter()
        .filter(|a| !old.contains(a))
        .cloned()
        .chain(new.iter().map(str::to_string))
        .collect();

    let mut rule = rule.clone();
    rule.sources.addresses = swapped;
    Some(rule)
}

/// Reconcile normalized inbound rules against an address change
///
/// Rules are expected to have been through
/// [`normalize_rules`](crate::normalize::normalize_rules). Outbound rules are
/// not an input: address rotation applies to inbound sources only.
pub fn reconcile(old: &AddressSet, new: &AddressSet, rules: Vec<InboundRule>) -> Reconciliation {
    if !addresses_changed(old, new) {
        return Reconciliation::Unchanged;
    }

    let mut touched = Vec::new();
    let rules = rules
        .into_iter()
        .enumerate()
        .map(|(index, rule)| match swap_addresses(&rule, old, new) {
            Some(swapped) => {
                touched.push(index);
                swapped
            }
            None => rule,
        })
        .collect();

    Reconciliation::Changed {
        rules,
        touched,
        addresses: new.clone(),
    }
}
