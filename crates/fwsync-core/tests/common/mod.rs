//! Test doubles and common utilities for pipeline contract tests
//!
//! These doubles record every call so tests can assert what the engine did
//! and, just as often, what it did not do.

#![allow(dead_code)]

use fwsync_core::error::{Error, Result};
use fwsync_core::model::{
    Destinations, Firewall, FirewallPage, FirewallRequest, InboundRule, OutboundRule, Protocol,
    Sources,
};
use fwsync_core::traits::{FirewallProvider, IpFamily, IpSource, StateStore};
use fwsync_core::{AddressResolver, AddressSet, FirewallRef, MemoryStateStore, SyncEngine};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// An IP source with a fixed answer, or a fixed failure
#[derive(Clone)]
pub struct ScriptedIpSource {
    family: IpFamily,
    answer: Option<String>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedIpSource {
    pub fn answering(family: IpFamily, address: &str) -> Self {
        Self {
            family,
            answer: Some(address.to_string()),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing(family: IpFamily) -> Self {
        Self {
            family,
            answer: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Get the number of times current() was called
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl IpSource for ScriptedIpSource {
    async fn current(&self) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.answer
            .clone()
            .ok_or_else(|| Error::ip_source(format!("network unreachable over {}", self.family)))
    }

    fn family(&self) -> IpFamily {
        self.family
    }
}

/// An in-memory firewall provider that records calls
///
/// Clones share firewalls and counters.
#[derive(Clone)]
pub struct MockFirewallProvider {
    firewalls: Arc<Mutex<Vec<Firewall>>>,
    /// Largest page the fake API returns, whatever the caller asks for
    page_cap: usize,
    reject_updates: bool,
    dry_run: bool,
    list_calls: Arc<Mutex<Vec<(u32, u32)>>>,
    get_calls: Arc<AtomicUsize>,
    updates: Arc<Mutex<Vec<(String, FirewallRequest)>>>,
}

impl MockFirewallProvider {
    pub fn new(firewalls: Vec<Firewall>) -> Self {
        Self {
            firewalls: Arc::new(Mutex::new(firewalls)),
            page_cap: usize::MAX,
            reject_updates: false,
            dry_run: false,
            list_calls: Arc::new(Mutex::new(Vec::new())),
            get_calls: Arc::new(AtomicUsize::new(0)),
            updates: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Serve at most `cap` firewalls per listing page
    pub fn with_page_cap(mut self, cap: usize) -> Self {
        self.page_cap = cap;
        self
    }

    /// Answer every update with a rejection
    pub fn rejecting_updates(mut self) -> Self {
        self.reject_updates = true;
        self
    }

    /// Record updates without applying them, and report dry-run mode
    pub fn dry_run(mut self) -> Self {
        self.dry_run = true;
        self
    }

    /// (page, per_page) of every list call, in order
    pub fn list_calls(&self) -> Vec<(u32, u32)> {
        self.list_calls.lock().unwrap().clone()
    }

    pub fn get_call_count(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    /// Every update received, accepted or not
    pub fn updates(&self) -> Vec<(String, FirewallRequest)> {
        self.updates.lock().unwrap().clone()
    }

    /// Total calls of any kind
    pub fn remote_call_count(&self) -> usize {
        self.list_calls().len() + self.get_call_count() + self.updates().len()
    }

    /// Current stored copy of a firewall
    pub fn firewall(&self, id: &str) -> Option<Firewall> {
        self.firewalls
            .lock()
            .unwrap()
            .iter()
            .find(|f| f.id == id)
            .cloned()
    }
}

#[async_trait::async_trait]
impl FirewallProvider for MockFirewallProvider {
    async fn list_firewalls(&self, page: u32, per_page: u32) -> Result<FirewallPage> {
        self.list_calls.lock().unwrap().push((page, per_page));

        let firewalls = self.firewalls.lock().unwrap();
        let size = (per_page as usize).min(self.page_cap);
        let start = (page as usize - 1) * size;
        let end = (start + size).min(firewalls.len());

        Ok(FirewallPage {
            firewalls: firewalls.get(start..end).unwrap_or_default().to_vec(),
            has_next: end < firewalls.len(),
        })
    }

    async fn get_firewall(&self, id: &str) -> Result<Firewall> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        self.firewall(id)
            .ok_or_else(|| Error::not_found(format!("firewall {}", id)))
    }

    async fn update_firewall(&self, id: &str, request: &FirewallRequest) -> Result<Firewall> {
        self.updates
            .lock()
            .unwrap()
            .push((id.to_string(), request.clone()));

        if self.reject_updates {
            return Err(Error::provider("mock", "422 Unprocessable Entity"));
        }

        if self.dry_run {
            return self
                .firewall(id)
                .ok_or_else(|| Error::not_found(format!("firewall {}", id)));
        }

        let mut firewalls = self.firewalls.lock().unwrap();
        let stored = firewalls
            .iter_mut()
            .find(|f| f.id == id)
            .ok_or_else(|| Error::not_found(format!("firewall {}", id)))?;

        stored.name = request.name.clone();
        stored.inbound_rules = request.inbound_rules.clone();
        stored.outbound_rules = request.outbound_rules.clone();
        stored.droplet_ids = request.droplet_ids.clone();
        stored.tags = request.tags.clone();

        Ok(stored.clone())
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }

    fn is_dry_run(&self) -> bool {
        self.dry_run
    }
}

/// A state store that loads from memory and always fails to save
#[derive(Clone)]
pub struct UnwritableStateStore {
    inner: MemoryStateStore,
    save_attempts: Arc<AtomicUsize>,
}

impl UnwritableStateStore {
    pub fn new(addresses: AddressSet) -> Self {
        Self {
            inner: MemoryStateStore::with_addresses(addresses),
            save_attempts: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn save_attempts(&self) -> usize {
        self.save_attempts.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl StateStore for UnwritableStateStore {
    async fn load(&self) -> Result<AddressSet> {
        self.inner.load().await
    }

    async fn save(&self, _addresses: &AddressSet) -> Result<()> {
        self.save_attempts.fetch_add(1, Ordering::SeqCst);
        Err(Error::state_save("read-only file system"))
    }
}

/// Build an address set from literals
pub fn addresses(literals: &[&str]) -> AddressSet {
    AddressSet::try_from(literals.iter().map(|a| a.to_string()).collect::<Vec<_>>())
        .expect("at most two addresses")
}

pub fn tcp_rule(ports: &str, sources: &[&str]) -> InboundRule {
    InboundRule {
        protocol: Protocol::Tcp,
        port_range: Some(ports.to_string()),
        sources: Sources::from_addresses(sources.iter().copied()),
    }
}

pub fn icmp_rule(ports: Option<&str>, sources: &[&str]) -> InboundRule {
    InboundRule {
        protocol: Protocol::Icmp,
        port_range: ports.map(str::to_string),
        sources: Sources::from_addresses(sources.iter().copied()),
    }
}

pub fn allow_all_outbound() -> Vec<OutboundRule> {
    vec![
        OutboundRule {
            protocol: Protocol::Tcp,
            port_range: Some("0".to_string()),
            destinations: Destinations::from_addresses(["0.0.0.0/0", "::/0"]),
        },
        OutboundRule {
            protocol: Protocol::Icmp,
            port_range: Some("0".to_string()),
            destinations: Destinations::from_addresses(["0.0.0.0/0", "::/0"]),
        },
    ]
}

pub fn firewall(id: &str, name: &str, inbound_rules: Vec<InboundRule>) -> Firewall {
    Firewall {
        id: id.to_string(),
        name: name.to_string(),
        status: Some("succeeded".to_string()),
        inbound_rules,
        outbound_rules: allow_all_outbound(),
        droplet_ids: vec![8043964],
        tags: vec!["home".to_string()],
        created_at: None,
    }
}

/// Resolver over two scripted sources
pub fn resolver(ipv4: &ScriptedIpSource, ipv6: &ScriptedIpSource) -> AddressResolver {
    AddressResolver::new(Box::new(ipv4.clone()), Box::new(ipv6.clone()))
        .expect("sources match their slots")
}

/// Engine wired to test doubles
pub fn engine(
    ipv4: &ScriptedIpSource,
    ipv6: &ScriptedIpSource,
    provider: &MockFirewallProvider,
    state_store: Box<dyn StateStore>,
    firewall: FirewallRef,
) -> SyncEngine {
    SyncEngine::new(
        resolver(ipv4, ipv6),
        Box::new(provider.clone()),
        state_store,
        firewall,
    )
}
