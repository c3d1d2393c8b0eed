//! Contract Test: Address Reconciliation End to End
//!
//! Constraints verified:
//! - Unchanged addresses make no remote call at all
//! - Stale addresses are swapped in touched rules only
//! - Rules are normalized before they are written back
//! - A first run changes no rule but records the addresses
//!
//! If this test fails, the firewall is being rewritten incorrectly.

mod common;

use common::*;
use fwsync_core::model::Protocol;
use fwsync_core::traits::{IpFamily, StateStore};
use fwsync_core::{FirewallRef, MemoryStateStore, RunReport};

#[tokio::test]
async fn changed_ipv4_is_swapped_in_matching_rule() {
    let ipv4 = ScriptedIpSource::answering(IpFamily::V4, "1.1.1.2");
    let ipv6 = ScriptedIpSource::answering(IpFamily::V6, "2001:db8::1");
    let provider = MockFirewallProvider::new(vec![firewall(
        "fw-1",
        "home",
        vec![
            tcp_rule("22", &["1.1.1.1", "9.9.9.9"]),
            tcp_rule("443", &["10.0.0.0/8"]),
        ],
    )]);
    let store = MemoryStateStore::with_addresses(addresses(&["1.1.1.1", "2001:db8::1"]));

    let report = engine(
        &ipv4,
        &ipv6,
        &provider,
        Box::new(store.clone()),
        FirewallRef::Id("fw-1".into()),
    )
    .run()
    .await
    .expect("run succeeds");

    let stored = provider.firewall("fw-1").unwrap();
    assert_eq!(
        stored.inbound_rules[0].sources.addresses,
        vec!["9.9.9.9", "1.1.1.2", "2001:db8::1"]
    );
    assert_eq!(stored.inbound_rules[1].sources.addresses, vec!["10.0.0.0/8"]);

    assert_eq!(
        store.load().await.unwrap(),
        addresses(&["1.1.1.2", "2001:db8::1"])
    );
    assert!(matches!(
        report,
        RunReport::Updated { touched_rules: 1, dry_run: false, .. }
    ));
}

#[tokio::test]
async fn unchanged_addresses_make_no_remote_call() {
    let ipv4 = ScriptedIpSource::answering(IpFamily::V4, "1.1.1.1");
    let ipv6 = ScriptedIpSource::answering(IpFamily::V6, "2001:db8::1");
    let provider = MockFirewallProvider::new(vec![firewall(
        "fw-1",
        "home",
        vec![tcp_rule("22", &["1.1.1.1"])],
    )]);
    let store = MemoryStateStore::with_addresses(addresses(&["1.1.1.1", "2001:db8::1"]));

    let report = engine(
        &ipv4,
        &ipv6,
        &provider,
        Box::new(store),
        FirewallRef::Name("home".into()),
    )
    .run()
    .await
    .expect("run succeeds");

    assert!(matches!(report, RunReport::Unchanged { .. }));
    assert_eq!(
        provider.remote_call_count(),
        0,
        "no list/get/update expected when addresses are unchanged"
    );
    assert_eq!(
        provider.firewall("fw-1").unwrap().inbound_rules[0].sources.addresses,
        vec!["1.1.1.1"]
    );
}

#[tokio::test]
async fn reordered_addresses_count_as_a_change() {
    let ipv4 = ScriptedIpSource::answering(IpFamily::V4, "1.1.1.1");
    let ipv6 = ScriptedIpSource::answering(IpFamily::V6, "2001:db8::1");
    let provider = MockFirewallProvider::new(vec![firewall(
        "fw-1",
        "home",
        vec![tcp_rule("22", &["2001:db8::1", "1.1.1.1"])],
    )]);
    let store = MemoryStateStore::with_addresses(addresses(&["2001:db8::1", "1.1.1.1"]));

    engine(
        &ipv4,
        &ipv6,
        &provider,
        Box::new(store),
        FirewallRef::Id("fw-1".into()),
    )
    .run()
    .await
    .expect("run succeeds");

    assert_eq!(provider.updates().len(), 1);
    assert_eq!(
        provider.firewall("fw-1").unwrap().inbound_rules[0].sources.addresses,
        vec!["1.1.1.1", "2001:db8::1"]
    );
}

#[tokio::test]
async fn written_rules_are_normalized() {
    let ipv4 = ScriptedIpSource::answering(IpFamily::V4, "1.1.1.2");
    let ipv6 = ScriptedIpSource::failing(IpFamily::V6);
    let provider = MockFirewallProvider::new(vec![firewall(
        "fw-1",
        "home",
        vec![icmp_rule(Some(""), &["1.1.1.1"]), tcp_rule("0", &["8.8.8.8"])],
    )]);
    let store = MemoryStateStore::with_addresses(addresses(&["1.1.1.1"]));

    engine(
        &ipv4,
        &ipv6,
        &provider,
        Box::new(store),
        FirewallRef::Id("fw-1".into()),
    )
    .run()
    .await
    .expect("run succeeds");

    let (_, request) = provider.updates().pop().expect("one update");

    let icmp = &request.inbound_rules[0];
    assert_eq!(icmp.protocol, Protocol::Icmp);
    assert_eq!(icmp.port_range, None);
    assert_eq!(icmp.sources.addresses, vec!["1.1.1.2"]);

    let tcp = &request.inbound_rules[1];
    assert_eq!(tcp.port_range.as_deref(), Some("all"));
    assert_eq!(tcp.sources.addresses, vec!["8.8.8.8"]);

    // Outbound rules only get port normalization
    assert_eq!(request.outbound_rules[0].port_range.as_deref(), Some("all"));
    assert_eq!(request.outbound_rules[1].port_range, None);
    assert_eq!(
        request.outbound_rules[0].destinations.addresses,
        vec!["0.0.0.0/0", "::/0"]
    );

    let json = serde_json::to_value(&request).unwrap();
    assert!(json["inbound_rules"][0].get("ports").is_none());
}

#[tokio::test]
async fn replacement_carries_name_attachments_and_tags() {
    let ipv4 = ScriptedIpSource::answering(IpFamily::V4, "1.1.1.2");
    let ipv6 = ScriptedIpSource::failing(IpFamily::V6);
    let provider = MockFirewallProvider::new(vec![firewall(
        "fw-1",
        "home",
        vec![tcp_rule("22", &["1.1.1.1"])],
    )]);
    let store = MemoryStateStore::with_addresses(addresses(&["1.1.1.1"]));

    engine(
        &ipv4,
        &ipv6,
        &provider,
        Box::new(store),
        FirewallRef::Id("fw-1".into()),
    )
    .run()
    .await
    .expect("run succeeds");

    let (id, request) = provider.updates().pop().expect("one update");
    assert_eq!(id, "fw-1");
    assert_eq!(request.name, "home");
    assert_eq!(request.droplet_ids, vec![8043964]);
    assert_eq!(request.tags, vec!["home"]);
    assert_eq!(request.outbound_rules.len(), 2);
}

#[tokio::test]
async fn first_run_touches_no_rule_but_saves_addresses() {
    let ipv4 = ScriptedIpSource::answering(IpFamily::V4, "1.1.1.1");
    let ipv6 = ScriptedIpSource::answering(IpFamily::V6, "2001:db8::1");
    let rules = vec![tcp_rule("22", &["1.1.1.1"]), tcp_rule("80", &["0.0.0.0/0"])];
    let provider = MockFirewallProvider::new(vec![firewall("fw-1", "home", rules.clone())]);
    let store = MemoryStateStore::new();

    let report = engine(
        &ipv4,
        &ipv6,
        &provider,
        Box::new(store.clone()),
        FirewallRef::Id("fw-1".into()),
    )
    .run()
    .await
    .expect("run succeeds");

    assert!(matches!(report, RunReport::Updated { touched_rules: 0, .. }));
    assert_eq!(provider.firewall("fw-1").unwrap().inbound_rules, rules);
    assert_eq!(
        store.load().await.unwrap(),
        addresses(&["1.1.1.1", "2001:db8::1"])
    );
}

#[tokio::test]
async fn second_run_after_update_is_a_no_op() {
    let ipv4 = ScriptedIpSource::answering(IpFamily::V4, "1.1.1.2");
    let ipv6 = ScriptedIpSource::failing(IpFamily::V6);
    let provider = MockFirewallProvider::new(vec![firewall(
        "fw-1",
        "home",
        vec![tcp_rule("22", &["1.1.1.1"])],
    )]);
    let store = MemoryStateStore::with_addresses(addresses(&["1.1.1.1"]));

    for _ in 0..2 {
        engine(
            &ipv4,
            &ipv6,
            &provider,
            Box::new(store.clone()),
            FirewallRef::Id("fw-1".into()),
        )
        .run()
        .await
        .expect("run succeeds");
    }

    assert_eq!(provider.updates().len(), 1, "second run must not update");
}
