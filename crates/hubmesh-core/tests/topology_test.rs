#![allow(clippy::unwrap_used)]
// Integration tests for `TopologyManager` over a file-backed store.

use std::net::Ipv4Addr;
use std::sync::Arc;

use pretty_assertions::assert_eq;
use tempfile::TempDir;

use hubmesh_core::testing::{FailingKeyGenerator, ScriptedValidator, SequentialKeyGenerator};
use hubmesh_core::{
    AddressPool, CoreError, CreateHubRequest, CreateMemberRequest, MemberKind, Store, StoreConfig,
    TopologyConfig, TopologyManager, UpdateHubRequest, UpdateMemberRequest,
};

// ── Helpers ─────────────────────────────────────────────────────────

struct Fixture {
    _dir: TempDir,
    config: StoreConfig,
    store: Arc<Store>,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let config = StoreConfig::new(dir.path().join("hubmesh.redb"));
        let store = Arc::new(Store::open(&config).unwrap());
        Self {
            _dir: dir,
            config,
            store,
        }
    }

    fn manager(&self) -> TopologyManager {
        TopologyManager::new(Arc::clone(&self.store), TopologyConfig::default())
            .with_key_generator(SequentialKeyGenerator::new())
    }
}

fn hub(name: &str) -> CreateHubRequest {
    CreateHubRequest {
        name: name.into(),
        public_address: "203.0.113.1".into(),
        port: None,
    }
}

fn ip(s: &str) -> Ipv4Addr {
    s.parse().unwrap()
}

// ── Address allocation ──────────────────────────────────────────────

#[test]
fn test_hub_and_member_addresses_on_slash_24() {
    let fx = Fixture::new();
    let m = fx.manager();
    m.create_network("lab", "10.0.0.0/24").unwrap();

    let h = m.create_hub("lab", hub("gw")).unwrap();
    let a = m
        .create_member("lab", CreateMemberRequest::peer("a", "198.51.100.2"))
        .unwrap();
    let b = m
        .create_member("lab", CreateMemberRequest::peer("b", "198.51.100.3"))
        .unwrap();
    assert_eq!(h.address, ip("10.0.0.1"));
    assert_eq!(a.address, ip("10.0.0.2"));
    assert_eq!(b.address, ip("10.0.0.3"));

    m.delete_member("lab", "a").unwrap();
    let c = m.create_member("lab", CreateMemberRequest::route("c")).unwrap();
    assert_eq!(c.address, ip("10.0.0.2"));
}

#[test]
fn test_hub_address_is_fixed_even_after_members() {
    let fx = Fixture::new();
    let m = fx.manager();
    m.create_network("lab", "10.0.0.0/24").unwrap();
    m.create_member("lab", CreateMemberRequest::route("early"))
        .unwrap();

    let h = m.create_hub("lab", hub("gw")).unwrap();
    assert_eq!(h.address, ip("10.0.0.1"));
    assert!(!m.pool("lab").unwrap().allocated().any(|a| a == h.address));
}

#[test]
fn test_released_addresses_are_reused_fifo() {
    let fx = Fixture::new();
    let m = fx.manager();
    m.create_network("lab", "10.0.0.0/24").unwrap();
    for name in ["a", "b", "c", "d"] {
        m.create_member("lab", CreateMemberRequest::route(name))
            .unwrap();
    }
    m.delete_member("lab", "c").unwrap();
    m.delete_member("lab", "a").unwrap();

    let e = m.create_member("lab", CreateMemberRequest::route("e")).unwrap();
    let f = m.create_member("lab", CreateMemberRequest::route("f")).unwrap();
    let g = m.create_member("lab", CreateMemberRequest::route("g")).unwrap();
    assert_eq!(e.address, ip("10.0.0.4"));
    assert_eq!(f.address, ip("10.0.0.2"));
    assert_eq!(g.address, ip("10.0.0.6"));
}

#[test]
fn test_exhaustion_rolls_back_completely() {
    let fx = Fixture::new();
    let m = fx.manager();
    // 8 addresses: network, broadcast, hub, 5 members.
    m.create_network("tiny", "10.9.0.0/29").unwrap();
    for i in 0..5 {
        m.create_member("tiny", CreateMemberRequest::route(format!("m{i}")))
            .unwrap();
    }

    let err = m
        .create_member("tiny", CreateMemberRequest::route("overflow"))
        .unwrap_err();
    assert!(matches!(err, CoreError::PoolExhausted { .. }), "{err:?}");
    assert!(m.member("tiny", "overflow").unwrap_err().is_not_found());
    assert_eq!(m.list_members("tiny").unwrap().len(), 5);
}

#[test]
fn test_key_failure_consumes_no_address() {
    let fx = Fixture::new();
    let m = TopologyManager::new(Arc::clone(&fx.store), TopologyConfig::default())
        .with_key_generator(FailingKeyGenerator::after(1));
    m.create_network("lab", "10.0.0.0/24").unwrap();
    m.create_member("lab", CreateMemberRequest::route("first"))
        .unwrap();

    let err = m
        .create_member("lab", CreateMemberRequest::route("second"))
        .unwrap_err();
    assert!(matches!(err, CoreError::KeyGeneration { .. }), "{err:?}");
    assert!(m.member("lab", "second").unwrap_err().is_not_found());

    let fresh = fx.manager();
    let third = fresh
        .create_member("lab", CreateMemberRequest::route("third"))
        .unwrap();
    assert_eq!(third.address, ip("10.0.0.3"));
}

#[test]
fn test_duplicate_member_keeps_address_free() {
    let fx = Fixture::new();
    let m = fx.manager();
    m.create_network("lab", "10.0.0.0/24").unwrap();
    m.create_member("lab", CreateMemberRequest::route("a")).unwrap();

    let err = m
        .create_member("lab", CreateMemberRequest::route("a"))
        .unwrap_err();
    assert!(matches!(err, CoreError::DuplicateName { .. }), "{err:?}");

    let b = m.create_member("lab", CreateMemberRequest::route("b")).unwrap();
    assert_eq!(b.address, ip("10.0.0.3"));
}

#[test]
fn test_delete_member_tolerates_unknown_address() {
    let fx = Fixture::new();
    let network = {
        let m = fx.manager();
        let network = m.create_network("lab", "10.0.0.0/24").unwrap();
        let a = m.create_member("lab", CreateMemberRequest::route("a")).unwrap();
        assert_eq!(a.address, ip("10.0.0.2"));
        network
    };

    // Persisted pool state that has no claim on `a`.
    let fresh = AddressPool::new("10.0.0.0/24").unwrap().export();
    fx.store.save_pool_snapshot(&network.id, &fresh).unwrap();

    let m = fx.manager();
    let deleted = m.delete_member("lab", "a").unwrap();
    assert_eq!(deleted.address, ip("10.0.0.2"));
    assert!(m.list_members("lab").unwrap().is_empty());
    assert!(!m.pool("lab").unwrap().is_allocated(ip("10.0.0.2")));

    let b = m.create_member("lab", CreateMemberRequest::route("b")).unwrap();
    assert_eq!(b.address, ip("10.0.0.2"));
}

// ── Restart behavior ────────────────────────────────────────────────

#[test]
fn test_state_survives_reopen() {
    let fx = Fixture::new();
    {
        let m = fx.manager();
        m.create_network("lab", "10.0.0.0/24").unwrap();
        m.create_hub("lab", hub("gw")).unwrap();
        for name in ["a", "b", "c"] {
            m.create_member("lab", CreateMemberRequest::route(name))
                .unwrap();
        }
        m.delete_member("lab", "b").unwrap();
    }
    let Fixture { _dir, config, store } = fx;
    drop(store);

    let store = Arc::new(Store::open(&config).unwrap());
    let m = TopologyManager::new(store, TopologyConfig::default())
        .with_key_generator(SequentialKeyGenerator::new());
    let d = m.create_member("lab", CreateMemberRequest::route("d")).unwrap();
    let e = m.create_member("lab", CreateMemberRequest::route("e")).unwrap();
    assert_eq!(d.address, ip("10.0.0.3"));
    assert_eq!(e.address, ip("10.0.0.5"));
    assert_eq!(m.hub("lab").unwrap().name, "gw");
}

#[test]
fn test_store_is_exclusive_while_open() {
    let fx = Fixture::new();
    let quick = fx
        .config
        .clone()
        .with_lock_timeout(std::time::Duration::from_millis(20));
    let err = Store::open(&quick).unwrap_err();
    assert!(
        matches!(err, CoreError::StorageUnavailable { .. }),
        "{err:?}"
    );
}

// ── Scoping and cascade ─────────────────────────────────────────────

#[test]
fn test_names_are_scoped_per_network() {
    let fx = Fixture::new();
    let m = fx.manager();
    m.create_network("one", "10.1.0.0/24").unwrap();
    m.create_network("two", "10.2.0.0/24").unwrap();
    for net in ["one", "two"] {
        m.create_hub(net, hub("gw")).unwrap();
        m.create_member(net, CreateMemberRequest::route("edge"))
            .unwrap();
    }

    m.delete_network("one").unwrap();
    assert_eq!(m.hub("two").unwrap().name, "gw");
    assert_eq!(m.member("two", "edge").unwrap().address, ip("10.2.0.2"));
}

#[test]
fn test_delete_network_cascades_and_recreate_starts_over() {
    let fx = Fixture::new();
    let m = fx.manager();
    let old = m.create_network("lab", "10.0.0.0/24").unwrap();
    m.create_hub("lab", hub("gw")).unwrap();
    for name in ["a", "b"] {
        m.create_member("lab", CreateMemberRequest::route(name))
            .unwrap();
    }

    m.delete_network("lab").unwrap();
    assert!(m.network("lab").unwrap_err().is_not_found());
    assert!(fx.store.list_members(&old.id).unwrap().is_empty());
    assert!(fx.store.hub_by_network(&old.id).unwrap_err().is_not_found());
    assert!(fx.store.pool_snapshot(&old.id).unwrap_err().is_not_found());

    m.create_network("lab", "10.0.0.0/24").unwrap();
    let a = m.create_member("lab", CreateMemberRequest::route("a")).unwrap();
    assert_eq!(a.address, ip("10.0.0.2"));
    assert!(m.hub("lab").unwrap_err().is_not_found());
}

#[test]
fn test_delete_hub_leaves_members() {
    let fx = Fixture::new();
    let m = fx.manager();
    m.create_network("lab", "10.0.0.0/24").unwrap();
    m.create_hub("lab", hub("gw")).unwrap();
    m.create_member("lab", CreateMemberRequest::route("a")).unwrap();

    m.delete_hub("lab").unwrap();
    assert_eq!(m.list_members("lab").unwrap().len(), 1);
    assert!(m.pool("lab").unwrap().is_allocated(ip("10.0.0.2")));

    let again = m.create_hub("lab", hub("gw2")).unwrap();
    assert_eq!(again.address, ip("10.0.0.1"));
}

// ── Validation ──────────────────────────────────────────────────────

#[test]
fn test_network_validation() {
    let fx = Fixture::new();
    let m = fx.manager();
    for (name, cidr) in [
        ("1bad", "10.0.0.0/24"),
        ("bad-name", "10.0.0.0/24"),
        ("ok", "10.0.0.0"),
        ("ok", "fd00::/64"),
        ("ok", "10.0.0.0/31"),
        ("ok", "10.0.0.0/32"),
    ] {
        let err = m.create_network(name, cidr).unwrap_err();
        assert!(
            matches!(err, CoreError::Validation { .. }),
            "{name} {cidr}: {err:?}"
        );
    }
    assert!(m.list_networks().unwrap().is_empty());

    let small = m.create_network("small", "10.0.0.0/30").unwrap();
    assert_eq!(small.cidr.to_string(), "10.0.0.0/30");
    let canonical = m.create_network("canon", "10.5.0.77/24").unwrap();
    assert_eq!(canonical.cidr.to_string(), "10.5.0.0/24");

    let err = m.create_network("small", "10.7.0.0/24").unwrap_err();
    assert!(matches!(err, CoreError::DuplicateName { .. }), "{err:?}");
}

#[test]
fn test_peer_requires_public_address_route_does_not() {
    let fx = Fixture::new();
    let m = fx.manager();
    m.create_network("lab", "10.0.0.0/24").unwrap();

    let err = m
        .create_member("lab", CreateMemberRequest::peer("p", ""))
        .unwrap_err();
    assert!(matches!(err, CoreError::Validation { .. }), "{err:?}");
    let err = m
        .create_member("lab", CreateMemberRequest::peer("p", "not valid"))
        .unwrap_err();
    assert!(matches!(err, CoreError::Validation { .. }), "{err:?}");

    let r = m.create_member("lab", CreateMemberRequest::route("r")).unwrap();
    assert_eq!(r.kind, MemberKind::Route);
    assert!(!r.has_public_address());

    let default_kind = m
        .create_member(
            "lab",
            CreateMemberRequest {
                name: "d".into(),
                public_address: "d.example.com".into(),
                port: None,
                kind: None,
            },
        )
        .unwrap();
    assert_eq!(default_kind.kind, MemberKind::Peer);
    assert_eq!(default_kind.port, 51820);
}

#[test]
fn test_update_member_checks_target_kind() {
    let fx = Fixture::new();
    let m = fx.manager();
    m.create_network("lab", "10.0.0.0/24").unwrap();
    let r = m.create_member("lab", CreateMemberRequest::route("r")).unwrap();

    let err = m
        .update_member(
            "lab",
            "r",
            UpdateMemberRequest {
                kind: Some(MemberKind::Peer),
                ..Default::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, CoreError::Validation { .. }), "{err:?}");

    let promoted = m
        .update_member(
            "lab",
            "r",
            UpdateMemberRequest {
                kind: Some(MemberKind::Peer),
                public_address: Some("198.51.100.9".into()),
                port: Some(40000),
            },
        )
        .unwrap();
    assert_eq!(promoted.kind, MemberKind::Peer);
    assert_eq!(promoted.port, 40000);
    assert_eq!(promoted.address, r.address);

    let err = m
        .update_member(
            "lab",
            "r",
            UpdateMemberRequest {
                public_address: Some(String::new()),
                ..Default::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, CoreError::Validation { .. }), "{err:?}");

    let demoted = m
        .update_member(
            "lab",
            "r",
            UpdateMemberRequest {
                kind: Some(MemberKind::Route),
                public_address: Some(String::new()),
                port: None,
            },
        )
        .unwrap();
    assert_eq!(demoted.kind, MemberKind::Route);
    assert_eq!(demoted.port, 40000);
}

#[test]
fn test_hub_rules() {
    let fx = Fixture::new();
    let m = fx.manager();
    assert!(m.create_hub("ghost", hub("gw")).unwrap_err().is_not_found());

    m.create_network("lab", "10.0.0.0/24").unwrap();
    let err = m
        .create_hub(
            "lab",
            CreateHubRequest {
                name: "gw".into(),
                public_address: "no-dot".into(),
                port: None,
            },
        )
        .unwrap_err();
    assert!(matches!(err, CoreError::Validation { .. }), "{err:?}");
    let err = m
        .create_hub(
            "lab",
            CreateHubRequest {
                port: Some(0),
                ..hub("gw")
            },
        )
        .unwrap_err();
    assert!(matches!(err, CoreError::Validation { .. }), "{err:?}");

    let h = m.create_hub("lab", hub("gw")).unwrap();
    assert_eq!(h.port, 51820);
    let err = m.create_hub("lab", hub("gw2")).unwrap_err();
    assert!(matches!(err, CoreError::AlreadyExists { .. }), "{err:?}");

    let updated = m
        .update_hub(
            "lab",
            UpdateHubRequest {
                public_address: Some("localhost".into()),
                port: Some(51821),
            },
        )
        .unwrap();
    assert_eq!(updated.public_address, "localhost");
    assert_eq!(updated.port, 51821);
    assert_eq!(updated.address, h.address);
    assert_eq!(updated.keys, h.keys);
    assert_eq!(m.hub_by_name("lab", "gw").unwrap(), updated);
}

#[test]
fn test_validator_is_pluggable() {
    let fx = Fixture::new();
    let m = TopologyManager::new(Arc::clone(&fx.store), TopologyConfig::default())
        .with_validator(ScriptedValidator::accept_all().reject("203.0.113.66"))
        .with_key_generator(SequentialKeyGenerator::new());
    m.create_network("lab", "10.0.0.0/24").unwrap();

    let err = m
        .create_hub(
            "lab",
            CreateHubRequest {
                public_address: "203.0.113.66".into(),
                ..hub("gw")
            },
        )
        .unwrap_err();
    assert!(matches!(err, CoreError::Validation { .. }), "{err:?}");
}

#[test]
fn test_configured_default_port() {
    let fx = Fixture::new();
    let m = TopologyManager::new(
        Arc::clone(&fx.store),
        TopologyConfig {
            default_listen_port: 41000,
        },
    )
    .with_key_generator(SequentialKeyGenerator::new());
    m.create_network("lab", "10.0.0.0/24").unwrap();
    assert_eq!(m.create_hub("lab", hub("gw")).unwrap().port, 41000);
}

// ── Concurrency ─────────────────────────────────────────────────────

#[test]
fn test_concurrent_creates_get_distinct_addresses() {
    let fx = Fixture::new();
    let m = Arc::new(fx.manager());
    m.create_network("lab", "10.0.0.0/24").unwrap();

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let m = Arc::clone(&m);
            std::thread::spawn(move || {
                (0..5)
                    .map(|i| {
                        m.create_member("lab", CreateMemberRequest::route(format!("t{t}m{i}")))
                            .unwrap()
                            .address
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut addresses: Vec<Ipv4Addr> = handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect();
    addresses.sort();
    addresses.dedup();
    assert_eq!(addresses.len(), 40);
    assert_eq!(m.pool("lab").unwrap().allocated().count(), 40);
}
