#![allow(clippy::unwrap_used)]
// Integration tests for `ConfigGenerator`: visibility rules, hashing and
// version history.

use std::sync::{Arc, Barrier};
use std::thread;

use pretty_assertions::assert_eq;

use hubmesh_core::testing::SequentialKeyGenerator;
use hubmesh_core::{
    ConfigGenerator, CreateHubRequest, CreateMemberRequest, MemberKind, SaveOutcome, Store,
    TopologyConfig, TopologyManager, UpdateMemberRequest,
};

// ── Helpers ─────────────────────────────────────────────────────────

fn setup() -> (TopologyManager, ConfigGenerator) {
    let store = Arc::new(Store::open_in_memory().unwrap());
    let manager = TopologyManager::new(Arc::clone(&store), TopologyConfig::default())
        .with_key_generator(SequentialKeyGenerator::new());
    (manager, ConfigGenerator::new(store))
}

/// Hub H, peers P1 and P2, routes R1 and R2. Keys are issued in that order,
/// so H holds `public-1` and R2 holds `public-5`.
fn example_topology(manager: &TopologyManager) {
    manager.create_network("demo", "10.0.0.0/24").unwrap();
    manager
        .create_hub(
            "demo",
            CreateHubRequest {
                name: "H".into(),
                public_address: "203.0.113.1".into(),
                port: None,
            },
        )
        .unwrap();
    manager
        .create_member("demo", CreateMemberRequest::peer("P1", "198.51.100.1"))
        .unwrap();
    manager
        .create_member("demo", CreateMemberRequest::peer("P2", "198.51.100.2"))
        .unwrap();
    manager
        .create_member("demo", CreateMemberRequest::route("R1"))
        .unwrap();
    manager
        .create_member("demo", CreateMemberRequest::route("R2"))
        .unwrap();
}

const H: &str = "PublicKey = public-1\n";
const P1: &str = "PublicKey = public-2\n";
const P2: &str = "PublicKey = public-3\n";
const R1: &str = "PublicKey = public-4\n";
const R2: &str = "PublicKey = public-5\n";

// ── Visibility rules ────────────────────────────────────────────────

#[test]
fn test_example_topology_visibility() {
    let (manager, generator) = setup();
    example_topology(&manager);
    let generated = generator.generate("demo").unwrap();
    let docs = &generated.documents;

    assert_eq!(
        docs.keys().map(String::as_str).collect::<Vec<_>>(),
        vec!["H", "P1", "P2", "R1", "R2"]
    );

    let p1 = &docs["P1"];
    assert!(p1.contains(H) && p1.contains(P2));
    assert!(!p1.contains(R1) && !p1.contains(R2));

    let r1 = &docs["R1"];
    assert!(r1.contains(H) && r1.contains(P1) && r1.contains(P2));
    assert!(!r1.contains(R2));

    let hub = &docs["H"];
    for key in [P1, P2, R1, R2] {
        assert!(hub.contains(key), "hub is missing {key}");
    }
    assert!(hub.contains("Endpoint = 198.51.100.1:51820"));
    assert!(hub.contains("Endpoint = 198.51.100.2:51820"));
    assert_eq!(hub.matches("Endpoint = ").count(), 2);
    assert_eq!(hub.matches("[Peer]").count(), 4);
}

#[test]
fn test_member_documents_point_at_the_hub_endpoint() {
    let (manager, generator) = setup();
    example_topology(&manager);
    let docs = generator.generate("demo").unwrap().documents;

    for name in ["P1", "P2", "R1", "R2"] {
        let doc = &docs[name];
        assert!(doc.contains("AllowedIPs = 10.0.0.0/24\nEndpoint = 203.0.113.1:51820\n"));
        assert!(!doc.contains("PostUp"));
    }
}

#[test]
fn test_generate_without_hub_is_not_found() {
    let (manager, generator) = setup();
    manager.create_network("empty", "10.0.0.0/24").unwrap();
    assert!(generator.generate("empty").unwrap_err().is_not_found());
    assert!(generator.generate("ghost").unwrap_err().is_not_found());
}

// ── Hashing ─────────────────────────────────────────────────────────

#[test]
fn test_hash_is_stable_without_changes() {
    let (manager, generator) = setup();
    example_topology(&manager);

    let first = generator.generate("demo").unwrap();
    let second = generator.generate("demo").unwrap();
    assert_eq!(first.documents, second.documents);
    assert_eq!(first.content_hash, second.content_hash);
}

#[test]
fn test_hash_tracks_every_kind_of_change() {
    let (manager, generator) = setup();
    example_topology(&manager);
    let mut seen = vec![generator.generate("demo").unwrap().content_hash];
    let mut assert_new_hash = |label: &str| {
        let hash = generator.generate("demo").unwrap().content_hash;
        assert!(!seen.contains(&hash), "hash unchanged after {label}");
        seen.push(hash);
    };

    manager
        .update_member(
            "demo",
            "R1",
            UpdateMemberRequest {
                kind: Some(MemberKind::Peer),
                public_address: Some("198.51.100.9".into()),
                port: None,
            },
        )
        .unwrap();
    assert_new_hash("kind change");

    manager
        .update_member(
            "demo",
            "P2",
            UpdateMemberRequest {
                port: Some(40000),
                ..Default::default()
            },
        )
        .unwrap();
    assert_new_hash("port change");

    manager.delete_member("demo", "R2").unwrap();
    assert_new_hash("membership change");

    // Recreated under the same name: same address, fresh keys.
    manager
        .create_member("demo", CreateMemberRequest::route("R2"))
        .unwrap();
    assert_new_hash("key change");
}

// ── Versioning ──────────────────────────────────────────────────────

#[test]
fn test_save_version_appends_only_on_change() {
    let (manager, generator) = setup();
    example_topology(&manager);

    let first = generator.save_version("demo").unwrap();
    assert!(first.is_created());
    assert_eq!(first.snapshot().version, 1);

    let again = generator.save_version("demo").unwrap();
    assert!(matches!(again, SaveOutcome::Unchanged(ref s) if s.version == 1));

    manager.delete_member("demo", "P2").unwrap();
    let second = generator.save_version("demo").unwrap();
    assert!(second.is_created());
    assert_eq!(second.snapshot().version, 2);

    let history = generator.history("demo").unwrap();
    assert_eq!(
        history.iter().map(|s| s.version).collect::<Vec<_>>(),
        vec![1, 2]
    );
    assert_eq!(
        generator.config_hash_by_version("demo", 1).unwrap(),
        first.snapshot().content_hash
    );
    assert_eq!(generator.latest("demo").unwrap().version, 2);
    assert!(!generator.version("demo", 2).unwrap().documents.contains_key("P2"));
    assert!(generator.version("demo", 3).unwrap_err().is_not_found());
}

#[test]
fn test_history_of_unknown_network_is_not_found() {
    let (manager, generator) = setup();
    assert!(generator.history("ghost").unwrap_err().is_not_found());

    example_topology(&manager);
    assert!(generator.history("demo").unwrap().is_empty());
    assert!(generator.latest("demo").unwrap_err().is_not_found());
}

#[test]
fn test_history_is_dropped_with_the_network() {
    let (manager, generator) = setup();
    example_topology(&manager);
    generator.save_version("demo").unwrap();
    manager.delete_network("demo").unwrap();

    example_topology(&manager);
    let saved = generator.save_version("demo").unwrap();
    assert_eq!(saved.snapshot().version, 1);
}

#[test]
fn test_concurrent_saves_of_one_state_append_once() {
    const THREADS: usize = 8;

    let (manager, generator) = setup();
    example_topology(&manager);

    for round in 1..=20u32 {
        let barrier = Barrier::new(THREADS);
        let outcomes: Vec<SaveOutcome> = thread::scope(|s| {
            let handles: Vec<_> = (0..THREADS)
                .map(|_| {
                    s.spawn(|| {
                        barrier.wait();
                        generator.save_version("demo").unwrap()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let created = outcomes.iter().filter(|o| o.is_created()).count();
        assert_eq!(created, 1, "round {round}: {created} versions appended");
        assert!(outcomes.iter().all(|o| o.snapshot().version == round));
        assert_eq!(generator.history("demo").unwrap().len(), round as usize);

        // Change the state so the next round has something to save.
        manager
            .update_member(
                "demo",
                "P1",
                UpdateMemberRequest {
                    port: Some(40000 + u16::try_from(round).unwrap()),
                    ..Default::default()
                },
            )
            .unwrap();
    }
}
