//! Integration tests for orbit-store
//!
//! These tests verify upsert-merge semantics, adjacency queries, and the
//! persisted snapshot tables against a real SQLite database.

use orbit_domain::traits::GraphStore;
use orbit_domain::{
    Edge, NodeId, NodeRef, NodeType, Relation, Ring, RingAssignment,
};
use orbit_store::{SqliteGraphStore, StoreError};

fn user_ref(ext: &str) -> NodeRef {
    NodeRef::new(NodeType::User, "github", ext)
}

fn issue_ref(ext: &str) -> NodeRef {
    NodeRef::new(NodeType::Issue, "github", ext)
}

#[test]
fn test_store_initialization() {
    let store = SqliteGraphStore::open(":memory:");
    assert!(store.is_ok(), "Store should initialize successfully");
}

#[test]
fn test_store_persists_to_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("orbit.db");

    {
        let store = SqliteGraphStore::open(&path).unwrap();
        store.upsert_node(&user_ref("alice"), 1000).unwrap();
    }

    let reopened = SqliteGraphStore::open(&path).unwrap();
    let node = reopened
        .get_node(&NodeId::compose(NodeType::User, "github", "alice"))
        .unwrap();
    assert!(node.is_some(), "Node should survive reopen");
}

#[test]
fn test_upsert_node_is_idempotent() {
    let store = SqliteGraphStore::open(":memory:").unwrap();

    let first = store.upsert_node(&user_ref("alice"), 1000).unwrap();
    let second = store.upsert_node(&user_ref("alice"), 2000).unwrap();
    assert_eq!(first, second, "Same (provider, external_id) yields same id");

    let node = store.get_node(&first).unwrap().unwrap();
    assert_eq!(node.first_seen_at, 1000);
    assert_eq!(node.last_seen_at, 2000, "Refresh bumps last_seen_at");
    assert_eq!(store.node_ids().unwrap().len(), 1);
}

#[test]
fn test_node_timestamps_never_move_backwards() {
    let store = SqliteGraphStore::open(":memory:").unwrap();

    store.upsert_node(&user_ref("alice"), 2000).unwrap();
    let id = store.upsert_node(&user_ref("alice"), 1000).unwrap();

    let node = store.get_node(&id).unwrap().unwrap();
    assert_eq!(node.last_seen_at, 2000, "Out-of-order observation must not rewind");
}

#[test]
fn test_upsert_node_fills_missing_display_name() {
    let store = SqliteGraphStore::open(":memory:").unwrap();

    let id = store.upsert_node(&user_ref("alice"), 1000).unwrap();
    store
        .upsert_node(&user_ref("alice").with_display_name("Alice"), 2000)
        .unwrap();

    let node = store.get_node(&id).unwrap().unwrap();
    assert_eq!(node.display_name.as_deref(), Some("Alice"));
}

#[test]
fn test_upsert_node_persists_metadata_bag() {
    let store = SqliteGraphStore::open(":memory:").unwrap();

    let mut bag = std::collections::BTreeMap::new();
    bag.insert("team".to_string(), "platform".to_string());
    let id = store
        .upsert_node(&user_ref("alice").with_metadata(bag.clone()), 1000)
        .unwrap();

    let node = store.get_node(&id).unwrap().unwrap();
    assert_eq!(node.metadata, bag, "Metadata bag survives the upsert");

    // A refresh without metadata keeps the stored bag.
    store.upsert_node(&user_ref("alice"), 2000).unwrap();
    let node = store.get_node(&id).unwrap().unwrap();
    assert_eq!(node.metadata, bag, "Empty incoming bag must not clobber");

    // A refresh with a new non-empty bag replaces it wholesale.
    let mut newer = std::collections::BTreeMap::new();
    newer.insert("tz".to_string(), "UTC".to_string());
    store
        .upsert_node(&user_ref("alice").with_metadata(newer.clone()), 3000)
        .unwrap();
    let node = store.get_node(&id).unwrap().unwrap();
    assert_eq!(node.metadata, newer, "Non-empty bag replaces, no key merge");
}

#[test]
fn test_malformed_reference_fails_fast() {
    let store = SqliteGraphStore::open(":memory:").unwrap();

    let result = store.upsert_node(&user_ref(""), 1000);
    assert!(matches!(result, Err(StoreError::InvalidReference(_))));
    assert!(store.node_ids().unwrap().is_empty(), "No garbage node created");
}

#[test]
fn test_upsert_edge_never_duplicates() {
    let store = SqliteGraphStore::open(":memory:").unwrap();
    let alice = store.upsert_node(&user_ref("alice"), 1000).unwrap();
    let issue = store.upsert_node(&issue_ref("42"), 1000).unwrap();

    let edge = Edge::new(alice.clone(), issue.clone(), Relation::AuthorOf, "github", 1000);
    let first = store.upsert_edge(&edge).unwrap();

    let refreshed = Edge::new(alice.clone(), issue.clone(), Relation::AuthorOf, "github", 5000);
    let second = store.upsert_edge(&refreshed).unwrap();

    assert_eq!(first, second, "Re-observation updates the existing row");
    assert_eq!(store.edge_count().unwrap(), 1);

    let edges = store.edges_from(&alice).unwrap();
    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0].observed_at, 5000, "observed_at takes the max");
}

#[test]
fn test_edge_refresh_keeps_fresher_fact() {
    let store = SqliteGraphStore::open(":memory:").unwrap();
    let alice = store.upsert_node(&user_ref("alice"), 1000).unwrap();
    let issue = store.upsert_node(&issue_ref("42"), 1000).unwrap();

    store
        .upsert_edge(&Edge::new(alice.clone(), issue.clone(), Relation::AuthorOf, "github", 5000))
        .unwrap();
    // A stale replay of the same fact must not age the edge back down.
    store
        .upsert_edge(&Edge::new(alice.clone(), issue.clone(), Relation::AuthorOf, "github", 1000))
        .unwrap();

    let edges = store.edges_from(&alice).unwrap();
    assert_eq!(edges[0].observed_at, 5000);
}

#[test]
fn test_same_fact_from_different_providers_is_distinct() {
    let store = SqliteGraphStore::open(":memory:").unwrap();
    let alice = store.upsert_node(&user_ref("alice"), 1000).unwrap();
    let issue = store.upsert_node(&issue_ref("42"), 1000).unwrap();

    store
        .upsert_edge(&Edge::new(alice.clone(), issue.clone(), Relation::References, "github", 1000))
        .unwrap();
    store
        .upsert_edge(&Edge::new(alice.clone(), issue.clone(), Relation::References, "linear", 1000))
        .unwrap();

    assert_eq!(store.edge_count().unwrap(), 2);
}

#[test]
fn test_adjacency_both_directions() {
    let store = SqliteGraphStore::open(":memory:").unwrap();
    let alice = store.upsert_node(&user_ref("alice"), 1000).unwrap();
    let bob = store.upsert_node(&user_ref("bob"), 1000).unwrap();
    let issue = store.upsert_node(&issue_ref("42"), 1000).unwrap();

    store
        .upsert_edge(&Edge::new(alice.clone(), issue.clone(), Relation::AuthorOf, "github", 1000))
        .unwrap();
    store
        .upsert_edge(&Edge::new(bob.clone(), issue.clone(), Relation::AssignedTo, "github", 1000))
        .unwrap();

    assert_eq!(store.edges_from(&alice).unwrap().len(), 1);
    assert_eq!(store.edges_from(&issue).unwrap().len(), 0);

    let incoming = store.edges_to(&issue).unwrap();
    assert_eq!(incoming.len(), 2);

    let relations: Vec<Relation> = incoming.iter().map(|e| e.relation).collect();
    assert!(relations.contains(&Relation::AuthorOf));
    assert!(relations.contains(&Relation::AssignedTo));
}

#[test]
fn test_all_relation_variants_roundtrip_through_storage() {
    let store = SqliteGraphStore::open(":memory:").unwrap();
    let alice = store.upsert_node(&user_ref("alice"), 1000).unwrap();
    let issue = store.upsert_node(&issue_ref("42"), 1000).unwrap();

    for relation in Relation::all() {
        store
            .upsert_edge(&Edge::new(alice.clone(), issue.clone(), relation, "github", 1000))
            .unwrap();
    }

    let edges = store.edges_from(&alice).unwrap();
    assert_eq!(edges.len(), Relation::all().len());
    for relation in Relation::all() {
        assert!(edges.iter().any(|e| e.relation == relation));
    }
}

#[test]
fn test_pin_set_and_clear() {
    let store = SqliteGraphStore::open(":memory:").unwrap();
    let alice = store.upsert_node(&user_ref("alice"), 1000).unwrap();

    store.set_pin(&alice, true).unwrap();
    store.set_pin(&alice, true).unwrap(); // idempotent
    assert!(store.pinned_nodes().unwrap().contains(&alice));

    store.set_pin(&alice, false).unwrap();
    assert!(store.pinned_nodes().unwrap().is_empty());
}

#[test]
fn test_assignment_snapshot_replace_and_reload() {
    let store = SqliteGraphStore::open(":memory:").unwrap();
    let anchor = NodeId::compose(NodeType::User, "github", "alice");
    let issue = NodeId::compose(NodeType::Issue, "github", "42");
    let doc = NodeId::compose(NodeType::Document, "notion", "d1");

    let first = vec![
        RingAssignment {
            node: issue.clone(),
            ring: Ring::Ring1,
            distance: 1,
            effective_distance: 1.0,
            path: vec![anchor.clone(), issue.clone()],
            pinned: false,
            computed_at: 1000,
        },
        RingAssignment::unreached(doc.clone(), 1000),
    ];
    store.replace_assignments(&first).unwrap();

    let loaded = store.load_assignments().unwrap();
    assert_eq!(loaded.len(), 2);

    let issue_row = loaded.iter().find(|a| a.node == issue).unwrap();
    assert_eq!(issue_row.ring, Ring::Ring1);
    assert_eq!(issue_row.path, vec![anchor.clone(), issue.clone()]);

    let doc_row = loaded.iter().find(|a| a.node == doc).unwrap();
    assert_eq!(doc_row.ring, Ring::Beyond);
    assert!(doc_row.effective_distance.is_infinite());

    // A replace is wholesale: the previous snapshot leaves no residue.
    let second = vec![RingAssignment::unreached(issue.clone(), 2000)];
    store.replace_assignments(&second).unwrap();

    let reloaded = store.load_assignments().unwrap();
    assert_eq!(reloaded.len(), 1);
    assert_eq!(reloaded[0].node, issue);
    assert_eq!(reloaded[0].computed_at, 2000);
}

#[test]
fn test_graph_view_is_internally_consistent() {
    let store = SqliteGraphStore::open(":memory:").unwrap();
    let alice = store.upsert_node(&user_ref("alice"), 1000).unwrap();
    let bob = store.upsert_node(&user_ref("bob"), 1000).unwrap();
    let issue = store.upsert_node(&issue_ref("42"), 1000).unwrap();

    store
        .upsert_edge(&Edge::new(alice.clone(), issue.clone(), Relation::AuthorOf, "github", 1000))
        .unwrap();
    store
        .upsert_edge(&Edge::new(bob.clone(), issue.clone(), Relation::AssignedTo, "github", 1000))
        .unwrap();
    store.set_pin(&bob, true).unwrap();

    let view = store.graph_view().unwrap();
    assert_eq!(view.nodes, vec![issue.clone(), alice.clone(), bob.clone()]);
    assert_eq!(view.edges.len(), 2);
    assert_eq!(view.edge_count(), 2, "count derives from the edges read");
    assert_eq!(view.pins.len(), 1);
    assert!(view.pins.contains(&bob));
}

#[test]
fn test_graph_view_under_concurrent_writes() {
    use std::sync::Arc;

    let store = Arc::new(SqliteGraphStore::open(":memory:").unwrap());
    let anchor = store.upsert_node(&user_ref("alice"), 1000).unwrap();

    let writer = {
        let store = Arc::clone(&store);
        let anchor = anchor.clone();
        std::thread::spawn(move || {
            for i in 0..50 {
                let peer = store
                    .upsert_node(&user_ref(&format!("peer-{}", i)), 1000)
                    .unwrap();
                store
                    .upsert_edge(&Edge::new(anchor.clone(), peer, Relation::MemberOf, "github", 1000))
                    .unwrap();
            }
        })
    };

    // Each view must be a coherent point in time: every edge endpoint it
    // reports is a node it reports.
    for _ in 0..20 {
        let view = store.graph_view().unwrap();
        for edge in &view.edges {
            assert!(view.nodes.contains(&edge.from));
            assert!(view.nodes.contains(&edge.to));
        }
    }
    writer.join().unwrap();
}

#[test]
fn test_store_is_shareable_across_threads() {
    use std::sync::Arc;

    let store = Arc::new(SqliteGraphStore::open(":memory:").unwrap());
    let mut handles = Vec::new();

    // Concurrent connector tasks writing unrelated keys.
    for t in 0..4 {
        let store = Arc::clone(&store);
        handles.push(std::thread::spawn(move || {
            for i in 0..10 {
                let node = NodeRef::new(NodeType::User, "github", &format!("user-{}-{}", t, i));
                store.upsert_node(&node, 1000).unwrap();
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(store.node_ids().unwrap().len(), 40);
}
