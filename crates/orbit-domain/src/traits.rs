//! Trait definitions for external interactions
//!
//! These traits define the boundaries between domain logic and
//! infrastructure. Infrastructure implementations live in other crates.

use crate::{CanonicalId, Edge, EdgeId, IdentityLink, Node, NodeId, NodeRef, Ring, RingAssignment};
use std::collections::BTreeSet;

/// A consistent read of the whole graph, taken in one step
///
/// Recomputation input: nodes, edges, and pins as they stood at a single
/// point in time, so a concurrent edge burst can never be half-included in
/// one traversal.
#[derive(Debug, Clone)]
pub struct GraphView {
    /// All node ids, in lexicographic order
    pub nodes: Vec<NodeId>,

    /// All edges
    pub edges: Vec<Edge>,

    /// All pinned node ids
    pub pins: BTreeSet<NodeId>,
}

impl GraphView {
    /// Number of edges in this view
    ///
    /// Derived from the edges actually read, so it can never drift from
    /// the graph a traversal over this view sees.
    pub fn edge_count(&self) -> u64 {
        self.edges.len() as u64
    }
}

/// Trait for the durable, deduplicated graph store
///
/// Implemented by the infrastructure layer (orbit-store). Holds no
/// traversal logic: upsert and adjacency-query primitives only.
///
/// Violating a uniqueness constraint is not an error anywhere in this
/// contract - it is normal upsert behavior. Only malformed references fail.
pub trait GraphStore {
    /// Error type for store operations
    type Error;

    /// Create or refresh a node; idempotent for identical
    /// `(provider, external_id)`. Refresh bumps `last_seen_at`, fills a
    /// missing display name, and replaces stored metadata when the incoming
    /// bag is non-empty; timestamps never move backwards.
    fn upsert_node(&self, node: &NodeRef, now: u64) -> Result<NodeId, Self::Error>;

    /// Get a node by id
    fn get_node(&self, id: &NodeId) -> Result<Option<Node>, Self::Error>;

    /// All node ids currently in the graph
    fn node_ids(&self) -> Result<Vec<NodeId>, Self::Error>;

    /// Insert or refresh an edge per the `(from, to, relation, provider)`
    /// uniqueness invariant. On refresh, `observed_at` and `weight` take
    /// the max of existing and incoming - facts only get fresher.
    fn upsert_edge(&self, edge: &Edge) -> Result<EdgeId, Self::Error>;

    /// All edges leaving a node (indexed lookup, not a scan)
    fn edges_from(&self, id: &NodeId) -> Result<Vec<Edge>, Self::Error>;

    /// All edges arriving at a node (indexed lookup, not a scan)
    fn edges_to(&self, id: &NodeId) -> Result<Vec<Edge>, Self::Error>;

    /// Total number of edges in the graph
    fn edge_count(&self) -> Result<u64, Self::Error>;

    /// Read nodes, edges, and pins as one consistent snapshot
    ///
    /// Implementations must not let concurrent writes interleave between
    /// the three reads; recomputation depends on seeing a single point in
    /// time.
    fn graph_view(&self) -> Result<GraphView, Self::Error>;

    /// Set or clear the manual Ring1 pin for a node
    fn set_pin(&self, id: &NodeId, pinned: bool) -> Result<(), Self::Error>;

    /// All currently pinned node ids
    fn pinned_nodes(&self) -> Result<BTreeSet<NodeId>, Self::Error>;

    /// Existing identity link for a provider account, if any
    fn identity_for(&self, provider: &str, provider_user_id: &str)
        -> Result<Option<IdentityLink>, Self::Error>;

    /// Canonical identity already linked to a verified email, if any
    fn identity_by_email(&self, email: &str) -> Result<Option<CanonicalId>, Self::Error>;

    /// Record a new identity link. Fails if the `(provider,
    /// provider_user_id)` pair is already linked - re-linking must go
    /// through [`GraphStore::replace_identity_link`] explicitly.
    fn insert_identity_link(&self, link: &IdentityLink) -> Result<(), Self::Error>;

    /// Explicitly re-link a provider account to a different canonical
    /// identity, replacing any existing link
    fn replace_identity_link(&self, link: &IdentityLink) -> Result<(), Self::Error>;

    /// Replace the persisted ring-assignment snapshot in one atomic step
    fn replace_assignments(&self, assignments: &[RingAssignment]) -> Result<(), Self::Error>;

    /// Load the persisted ring-assignment snapshot
    fn load_assignments(&self) -> Result<Vec<RingAssignment>, Self::Error>;
}

/// Read-only view of the published ring snapshot
///
/// Implemented by the ring engine and consumed by the search reranker and
/// the sync scheduler. Lookups are O(1) against the current snapshot and
/// never block on an in-progress recomputation.
pub trait RingSource {
    /// Cached ring for a node; Beyond for nodes never computed or
    /// unreached, by convention
    fn ring(&self, node: &NodeId) -> Ring;

    /// All nodes currently assigned to the given ring, in deterministic
    /// (lexicographic) order
    fn nodes_in_ring(&self, ring: Ring) -> BTreeSet<NodeId>;

    /// Full cached assignment for a node, if one exists
    fn assignment(&self, node: &NodeId) -> Option<RingAssignment>;
}
