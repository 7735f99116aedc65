//! Published ring snapshot
//!
//! An immutable, complete view of one recomputation cycle. The engine
//! builds a fresh snapshot off to the side and swaps it in behind an `Arc`,
//! so readers either see the whole previous cycle or the whole new one.

use orbit_domain::{NodeId, Ring, RingAssignment};
use std::collections::{BTreeMap, BTreeSet};

/// Immutable result of one ring recomputation cycle
///
/// Holds every assignment plus a per-ring index for O(log n) lookups and
/// deterministic (lexicographic) ring listings.
#[derive(Debug, Clone)]
pub struct RingSnapshot {
    assignments: BTreeMap<NodeId, RingAssignment>,
    by_ring: [BTreeSet<NodeId>; 4],
    computed_at: u64,
    edge_count: u64,
}

impl RingSnapshot {
    /// An empty snapshot: every lookup answers Beyond
    pub fn empty() -> Self {
        Self {
            assignments: BTreeMap::new(),
            by_ring: Default::default(),
            computed_at: 0,
            edge_count: 0,
        }
    }

    /// Build a snapshot from one cycle's assignments
    pub fn from_assignments(
        assignments: Vec<RingAssignment>,
        computed_at: u64,
        edge_count: u64,
    ) -> Self {
        let mut map = BTreeMap::new();
        let mut by_ring: [BTreeSet<NodeId>; 4] = Default::default();
        for assignment in assignments {
            by_ring[assignment.ring.index() as usize].insert(assignment.node.clone());
            map.insert(assignment.node.clone(), assignment);
        }
        Self {
            assignments: map,
            by_ring,
            computed_at,
            edge_count,
        }
    }

    /// Ring for a node; Beyond for nodes this snapshot never saw
    pub fn ring(&self, node: &NodeId) -> Ring {
        self.assignments
            .get(node)
            .map(|a| a.ring)
            .unwrap_or(Ring::Beyond)
    }

    /// Full assignment for a node, if one exists
    pub fn assignment(&self, node: &NodeId) -> Option<&RingAssignment> {
        self.assignments.get(node)
    }

    /// All nodes in the given ring, in lexicographic order
    pub fn nodes_in_ring(&self, ring: Ring) -> &BTreeSet<NodeId> {
        &self.by_ring[ring.index() as usize]
    }

    /// All assignments in node-id order
    pub fn assignments(&self) -> impl Iterator<Item = &RingAssignment> {
        self.assignments.values()
    }

    /// Number of nodes assigned in this snapshot
    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    /// Whether this snapshot holds no assignments
    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    /// Population of each ring, closest first
    pub fn ring_counts(&self) -> [usize; 4] {
        [
            self.by_ring[0].len(),
            self.by_ring[1].len(),
            self.by_ring[2].len(),
            self.by_ring[3].len(),
        ]
    }

    /// When this snapshot was computed (unix seconds); 0 for [`Self::empty`]
    pub fn computed_at(&self) -> u64 {
        self.computed_at
    }

    /// Graph edge count observed at computation time, used by the
    /// edge-delta recomputation trigger
    pub fn edge_count(&self) -> u64 {
        self.edge_count
    }
}

impl Default for RingSnapshot {
    fn default() -> Self {
        Self::empty()
    }
}
