//! Traversal core - weighted, decayed, depth-bounded shortest paths
//!
//! Pure functions of an adjacency snapshot and an explicit `now`, so the
//! same inputs always produce byte-identical assignments. Direction encodes
//! semantic meaning but not graph distance: collaboration proximity is
//! symmetric, so every edge is expanded both ways.

use orbit_domain::decay::{edge_cost, effective_weight};
use orbit_domain::{DecayParams, Edge, NodeId, Ring, RingAssignment};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, BinaryHeap};

/// Undirected adjacency snapshot with per-edge traversal costs
///
/// Built once per recomputation from a consistent graph view; the
/// traversal itself never touches the store. Neighbor lists are kept sorted
/// by node id so expansion order is deterministic. Parallel edges between
/// the same pair keep the cheapest cost (the strongest signal wins).
#[derive(Debug, Default)]
pub struct CostGraph {
    adj: BTreeMap<NodeId, Vec<(NodeId, f64)>>,
}

impl CostGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the cost graph from one consistent edge set as of `now`
    ///
    /// Each edge contributes a symmetric pair of entries with cost
    /// `1 / (weight * decay(age))`.
    pub fn from_edges(edges: &[Edge], params: &DecayParams, now: u64) -> Self {
        let mut graph = Self::new();
        for edge in edges {
            let weight = effective_weight(edge.weight, edge.observed_at, now, params);
            graph.add_edge(edge.from.clone(), edge.to.clone(), edge_cost(weight));
        }
        graph
    }

    /// Add an undirected connection with the given traversal cost
    pub fn add_edge(&mut self, a: NodeId, b: NodeId, cost: f64) {
        Self::insert(&mut self.adj, a.clone(), b.clone(), cost);
        Self::insert(&mut self.adj, b, a, cost);
    }

    fn insert(adj: &mut BTreeMap<NodeId, Vec<(NodeId, f64)>>, from: NodeId, to: NodeId, cost: f64) {
        let entries = adj.entry(from).or_default();
        match entries.binary_search_by(|(n, _)| n.cmp(&to)) {
            Ok(i) => {
                if cost < entries[i].1 {
                    entries[i].1 = cost;
                }
            }
            Err(i) => entries.insert(i, (to, cost)),
        }
    }

    /// Neighbors of a node with their costs, sorted by node id
    pub fn neighbors(&self, id: &NodeId) -> &[(NodeId, f64)] {
        self.adj.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of nodes with at least one connection
    pub fn connected_nodes(&self) -> usize {
        self.adj.len()
    }
}

/// The selected path to one node: accumulated cost, raw hop count, and the
/// node sequence from the anchor
#[derive(Debug, Clone, PartialEq)]
pub struct PathLabel {
    /// Accumulated effective distance (sum of edge costs)
    pub cost: f64,

    /// Raw hop count of the path
    pub hops: u32,

    /// Node sequence from anchor to this node, inclusive
    pub path: Vec<NodeId>,
}

/// `true` if `a` wins the deterministic tie-break against `b`
///
/// Lexicographic on (cost, hops, path): cheaper first, then shorter, then
/// the lexicographically smaller node sequence. Total over all labels, so
/// identical graphs always select identical paths.
fn label_better(a: &PathLabel, b: &PathLabel) -> bool {
    match a.cost.total_cmp(&b.cost) {
        Ordering::Less => true,
        Ordering::Greater => false,
        Ordering::Equal => match a.hops.cmp(&b.hops) {
            Ordering::Less => true,
            Ordering::Greater => false,
            Ordering::Equal => a.path < b.path,
        },
    }
}

/// Heap entry for the bounded search, ordered so the cheapest (then
/// smallest-id, then shortest, then lexicographically-first-path) state
/// pops first from a max-heap
struct State {
    cost: f64,
    node: NodeId,
    hops: u32,
    path: Vec<NodeId>,
}

impl PartialEq for State {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for State {}

impl Ord for State {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.node.cmp(&self.node))
            .then_with(|| other.hops.cmp(&self.hops))
            .then_with(|| other.path.cmp(&self.path))
    }
}

impl PartialOrd for State {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Compute the selected path to every node reachable within `max_hops`
///
/// Dijkstra over `(node, hops)` states: pruning only expansions past the
/// hop cap guarantees any node reachable within the cap is found, even
/// when its overall-cheapest path would be longer. Per node, the winning
/// label is the [`label_better`] minimum across hop counts.
pub fn shortest_paths(
    graph: &CostGraph,
    anchor: &NodeId,
    max_hops: u32,
) -> BTreeMap<NodeId, PathLabel> {
    let mut best: BTreeMap<(NodeId, u32), PathLabel> = BTreeMap::new();
    let mut heap: BinaryHeap<State> = BinaryHeap::new();

    let start = PathLabel {
        cost: 0.0,
        hops: 0,
        path: vec![anchor.clone()],
    };
    best.insert((anchor.clone(), 0), start.clone());
    heap.push(State {
        cost: start.cost,
        node: anchor.clone(),
        hops: 0,
        path: start.path,
    });

    while let Some(state) = heap.pop() {
        let key = (state.node.clone(), state.hops);
        // Skip stale heap entries superseded by a better label.
        match best.get(&key) {
            Some(label) if label.cost == state.cost && label.path == state.path => {}
            _ => continue,
        }

        if state.hops == max_hops {
            continue;
        }

        for (neighbor, cost) in graph.neighbors(&state.node) {
            let mut path = state.path.clone();
            path.push(neighbor.clone());
            let candidate = PathLabel {
                cost: state.cost + cost,
                hops: state.hops + 1,
                path,
            };

            let next_key = (neighbor.clone(), candidate.hops);
            let improves = match best.get(&next_key) {
                Some(existing) => label_better(&candidate, existing),
                None => true,
            };
            if improves {
                heap.push(State {
                    cost: candidate.cost,
                    node: neighbor.clone(),
                    hops: candidate.hops,
                    path: candidate.path.clone(),
                });
                best.insert(next_key, candidate);
            }
        }
    }

    // Reduce per-node across hop counts.
    let mut result: BTreeMap<NodeId, PathLabel> = BTreeMap::new();
    for ((node, _), label) in best {
        match result.get(&node) {
            Some(existing) if !label_better(&label, existing) => {}
            _ => {
                result.insert(node, label);
            }
        }
    }
    result
}

/// Compute the full set of ring assignments for one recomputation cycle
///
/// Every known node gets exactly one assignment: the anchor is Core,
/// reached nodes classify by the hop count of their selected path, and
/// everything else (including pinned nodes absent from the graph) is
/// Beyond. Pin overrides are applied last and marked, so explain output
/// can distinguish a pinned node from an organically-close one.
pub fn compute_rings(
    graph: &CostGraph,
    nodes: &[NodeId],
    anchor: &NodeId,
    pins: &BTreeSet<NodeId>,
    max_hops: u32,
    computed_at: u64,
) -> Vec<RingAssignment> {
    let labels = shortest_paths(graph, anchor, max_hops);

    let mut all: BTreeSet<NodeId> = nodes.iter().cloned().collect();
    all.extend(pins.iter().cloned());
    all.insert(anchor.clone());

    let mut assignments = Vec::with_capacity(all.len());
    for node in all {
        let mut assignment = if node == *anchor {
            RingAssignment {
                node: node.clone(),
                ring: Ring::Core,
                distance: 0,
                effective_distance: 0.0,
                path: vec![anchor.clone()],
                pinned: false,
                computed_at,
            }
        } else if let Some(label) = labels.get(&node) {
            RingAssignment {
                node: node.clone(),
                ring: Ring::from_distance(label.hops),
                distance: label.hops,
                effective_distance: label.cost,
                path: label.path.clone(),
                pinned: false,
                computed_at,
            }
        } else {
            RingAssignment::unreached(node.clone(), computed_at)
        };

        // The anchor is Core by definition and never reclassified by a pin.
        if node != *anchor && pins.contains(&node) {
            assignment = assignment.pin();
        }
        assignments.push(assignment);
    }

    assignments
}
