//! The ring engine: recomputation policy, snapshot publication, and lookups
//!
//! The engine owns the derived ring state end to end. It decides when the
//! cached assignments are stale, runs the traversal, persists the result,
//! and publishes it as an immutable snapshot swapped in atomically behind
//! an `Arc`. Readers never block on a recomputation in progress.

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::metrics::EngineMetrics;
use crate::snapshot::RingSnapshot;
use crate::traversal::{compute_rings, CostGraph};
use orbit_domain::traits::{GraphStore, RingSource};
use orbit_domain::{NodeId, Ring, RingAssignment};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt::Display;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

/// What happened to a refresh or policy-check request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecomputeOutcome {
    /// A full recomputation ran and a new snapshot was published
    Completed,

    /// Another recomputation was already in flight; this request was
    /// absorbed into it rather than queued
    Coalesced,

    /// The policy judged the cached snapshot fresh; nothing ran
    Skipped,
}

/// Explanation of one node's current ring assignment
///
/// Shows the selected path and whether a manual pin overrode the computed
/// classification, so a surprising ranking can be traced to its cause.
#[derive(Debug, Clone, Serialize)]
pub struct Explanation {
    /// The node being explained
    pub node: NodeId,

    /// Current ring after pin overrides
    pub ring: Ring,

    /// Raw hop count of the selected path
    pub distance: u32,

    /// Decay-adjusted distance of the selected path
    pub effective_distance: f64,

    /// The path the traversal selected, anchor first
    pub path: Vec<NodeId>,

    /// Whether a manual pin forced this node into Ring1
    pub pinned: bool,

    /// When the underlying snapshot was computed (unix seconds)
    pub computed_at: u64,
}

impl Explanation {
    fn from_assignment(assignment: &RingAssignment) -> Self {
        Self {
            node: assignment.node.clone(),
            ring: assignment.ring,
            distance: assignment.distance,
            effective_distance: assignment.effective_distance,
            path: assignment.path.clone(),
            pinned: assignment.pinned,
            computed_at: assignment.computed_at,
        }
    }

    fn unknown(node: NodeId) -> Self {
        Self {
            node,
            ring: Ring::Beyond,
            distance: orbit_domain::UNREACHED_DISTANCE,
            effective_distance: f64::INFINITY,
            path: Vec::new(),
            pinned: false,
            computed_at: 0,
        }
    }
}

/// Releases the in-flight flag when a recomputation exits, on any path
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Computes, caches, and serves proximity rings relative to one anchor
///
/// Thread-safe: lookups read the current snapshot through a shared lock
/// held only for the pointer clone, and at most one recomputation runs at
/// a time. See the crate docs for usage examples.
pub struct RingEngine<S> {
    store: Arc<S>,
    config: EngineConfig,
    snapshot: RwLock<Arc<RingSnapshot>>,
    in_flight: AtomicBool,
    dirty: AtomicBool,
    metrics: Mutex<EngineMetrics>,
}

impl<S> RingEngine<S>
where
    S: GraphStore,
    S::Error: Display,
{
    /// Create an engine over the given store
    ///
    /// Loads any persisted ring assignments so lookups are served from the
    /// last computed state immediately, before the first recomputation.
    pub fn new(store: Arc<S>, config: EngineConfig) -> Result<Self, EngineError> {
        Self::validate(&config)?;

        let persisted = store
            .load_assignments()
            .map_err(|e| EngineError::Store(e.to_string()))?;
        let snapshot = if persisted.is_empty() {
            RingSnapshot::empty()
        } else {
            let computed_at = persisted.iter().map(|a| a.computed_at).max().unwrap_or(0);
            // The edge count at the persisted snapshot's computation time is
            // unknown, so the delta trigger restarts from the current count;
            // the elapsed-time trigger covers staleness accrued while down.
            let edge_count = store
                .edge_count()
                .map_err(|e| EngineError::Store(e.to_string()))?;
            tracing::info!(
                assignments = persisted.len(),
                computed_at,
                "loaded persisted ring snapshot"
            );
            RingSnapshot::from_assignments(persisted, computed_at, edge_count)
        };

        Ok(Self {
            store,
            config,
            snapshot: RwLock::new(Arc::new(snapshot)),
            in_flight: AtomicBool::new(false),
            dirty: AtomicBool::new(false),
            metrics: Mutex::new(EngineMetrics::new()),
        })
    }

    fn validate(config: &EngineConfig) -> Result<(), EngineError> {
        if config.max_hops == 0 {
            return Err(EngineError::Config("max_hops must be at least 1".into()));
        }
        if config.ghost_days <= 0.0 {
            return Err(EngineError::Config("ghost_days must be positive".into()));
        }
        if !(0.0..1.0).contains(&config.decay_floor) {
            return Err(EngineError::Config(
                "decay_floor must be in [0, 1)".into(),
            ));
        }
        Ok(())
    }

    /// The engine's configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The currently published snapshot
    pub fn snapshot(&self) -> Arc<RingSnapshot> {
        self.snapshot
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Force a recomputation now, regardless of the staleness policy
    ///
    /// Coalesces with any recomputation already in flight instead of
    /// queuing behind it.
    pub fn refresh(&self) -> Result<RecomputeOutcome, EngineError> {
        self.refresh_at(unix_now())
    }

    /// Force a recomputation with an explicit clock, for deterministic use
    pub fn refresh_at(&self, now: u64) -> Result<RecomputeOutcome, EngineError> {
        self.recompute_at(now)
    }

    /// Run a recomputation only if the staleness policy calls for one
    ///
    /// Triggers: never computed, a pending pin change, the edge count
    /// moving by more than the configured delta, or the configured
    /// interval elapsing since the last computation.
    pub fn maybe_recompute(&self) -> Result<RecomputeOutcome, EngineError> {
        self.maybe_recompute_at(unix_now())
    }

    /// Policy check with an explicit clock, for deterministic use
    pub fn maybe_recompute_at(&self, now: u64) -> Result<RecomputeOutcome, EngineError> {
        let snapshot = self.snapshot();

        let stale = if snapshot.computed_at() == 0 {
            tracing::debug!("recompute: no snapshot yet");
            true
        } else if self.dirty.load(Ordering::Acquire) {
            tracing::debug!("recompute: pin change pending");
            true
        } else {
            let edges = self
                .store
                .edge_count()
                .map_err(|e| EngineError::Store(e.to_string()))?;
            let delta = edges.abs_diff(snapshot.edge_count());
            let elapsed = now.saturating_sub(snapshot.computed_at());
            if delta > self.config.edge_delta_threshold {
                tracing::debug!(delta, "recompute: edge delta over threshold");
                true
            } else if elapsed >= self.config.recompute_interval().as_secs() {
                tracing::debug!(elapsed, "recompute: interval elapsed");
                true
            } else {
                false
            }
        };

        if !stale {
            self.metrics
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .record_skipped();
            return Ok(RecomputeOutcome::Skipped);
        }
        self.recompute_at(now)
    }

    fn recompute_at(&self, now: u64) -> Result<RecomputeOutcome, EngineError> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!("refresh coalesced into in-flight recomputation");
            self.metrics
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .record_coalesced();
            return Ok(RecomputeOutcome::Coalesced);
        }
        let _guard = InFlightGuard(&self.in_flight);
        let started = Instant::now();

        // Pin changes arriving from here on will set dirty again and be
        // picked up by the next policy check.
        self.dirty.store(false, Ordering::Release);

        let map_err = |e: S::Error| EngineError::Store(e.to_string());
        // One consistent read: a concurrent edge burst is either wholly in
        // this cycle or wholly in the next, never half-included.
        let view = self.store.graph_view().map_err(map_err)?;
        let graph = CostGraph::from_edges(&view.edges, &self.config.decay_params(), now);
        let edge_count = view.edge_count();

        let assignments = compute_rings(
            &graph,
            &view.nodes,
            &self.config.anchor,
            &view.pins,
            self.config.max_hops,
            now,
        );

        // Persist first, then publish: a crash between the two leaves the
        // durable state ahead of the served state, never behind it.
        self.store
            .replace_assignments(&assignments)
            .map_err(map_err)?;
        let next = Arc::new(RingSnapshot::from_assignments(assignments, now, edge_count));
        let counts = next.ring_counts();
        *self.snapshot.write().unwrap_or_else(|e| e.into_inner()) = next;

        let runtime_ms = started.elapsed().as_millis() as u64;
        self.metrics
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .record_recompute(counts, runtime_ms);
        tracing::info!(
            nodes = counts.iter().sum::<usize>(),
            core = counts[0],
            ring1 = counts[1],
            ring2 = counts[2],
            beyond = counts[3],
            runtime_ms,
            "ring snapshot published"
        );

        Ok(RecomputeOutcome::Completed)
    }

    /// Pin a node into Ring1
    ///
    /// Takes effect at the next recomputation; the policy check treats a
    /// pending pin change as staleness.
    pub fn pin(&self, node: &NodeId) -> Result<(), EngineError> {
        self.store
            .set_pin(node, true)
            .map_err(|e| EngineError::Store(e.to_string()))?;
        self.dirty.store(true, Ordering::Release);
        tracing::info!(node = %node, "pinned to ring1");
        Ok(())
    }

    /// Remove a node's manual pin, letting the computed ring stand again
    pub fn unpin(&self, node: &NodeId) -> Result<(), EngineError> {
        self.store
            .set_pin(node, false)
            .map_err(|e| EngineError::Store(e.to_string()))?;
        self.dirty.store(true, Ordering::Release);
        tracing::info!(node = %node, "unpinned");
        Ok(())
    }

    /// Cached ring for a node; Beyond for nodes never computed
    pub fn get_ring(&self, node: &NodeId) -> Ring {
        self.snapshot().ring(node)
    }

    /// Explain a node's current assignment, including the selected path
    /// and any pin override. Nodes the snapshot never saw explain as
    /// Beyond with an empty path.
    pub fn explain(&self, node: &NodeId) -> Explanation {
        match self.snapshot().assignment(node) {
            Some(assignment) => Explanation::from_assignment(assignment),
            None => Explanation::unknown(node.clone()),
        }
    }

    /// Current metrics, copied out
    pub fn metrics(&self) -> EngineMetrics {
        self.metrics
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl<S> RingSource for RingEngine<S>
where
    S: GraphStore,
    S::Error: Display,
{
    fn ring(&self, node: &NodeId) -> Ring {
        self.get_ring(node)
    }

    fn nodes_in_ring(&self, ring: Ring) -> BTreeSet<NodeId> {
        self.snapshot().nodes_in_ring(ring).clone()
    }

    fn assignment(&self, node: &NodeId) -> Option<RingAssignment> {
        self.snapshot().assignment(node).cloned()
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
