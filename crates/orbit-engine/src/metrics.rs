//! Metrics collection for ring engine operations

use orbit_domain::Ring;

/// Metrics collected across recomputation cycles
///
/// Tracks cycle counts, coalesced refresh requests, ring populations from
/// the latest snapshot, and cumulative runtime.
#[derive(Debug, Clone, Default)]
pub struct EngineMetrics {
    /// Completed recomputation cycles
    pub recompute_count: usize,

    /// Refresh requests coalesced into an already-running cycle
    pub coalesced_count: usize,

    /// Policy checks that decided the cached snapshot was still fresh
    pub skipped_count: usize,

    /// Ring populations from the latest snapshot, closest first
    pub ring_counts: [usize; 4],

    /// Nodes assigned in the latest snapshot
    pub node_count: usize,

    /// Total recomputation runtime in milliseconds
    pub total_runtime_ms: u64,
}

impl EngineMetrics {
    /// Create new empty metrics
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a completed recomputation cycle
    pub fn record_recompute(&mut self, ring_counts: [usize; 4], runtime_ms: u64) {
        self.recompute_count += 1;
        self.ring_counts = ring_counts;
        self.node_count = ring_counts.iter().sum();
        self.total_runtime_ms += runtime_ms;
    }

    /// Record a refresh request coalesced into an in-flight cycle
    pub fn record_coalesced(&mut self) {
        self.coalesced_count += 1;
    }

    /// Record a policy check that kept the cached snapshot
    pub fn record_skipped(&mut self) {
        self.skipped_count += 1;
    }

    /// Population of a single ring in the latest snapshot
    pub fn ring_count(&self, ring: Ring) -> usize {
        self.ring_counts[ring.index() as usize]
    }

    /// Reset all metrics
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Generate a summary report of metrics
    pub fn summary(&self) -> String {
        let mut lines = vec![
            format!("Ring Engine Metrics Summary"),
            format!("==========================="),
            format!("Recompute cycles: {}", self.recompute_count),
            format!("Coalesced refreshes: {}", self.coalesced_count),
            format!("Fresh-cache skips: {}", self.skipped_count),
            format!("Total runtime: {}ms", self.total_runtime_ms),
        ];

        if self.node_count > 0 {
            lines.push(format!(""));
            lines.push(format!("Latest snapshot ({} nodes):", self.node_count));
            for ring in Ring::all() {
                lines.push(format!("  {}: {}", ring.as_str(), self.ring_count(ring)));
            }
        }

        lines.join("\n")
    }
}
