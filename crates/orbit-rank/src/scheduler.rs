//! Sync scheduling driven by ring membership
//!
//! Close entities get fetched deep and often; the next ring out gets a
//! shallow, slower cadence; Beyond is not scheduled at all.

use orbit_domain::traits::RingSource;
use orbit_domain::{NodeId, Ring};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Per-ring fetch depth and cadence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Fetch depth for Ring1 entities (related objects to pull per sync)
    /// Default: 2
    pub ring1_depth: u32,

    /// Sync cadence for Ring1 entities (in minutes)
    /// Default: every 15 minutes
    pub ring1_interval_minutes: u64,

    /// Fetch depth for Ring2 entities
    /// Default: 1
    pub ring2_depth: u32,

    /// Sync cadence for Ring2 entities (in minutes)
    /// Default: every 60 minutes
    pub ring2_interval_minutes: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            ring1_depth: 2,
            ring1_interval_minutes: 15,
            ring2_depth: 1,
            ring2_interval_minutes: 60,
        }
    }
}

impl SchedulerConfig {
    /// Ring1 cadence as a Duration
    pub fn ring1_interval(&self) -> Duration {
        Duration::from_secs(self.ring1_interval_minutes * 60)
    }

    /// Ring2 cadence as a Duration
    pub fn ring2_interval(&self) -> Duration {
        Duration::from_secs(self.ring2_interval_minutes * 60)
    }
}

/// One entry in a sync plan: what to fetch, how deep, how often
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncTarget {
    /// The entity to sync
    pub node: NodeId,

    /// Ring that earned it this slot
    pub ring: Ring,

    /// How many levels of related objects to pull
    pub depth: u32,

    /// How often to re-fetch
    pub interval: Duration,
}

/// Builds fetch plans from the current ring snapshot
///
/// Plans list Ring1 targets first, then Ring2, each in lexicographic node
/// order, so identical snapshots always produce identical batches.
#[derive(Debug, Clone, Default)]
pub struct SyncScheduler {
    config: SchedulerConfig,
}

impl SyncScheduler {
    /// Create a scheduler with the given per-ring policy
    pub fn new(config: SchedulerConfig) -> Self {
        Self { config }
    }

    /// The active scheduling policy
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Build the full sync plan from the current snapshot
    pub fn plan<R: RingSource>(&self, rings: &R) -> Vec<SyncTarget> {
        let mut targets = Vec::new();
        for node in rings.nodes_in_ring(Ring::Ring1) {
            targets.push(SyncTarget {
                node,
                ring: Ring::Ring1,
                depth: self.config.ring1_depth,
                interval: self.config.ring1_interval(),
            });
        }
        for node in rings.nodes_in_ring(Ring::Ring2) {
            targets.push(SyncTarget {
                node,
                ring: Ring::Ring2,
                depth: self.config.ring2_depth,
                interval: self.config.ring2_interval(),
            });
        }
        tracing::debug!(targets = targets.len(), "built sync plan");
        targets
    }

    /// Plan for a single ring, in lexicographic node order
    pub fn plan_ring<R: RingSource>(&self, rings: &R, ring: Ring) -> Vec<SyncTarget> {
        self.plan(rings)
            .into_iter()
            .filter(|t| t.ring == ring)
            .collect()
    }
}
