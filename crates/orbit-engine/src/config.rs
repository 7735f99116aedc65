//! Configuration for the ring engine
//!
//! Defines the anchor, decay parameters, and the recomputation policy
//! thresholds (edge-count delta and elapsed-time interval).

use orbit_domain::decay::{DEFAULT_DECAY_FLOOR, DEFAULT_GHOST_DAYS};
use orbit_domain::{DecayParams, NodeId, MAX_HOPS};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the ring engine
///
/// Controls the decay curve, traversal depth, and when cached ring
/// assignments are considered stale enough to recompute.
///
/// # Examples
///
/// ```
/// use orbit_domain::{NodeId, NodeType};
/// use orbit_engine::EngineConfig;
///
/// let anchor = NodeId::compose(NodeType::User, "github", "alice");
///
/// // Default configuration (balanced)
/// let config = EngineConfig::new(anchor.clone());
/// assert_eq!(config.recompute_interval_hours, 6);
///
/// // Eager recomputation
/// let config = EngineConfig::eager(anchor.clone());
/// assert_eq!(config.edge_delta_threshold, 1);
///
/// // Relaxed recomputation
/// let config = EngineConfig::relaxed(anchor);
/// assert_eq!(config.recompute_interval_hours, 24);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// The single user at the center of the graph (ring Core, distance 0)
    pub anchor: NodeId,

    /// Traversal hop cap; nodes beyond this many raw hops are Beyond
    /// Default: 3
    pub max_hops: u32,

    /// Ghost threshold in days for temporal decay
    /// Default: 90
    pub ghost_days: f64,

    /// Residual weight fraction ghost edges decay toward
    /// Default: 0.05
    pub decay_floor: f64,

    /// Recompute once the absolute edge-count change since the last
    /// computation exceeds this threshold
    /// Default: 10
    pub edge_delta_threshold: u64,

    /// Recompute once this many hours elapse since the last computation,
    /// even with no graph changes at all
    /// Default: 6 hours
    pub recompute_interval_hours: u64,

    /// How often the background worker polls the recomputation policy
    /// (in minutes)
    /// Default: every 5 minutes
    pub poll_interval_minutes: u64,
}

impl EngineConfig {
    /// Create default configuration for the given anchor
    ///
    /// - Hop cap: 3
    /// - Ghost threshold: 90 days, floor 0.05
    /// - Edge delta threshold: 10
    /// - Recompute interval: 6 hours
    /// - Worker poll interval: 5 minutes
    pub fn new(anchor: NodeId) -> Self {
        Self {
            anchor,
            max_hops: MAX_HOPS,
            ghost_days: DEFAULT_GHOST_DAYS,
            decay_floor: DEFAULT_DECAY_FLOOR,
            edge_delta_threshold: 10,
            recompute_interval_hours: 6,
            poll_interval_minutes: 5,
        }
    }

    /// Eager configuration (recompute on nearly every change)
    ///
    /// Suitable for small graphs or interactive development.
    pub fn eager(anchor: NodeId) -> Self {
        Self {
            edge_delta_threshold: 1,
            recompute_interval_hours: 1,
            poll_interval_minutes: 1,
            ..Self::new(anchor)
        }
    }

    /// Relaxed configuration (tolerate staler rings on large graphs)
    pub fn relaxed(anchor: NodeId) -> Self {
        Self {
            edge_delta_threshold: 50,
            recompute_interval_hours: 24,
            poll_interval_minutes: 15,
            ..Self::new(anchor)
        }
    }

    /// Get the recompute interval as a Duration
    pub fn recompute_interval(&self) -> Duration {
        Duration::from_secs(self.recompute_interval_hours * 3600)
    }

    /// Get the worker poll interval as a Duration
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_minutes * 60)
    }

    /// Decay parameters for the traversal
    pub fn decay_params(&self) -> DecayParams {
        DecayParams {
            ghost_days: self.ghost_days,
            floor: self.decay_floor,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orbit_domain::NodeType;

    fn anchor() -> NodeId {
        NodeId::compose(NodeType::User, "github", "alice")
    }

    #[test]
    fn test_default_config() {
        let config = EngineConfig::new(anchor());
        assert_eq!(config.max_hops, 3);
        assert_eq!(config.ghost_days, 90.0);
        assert_eq!(config.edge_delta_threshold, 10);
        assert_eq!(config.recompute_interval_hours, 6);
        assert_eq!(config.poll_interval_minutes, 5);
    }

    #[test]
    fn test_eager_config() {
        let config = EngineConfig::eager(anchor());
        assert_eq!(config.edge_delta_threshold, 1);
        assert!(config.recompute_interval_hours < EngineConfig::new(anchor()).recompute_interval_hours);
    }

    #[test]
    fn test_relaxed_config() {
        let config = EngineConfig::relaxed(anchor());
        assert_eq!(config.edge_delta_threshold, 50);
        assert_eq!(config.recompute_interval_hours, 24);
    }

    #[test]
    fn test_duration_conversions() {
        let config = EngineConfig::new(anchor());
        assert_eq!(config.recompute_interval(), Duration::from_secs(6 * 3600));
        assert_eq!(config.poll_interval(), Duration::from_secs(5 * 60));
    }

    #[test]
    fn test_decay_params_passthrough() {
        let mut config = EngineConfig::new(anchor());
        config.ghost_days = 30.0;
        let params = config.decay_params();
        assert_eq!(params.ghost_days, 30.0);
        assert_eq!(params.floor, 0.05);
    }

    #[test]
    fn test_serde_roundtrip() {
        let config = EngineConfig::new(anchor());
        let serialized = serde_json::to_string(&config).unwrap();
        let deserialized: EngineConfig = serde_json::from_str(&serialized).unwrap();

        assert_eq!(config.anchor, deserialized.anchor);
        assert_eq!(config.edge_delta_threshold, deserialized.edge_delta_threshold);
        assert_eq!(config.recompute_interval_hours, deserialized.recompute_interval_hours);
    }
}
