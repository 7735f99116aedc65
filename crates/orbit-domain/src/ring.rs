//! Ring module - proximity classification relative to the anchor user

use crate::node::NodeId;
use serde::{Deserialize, Serialize};

/// Traversal hop cap: any node not reached within this many raw hops is
/// classified Beyond regardless of edge weights
pub const MAX_HOPS: u32 = 3;

/// Distance recorded for nodes never reached by traversal (the cap)
pub const UNREACHED_DISTANCE: u32 = MAX_HOPS;

/// A discrete proximity class derived from graph distance
///
/// Classification: distance 0 = Core (the anchor itself), 1 = Ring1,
/// 2 = Ring2, >= 3 or unreached = Beyond. "Unknown" and "maximally distant"
/// are equivalent for ranking purposes, so lookups for never-observed nodes
/// answer Beyond by convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Ring {
    /// The anchor user (distance 0)
    Core,

    /// Direct collaborators (distance 1)
    Ring1,

    /// Collaborators-of-collaborators (distance 2)
    Ring2,

    /// Everything else (distance >= 3 or unreached)
    Beyond,
}

impl Ring {
    /// Get the ring name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Ring::Core => "core",
            Ring::Ring1 => "ring1",
            Ring::Ring2 => "ring2",
            Ring::Beyond => "beyond",
        }
    }

    /// Parse a ring from a string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "core" => Some(Ring::Core),
            "ring1" => Some(Ring::Ring1),
            "ring2" => Some(Ring::Ring2),
            "beyond" => Some(Ring::Beyond),
            _ => None,
        }
    }

    /// Classify a raw hop distance into a ring
    pub fn from_distance(distance: u32) -> Self {
        match distance {
            0 => Ring::Core,
            1 => Ring::Ring1,
            2 => Ring::Ring2,
            _ => Ring::Beyond,
        }
    }

    /// Numeric index (Core=0 .. Beyond=3)
    pub fn index(&self) -> u8 {
        match self {
            Ring::Core => 0,
            Ring::Ring1 => 1,
            Ring::Ring2 => 2,
            Ring::Beyond => 3,
        }
    }

    /// All ring variants, closest first
    pub fn all() -> [Ring; 4] {
        [Ring::Core, Ring::Ring1, Ring::Ring2, Ring::Beyond]
    }
}

impl std::str::FromStr for Ring {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid ring: {}", s))
    }
}

/// A derived, cacheable proximity fact about one node
///
/// Wholly owned by the ring engine: rewritten in full on every
/// recomputation cycle and always replaced as a complete snapshot, never
/// partially mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RingAssignment {
    /// The node this assignment is about
    pub node: NodeId,

    /// Proximity class after pin overrides
    pub ring: Ring,

    /// Raw hop count of the selected path, capped at [`MAX_HOPS`]
    pub distance: u32,

    /// Decay-adjusted distance used for tie-breaking within a ring;
    /// infinite for unreached nodes
    pub effective_distance: f64,

    /// The path actually selected by the deterministic tie-break, from
    /// anchor to this node (empty for unreached nodes)
    pub path: Vec<NodeId>,

    /// Whether a manual pin forced this node into Ring1
    pub pinned: bool,

    /// When this assignment was computed (unix seconds)
    pub computed_at: u64,
}

impl RingAssignment {
    /// Assignment for a node the traversal never reached
    pub fn unreached(node: NodeId, computed_at: u64) -> Self {
        Self {
            node,
            ring: Ring::Beyond,
            distance: UNREACHED_DISTANCE,
            effective_distance: f64::INFINITY,
            path: Vec::new(),
            pinned: false,
            computed_at,
        }
    }

    /// Force this assignment into Ring1 via a manual pin, keeping the
    /// computed distance visible for explainability
    pub fn pin(mut self) -> Self {
        self.ring = Ring::Ring1;
        self.pinned = true;
        self
    }
}
