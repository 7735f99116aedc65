//! Search result reranking by ring proximity

use orbit_domain::traits::RingSource;
use orbit_domain::{NodeId, Ring};
use serde::{Deserialize, Serialize};

/// Ring-indexed score multipliers
///
/// Core and Ring1 boost hardest, Beyond is neutral: an entity the anchor
/// has never collaborated near keeps its base relevance untouched rather
/// than being punished for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RerankConfig {
    /// Multiplier for the anchor's own entities
    /// Default: 3.0
    pub core_boost: f64,

    /// Multiplier for direct collaborators
    /// Default: 2.0
    pub ring1_boost: f64,

    /// Multiplier for collaborators-of-collaborators
    /// Default: 1.25
    pub ring2_boost: f64,

    /// Multiplier for everything else
    /// Default: 1.0 (neutral)
    pub beyond_boost: f64,
}

impl Default for RerankConfig {
    fn default() -> Self {
        Self {
            core_boost: 3.0,
            ring1_boost: 2.0,
            ring2_boost: 1.25,
            beyond_boost: 1.0,
        }
    }
}

impl RerankConfig {
    /// Multiplier for the given ring
    pub fn boost(&self, ring: Ring) -> f64 {
        match ring {
            Ring::Core => self.core_boost,
            Ring::Ring1 => self.ring1_boost,
            Ring::Ring2 => self.ring2_boost,
            Ring::Beyond => self.beyond_boost,
        }
    }
}

/// One retrieved result before reranking
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    /// The graph node this result maps to
    pub node: NodeId,

    /// Base relevance score from retrieval
    pub base_score: f64,
}

impl SearchHit {
    /// Create a hit
    pub fn new(node: NodeId, base_score: f64) -> Self {
        Self { node, base_score }
    }
}

/// One result after reranking, with the boost made visible
#[derive(Debug, Clone, PartialEq)]
pub struct RankedHit {
    /// The graph node this result maps to
    pub node: NodeId,

    /// Base relevance score from retrieval
    pub base_score: f64,

    /// Ring the node was in at rerank time
    pub ring: Ring,

    /// `base_score` times the ring boost
    pub boosted_score: f64,
}

/// Applies ring-based boosts to retrieval scores
///
/// Pure over a [`RingSource`]: one O(1) ring lookup per hit, then a stable
/// sort, so ties after boosting keep their original relative order.
#[derive(Debug, Clone, Default)]
pub struct SearchReranker {
    config: RerankConfig,
}

impl SearchReranker {
    /// Create a reranker with the given boosts
    pub fn new(config: RerankConfig) -> Self {
        Self { config }
    }

    /// The active boost configuration
    pub fn config(&self) -> &RerankConfig {
        &self.config
    }

    /// Boost and reorder hits by ring proximity
    ///
    /// Returns the hits sorted by boosted score, highest first. The sort
    /// is stable: hits with equal boosted scores stay in their incoming
    /// (retrieval) order.
    pub fn rerank<R: RingSource>(&self, rings: &R, hits: Vec<SearchHit>) -> Vec<RankedHit> {
        let mut ranked: Vec<RankedHit> = hits
            .into_iter()
            .map(|hit| {
                let ring = rings.ring(&hit.node);
                let boosted_score = hit.base_score * self.config.boost(ring);
                RankedHit {
                    node: hit.node,
                    base_score: hit.base_score,
                    ring,
                    boosted_score,
                }
            })
            .collect();

        ranked.sort_by(|a, b| b.boosted_score.total_cmp(&a.boosted_score));
        tracing::debug!(hits = ranked.len(), "reranked search results");
        ranked
    }
}
