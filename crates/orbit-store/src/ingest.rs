//! Ingestion boundary for connector-emitted observations
//!
//! Connectors translate provider API payloads into structured observation
//! tuples; this module applies a deduplicated batch of them to the graph
//! store. A malformed single observation never aborts the batch - it is
//! skipped and counted.

use orbit_domain::traits::GraphStore;
use orbit_domain::{Edge, NodeRef, Relation};
use std::collections::BTreeMap;

/// One structured fact emitted by a connector sync cycle
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    /// Source entity of the fact
    pub from: NodeRef,

    /// Target entity of the fact
    pub to: NodeRef,

    /// Relationship type
    pub relation: Relation,

    /// Timestamp of the fact itself, not of ingestion (unix seconds)
    pub observed_at: u64,

    /// Raw weight override; the relation's base weight when absent
    pub weight: Option<f64>,

    /// Opaque key-value bag attached to the edge
    pub metadata: BTreeMap<String, String>,
}

impl Observation {
    /// Create an observation carrying the relation's base weight
    pub fn new(from: NodeRef, to: NodeRef, relation: Relation, observed_at: u64) -> Self {
        Self {
            from,
            to,
            relation,
            observed_at,
            weight: None,
            metadata: BTreeMap::new(),
        }
    }

    /// Check the observation is well-formed
    ///
    /// Runs before anything touches the store, so a malformed observation
    /// leaves no partial state (no endpoint nodes, no edge).
    pub fn validate(&self) -> Result<(), String> {
        self.from.validate()?;
        self.to.validate()?;
        if let Some(weight) = self.weight {
            if !weight.is_finite() || weight <= 0.0 {
                return Err(format!(
                    "observation weight must be a positive finite number, got {}",
                    weight
                ));
            }
        }
        Ok(())
    }
}

/// Outcome of applying one observation batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Observations applied to the store
    pub applied: usize,

    /// Observations skipped due to validation failures
    pub skipped: usize,
}

/// Apply a batch of observations to the store
///
/// Each observation upserts both endpoint nodes (refreshing `last_seen_at`
/// to `now`) and upserts the edge per the `(from, to, relation, provider)`
/// merge semantics. Validation failures are skipped and counted; store
/// failures propagate.
///
/// The edge provider is taken from the `from` reference - a single
/// connector observes both endpoints of a fact.
pub fn apply_batch<S: GraphStore>(
    store: &S,
    batch: &[Observation],
    now: u64,
) -> Result<IngestReport, S::Error> {
    let mut report = IngestReport::default();

    for obs in batch {
        if let Err(reason) = obs.validate() {
            tracing::warn!("Skipping malformed observation: {}", reason);
            report.skipped += 1;
            continue;
        }

        let from_id = store.upsert_node(&obs.from, now)?;
        let to_id = store.upsert_node(&obs.to, now)?;

        let mut edge = Edge::new(from_id, to_id, obs.relation, &obs.from.provider, obs.observed_at);
        if let Some(weight) = obs.weight {
            // Validated above; positive and finite.
            edge.weight = weight;
        }
        edge.metadata = obs.metadata.clone();

        store.upsert_edge(&edge)?;
        report.applied += 1;
    }

    tracing::debug!(
        "Ingested batch: {} applied, {} skipped",
        report.applied,
        report.skipped
    );

    Ok(report)
}
