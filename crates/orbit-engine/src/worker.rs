//! Background worker for continuous ring maintenance

use crate::engine::{RecomputeOutcome, RingEngine};
use crate::error::EngineError;
use orbit_domain::traits::GraphStore;
use std::fmt::Display;
use std::sync::Arc;
use tokio::time::interval;

/// Background worker that keeps the ring snapshot fresh
///
/// Polls the engine's staleness policy on a fixed schedule; the engine
/// itself decides whether a full recomputation is warranted, so most
/// polls are cheap no-ops.
///
/// # Examples
///
/// ```no_run
/// use orbit_domain::{NodeId, NodeType};
/// use orbit_engine::{EngineConfig, RingEngine, RingWorker};
/// use orbit_store::SqliteGraphStore;
/// use std::sync::Arc;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = Arc::new(SqliteGraphStore::open("orbit.db")?);
///     let anchor = NodeId::compose(NodeType::User, "github", "alice");
///     let engine = Arc::new(RingEngine::new(store, EngineConfig::new(anchor))?);
///
///     // Run indefinitely (until Ctrl+C)
///     RingWorker::new(engine).run().await?;
///     Ok(())
/// }
/// ```
pub struct RingWorker<S> {
    engine: Arc<RingEngine<S>>,
}

impl<S> RingWorker<S>
where
    S: GraphStore,
    S::Error: Display,
{
    /// Create a worker over the given engine
    pub fn new(engine: Arc<RingEngine<S>>) -> Self {
        Self { engine }
    }

    /// Run the worker indefinitely
    ///
    /// Polls the recomputation policy at the configured interval until a
    /// shutdown signal (Ctrl+C) is received. A failed cycle is logged and
    /// the worker keeps going; transient store errors should not kill the
    /// maintenance loop.
    pub async fn run(&self) -> Result<(), EngineError> {
        let poll = self.engine.config().poll_interval();
        let mut ticker = interval(poll);

        tracing::info!("ring worker started (poll interval: {:?})", poll);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match self.engine.maybe_recompute() {
                        Ok(RecomputeOutcome::Completed) => {
                            tracing::debug!("poll: snapshot recomputed");
                        }
                        Ok(RecomputeOutcome::Coalesced) => {
                            tracing::debug!("poll: recomputation already in flight");
                        }
                        Ok(RecomputeOutcome::Skipped) => {
                            tracing::trace!("poll: snapshot still fresh");
                        }
                        Err(e) => {
                            tracing::error!("recomputation failed: {}", e);
                        }
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("shutdown signal received, stopping ring worker");
                    break;
                }
            }
        }

        let metrics = self.engine.metrics();
        tracing::info!("ring worker stopped. Final metrics:\n{}", metrics.summary());

        Ok(())
    }

    /// Run for a specific number of poll cycles (useful for testing)
    ///
    /// Unlike [`RingWorker::run`], a failed cycle stops the loop and
    /// returns the error.
    pub async fn run_cycles(&self, cycles: usize) -> Result<(), EngineError> {
        let poll = self.engine.config().poll_interval();
        let mut ticker = interval(poll);

        tracing::info!(
            "ring worker started for {} cycles (poll interval: {:?})",
            cycles,
            poll
        );

        for cycle in 0..cycles {
            ticker.tick().await;
            let outcome = self.engine.maybe_recompute()?;
            tracing::debug!("poll {}/{}: {:?}", cycle + 1, cycles, outcome);
        }

        tracing::info!(
            "ring worker finished {} cycles. Final metrics:\n{}",
            cycles,
            self.engine.metrics().summary()
        );

        Ok(())
    }

    /// The engine this worker drives
    pub fn engine(&self) -> &Arc<RingEngine<S>> {
        &self.engine
    }
}
