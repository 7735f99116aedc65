//! Orbit Ring Engine
//!
//! The traversal core: computes, caches, and serves proximity rings for
//! every entity in the relationship graph relative to a single anchor user.
//!
//! # Overview
//!
//! The engine is responsible for:
//! - **Traversal**: weighted, decay-aware, depth-bounded shortest paths
//!   from the anchor, with deterministic tie-breaking
//! - **Classification**: Core/Ring1/Ring2/Beyond from raw hop distance,
//!   plus manual pin overrides applied as post-processing
//! - **Cache invalidation**: recompute on edge-count delta, elapsed time,
//!   or manual request; publish each result as a complete snapshot swapped
//!   in atomically so readers never observe a mix of old and new
//! - **Metrics collection**: recompute cycles, ring populations, runtimes
//!
//! # Concurrency model
//!
//! At most one recomputation runs at a time; a refresh request arriving
//! while one is in flight is coalesced, not queued. Readers serve the
//! previous snapshot until the swap completes and never block on writers.
//!
//! # Usage
//!
//! ## One-shot recomputation
//!
//! ```no_run
//! use orbit_domain::{NodeId, NodeType};
//! use orbit_engine::{EngineConfig, RingEngine};
//! use orbit_store::SqliteGraphStore;
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(SqliteGraphStore::open("orbit.db")?);
//! let anchor = NodeId::compose(NodeType::User, "github", "alice");
//! let engine = RingEngine::new(store, EngineConfig::new(anchor))?;
//!
//! engine.refresh()?;
//! println!("{}", engine.metrics().summary());
//! # Ok(())
//! # }
//! ```
//!
//! ## Background worker
//!
//! ```no_run
//! use orbit_domain::{NodeId, NodeType};
//! use orbit_engine::{EngineConfig, RingEngine, RingWorker};
//! use orbit_store::SqliteGraphStore;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(SqliteGraphStore::open("orbit.db")?);
//!     let anchor = NodeId::compose(NodeType::User, "github", "alice");
//!     let engine = Arc::new(RingEngine::new(store, EngineConfig::new(anchor))?);
//!
//!     // Run indefinitely (until Ctrl+C)
//!     RingWorker::new(engine).run().await?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod engine;
pub mod error;
pub mod metrics;
pub mod snapshot;
pub mod traversal;
pub mod worker;

pub use config::EngineConfig;
pub use engine::{Explanation, RecomputeOutcome, RingEngine};
pub use error::EngineError;
pub use metrics::EngineMetrics;
pub use snapshot::RingSnapshot;
pub use worker::RingWorker;
