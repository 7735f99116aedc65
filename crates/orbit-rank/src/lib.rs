//! Orbit ring consumers
//!
//! The two interfaces that actually spend the ring signal:
//!
//! - [`SearchReranker`] multiplies base retrieval scores by a ring-indexed
//!   boost, pulling results close to the anchor up the list.
//! - [`SyncScheduler`] turns ring membership into a fetch plan: what to
//!   sync, at what depth, and how often.
//!
//! Both consume the [`RingSource`](orbit_domain::traits::RingSource) trait
//! and never touch the graph store or the traversal directly.

#![warn(missing_docs)]

pub mod rerank;
pub mod scheduler;

pub use rerank::{RankedHit, RerankConfig, SearchHit, SearchReranker};
pub use scheduler::{SchedulerConfig, SyncScheduler, SyncTarget};
