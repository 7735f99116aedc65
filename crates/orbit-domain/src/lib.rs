//! Orbit Domain Layer
//!
//! This crate contains the core domain model for Orbit: the relationship
//! graph harvested from connected services and the proximity-ring
//! classification derived from it. It defines the fundamental concepts,
//! value objects, and trait interfaces that all other layers depend upon.
//!
//! ## Key Concepts
//!
//! - **Node**: An entity observed in a connected service (user, issue,
//!   document, channel, message, ...), keyed by `(type, provider, external_id)`
//! - **Edge**: A directed, typed relationship between two nodes, deduplicated
//!   on `(from, to, relation, provider)`
//! - **Ring**: A discrete proximity class (Core/Ring1/Ring2/Beyond) relative
//!   to the anchor user
//! - **Decay**: Temporal discounting of edge weight so stale connections stop
//!   pulling entities close without ever being removed
//! - **Canonical identity**: One person aggregated across provider accounts
//!   by verified email
//!
//! ## Architecture
//!
//! - Pure domain logic only
//! - Infrastructure implementations live in other crates
//! - Trait definitions for all external interactions

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod decay;
pub mod edge;
pub mod identity;
pub mod node;
pub mod ring;
pub mod traits;

// Re-exports for convenience
pub use decay::DecayParams;
pub use edge::{Edge, EdgeId, Relation};
pub use identity::{CanonicalId, IdentityLink};
pub use node::{Node, NodeId, NodeRef, NodeType};
pub use ring::{Ring, RingAssignment, MAX_HOPS, UNREACHED_DISTANCE};
