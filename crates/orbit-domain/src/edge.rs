//! Edge module - directed, typed relationships between nodes

use crate::node::NodeId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Type of relationship between two nodes
///
/// A closed set: provider-specific facts map into these variants.
/// Direction encodes semantic meaning (who assigned whom), not graph
/// distance - traversal treats edges as bidirectional.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Relation {
    /// Issue/task assigned to a user
    AssignedTo,

    /// User authored a document, issue, message, or change
    AuthorOf,

    /// User was mentioned in an entity
    MentionedIn,

    /// User reviews a pull request
    ReviewerOf,

    /// User is a member of a channel or project
    MemberOf,

    /// Entity belongs to a parent container (issue -> project)
    BelongsTo,

    /// Message posted in a channel
    PostedIn,

    /// Structural parent/child between entities
    ChildOf,

    /// One entity depends on another
    DependsOn,

    /// One entity blocks another
    Blocks,

    /// Free-form cross-reference between entities
    References,

    /// Message/entity belongs to a conversation thread
    ThreadOf,
}

impl Relation {
    /// Get the relation name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Relation::AssignedTo => "assigned_to",
            Relation::AuthorOf => "author_of",
            Relation::MentionedIn => "mentioned_in",
            Relation::ReviewerOf => "reviewer_of",
            Relation::MemberOf => "member_of",
            Relation::BelongsTo => "belongs_to",
            Relation::PostedIn => "posted_in",
            Relation::ChildOf => "child_of",
            Relation::DependsOn => "depends_on",
            Relation::Blocks => "blocks",
            Relation::References => "references",
            Relation::ThreadOf => "thread_of",
        }
    }

    /// Parse a relation from a string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "assigned_to" => Some(Relation::AssignedTo),
            "author_of" => Some(Relation::AuthorOf),
            "mentioned_in" => Some(Relation::MentionedIn),
            "reviewer_of" => Some(Relation::ReviewerOf),
            "member_of" => Some(Relation::MemberOf),
            "belongs_to" => Some(Relation::BelongsTo),
            "posted_in" => Some(Relation::PostedIn),
            "child_of" => Some(Relation::ChildOf),
            "depends_on" => Some(Relation::DependsOn),
            "blocks" => Some(Relation::Blocks),
            "references" => Some(Relation::References),
            "thread_of" => Some(Relation::ThreadOf),
            _ => None,
        }
    }

    /// All relation variants, in declaration order
    pub fn all() -> [Relation; 12] {
        [
            Relation::AssignedTo,
            Relation::AuthorOf,
            Relation::MentionedIn,
            Relation::ReviewerOf,
            Relation::MemberOf,
            Relation::BelongsTo,
            Relation::PostedIn,
            Relation::ChildOf,
            Relation::DependsOn,
            Relation::Blocks,
            Relation::References,
            Relation::ThreadOf,
        ]
    }
}

impl std::str::FromStr for Relation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid relation: {}", s))
    }
}

/// Storage-assigned identifier for an edge row
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EdgeId(i64);

impl EdgeId {
    /// Wrap a storage row id
    pub fn from_value(value: i64) -> Self {
        Self(value)
    }

    /// Get the raw row id
    pub fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A directed, typed relationship between two nodes
///
/// Invariant: `(from, to, relation, provider)` is unique. Re-observing the
/// same fact refreshes `observed_at`/`weight` on the existing row rather
/// than duplicating it. Edges are never deleted by normal operation; they
/// age out of relevance via decay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    /// Source node id
    pub from: NodeId,

    /// Target node id
    pub to: NodeId,

    /// Relationship type
    pub relation: Relation,

    /// Source system that observed the fact
    pub provider: String,

    /// Timestamp of the fact itself, not of ingestion (unix seconds)
    pub observed_at: u64,

    /// Raw edge weight; defaults to the relation's base weight
    pub weight: f64,

    /// Opaque key-value bag
    pub metadata: BTreeMap<String, String>,
}

impl Edge {
    /// Create a new edge with the relation's base weight
    pub fn new(from: NodeId, to: NodeId, relation: Relation, provider: &str, observed_at: u64) -> Self {
        Self {
            from,
            to,
            relation,
            provider: provider.to_string(),
            observed_at,
            weight: relation.base_weight(),
            metadata: BTreeMap::new(),
        }
    }

    /// Override the raw weight
    ///
    /// Fails for weights that are not strictly positive finite numbers.
    /// Connector input is untrusted, so a bad weight is a validation error
    /// to skip and count, never a panic.
    pub fn with_weight(mut self, weight: f64) -> Result<Self, String> {
        if !weight.is_finite() || weight <= 0.0 {
            return Err(format!(
                "edge weight must be a positive finite number, got {}",
                weight
            ));
        }
        self.weight = weight;
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeType;

    #[test]
    fn test_relation_roundtrip() {
        for r in Relation::all() {
            assert_eq!(Relation::parse(r.as_str()), Some(r));
        }
    }

    #[test]
    fn test_relation_parse_unknown() {
        assert_eq!(Relation::parse("follows"), None);
        assert_eq!(Relation::parse(""), None);
    }

    #[test]
    fn test_edge_defaults_to_base_weight() {
        let a = NodeId::compose(NodeType::User, "github", "alice");
        let b = NodeId::compose(NodeType::Issue, "github", "42");
        let edge = Edge::new(a, b, Relation::AuthorOf, "github", 1000);
        assert_eq!(edge.weight, Relation::AuthorOf.base_weight());
        assert_eq!(edge.observed_at, 1000);
    }

    #[test]
    fn test_with_weight_overrides_base() {
        let a = NodeId::compose(NodeType::User, "github", "alice");
        let b = NodeId::compose(NodeType::Issue, "github", "42");
        let edge = Edge::new(a, b, Relation::AuthorOf, "github", 1000)
            .with_weight(0.3)
            .unwrap();
        assert_eq!(edge.weight, 0.3);
    }

    #[test]
    fn test_with_weight_rejects_bad_values() {
        let a = NodeId::compose(NodeType::User, "github", "alice");
        let b = NodeId::compose(NodeType::Issue, "github", "42");
        let edge = Edge::new(a, b, Relation::AuthorOf, "github", 1000);

        assert!(edge.clone().with_weight(0.0).is_err());
        assert!(edge.clone().with_weight(-1.0).is_err());
        assert!(edge.clone().with_weight(f64::NAN).is_err());
        assert!(edge.clone().with_weight(f64::INFINITY).is_err());
    }
}
