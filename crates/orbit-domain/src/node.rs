//! Node module - entities observed in connected services

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Type of an entity in the relationship graph
///
/// This is a closed set: provider-specific object kinds map into these
/// variants rather than growing the taxonomy ad hoc, so traversal and
/// weighting logic stays exhaustively checked at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeType {
    /// A person's account on one provider
    User,

    /// An issue or ticket
    Issue,

    /// A project, repository, or board
    Project,

    /// A document or page
    Document,

    /// A chat channel
    Channel,

    /// A single chat message
    Message,

    /// A pull/merge request
    PullRequest,

    /// A conversation thread
    Thread,
}

impl NodeType {
    /// Get the type name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::User => "user",
            NodeType::Issue => "issue",
            NodeType::Project => "project",
            NodeType::Document => "document",
            NodeType::Channel => "channel",
            NodeType::Message => "message",
            NodeType::PullRequest => "pull_request",
            NodeType::Thread => "thread",
        }
    }

    /// Parse a node type from a string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "user" => Some(NodeType::User),
            "issue" => Some(NodeType::Issue),
            "project" => Some(NodeType::Project),
            "document" => Some(NodeType::Document),
            "channel" => Some(NodeType::Channel),
            "message" => Some(NodeType::Message),
            "pull_request" => Some(NodeType::PullRequest),
            "thread" => Some(NodeType::Thread),
            _ => None,
        }
    }
}

impl std::str::FromStr for NodeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid node type: {}", s))
    }
}

/// Stable identifier for a node
///
/// A `NodeId` is a pure function of `(type, provider, external_id)` and is
/// never reused for a different identity. The lexicographic `Ord` on the
/// rendered form is what traversal uses for deterministic tie-breaking.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(String);

impl NodeId {
    /// Compose the stable id for `(type, provider, external_id)`
    ///
    /// # Examples
    ///
    /// ```
    /// use orbit_domain::{NodeId, NodeType};
    ///
    /// let id = NodeId::compose(NodeType::User, "github", "1234");
    /// assert_eq!(id.as_str(), "user:github:1234");
    /// ```
    pub fn compose(node_type: NodeType, provider: &str, external_id: &str) -> Self {
        Self(format!("{}:{}:{}", node_type.as_str(), provider, external_id))
    }

    /// Wrap an already-rendered id (storage layer deserialization)
    pub fn from_string(s: String) -> Self {
        Self(s)
    }

    /// Get the rendered id
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A reference to an entity as emitted by a connector
///
/// This is the ingestion-side shape: enough to mint or refresh a node, with
/// no graph semantics attached. Connectors are responsible only for correct
/// extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRef {
    /// Entity type
    pub node_type: NodeType,

    /// Source system name (e.g. "github", "slack")
    pub provider: String,

    /// Provider-native identifier
    pub external_id: String,

    /// Human-readable name, if the provider supplies one
    pub display_name: Option<String>,

    /// Opaque key-value bag; on refresh the latest non-empty bag replaces
    /// the stored one wholesale (no key-level merge)
    pub metadata: BTreeMap<String, String>,
}

impl NodeRef {
    /// Create a new node reference
    pub fn new(node_type: NodeType, provider: &str, external_id: &str) -> Self {
        Self {
            node_type,
            provider: provider.to_string(),
            external_id: external_id.to_string(),
            display_name: None,
            metadata: BTreeMap::new(),
        }
    }

    /// Attach a display name
    pub fn with_display_name(mut self, name: &str) -> Self {
        self.display_name = Some(name.to_string());
        self
    }

    /// Attach a metadata bag
    pub fn with_metadata(mut self, metadata: BTreeMap<String, String>) -> Self {
        self.metadata = metadata;
        self
    }

    /// Check the reference is well-formed
    ///
    /// A malformed reference (empty provider or external id) must fail fast
    /// at ingestion rather than silently creating a garbage node.
    pub fn validate(&self) -> Result<(), String> {
        if self.provider.trim().is_empty() {
            return Err("node reference has empty provider".to_string());
        }
        if self.external_id.trim().is_empty() {
            return Err("node reference has empty external_id".to_string());
        }
        Ok(())
    }

    /// The stable id this reference resolves to
    pub fn node_id(&self) -> NodeId {
        NodeId::compose(self.node_type, &self.provider, &self.external_id)
    }
}

/// An entity in the relationship graph
///
/// Invariant: `(provider, external_id)` is unique per type; `first_seen_at`
/// and `last_seen_at` are monotonically non-decreasing, refreshed on every
/// observation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// Stable identifier
    pub id: NodeId,

    /// Entity type
    pub node_type: NodeType,

    /// Source system name
    pub provider: String,

    /// Provider-native identifier
    pub external_id: String,

    /// Human-readable name
    pub display_name: Option<String>,

    /// Opaque key-value bag
    pub metadata: BTreeMap<String, String>,

    /// When this entity was first observed (unix seconds)
    pub first_seen_at: u64,

    /// When this entity was most recently observed (unix seconds)
    pub last_seen_at: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_id_composition() {
        let id = NodeId::compose(NodeType::Issue, "linear", "ENG-42");
        assert_eq!(id.as_str(), "issue:linear:ENG-42");
        assert_eq!(id.to_string(), "issue:linear:ENG-42");
    }

    #[test]
    fn test_node_id_is_deterministic() {
        let a = NodeId::compose(NodeType::User, "github", "1234");
        let b = NodeId::compose(NodeType::User, "github", "1234");
        assert_eq!(a, b);
    }

    #[test]
    fn test_node_id_distinguishes_types() {
        let user = NodeId::compose(NodeType::User, "github", "1234");
        let issue = NodeId::compose(NodeType::Issue, "github", "1234");
        assert_ne!(user, issue);
    }

    #[test]
    fn test_node_id_lexicographic_ordering() {
        let a = NodeId::compose(NodeType::User, "github", "alice");
        let b = NodeId::compose(NodeType::User, "github", "bob");
        assert!(a < b);
    }

    #[test]
    fn test_node_type_roundtrip() {
        for t in [
            NodeType::User,
            NodeType::Issue,
            NodeType::Project,
            NodeType::Document,
            NodeType::Channel,
            NodeType::Message,
            NodeType::PullRequest,
            NodeType::Thread,
        ] {
            assert_eq!(NodeType::parse(t.as_str()), Some(t));
        }
    }

    #[test]
    fn test_node_ref_validation() {
        let ok = NodeRef::new(NodeType::User, "github", "1234");
        assert!(ok.validate().is_ok());

        let no_external = NodeRef::new(NodeType::User, "github", "");
        assert!(no_external.validate().is_err());

        let no_provider = NodeRef::new(NodeType::User, "", "1234");
        assert!(no_provider.validate().is_err());

        let whitespace = NodeRef::new(NodeType::User, "github", "   ");
        assert!(whitespace.validate().is_err());
    }

    #[test]
    fn test_node_ref_resolves_to_composed_id() {
        let r = NodeRef::new(NodeType::Channel, "slack", "C042").with_display_name("#eng");
        assert_eq!(r.node_id(), NodeId::compose(NodeType::Channel, "slack", "C042"));
        assert_eq!(r.display_name.as_deref(), Some("#eng"));
    }

    #[test]
    fn test_node_ref_metadata_bag() {
        let mut bag = BTreeMap::new();
        bag.insert("team".to_string(), "platform".to_string());
        let r = NodeRef::new(NodeType::User, "github", "alice").with_metadata(bag.clone());
        assert_eq!(r.metadata, bag);
        assert!(NodeRef::new(NodeType::User, "github", "alice").metadata.is_empty());
    }
}
