//! Identity module - merging provider accounts into canonical people

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a canonical identity, based on UUIDv7
///
/// A canonical identity aggregates one or more provider-specific User nodes
/// believed to be the same person, keyed by verified email.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CanonicalId(u128);

impl CanonicalId {
    /// Mint a new UUIDv7-based canonical identity
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7().as_u128())
    }

    /// Create from a raw u128 value (storage layer deserialization)
    pub fn from_value(value: u128) -> Self {
        Self(value)
    }

    /// Parse from a UUID string
    pub fn from_string(s: &str) -> Result<Self, String> {
        uuid::Uuid::parse_str(s)
            .map(|u| Self(u.as_u128()))
            .map_err(|e| format!("Invalid canonical id: {}", e))
    }

    /// Get the raw u128 value
    pub fn value(&self) -> u128 {
        self.0
    }
}

impl Default for CanonicalId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CanonicalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", uuid::Uuid::from_u128(self.0))
    }
}

/// Mapping from one provider account to a canonical identity
///
/// Invariant: a `(provider, provider_user_id)` pair maps to at most one
/// canonical identity at a time. Re-linking must be explicit, never a
/// silent overwrite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityLink {
    /// Source system name
    pub provider: String,

    /// Provider-native user identifier
    pub provider_user_id: String,

    /// The canonical identity this account belongs to
    pub canonical_id: CanonicalId,

    /// Verified email the link was established on, if any
    pub email: Option<String>,

    /// When the link was established (unix seconds)
    pub linked_at: u64,
}

impl IdentityLink {
    /// Create a new identity link
    pub fn new(
        provider: &str,
        provider_user_id: &str,
        canonical_id: CanonicalId,
        email: Option<&str>,
        linked_at: u64,
    ) -> Self {
        Self {
            provider: provider.to_string(),
            provider_user_id: provider_user_id.to_string(),
            canonical_id,
            email: email.map(|e| e.to_lowercase()),
            linked_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_id_string_roundtrip() {
        let id = CanonicalId::new();
        let parsed = CanonicalId::from_string(&id.to_string()).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_canonical_id_invalid_string() {
        assert!(CanonicalId::from_string("not-a-uuid").is_err());
        assert!(CanonicalId::from_string("").is_err());
    }

    #[test]
    fn test_identity_link_lowercases_email() {
        let link = IdentityLink::new("github", "1234", CanonicalId::new(), Some("Alice@Example.COM"), 1000);
        assert_eq!(link.email.as_deref(), Some("alice@example.com"));
    }

    #[test]
    fn test_canonical_ids_are_unique() {
        let a = CanonicalId::new();
        let b = CanonicalId::new();
        assert_ne!(a, b);
    }
}
