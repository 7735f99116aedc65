//! Identity resolution - merging provider accounts into canonical people
//!
//! Intentionally conservative: verified email match only, no fuzzy or
//! heuristic matching, because a false merge corrupts the graph's notion of
//! "the same person" irreversibly from the ring engine's perspective.
//! Accounts without an email stay provider-scoped and are treated as
//! distinct people.

use orbit_domain::traits::GraphStore;
use orbit_domain::{CanonicalId, IdentityLink};

/// Resolve a provider account to its canonical identity
///
/// - An existing link for `(provider, provider_user_id)` is always reused;
///   changing it requires [`relink`], never a silent overwrite.
/// - Otherwise, a verified email already linked elsewhere merges this
///   account into that canonical identity.
/// - Otherwise a new canonical identity is minted.
pub fn resolve<S: GraphStore>(
    store: &S,
    provider: &str,
    provider_user_id: &str,
    email: Option<&str>,
    now: u64,
) -> Result<CanonicalId, S::Error> {
    if let Some(existing) = store.identity_for(provider, provider_user_id)? {
        return Ok(existing.canonical_id);
    }

    let email = email.map(|e| e.to_lowercase());
    let canonical_id = match email.as_deref() {
        Some(e) => match store.identity_by_email(e)? {
            Some(existing) => {
                tracing::debug!(
                    "Merging {}:{} into existing identity via email match",
                    provider,
                    provider_user_id
                );
                existing
            }
            None => CanonicalId::new(),
        },
        None => CanonicalId::new(),
    };

    let link = IdentityLink::new(provider, provider_user_id, canonical_id, email.as_deref(), now);
    store.insert_identity_link(&link)?;

    Ok(canonical_id)
}

/// Explicitly re-link a provider account to a different canonical identity
///
/// This is the only path that may change an existing `(provider,
/// provider_user_id)` mapping.
pub fn relink<S: GraphStore>(
    store: &S,
    provider: &str,
    provider_user_id: &str,
    canonical_id: CanonicalId,
    email: Option<&str>,
    now: u64,
) -> Result<(), S::Error> {
    let link = IdentityLink::new(provider, provider_user_id, canonical_id, email, now);
    store.replace_identity_link(&link)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SqliteGraphStore;

    #[test]
    fn test_resolve_mints_new_identity_without_email() {
        let store = SqliteGraphStore::open(":memory:").unwrap();
        let a = resolve(&store, "github", "1234", None, 1000).unwrap();
        let b = resolve(&store, "slack", "U042", None, 1000).unwrap();
        // No email: provider accounts stay distinct people.
        assert_ne!(a, b);
    }

    #[test]
    fn test_resolve_is_stable_per_account() {
        let store = SqliteGraphStore::open(":memory:").unwrap();
        let first = resolve(&store, "github", "1234", None, 1000).unwrap();
        let second = resolve(&store, "github", "1234", None, 2000).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_resolve_merges_on_verified_email() {
        let store = SqliteGraphStore::open(":memory:").unwrap();
        let github = resolve(&store, "github", "1234", Some("alice@example.com"), 1000).unwrap();
        let slack = resolve(&store, "slack", "U042", Some("Alice@Example.com"), 1001).unwrap();
        // Case-insensitive email match merges the accounts.
        assert_eq!(github, slack);
    }

    #[test]
    fn test_late_email_does_not_silently_relink() {
        let store = SqliteGraphStore::open(":memory:").unwrap();
        let without_email = resolve(&store, "github", "1234", None, 1000).unwrap();
        let _other = resolve(&store, "slack", "U042", Some("alice@example.com"), 1001).unwrap();
        // The github account is already linked; a later resolve carrying an
        // email that matches another identity must not move it.
        let again = resolve(&store, "github", "1234", Some("alice@example.com"), 1002).unwrap();
        assert_eq!(without_email, again);
    }

    #[test]
    fn test_relink_is_explicit() {
        let store = SqliteGraphStore::open(":memory:").unwrap();
        let original = resolve(&store, "github", "1234", None, 1000).unwrap();
        let target = CanonicalId::new();

        relink(&store, "github", "1234", target, Some("alice@example.com"), 2000).unwrap();

        let resolved = resolve(&store, "github", "1234", None, 3000).unwrap();
        assert_eq!(resolved, target);
        assert_ne!(resolved, original);
    }
}
