//! Orbit Storage Layer
//!
//! Implements the [`GraphStore`] trait over SQLite: durable, deduplicated
//! storage of nodes, edges, identity links, pin overrides, and the
//! persisted ring-assignment snapshot.
//!
//! # Architecture
//!
//! - SQLite for all structured graph data
//! - Upsert-merge semantics everywhere: duplicate-key "violations" are
//!   normal refresh behavior, never failures
//! - No traversal logic; adjacency primitives are indexed lookups
//!
//! # Examples
//!
//! ```no_run
//! use orbit_store::SqliteGraphStore;
//!
//! let store = SqliteGraphStore::open(":memory:").unwrap();
//! // Store is now ready for graph operations
//! ```

#![warn(missing_docs)]

pub mod ingest;
pub mod resolver;

use orbit_domain::traits::{GraphStore, GraphView};
use orbit_domain::{
    CanonicalId, Edge, EdgeId, IdentityLink, Node, NodeId, NodeRef, NodeType, Relation, Ring,
    RingAssignment,
};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Malformed node or edge reference, rejected at ingestion
    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    /// Invalid data format read back from storage
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Provider account already linked to a canonical identity;
    /// re-linking must be explicit
    #[error("Account {provider}:{provider_user_id} is already linked; use replace_identity_link")]
    AlreadyLinked {
        /// Source system name
        provider: String,
        /// Provider-native user identifier
        provider_user_id: String,
    },

    /// Connection mutex poisoned by a panicking writer
    #[error("Store connection poisoned")]
    Poisoned,
}

/// SQLite-based implementation of [`GraphStore`]
///
/// # Thread Safety
///
/// The connection sits behind a `Mutex`, so the store is `Send + Sync`:
/// concurrent connector sync tasks share one instance and writes serialize
/// at the connection. Traversal reads whole adjacency lists per call and
/// holds the lock only for the duration of each query.
pub struct SqliteGraphStore {
    conn: Mutex<Connection>,
}

impl SqliteGraphStore {
    /// Open a store at the given database path
    ///
    /// Use `:memory:` for an in-memory database (useful for testing).
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Initialize the database schema
    fn initialize_schema(&self) -> Result<(), StoreError> {
        let schema = include_str!("schema.sql");
        self.conn()?.execute_batch(schema)?;
        Ok(())
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }

    /// Convert CanonicalId to bytes for storage
    fn canonical_id_to_bytes(id: CanonicalId) -> Vec<u8> {
        id.value().to_be_bytes().to_vec()
    }

    /// Convert bytes to CanonicalId
    fn bytes_to_canonical_id(bytes: &[u8]) -> Result<CanonicalId, StoreError> {
        if bytes.len() != 16 {
            return Err(StoreError::InvalidData(format!(
                "Expected 16 bytes for CanonicalId, got {}",
                bytes.len()
            )));
        }
        let mut arr = [0u8; 16];
        arr.copy_from_slice(bytes);
        Ok(CanonicalId::from_value(u128::from_be_bytes(arr)))
    }

    fn metadata_to_json(metadata: &BTreeMap<String, String>) -> Result<String, StoreError> {
        serde_json::to_string(metadata)
            .map_err(|e| StoreError::InvalidData(format!("Unserializable metadata: {}", e)))
    }

    fn json_to_metadata(json: &str) -> Result<BTreeMap<String, String>, StoreError> {
        serde_json::from_str(json)
            .map_err(|e| StoreError::InvalidData(format!("Corrupt metadata json: {}", e)))
    }

    fn map_edge_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Edge> {
        let relation_str: String = row.get(2)?;
        let relation = Relation::parse(&relation_str).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                2,
                rusqlite::types::Type::Text,
                Box::new(StoreError::InvalidData(format!(
                    "Unknown relation: {}",
                    relation_str
                ))),
            )
        })?;
        let metadata_json: String = row.get(6)?;
        let metadata = Self::json_to_metadata(&metadata_json).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(6, rusqlite::types::Type::Text, Box::new(e))
        })?;

        Ok(Edge {
            from: NodeId::from_string(row.get(0)?),
            to: NodeId::from_string(row.get(1)?),
            relation,
            provider: row.get(3)?,
            observed_at: row.get::<_, i64>(4)? as u64,
            weight: row.get(5)?,
            metadata,
        })
    }
}

impl GraphStore for SqliteGraphStore {
    type Error = StoreError;

    fn upsert_node(&self, node: &NodeRef, now: u64) -> Result<NodeId, Self::Error> {
        node.validate().map_err(StoreError::InvalidReference)?;

        let id = node.node_id();
        let metadata_json = Self::metadata_to_json(&node.metadata)?;
        // An empty incoming bag never clobbers stored metadata; a non-empty
        // one replaces it wholesale (no key-level merge).
        self.conn()?.execute(
            "INSERT INTO nodes (id, node_type, provider, external_id, display_name, metadata, first_seen_at, last_seen_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
             ON CONFLICT(id) DO UPDATE SET
             last_seen_at = MAX(last_seen_at, excluded.last_seen_at),
             display_name = COALESCE(excluded.display_name, display_name),
             metadata = CASE WHEN excluded.metadata != '{}' THEN excluded.metadata ELSE metadata END",
            params![
                id.as_str(),
                node.node_type.as_str(),
                &node.provider,
                &node.external_id,
                node.display_name.as_deref(),
                metadata_json,
                now as i64,
            ],
        )?;

        Ok(id)
    }

    fn get_node(&self, id: &NodeId) -> Result<Option<Node>, Self::Error> {
        let node = self
            .conn()?
            .query_row(
                "SELECT id, node_type, provider, external_id, display_name, metadata, first_seen_at, last_seen_at
                 FROM nodes WHERE id = ?1",
                params![id.as_str()],
                |row| {
                    let type_str: String = row.get(1)?;
                    let node_type = NodeType::parse(&type_str).ok_or_else(|| {
                        rusqlite::Error::FromSqlConversionFailure(
                            1,
                            rusqlite::types::Type::Text,
                            Box::new(StoreError::InvalidData(format!(
                                "Unknown node type: {}",
                                type_str
                            ))),
                        )
                    })?;
                    let metadata_json: String = row.get(5)?;
                    let metadata = Self::json_to_metadata(&metadata_json).map_err(|e| {
                        rusqlite::Error::FromSqlConversionFailure(
                            5,
                            rusqlite::types::Type::Text,
                            Box::new(e),
                        )
                    })?;

                    Ok(Node {
                        id: NodeId::from_string(row.get(0)?),
                        node_type,
                        provider: row.get(2)?,
                        external_id: row.get(3)?,
                        display_name: row.get(4)?,
                        metadata,
                        first_seen_at: row.get::<_, i64>(6)? as u64,
                        last_seen_at: row.get::<_, i64>(7)? as u64,
                    })
                },
            )
            .optional()?;

        Ok(node)
    }

    fn node_ids(&self) -> Result<Vec<NodeId>, Self::Error> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT id FROM nodes ORDER BY id")?;
        let ids = stmt
            .query_map([], |row| Ok(NodeId::from_string(row.get(0)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ids)
    }

    fn upsert_edge(&self, edge: &Edge) -> Result<EdgeId, Self::Error> {
        if edge.from.as_str().is_empty() || edge.to.as_str().is_empty() {
            return Err(StoreError::InvalidReference(
                "edge endpoint has empty node id".to_string(),
            ));
        }

        let metadata_json = Self::metadata_to_json(&edge.metadata)?;
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO edges (from_id, to_id, relation, provider, observed_at, weight, metadata)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(from_id, to_id, relation, provider) DO UPDATE SET
             observed_at = MAX(observed_at, excluded.observed_at),
             weight = MAX(weight, excluded.weight)",
            params![
                edge.from.as_str(),
                edge.to.as_str(),
                edge.relation.as_str(),
                &edge.provider,
                edge.observed_at as i64,
                edge.weight,
                metadata_json,
            ],
        )?;

        let id: i64 = conn.query_row(
            "SELECT id FROM edges WHERE from_id = ?1 AND to_id = ?2 AND relation = ?3 AND provider = ?4",
            params![
                edge.from.as_str(),
                edge.to.as_str(),
                edge.relation.as_str(),
                &edge.provider,
            ],
            |row| row.get(0),
        )?;

        Ok(EdgeId::from_value(id))
    }

    fn edges_from(&self, id: &NodeId) -> Result<Vec<Edge>, Self::Error> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT from_id, to_id, relation, provider, observed_at, weight, metadata
             FROM edges WHERE from_id = ?1",
        )?;
        let edges = stmt
            .query_map(params![id.as_str()], Self::map_edge_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(edges)
    }

    fn edges_to(&self, id: &NodeId) -> Result<Vec<Edge>, Self::Error> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT from_id, to_id, relation, provider, observed_at, weight, metadata
             FROM edges WHERE to_id = ?1",
        )?;
        let edges = stmt
            .query_map(params![id.as_str()], Self::map_edge_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(edges)
    }

    fn edge_count(&self) -> Result<u64, Self::Error> {
        let count: i64 = self
            .conn()?
            .query_row("SELECT COUNT(*) FROM edges", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn graph_view(&self) -> Result<GraphView, Self::Error> {
        // One guard across all three reads: writers serialize on the same
        // mutex, so nothing can interleave between them.
        let conn = self.conn()?;

        let mut stmt = conn.prepare("SELECT id FROM nodes ORDER BY id")?;
        let nodes = stmt
            .query_map([], |row| Ok(NodeId::from_string(row.get(0)?)))?
            .collect::<Result<Vec<_>, _>>()?;

        let mut stmt = conn.prepare(
            "SELECT from_id, to_id, relation, provider, observed_at, weight, metadata FROM edges",
        )?;
        let edges = stmt
            .query_map([], Self::map_edge_row)?
            .collect::<Result<Vec<_>, _>>()?;

        let mut stmt = conn.prepare("SELECT node_id FROM pins")?;
        let pins = stmt
            .query_map([], |row| Ok(NodeId::from_string(row.get(0)?)))?
            .collect::<Result<BTreeSet<_>, _>>()?;

        Ok(GraphView { nodes, edges, pins })
    }

    fn set_pin(&self, id: &NodeId, pinned: bool) -> Result<(), Self::Error> {
        let conn = self.conn()?;
        if pinned {
            conn.execute(
                "INSERT INTO pins (node_id, pinned_at) VALUES (?1, strftime('%s','now'))
                 ON CONFLICT(node_id) DO NOTHING",
                params![id.as_str()],
            )?;
        } else {
            conn.execute("DELETE FROM pins WHERE node_id = ?1", params![id.as_str()])?;
        }
        Ok(())
    }

    fn pinned_nodes(&self) -> Result<BTreeSet<NodeId>, Self::Error> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT node_id FROM pins")?;
        let pins = stmt
            .query_map([], |row| Ok(NodeId::from_string(row.get(0)?)))?
            .collect::<Result<BTreeSet<_>, _>>()?;
        Ok(pins)
    }

    fn identity_for(
        &self,
        provider: &str,
        provider_user_id: &str,
    ) -> Result<Option<IdentityLink>, Self::Error> {
        let link = self
            .conn()?
            .query_row(
                "SELECT provider, provider_user_id, canonical_id, email, linked_at
                 FROM identity_links WHERE provider = ?1 AND provider_user_id = ?2",
                params![provider, provider_user_id],
                |row| {
                    let id_bytes: Vec<u8> = row.get(2)?;
                    let canonical_id = Self::bytes_to_canonical_id(&id_bytes).map_err(|e| {
                        rusqlite::Error::FromSqlConversionFailure(
                            2,
                            rusqlite::types::Type::Blob,
                            Box::new(e),
                        )
                    })?;
                    Ok(IdentityLink {
                        provider: row.get(0)?,
                        provider_user_id: row.get(1)?,
                        canonical_id,
                        email: row.get(3)?,
                        linked_at: row.get::<_, i64>(4)? as u64,
                    })
                },
            )
            .optional()?;

        Ok(link)
    }

    fn identity_by_email(&self, email: &str) -> Result<Option<CanonicalId>, Self::Error> {
        let id = self
            .conn()?
            .query_row(
                "SELECT canonical_id FROM identity_links WHERE email = ?1 LIMIT 1",
                params![email.to_lowercase()],
                |row| {
                    let id_bytes: Vec<u8> = row.get(0)?;
                    Self::bytes_to_canonical_id(&id_bytes).map_err(|e| {
                        rusqlite::Error::FromSqlConversionFailure(
                            0,
                            rusqlite::types::Type::Blob,
                            Box::new(e),
                        )
                    })
                },
            )
            .optional()?;

        Ok(id)
    }

    fn insert_identity_link(&self, link: &IdentityLink) -> Result<(), Self::Error> {
        if self.identity_for(&link.provider, &link.provider_user_id)?.is_some() {
            return Err(StoreError::AlreadyLinked {
                provider: link.provider.clone(),
                provider_user_id: link.provider_user_id.clone(),
            });
        }

        self.conn()?.execute(
            "INSERT INTO identity_links (provider, provider_user_id, canonical_id, email, linked_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                &link.provider,
                &link.provider_user_id,
                Self::canonical_id_to_bytes(link.canonical_id),
                link.email.as_deref(),
                link.linked_at as i64,
            ],
        )?;

        Ok(())
    }

    fn replace_identity_link(&self, link: &IdentityLink) -> Result<(), Self::Error> {
        self.conn()?.execute(
            "INSERT INTO identity_links (provider, provider_user_id, canonical_id, email, linked_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(provider, provider_user_id) DO UPDATE SET
             canonical_id = excluded.canonical_id,
             email = excluded.email,
             linked_at = excluded.linked_at",
            params![
                &link.provider,
                &link.provider_user_id,
                Self::canonical_id_to_bytes(link.canonical_id),
                link.email.as_deref(),
                link.linked_at as i64,
            ],
        )?;

        Ok(())
    }

    fn replace_assignments(&self, assignments: &[RingAssignment]) -> Result<(), Self::Error> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        tx.execute("DELETE FROM ring_assignments", [])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO ring_assignments (node_id, ring, distance, effective_distance, path, pinned, computed_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?;
            for a in assignments {
                let path: Vec<&str> = a.path.iter().map(|n| n.as_str()).collect();
                let path_json = serde_json::to_string(&path)
                    .map_err(|e| StoreError::InvalidData(format!("Unserializable path: {}", e)))?;
                // Infinite effective distance (unreached) persists as NULL.
                let effective: Option<f64> =
                    a.effective_distance.is_finite().then_some(a.effective_distance);
                stmt.execute(params![
                    a.node.as_str(),
                    a.ring.as_str(),
                    a.distance as i64,
                    effective,
                    path_json,
                    a.pinned as i64,
                    a.computed_at as i64,
                ])?;
            }
        }

        tx.commit()?;
        Ok(())
    }

    fn load_assignments(&self) -> Result<Vec<RingAssignment>, Self::Error> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT node_id, ring, distance, effective_distance, path, pinned, computed_at
             FROM ring_assignments",
        )?;

        let assignments = stmt
            .query_map([], |row| {
                let ring_str: String = row.get(1)?;
                let ring = Ring::parse(&ring_str).ok_or_else(|| {
                    rusqlite::Error::FromSqlConversionFailure(
                        1,
                        rusqlite::types::Type::Text,
                        Box::new(StoreError::InvalidData(format!("Unknown ring: {}", ring_str))),
                    )
                })?;
                let effective: Option<f64> = row.get(3)?;
                let path_json: String = row.get(4)?;
                let path: Vec<String> = serde_json::from_str(&path_json).map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(
                        4,
                        rusqlite::types::Type::Text,
                        Box::new(StoreError::InvalidData(format!("Corrupt path json: {}", e))),
                    )
                })?;

                Ok(RingAssignment {
                    node: NodeId::from_string(row.get(0)?),
                    ring,
                    distance: row.get::<_, i64>(2)? as u32,
                    effective_distance: effective.unwrap_or(f64::INFINITY),
                    path: path.into_iter().map(NodeId::from_string).collect(),
                    pinned: row.get::<_, i64>(5)? != 0,
                    computed_at: row.get::<_, i64>(6)? as u64,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(assignments)
    }
}
