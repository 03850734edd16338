//! # Document Store
//!
//! Collection-scoped JSON documents on top of one SQLite table.
//!
//! ## Write Model
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  WriteBatch                                                             │
//! │  ├── insert(c, id, v)              fails if (c, id) exists             │
//! │  ├── upsert(c, id, v)              version + 1, last write wins        │
//! │  └── replace_if_version(c, id, v, n)  only if stored version == n      │
//! │                                                                         │
//! │  DocumentStore::commit(batch)                                          │
//! │    BEGIN ─► every write ─► COMMIT ─► publish one change per write      │
//! │              │                                                          │
//! │              └── any failure: ROLLBACK, nothing published               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A read-modify-write is: `get_versioned` → compute → `replace_if_version`.
//! If somebody else wrote in between, the commit fails with
//! [`DbError::Conflict`] and the caller re-reads.

use std::fmt;

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::debug;

use crate::changes::{ChangeFeed, CollectionChange};
use crate::error::{DbError, DbResult};

/// Attempts made by read-modify-write operations before giving up.
pub const MAX_CAS_ATTEMPTS: usize = 5;

// =============================================================================
// Collections
// =============================================================================

/// The persisted collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Sales,
    /// Keyed by VIN.
    Vehicles,
    Users,
    Dealerships,
    /// Keyed by `{month}-{entityId}-{type}`.
    Goals,
    TransferRequests,
    /// Keyed by the `{model}-{province}` slug.
    DemandForecasts,
    /// Holds the single `dashboard` snapshot.
    Metrics,
}

impl Collection {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Collection::Sales => "sales",
            Collection::Vehicles => "vehicles",
            Collection::Users => "users",
            Collection::Dealerships => "dealerships",
            Collection::Goals => "goals",
            Collection::TransferRequests => "transfer_requests",
            Collection::DemandForecasts => "demand_forecasts",
            Collection::Metrics => "metrics",
        }
    }

    pub const fn triggers_recompute(&self) -> bool {
        matches!(
            self,
            Collection::Sales
                | Collection::Vehicles
                | Collection::Users
                | Collection::Dealerships
                | Collection::Goals
        )
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decoded document and the version it was read at.
#[derive(Debug, Clone, PartialEq)]
pub struct Versioned<T> {
    pub value: T,
    pub version: i64,
}

// =============================================================================
// Write Batch
// =============================================================================

#[derive(Debug, Clone, Copy)]
enum WriteMode {
    Insert,
    Upsert,
    IfVersion(i64),
}

#[derive(Debug, Clone)]
struct DocumentWrite {
    collection: Collection,
    id: String,
    body: String,
    mode: WriteMode,
}

/// Writes committed together in one transaction.
#[derive(Debug, Default)]
pub struct WriteBatch {
    writes: Vec<DocumentWrite>,
}

impl WriteBatch {
    pub fn new() -> Self {
        WriteBatch::default()
    }

    fn push<T: Serialize>(
        &mut self,
        collection: Collection,
        id: impl Into<String>,
        value: &T,
        mode: WriteMode,
    ) -> DbResult<&mut Self> {
        self.writes.push(DocumentWrite {
            collection,
            id: id.into(),
            body: serde_json::to_string(value)?,
            mode,
        });
        Ok(self)
    }

    /// Creates a document that must not exist yet.
    pub fn insert<T: Serialize>(
        &mut self,
        collection: Collection,
        id: impl Into<String>,
        value: &T,
    ) -> DbResult<&mut Self> {
        self.push(collection, id, value, WriteMode::Insert)
    }

    /// Creates or fully replaces a document.
    pub fn upsert<T: Serialize>(
        &mut self,
        collection: Collection,
        id: impl Into<String>,
        value: &T,
    ) -> DbResult<&mut Self> {
        self.push(collection, id, value, WriteMode::Upsert)
    }

    /// Replaces a document only if it is still at `expected_version`.
    pub fn replace_if_version<T: Serialize>(
        &mut self,
        collection: Collection,
        id: impl Into<String>,
        value: &T,
        expected_version: i64,
    ) -> DbResult<&mut Self> {
        self.push(collection, id, value, WriteMode::IfVersion(expected_version))
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }
}

// =============================================================================
// Document Store
// =============================================================================

/// Typed access to the `documents` table.
#[derive(Debug, Clone)]
pub struct DocumentStore {
    pool: SqlitePool,
    changes: ChangeFeed,
}

impl DocumentStore {
    pub fn new(pool: SqlitePool, changes: ChangeFeed) -> Self {
        DocumentStore { pool, changes }
    }

    /// Every document of a collection, ordered by id.
    pub async fn get_all<T: DeserializeOwned>(&self, collection: Collection) -> DbResult<Vec<T>> {
        let bodies: Vec<(String,)> =
            sqlx::query_as("SELECT body FROM documents WHERE collection = ?1 ORDER BY id")
                .bind(collection.as_str())
                .fetch_all(&self.pool)
                .await?;

        debug!(collection = %collection, count = bodies.len(), "Loaded collection");

        bodies
            .iter()
            .map(|(body,)| serde_json::from_str(body).map_err(DbError::from))
            .collect()
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        collection: Collection,
        id: &str,
    ) -> DbResult<Option<T>> {
        Ok(self
            .get_versioned(collection, id)
            .await?
            .map(|stored| stored.value))
    }

    pub async fn get_versioned<T: DeserializeOwned>(
        &self,
        collection: Collection,
        id: &str,
    ) -> DbResult<Option<Versioned<T>>> {
        let row: Option<(String, i64)> =
            sqlx::query_as("SELECT body, version FROM documents WHERE collection = ?1 AND id = ?2")
                .bind(collection.as_str())
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        match row {
            Some((body, version)) => Ok(Some(Versioned {
                value: serde_json::from_str(&body)?,
                version,
            })),
            None => Ok(None),
        }
    }

    pub async fn count(&self, collection: Collection) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM documents WHERE collection = ?1")
            .bind(collection.as_str())
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Creates or replaces one document.
    pub async fn set<T: Serialize>(
        &self,
        collection: Collection,
        id: &str,
        value: &T,
    ) -> DbResult<()> {
        let mut batch = WriteBatch::new();
        batch.upsert(collection, id, value)?;
        self.commit(batch).await
    }

    /// Removes a document. Returns whether it existed.
    pub async fn delete(&self, collection: Collection, id: &str) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = ?1 AND id = ?2")
            .bind(collection.as_str())
            .bind(id)
            .execute(&self.pool)
            .await?;

        let existed = result.rows_affected() > 0;
        if existed {
            self.changes.publish(CollectionChange {
                collection,
                document_id: id.to_string(),
            });
        }
        Ok(existed)
    }

    /// Applies every write of `batch` atomically, then announces them.
    pub async fn commit(&self, batch: WriteBatch) -> DbResult<()> {
        if batch.is_empty() {
            return Ok(());
        }

        let now = Utc::now().to_rfc3339();
        let mut tx = self.pool.begin().await?;

        for write in &batch.writes {
            let collection = write.collection.as_str();
            match write.mode {
                WriteMode::Insert => {
                    sqlx::query(
                        "INSERT INTO documents (collection, id, body, version, updated_at) \
                         VALUES (?1, ?2, ?3, 1, ?4)",
                    )
                    .bind(collection)
                    .bind(&write.id)
                    .bind(&write.body)
                    .bind(&now)
                    .execute(&mut *tx)
                    .await
                    .map_err(|e| match DbError::from(e) {
                        DbError::UniqueViolation { .. } => {
                            DbError::duplicate(format!("{} id", collection), write.id.clone())
                        }
                        other => other,
                    })?;
                }
                WriteMode::Upsert => {
                    sqlx::query(
                        "INSERT INTO documents (collection, id, body, version, updated_at) \
                         VALUES (?1, ?2, ?3, 1, ?4) \
                         ON CONFLICT (collection, id) DO UPDATE SET \
                             body = excluded.body, \
                             version = documents.version + 1, \
                             updated_at = excluded.updated_at",
                    )
                    .bind(collection)
                    .bind(&write.id)
                    .bind(&write.body)
                    .bind(&now)
                    .execute(&mut *tx)
                    .await?;
                }
                WriteMode::IfVersion(expected) => {
                    let result = sqlx::query(
                        "UPDATE documents SET body = ?3, version = version + 1, updated_at = ?4 \
                         WHERE collection = ?1 AND id = ?2 AND version = ?5",
                    )
                    .bind(collection)
                    .bind(&write.id)
                    .bind(&write.body)
                    .bind(&now)
                    .bind(expected)
                    .execute(&mut *tx)
                    .await?;

                    if result.rows_affected() == 0 {
                        debug!(collection, id = %write.id, expected, "Version check failed");
                        // Dropping `tx` rolls back the earlier writes
                        return Err(DbError::conflict(collection, write.id.clone()));
                    }
                }
            }
        }

        tx.commit().await?;

        debug!(writes = batch.len(), "Batch committed");
        for write in batch.writes {
            self.changes.publish(CollectionChange {
                collection: write.collection,
                document_id: write.id,
            });
        }
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
