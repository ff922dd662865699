//! Collection-scoped CRUD over the backing store.
//!
//! A [`Collection`] is a named partition of the record store. Records are
//! addressed by an opaque string key and carry a short document string plus a
//! JSON object of metadata, which is the actual payload. The store enforces
//! key uniqueness per collection; uniqueness of domain fields (usernames,
//! part numbers) is the caller's responsibility and is checked with a read
//! before the write, which is racy under concurrent writers. Concurrent
//! writes to the same key are last-write-wins.

use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{FromRow, SqlitePool};
use tracing::instrument;
use uuid::Uuid;

use crate::store::errors::{Result, StoreError};

/// The metadata payload of a record: field name to scalar value.
pub type Metadata = serde_json::Map<String, Value>;

/// A single keyed record.
#[derive(Debug, Clone)]
pub struct Record {
    pub key: String,
    pub document: String,
    pub metadata: Metadata,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Raw row shape; metadata is stored as JSON text.
#[derive(Debug, FromRow)]
struct RecordRow {
    key: String,
    document: String,
    metadata: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl RecordRow {
    fn into_record(self, collection: &str) -> Result<Record> {
        let metadata = match serde_json::from_str::<Value>(&self.metadata) {
            Ok(Value::Object(map)) => map,
            _ => {
                return Err(StoreError::Corrupted {
                    collection: collection.to_string(),
                    key: self.key,
                    message: "metadata is not a JSON object".to_string(),
                });
            }
        };

        Ok(Record {
            key: self.key,
            document: self.document,
            metadata,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Offset/limit window for list operations.
#[derive(Debug, Clone, Copy)]
pub struct Page {
    pub skip: i64,
    pub limit: i64,
}

impl Page {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self { skip, limit }
    }
}

// Page size used when walking a whole collection.
const WALK_PAGE_SIZE: i64 = 256;

/// Handle to a named collection. Cheap to clone; all operations go through
/// the shared connection pool.
#[derive(Debug, Clone)]
pub struct Collection {
    pool: SqlitePool,
    name: String,
}

impl Collection {
    pub(crate) fn new(pool: SqlitePool, name: &str) -> Self {
        Self {
            pool,
            name: name.to_string(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Insert a new record. A fresh UUID key is generated when none is given.
    ///
    /// Fails with [`StoreError::DuplicateKey`] if the key already exists,
    /// leaving the existing record unmodified.
    #[instrument(skip(self, document, metadata), fields(collection = %self.name), err)]
    pub async fn add(&self, key: Option<&str>, document: &str, metadata: Metadata) -> Result<Record> {
        let key = key.map(str::to_owned).unwrap_or_else(|| Uuid::new_v4().to_string());
        let now = Utc::now();
        let payload = Value::Object(metadata.clone()).to_string();

        sqlx::query(
            "INSERT INTO records (collection, key, document, metadata, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&self.name)
        .bind(&key)
        .bind(document)
        .bind(&payload)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if StoreError::is_unique_violation(&e) {
                StoreError::DuplicateKey {
                    collection: self.name.clone(),
                    key: key.clone(),
                }
            } else {
                e.into()
            }
        })?;

        Ok(Record {
            key,
            document: document.to_string(),
            metadata,
            created_at: now,
            updated_at: now,
        })
    }

    /// Exact lookup by key. Absence is `None`, not an error.
    #[instrument(skip(self), fields(collection = %self.name), err)]
    pub async fn get(&self, key: &str) -> Result<Option<Record>> {
        let row = sqlx::query_as::<_, RecordRow>(
            "SELECT key, document, metadata, created_at, updated_at
             FROM records WHERE collection = ? AND key = ?",
        )
        .bind(&self.name)
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_record(&self.name)).transpose()
    }

    /// All records whose metadata matches an exact-equality filter on one
    /// field. Insertion-ordered; callers needing another order sort
    /// client-side.
    #[instrument(skip(self, value), fields(collection = %self.name), err)]
    pub async fn find(&self, field: &str, value: &Value) -> Result<Vec<Record>> {
        let path = filter_path(field)?;
        let rows = sqlx::query_as::<_, RecordRow>(
            "SELECT key, document, metadata, created_at, updated_at
             FROM records
             WHERE collection = ? AND json_extract(metadata, ?) = json_extract(?, '$')
             ORDER BY created_at, key",
        )
        .bind(&self.name)
        .bind(&path)
        .bind(value.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(|r| r.into_record(&self.name)).collect()
    }

    /// One page of records in insertion order.
    #[instrument(skip(self, page), fields(collection = %self.name, skip = page.skip, limit = page.limit), err)]
    pub async fn list(&self, page: &Page) -> Result<Vec<Record>> {
        let rows = sqlx::query_as::<_, RecordRow>(
            "SELECT key, document, metadata, created_at, updated_at
             FROM records WHERE collection = ?
             ORDER BY created_at, key
             LIMIT ? OFFSET ?",
        )
        .bind(&self.name)
        .bind(page.limit)
        .bind(page.skip)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(|r| r.into_record(&self.name)).collect()
    }

    /// Every record in the collection, walked page by page so large
    /// collections are never silently truncated.
    #[instrument(skip(self), fields(collection = %self.name), err)]
    pub async fn all(&self) -> Result<Vec<Record>> {
        let mut records = Vec::new();
        let mut skip = 0;
        loop {
            let page = self.list(&Page::new(skip, WALK_PAGE_SIZE)).await?;
            let fetched = page.len() as i64;
            records.extend(page);
            if fetched < WALK_PAGE_SIZE {
                return Ok(records);
            }
            skip += fetched;
        }
    }

    /// Number of records in the collection.
    #[instrument(skip(self), fields(collection = %self.name), err)]
    pub async fn count(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM records WHERE collection = ?")
            .bind(&self.name)
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u64)
    }

    /// Shallow merge-patch of the record's metadata (RFC 7396 semantics:
    /// fields in the patch overwrite, `null` removes). Sending every field
    /// amounts to a full replace. Fails with [`StoreError::NotFound`] when
    /// the key is absent; a missing key is never a silent no-op.
    #[instrument(skip(self, patch), fields(collection = %self.name), err)]
    pub async fn update(&self, key: &str, patch: &Metadata) -> Result<Record> {
        let result = sqlx::query(
            "UPDATE records SET metadata = json_patch(metadata, ?), updated_at = ?
             WHERE collection = ? AND key = ?",
        )
        .bind(Value::Object(patch.clone()).to_string())
        .bind(Utc::now())
        .bind(&self.name)
        .bind(key)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }

        self.get(key).await?.ok_or(StoreError::NotFound)
    }

    /// Insert the record, or replace document and metadata if the key exists.
    #[instrument(skip(self, document, metadata), fields(collection = %self.name), err)]
    pub async fn upsert(&self, key: &str, document: &str, metadata: Metadata) -> Result<Record> {
        let now = Utc::now();
        let payload = Value::Object(metadata.clone()).to_string();

        sqlx::query(
            "INSERT INTO records (collection, key, document, metadata, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)
             ON CONFLICT (collection, key) DO UPDATE SET
                 document = excluded.document,
                 metadata = excluded.metadata,
                 updated_at = excluded.updated_at",
        )
        .bind(&self.name)
        .bind(key)
        .bind(document)
        .bind(&payload)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        self.get(key).await?.ok_or(StoreError::NotFound)
    }

    /// Remove a record by key. Removing an absent key is not an error.
    #[instrument(skip(self), fields(collection = %self.name), err)]
    pub async fn delete(&self, key: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM records WHERE collection = ? AND key = ?")
            .bind(&self.name)
            .bind(key)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Remove every record matching an exact-equality metadata filter.
    /// Matching zero records is success.
    #[instrument(skip(self, value), fields(collection = %self.name), err)]
    pub async fn delete_where(&self, field: &str, value: &Value) -> Result<u64> {
        let path = filter_path(field)?;
        let result = sqlx::query(
            "DELETE FROM records
             WHERE collection = ? AND json_extract(metadata, ?) = json_extract(?, '$')",
        )
        .bind(&self.name)
        .bind(&path)
        .bind(value.to_string())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}

// Filter fields become JSON paths, so only plain identifiers are accepted.
fn filter_path(field: &str) -> Result<String> {
    if field.is_empty() || !field.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(StoreError::InvalidFilter {
            field: field.to_string(),
        });
    }
    Ok(format!("$.{field}"))
}
