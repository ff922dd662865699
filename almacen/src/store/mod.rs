//! Record store layer for data persistence and access.
//!
//! The store is a collection-scoped document/metadata store backed by an
//! embedded SQLite database. It is used purely as a key + metadata store:
//! exact lookups, exact-equality metadata filters, and offset pagination.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  (API request handlers)
//! └──────┬──────┘
//!        │
//!        ↓
//! ┌─────────────┐
//! │ Repositories│  (store::handlers - typed per-collection access)
//! └──────┬──────┘
//!        │
//!        ↓
//! ┌─────────────┐
//! │ Collections │  (store::records - generic keyed CRUD)
//! └──────┬──────┘
//!        │
//!        ↓
//! ┌─────────────┐
//! │   SQLite    │
//! └─────────────┘
//! ```
//!
//! # Modules
//!
//! - [`records`]: Generic collection handles and the [`Record`] shape
//! - [`handlers`]: Typed repositories for the `users`, `inventory` and
//!   `partes` collections
//! - [`models`]: Per-collection record schemas validated at the boundary
//! - [`errors`]: Store-specific error types
//!
//! # Consistency
//!
//! A single logical writer per collection is assumed. Operations are atomic
//! per key only; there are no multi-key transactions. Concurrent writers to
//! the same key are last-write-wins, and read-check-then-write uniqueness
//! checks (usernames, part numbers) are racy under concurrent writers.

pub mod errors;
pub mod handlers;
pub mod models;
pub mod records;

use std::path::Path;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use tracing::{info, instrument};

use crate::store::errors::Result;
pub use crate::store::errors::StoreError;
pub use crate::store::records::{Collection, Metadata, Page, Record};

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Handle to the backing store. Collections are created lazily on first
/// access via [`RecordStore::collection`].
#[derive(Debug, Clone)]
pub struct RecordStore {
    pool: SqlitePool,
}

impl RecordStore {
    /// Open (or create) the store at the given path and run migrations.
    ///
    /// Backing-store unavailability here is fatal and surfaced to the
    /// caller; nothing is retried.
    #[instrument(skip_all, err)]
    pub async fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::Other(anyhow::Error::new(e).context("create store directory")))?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new().max_connections(5).connect_with(options).await?;
        MIGRATOR.run(&pool).await?;

        info!("Record store opened at {}", path.display());
        Ok(Self { pool })
    }

    /// Open an ephemeral in-memory store. Used by tests; the single
    /// long-lived connection keeps the database alive for the pool's
    /// lifetime.
    pub async fn open_in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .in_memory(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        MIGRATOR.run(&pool).await?;

        Ok(Self { pool })
    }

    /// Get a handle to a named collection, creating it if absent.
    /// Idempotent.
    #[instrument(skip(self), err)]
    pub async fn collection(&self, name: &str) -> Result<Collection> {
        sqlx::query("INSERT INTO collections (name, created_at) VALUES (?, ?) ON CONFLICT (name) DO NOTHING")
            .bind(name)
            .bind(chrono::Utc::now())
            .execute(&self.pool)
            .await?;

        Ok(Collection::new(self.pool.clone(), name))
    }

    /// Close the underlying connection pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_collection_is_idempotent() {
        let store = RecordStore::open_in_memory().await.unwrap();

        let first = store.collection("users").await.unwrap();
        let second = store.collection("users").await.unwrap();
        assert_eq!(first.name(), second.name());
    }

    #[tokio::test]
    async fn test_open_creates_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("almacen.db");

        let store = RecordStore::open(&path).await.unwrap();
        store.collection("users").await.unwrap();
        assert!(path.exists());

        store.close().await;
    }

    #[tokio::test]
    async fn test_reopen_preserves_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("almacen.db");

        {
            let store = RecordStore::open(&path).await.unwrap();
            let col = store.collection("inventory").await.unwrap();
            col.add(Some("item_1"), "widget", Metadata::new()).await.unwrap();
            store.close().await;
        }

        let store = RecordStore::open(&path).await.unwrap();
        let col = store.collection("inventory").await.unwrap();
        assert!(col.get("item_1").await.unwrap().is_some());
        store.close().await;
    }
}
