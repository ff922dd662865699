//! Base repository trait for typed collection access.

use async_trait::async_trait;

/// A repository is the typed data access layer for one collection. It
/// provides methods for creating, reading, updating and deleting records,
/// as well as listing them with simple filters.
use crate::store::errors::Result;

/// Base repository trait providing common record store operations.
///
/// This trait has separate associated types for create requests, update
/// requests, and responses.
#[async_trait]
pub trait Repository {
    /// The request type for creating records
    type CreateRequest: Sync;

    /// The request type for updating records
    type UpdateRequest: Sync;

    /// The response/DTO type returned by operations
    type Response;

    /// The identifier type for lookups
    type Id: Sync + ?Sized;

    /// The filter type for list operations
    type Filter: Sync;

    /// Create a new record
    async fn create(&self, request: &Self::CreateRequest) -> Result<Self::Response>;

    /// Get a record by ID
    async fn get(&self, id: &Self::Id) -> Result<Option<Self::Response>>;

    /// List records with filtering and pagination
    async fn list(&self, filter: &Self::Filter) -> Result<Vec<Self::Response>>;

    /// Update a record by ID
    async fn update(&self, id: &Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response>;

    /// Delete a record by ID
    async fn delete(&self, id: &Self::Id) -> Result<bool>;
}
