//! Store models for user records.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::models::users::Role;
use crate::store::errors::{Result, StoreError};
use crate::store::models::to_metadata;
use crate::store::records::{Metadata, Record};

/// Name of the backing collection for user records.
pub const USERS_COLLECTION: &str = "users";

/// A user record as persisted in the `users` collection.
///
/// The record key is the username, and `id == key` is the invariant going
/// forward; legacy records missing `id` are tolerated on read and backfilled
/// by [`crate::store::handlers::Users::migrate_legacy_ids`].
#[derive(Debug, Clone, Serialize)]
pub struct UserRecord {
    pub id: String,
    pub username: String,
    /// Argon2 hash. Plaintext is never persisted.
    pub password: String,
    pub role: Role,
}

// Tolerant shape for reads: `id` may be absent on legacy records.
#[derive(Debug, Deserialize)]
struct RawUserRecord {
    id: Option<String>,
    username: String,
    password: String,
    role: Role,
}

impl UserRecord {
    /// Parse a user out of a raw record, falling back to the record key when
    /// the legacy `id` field is missing.
    pub fn from_record(record: &Record) -> Result<Self> {
        let raw: RawUserRecord =
            serde_json::from_value(Value::Object(record.metadata.clone())).map_err(|e| StoreError::Corrupted {
                collection: USERS_COLLECTION.to_string(),
                key: record.key.clone(),
                message: e.to_string(),
            })?;

        Ok(Self {
            id: raw.id.unwrap_or_else(|| record.key.clone()),
            username: raw.username,
            password: raw.password,
            role: raw.role,
        })
    }

    pub fn metadata(&self) -> Metadata {
        to_metadata(self)
    }
}

/// Request for creating a new user record. The password arrives pre-hashed;
/// hashing happens at the caller so the plaintext never crosses this layer.
#[derive(Debug, Clone)]
pub struct UserCreateRequest {
    pub username: String,
    pub password_hash: String,
    pub role: Role,
}

/// Partial update of a user record.
#[derive(Debug, Clone, Default)]
pub struct UserUpdateRequest {
    pub password_hash: Option<String>,
    pub role: Option<Role>,
}

impl UserUpdateRequest {
    pub fn metadata(&self) -> Metadata {
        let mut patch = Metadata::new();
        if let Some(hash) = &self.password_hash {
            patch.insert("password".to_string(), Value::String(hash.clone()));
        }
        if let Some(role) = self.role {
            patch.insert("role".to_string(), Value::String(role.to_string()));
        }
        patch
    }
}

/// The result of a successful credential check.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AuthenticatedUser {
    pub id: String,
    pub username: String,
    pub role: Role,
}

impl From<UserRecord> for AuthenticatedUser {
    fn from(user: UserRecord) -> Self {
        Self {
            id: user.id,
            username: user.username,
            role: user.role,
        }
    }
}
