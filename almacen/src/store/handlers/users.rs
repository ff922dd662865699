//! Repository for user records: CRUD plus credential checks, password
//! resets and legacy-record migration.

use anyhow::anyhow;
use async_trait::async_trait;
use serde_json::Value;
use tracing::{info, instrument};

use crate::auth::password;
use crate::store::errors::{Result, StoreError};
use crate::store::handlers::repository::Repository;
use crate::store::models::users::{AuthenticatedUser, USERS_COLLECTION, UserCreateRequest, UserRecord, UserUpdateRequest};
use crate::store::records::{Collection, Page, Record};
use crate::store::RecordStore;

pub struct Users {
    records: Collection,
}

impl Users {
    pub fn new(records: Collection) -> Self {
        Self { records }
    }

    /// Open the repository against the `users` collection, creating the
    /// collection if needed.
    pub async fn open(store: &RecordStore) -> Result<Self> {
        Ok(Self::new(store.collection(USERS_COLLECTION).await?))
    }

    async fn find_record_by_username(&self, username: &str) -> Result<Option<Record>> {
        let matches = self.records.find("username", &Value::String(username.to_string())).await?;
        Ok(matches.into_iter().next())
    }

    /// Look a user up by exact username match.
    #[instrument(skip(self), err)]
    pub async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>> {
        self.find_record_by_username(username)
            .await?
            .as_ref()
            .map(UserRecord::from_record)
            .transpose()
    }

    /// Verify a username/password pair against the stored hash.
    ///
    /// Fails with [`StoreError::InvalidCredentials`] on any mismatch or
    /// missing record; callers can never tell an unknown username apart
    /// from a wrong password. Verification runs on a blocking thread.
    #[instrument(skip(self, password), err)]
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<AuthenticatedUser> {
        let user = self
            .find_by_username(username)
            .await?
            .ok_or(StoreError::InvalidCredentials)?;

        let candidate = password.to_string();
        let hash = user.password.clone();
        let is_valid = tokio::task::spawn_blocking(move || password::verify_string(&candidate, &hash))
            .await
            .map_err(|e| StoreError::Other(anyhow!("join password verification task: {e}")))??;

        if !is_valid {
            return Err(StoreError::InvalidCredentials);
        }

        Ok(AuthenticatedUser::from(user))
    }

    /// Rehash and replace the stored password hash for a user.
    ///
    /// Fails with [`StoreError::NotFound`] if the username is unknown.
    #[instrument(skip(self, new_password), err)]
    pub async fn reset_password(&self, username: &str, new_password: &str) -> Result<()> {
        let record = self
            .find_record_by_username(username)
            .await?
            .ok_or(StoreError::NotFound)?;

        let new_password = new_password.to_string();
        let hash = tokio::task::spawn_blocking(move || password::hash_string(&new_password))
            .await
            .map_err(|e| StoreError::Other(anyhow!("join password hashing task: {e}")))??;

        let patch = UserUpdateRequest {
            password_hash: Some(hash),
            role: None,
        };
        // Patch by the record key rather than metadata.id: the two may still
        // diverge on unmigrated legacy records.
        self.records.update(&record.key, &patch.metadata()).await?;
        Ok(())
    }

    /// Backfill `metadata.id` from the record key for every user record
    /// missing it. Returns the number of records rewritten; running twice
    /// is a no-op the second time.
    #[instrument(skip(self), err)]
    pub async fn migrate_legacy_ids(&self) -> Result<u64> {
        let mut migrated = 0;
        for record in self.records.all().await? {
            if record.metadata.contains_key("id") {
                continue;
            }

            let mut patch = crate::store::records::Metadata::new();
            patch.insert("id".to_string(), Value::String(record.key.clone()));
            self.records.update(&record.key, &patch).await?;
            info!(key = %record.key, "backfilled id on legacy user record");
            migrated += 1;
        }
        Ok(migrated)
    }
}

#[async_trait]
impl Repository for Users {
    type CreateRequest = UserCreateRequest;
    type UpdateRequest = UserUpdateRequest;
    type Response = UserRecord;
    type Id = str;
    type Filter = Page;

    /// Create a user keyed by username. The store's key uniqueness doubles
    /// as the username uniqueness check here.
    #[instrument(skip(self, request), fields(username = %request.username), err)]
    async fn create(&self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let user = UserRecord {
            id: request.username.clone(),
            username: request.username.clone(),
            password: request.password_hash.clone(),
            role: request.role,
        };

        self.records
            .add(Some(&request.username), &request.username, user.metadata())
            .await?;
        Ok(user)
    }

    #[instrument(skip(self), err)]
    async fn get(&self, id: &str) -> Result<Option<Self::Response>> {
        self.records
            .get(id)
            .await?
            .as_ref()
            .map(UserRecord::from_record)
            .transpose()
    }

    #[instrument(skip(self, filter), fields(skip = filter.skip, limit = filter.limit), err)]
    async fn list(&self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        self.records
            .list(filter)
            .await?
            .iter()
            .map(UserRecord::from_record)
            .collect()
    }

    #[instrument(skip(self, request), err)]
    async fn update(&self, id: &str, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let record = self.records.update(id, &request.metadata()).await?;
        UserRecord::from_record(&record)
    }

    #[instrument(skip(self), err)]
    async fn delete(&self, id: &str) -> Result<bool> {
        self.records.delete(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::users::Role;
    use crate::store::models::to_metadata;
    use serde_json::json;

    async fn test_users() -> Users {
        let store = RecordStore::open_in_memory().await.unwrap();
        Users::open(&store).await.unwrap()
    }

    async fn create_user(users: &Users, username: &str, password: &str, role: Role) -> UserRecord {
        let hash = password::hash_string(password).unwrap();
        users
            .create(&UserCreateRequest {
                username: username.to_string(),
                password_hash: hash,
                role,
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_authenticate_roundtrip() {
        let users = test_users().await;
        create_user(&users, "alice", "secret123", Role::User).await;

        let authenticated = users.authenticate("alice", "secret123").await.unwrap();
        assert_eq!(authenticated.id, "alice");
        assert_eq!(authenticated.username, "alice");
        assert_eq!(authenticated.role, Role::User);
    }

    #[tokio::test]
    async fn test_authenticate_wrong_password() {
        let users = test_users().await;
        create_user(&users, "alice", "secret123", Role::User).await;

        let err = users.authenticate("alice", "wrong").await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_authenticate_unknown_user_same_error() {
        let users = test_users().await;

        let err = users.authenticate("nobody", "whatever").await.unwrap_err();
        // The unknown-user case must be indistinguishable from a wrong password
        assert!(matches!(err, StoreError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_duplicate_username_rejected() {
        let users = test_users().await;
        create_user(&users, "alice", "secret123", Role::User).await;

        let hash = password::hash_string("otherpass").unwrap();
        let err = users
            .create(&UserCreateRequest {
                username: "alice".to_string(),
                password_hash: hash,
                role: Role::Engineer,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateKey { ref key, .. } if key == "alice"));

        // The original record survives untouched
        let existing = users.get("alice").await.unwrap().unwrap();
        assert_eq!(existing.role, Role::User);
    }

    #[tokio::test]
    async fn test_reset_password() {
        let users = test_users().await;
        create_user(&users, "alice", "old-password", Role::User).await;

        users.reset_password("alice", "new-password").await.unwrap();

        assert!(users.authenticate("alice", "old-password").await.is_err());
        let authenticated = users.authenticate("alice", "new-password").await.unwrap();
        assert_eq!(authenticated.id, "alice");
    }

    #[tokio::test]
    async fn test_reset_password_unknown_user() {
        let users = test_users().await;
        let err = users.reset_password("nobody", "whatever").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound));
    }

    #[tokio::test]
    async fn test_migrate_legacy_ids_is_idempotent() {
        let store = RecordStore::open_in_memory().await.unwrap();
        let collection = store.collection(USERS_COLLECTION).await.unwrap();
        let users = Users::open(&store).await.unwrap();

        // Seed a legacy record written before ids were stored in metadata
        let hash = password::hash_string("legacy-pass").unwrap();
        let legacy = to_metadata(&json!({
            "username": "legacy",
            "password": hash,
            "role": "inventory",
        }));
        collection.add(Some("legacy"), "legacy", legacy).await.unwrap();
        create_user(&users, "modern", "modern-pass", Role::User).await;

        let migrated = users.migrate_legacy_ids().await.unwrap();
        assert_eq!(migrated, 1);

        let legacy_user = users.get("legacy").await.unwrap().unwrap();
        assert_eq!(legacy_user.id, "legacy");
        let raw = collection.get("legacy").await.unwrap().unwrap();
        assert_eq!(raw.metadata["id"], json!("legacy"));

        // Second run is a no-op
        let migrated = users.migrate_legacy_ids().await.unwrap();
        assert_eq!(migrated, 0);

        // Migration never breaks authentication
        let authenticated = users.authenticate("legacy", "legacy-pass").await.unwrap();
        assert_eq!(authenticated.id, "legacy");
        assert_eq!(authenticated.role, Role::Inventory);
    }

    #[tokio::test]
    async fn test_update_role() {
        let users = test_users().await;
        create_user(&users, "alice", "secret123", Role::Inventory).await;

        let updated = users
            .update(
                "alice",
                &UserUpdateRequest {
                    password_hash: None,
                    role: Some(Role::Engineer),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.role, Role::Engineer);

        // Password is unchanged by a role-only patch
        users.authenticate("alice", "secret123").await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_user() {
        let users = test_users().await;
        create_user(&users, "alice", "secret123", Role::User).await;

        assert!(users.delete("alice").await.unwrap());
        assert!(users.get("alice").await.unwrap().is_none());
        assert!(!users.delete("alice").await.unwrap());
    }
}
