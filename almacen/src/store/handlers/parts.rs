//! Repository for engineering part-number records.

use async_trait::async_trait;
use serde_json::Value;
use tracing::instrument;

use crate::store::RecordStore;
use crate::store::errors::{Result, StoreError};
use crate::store::handlers::repository::Repository;
use crate::store::models::inventory::part_number_sort_key;
use crate::store::models::parts::{PARTES_COLLECTION, PartNumberPatch, PartNumberRecord};
use crate::store::records::{Collection, Page, Record};

pub struct PartNumbers {
    records: Collection,
}

impl PartNumbers {
    pub fn new(records: Collection) -> Self {
        Self { records }
    }

    /// Open the repository against the `partes` collection, creating the
    /// collection if needed.
    pub async fn open(store: &RecordStore) -> Result<Self> {
        Ok(Self::new(store.collection(PARTES_COLLECTION).await?))
    }

    // Records are keyed by generated UUIDs, so addressing by part number
    // always goes through a metadata filter.
    async fn find_record(&self, numero_parte: &str) -> Result<Option<Record>> {
        let matches = self
            .records
            .find("numero_parte", &Value::String(numero_parte.to_string()))
            .await?;
        Ok(matches.into_iter().next())
    }
}

#[async_trait]
impl Repository for PartNumbers {
    type CreateRequest = PartNumberRecord;
    type UpdateRequest = PartNumberPatch;
    type Response = PartNumberRecord;
    type Id = str;
    type Filter = Page;

    /// Create a part-number record under a fresh UUID key. Part numbers are
    /// domain-unique.
    #[instrument(skip(self, request), fields(numero_parte = %request.numero_parte), err)]
    async fn create(&self, request: &Self::CreateRequest) -> Result<Self::Response> {
        if self.find_record(&request.numero_parte).await?.is_some() {
            return Err(StoreError::DuplicateKey {
                collection: PARTES_COLLECTION.to_string(),
                key: request.numero_parte.clone(),
            });
        }

        self.records
            .add(None, &request.document(), request.metadata())
            .await?;
        Ok(request.clone())
    }

    #[instrument(skip(self), err)]
    async fn get(&self, numero_parte: &str) -> Result<Option<Self::Response>> {
        self.find_record(numero_parte)
            .await?
            .as_ref()
            .map(PartNumberRecord::from_record)
            .transpose()
    }

    /// List part numbers sorted by part number (numeric first).
    #[instrument(skip(self, filter), fields(skip = filter.skip, limit = filter.limit), err)]
    async fn list(&self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut parts = self
            .records
            .all()
            .await?
            .iter()
            .map(PartNumberRecord::from_record)
            .collect::<Result<Vec<_>>>()?;

        parts.sort_by_key(|part| part_number_sort_key(&part.numero_parte));

        Ok(parts
            .into_iter()
            .skip(filter.skip.max(0) as usize)
            .take(filter.limit.max(0) as usize)
            .collect())
    }

    #[instrument(skip(self, request), err)]
    async fn update(&self, numero_parte: &str, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let record = self.find_record(numero_parte).await?.ok_or(StoreError::NotFound)?;
        let updated = self.records.update(&record.key, &request.metadata()).await?;
        PartNumberRecord::from_record(&updated)
    }

    /// Delete by part-number filter. Matching zero records is success.
    #[instrument(skip(self), err)]
    async fn delete(&self, numero_parte: &str) -> Result<bool> {
        let removed = self
            .records
            .delete_where("numero_parte", &Value::String(numero_parte.to_string()))
            .await?;
        Ok(removed > 0)
    }
}
