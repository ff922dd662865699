//! Repository for inventory items.

use async_trait::async_trait;
use serde_json::Value;
use tracing::instrument;

use crate::store::RecordStore;
use crate::store::errors::{Result, StoreError};
use crate::store::handlers::repository::Repository;
use crate::store::models::inventory::{
    INVENTORY_COLLECTION, InventoryItemPatch, InventoryItemRecord, part_number_sort_key,
};
use crate::store::records::{Collection, Page};

pub struct InventoryItems {
    records: Collection,
}

impl InventoryItems {
    pub fn new(records: Collection) -> Self {
        Self { records }
    }

    /// Open the repository against the `inventory` collection, creating the
    /// collection if needed.
    pub async fn open(store: &RecordStore) -> Result<Self> {
        Ok(Self::new(store.collection(INVENTORY_COLLECTION).await?))
    }
}

#[async_trait]
impl Repository for InventoryItems {
    type CreateRequest = InventoryItemRecord;
    type UpdateRequest = InventoryItemPatch;
    type Response = InventoryItemRecord;
    type Id = str;
    type Filter = Page;

    /// Create an item keyed by `item_{numero_parte}`. Part numbers are
    /// domain-unique: a metadata check runs before the insert, and the key
    /// uniqueness of the store backs it up.
    #[instrument(skip(self, request), fields(numero_parte = %request.numero_parte), err)]
    async fn create(&self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let existing = self
            .records
            .find("numero_parte", &Value::String(request.numero_parte.clone()))
            .await?;
        if !existing.is_empty() {
            return Err(StoreError::DuplicateKey {
                collection: INVENTORY_COLLECTION.to_string(),
                key: request.numero_parte.clone(),
            });
        }

        let key = InventoryItemRecord::key(&request.numero_parte);
        self.records
            .add(Some(&key), &request.descripcion, request.metadata())
            .await?;
        Ok(request.clone())
    }

    #[instrument(skip(self), err)]
    async fn get(&self, numero_parte: &str) -> Result<Option<Self::Response>> {
        self.records
            .get(&InventoryItemRecord::key(numero_parte))
            .await?
            .as_ref()
            .map(InventoryItemRecord::from_record)
            .transpose()
    }

    /// List items in numeric part-number order. The store itself is
    /// insertion-ordered, so the sort happens here, over the full
    /// collection, before the page window is applied.
    #[instrument(skip(self, filter), fields(skip = filter.skip, limit = filter.limit), err)]
    async fn list(&self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut items = self
            .records
            .all()
            .await?
            .iter()
            .map(InventoryItemRecord::from_record)
            .collect::<Result<Vec<_>>>()?;

        items.sort_by_key(|item| part_number_sort_key(&item.numero_parte));

        Ok(items
            .into_iter()
            .skip(filter.skip.max(0) as usize)
            .take(filter.limit.max(0) as usize)
            .collect())
    }

    #[instrument(skip(self, request), err)]
    async fn update(&self, numero_parte: &str, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let record = self
            .records
            .update(&InventoryItemRecord::key(numero_parte), &request.metadata())
            .await?;
        InventoryItemRecord::from_record(&record)
    }

    #[instrument(skip(self), err)]
    async fn delete(&self, numero_parte: &str) -> Result<bool> {
        self.records.delete(&InventoryItemRecord::key(numero_parte)).await
    }
}
