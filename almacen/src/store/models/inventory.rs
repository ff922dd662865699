//! Store models for inventory item records.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::store::errors::{Result, StoreError};
use crate::store::models::to_metadata;
use crate::store::records::{Metadata, Record};

/// Name of the backing collection for inventory items.
pub const INVENTORY_COLLECTION: &str = "inventory";

/// An inventory item as persisted in the `inventory` collection.
///
/// Keyed by `item_{numero_parte}`; `numero_parte` is domain-unique.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryItemRecord {
    pub numero_parte: String,
    pub cantidad: i64,
    #[serde(default)]
    pub descripcion: String,
}

impl InventoryItemRecord {
    /// Record key for a part number.
    pub fn key(numero_parte: &str) -> String {
        format!("item_{numero_parte}")
    }

    pub fn from_record(record: &Record) -> Result<Self> {
        serde_json::from_value(Value::Object(record.metadata.clone())).map_err(|e| StoreError::Corrupted {
            collection: INVENTORY_COLLECTION.to_string(),
            key: record.key.clone(),
            message: e.to_string(),
        })
    }

    pub fn metadata(&self) -> Metadata {
        to_metadata(self)
    }
}

/// Partial update of an inventory item. The part number itself is the
/// record's identity and cannot be patched.
#[derive(Debug, Clone, Default)]
pub struct InventoryItemPatch {
    pub cantidad: Option<i64>,
    pub descripcion: Option<String>,
}

impl InventoryItemPatch {
    pub fn metadata(&self) -> Metadata {
        let mut patch = Metadata::new();
        if let Some(cantidad) = self.cantidad {
            patch.insert("cantidad".to_string(), Value::from(cantidad));
        }
        if let Some(descripcion) = &self.descripcion {
            patch.insert("descripcion".to_string(), Value::String(descripcion.clone()));
        }
        patch
    }
}

/// Sort key for part numbers: numeric when the part number parses as an
/// integer, lexicographic otherwise, with numeric parts first.
pub(crate) fn part_number_sort_key(numero_parte: &str) -> (i64, String) {
    (
        numero_parte.parse::<i64>().unwrap_or(i64::MAX),
        numero_parte.to_string(),
    )
}
