//! API request/response models for inventory items.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::errors::{Error, Result};
use crate::store::models::inventory::{InventoryItemPatch, InventoryItemRecord};

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct InventoryItemCreate {
    pub numero_parte: String,
    pub cantidad: i64,
    pub descripcion: String,
}

impl InventoryItemCreate {
    pub fn validate(&self) -> Result<()> {
        if self.numero_parte.trim().is_empty() {
            return Err(Error::BadRequest {
                message: "numero_parte is required".to_string(),
            });
        }
        if self.cantidad < 0 {
            return Err(Error::BadRequest {
                message: "cantidad must not be negative".to_string(),
            });
        }
        if self.descripcion.trim().is_empty() {
            return Err(Error::BadRequest {
                message: "descripcion is required".to_string(),
            });
        }
        Ok(())
    }
}

impl From<InventoryItemCreate> for InventoryItemRecord {
    fn from(api: InventoryItemCreate) -> Self {
        Self {
            numero_parte: api.numero_parte,
            cantidad: api.cantidad,
            descripcion: api.descripcion,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct InventoryItemUpdate {
    pub cantidad: Option<i64>,
    pub descripcion: Option<String>,
}

impl InventoryItemUpdate {
    pub fn validate(&self) -> Result<()> {
        if let Some(cantidad) = self.cantidad
            && cantidad < 0
        {
            return Err(Error::BadRequest {
                message: "cantidad must not be negative".to_string(),
            });
        }
        if let Some(descripcion) = &self.descripcion
            && descripcion.trim().is_empty()
        {
            return Err(Error::BadRequest {
                message: "descripcion must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

impl From<InventoryItemUpdate> for InventoryItemPatch {
    fn from(api: InventoryItemUpdate) -> Self {
        Self {
            cantidad: api.cantidad,
            descripcion: api.descripcion,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct InventoryItemResponse {
    pub numero_parte: String,
    pub cantidad: i64,
    pub descripcion: String,
}

impl From<InventoryItemRecord> for InventoryItemResponse {
    fn from(record: InventoryItemRecord) -> Self {
        Self {
            numero_parte: record.numero_parte,
            cantidad: record.cantidad,
            descripcion: record.descripcion,
        }
    }
}

/// List payload: items in numeric part-number order.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct InventoryListResponse {
    pub items: Vec<InventoryItemResponse>,
}
