//! Store models for engineering part-number records.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::store::errors::{Result, StoreError};
use crate::store::models::to_metadata;
use crate::store::records::{Metadata, Record};

/// Name of the backing collection for part-number records.
pub const PARTES_COLLECTION: &str = "partes";

/// An engineering part-number record as persisted in the `partes`
/// collection. Keyed by a generated UUID; `numero_parte` is domain-unique
/// and is how the API addresses these records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartNumberRecord {
    pub cliente: String,
    pub numero_parte: String,
    #[serde(default)]
    pub descripcion_ingles: String,
    #[serde(default)]
    pub descripcion_espanol: String,
    #[serde(default)]
    pub unidad_medida: String,
    #[serde(default)]
    pub peso: f64,
    #[serde(default)]
    pub unidad_peso: String,
}

impl PartNumberRecord {
    /// Stored document text, used as the record's searchable label.
    pub fn document(&self) -> String {
        format!(
            "{}: {} / {}",
            self.numero_parte, self.descripcion_ingles, self.descripcion_espanol
        )
    }

    pub fn from_record(record: &Record) -> Result<Self> {
        serde_json::from_value(Value::Object(record.metadata.clone())).map_err(|e| StoreError::Corrupted {
            collection: PARTES_COLLECTION.to_string(),
            key: record.key.clone(),
            message: e.to_string(),
        })
    }

    pub fn metadata(&self) -> Metadata {
        to_metadata(self)
    }
}

/// Partial update of a part-number record. The part number itself is how
/// records are addressed and cannot be patched.
#[derive(Debug, Clone, Default)]
pub struct PartNumberPatch {
    pub cliente: Option<String>,
    pub descripcion_ingles: Option<String>,
    pub descripcion_espanol: Option<String>,
    pub unidad_medida: Option<String>,
    pub peso: Option<f64>,
    pub unidad_peso: Option<String>,
}

impl PartNumberPatch {
    pub fn metadata(&self) -> Metadata {
        let mut patch = Metadata::new();
        if let Some(cliente) = &self.cliente {
            patch.insert("cliente".to_string(), Value::String(cliente.clone()));
        }
        if let Some(descripcion) = &self.descripcion_ingles {
            patch.insert("descripcion_ingles".to_string(), Value::String(descripcion.clone()));
        }
        if let Some(descripcion) = &self.descripcion_espanol {
            patch.insert("descripcion_espanol".to_string(), Value::String(descripcion.clone()));
        }
        if let Some(unidad) = &self.unidad_medida {
            patch.insert("unidad_medida".to_string(), Value::String(unidad.clone()));
        }
        if let Some(peso) = self.peso {
            patch.insert("peso".to_string(), Value::from(peso));
        }
        if let Some(unidad) = &self.unidad_peso {
            patch.insert("unidad_peso".to_string(), Value::String(unidad.clone()));
        }
        patch
    }
}
