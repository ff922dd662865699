//! API request/response models for engineering part numbers.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::errors::{Error, Result};
use crate::store::models::parts::{PartNumberPatch, PartNumberRecord};

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct PartNumberCreate {
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

impl PartNumberCreate {
    pub fn validate(&self) -> Result<()> {
        if self.cliente.trim().is_empty() || self.numero_parte.trim().is_empty() {
            return Err(Error::BadRequest {
                message: "cliente and numero_parte are required".to_string(),
            });
        }
        if self.peso < 0.0 {
            return Err(Error::BadRequest {
                message: "peso must not be negative".to_string(),
            });
        }
        Ok(())
    }
}

impl From<PartNumberCreate> for PartNumberRecord {
    fn from(api: PartNumberCreate) -> Self {
        Self {
            cliente: api.cliente,
            numero_parte: api.numero_parte,
            descripcion_ingles: api.descripcion_ingles,
            descripcion_espanol: api.descripcion_espanol,
            unidad_medida: api.unidad_medida,
            peso: api.peso,
            unidad_peso: api.unidad_peso,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct PartNumberUpdate {
    pub cliente: Option<String>,
    pub descripcion_ingles: Option<String>,
    pub descripcion_espanol: Option<String>,
    pub unidad_medida: Option<String>,
    pub peso: Option<f64>,
    pub unidad_peso: Option<String>,
}

impl PartNumberUpdate {
    pub fn validate(&self) -> Result<()> {
        if let Some(cliente) = &self.cliente
            && cliente.trim().is_empty()
        {
            return Err(Error::BadRequest {
                message: "cliente must not be empty".to_string(),
            });
        }
        if let Some(peso) = self.peso
            && peso < 0.0
        {
            return Err(Error::BadRequest {
                message: "peso must not be negative".to_string(),
            });
        }
        Ok(())
    }
}

impl From<PartNumberUpdate> for PartNumberPatch {
    fn from(api: PartNumberUpdate) -> Self {
        Self {
            cliente: api.cliente,
            descripcion_ingles: api.descripcion_ingles,
            descripcion_espanol: api.descripcion_espanol,
            unidad_medida: api.unidad_medida,
            peso: api.peso,
            unidad_peso: api.unidad_peso,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PartNumberResponse {
    pub cliente: String,
    pub numero_parte: String,
    pub descripcion_ingles: String,
    pub descripcion_espanol: String,
    pub unidad_medida: String,
    pub peso: f64,
    pub unidad_peso: String,
}

impl From<PartNumberRecord> for PartNumberResponse {
    fn from(record: PartNumberRecord) -> Self {
        Self {
            cliente: record.cliente,
            numero_parte: record.numero_parte,
            descripcion_ingles: record.descripcion_ingles,
            descripcion_espanol: record.descripcion_espanol,
            unidad_medida: record.unidad_medida,
            peso: record.peso,
            unidad_peso: record.unidad_peso,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_requires_cliente_and_numero_parte() {
        let create = PartNumberCreate {
            cliente: "ACME".to_string(),
            numero_parte: "9001".to_string(),
            descripcion_ingles: String::new(),
            descripcion_espanol: String::new(),
            unidad_medida: String::new(),
            peso: 0.0,
            unidad_peso: String::new(),
        };
        assert!(create.validate().is_ok());

        let missing_cliente = PartNumberCreate {
            cliente: " ".to_string(),
            ..create.clone()
        };
        assert!(missing_cliente.validate().is_err());

        let missing_parte = PartNumberCreate {
            numero_parte: String::new(),
            ..create
        };
        assert!(missing_parte.validate().is_err());
    }
}
