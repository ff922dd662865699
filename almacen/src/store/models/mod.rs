//! Per-collection record schemas.
//!
//! The backing store is schemaless; these models pin an explicit schema per
//! collection and are validated at the boundary when records are read back,
//! so silent field drift shows up as a [`crate::store::StoreError::Corrupted`]
//! error instead of a missing-key panic downstream.

pub mod inventory;
pub mod parts;
pub mod users;

use serde::Serialize;
use serde_json::Value;

use crate::store::records::Metadata;

/// Serialize a schema struct into a record metadata map.
pub(crate) fn to_metadata<T: Serialize>(value: &T) -> Metadata {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => map,
        // Schema structs always serialize to objects
        _ => Metadata::new(),
    }
}
