//! API request and response data models.
//!
//! This module contains the data structures used for HTTP request
//! deserialization and response serialization. These models define the
//! public API contract.
//!
//! # Design Principles
//!
//! - **Separation of Concerns**: API models are distinct from store models,
//!   allowing independent evolution of API and storage representations
//! - **Validation**: malformed shapes are rejected at the boundary with
//!   client-facing messages
//! - **OpenAPI**: all models are annotated with `utoipa` for automatic API
//!   docs

pub mod auth;
pub mod inventory;
pub mod pagination;
pub mod parts;
pub mod users;
