//! Authentication and authorization.
//!
//! Credentials are checked against Argon2 hashes stored with the user
//! record; successful logins get an HS256 JWT carried in an HttpOnly
//! session cookie (or as a bearer token for API clients). Role checks
//! happen in the handlers via [`permissions`].
//!
//! - [`password`]: Argon2 hashing and verification
//! - [`session`]: JWT claims, token creation and verification
//! - [`current_user`]: the [`crate::api::models::users::CurrentUser`]
//!   request extractor
//! - [`permissions`]: role checks

pub mod current_user;
pub mod password;
pub mod permissions;
pub mod session;
