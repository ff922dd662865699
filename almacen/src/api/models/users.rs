//! API models for users and roles.

use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::store::models::users::AuthenticatedUser;

/// Role enum for the different job functions in the office.
///
/// `admin` passes every permission check; the other roles gate the
/// inventory and engineering surfaces.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Engineer,
    Inventory,
    User,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Must match the serde representation; role strings are persisted
        match self {
            Role::Admin => write!(f, "admin"),
            Role::Engineer => write!(f, "engineer"),
            Role::Inventory => write!(f, "inventory"),
            Role::User => write!(f, "user"),
        }
    }
}

/// The authenticated user attached to a request, reconstructed from the
/// session token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct CurrentUser {
    pub id: String,
    pub username: String,
    pub role: Role,
}

impl CurrentUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

impl From<AuthenticatedUser> for CurrentUser {
    fn from(user: AuthenticatedUser) -> Self {
        Self {
            id: user.id,
            username: user.username,
            role: user.role,
        }
    }
}
