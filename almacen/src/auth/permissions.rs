//! Role-based permission checks for request handlers.

use crate::{
    api::models::users::{CurrentUser, Role},
    errors::{Error, Result},
    types::Operation,
};

/// Require that the user holds one of the allowed roles. Admins pass every
/// check.
pub fn require_any_role(user: &CurrentUser, allowed: &[Role], action: Operation, resource: &str) -> Result<()> {
    if user.is_admin() || allowed.contains(&user.role) {
        return Ok(());
    }

    Err(Error::InsufficientPermissions {
        action,
        resource: resource.to_string(),
    })
}

/// Require the admin role.
pub fn require_admin(user: &CurrentUser, action: Operation, resource: &str) -> Result<()> {
    require_any_role(user, &[Role::Admin], action, resource)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    fn user_with_role(role: Role) -> CurrentUser {
        CurrentUser {
            id: "u".to_string(),
            username: "u".to_string(),
            role,
        }
    }

    #[test]
    fn test_admin_passes_every_check() {
        let admin = user_with_role(Role::Admin);
        assert!(require_any_role(&admin, &[Role::Engineer], Operation::Delete, "parte").is_ok());
        assert!(require_admin(&admin, Operation::Create, "user").is_ok());
    }

    #[test]
    fn test_allowed_role_passes() {
        let engineer = user_with_role(Role::Engineer);
        assert!(require_any_role(&engineer, &[Role::Engineer, Role::Inventory], Operation::Read, "inventory").is_ok());
    }

    #[test]
    fn test_disallowed_role_is_forbidden() {
        let inventory = user_with_role(Role::Inventory);
        let err = require_any_role(&inventory, &[Role::Engineer], Operation::Update, "parte").unwrap_err();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);

        let err = require_admin(&inventory, Operation::Create, "user").unwrap_err();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
    }
}
