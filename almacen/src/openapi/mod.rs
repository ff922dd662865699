//! OpenAPI documentation configuration.

use utoipa::openapi::security::{ApiKey, ApiKeyValue, Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::api;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "almacen",
        description = "Inventory and part-number control service for manufacturing offices",
    ),
    paths(
        api::handlers::auth::login,
        api::handlers::auth::logout,
        api::handlers::auth::register,
        api::handlers::auth::reset_password,
        api::handlers::auth::me,
        api::handlers::inventory::list_inventory,
        api::handlers::inventory::create_inventory_item,
        api::handlers::inventory::get_inventory_item,
        api::handlers::inventory::update_inventory_item,
        api::handlers::inventory::delete_inventory_item,
        api::handlers::parts::list_partes,
        api::handlers::parts::create_parte,
        api::handlers::parts::get_parte,
        api::handlers::parts::update_parte,
        api::handlers::parts::delete_parte,
    ),
    components(schemas(
        api::models::users::Role,
        api::models::users::CurrentUser,
        api::models::auth::LoginRequest,
        api::models::auth::RegisterRequest,
        api::models::auth::PasswordResetRequest,
        api::models::auth::AuthResponse,
        api::models::auth::AuthSuccessResponse,
        api::models::inventory::InventoryItemCreate,
        api::models::inventory::InventoryItemUpdate,
        api::models::inventory::InventoryItemResponse,
        api::models::inventory::InventoryListResponse,
        api::models::parts::PartNumberCreate,
        api::models::parts::PartNumberUpdate,
        api::models::parts::PartNumberResponse,
    )),
    tags(
        (name = "authentication", description = "Login, sessions and user registration"),
        (name = "inventory", description = "Inventory item management"),
        (name = "partes", description = "Engineering part-number management"),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "CookieAuth",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new("session_token"))),
        );
        components.add_security_scheme("BearerAuth", SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_document_builds() {
        let doc = ApiDoc::openapi();
        let json = serde_json::to_string(&doc).unwrap();
        assert!(json.contains("/inventory/{numero_parte}"));
        assert!(json.contains("/authentication/login"));
    }
}
