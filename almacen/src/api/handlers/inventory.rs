use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

use crate::{
    AppState,
    api::models::{
        inventory::{InventoryItemCreate, InventoryItemResponse, InventoryItemUpdate, InventoryListResponse},
        pagination::Pagination,
        users::{CurrentUser, Role},
    },
    auth::permissions::require_any_role,
    errors::{Error, Result},
    store::StoreError,
    store::handlers::{InventoryItems, Repository},
    types::Operation,
};

// Everyone working the floor can read and record material; edits are for
// engineering, deletions for admins.
const READ_ROLES: &[Role] = &[Role::Admin, Role::Engineer, Role::Inventory];
const WRITE_ROLES: &[Role] = &[Role::Admin, Role::Engineer];

fn not_found(numero_parte: &str) -> Error {
    Error::NotFound {
        resource: "Inventory item".to_string(),
        id: numero_parte.to_string(),
    }
}

#[utoipa::path(
    get,
    path = "/inventory",
    tag = "inventory",
    summary = "List inventory items",
    params(Pagination),
    responses(
        (status = 200, description = "Inventory items in part-number order", body = InventoryListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Insufficient role"),
    ),
    security(("CookieAuth" = []), ("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_inventory(
    State(state): State<AppState>,
    Query(pagination): Query<Pagination>,
    current_user: CurrentUser,
) -> Result<Json<InventoryListResponse>> {
    require_any_role(&current_user, READ_ROLES, Operation::Read, "inventory")?;

    let repo = InventoryItems::open(&state.store).await?;
    let items = repo.list(&pagination.page()).await?;

    Ok(Json(InventoryListResponse {
        items: items.into_iter().map(InventoryItemResponse::from).collect(),
    }))
}

#[utoipa::path(
    post,
    path = "/inventory",
    tag = "inventory",
    summary = "Add inventory item",
    request_body = InventoryItemCreate,
    responses(
        (status = 201, description = "Item added", body = InventoryItemResponse),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Part number already exists"),
    ),
    security(("CookieAuth" = []), ("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_inventory_item(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(create): Json<InventoryItemCreate>,
) -> Result<(StatusCode, Json<InventoryItemResponse>)> {
    require_any_role(&current_user, READ_ROLES, Operation::Create, "inventory")?;
    create.validate()?;

    let repo = InventoryItems::open(&state.store).await?;
    let item = repo.create(&create.into()).await?;

    Ok((StatusCode::CREATED, Json(InventoryItemResponse::from(item))))
}

#[utoipa::path(
    get,
    path = "/inventory/{numero_parte}",
    tag = "inventory",
    summary = "Get inventory item",
    params(("numero_parte" = String, Path, description = "Part number")),
    responses(
        (status = 200, description = "Inventory item", body = InventoryItemResponse),
        (status = 404, description = "Item not found"),
    ),
    security(("CookieAuth" = []), ("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_inventory_item(
    State(state): State<AppState>,
    Path(numero_parte): Path<String>,
    current_user: CurrentUser,
) -> Result<Json<InventoryItemResponse>> {
    require_any_role(&current_user, READ_ROLES, Operation::Read, "inventory")?;

    let repo = InventoryItems::open(&state.store).await?;
    match repo.get(&numero_parte).await? {
        Some(item) => Ok(Json(InventoryItemResponse::from(item))),
        None => Err(not_found(&numero_parte)),
    }
}

#[utoipa::path(
    put,
    path = "/inventory/{numero_parte}",
    tag = "inventory",
    summary = "Update inventory item",
    request_body = InventoryItemUpdate,
    params(("numero_parte" = String, Path, description = "Part number")),
    responses(
        (status = 200, description = "Item updated", body = InventoryItemResponse),
        (status = 404, description = "Item not found"),
    ),
    security(("CookieAuth" = []), ("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_inventory_item(
    State(state): State<AppState>,
    Path(numero_parte): Path<String>,
    current_user: CurrentUser,
    Json(update): Json<InventoryItemUpdate>,
) -> Result<Json<InventoryItemResponse>> {
    require_any_role(&current_user, WRITE_ROLES, Operation::Update, "inventory")?;
    update.validate()?;

    let repo = InventoryItems::open(&state.store).await?;
    let item = repo.update(&numero_parte, &update.into()).await.map_err(|e| match e {
        StoreError::NotFound => not_found(&numero_parte),
        other => other.into(),
    })?;

    Ok(Json(InventoryItemResponse::from(item)))
}

#[utoipa::path(
    delete,
    path = "/inventory/{numero_parte}",
    tag = "inventory",
    summary = "Delete inventory item",
    params(("numero_parte" = String, Path, description = "Part number")),
    responses(
        (status = 204, description = "Item deleted (or was already absent)"),
        (status = 403, description = "Admin access required"),
    ),
    security(("CookieAuth" = []), ("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_inventory_item(
    State(state): State<AppState>,
    Path(numero_parte): Path<String>,
    current_user: CurrentUser,
) -> Result<StatusCode> {
    require_any_role(&current_user, &[Role::Admin], Operation::Delete, "inventory")?;

    let repo = InventoryItems::open(&state.store).await?;
    // Deleting an absent item is not an error
    repo.delete(&numero_parte).await?;

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use crate::test_utils::{create_test_app, login, register_user};
    use axum::http::StatusCode;
    use serde_json::json;

    async fn setup() -> axum_test::TestServer {
        let server = create_test_app().await;
        login(&server, "admin", "admin-password-123").await;
        server
    }

    #[tokio::test]
    async fn test_inventory_requires_authentication() {
        let server = create_test_app().await;
        server.get("/api/v1/inventory").await.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_create_then_get() {
        let server = setup().await;

        let created = server
            .post("/api/v1/inventory")
            .json(&json!({"numero_parte": "1001", "cantidad": 5, "descripcion": "tornillo M6"}))
            .await;
        created.assert_status(StatusCode::CREATED);

        let response = server.get("/api/v1/inventory/1001").await;
        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        assert_eq!(body["cantidad"], 5);
        assert_eq!(body["descripcion"], "tornillo M6");
    }

    #[tokio::test]
    async fn test_duplicate_part_number_is_conflict() {
        let server = setup().await;

        server
            .post("/api/v1/inventory")
            .json(&json!({"numero_parte": "1001", "cantidad": 5, "descripcion": "tornillo"}))
            .await
            .assert_status(StatusCode::CREATED);

        let response = server
            .post("/api/v1/inventory")
            .json(&json!({"numero_parte": "1001", "cantidad": 2, "descripcion": "otro"}))
            .await;
        response.assert_status(StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_update_quantity_reflected_on_read() {
        let server = setup().await;

        server
            .post("/api/v1/inventory")
            .json(&json!({"numero_parte": "1001", "cantidad": 5, "descripcion": "tornillo"}))
            .await
            .assert_status(StatusCode::CREATED);

        let updated = server
            .put("/api/v1/inventory/1001")
            .json(&json!({"cantidad": 10}))
            .await;
        updated.assert_status_ok();

        let response = server.get("/api/v1/inventory/1001").await;
        let body: serde_json::Value = response.json();
        assert_eq!(body["cantidad"], 10);
        assert_eq!(body["descripcion"], "tornillo");
    }

    #[tokio::test]
    async fn test_update_missing_item_is_404() {
        let server = setup().await;

        server
            .put("/api/v1/inventory/404")
            .json(&json!({"cantidad": 1}))
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_validation_rejects_negative_quantity() {
        let server = setup().await;

        server
            .post("/api/v1/inventory")
            .json(&json!({"numero_parte": "1001", "cantidad": -1, "descripcion": "x"}))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_list_is_sorted_numerically() {
        let server = setup().await;

        for (numero, cantidad) in [("30", 1), ("4", 2), ("1001", 3)] {
            server
                .post("/api/v1/inventory")
                .json(&json!({"numero_parte": numero, "cantidad": cantidad, "descripcion": "x"}))
                .await
                .assert_status(StatusCode::CREATED);
        }

        let response = server.get("/api/v1/inventory").await;
        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        let order: Vec<&str> = body["items"]
            .as_array()
            .unwrap()
            .iter()
            .map(|i| i["numero_parte"].as_str().unwrap())
            .collect();
        assert_eq!(order, vec!["4", "30", "1001"]);
    }

    #[tokio::test]
    async fn test_role_enforcement() {
        let server = setup().await;
        register_user(&server, "almacenista", "almacen-pass-123", "inventory").await;
        register_user(&server, "inge", "inge-pass-12345", "engineer").await;

        server
            .post("/api/v1/inventory")
            .json(&json!({"numero_parte": "1001", "cantidad": 5, "descripcion": "tornillo"}))
            .await
            .assert_status(StatusCode::CREATED);

        // Inventory role: may read and create, not update or delete
        login(&server, "almacenista", "almacen-pass-123").await;
        server.get("/api/v1/inventory").await.assert_status_ok();
        server
            .post("/api/v1/inventory")
            .json(&json!({"numero_parte": "2002", "cantidad": 1, "descripcion": "tuerca"}))
            .await
            .assert_status(StatusCode::CREATED);
        server
            .put("/api/v1/inventory/1001")
            .json(&json!({"cantidad": 9}))
            .await
            .assert_status(StatusCode::FORBIDDEN);
        server.delete("/api/v1/inventory/1001").await.assert_status(StatusCode::FORBIDDEN);

        // Engineer role: may update, not delete
        login(&server, "inge", "inge-pass-12345").await;
        server
            .put("/api/v1/inventory/1001")
            .json(&json!({"cantidad": 9}))
            .await
            .assert_status_ok();
        server.delete("/api/v1/inventory/1001").await.assert_status(StatusCode::FORBIDDEN);

        // Admin may delete, idempotently
        login(&server, "admin", "admin-password-123").await;
        server.delete("/api/v1/inventory/1001").await.assert_status(StatusCode::NO_CONTENT);
        server.delete("/api/v1/inventory/1001").await.assert_status(StatusCode::NO_CONTENT);
    }
}
