use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

use crate::{
    AppState,
    api::models::{
        pagination::Pagination,
        parts::{PartNumberCreate, PartNumberResponse, PartNumberUpdate},
        users::{CurrentUser, Role},
    },
    auth::permissions::require_any_role,
    errors::{Error, Result},
    store::StoreError,
    store::handlers::{PartNumbers, Repository},
    types::Operation,
};

// The engineering surface: admins and engineers only.
const ENGINEERING_ROLES: &[Role] = &[Role::Admin, Role::Engineer];

fn not_found(numero_parte: &str) -> Error {
    Error::NotFound {
        resource: "Numero de parte".to_string(),
        id: numero_parte.to_string(),
    }
}

#[utoipa::path(
    get,
    path = "/partes",
    tag = "partes",
    summary = "List part numbers",
    params(Pagination),
    responses(
        (status = 200, description = "Part numbers in part-number order", body = Vec<PartNumberResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Insufficient role"),
    ),
    security(("CookieAuth" = []), ("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_partes(
    State(state): State<AppState>,
    Query(pagination): Query<Pagination>,
    current_user: CurrentUser,
) -> Result<Json<Vec<PartNumberResponse>>> {
    require_any_role(&current_user, ENGINEERING_ROLES, Operation::Read, "partes")?;

    let repo = PartNumbers::open(&state.store).await?;
    let parts = repo.list(&pagination.page()).await?;

    Ok(Json(parts.into_iter().map(PartNumberResponse::from).collect()))
}

#[utoipa::path(
    post,
    path = "/partes",
    tag = "partes",
    summary = "Add part number",
    request_body = PartNumberCreate,
    responses(
        (status = 201, description = "Part number added", body = PartNumberResponse),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Part number already exists"),
    ),
    security(("CookieAuth" = []), ("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_parte(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(create): Json<PartNumberCreate>,
) -> Result<(StatusCode, Json<PartNumberResponse>)> {
    require_any_role(&current_user, ENGINEERING_ROLES, Operation::Create, "partes")?;
    create.validate()?;

    let repo = PartNumbers::open(&state.store).await?;
    let part = repo.create(&create.into()).await?;

    Ok((StatusCode::CREATED, Json(PartNumberResponse::from(part))))
}

#[utoipa::path(
    get,
    path = "/partes/{numero_parte}",
    tag = "partes",
    summary = "Get part number",
    params(("numero_parte" = String, Path, description = "Part number")),
    responses(
        (status = 200, description = "Part number record", body = PartNumberResponse),
        (status = 404, description = "Part number not found"),
    ),
    security(("CookieAuth" = []), ("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_parte(
    State(state): State<AppState>,
    Path(numero_parte): Path<String>,
    current_user: CurrentUser,
) -> Result<Json<PartNumberResponse>> {
    require_any_role(&current_user, ENGINEERING_ROLES, Operation::Read, "partes")?;

    let repo = PartNumbers::open(&state.store).await?;
    match repo.get(&numero_parte).await? {
        Some(part) => Ok(Json(PartNumberResponse::from(part))),
        None => Err(not_found(&numero_parte)),
    }
}

#[utoipa::path(
    put,
    path = "/partes/{numero_parte}",
    tag = "partes",
    summary = "Update part number",
    request_body = PartNumberUpdate,
    params(("numero_parte" = String, Path, description = "Part number")),
    responses(
        (status = 200, description = "Part number updated", body = PartNumberResponse),
        (status = 404, description = "Part number not found"),
    ),
    security(("CookieAuth" = []), ("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_parte(
    State(state): State<AppState>,
    Path(numero_parte): Path<String>,
    current_user: CurrentUser,
    Json(update): Json<PartNumberUpdate>,
) -> Result<Json<PartNumberResponse>> {
    require_any_role(&current_user, ENGINEERING_ROLES, Operation::Update, "partes")?;
    update.validate()?;

    let repo = PartNumbers::open(&state.store).await?;
    let part = repo.update(&numero_parte, &update.into()).await.map_err(|e| match e {
        StoreError::NotFound => not_found(&numero_parte),
        other => other.into(),
    })?;

    Ok(Json(PartNumberResponse::from(part)))
}

#[utoipa::path(
    delete,
    path = "/partes/{numero_parte}",
    tag = "partes",
    summary = "Delete part number",
    params(("numero_parte" = String, Path, description = "Part number")),
    responses(
        (status = 204, description = "Part number deleted (or was already absent)"),
        (status = 403, description = "Insufficient role"),
    ),
    security(("CookieAuth" = []), ("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_parte(
    State(state): State<AppState>,
    Path(numero_parte): Path<String>,
    current_user: CurrentUser,
) -> Result<StatusCode> {
    require_any_role(&current_user, ENGINEERING_ROLES, Operation::Delete, "partes")?;

    let repo = PartNumbers::open(&state.store).await?;
    // Delete-by-filter matching nothing is still a success
    repo.delete(&numero_parte).await?;

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use crate::test_utils::{create_test_app, login, register_user};
    use axum::http::StatusCode;
    use serde_json::json;

    fn parte_body() -> serde_json::Value {
        json!({
            "cliente": "ACME",
            "numero_parte": "9001",
            "descripcion_ingles": "bracket",
            "descripcion_espanol": "soporte",
            "unidad_medida": "pz",
            "peso": 0.35,
            "unidad_peso": "kg"
        })
    }

    async fn setup_engineer() -> axum_test::TestServer {
        let server = create_test_app().await;
        login(&server, "admin", "admin-password-123").await;
        register_user(&server, "inge", "inge-pass-12345", "engineer").await;
        login(&server, "inge", "inge-pass-12345").await;
        server
    }

    #[tokio::test]
    async fn test_engineer_crud_flow() {
        let server = setup_engineer().await;

        server
            .post("/api/v1/partes")
            .json(&parte_body())
            .await
            .assert_status(StatusCode::CREATED);

        let fetched = server.get("/api/v1/partes/9001").await;
        fetched.assert_status_ok();
        let body: serde_json::Value = fetched.json();
        assert_eq!(body["cliente"], "ACME");
        assert_eq!(body["peso"], 0.35);

        let updated = server
            .put("/api/v1/partes/9001")
            .json(&json!({"peso": 0.5, "descripcion_ingles": "heavy bracket"}))
            .await;
        updated.assert_status_ok();
        let body: serde_json::Value = updated.json();
        assert_eq!(body["peso"], 0.5);
        assert_eq!(body["descripcion_espanol"], "soporte");

        server.delete("/api/v1/partes/9001").await.assert_status(StatusCode::NO_CONTENT);
        server.get("/api/v1/partes/9001").await.assert_status(StatusCode::NOT_FOUND);
        // Deleting again is still a 204
        server.delete("/api/v1/partes/9001").await.assert_status(StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_duplicate_part_number_is_conflict() {
        let server = setup_engineer().await;

        server
            .post("/api/v1/partes")
            .json(&parte_body())
            .await
            .assert_status(StatusCode::CREATED);
        server
            .post("/api/v1/partes")
            .json(&parte_body())
            .await
            .assert_status(StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_cliente_and_numero_parte_are_required() {
        let server = setup_engineer().await;

        server
            .post("/api/v1/partes")
            .json(&json!({"cliente": "", "numero_parte": "9001"}))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_inventory_role_cannot_touch_partes() {
        let server = create_test_app().await;
        login(&server, "admin", "admin-password-123").await;
        register_user(&server, "almacenista", "almacen-pass-123", "inventory").await;

        login(&server, "almacenista", "almacen-pass-123").await;
        server.get("/api/v1/partes").await.assert_status(StatusCode::FORBIDDEN);
        server
            .post("/api/v1/partes")
            .json(&parte_body())
            .await
            .assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_list_empty_is_empty_array() {
        let server = setup_engineer().await;

        let response = server.get("/api/v1/partes").await;
        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        assert_eq!(body, json!([]));
    }
}
