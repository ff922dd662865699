use axum::{Json, extract::State, http::StatusCode};

use crate::{
    AppState,
    api::models::{
        auth::{
            AuthResponse, AuthSuccessResponse, LoginRequest, LoginResponse, LogoutResponse, PasswordResetRequest,
            RegisterRequest,
        },
        users::{CurrentUser, Role},
    },
    auth::{password, permissions, session},
    config::Config,
    errors::{Error, Result},
    store::handlers::{Repository, Users},
    store::models::users::UserCreateRequest,
    types::Operation,
};

fn create_session_cookie(token: &str, config: &Config) -> String {
    let session = &config.auth.session;
    let secure = if session.secure_cookies { "; Secure" } else { "" };
    format!(
        "{}={}; Path=/; HttpOnly; SameSite=Strict; Max-Age={}{}",
        session.cookie_name,
        token,
        session.jwt_expiry.as_secs(),
        secure
    )
}

fn validate_password(password: &str, config: &Config) -> Result<()> {
    let policy = &config.auth.password;
    if password.len() < policy.min_length {
        return Err(Error::BadRequest {
            message: format!("Password must be at least {} characters", policy.min_length),
        });
    }
    if password.len() > policy.max_length {
        return Err(Error::BadRequest {
            message: format!("Password must be no more than {} characters", policy.max_length),
        });
    }
    Ok(())
}

/// Login with username and password
#[utoipa::path(
    post,
    path = "/authentication/login",
    request_body = LoginRequest,
    tag = "authentication",
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn login(State(state): State<AppState>, Json(request): Json<LoginRequest>) -> Result<LoginResponse> {
    if request.username.is_empty() || request.password.is_empty() {
        return Err(Error::BadRequest {
            message: "Username and password are required".to_string(),
        });
    }

    let users = Users::open(&state.store).await?;
    let authenticated = users.authenticate(&request.username, &request.password).await?;

    let current_user = CurrentUser::from(authenticated);
    let token = session::create_session_token(&current_user, &state.config)?;
    let cookie = create_session_cookie(&token, &state.config);

    let auth_response = AuthResponse {
        user: current_user,
        message: "Login successful".to_string(),
    };

    Ok(LoginResponse { auth_response, cookie })
}

/// Logout (clear session)
#[utoipa::path(
    post,
    path = "/authentication/logout",
    tag = "authentication",
    responses(
        (status = 200, description = "Logout successful", body = AuthSuccessResponse),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn logout(State(state): State<AppState>) -> Result<LogoutResponse> {
    // Expired cookie clears the session
    let session = &state.config.auth.session;
    let secure = if session.secure_cookies { "; Secure" } else { "" };
    let cookie = format!(
        "{}=; Path=/; HttpOnly; SameSite=Strict; Max-Age=0{}",
        session.cookie_name, secure
    );

    let auth_response = AuthSuccessResponse {
        message: "Logout successful".to_string(),
    };

    Ok(LogoutResponse { auth_response, cookie })
}

/// Register a new user account (admin only)
#[utoipa::path(
    post,
    path = "/authentication/register",
    request_body = RegisterRequest,
    tag = "authentication",
    responses(
        (status = 201, description = "User registered successfully", body = AuthResponse),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "Admin access required"),
        (status = 409, description = "Username already taken"),
    ),
    security(("CookieAuth" = []), ("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>)> {
    permissions::require_admin(&current_user, Operation::Create, "users")?;

    if request.username.trim().len() < 3 {
        return Err(Error::BadRequest {
            message: "Username must be at least 3 characters".to_string(),
        });
    }
    validate_password(&request.password, &state.config)?;

    // Hash the password on a blocking thread to avoid blocking async runtime
    let plaintext = request.password.clone();
    let password_hash = tokio::task::spawn_blocking(move || password::hash_string(&plaintext))
        .await
        .map_err(|e| Error::Internal {
            operation: format!("spawn password hashing task: {e}"),
        })??;

    let users = Users::open(&state.store).await?;
    let created = users
        .create(&UserCreateRequest {
            username: request.username.clone(),
            password_hash,
            role: request.role.unwrap_or(Role::Inventory),
        })
        .await?;

    let auth_response = AuthResponse {
        user: CurrentUser {
            id: created.id,
            username: created.username,
            role: created.role,
        },
        message: "Registration successful".to_string(),
    };

    Ok((StatusCode::CREATED, Json(auth_response)))
}

/// Reset a user's password. Admins may reset any password; other users only
/// their own.
#[utoipa::path(
    post,
    path = "/authentication/password-resets",
    request_body = PasswordResetRequest,
    tag = "authentication",
    responses(
        (status = 200, description = "Password reset successful", body = AuthSuccessResponse),
        (status = 403, description = "Not allowed to reset this password"),
        (status = 404, description = "Unknown username"),
    ),
    security(("CookieAuth" = []), ("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn reset_password(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(request): Json<PasswordResetRequest>,
) -> Result<Json<AuthSuccessResponse>> {
    if !current_user.is_admin() && current_user.username != request.username {
        return Err(Error::InsufficientPermissions {
            action: Operation::Update,
            resource: format!("password of user '{}'", request.username),
        });
    }
    validate_password(&request.new_password, &state.config)?;

    let users = Users::open(&state.store).await?;
    users
        .reset_password(&request.username, &request.new_password)
        .await
        .map_err(|e| match e {
            crate::store::StoreError::NotFound => Error::NotFound {
                resource: "User".to_string(),
                id: request.username.clone(),
            },
            other => other.into(),
        })?;

    Ok(Json(AuthSuccessResponse {
        message: "Password reset successfully".to_string(),
    }))
}

/// Return the current authenticated user's information
#[utoipa::path(
    get,
    path = "/authentication/me",
    tag = "authentication",
    responses(
        (status = 200, description = "Current session user", body = CurrentUser),
        (status = 401, description = "Not authenticated"),
    ),
    security(("CookieAuth" = []), ("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn me(current_user: CurrentUser) -> Json<CurrentUser> {
    Json(current_user)
}

#[cfg(test)]
mod tests {
    use crate::test_utils::{create_test_app, login, register_user};
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_login_sets_session_and_me_returns_user() {
        let server = create_test_app().await;

        login(&server, "admin", "admin-password-123").await;

        let response = server.get("/authentication/me").await;
        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        assert_eq!(body["username"], "admin");
        assert_eq!(body["role"], "admin");
    }

    #[tokio::test]
    async fn test_login_wrong_password_is_generic_401() {
        let server = create_test_app().await;

        let response = server
            .post("/authentication/login")
            .json(&json!({"username": "admin", "password": "wrong"}))
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);

        let unknown = server
            .post("/authentication/login")
            .json(&json!({"username": "ghost", "password": "whatever"}))
            .await;
        unknown.assert_status(StatusCode::UNAUTHORIZED);

        // Same message for unknown user and wrong password
        let a: serde_json::Value = response.json();
        let b: serde_json::Value = unknown.json();
        assert_eq!(a["error"], b["error"]);
    }

    #[tokio::test]
    async fn test_me_without_session_is_401() {
        let server = create_test_app().await;
        server.get("/authentication/me").await.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_logout_clears_session() {
        let server = create_test_app().await;
        login(&server, "admin", "admin-password-123").await;

        server.post("/authentication/logout").await.assert_status_ok();
        server.get("/authentication/me").await.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_register_requires_admin() {
        let server = create_test_app().await;
        login(&server, "admin", "admin-password-123").await;
        register_user(&server, "worker", "worker-pass-123", "inventory").await;

        // A non-admin session cannot register users
        login(&server, "worker", "worker-pass-123").await;
        let response = server
            .post("/authentication/register")
            .json(&json!({"username": "intruso", "password": "long-enough-pass"}))
            .await;
        response.assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_register_duplicate_username_conflicts() {
        let server = create_test_app().await;
        login(&server, "admin", "admin-password-123").await;
        register_user(&server, "worker", "worker-pass-123", "inventory").await;

        let response = server
            .post("/authentication/register")
            .json(&json!({"username": "worker", "password": "another-pass-123"}))
            .await;
        response.assert_status(StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_register_validates_input() {
        let server = create_test_app().await;
        login(&server, "admin", "admin-password-123").await;

        let short_username = server
            .post("/authentication/register")
            .json(&json!({"username": "ab", "password": "long-enough-pass"}))
            .await;
        short_username.assert_status(StatusCode::BAD_REQUEST);

        let short_password = server
            .post("/authentication/register")
            .json(&json!({"username": "carlos", "password": "short"}))
            .await;
        short_password.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_register_defaults_to_inventory_role() {
        let server = create_test_app().await;
        login(&server, "admin", "admin-password-123").await;

        let response = server
            .post("/authentication/register")
            .json(&json!({"username": "carlos", "password": "carlos-pass-123"}))
            .await;
        response.assert_status(StatusCode::CREATED);
        let body: serde_json::Value = response.json();
        assert_eq!(body["user"]["role"], "inventory");
        assert_eq!(body["user"]["id"], "carlos");
    }

    #[tokio::test]
    async fn test_password_reset_self_and_admin() {
        let server = create_test_app().await;
        login(&server, "admin", "admin-password-123").await;
        register_user(&server, "worker", "first-pass-123", "inventory").await;

        // Users can reset their own password
        login(&server, "worker", "first-pass-123").await;
        server
            .post("/authentication/password-resets")
            .json(&json!({"username": "worker", "new_password": "second-pass-123"}))
            .await
            .assert_status_ok();
        login(&server, "worker", "second-pass-123").await;

        // But not someone else's
        let forbidden = server
            .post("/authentication/password-resets")
            .json(&json!({"username": "admin", "new_password": "hostile-pass-123"}))
            .await;
        forbidden.assert_status(StatusCode::FORBIDDEN);

        // Admins can reset anyone's
        login(&server, "admin", "admin-password-123").await;
        server
            .post("/authentication/password-resets")
            .json(&json!({"username": "worker", "new_password": "third-pass-123"}))
            .await
            .assert_status_ok();
        login(&server, "worker", "third-pass-123").await;
    }

    #[tokio::test]
    async fn test_password_reset_unknown_user_is_404() {
        let server = create_test_app().await;
        login(&server, "admin", "admin-password-123").await;

        let response = server
            .post("/authentication/password-resets")
            .json(&json!({"username": "ghost", "new_password": "whatever-pass-123"}))
            .await;
        response.assert_status(StatusCode::NOT_FOUND);
    }
}
