//! Extraction of the authenticated user from incoming requests.

use axum::{extract::FromRequestParts, http::request::Parts};
use tracing::{debug, trace};

use crate::{
    AppState,
    api::models::users::CurrentUser,
    auth::session,
    config::Config,
    errors::{Error, Result},
};

/// Extract user from the JWT session cookie if present and valid.
/// Returns:
/// - None: no session cookie present
/// - Some(Ok(user)): valid JWT found and verified
/// - Some(Err(error)): cookie header was unreadable
fn try_session_cookie_auth(parts: &Parts, config: &Config) -> Option<Result<CurrentUser>> {
    let cookie_header = parts.headers.get(axum::http::header::COOKIE)?;

    let cookie_str = match cookie_header.to_str() {
        Ok(s) => s,
        Err(e) => {
            return Some(Err(Error::BadRequest {
                message: format!("Invalid cookie header: {e}"),
            }));
        }
    };
    let cookie_name = &config.auth.session.cookie_name;

    for cookie in cookie_str.split(';') {
        let cookie = cookie.trim();
        if let Some((name, value)) = cookie.split_once('=')
            && name == cookie_name
        {
            match session::verify_session_token(value, config) {
                Ok(user) => return Some(Ok(user)),
                // Expired/invalid tokens are expected; keep checking other cookies
                Err(_) => continue,
            }
        }
    }
    None
}

/// Extract user from an `Authorization: Bearer` session token.
/// Returns:
/// - None: no Authorization header or not a Bearer token
/// - Some(Ok(user)): valid token
/// - Some(Err(error)): bearer token present but invalid
fn try_bearer_token_auth(parts: &Parts, config: &Config) -> Option<Result<CurrentUser>> {
    let auth_header = parts.headers.get(axum::http::header::AUTHORIZATION)?;

    let auth_str = match auth_header.to_str() {
        Ok(s) => s,
        Err(e) => {
            return Some(Err(Error::BadRequest {
                message: format!("Invalid authorization header: {e}"),
            }));
        }
    };

    let token = auth_str.strip_prefix("Bearer ")?;
    Some(session::verify_session_token(token, config))
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        // Session cookie first (browser clients), then bearer token (API
        // clients). Fail only when no method yields a user.
        match try_session_cookie_auth(parts, &state.config) {
            Some(Ok(user)) => {
                debug!("Found session cookie authenticated user: {}", user.id);
                return Ok(user);
            }
            Some(Err(e)) => {
                trace!("Session cookie authentication failed: {:?}", e);
            }
            None => {
                trace!("No session cookie authentication attempted");
            }
        }

        match try_bearer_token_auth(parts, &state.config) {
            Some(Ok(user)) => {
                debug!("Found bearer token authenticated user: {}", user.id);
                Ok(user)
            }
            Some(Err(e)) => {
                trace!("Bearer token authentication failed: {:?}", e);
                Err(Error::Unauthenticated { message: None })
            }
            None => {
                trace!("No authentication credentials found in request");
                Err(Error::Unauthenticated { message: None })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::users::Role;
    use crate::test_utils::{create_test_config, create_test_state};
    use axum::extract::FromRequestParts as _;

    fn parts_with_header(header_name: &str, header_value: &str) -> Parts {
        let request = axum::http::Request::builder()
            .uri("http://localhost/test")
            .header(header_name, header_value)
            .body(())
            .unwrap();

        let (parts, _body) = request.into_parts();
        parts
    }

    fn test_user() -> CurrentUser {
        CurrentUser {
            id: "alice".to_string(),
            username: "alice".to_string(),
            role: Role::Inventory,
        }
    }

    #[tokio::test]
    async fn test_extract_from_session_cookie() {
        let config = create_test_config();
        let state = create_test_state(config.clone()).await;

        let token = session::create_session_token(&test_user(), &config).unwrap();
        let cookie = format!("{}={}", config.auth.session.cookie_name, token);
        let mut parts = parts_with_header("cookie", &cookie);

        let user = CurrentUser::from_request_parts(&mut parts, &state).await.unwrap();
        assert_eq!(user.id, "alice");
        assert_eq!(user.role, Role::Inventory);
    }

    #[tokio::test]
    async fn test_extract_from_bearer_token() {
        let config = create_test_config();
        let state = create_test_state(config.clone()).await;

        let token = session::create_session_token(&test_user(), &config).unwrap();
        let mut parts = parts_with_header("authorization", &format!("Bearer {token}"));

        let user = CurrentUser::from_request_parts(&mut parts, &state).await.unwrap();
        assert_eq!(user.username, "alice");
    }

    #[tokio::test]
    async fn test_missing_credentials_is_unauthorized() {
        let state = create_test_state(create_test_config()).await;

        let request = axum::http::Request::builder().uri("http://localhost/test").body(()).unwrap();
        let (mut parts, _body) = request.into_parts();

        let err = CurrentUser::from_request_parts(&mut parts, &state).await.unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_garbage_bearer_token_is_unauthorized() {
        let state = create_test_state(create_test_config()).await;

        let mut parts = parts_with_header("authorization", "Bearer not.a.token");
        let err = CurrentUser::from_request_parts(&mut parts, &state).await.unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::UNAUTHORIZED);
    }
}
