//! Test utilities for integration testing (available with `test-utils`
//! feature).

use axum_test::TestServer;
use serde_json::json;

use crate::{AppState, Application, config::Config, store::RecordStore};

/// Config used by the test suite: known admin credentials, in-memory-friendly
/// defaults.
pub fn create_test_config() -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        secret_key: Some("test-secret-key-for-testing-only".to_string()),
        admin_username: "admin".to_string(),
        admin_password: Some("admin-password-123".to_string()),
        ..Default::default()
    }
}

/// App state over a fresh in-memory store, without running the bootstrap.
pub async fn create_test_state(config: Config) -> AppState {
    let store = RecordStore::open_in_memory().await.expect("Failed to open in-memory store");
    AppState::builder().store(store).config(config).build()
}

/// Full application over a fresh in-memory store, bootstrapped (collections,
/// admin user) and wrapped in a cookie-keeping test server.
pub async fn create_test_app() -> TestServer {
    let config = create_test_config();
    let store = RecordStore::open_in_memory().await.expect("Failed to open in-memory store");
    let app = Application::with_store(config, store)
        .await
        .expect("Failed to create application");
    app.into_test_server()
}

/// Log in and keep the session cookie in the server's jar. Panics on
/// failure so tests fail loudly at the right line.
pub async fn login(server: &TestServer, username: &str, password: &str) {
    let response = server
        .post("/authentication/login")
        .json(&json!({"username": username, "password": password}))
        .await;
    response.assert_status_ok();
}

/// Register a user through the API. Requires an active admin session.
pub async fn register_user(server: &TestServer, username: &str, password: &str, role: &str) {
    let response = server
        .post("/authentication/register")
        .json(&json!({"username": username, "password": password, "role": role}))
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);
}
