//! # almacen: inventory and part-number control
//!
//! `almacen` is a small internal web service for manufacturing or logistics
//! offices. It provides user authentication and CRUD management of two
//! record types: inventory items (`/api/v1/inventory`) and engineering
//! part-number records (`/api/v1/partes`), all over a JSON API.
//!
//! ## Overview
//!
//! Records live in an embedded, collection-scoped document store (SQLite
//! via `sqlx`) used purely as a key + metadata store. The store layer
//! ([`store`]) exposes generic collection CRUD plus typed repositories for
//! the `users`, `inventory` and `partes` collections; the authentication
//! layer ([`auth`]) handles Argon2 password hashing and JWT session tokens
//! carried in an HttpOnly cookie; the API layer ([`api`]) maps HTTP
//! requests onto repository calls and enforces role-based access (`admin`,
//! `engineer`, `inventory`).
//!
//! ## Request Flow
//!
//! A request first passes the [`CurrentUser`](api::models::users::CurrentUser)
//! extractor, which verifies the session cookie (or an
//! `Authorization: Bearer` token). The handler checks the user's role,
//! validates the payload, and calls the matching repository in
//! [`store::handlers`]. Repositories speak typed schemas from
//! [`store::models`] and translate them to the generic keyed records of
//! [`store::records`]. Errors surface as typed [`errors::Error`] values
//! which render as JSON error responses.
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use almacen::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = almacen::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     almacen::telemetry::init_telemetry()?;
//!
//!     let app = Application::new(config).await?;
//!     app.serve(async {
//!         tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
//!     })
//!     .await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Startup bootstrap
//!
//! On startup the application ensures the three collections exist, backfills
//! `id` metadata on legacy user records (see
//! [`store::handlers::Users::migrate_legacy_ids`]), and creates the
//! configured admin user if it is missing. All three steps are idempotent.

pub mod api;
pub mod auth;
pub mod config;
pub mod errors;
mod openapi;
pub mod store;
pub mod telemetry;
pub mod types;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

use axum::{
    Json, Router,
    http::HeaderValue,
    routing::{get, post},
};
use bon::Builder;
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, info, instrument, warn};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};
use uuid::Uuid;

pub use config::Config;

use crate::{
    api::models::users::Role,
    auth::password,
    openapi::ApiDoc,
    store::RecordStore,
    store::handlers::{Repository, Users},
    store::models::{inventory::INVENTORY_COLLECTION, parts::PARTES_COLLECTION, users::UserCreateRequest, users::USERS_COLLECTION},
};

/// Application state shared across all request handlers: the record store
/// handle and the loaded configuration. No global singletons; every handler
/// gets this by reference through axum's `State`.
#[derive(Clone, Builder)]
pub struct AppState {
    pub store: RecordStore,
    pub config: Config,
}

/// Create the initial admin user if it doesn't exist.
///
/// Idempotent: an existing admin is left in place, though a configured
/// `admin_password` is re-applied on every startup so a lost password can
/// be recovered from the config. Without a configured password a freshly
/// created admin gets an unguessable placeholder and must be reset
/// explicitly.
#[instrument(skip_all)]
pub async fn ensure_admin_user(store: &RecordStore, config: &Config) -> anyhow::Result<String> {
    let users = Users::open(store).await?;

    if let Some(existing) = users.find_by_username(&config.admin_username).await? {
        if let Some(admin_password) = &config.admin_password {
            users.reset_password(&config.admin_username, admin_password).await?;
        }
        return Ok(existing.id);
    }

    let plaintext = match &config.admin_password {
        Some(admin_password) => admin_password.clone(),
        None => {
            warn!(
                "admin_password is not configured; creating '{}' with an unguessable placeholder password",
                config.admin_username
            );
            Uuid::new_v4().to_string()
        }
    };

    let password_hash = tokio::task::spawn_blocking(move || password::hash_string(&plaintext)).await??;
    let created = users
        .create(&UserCreateRequest {
            username: config.admin_username.clone(),
            password_hash,
            role: Role::Admin,
        })
        .await?;

    info!("Created initial admin user '{}'", created.username);
    Ok(created.id)
}

/// Prepare the record store for serving: ensure the collections exist,
/// migrate legacy user records, and seed the admin user. Every step is
/// idempotent, so running this on each startup is safe.
#[instrument(skip_all)]
pub async fn bootstrap_store(store: &RecordStore, config: &Config) -> anyhow::Result<()> {
    for name in [USERS_COLLECTION, INVENTORY_COLLECTION, PARTES_COLLECTION] {
        store.collection(name).await?;
    }

    let users = Users::open(store).await?;
    let migrated = users.migrate_legacy_ids().await?;
    if migrated > 0 {
        info!(migrated, "Backfilled ids on legacy user records");
    }

    ensure_admin_user(store, config).await?;
    Ok(())
}

/// Create CORS layer from configuration. An empty origin list leaves CORS
/// off entirely.
fn create_cors_layer(config: &Config) -> anyhow::Result<Option<CorsLayer>> {
    if config.cors.allowed_origins.is_empty() {
        return Ok(None);
    }

    let cors = if config.cors.allowed_origins.iter().any(|origin| origin == "*") {
        CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
    } else {
        let mut origins = Vec::new();
        for origin in &config.cors.allowed_origins {
            origins.push(origin.parse::<HeaderValue>()?);
        }
        CorsLayer::new().allow_origin(origins).allow_methods(Any).allow_headers(Any)
    };

    Ok(Some(cors))
}

/// Build the application router with all endpoints and middleware.
///
/// - Authentication routes at the root (`/authentication/*`)
/// - Resource routes nested under `/api/v1`
/// - `/healthz` liveness endpoint
/// - OpenAPI document and Scalar docs UI
/// - CORS (when configured) and request tracing
pub fn build_router(state: &AppState) -> anyhow::Result<Router> {
    let auth_routes = Router::new()
        .route("/authentication/login", post(api::handlers::auth::login))
        .route("/authentication/logout", post(api::handlers::auth::logout))
        .route("/authentication/register", post(api::handlers::auth::register))
        .route("/authentication/password-resets", post(api::handlers::auth::reset_password))
        .route("/authentication/me", get(api::handlers::auth::me))
        .with_state(state.clone());

    let api_routes = Router::new()
        .route(
            "/inventory",
            get(api::handlers::inventory::list_inventory).post(api::handlers::inventory::create_inventory_item),
        )
        .route(
            "/inventory/{numero_parte}",
            get(api::handlers::inventory::get_inventory_item)
                .put(api::handlers::inventory::update_inventory_item)
                .delete(api::handlers::inventory::delete_inventory_item),
        )
        .route(
            "/partes",
            get(api::handlers::parts::list_partes).post(api::handlers::parts::create_parte),
        )
        .route(
            "/partes/{numero_parte}",
            get(api::handlers::parts::get_parte)
                .put(api::handlers::parts::update_parte)
                .delete(api::handlers::parts::delete_parte),
        )
        .with_state(state.clone());

    let mut router = Router::new()
        .route("/healthz", get(|| async { "OK" }))
        .route("/api-docs/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .merge(auth_routes)
        .nest("/api/v1", api_routes)
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()));

    if let Some(cors_layer) = create_cors_layer(&state.config)? {
        router = router.layer(cors_layer);
    }

    let router = router.layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    );

    Ok(router)
}

/// Main application struct that owns all resources and lifecycle.
///
/// 1. **Create**: [`Application::new`] opens the store, runs migrations and
///    the startup bootstrap
/// 2. **Serve**: [`Application::serve`] binds a TCP port and handles
///    requests until the shutdown future resolves
pub struct Application {
    router: Router,
    config: Config,
    store: RecordStore,
}

impl Application {
    /// Create a new application instance with all resources initialized
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = RecordStore::open(&config.store.path).await?;
        Self::with_store(config, store).await
    }

    /// Create an application on an already-open store (used by tests to run
    /// against an in-memory store)
    pub async fn with_store(config: Config, store: RecordStore) -> anyhow::Result<Self> {
        bootstrap_store(&store, &config).await?;

        let state = AppState::builder().store(store.clone()).config(config.clone()).build();
        let router = build_router(&state)?;

        Ok(Self { router, config, store })
    }

    /// Convert application into a test server (for tests)
    #[cfg(any(test, feature = "test-utils"))]
    pub fn into_test_server(self) -> axum_test::TestServer {
        axum_test::TestServer::builder()
            .save_cookies()
            .build(self.router)
            .expect("Failed to create test server")
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!("almacen listening on http://{}", bind_addr);

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Closing record store...");
        self.store.close().await;

        Ok(())
    }
}
