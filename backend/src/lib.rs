//! # Chore Quest Backend
//!
//! All non-UI logic of Chore Quest, a chore tracker where children earn
//! points for tasks, spend them in a reward shop and hatch spirit eggs.
//!
//! ## Architecture
//!
//! ```text
//! UI (browser)
//!     ↓
//! IO Layer (REST bridge under /api)
//!     ↓
//! Domain Layer (rules, validation, page controllers)
//!     ↓
//! Session + Sync (identity, mirror, render scheduler)
//!     ↓
//! Storage Layer (document store: YAML files or in-memory)
//! ```
//!
//! [`initialize_backend`] signs in, opens the identity's document store and
//! starts the session. [`create_router`] exposes it over HTTP. When no
//! identity can be established, [`create_failure_router`] answers every
//! request with a fatal error instead.

pub mod config;
pub mod domain;
pub mod io;
pub mod presentation;
pub mod session;
pub mod storage;
pub mod sync;

use anyhow::{Context, Result};
use axum::{
    http::{HeaderValue, Method, StatusCode},
    response::IntoResponse,
    routing::any,
    Json, Router,
};
use shared::FatalErrorResponse;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::session::{bootstrap_identity, FileIdentityProvider, PreferencesRepository, SessionContext};
use crate::storage::{YamlConnection, YamlDocumentStore};

/// Application state shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub context: SessionContext,
}

/// Sign in, open the identity's store and start the session
pub async fn initialize_backend(config: &AppConfig) -> Result<AppState> {
    info!("Setting up data directory {}", config.data_dir.display());
    let connection = YamlConnection::new(&config.data_dir)?;

    info!("Setting up identity");
    let provider = FileIdentityProvider::new(&connection);
    let namespace = bootstrap_identity(&provider, &config.identity_retry).await?;

    info!("Setting up document store for {}", namespace.root_path);
    let store = YamlDocumentStore::open(connection.clone(), &namespace.root_path)
        .with_context(|| format!("Failed to open document store for {}", namespace.root_path))?;
    let preferences = PreferencesRepository::load(&connection);

    info!("Setting up session");
    let context = SessionContext::new(namespace, Arc::new(store), preferences, config);
    context.start().await?;

    if config.seed_defaults {
        if domain::seed::ensure_default_data(&context).await? {
            context.refresh().await;
        }
    }

    Ok(AppState { context })
}

fn cors_layer(config: &AppConfig) -> Result<CorsLayer> {
    let origin = config
        .allowed_origin
        .parse::<HeaderValue>()
        .with_context(|| format!("Invalid allowed_origin {:?}", config.allowed_origin))?;

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any))
}

/// Create the Axum router with all routes configured
pub fn create_router(app_state: AppState, config: &AppConfig) -> Result<Router> {
    let cors = cors_layer(config)?;

    Ok(Router::new()
        .nest("/api", io::rest::api_routes())
        .layer(cors)
        .with_state(app_state))
}

/// Router for a session that never started: every API call is fatal
pub fn create_failure_router(message: String, config: &AppConfig) -> Result<Router> {
    warn!("Serving failure router: {}", message);
    let cors = cors_layer(config)?;
    let fatal = move || {
        let message = message.clone();
        async move {
            (StatusCode::SERVICE_UNAVAILABLE, Json(FatalErrorResponse { fatal: true, message })).into_response()
        }
    };

    Ok(Router::new()
        .route("/api", any(fatal.clone()))
        .route("/api/*path", any(fatal))
        .layer(cors))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use shared::PageView;
    use tempfile::TempDir;
    use tower::util::ServiceExt;

    fn test_config(temp_dir: &TempDir) -> AppConfig {
        AppConfig { render_debounce_ms: 0, ..AppConfig::for_data_dir(temp_dir.path()) }
    }

    async fn get(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_initialize_backend_seeds_and_serves() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir);

        let app_state = initialize_backend(&config).await.unwrap();
        let mirror = app_state.context.mirror().snapshot();
        assert_eq!(mirror.tasks.len(), 5);
        assert_eq!(mirror.rewards.len(), 5);
        assert!(temp_dir.path().join("identity.yaml").exists());

        let app = create_router(app_state.clone(), &config).unwrap();
        let (status, body) = get(app, "/api/pages/settings").await;
        assert_eq!(status, StatusCode::OK);
        let page: PageView = serde_json::from_value(body).unwrap();
        assert_eq!(page.redirect, None);
        app_state.context.shutdown();
    }

    #[tokio::test]
    async fn test_identity_is_reused_across_restarts() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir);

        let first = initialize_backend(&config).await.unwrap();
        let first_id = first.context.current_user_id().to_string();
        first.context.shutdown();

        let second = initialize_backend(&config).await.unwrap();
        second.context.refresh().await;
        assert_eq!(second.context.current_user_id(), first_id);
        assert_eq!(second.context.mirror().snapshot().tasks.len(), 5);
        second.context.shutdown();
    }

    #[tokio::test]
    async fn test_failure_router_is_fatal_everywhere() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir);
        let app = create_failure_router("no identity".to_string(), &config).unwrap();

        let (status, body) = get(app.clone(), "/api/pages/tasks").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["fatal"], serde_json::json!(true));
        assert_eq!(body["message"], serde_json::json!("no identity"));

        let (status, _) = get(app, "/api").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_invalid_origin_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let config = AppConfig { allowed_origin: "bad\norigin".to_string(), ..test_config(&temp_dir) };
        assert!(create_failure_router("x".to_string(), &config).is_err());
    }
}
