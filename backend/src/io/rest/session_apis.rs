//! # REST API for the Session
//!
//! Identity of the running session and its active child.

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use shared::SessionResponse;
use tracing::info;

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/session", get(get_session))
}

/// Get the identity and the active child
pub async fn get_session(State(state): State<AppState>) -> impl IntoResponse {
    info!("GET /api/session");

    let context = &state.context;
    let response = SessionResponse {
        user_id: context.current_user_id().to_string(),
        namespace_path: context.namespace().root_path.clone(),
        active_child: context.mirror().read().active_child().cloned(),
    };
    (StatusCode::OK, Json(response))
}
