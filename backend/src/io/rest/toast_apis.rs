//! # REST API for Toasts

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get},
    Json, Router,
};
use shared::ToastListResponse;

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/toasts", get(list_toasts))
        .route("/toasts/:id", delete(dismiss_toast))
}

/// Toasts that have not expired yet
pub async fn list_toasts(State(state): State<AppState>) -> impl IntoResponse {
    Json(ToastListResponse { toasts: state.context.toasts().active() })
}

pub async fn dismiss_toast(State(state): State<AppState>, Path(toast_id): Path<u64>) -> impl IntoResponse {
    state.context.toasts().dismiss(toast_id);
    StatusCode::NO_CONTENT
}
