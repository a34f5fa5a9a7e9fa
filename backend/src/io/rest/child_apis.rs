//! # REST API for Child Management
//!
//! Endpoints for creating, listing, updating and deleting children, and
//! for switching the active child. Deleting asks for confirmation first:
//! `DELETE /api/children/:id` opens the confirm modal.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
    Json, Router,
};
use shared::{CreateChildRequest, SetActiveChildRequest, UpdateChildRequest};
use tracing::{error, info};

use crate::domain::pages::settings;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/children", get(list_children).post(create_child))
        .route("/children/:id", put(update_child).delete(delete_child))
        .route("/active-child", put(set_active_child))
}

/// Create a new child
pub async fn create_child(
    State(state): State<AppState>,
    Json(request): Json<CreateChildRequest>,
) -> impl IntoResponse {
    info!("POST /api/children - request: {:?}", request);

    match settings::create_child(&state.context, request).await {
        Ok(response) => (StatusCode::CREATED, Json(response)).into_response(),
        Err(e) => {
            error!("Failed to create child: {}", e);
            e.into_response()
        }
    }
}

/// List all children
pub async fn list_children(State(state): State<AppState>) -> impl IntoResponse {
    info!("GET /api/children");
    (StatusCode::OK, Json(settings::list_children(&state.context)))
}

/// Update a child
pub async fn update_child(
    State(state): State<AppState>,
    Path(child_id): Path<String>,
    Json(request): Json<UpdateChildRequest>,
) -> impl IntoResponse {
    info!("PUT /api/children/{} - request: {:?}", child_id, request);

    match settings::update_child(&state.context, &child_id, request).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => {
            error!("Failed to update child: {}", e);
            e.into_response()
        }
    }
}

/// Open the delete confirmation for a child
pub async fn delete_child(State(state): State<AppState>, Path(child_id): Path<String>) -> impl IntoResponse {
    info!("DELETE /api/children/{}", child_id);

    match settings::request_delete_child(&state.context, &child_id) {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => {
            error!("Failed to delete child: {}", e);
            e.into_response()
        }
    }
}

pub async fn set_active_child(
    State(state): State<AppState>,
    Json(request): Json<SetActiveChildRequest>,
) -> impl IntoResponse {
    info!("PUT /api/active-child - request: {:?}", request);

    match settings::set_active_child(&state.context, &request.child_id) {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => {
            error!("Failed to set active child: {}", e);
            e.into_response()
        }
    }
}
