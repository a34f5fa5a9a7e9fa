//! # REST API for Tasks
//!
//! Task management from the settings screen plus completing a task for
//! the active child.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{post, put},
    Json, Router,
};
use shared::{CreateTaskRequest, UpdateTaskRequest};
use tracing::{error, info};

use crate::domain::pages::{settings, tasks};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/tasks", post(create_task))
        .route("/tasks/:id", put(update_task).delete(delete_task))
        .route("/tasks/:id/complete", post(complete_task))
}

/// Complete a task for the active child
pub async fn complete_task(State(state): State<AppState>, Path(task_id): Path<String>) -> impl IntoResponse {
    info!("POST /api/tasks/{}/complete", task_id);

    match tasks::complete_task(&state.context, &task_id).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => {
            error!("Failed to complete task {}: {}", task_id, e);
            e.into_response()
        }
    }
}

pub async fn create_task(
    State(state): State<AppState>,
    Json(request): Json<CreateTaskRequest>,
) -> impl IntoResponse {
    info!("POST /api/tasks - request: {:?}", request);

    match settings::create_task(&state.context, request).await {
        Ok(task) => (StatusCode::CREATED, Json(task)).into_response(),
        Err(e) => {
            error!("Failed to create task: {}", e);
            e.into_response()
        }
    }
}

pub async fn update_task(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
    Json(request): Json<UpdateTaskRequest>,
) -> impl IntoResponse {
    info!("PUT /api/tasks/{} - request: {:?}", task_id, request);

    match settings::update_task(&state.context, &task_id, request).await {
        Ok(task) => (StatusCode::OK, Json(task)).into_response(),
        Err(e) => {
            error!("Failed to update task {}: {}", task_id, e);
            e.into_response()
        }
    }
}

pub async fn delete_task(State(state): State<AppState>, Path(task_id): Path<String>) -> impl IntoResponse {
    info!("DELETE /api/tasks/{}", task_id);

    match settings::delete_task(&state.context, &task_id).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => {
            error!("Failed to delete task {}: {}", task_id, e);
            e.into_response()
        }
    }
}
