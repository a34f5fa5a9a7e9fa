//! # REST API for the Modal Slot

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::{get, post}, Json, Router};
use shared::ModalResponse;
use tracing::{error, info};

use crate::domain::pages;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/modal", get(get_modal))
        .route("/modal/confirm", post(confirm_modal))
        .route("/modal/cancel", post(cancel_modal))
}

pub async fn get_modal(State(state): State<AppState>) -> impl IntoResponse {
    Json(ModalResponse { modal: state.context.modal().current() })
}

/// Run the open modal's action and close it
pub async fn confirm_modal(State(state): State<AppState>) -> impl IntoResponse {
    info!("POST /api/modal/confirm");

    match pages::confirm_modal(&state.context).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => {
            error!("Modal action failed: {}", e);
            e.into_response()
        }
    }
}

pub async fn cancel_modal(State(state): State<AppState>) -> impl IntoResponse {
    info!("POST /api/modal/cancel");
    (StatusCode::OK, Json(pages::cancel_modal(&state.context)))
}
