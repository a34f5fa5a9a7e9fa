//! # REST API for Spirits
//!
//! Hatching eggs and narrating the stories of hatched spirits.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use tracing::{error, info};

use crate::domain::pages::spirits;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/spirits/:slot/hatch", post(hatch_egg))
        .route("/spirits/:slot/narrate", post(narrate_spirit))
        .route("/narration/stop", post(stop_narration))
}

pub async fn hatch_egg(State(state): State<AppState>, Path(slot): Path<usize>) -> impl IntoResponse {
    info!("POST /api/spirits/{}/hatch", slot);

    match spirits::hatch_egg(&state.context, slot).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => {
            error!("Failed to hatch slot {}: {}", slot, e);
            e.into_response()
        }
    }
}

pub async fn narrate_spirit(State(state): State<AppState>, Path(slot): Path<usize>) -> impl IntoResponse {
    info!("POST /api/spirits/{}/narrate", slot);

    match spirits::narrate_slot(&state.context, slot) {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn stop_narration(State(state): State<AppState>) -> impl IntoResponse {
    info!("POST /api/narration/stop");
    (StatusCode::OK, Json(spirits::stop_narration(&state.context)))
}
