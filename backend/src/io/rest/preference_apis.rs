//! # REST API for Local Preferences

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use shared::UpdatePreferencesRequest;
use tracing::{error, info};

use crate::domain::pages::settings;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/preferences", get(get_preferences).put(update_preferences))
}

pub async fn get_preferences(State(state): State<AppState>) -> impl IntoResponse {
    info!("GET /api/preferences");
    Json(settings::get_preferences(&state.context))
}

pub async fn update_preferences(
    State(state): State<AppState>,
    Json(request): Json<UpdatePreferencesRequest>,
) -> impl IntoResponse {
    info!("PUT /api/preferences - request: {:?}", request);

    match settings::update_preferences(&state.context, request) {
        Ok(preferences) => (StatusCode::OK, Json(preferences)).into_response(),
        Err(e) => {
            error!("Failed to update preferences: {}", e);
            e.into_response()
        }
    }
}
