//! # REST API for Data Export
//!
//! Daily points of the active child as CSV. The UI offers the returned
//! data as a download under the returned file name.

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use tracing::{error, info};

use crate::domain::pages::scores;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/export/daily-points", get(export_daily_points))
}

pub async fn export_daily_points(State(state): State<AppState>) -> impl IntoResponse {
    info!("GET /api/export/daily-points");

    match scores::export_daily_points(&state.context) {
        Ok(response) => {
            info!("✅ EXPORT: Generated {}", response.filename);
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => {
            error!("❌ EXPORT: Failed to export daily points: {}", e);
            e.into_response()
        }
    }
}
