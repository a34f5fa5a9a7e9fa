//! # REST API for Rendered Pages
//!
//! Opening a page makes it the session's render target and returns its
//! first rendering. Later renderings (after a sync or an action) are
//! fetched with a long poll on `/api/view`.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use shared::Screen;
use std::time::Duration;
use tracing::{info, warn};

use crate::AppState;

/// Upper bound of a long poll
pub const MAX_LONG_POLL: Duration = Duration::from_secs(25);

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/pages/:screen", get(open_page))
        .route("/view", get(get_view))
}

/// Open a screen and return its rendering
pub async fn open_page(State(state): State<AppState>, Path(screen): Path<String>) -> impl IntoResponse {
    info!("GET /api/pages/{}", screen);

    match Screen::from_slug(&screen) {
        Some(screen) => (StatusCode::OK, Json(state.context.open_page(screen))).into_response(),
        None => {
            warn!("Unknown screen requested: {}", screen);
            (StatusCode::NOT_FOUND, format!("Unknown screen: {}", screen)).into_response()
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ViewQuery {
    /// Last version the UI has seen; omitted means "whatever is current"
    pub after: Option<u64>,
    pub timeout_ms: Option<u64>,
}

/// Latest rendering, waiting for one newer than `after`
pub async fn get_view(State(state): State<AppState>, Query(query): Query<ViewQuery>) -> impl IntoResponse {
    let scheduler = state.context.scheduler();
    let response = match query.after {
        Some(after) => {
            let timeout = query
                .timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(MAX_LONG_POLL)
                .min(MAX_LONG_POLL);
            scheduler.wait_for_newer(after, timeout).await
        }
        None => scheduler.latest(),
    };
    (StatusCode::OK, Json(response))
}
