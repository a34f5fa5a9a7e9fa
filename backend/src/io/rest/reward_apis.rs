//! # REST API for Rewards
//!
//! Reward management plus the first step of a redemption. Redeeming only
//! opens the confirm modal; `/api/modal/confirm` records it.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{post, put},
    Json, Router,
};
use shared::{CreateRewardRequest, UpdateRewardRequest};
use tracing::{error, info};

use crate::domain::pages::{settings, shop};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/rewards", post(create_reward))
        .route("/rewards/:id", put(update_reward).delete(delete_reward))
        .route("/rewards/:id/redeem", post(redeem_reward))
}

/// Ask to redeem a reward for the active child
pub async fn redeem_reward(State(state): State<AppState>, Path(reward_id): Path<String>) -> impl IntoResponse {
    info!("POST /api/rewards/{}/redeem", reward_id);

    match shop::request_redemption(&state.context, &reward_id) {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => {
            error!("Failed to request redemption of {}: {}", reward_id, e);
            e.into_response()
        }
    }
}

pub async fn create_reward(
    State(state): State<AppState>,
    Json(request): Json<CreateRewardRequest>,
) -> impl IntoResponse {
    info!("POST /api/rewards - request: {:?}", request);

    match settings::create_reward(&state.context, request).await {
        Ok(reward) => (StatusCode::CREATED, Json(reward)).into_response(),
        Err(e) => {
            error!("Failed to create reward: {}", e);
            e.into_response()
        }
    }
}

pub async fn update_reward(
    State(state): State<AppState>,
    Path(reward_id): Path<String>,
    Json(request): Json<UpdateRewardRequest>,
) -> impl IntoResponse {
    info!("PUT /api/rewards/{} - request: {:?}", reward_id, request);

    match settings::update_reward(&state.context, &reward_id, request).await {
        Ok(reward) => (StatusCode::OK, Json(reward)).into_response(),
        Err(e) => {
            error!("Failed to update reward {}: {}", reward_id, e);
            e.into_response()
        }
    }
}

pub async fn delete_reward(State(state): State<AppState>, Path(reward_id): Path<String>) -> impl IntoResponse {
    info!("DELETE /api/rewards/{}", reward_id);

    match settings::delete_reward(&state.context, &reward_id).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => {
            error!("Failed to delete reward {}: {}", reward_id, e);
            e.into_response()
        }
    }
}
