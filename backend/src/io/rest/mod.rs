//! # REST API Interface Layer
//!
//! HTTP endpoints of the local bridge between the browser UI and the
//! session. Handlers are thin: they log the request, call one page
//! controller and translate its result. Every module exposes a `router()`
//! with paths relative to `/api`; [`api_routes`] merges them.
//!
//! Controller errors become JSON [`shared::ActionResponse`] bodies with a
//! status from [`error::status_for`]. The same message has already been
//! raised as a toast by the controller.

pub mod child_apis;
pub mod error;
pub mod export_apis;
pub mod modal_apis;
pub mod page_apis;
pub mod preference_apis;
pub mod reward_apis;
pub mod session_apis;
pub mod spirit_apis;
pub mod task_apis;
pub mod toast_apis;

use axum::Router;

use crate::AppState;

/// Every endpoint, relative to `/api`
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(session_apis::router())
        .merge(page_apis::router())
        .merge(task_apis::router())
        .merge(reward_apis::router())
        .merge(spirit_apis::router())
        .merge(modal_apis::router())
        .merge(child_apis::router())
        .merge(toast_apis::router())
        .merge(preference_apis::router())
        .merge(export_apis::router())
}
