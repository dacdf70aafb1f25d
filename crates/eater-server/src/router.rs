//! Axum router construction for the command API.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Build the complete Axum router for the command server.
///
/// The router includes:
/// - `POST /api/commands` -- deliver a command to the eater
/// - `GET /status` -- every status attribute
/// - `GET /status/{name}` -- one status attribute as text
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/commands", post(handlers::post_command))
        .route("/status", get(handlers::get_status))
        .route("/status/{name}", get(handlers::get_status_attr))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
