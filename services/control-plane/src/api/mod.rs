//! HTTP API handlers and routing.

mod agents;
pub mod error;
mod workloads;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Create the Control API router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/envStatus", get(workloads::env_status))
        .route("/agentsStatus", get(agents::agents_status))
        .route("/agentPort", post(agents::agent_port))
        .route("/create", post(workloads::create))
        .route("/delete", post(workloads::delete))
        .route("/update", post(workloads::update))
        .route("/envNameStatus", post(workloads::env_name_status))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
