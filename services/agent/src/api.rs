//! Agent HTTP API.
//!
//! Three routes, all acknowledged with 201 Created on success:
//! `POST /runContainer`, `POST /deleteContainer`, `GET /isAgentActive`.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::runtime::ContainerRuntime;

/// One replica of a workload, as the control plane sends it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerSpec {
    pub index: i64,
    pub configuration_name: String,
    pub image: String,
}

impl ContainerSpec {
    pub fn derived_name(&self) -> String {
        format!("{}{}", self.configuration_name, self.index)
    }
}

#[derive(Clone)]
pub struct AppState {
    runtime: Arc<dyn ContainerRuntime>,
}

impl AppState {
    pub fn new(runtime: Arc<dyn ContainerRuntime>) -> Self {
        Self { runtime }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/runContainer", post(run_container))
        .route("/deleteContainer", post(delete_container))
        .route("/isAgentActive", get(is_agent_active))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn run_container(
    State(state): State<AppState>,
    Json(spec): Json<ContainerSpec>,
) -> impl IntoResponse {
    let name = spec.derived_name();
    info!(container = %name, image = %spec.image, "run container request");

    match state.runtime.run(&spec.image, &name).await {
        Ok(()) => (StatusCode::CREATED, Json("container created".to_string())),
        Err(e) => {
            warn!(container = %name, error = %e, "could not create container");
            (
                StatusCode::BAD_REQUEST,
                Json("could not create container".to_string()),
            )
        }
    }
}

async fn delete_container(
    State(state): State<AppState>,
    Json(name): Json<String>,
) -> impl IntoResponse {
    info!(container = %name, "delete container request");

    match state.runtime.remove(&name).await {
        Ok(()) => (StatusCode::CREATED, Json(name)),
        Err(e) => {
            warn!(container = %name, error = %e, "could not remove container");
            (
                StatusCode::BAD_REQUEST,
                Json(format!("failed to remove container {name}")),
            )
        }
    }
}

/// Liveness probe for the control plane health loop.
async fn is_agent_active() -> StatusCode {
    StatusCode::CREATED
}
