//! Workload endpoints: create, update, delete, and status views.
//!
//! Every successful call answers 201 Created; existing clients depend on
//! that status, so it is kept for all endpoints.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use tracing::info;

use crate::api::error::ApiError;
use crate::cluster::WorkloadSpec;
use crate::scheduler;
use crate::state::AppState;

/// `GET /envStatus` returns all registered workload specs.
pub async fn env_status(State(state): State<AppState>) -> impl IntoResponse {
    info!("workload status request");
    let cluster = state.cluster().lock().await;
    (StatusCode::CREATED, Json(cluster.workload_specs()))
}

/// `POST /envNameStatus` returns one workload with its hosting agents.
pub async fn env_name_status(
    State(state): State<AppState>,
    Json(name): Json<String>,
) -> Result<impl IntoResponse, ApiError> {
    info!(workload = %name, "workload assignment status request");
    let cluster = state.cluster().lock().await;
    match cluster.assignment_view(&name) {
        Some(view) => Ok((StatusCode::CREATED, Json(view))),
        None => Err(ApiError::not_found(format!("no such configuration: {name}"))),
    }
}

/// `POST /create` places a new workload across the pool.
pub async fn create(
    State(state): State<AppState>,
    Json(spec): Json<WorkloadSpec>,
) -> Result<impl IntoResponse, ApiError> {
    info!(workload = %spec.name, replicas = spec.replica_count, "create request");

    let mut cluster = state.cluster().lock().await;
    let result = scheduler::place(&mut cluster, state.agents(), &spec, 1).await;
    state.persist(&cluster).await;

    let outcome = result?;
    if outcome.ok() {
        Ok((StatusCode::CREATED, Json("Containers created".to_string())))
    } else {
        Err(ApiError::bad_request(outcome.detail()))
    }
}

/// `POST /update` scales, shrinks, or replaces an existing workload.
pub async fn update(
    State(state): State<AppState>,
    Json(spec): Json<WorkloadSpec>,
) -> Result<impl IntoResponse, ApiError> {
    info!(workload = %spec.name, replicas = spec.replica_count, "update request");

    let mut cluster = state.cluster().lock().await;
    let result = scheduler::apply_update(&mut cluster, state.agents(), &spec).await;
    state.persist(&cluster).await;

    let outcome = result?;
    if outcome.ok() {
        Ok((StatusCode::CREATED, Json("Update complete".to_string())))
    } else {
        Err(ApiError::bad_request(outcome.detail()))
    }
}

/// `POST /delete` tears down a whole workload.
pub async fn delete(
    State(state): State<AppState>,
    Json(name): Json<String>,
) -> Result<impl IntoResponse, ApiError> {
    info!(workload = %name, "delete request");

    let mut cluster = state.cluster().lock().await;
    let result = scheduler::remove_all(&mut cluster, state.agents(), &name, 1).await;
    state.persist(&cluster).await;

    let outcome = result?;
    if outcome.ok() {
        Ok((
            StatusCode::CREATED,
            Json(format!("configuration {name} deleted")),
        ))
    } else {
        Err(ApiError::bad_request(outcome.detail()))
    }
}
