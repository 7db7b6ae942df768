//! Agent pool endpoints: registration and status.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use tracing::info;

use crate::api::error::ApiError;
use crate::state::AppState;

/// `GET /agentsStatus` returns every agent record, active or tombstoned.
pub async fn agents_status(State(state): State<AppState>) -> impl IntoResponse {
    info!("agent pool status request");
    let cluster = state.cluster().lock().await;
    (StatusCode::CREATED, Json(cluster.agent_views()))
}

/// `POST /agentPort` handles an agent announcing the port it bound.
///
/// The body is the port as a JSON string, which is what the agent's
/// bootstrap sends.
pub async fn agent_port(
    State(state): State<AppState>,
    Json(port): Json<String>,
) -> Result<impl IntoResponse, ApiError> {
    let parsed: u16 = port
        .parse()
        .map_err(|_| ApiError::bad_request(format!("invalid agent port: {port}")))?;

    let mut cluster = state.cluster().lock().await;
    let registration = cluster.register_agent(parsed);
    state.persist(&cluster).await;

    info!(agent_id = %registration.agent_id(), port = parsed, "agent registered");
    Ok((StatusCode::CREATED, Json(port)))
}
