use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::cluster::ClusterError;

/// Control API error: a client-error status plus a descriptive string body.
///
/// Request failures never take the process down; everything surfaces to the
/// caller as a status and a message.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::CONFLICT,
            message: message.into(),
        }
    }
}

impl From<ClusterError> for ApiError {
    fn from(err: ClusterError) -> Self {
        match err {
            ClusterError::EmptyName
            | ClusterError::EmptyImage
            | ClusterError::NegativeReplicas
            | ClusterError::NoAgents => Self::bad_request(err.to_string()),
            ClusterError::AlreadyExists(_) => Self::conflict(err.to_string()),
            ClusterError::NotFound(_) => Self::not_found(err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::warn!(status = %self.status, message = %self.message, "request failed");
        (self.status, Json(format!("error: {}", self.message))).into_response()
    }
}
