//! Error types for the offline agent
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Agent Error Enum ==
/// Unified error type for the agent and its host.
#[derive(Error, Debug)]
pub enum AgentError {
    /// Transport-level fetch failure (offline, DNS, connection reset)
    #[error("Network error: {0}")]
    Network(String),

    /// Upstream answered with a status that cannot be used
    #[error("Unexpected status {status} for {url}")]
    Status { status: u16, url: String },

    /// Cache storage could not complete an operation
    #[error("Storage error: {0}")]
    Storage(String),

    /// Malformed request or configuration input
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Internal failure (lifecycle misuse, task panics)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AgentError {
    /// Returns true for failures caused by the network rather than storage.
    pub fn is_network(&self) -> bool {
        matches!(self, AgentError::Network(_) | AgentError::Status { .. })
    }
}

impl From<url::ParseError> for AgentError {
    fn from(err: url::ParseError) -> Self {
        AgentError::InvalidRequest(format!("invalid URL: {}", err))
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for AgentError {
    fn into_response(self) -> Response {
        let status = match &self {
            AgentError::Network(_) | AgentError::Status { .. } => StatusCode::BAD_GATEWAY,
            AgentError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AgentError::Storage(_) | AgentError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the offline agent.
pub type Result<T> = std::result::Result<T, AgentError>;
