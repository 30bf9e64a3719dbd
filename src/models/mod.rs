//! Request and response models for the agent
//!
//! `AgentRequest`/`AgentResponse` are what the agent intercepts and returns;
//! `status` holds the JSON DTOs of the host control endpoints.

pub mod request;
pub mod response;
pub mod status;

// Re-export commonly used types
pub use request::{AgentRequest, Destination, RequestMode};
pub use response::{AgentResponse, ResponseKind};
pub use status::{HealthResponse, StatsResponse};
