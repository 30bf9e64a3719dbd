//! API Module
//!
//! HTTP host that drives the agent.
//!
//! # Endpoints
//! - `GET /__agent/health` - Health check endpoint
//! - `GET /__agent/stats` - Cache statistics
//! - `*` - Intercepted by the agent or passed through upstream

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
