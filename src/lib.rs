//! Offline Agent - request interception and cache strategies for offline web apps
//!
//! Versioned cache generations, a three-way request router, and the
//! network-first, stale-while-revalidate and cache-first strategies.

pub mod agent;
pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod fetch;
pub mod lifecycle;
pub mod models;
pub mod router;
pub mod strategy;
pub mod tasks;

pub use agent::{Agent, Interception};
pub use api::AppState;
pub use config::{AgentConfig, HostConfig};
pub use error::{AgentError, Result};
pub use lifecycle::AgentState;
