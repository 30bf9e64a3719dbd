//! Network fetch seam.
//!
//! The agent never talks to the network directly; it goes through a
//! [`Fetcher`]. A fetch that yields any HTTP response (including 404 or 500)
//! is a success at this layer. Only transport failures are errors.
//!
//! - [`HttpFetcher`]: reqwest-backed, used by the host binary.
//! - [`ScriptedFetcher`]: deterministic responses with an offline switch.

pub mod http;
pub mod scripted;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{AgentRequest, AgentResponse};

pub use http::{FetchConfig, HttpFetcher};
pub use scripted::ScriptedFetcher;

/// Performs live network requests on behalf of the agent.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch the request. `Err` means the network could not be reached.
    async fn fetch(&self, request: &AgentRequest) -> Result<AgentResponse>;
}
