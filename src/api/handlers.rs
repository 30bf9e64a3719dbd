//! API Handlers
//!
//! The fallback handler turns every page request into an `AgentRequest`,
//! lets the agent answer it, and forwards pass-through requests upstream.
//! Two control endpoints report health and cache statistics.

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    extract::{Request, State},
    http::{request::Parts, HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use url::Url;

use crate::agent::{Agent, Interception};
use crate::cache::{CacheStorage, MemoryCacheStorage};
use crate::error::{AgentError, Result};
use crate::fetch::Fetcher;
use crate::models::{AgentRequest, AgentResponse, Destination, HealthResponse, RequestMode, StatsResponse};

/// Largest request body the host buffers before forwarding.
pub const MAX_REQUEST_BODY: usize = 8 * 1024 * 1024;

/// Marks responses the agent answered itself.
pub const SERVED_BY_AGENT: &str = "x-offline-agent";

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub agent: Arc<Agent>,
    /// Same store the agent was built over; read for statistics
    pub storage: Arc<MemoryCacheStorage>,
    /// Used for requests the agent passes through
    pub fetcher: Arc<dyn Fetcher>,
}

impl AppState {
    pub fn new(agent: Arc<Agent>, storage: Arc<MemoryCacheStorage>, fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            agent,
            storage,
            fetcher,
        }
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Resolves the request target. Absolute-form targets (forward proxy style)
/// keep their own origin; origin-form targets always stay on the scope's
/// origin, even when the path starts with `//`.
fn request_url(parts: &Parts, scope: &Url) -> Result<Url> {
    let uri = &parts.uri;
    if uri.scheme().is_some() && uri.authority().is_some() {
        return Ok(Url::parse(&uri.to_string())?);
    }
    let mut url = scope.clone();
    url.set_path(uri.path());
    url.set_query(uri.query());
    url.set_fragment(None);
    Ok(url)
}

/// Builds the agent's view of an incoming request.
pub fn to_agent_request(parts: &Parts, body: bytes::Bytes, scope: &Url) -> Result<AgentRequest> {
    let url = request_url(parts, scope)?;
    let mode = header_str(&parts.headers, "sec-fetch-mode")
        .map(RequestMode::from_header)
        .unwrap_or_default();
    let destination = header_str(&parts.headers, "sec-fetch-dest")
        .map(Destination::from_header)
        .unwrap_or_default();

    Ok(AgentRequest {
        method: parts.method.clone(),
        url,
        mode,
        destination,
        headers: parts.headers.clone(),
        body,
    })
}

impl IntoResponse for AgentResponse {
    fn into_response(self) -> Response {
        if self.is_network_error() {
            return (self.status, Body::empty()).into_response();
        }
        let mut response = (self.status, Body::from(self.body)).into_response();
        let headers = response.headers_mut();
        for (name, value) in self.headers.iter() {
            headers.append(name.clone(), value.clone());
        }
        response
    }
}

/// Fallback handler: every path not claimed by a control endpoint.
pub async fn intercept_handler(State(state): State<AppState>, request: Request) -> Result<Response> {
    let (parts, body) = request.into_parts();
    let body = to_bytes(body, MAX_REQUEST_BODY)
        .await
        .map_err(|e| AgentError::InvalidRequest(format!("unreadable body: {}", e)))?;
    let request = to_agent_request(&parts, body, &state.agent.config().scope)?;

    match state.agent.on_intercept(&request).await {
        Interception::Respond(response) => {
            let served = !response.is_network_error();
            let mut response = response.into_response();
            if served {
                response
                    .headers_mut()
                    .insert(SERVED_BY_AGENT, HeaderValue::from_static("1"));
            }
            Ok(response)
        }
        Interception::Passthrough => {
            let response = state.fetcher.fetch(&request).await?;
            Ok(response.into_response())
        }
    }
}

/// Handler for GET /__agent/health
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse::healthy(state.agent.state().as_str()))
}

/// Handler for GET /__agent/stats
pub async fn stats_handler(State(state): State<AppState>) -> Result<Json<StatsResponse>> {
    let generations = state.storage.keys().await?;
    let stats = state.storage.stats().await;

    Ok(Json(StatsResponse::new(
        state.agent.config().version_tag.clone(),
        generations,
        &stats,
        state.agent.revalidations().pending(),
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AgentConfig;
    use crate::fetch::ScriptedFetcher;
    use axum::http::{Method, Request as HttpRequest};

    fn parts(builder: axum::http::request::Builder) -> Parts {
        builder.body(()).unwrap().into_parts().0
    }

    fn scope() -> Url {
        Url::parse("http://localhost:8080/").unwrap()
    }

    #[test]
    fn test_to_agent_request_reads_fetch_metadata() {
        let parts = parts(
            HttpRequest::builder()
                .uri("/index.html?x=1")
                .header("sec-fetch-mode", "navigate")
                .header("sec-fetch-dest", "document"),
        );
        let req = to_agent_request(&parts, bytes::Bytes::new(), &scope()).unwrap();

        assert_eq!(req.url.as_str(), "http://localhost:8080/index.html?x=1");
        assert_eq!(req.mode, RequestMode::Navigate);
        assert_eq!(req.destination, Destination::Document);
        assert!(req.is_navigation());
    }

    #[test]
    fn test_to_agent_request_absolute_form() {
        let parts = parts(
            HttpRequest::builder()
                .method(Method::GET)
                .uri("https://cdn.example/lib.js"),
        );
        let req = to_agent_request(&parts, bytes::Bytes::new(), &scope()).unwrap();
        assert_eq!(req.url.as_str(), "https://cdn.example/lib.js");
    }

    #[test]
    fn test_double_slash_path_stays_on_scope_origin() {
        let parts = parts(HttpRequest::builder().uri("//cdn.example/x.json?v=2"));
        let req = to_agent_request(&parts, bytes::Bytes::new(), &scope()).unwrap();

        assert_eq!(req.url.host_str(), Some("localhost"));
        assert_eq!(req.url.port(), Some(8080));
        assert_eq!(req.url.path(), "//cdn.example/x.json");
        assert_eq!(req.url.query(), Some("v=2"));
    }

    #[test]
    fn test_network_error_response_has_no_body() {
        let response = AgentResponse::network_error().into_response();
        assert_eq!(response.status(), axum::http::StatusCode::BAD_GATEWAY);
        assert!(response.headers().get("x-offline-agent").is_none());
    }

    #[tokio::test]
    async fn test_health_handler_reports_state() {
        let storage = Arc::new(MemoryCacheStorage::new());
        let fetcher = Arc::new(ScriptedFetcher::new());
        let agent = Agent::new(AgentConfig::default(), storage.clone(), fetcher.clone()).unwrap();
        let state = AppState::new(Arc::new(agent), storage, fetcher);

        let response = health_handler(State(state)).await;
        assert_eq!(response.status, "healthy");
        assert_eq!(response.agent_state, "parsed");
    }
}
