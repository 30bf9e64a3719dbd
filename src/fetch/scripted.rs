//! Scripted fetcher with canned responses.
//!
//! Responses are keyed by URL (fragment stripped). Unknown URLs answer 404.
//! The fetcher can be switched offline, slowed down, and asked how many times
//! each URL was fetched.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use url::Url;

use super::Fetcher;
use crate::error::{AgentError, Result};
use crate::models::{AgentRequest, AgentResponse};

fn route_key(url: &Url) -> String {
    let mut url = url.clone();
    url.set_fragment(None);
    url.into()
}

#[derive(Debug, Default)]
pub struct ScriptedFetcher {
    routes: Mutex<HashMap<String, AgentResponse>>,
    calls: Mutex<HashMap<String, usize>>,
    offline: AtomicBool,
    latency: Mutex<Option<Duration>>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `response` for `url`, replacing any previous route.
    pub fn set_route(&self, url: &Url, response: AgentResponse) {
        if let Ok(mut routes) = self.routes.lock() {
            routes.insert(route_key(url), response);
        }
    }

    /// Shorthand for a 200 response with the given body.
    pub fn set_ok(&self, url: &Url, content_type: &str, body: &str) {
        self.set_route(url, AgentResponse::ok(content_type, body.to_string()));
    }

    pub fn remove_route(&self, url: &Url) {
        if let Ok(mut routes) = self.routes.lock() {
            routes.remove(&route_key(url));
        }
    }

    /// While offline every fetch fails with a network error.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn is_offline(&self) -> bool {
        self.offline.load(Ordering::SeqCst)
    }

    /// Delay applied before every fetch resolves.
    pub fn set_latency(&self, latency: Option<Duration>) {
        if let Ok(mut guard) = self.latency.lock() {
            *guard = latency;
        }
    }

    /// Number of fetches attempted for `url`, including failed ones.
    pub fn calls(&self, url: &Url) -> usize {
        self.calls
            .lock()
            .map(|calls| calls.get(&route_key(url)).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls
            .lock()
            .map(|calls| calls.values().sum())
            .unwrap_or(0)
    }
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    async fn fetch(&self, request: &AgentRequest) -> Result<AgentResponse> {
        let key = route_key(&request.url);
        if let Ok(mut calls) = self.calls.lock() {
            *calls.entry(key.clone()).or_insert(0) += 1;
        }

        let latency = self.latency.lock().ok().and_then(|guard| *guard);
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        if self.is_offline() {
            return Err(AgentError::Network(format!("offline: {}", request.url)));
        }

        let response = self
            .routes
            .lock()
            .map_err(|_| AgentError::Internal("route table poisoned".to_string()))?
            .get(&key)
            .cloned()
            .unwrap_or_else(|| AgentResponse::new(StatusCode::NOT_FOUND, HeaderMap::new(), ""));

        Ok(response.with_url(request.url.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[tokio::test]
    async fn test_scripted_route() {
        let fetcher = ScriptedFetcher::new();
        fetcher.set_ok(&url("http://localhost/a"), "text/plain", "A");

        let resp = fetcher.fetch(&AgentRequest::get(url("http://localhost/a#frag"))).await.unwrap();
        assert_eq!(&resp.body[..], b"A");
        assert_eq!(fetcher.calls(&url("http://localhost/a")), 1);
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let fetcher = ScriptedFetcher::new();
        let resp = fetcher.fetch(&AgentRequest::get(url("http://localhost/missing"))).await.unwrap();
        assert_eq!(resp.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_offline_fails_and_counts() {
        let fetcher = ScriptedFetcher::new();
        fetcher.set_ok(&url("http://localhost/a"), "text/plain", "A");
        fetcher.set_offline(true);

        let result = fetcher.fetch(&AgentRequest::get(url("http://localhost/a"))).await;
        assert!(matches!(result, Err(AgentError::Network(_))));
        assert_eq!(fetcher.total_calls(), 1);
    }
}
