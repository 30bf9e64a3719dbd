//! Response model returned by the agent
//!
//! Bodies are `Bytes`, so cloning a response for the cache is cheap and the
//! stored snapshot can never be mutated through the returned copy.

use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::StatusCode;
use url::Url;

/// Distinguishes real responses from the terminal network-error response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseKind {
    Basic,
    Error,
}

/// A response produced by the network or served from a generation.
#[derive(Debug, Clone)]
pub struct AgentResponse {
    pub kind: ResponseKind,
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
    /// URL the response was fetched from, when known
    pub url: Option<Url>,
}

impl AgentResponse {
    pub fn new(status: StatusCode, headers: HeaderMap, body: impl Into<Bytes>) -> Self {
        Self {
            kind: ResponseKind::Basic,
            status,
            headers,
            body: body.into(),
            url: None,
        }
    }

    /// 200 response with the given content type.
    pub fn ok(content_type: &str, body: impl Into<Bytes>) -> Self {
        let mut headers = HeaderMap::new();
        if let Ok(value) = HeaderValue::from_str(content_type) {
            headers.insert(CONTENT_TYPE, value);
        }
        Self::new(StatusCode::OK, headers, body)
    }

    /// Terminal failure with no content, used when network and cache both miss.
    pub fn network_error() -> Self {
        Self {
            kind: ResponseKind::Error,
            status: StatusCode::BAD_GATEWAY,
            headers: HeaderMap::new(),
            body: Bytes::new(),
            url: None,
        }
    }

    pub fn with_url(mut self, url: Url) -> Self {
        self.url = Some(url);
        self
    }

    pub fn is_network_error(&self) -> bool {
        self.kind == ResponseKind::Error
    }

    /// True for a real response with a 2xx status.
    pub fn is_success(&self) -> bool {
        self.kind == ResponseKind::Basic && self.status.is_success()
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok())
    }
}
