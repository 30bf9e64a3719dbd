//! reqwest-backed fetcher.
//!
//! Requests addressed to the agent's own origin can be rewritten to an
//! upstream origin, so the host can sit in front of the real app server.

use std::time::Instant;

use async_trait::async_trait;
use reqwest::header::{self, HeaderMap};
use reqwest::{Client, Method};
use url::Url;

use super::Fetcher;
use crate::error::{AgentError, Result};
use crate::models::{AgentRequest, AgentResponse};

/// Configuration for the HTTP fetcher.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "offline-agent/0.1")
    pub user_agent: String,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "offline-agent/0.1".to_string(),
            max_redirects: 5,
        }
    }
}

/// Maps one origin onto another before sending.
#[derive(Debug, Clone)]
struct OriginRewrite {
    from: Url,
    to: Url,
}

impl OriginRewrite {
    fn apply(&self, url: &Url) -> Url {
        if url.origin() != self.from.origin() {
            return url.clone();
        }
        let mut rewritten = url.clone();
        // Scheme/host/port of a parsed origin URL are always settable
        let _ = rewritten.set_scheme(self.to.scheme());
        let _ = rewritten.set_host(self.to.host_str());
        let _ = rewritten.set_port(self.to.port());
        rewritten
    }
}

/// HTTP fetcher. No timeout is imposed; the transport's own limits apply.
pub struct HttpFetcher {
    http: Client,
    config: FetchConfig,
    rewrite: Option<OriginRewrite>,
}

impl HttpFetcher {
    /// Create a new fetcher with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| AgentError::Internal(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            config,
            rewrite: None,
        })
    }

    /// Send requests for `from`'s origin to `to`'s origin instead.
    pub fn with_origin_rewrite(mut self, from: Url, to: Url) -> Self {
        self.rewrite = Some(OriginRewrite { from, to });
        self
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    fn target(&self, url: &Url) -> Url {
        match &self.rewrite {
            Some(rewrite) => rewrite.apply(url),
            None => url.clone(),
        }
    }
}

/// Drops headers that describe the hop to the agent, not the request
/// itself. Reads also lose their validators: the page's conditional headers
/// refer to its own copy, and a `304` carries nothing the cache can keep.
fn forwardable_headers(method: &Method, headers: &HeaderMap) -> HeaderMap {
    let mut forwarded = headers.clone();
    for name in [
        header::HOST,
        header::CONNECTION,
        header::CONTENT_LENGTH,
        header::TRANSFER_ENCODING,
        header::ACCEPT_ENCODING,
    ] {
        forwarded.remove(name);
    }
    if *method == Method::GET || *method == Method::HEAD {
        for name in [
            header::IF_NONE_MATCH,
            header::IF_MODIFIED_SINCE,
            header::IF_MATCH,
            header::IF_UNMODIFIED_SINCE,
            header::IF_RANGE,
        ] {
            forwarded.remove(name);
        }
    }
    forwarded
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: &AgentRequest) -> Result<AgentResponse> {
        let start = Instant::now();
        let target = self.target(&request.url);

        let response = self
            .http
            .request(request.method.clone(), target.clone())
            .headers(forwardable_headers(&request.method, &request.headers))
            .body(request.body.clone())
            .send()
            .await
            .map_err(|e| AgentError::Network(format!("{}: {}", target, e)))?;

        let status = response.status();
        let mut headers = response.headers().clone();
        // Body is decoded; the original framing headers no longer apply
        headers.remove(header::CONTENT_ENCODING);
        headers.remove(header::CONTENT_LENGTH);
        headers.remove(header::TRANSFER_ENCODING);

        let body = response
            .bytes()
            .await
            .map_err(|e| AgentError::Network(format!("failed to read {}: {}", target, e)))?;

        tracing::debug!(
            "fetched {} {} -> {} in {}ms ({} bytes)",
            request.method,
            target,
            status.as_u16(),
            start.elapsed().as_millis(),
            body.len()
        );

        Ok(AgentResponse::new(status, headers, body).with_url(request.url.clone()))
    }
}
