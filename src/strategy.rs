//! Strategy Executor
//!
//! The three caching strategies. Each takes a request and a generation name
//! and produces a response or an error the caller turns into a network-error
//! response.
//!
//! Per request: `PENDING -> CACHE_HIT` or
//! `PENDING -> CACHE_MISS -> FETCHING -> FETCH_OK | FETCH_FAIL -> FALLBACK`.
//!
//! The store is never locked across a lookup-then-put, so two concurrent
//! requests for one URL may both fetch and both write; the later write wins.
//! Each strategy opens its generation when the request arrives and writes
//! through that handle, so a fetch that outlives an activation never
//! resurrects a purged generation.
//!
//! Only whole, final responses are stored: no partial content, no
//! `304 Not Modified`, nothing fetched for a `Range` request.

use std::sync::Arc;

use reqwest::StatusCode;
use tracing::{debug, warn};

use crate::cache::{CacheStorage, CachedEntry, GenerationHandle, RequestKey};
use crate::error::Result;
use crate::fetch::Fetcher;
use crate::models::{AgentRequest, AgentResponse};
use crate::tasks::RevalidationQueue;

/// Keys tried, in order, when a navigation cannot reach the network.
#[derive(Debug, Clone)]
pub struct NavigationFallbacks {
    pub main_document: RequestKey,
    pub base_path: RequestKey,
}

#[derive(Clone)]
pub struct StrategyExecutor {
    storage: Arc<dyn CacheStorage>,
    fetcher: Arc<dyn Fetcher>,
    queue: RevalidationQueue,
    fallbacks: NavigationFallbacks,
}

impl StrategyExecutor {
    pub fn new(
        storage: Arc<dyn CacheStorage>,
        fetcher: Arc<dyn Fetcher>,
        queue: RevalidationQueue,
        fallbacks: NavigationFallbacks,
    ) -> Self {
        Self {
            storage,
            fetcher,
            queue,
            fallbacks,
        }
    }

    pub fn queue(&self) -> &RevalidationQueue {
        &self.queue
    }

    /// Entry from `generation`, else from any live generation, so precached
    /// core assets also answer sub-resource requests.
    async fn cached(&self, generation: &str, key: &RequestKey) -> Result<Option<CachedEntry>> {
        match self.storage.lookup(generation, key).await? {
            Some(entry) => Ok(Some(entry)),
            None => self.storage.lookup_any(key).await,
        }
    }

    // == Network First ==
    /// Live fetch, stored into `generation` on success. On network failure
    /// falls back to the cached request, then the main document, then the
    /// base path.
    pub async fn network_first(&self, request: &AgentRequest, generation: &str) -> Result<AgentResponse> {
        let handle = self.storage.open(generation).await?;
        let key = request.key();
        match self.fetcher.fetch(request).await {
            Ok(fresh) => {
                store(self.storage.as_ref(), &handle, request, key, &fresh).await;
                debug!(url = %request.url, "network-first: fresh");
                Ok(fresh)
            }
            Err(err) => {
                debug!(url = %request.url, "network-first: {}, trying cache", err);
                if let Some(entry) = self.cached(generation, &key).await? {
                    return Ok(entry.into_response());
                }
                for fallback in [&self.fallbacks.main_document, &self.fallbacks.base_path] {
                    if let Some(entry) = self.storage.lookup_any(fallback).await? {
                        debug!(url = %request.url, fallback = %fallback, "network-first: serving fallback");
                        return Ok(entry.into_response());
                    }
                }
                Err(err)
            }
        }
    }

    // == Stale While Revalidate ==
    /// Serves the cached entry immediately when present and refreshes it in
    /// the background. With no cached entry the caller waits for the fetch.
    pub async fn stale_while_revalidate(
        &self,
        request: &AgentRequest,
        generation: &str,
    ) -> Result<AgentResponse> {
        let handle = self.storage.open(generation).await?;
        let key = request.key();
        let cached = self.cached(generation, &key).await?;

        match cached {
            Some(entry) => {
                debug!(
                    url = %request.url,
                    age_ms = entry.age().num_milliseconds(),
                    "stale-while-revalidate: cache hit"
                );
                let response = entry.to_response();
                let storage = self.storage.clone();
                let fetcher = self.fetcher.clone();
                let request = request.clone();
                self.queue.spawn(async move {
                    let url = request.url.clone();
                    if let Err(e) = revalidate(storage, fetcher, request, handle, key, Some(entry)).await {
                        debug!(url = %url, "background revalidation failed: {}", e);
                    }
                });
                Ok(response)
            }
            None => {
                debug!(url = %request.url, "stale-while-revalidate: miss, waiting on network");
                revalidate(
                    self.storage.clone(),
                    self.fetcher.clone(),
                    request.clone(),
                    handle,
                    key,
                    None,
                )
                .await
            }
        }
    }

    // == Cache First ==
    /// Cached entry if present, otherwise fetch and store. No refresh.
    pub async fn cache_first(&self, request: &AgentRequest, generation: &str) -> Result<AgentResponse> {
        let handle = self.storage.open(generation).await?;
        let key = request.key();
        if let Some(entry) = self.cached(generation, &key).await? {
            debug!(url = %request.url, age_ms = entry.age().num_milliseconds(), "cache-first: hit");
            return Ok(entry.into_response());
        }

        let fresh = self.fetcher.fetch(request).await?;
        store(self.storage.as_ref(), &handle, request, key, &fresh).await;
        debug!(url = %request.url, "cache-first: fetched");
        Ok(fresh)
    }
}

/// Fetch and overwrite; on network failure resolve to the previous entry.
async fn revalidate(
    storage: Arc<dyn CacheStorage>,
    fetcher: Arc<dyn Fetcher>,
    request: AgentRequest,
    generation: GenerationHandle,
    key: RequestKey,
    previous: Option<CachedEntry>,
) -> Result<AgentResponse> {
    match fetcher.fetch(&request).await {
        Ok(fresh) => {
            store(storage.as_ref(), &generation, &request, key, &fresh).await;
            Ok(fresh)
        }
        Err(err) => previous.map(CachedEntry::into_response).ok_or(err),
    }
}

/// True if `response` is a complete copy of the resource worth keeping.
fn is_storable(request: &AgentRequest, response: &AgentResponse) -> bool {
    !response.is_network_error()
        && !request.is_range()
        && response.status != StatusCode::PARTIAL_CONTENT
        && response.status != StatusCode::NOT_MODIFIED
}

/// Writes are best-effort: a failed put never fails the response it copies.
async fn store(
    storage: &dyn CacheStorage,
    generation: &GenerationHandle,
    request: &AgentRequest,
    key: RequestKey,
    response: &AgentResponse,
) {
    if !is_storable(request, response) {
        debug!(key = %key, status = response.status.as_u16(), "response not stored");
        return;
    }
    match storage.put(generation, key.clone(), response.clone()).await {
        Ok(true) => {}
        Ok(false) => debug!(generation = %generation, key = %key, "generation retired, response not stored"),
        Err(e) => warn!(generation = %generation, key = %key, "cache write failed: {}", e),
    }
}

impl std::fmt::Debug for StrategyExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StrategyExecutor")
            .field("fallbacks", &self.fallbacks)
            .field("pending_revalidations", &self.queue.pending())
            .finish()
    }
}
