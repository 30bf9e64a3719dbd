//! Agent
//!
//! The surface a host drives: `on_install`, `on_activate` and `on_intercept`,
//! standing in for the install, activate and fetch events.

use std::sync::Arc;

use tracing::{debug, error, warn};

use crate::cache::{CacheStorage, RequestKey};
use crate::config::AgentConfig;
use crate::error::Result;
use crate::fetch::Fetcher;
use crate::lifecycle::{ActivationReport, AgentState, InstallReport, LifecycleManager};
use crate::models::{AgentRequest, AgentResponse};
use crate::router::{classify, Route};
use crate::strategy::{NavigationFallbacks, StrategyExecutor};
use crate::tasks::RevalidationQueue;

/// What the host should do with an intercepted request.
#[derive(Debug, Clone)]
pub enum Interception {
    /// Not handled by the agent; send it to the network as if uncontrolled
    Passthrough,
    /// The agent's answer
    Respond(AgentResponse),
}

impl Interception {
    pub fn response(&self) -> Option<&AgentResponse> {
        match self {
            Interception::Passthrough => None,
            Interception::Respond(response) => Some(response),
        }
    }

    pub fn is_passthrough(&self) -> bool {
        matches!(self, Interception::Passthrough)
    }
}

#[derive(Debug)]
pub struct Agent {
    config: Arc<AgentConfig>,
    lifecycle: LifecycleManager,
    executor: StrategyExecutor,
}

impl Agent {
    /// Builds an agent over an injected store and fetcher.
    pub fn new(
        config: AgentConfig,
        storage: Arc<dyn CacheStorage>,
        fetcher: Arc<dyn Fetcher>,
    ) -> Result<Self> {
        let fallbacks = NavigationFallbacks {
            main_document: RequestKey::get(&config.resolve(&config.main_document)?),
            base_path: RequestKey::get(&config.resolve(&config.base_path)?),
        };
        let config = Arc::new(config);
        let lifecycle = LifecycleManager::new(config.clone(), storage.clone(), fetcher.clone());
        let executor = StrategyExecutor::new(storage, fetcher, RevalidationQueue::new(), fallbacks);

        Ok(Self {
            config,
            lifecycle,
            executor,
        })
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn state(&self) -> AgentState {
        self.lifecycle.state()
    }

    pub fn revalidations(&self) -> &RevalidationQueue {
        self.executor.queue()
    }

    pub async fn on_install(&self) -> Result<InstallReport> {
        self.lifecycle.install().await
    }

    pub async fn on_activate(&self) -> Result<ActivationReport> {
        self.lifecycle.activate().await
    }

    /// Answers one request. Uncontrolled pages and non-GET requests pass
    /// through; every intercepted GET gets exactly one response.
    pub async fn on_intercept(&self, request: &AgentRequest) -> Interception {
        if !self.lifecycle.is_controlling() {
            return Interception::Passthrough;
        }

        let route = classify(request, &self.config.scope);
        let result = match route {
            Route::Passthrough => return Interception::Passthrough,
            Route::NetworkFirst => {
                self.executor
                    .network_first(request, &self.config.core_generation())
                    .await
            }
            Route::StaleWhileRevalidate => {
                self.executor
                    .stale_while_revalidate(request, &self.config.runtime_generation())
                    .await
            }
            Route::CacheFirst => {
                self.executor
                    .cache_first(request, &self.config.runtime_generation())
                    .await
            }
        };

        match result {
            Ok(response) => {
                debug!(%route, url = %request.url, status = response.status.as_u16(), "intercepted");
                Interception::Respond(response)
            }
            Err(e) => {
                if e.is_network() {
                    warn!(%route, url = %request.url, "request failed: {}", e);
                } else {
                    error!(%route, url = %request.url, "request failed: {}", e);
                }
                Interception::Respond(AgentResponse::network_error())
            }
        }
    }

    /// Waits for background refreshes started so far.
    pub async fn settle(&self) {
        self.executor.queue().drain().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCacheStorage;
    use crate::fetch::ScriptedFetcher;
    use reqwest::Method;

    async fn active_agent() -> (Agent, Arc<ScriptedFetcher>, Arc<MemoryCacheStorage>) {
        let storage = Arc::new(MemoryCacheStorage::new());
        let fetcher = Arc::new(ScriptedFetcher::new());
        let config = AgentConfig::default();
        for asset in &config.core_assets {
            fetcher.set_ok(&config.resolve(asset).unwrap(), "text/html", "shell");
        }
        let agent = Agent::new(config, storage.clone(), fetcher.clone()).unwrap();
        agent.on_install().await.unwrap();
        agent.on_activate().await.unwrap();
        (agent, fetcher, storage)
    }

    #[tokio::test]
    async fn test_uncontrolled_agent_passes_through() {
        let agent = Agent::new(
            AgentConfig::default(),
            Arc::new(MemoryCacheStorage::new()),
            Arc::new(ScriptedFetcher::new()),
        )
        .unwrap();
        let req = AgentRequest::get(agent.config().resolve("./data.json").unwrap());

        assert!(agent.on_intercept(&req).await.is_passthrough());
    }

    #[tokio::test]
    async fn test_post_passes_through_without_cache_access() {
        let (agent, fetcher, storage) = active_agent().await;
        let before = storage.stats().await;
        let calls = fetcher.total_calls();

        let req = AgentRequest::get(agent.config().resolve("./api/score").unwrap())
            .with_method(Method::POST)
            .with_body("42");
        assert!(agent.on_intercept(&req).await.is_passthrough());

        let after = storage.stats().await;
        assert_eq!(before.hits + before.misses, after.hits + after.misses);
        assert_eq!(before.writes, after.writes);
        assert_eq!(fetcher.total_calls(), calls);
    }

    #[tokio::test]
    async fn test_failure_becomes_network_error_response() {
        let (agent, fetcher, _) = active_agent().await;
        fetcher.set_offline(true);

        let req = AgentRequest::get(agent.config().resolve("./data/never-seen.json").unwrap());
        let interception = agent.on_intercept(&req).await;

        assert!(interception.response().unwrap().is_network_error());
    }

    #[tokio::test]
    async fn test_navigation_served_from_core_when_offline() {
        let (agent, fetcher, _) = active_agent().await;
        fetcher.set_offline(true);

        let req = AgentRequest::navigate(agent.config().resolve("./some/route").unwrap());
        let interception = agent.on_intercept(&req).await;

        let response = interception.response().unwrap();
        assert!(response.is_success());
        assert_eq!(&response.body[..], b"shell");
    }
}
