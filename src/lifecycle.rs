//! Lifecycle Manager
//!
//! Creates and retires cache generations in step with version changes:
//!
//! - **install** opens the core generation and caches each core asset on its
//!   own, so one unreachable asset never blocks the rest.
//! - **activate** deletes every generation whose name is not the current core
//!   or runtime name, then claims open pages.
//!
//! Storage failures are not retried; they abort the phase and leave the agent
//! redundant.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use tracing::{debug, info, warn};

use crate::cache::{CacheStorage, GenerationHandle, RequestKey};
use crate::config::AgentConfig;
use crate::error::{AgentError, Result};
use crate::fetch::Fetcher;
use crate::models::AgentRequest;

/// Where the agent is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentState {
    Parsed,
    Installing,
    Installed,
    Activating,
    Activated,
    /// A lifecycle phase failed; the agent never serves requests
    Redundant,
}

impl AgentState {
    pub fn as_str(self) -> &'static str {
        match self {
            AgentState::Parsed => "parsed",
            AgentState::Installing => "installing",
            AgentState::Installed => "installed",
            AgentState::Activating => "activating",
            AgentState::Activated => "activated",
            AgentState::Redundant => "redundant",
        }
    }
}

impl fmt::Display for AgentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of an install.
#[derive(Debug, Clone)]
pub struct InstallReport {
    pub generation: String,
    /// Assets stored, in list order
    pub cached: Vec<String>,
    /// Assets skipped because of a network error or non-2xx status
    pub failed: Vec<String>,
}

/// Outcome of an activation.
#[derive(Debug, Clone)]
pub struct ActivationReport {
    pub deleted: Vec<String>,
    pub retained: Vec<String>,
    /// Open pages are now controlled by this agent
    pub claimed: bool,
}

pub struct LifecycleManager {
    config: Arc<AgentConfig>,
    storage: Arc<dyn CacheStorage>,
    fetcher: Arc<dyn Fetcher>,
    state: RwLock<AgentState>,
    controlling: AtomicBool,
}

impl LifecycleManager {
    pub fn new(
        config: Arc<AgentConfig>,
        storage: Arc<dyn CacheStorage>,
        fetcher: Arc<dyn Fetcher>,
    ) -> Self {
        Self {
            config,
            storage,
            fetcher,
            state: RwLock::new(AgentState::Parsed),
            controlling: AtomicBool::new(false),
        }
    }

    pub fn state(&self) -> AgentState {
        self.state
            .read()
            .map(|state| *state)
            .unwrap_or(AgentState::Redundant)
    }

    fn set_state(&self, next: AgentState) {
        if let Ok(mut state) = self.state.write() {
            debug!("agent state {} -> {}", *state, next);
            *state = next;
        }
    }

    /// True once `activate` has claimed open pages.
    pub fn is_controlling(&self) -> bool {
        self.controlling.load(Ordering::SeqCst)
    }

    // == Install ==
    /// Opens the core generation and populates it best-effort.
    pub async fn install(&self) -> Result<InstallReport> {
        let state = self.state();
        if state != AgentState::Parsed {
            return Err(AgentError::Internal(format!("cannot install from state {}", state)));
        }
        self.set_state(AgentState::Installing);

        let generation = self.config.core_generation();
        let handle = match self.storage.open(&generation).await {
            Ok(handle) => handle,
            Err(e) => {
                self.set_state(AgentState::Redundant);
                return Err(e);
            }
        };

        let mut cached = Vec::new();
        let mut failed = Vec::new();
        for asset in &self.config.core_assets {
            match self.cache_asset(&handle, asset).await {
                Ok(()) => cached.push(asset.clone()),
                Err(e) => {
                    warn!(asset = %asset, "skipping core asset: {}", e);
                    failed.push(asset.clone());
                }
            }
        }

        self.set_state(AgentState::Installed);
        info!(
            "installed {}: {} cached, {} skipped",
            generation,
            cached.len(),
            failed.len()
        );

        Ok(InstallReport {
            generation,
            cached,
            failed,
        })
    }

    async fn cache_asset(&self, generation: &GenerationHandle, asset: &str) -> Result<()> {
        let url = self.config.resolve(asset)?;
        let request = AgentRequest::get(url.clone());
        let response = self.fetcher.fetch(&request).await?;
        if !response.is_success() {
            return Err(AgentError::Status {
                status: response.status.as_u16(),
                url: url.to_string(),
            });
        }
        if self
            .storage
            .put(generation, RequestKey::get(&url), response)
            .await?
        {
            Ok(())
        } else {
            Err(AgentError::Storage(format!("{} was deleted during install", generation.name())))
        }
    }

    // == Activate ==
    /// Deletes stale generations and claims open pages.
    pub async fn activate(&self) -> Result<ActivationReport> {
        let state = self.state();
        if state != AgentState::Installed {
            return Err(AgentError::Internal(format!("cannot activate from state {}", state)));
        }
        self.set_state(AgentState::Activating);

        match self.purge().await {
            Ok((deleted, retained)) => {
                self.claim();
                self.set_state(AgentState::Activated);
                info!(
                    "activated {}: deleted {} stale generations",
                    self.config.version_tag,
                    deleted.len()
                );
                Ok(ActivationReport {
                    deleted,
                    retained,
                    claimed: true,
                })
            }
            Err(e) => {
                self.set_state(AgentState::Redundant);
                Err(e)
            }
        }
    }

    async fn purge(&self) -> Result<(Vec<String>, Vec<String>)> {
        let current = [self.config.core_generation(), self.config.runtime_generation()];
        let mut deleted = Vec::new();
        let mut retained = Vec::new();

        for name in self.storage.keys().await? {
            if current.contains(&name) {
                retained.push(name);
            } else {
                self.storage.delete(&name).await?;
                debug!(generation = %name, "deleted stale generation");
                deleted.push(name);
            }
        }
        Ok((deleted, retained))
    }

    /// Take control of open pages without waiting for a reload.
    fn claim(&self) {
        self.controlling.store(true, Ordering::SeqCst);
    }
}

impl fmt::Debug for LifecycleManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LifecycleManager")
            .field("version_tag", &self.config.version_tag)
            .field("state", &self.state())
            .field("controlling", &self.is_controlling())
            .finish()
    }
}
