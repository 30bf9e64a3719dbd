//! Configuration Module
//!
//! The agent itself is configured from compile-time constants passed in
//! explicitly at construction. Only the HTTP host that drives the agent reads
//! its listening port and upstream origin from environment variables.

use std::env;
use std::time::Duration;

use url::Url;

use crate::cache::GenerationRole;
use crate::error::Result;

// == Agent Constants ==
/// Deployment version tag. Bumping it invalidates every cached generation on
/// the next activation.
pub const VERSION_TAG: &str = "v1";

/// Base path of the application, relative to the scope URL.
pub const BASE_PATH: &str = "./";

/// Main HTML entry point, relative to the scope URL.
pub const MAIN_DOCUMENT: &str = "./index.html";

/// App icon, served from an image host outside the app origin.
pub const ICON_URL: &str = "https://gcdnb.pbrd.co/images/WfgYQo77g3a6.png";

/// Assets populated into the core generation at install time, in order.
pub const CORE_ASSETS: &[&str] = &["./", "./index.html", "./manifest.webmanifest", ICON_URL];

/// Scope used when no explicit origin is supplied.
pub const DEFAULT_SCOPE: &str = "http://localhost:8080/";

/// Agent configuration: version tag, scope, fallback paths and core assets.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Version tag embedded in every generation name
    pub version_tag: String,
    /// Origin plus base path; relative asset paths resolve against it
    pub scope: Url,
    /// Base path used as the last navigation fallback
    pub base_path: String,
    /// Main document used as the first navigation fallback
    pub main_document: String,
    /// Ordered list of assets cached on install
    pub core_assets: Vec<String>,
}

impl AgentConfig {
    /// Creates a config for the given scope using the crate constants.
    pub fn new(scope: Url) -> Self {
        Self {
            version_tag: VERSION_TAG.to_string(),
            scope,
            base_path: BASE_PATH.to_string(),
            main_document: MAIN_DOCUMENT.to_string(),
            core_assets: CORE_ASSETS.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn with_version_tag(mut self, tag: impl Into<String>) -> Self {
        self.version_tag = tag.into();
        self
    }

    pub fn with_core_assets<I, S>(mut self, assets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.core_assets = assets.into_iter().map(Into::into).collect();
        self
    }

    /// Name of the core generation, e.g. `core-v1`.
    pub fn core_generation(&self) -> String {
        GenerationRole::Core.generation_name(&self.version_tag)
    }

    /// Name of the runtime generation, e.g. `runtime-v1`.
    pub fn runtime_generation(&self) -> String {
        GenerationRole::Runtime.generation_name(&self.version_tag)
    }

    /// Resolves a path or absolute URL against the scope.
    pub fn resolve(&self, path: &str) -> Result<Url> {
        Ok(self.scope.join(path)?)
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self::new(Url::parse(DEFAULT_SCOPE).expect("default scope is a valid URL"))
    }
}

/// How long the host waits for background refreshes on shutdown before
/// aborting them.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Host configuration for the HTTP driver.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct HostConfig {
    /// HTTP server port
    pub server_port: u16,
    /// Origin the agent fetches from on behalf of the page
    pub upstream_origin: Url,
    /// Origin pages use to reach the host; becomes the agent scope
    pub public_origin: Url,
}

impl HostConfig {
    /// Creates a new HostConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 8080)
    /// - `UPSTREAM_ORIGIN` - Origin to forward fetches to (default: http://127.0.0.1:3000/)
    /// - `PUBLIC_ORIGIN` - Origin pages see (default: http://localhost:<port>/)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let server_port = env::var("SERVER_PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.server_port);
        let upstream_origin = env::var("UPSTREAM_ORIGIN")
            .ok()
            .and_then(|v| Url::parse(&v).ok())
            .unwrap_or(defaults.upstream_origin);
        let public_origin = env::var("PUBLIC_ORIGIN")
            .ok()
            .and_then(|v| Url::parse(&v).ok())
            .or_else(|| Url::parse(&format!("http://localhost:{}/", server_port)).ok())
            .unwrap_or(defaults.public_origin);

        Self {
            server_port,
            upstream_origin,
            public_origin,
        }
    }
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            server_port: 8080,
            upstream_origin: Url::parse("http://127.0.0.1:3000/")
                .expect("default upstream is a valid URL"),
            public_origin: Url::parse(DEFAULT_SCOPE).expect("default scope is a valid URL"),
        }
    }
}
