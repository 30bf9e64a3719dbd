//! Request Router
//!
//! Classifies an intercepted request into the strategy that answers it.
//! Rules are evaluated in order:
//!
//! 1. Non-GET requests pass through untouched.
//! 2. Navigations (navigate mode or document destination) go network-first.
//! 3. Scripts, styles, images, fonts and anything cross-origin go
//!    stale-while-revalidate against the runtime generation.
//! 4. Everything else goes cache-first against the runtime generation.

use std::fmt;

use reqwest::Method;
use url::Url;

use crate::models::AgentRequest;

/// Strategy selected for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Passthrough,
    NetworkFirst,
    StaleWhileRevalidate,
    CacheFirst,
}

impl Route {
    pub fn as_str(self) -> &'static str {
        match self {
            Route::Passthrough => "passthrough",
            Route::NetworkFirst => "network-first",
            Route::StaleWhileRevalidate => "stale-while-revalidate",
            Route::CacheFirst => "cache-first",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Picks the route for `request`, with `scope` supplying the agent's origin.
pub fn classify(request: &AgentRequest, scope: &Url) -> Route {
    if request.method != Method::GET {
        return Route::Passthrough;
    }

    if request.is_navigation() {
        return Route::NetworkFirst;
    }

    if request.destination.is_static() || request.url.origin() != scope.origin() {
        return Route::StaleWhileRevalidate;
    }

    Route::CacheFirst
}
