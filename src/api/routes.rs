//! API Routes
//!
//! Configures the Axum router: control endpoints under `/__agent`, every
//! other path handed to the agent.

use axum::{routing::get, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{health_handler, intercept_handler, stats_handler, AppState};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /__agent/health` - Health check with agent lifecycle state
/// - `GET /__agent/stats` - Generations and cache statistics
/// - anything else - intercepted by the agent
///
/// # Middleware
/// - CORS: control endpoints only; proxied responses keep upstream headers
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let control = Router::new()
        .route("/__agent/health", get(health_handler))
        .route("/__agent/stats", get(stats_handler))
        .layer(cors);

    Router::new()
        .merge(control)
        .fallback(intercept_handler)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
