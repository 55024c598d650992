//! Baufi Server Library
//!
//! Persistence, validation and HTTP layer for tracking mortgage loans and
//! their special payments.

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod loan;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod static_files;

use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;

use crate::config::Config;
use crate::state::AppState;

/// Build the complete application: API routes, static UI and middleware
pub fn app(state: AppState, config: &Config) -> Router {
    let mut router = routes::api_routes().with_state(state);

    if let Some(spa) = static_files::spa_service(&config.static_dir) {
        router = router.fallback_service(spa);
    }

    router
        .layer(CatchPanicLayer::custom(middleware::handle_panic))
        .layer(axum::middleware::from_fn(middleware::request_tracing))
        .layer(middleware::configure_cors(
            config.cors_allowed_origins.as_deref(),
        ))
}
