pub mod error;
mod handlers;
pub mod origin;

use axum::{
    routing::{any, get},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::registry::ConnectionRegistry;

use handlers::*;

/// Path sentinels upgrade on.
pub const CONNECT_PATH: &str = "/ws";

/// Header carrying the sentinel's stack identifier.
pub const STACK_ID_HEADER: &str = "x-stack-id";

#[derive(Clone)]
pub struct AppState {
    pub registry: ConnectionRegistry,
}

/// Configuration for the HTTP/WS router.
///
/// `RouterConfig::default()` keeps the permissive origin policy.
#[derive(Debug, Clone, Default)]
pub struct RouterConfig {
    pub allowed_origins: Vec<String>,
}

pub fn router(state: AppState, config: RouterConfig) -> Router {
    let connect_routes = Router::new()
        .route(CONNECT_PATH, any(connect))
        .with_state(state);

    let connect_routes = if config.allowed_origins.is_empty() {
        connect_routes
    } else {
        let allowed: Arc<[String]> = config.allowed_origins.into();
        connect_routes.layer(axum::middleware::from_fn(move |req, next| {
            origin::require_allowed_origin(allowed.clone(), req, next)
        }))
    };

    Router::new()
        .route("/healthz", get(healthz))
        .merge(connect_routes)
        .layer(TraceLayer::new_for_http())
}
