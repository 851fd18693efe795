//! HTTP gateway for Parley.
//!
//! Exposes the session engine's actions over a small JSON API, plus a
//! health check. Each request names its session in the `X-Session-Id`
//! header; the gateway loads that session's transcript, runs the action
//! and stores the result before answering.
//!
//! Built on Axum.

pub mod api_v1;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::{Router, response::Json, routing::get};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::info;

use parley_config::AppConfig;
use parley_core::provider::Provider;
use parley_core::session::SessionStore;
use parley_engine::SessionEngine;
use parley_sessions::{InMemorySessionStore, SessionLocks};

/// Request body cap for every route.
pub const MAX_BODY_BYTES: usize = 64 * 1024;

/// Shared application state for the gateway.
pub struct GatewayState {
    pub engine: SessionEngine,
    pub sessions: Arc<dyn SessionStore>,
    pub locks: SessionLocks,
}

impl GatewayState {
    pub fn new(engine: SessionEngine, sessions: Arc<dyn SessionStore>) -> Self {
        Self {
            engine,
            sessions,
            locks: SessionLocks::new(),
        }
    }

    /// Engine and in-memory session store built from the loaded config.
    pub fn from_config(config: &AppConfig, provider: Arc<dyn Provider>) -> Self {
        Self::new(
            SessionEngine::from_config(config, provider),
            Arc::new(InMemorySessionStore::with_capacity(
                config.session.max_sessions,
            )),
        )
    }
}

pub type SharedState = Arc<GatewayState>;

/// Build the Axum router with all gateway routes.
///
/// Layers applied:
/// - Request body size limit (64 KiB)
/// - HTTP trace logging
pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .nest("/v1", api_v1::v1_router(state))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(DefaultBodyLimit::max(MAX_BODY_BYTES)),
        )
}

/// Start the gateway HTTP server.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);

    let provider = parley_providers::build_from_config(&config)?;
    let state = Arc::new(GatewayState::from_config(&config, provider));

    info!(
        addr = %addr,
        provider = state.engine.provider_name(),
        model = %state.engine.generation_config().model,
        sessions = state.sessions.name(),
        "Gateway starting"
    );

    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// --- Handlers ---

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
