//! # AtomSpace HTTP API Module
//!
//! This module implements the HTTP REST API server using axum.
//!
//! ## Endpoints
//!
//! - `GET /health` - Health check
//! - `GET /status` - Store counts
//! - `GET /types`, `POST /types` - List or register atom types
//! - `GET /types/{name}/atoms?subtypes=bool` - Handles of a type
//! - `POST /atoms` - Insert an atom (nested specs allowed)
//! - `GET /atoms/{handle}`, `DELETE /atoms/{handle}?cascade=bool`
//! - `GET /atoms/{handle}/incoming` - Links containing an atom
//! - `GET /atoms/{handle}/truth`, `PUT /atoms/{handle}/truth`
//! - `POST /query` - Run a pattern query
//!
//! CORS origins, the body limit and query caps come from [`ServerConfig`]
//! and [`Config::limits`](crate::config::Config::limits).

mod handlers;
mod types;

pub use handlers::execute_query;
pub use types::{
    AtomJson, AtomSpecJson, BindingJson, ByTypeParams, ConstraintJson, HandlesResponse,
    HealthResponse, InsertRequest, InsertResponse, PatternTermJson, QueryRequest, QueryResponse,
    RemoveParams, RemoveResponse, ScriptJson, ScriptReport, StatusResponse, TargetJson, TruthJson,
    TruthResponse, TruthUpdateRequest, TypeJson, TypeRegisteredResponse, TypesResponse,
};

use crate::config::ServerConfig;
use crate::error::AppError;
use atomspace_core::{AtomSpace, QueryLimits};
use axum::{
    Router,
    http::{HeaderValue, Method, header},
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

// =============================================================================
// SERVER STATE
// =============================================================================

/// Shared server state.
///
/// The store synchronizes itself, so handlers share it without an outer lock.
#[derive(Clone)]
pub struct AppState {
    pub space: Arc<AtomSpace>,
    /// Caps applied to every query.
    pub limits: QueryLimits,
}

impl AppState {
    #[must_use]
    pub fn new(space: AtomSpace, limits: QueryLimits) -> Self {
        Self {
            space: Arc::new(space),
            limits,
        }
    }
}

// =============================================================================
// CORS CONFIGURATION
// =============================================================================

/// Build the CORS layer from the configured origins.
///
/// - `["*"]`: allows all origins
/// - otherwise: the listed origins; invalid entries are skipped, and an
///   empty result falls back to the localhost defaults
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        tracing::warn!("CORS: Allowing ALL origins. This is insecure for production!");
        return CorsLayer::permissive();
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|s| match s.trim().parse::<HeaderValue>() {
            Ok(hv) => {
                tracing::debug!("CORS: Allowing origin: {}", s);
                Some(hv)
            }
            Err(e) => {
                tracing::warn!("CORS: Invalid origin '{}': {}", s, e);
                None
            }
        })
        .collect();

    let allowed = if allowed.is_empty() {
        tracing::warn!("CORS: No valid origins configured, defaulting to localhost only");
        ServerConfig::default()
            .cors_origins
            .iter()
            .filter_map(|s| s.parse::<HeaderValue>().ok())
            .collect()
    } else {
        allowed
    };

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

/// Create the axum router with all endpoints and middleware.
pub fn create_router(state: AppState, server: &ServerConfig) -> Router {
    Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/status", get(handlers::status_handler))
        .route(
            "/types",
            get(handlers::list_types_handler).post(handlers::register_type_handler),
        )
        .route("/types/{name}/atoms", get(handlers::atoms_of_type_handler))
        .route("/atoms", post(handlers::insert_atom_handler))
        .route(
            "/atoms/{handle}",
            get(handlers::get_atom_handler).delete(handlers::remove_atom_handler),
        )
        .route("/atoms/{handle}/incoming", get(handlers::incoming_handler))
        .route(
            "/atoms/{handle}/truth",
            get(handlers::get_truth_handler).put(handlers::put_truth_handler),
        )
        .route("/query", post(handlers::query_handler))
        .layer(axum::extract::DefaultBodyLimit::max(server.body_limit_bytes))
        .layer(build_cors_layer(&server.cors_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Start the HTTP server and serve until Ctrl+C.
pub async fn run_server(state: AppState, server: &ServerConfig) -> Result<(), AppError> {
    let router = create_router(state, server);
    let addr = format!("{}:{}", server.host, server.port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::Io(format!("Bind failed: {}", e)))?;

    tracing::info!("AtomSpace HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::Io(format!("Server error: {}", e)))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
