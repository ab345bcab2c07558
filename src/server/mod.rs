//! Axum HTTP server — serves the flat-file API under `/api/`.
//!
//! ## URL layout
//!
//! ```text
//! GET  /api              — root: lists the API paths
//! GET  /api/hello
//! GET  /api/data
//! GET  /api/compute?n=N  — sum of squares below N
//! GET  /api/items        — items document
//! ANY  /api/login        — credential check (POST only, others → 405)
//! *                      → 404
//! ```
//!
//! Every handler absorbs its own failures and answers with a fixed status
//! and JSON body; nothing propagates past the router.

mod api;

use std::sync::Arc;

use axum::{Router, routing::{any, get}};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::Config;
use crate::error::AppError;
use crate::store::{CredentialVerifier, ItemStore};

/// Paths served by the router, in the order the root lists them.
pub const API_PATHS: [&str; 6] = [
    "/api",
    "/api/hello",
    "/api/data",
    "/api/compute",
    "/api/items",
    "/api/login",
];

// ── Shared request state ──────────────────────────────────────────────────────

/// Router state injected into every handler via [`axum::extract::State`].
///
/// Cheap to clone: all fields are reference-counted or `Copy`.
#[derive(Clone)]
pub struct ApiState {
    pub items: Arc<ItemStore>,
    pub verifier: Arc<CredentialVerifier>,
    /// Bound for the buffered login body.
    pub max_body_bytes: usize,
}

impl ApiState {
    pub fn new(items: ItemStore, verifier: CredentialVerifier, max_body_bytes: usize) -> Self {
        Self {
            items: Arc::new(items),
            verifier: Arc::new(verifier),
            max_body_bytes,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            ItemStore::new(&config.data.items_path),
            CredentialVerifier::new(&config.data.credentials_path),
            config.server.max_body_bytes,
        )
    }
}

// ── Server ────────────────────────────────────────────────────────────────────

pub struct Server {
    bind_addr: String,
    state: ApiState,
}

impl Server {
    pub fn new(bind_addr: impl Into<String>, state: ApiState) -> Self {
        Self {
            bind_addr: bind_addr.into(),
            state,
        }
    }

    /// Bind and serve until `shutdown` is cancelled.
    pub async fn run(self, shutdown: CancellationToken) -> Result<(), AppError> {
        let bind_addr = self.bind_addr;
        let listener = TcpListener::bind(&bind_addr)
            .await
            .map_err(|e| AppError::Server(format!("bind failed on {bind_addr}: {e}")))?;
        serve(listener, self.state, shutdown).await
    }
}

/// Serve on an already-bound listener until `shutdown` is cancelled.
pub async fn serve(
    listener: TcpListener,
    state: ApiState,
    shutdown: CancellationToken,
) -> Result<(), AppError> {
    let local_addr = listener
        .local_addr()
        .map_err(|e| AppError::Server(format!("listener has no local address: {e}")))?;
    info!(%local_addr, "api server listening");

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|e| AppError::Server(format!("axum server error: {e}")))?;

    info!(%local_addr, "api server shut down");
    Ok(())
}

// ── Router ────────────────────────────────────────────────────────────────────

pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/api",         get(api::root))
        .route("/api/hello",   get(api::hello))
        .route("/api/data",    get(api::data))
        .route("/api/compute", get(api::compute))
        .route("/api/items",   get(api::items))
        .route("/api/login",   any(api::login))
        .fallback(api::not_found)
        .with_state(state)
}
