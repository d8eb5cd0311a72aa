//! HTTP access to permission rectification
//!

#![deny(missing_docs)]

mod error;
mod rectify;

use std::{net::SocketAddr, str::FromStr, sync::Arc};

use anyhow::{Context, Result};
use axum::{extract::Extension, routing::get, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use rectify_core::{config::RectifyConfig, logging::info, Rectifier};

/// Everything a request handler needs. Built once at startup.
pub struct AppState {
    /// The reconciliation engine, holding the injected provider.
    pub rectifier: Rectifier,
    /// Resolved process configuration.
    pub config: RectifyConfig,
}

impl AppState {
    /// Basic constructor
    pub fn new(rectifier: Rectifier, config: RectifyConfig) -> Self {
        Self { rectifier, config }
    }
}

/// Build the application router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .merge(rectify::router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(Extension(state))
}

/// Serve the API on the given address until the process stops.
pub async fn serve(state: Arc<AppState>, bind: &str) -> Result<()> {
    let bind_addr =
        SocketAddr::from_str(bind).with_context(|| format!("invalid bind address: {}", bind))?;
    let app_service = router(state).into_make_service();

    info!("Serving rectification API on http://{}", bind_addr);
    axum::Server::try_bind(&bind_addr)
        .with_context(|| format!("couldn't bind to {}", bind_addr))?
        .serve(app_service)
        .await
        .context("server error")
}

/// Plain liveness answer.
async fn root_handler() -> &'static str {
    "Permission rectification API"
}
