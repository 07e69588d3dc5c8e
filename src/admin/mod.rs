//! Diagnostics endpoint.
//!
//! Read-only HTTP surface next to the reconciler:
//! - `GET /admin/status`: version, uptime
//! - `GET /admin/config`: effective configuration, registry token redacted
//! - `GET /metrics`: Prometheus text exposition
//!
//! The endpoint never touches reconciler state.

pub mod handlers;

use std::sync::Arc;
use std::time::Instant;

use axum::{routing::get, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;

use crate::config::VisorConfig;
use self::handlers::*;

/// Shared, immutable state for the diagnostics handlers.
#[derive(Clone)]
pub struct AdminState {
    pub config: Arc<VisorConfig>,
    pub metrics: PrometheusHandle,
    pub started_at: Instant,
}

impl AdminState {
    pub fn new(config: VisorConfig, metrics: PrometheusHandle) -> Self {
        Self {
            config: Arc::new(config),
            metrics,
            started_at: Instant::now(),
        }
    }
}

pub fn setup_admin_router(state: AdminState) -> Router {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/config", get(get_config))
        .route("/metrics", get(get_metrics))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Serve the diagnostics router until the shutdown broadcast fires.
pub async fn serve(
    listener: TcpListener,
    state: AdminState,
    mut shutdown: broadcast::Receiver<()>,
) -> std::io::Result<()> {
    axum::serve(listener, setup_admin_router(state))
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
        })
        .await
}
