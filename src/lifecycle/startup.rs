//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the registry client, renderer and reload invoker from config
//! - Start background tasks (template watcher, diagnostics endpoint)
//! - Hand control to the reconciler until shutdown
//!
//! # Design Decisions
//! - Fail fast: a bad DSN or command line is fatal
//! - A missing templates directory only disables the watcher

use std::sync::Arc;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::admin::{self, AdminState};
use crate::config::VisorConfig;
use crate::lifecycle::Shutdown;
use crate::observability::metrics;
use crate::reconciler::{PassOutcome, Reconciler};
use crate::registry::{ConsulRegistry, RegistryError};
use crate::reload::{ReloadError, ReloadInvoker};
use crate::render::{ConfigRenderer, TemplateWatcher};

#[derive(Debug, Error)]
pub enum RunError {
    #[error("could not create registry client: {0}")]
    Registry(#[from] RegistryError),

    #[error("invalid reload configuration: {0}")]
    Reload(#[from] ReloadError),

    #[error("invalid diagnostics address: {0}")]
    DiagnosticsAddr(#[from] std::net::AddrParseError),

    #[error("could not bind diagnostics endpoint: {0}")]
    Bind(#[from] std::io::Error),

    #[error("could not install metrics recorder: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    #[error("pass finished with {}", .0.as_str())]
    PassFailed(PassOutcome),
}

/// How long the daemon should run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Reconcile on every tick until a shutdown signal.
    Daemon,
    /// Run a single pass and return.
    Once,
}

fn build_reconciler(config: &VisorConfig) -> Result<Reconciler, RunError> {
    let registry = Arc::new(ConsulRegistry::new(&config.registry)?);
    let reloader = Arc::new(ReloadInvoker::new(&config.reload)?);
    let renderer = ConfigRenderer::new(&config.paths);

    tracing::info!(
        templates_dir = %config.paths.templates_dir.display(),
        conf_dir = %config.paths.conf_dir.display(),
        test_cmd = %config.reload.test_cmd,
        reload_cmd = %config.reload.reload_cmd,
        "Renderer and reload commands configured"
    );

    Ok(Reconciler::new(
        registry,
        renderer,
        reloader,
        config.reconcile.clone(),
    ))
}

/// Build every component and run until shutdown (or one pass).
pub async fn run(config: VisorConfig, mode: RunMode) -> Result<(), RunError> {
    let mut reconciler = build_reconciler(&config)?;

    if mode == RunMode::Once {
        let report = reconciler.reconcile().await;
        tracing::info!(
            outcome = report.outcome.as_str(),
            rendered = ?report.rendered,
            unchanged = ?report.unchanged,
            failed = ?report.failed,
            "Single pass finished"
        );
        return if report.outcome.is_failure() {
            Err(RunError::PassFailed(report.outcome))
        } else {
            Ok(())
        };
    }

    let shutdown = Shutdown::new();
    shutdown.listen_for_signals();

    // Keep the watcher handle alive for the lifetime of the loop.
    let _watcher = if config.reconcile.watch_templates {
        let (watcher, changes) = TemplateWatcher::new(&config.paths.templates_dir);
        match watcher.run() {
            Ok(handle) => {
                reconciler = reconciler.with_template_changes(changes);
                Some(handle)
            }
            Err(e) => {
                tracing::warn!(
                    path = %config.paths.templates_dir.display(),
                    error = %e,
                    "Template watcher unavailable, template edits need a registry change or restart"
                );
                None
            }
        }
    } else {
        None
    };

    if let Some(addr) = config.observability.diagnostics_addr() {
        let addr = addr?;
        let metrics = metrics::init_metrics()?;
        let listener = TcpListener::bind(addr).await?;
        tracing::info!(address = %listener.local_addr()?, "Diagnostics endpoint listening");

        let state = AdminState::new(config.clone(), metrics);
        let admin_shutdown = shutdown.subscribe();
        tokio::spawn(async move {
            if let Err(e) = admin::serve(listener, state, admin_shutdown).await {
                tracing::error!(error = %e, "Diagnostics endpoint stopped");
            }
        });
    }

    reconciler.run(shutdown.subscribe()).await;
    tracing::info!("Shutdown complete");
    Ok(())
}
