//! Reconciliation worker.
//!
//! # Responsibilities
//! - Drive passes from a fixed-period timer
//! - Render changed services and reload once per pass
//! - Commit fingerprints only after the reload succeeded

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{broadcast, mpsc};
use tokio::time::{self, MissedTickBehavior};
use tracing::Instrument;

use crate::config::ReconcileConfig;
use crate::observability::metrics;
use crate::reconciler::pass::{PassOutcome, PassReport};
use crate::reconciler::state::FingerprintStore;
use crate::registry::Registry;
use crate::reload::Reloader;
use crate::render::ConfigRenderer;
use crate::upstream::{Fingerprint, ServiceGroups};

pub struct Reconciler {
    registry: Arc<dyn Registry>,
    renderer: ConfigRenderer,
    reloader: Arc<dyn Reloader>,
    config: ReconcileConfig,
    state: FingerprintStore,
    template_changes: Option<mpsc::UnboundedReceiver<String>>,
    passes: u64,
}

impl Reconciler {
    pub fn new(
        registry: Arc<dyn Registry>,
        renderer: ConfigRenderer,
        reloader: Arc<dyn Reloader>,
        config: ReconcileConfig,
    ) -> Self {
        Self {
            registry,
            renderer,
            reloader,
            config,
            state: FingerprintStore::new(),
            template_changes: None,
            passes: 0,
        }
    }

    /// Receive service names whose template changed on disk.
    pub fn with_template_changes(mut self, changes: mpsc::UnboundedReceiver<String>) -> Self {
        self.template_changes = Some(changes);
        self
    }

    pub fn state(&self) -> &FingerprintStore {
        &self.state
    }

    /// Run passes until shutdown. A pass in flight when shutdown arrives is
    /// dropped, killing any running command; its candidates are discarded.
    pub async fn run(&mut self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(
            interval_secs = self.config.interval_secs,
            prune_vanished = self.config.prune_vanished,
            "Reconciler starting"
        );

        let mut ticker = time::interval(self.config.interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    tokio::select! {
                        _ = self.reconcile() => {}
                        _ = shutdown.recv() => {
                            tracing::info!("Shutdown during pass, discarding uncommitted changes");
                            break;
                        }
                    }
                }
                _ = shutdown.recv() => {
                    tracing::info!("Reconciler received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    /// Run exactly one pass.
    pub async fn reconcile(&mut self) -> PassReport {
        self.passes += 1;
        let span = tracing::info_span!("pass", number = self.passes);
        let report = self.reconcile_inner().instrument(span).await;

        metrics::record_tracked_services(self.state.len());
        metrics::record_pass(report.outcome.as_str());
        report
    }

    async fn reconcile_inner(&mut self) -> PassReport {
        self.drain_template_changes();

        let started = Instant::now();
        let entries = match self.registry.lookup().await {
            Ok(entries) => {
                metrics::record_lookup(started.elapsed(), true);
                entries
            }
            Err(e) => {
                metrics::record_lookup(started.elapsed(), false);
                tracing::error!(error = %e, "Lookup failed");
                return PassReport::new(PassOutcome::LookupFailed);
            }
        };
        tracing::debug!(count = entries.len(), "Lookup");

        let groups = ServiceGroups::from_entries(&entries);
        if self.config.prune_vanished {
            for service in self.state.prune(&groups) {
                tracing::info!(service = %service, "Service vanished from registry");
            }
        }

        let mut report = PassReport::new(PassOutcome::NoChanges);
        let mut candidates = Vec::new();

        for (service, instances) in groups.iter() {
            let fingerprint = Fingerprint::of(instances);
            let previous = self.state.get(service);
            tracing::debug!(
                service,
                hash = %fingerprint,
                old = previous.map(Fingerprint::as_str).unwrap_or(""),
                found = previous.is_some(),
                "Service fingerprint"
            );

            if self.state.is_current(service, &fingerprint) {
                tracing::info!(service, "Service has not changed");
                report.unchanged.push(service.to_string());
                continue;
            }

            match self.renderer.render(service, instances) {
                Ok(path) => {
                    tracing::info!(
                        service,
                        path = %path.display(),
                        servers = instances.len(),
                        "Configuration rendered"
                    );
                    metrics::record_render(service, "ok");
                    report.rendered.push(service.to_string());
                    candidates.push((service.to_string(), fingerprint));
                }
                Err(e) if e.is_template_error() => {
                    tracing::warn!(service, error = %e, "Template unavailable");
                    metrics::record_render(service, "template_error");
                    report.failed.push(service.to_string());
                }
                Err(e) => {
                    tracing::error!(service, error = %e, "Configuration render failed");
                    metrics::record_render(service, "error");
                    report.failed.push(service.to_string());
                }
            }
        }

        if candidates.is_empty() {
            return report;
        }

        match self.reloader.reload().await {
            Ok(()) => {
                metrics::record_reload(true);
                tracing::info!(services = ?report.rendered, "Reload succeeded, committing");
                self.state.commit(candidates);
                report.outcome = PassOutcome::Reloaded;
            }
            Err(e) => {
                metrics::record_reload(false);
                tracing::warn!(
                    services = ?report.rendered,
                    error = %e,
                    "Reload failed, changes will be retried next pass"
                );
                report.outcome = PassOutcome::ReloadFailed;
            }
        }
        report
    }

    fn drain_template_changes(&mut self) {
        let Some(changes) = self.template_changes.as_mut() else {
            return;
        };
        while let Ok(service) = changes.try_recv() {
            if self.state.forget(&service) {
                tracing::info!(service = %service, "Template changed, service will be re-rendered");
            }
        }
    }
}
