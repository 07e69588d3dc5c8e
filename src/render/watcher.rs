//! Template directory watcher.
//!
//! A template edit does not change registry membership, so the fingerprint
//! alone would never trigger a re-render. The watcher reports which service's
//! template changed and the reconciler forgets that service's fingerprint.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::render::TEMPLATE_EXTENSION;

/// Watches `<templates_dir>/*.tpl` and emits service names.
pub struct TemplateWatcher {
    dir: PathBuf,
    update_tx: mpsc::UnboundedSender<String>,
}

impl TemplateWatcher {
    /// Create a new TemplateWatcher.
    ///
    /// Returns the watcher and a receiver of changed service names.
    pub fn new(dir: &Path) -> (Self, mpsc::UnboundedReceiver<String>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        (
            Self {
                dir: dir.to_path_buf(),
                update_tx,
            },
            update_rx,
        )
    }

    /// Start watching. The returned handle must be kept alive.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let tx = self.update_tx;

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if !(event.kind.is_modify() || event.kind.is_create() || event.kind.is_remove()) {
                        return;
                    }
                    for service in event.paths.iter().filter_map(|p| service_for_template(p)) {
                        tracing::info!(service = %service, "Template change detected");
                        let _ = tx.send(service);
                    }
                }
                Err(e) => tracing::error!("Template watch error: {:?}", e),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&self.dir, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?self.dir, "Template watcher started");
        Ok(watcher)
    }
}

/// `<dir>/web.tpl` → `web`. Anything else is ignored.
pub fn service_for_template(path: &Path) -> Option<String> {
    if path.extension()? != TEMPLATE_EXTENSION {
        return None;
    }
    path.file_stem()?.to_str().map(str::to_owned)
}
