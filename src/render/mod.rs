//! Load balancer configuration rendering.
//!
//! # Data Flow
//! ```text
//! (service, instances)
//!     → <templates_dir>/<service>.tpl   read + parsed fresh every time
//!     → <conf_dir>/<service>.conf       opened write-only, created, truncated (0755)
//!     → handlebars render straight into the file
//! ```
//!
//! # Design Decisions
//! - Truncate-in-place, no temp file + rename: a failed render can leave a
//!   partial file behind, and the fingerprint is not committed so the next
//!   pass writes it again
//! - Strict mode: referencing an unknown variable is a render error
//! - No HTML escaping, output is load balancer configuration
//! - Every failure is scoped to the one service being rendered

pub mod watcher;

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Component, Path, PathBuf};

use handlebars::Handlebars;
use serde::Serialize;
use thiserror::Error;

use crate::config::PathsConfig;
use crate::upstream::Instance;

pub use watcher::TemplateWatcher;

pub const TEMPLATE_EXTENSION: &str = "tpl";
pub const CONFIG_EXTENSION: &str = "conf";

/// Errors raised while producing one service's configuration file.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("service name {service:?} is not a plain file name")]
    InvalidServiceName { service: String },

    #[error("could not open template file {path}: {source}")]
    TemplateMissing { path: PathBuf, source: io::Error },

    #[error("could not parse template file {path}: {source}")]
    TemplateParse {
        path: PathBuf,
        source: Box<handlebars::TemplateError>,
    },

    #[error("could not open configuration file {path}: {source}")]
    OutputOpen { path: PathBuf, source: io::Error },

    #[error("could not write to configuration file {path}: {source}")]
    Render {
        path: PathBuf,
        source: Box<handlebars::RenderError>,
    },

    #[error("could not flush configuration file {path}: {source}")]
    Flush { path: PathBuf, source: io::Error },
}

impl RenderError {
    /// Template problems are an operator's missing file, not a fault.
    pub fn is_template_error(&self) -> bool {
        matches!(
            self,
            RenderError::TemplateMissing { .. } | RenderError::TemplateParse { .. }
        )
    }
}

/// Data handed to every template.
#[derive(Serialize)]
struct TemplateContext<'a> {
    service: &'a str,
    servers: &'a [Instance],
}

/// Writes `<service>.conf` files from `<service>.tpl` templates.
#[derive(Debug, Clone)]
pub struct ConfigRenderer {
    templates_dir: PathBuf,
    conf_dir: PathBuf,
}

impl ConfigRenderer {
    pub fn new(paths: &PathsConfig) -> Self {
        Self {
            templates_dir: paths.templates_dir.clone(),
            conf_dir: paths.conf_dir.clone(),
        }
    }

    pub fn template_path(&self, service: &str) -> PathBuf {
        self.templates_dir
            .join(format!("{service}.{TEMPLATE_EXTENSION}"))
    }

    pub fn output_path(&self, service: &str) -> PathBuf {
        self.conf_dir.join(format!("{service}.{CONFIG_EXTENSION}"))
    }

    pub fn templates_dir(&self) -> &Path {
        &self.templates_dir
    }

    /// Render `instances` into the service's configuration file.
    ///
    /// Returns the path that was written.
    pub fn render(&self, service: &str, instances: &[Instance]) -> Result<PathBuf, RenderError> {
        if !is_plain_name(service) {
            return Err(RenderError::InvalidServiceName {
                service: service.to_string(),
            });
        }

        let template_path = self.template_path(service);
        let source = fs::read_to_string(&template_path).map_err(|source| {
            RenderError::TemplateMissing {
                path: template_path.clone(),
                source,
            }
        })?;

        let mut registry = Handlebars::new();
        registry.set_strict_mode(true);
        registry.register_escape_fn(handlebars::no_escape);
        registry
            .register_template_string(service, source)
            .map_err(|source| RenderError::TemplateParse {
                path: template_path,
                source: Box::new(source),
            })?;

        let output_path = self.output_path(service);
        let file = open_truncated(&output_path).map_err(|source| RenderError::OutputOpen {
            path: output_path.clone(),
            source,
        })?;

        let mut writer = BufWriter::new(file);
        let context = TemplateContext {
            service,
            servers: instances,
        };
        registry
            .render_to_write(service, &context, &mut writer)
            .map_err(|source| RenderError::Render {
                path: output_path.clone(),
                source: Box::new(source),
            })?;
        writer.flush().map_err(|source| RenderError::Flush {
            path: output_path.clone(),
            source,
        })?;

        Ok(output_path)
    }
}

/// A single normal path component: no separators, no `.` or `..`.
fn is_plain_name(service: &str) -> bool {
    let mut components = Path::new(service).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    ) && !service.contains(['/', '\\'])
}

#[cfg(unix)]
fn open_truncated(path: &Path) -> io::Result<File> {
    use std::os::unix::fs::OpenOptionsExt;

    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o755)
        .open(path)
}

#[cfg(not(unix))]
fn open_truncated(path: &Path) -> io::Result<File> {
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
}
