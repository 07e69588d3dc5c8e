use std::path::PathBuf;

use clap::Parser;

use upstream_visor::config::load_config;
use upstream_visor::lifecycle::{self, RunMode};
use upstream_visor::observability::logging::init_logging;

#[derive(Parser)]
#[command(name = "upstream-visor")]
#[command(about = "Render nginx upstream configs from a service registry", long_about = None)]
struct Cli {
    /// Optional TOML file; environment variables override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Run a single reconciliation pass and exit
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match load_config(cli.config.as_deref()) {
        Ok(loaded) => loaded,
        Err(e) => {
            init_logging("info");
            tracing::error!(error = %e, "Failed to load configuration");
            std::process::exit(1);
        }
    };
    let config = loaded.config;

    init_logging(&config.observability.log_level);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "upstream-visor starting");

    for var in &loaded.defaulted {
        tracing::info!(var = %var, "Use default value");
    }
    tracing::info!(
        dsn = %upstream_visor::admin::handlers::redact_dsn(&config.registry.dsn),
        interval_secs = config.reconcile.interval_secs,
        "Configuration loaded"
    );

    let mode = if cli.once { RunMode::Once } else { RunMode::Daemon };
    if let Err(e) = lifecycle::run(config, mode).await {
        tracing::error!(error = %e, "Exiting");
        std::process::exit(1);
    }
}
