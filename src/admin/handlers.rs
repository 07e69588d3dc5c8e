use axum::{extract::State, Json};
use serde::Serialize;
use url::Url;

use super::AdminState;
use crate::config::VisorConfig;

const REDACTED: &str = "***";

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub uptime_secs: u64,
}

pub async fn get_status(State(state): State<AdminState>) -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        uptime_secs: state.started_at.elapsed().as_secs(),
    })
}

pub async fn get_config(State(state): State<AdminState>) -> Json<VisorConfig> {
    let mut config = VisorConfig::clone(&state.config);
    config.registry.dsn = redact_dsn(&config.registry.dsn);
    Json(config)
}

pub async fn get_metrics(State(state): State<AdminState>) -> String {
    state.metrics.run_upkeep();
    state.metrics.render()
}

/// Replace the `token` query value, leaving every other part of the DSN as is.
pub fn redact_dsn(dsn: &str) -> String {
    let Ok(mut url) = Url::parse(dsn) else {
        return dsn.to_string();
    };
    if !url.query_pairs().any(|(k, _)| k == "token") {
        return dsn.to_string();
    }

    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            let v = if k == "token" { REDACTED.to_string() } else { v.into_owned() };
            (k.into_owned(), v)
        })
        .collect();
    url.query_pairs_mut().clear().extend_pairs(pairs);
    url.to_string()
}
