//! Single-pass mode through the startup path.

#![cfg(unix)]

use wiremock::MockServer;

use upstream_visor::config::ReloadConfig;
use upstream_visor::lifecycle::{self, RunError, RunMode};
use upstream_visor::reconciler::PassOutcome;
use upstream_visor::VisorConfig;

mod common;

use common::{health_entry, mount_consul, registry_config, Layout, UPSTREAM_TPL};

fn config(dsn: impl Into<String>, layout: &Layout, test_cmd: &str) -> VisorConfig {
    VisorConfig {
        registry: registry_config(dsn),
        paths: layout.paths(),
        reload: ReloadConfig {
            test_cmd: test_cmd.to_string(),
            reload_cmd: "true".to_string(),
            command_timeout_secs: 5,
        },
        ..VisorConfig::default()
    }
}

#[tokio::test]
async fn test_once_succeeds_after_reload() {
    let server = MockServer::start().await;
    mount_consul(
        &server,
        &[("web", vec![health_entry("web", "10.0.0.1", 80, "passing", &[])])],
    )
    .await;
    let layout = Layout::new();
    layout.write_template("web", UPSTREAM_TPL);

    let result = lifecycle::run(config(server.uri(), &layout, "true"), RunMode::Once).await;

    assert!(result.is_ok());
    assert_eq!(
        layout.read_conf("web"),
        "upstream web\nserver 10.0.0.1:80 weight=1;\nend\n"
    );
}

#[tokio::test]
async fn test_once_with_nothing_to_do_succeeds() {
    let server = MockServer::start().await;
    mount_consul(&server, &[]).await;
    let layout = Layout::new();

    let result = lifecycle::run(config(server.uri(), &layout, "true"), RunMode::Once).await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_once_fails_when_registry_unreachable() {
    let layout = Layout::new();

    let result = lifecycle::run(config("http://127.0.0.1:1", &layout, "true"), RunMode::Once).await;
    assert!(matches!(
        result,
        Err(RunError::PassFailed(PassOutcome::LookupFailed))
    ));
}

#[tokio::test]
async fn test_once_fails_when_config_test_fails() {
    let server = MockServer::start().await;
    mount_consul(
        &server,
        &[("web", vec![health_entry("web", "10.0.0.1", 80, "passing", &[])])],
    )
    .await;
    let layout = Layout::new();
    layout.write_template("web", UPSTREAM_TPL);

    let result = lifecycle::run(config(server.uri(), &layout, "false"), RunMode::Once).await;
    assert!(matches!(
        result,
        Err(RunError::PassFailed(PassOutcome::ReloadFailed))
    ));
}

#[tokio::test]
async fn test_invalid_dsn_fails_startup() {
    let layout = Layout::new();

    let result = lifecycle::run(config("consul://nowhere", &layout, "true"), RunMode::Once).await;
    assert!(matches!(result, Err(RunError::Registry(_))));
}
