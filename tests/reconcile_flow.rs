//! End-to-end passes: mocked Consul agent, real templates, real commands.

#![cfg(unix)]

use std::sync::Arc;

use wiremock::MockServer;

use upstream_visor::config::{ReconcileConfig, ReloadConfig};
use upstream_visor::reconciler::{PassOutcome, Reconciler};
use upstream_visor::registry::ConsulRegistry;
use upstream_visor::reload::ReloadInvoker;
use upstream_visor::render::ConfigRenderer;

mod common;

use common::{health_entry, mount_consul, registry_config, Layout, UPSTREAM_TPL};

fn reconciler(server: &MockServer, layout: &Layout, test_cmd: &str) -> Reconciler {
    let registry = ConsulRegistry::new(&registry_config(server.uri())).unwrap();
    let reload = ReloadConfig {
        test_cmd: test_cmd.to_string(),
        reload_cmd: format!("touch {}", layout.conf.join("reloaded").display()),
        command_timeout_secs: 5,
    };
    Reconciler::new(
        Arc::new(registry),
        ConfigRenderer::new(&layout.paths()),
        Arc::new(ReloadInvoker::new(&reload).unwrap()),
        ReconcileConfig::default(),
    )
}

async fn web_cluster() -> MockServer {
    let server = MockServer::start().await;
    mount_consul(
        &server,
        &[(
            "web",
            vec![
                health_entry("web", "10.0.0.1", 80, "passing", &["SERVICE_WEIGHT=5"]),
                health_entry("web", "10.0.0.2", 80, "critical", &[]),
            ],
        )],
    )
    .await;
    server
}

#[tokio::test]
async fn test_pass_renders_and_reloads() {
    let server = web_cluster().await;
    let layout = Layout::new();
    layout.write_template("web", UPSTREAM_TPL);

    let mut reconciler = reconciler(&server, &layout, "true");
    let report = reconciler.reconcile().await;

    assert_eq!(report.outcome, PassOutcome::Reloaded);
    assert_eq!(report.rendered, vec!["web".to_string()]);
    assert_eq!(
        layout.read_conf("web"),
        "upstream web\nserver 10.0.0.1:80 weight=5;\nserver 10.0.0.2:80 weight=1 backup;\nend\n"
    );
    assert!(layout.conf.join("reloaded").exists());
    assert_eq!(reconciler.state().len(), 1);
}

#[tokio::test]
async fn test_unchanged_registry_skips_render_and_reload() {
    let server = web_cluster().await;
    let layout = Layout::new();
    layout.write_template("web", UPSTREAM_TPL);

    let mut reconciler = reconciler(&server, &layout, "true");
    assert_eq!(reconciler.reconcile().await.outcome, PassOutcome::Reloaded);
    std::fs::remove_file(layout.conf.join("reloaded")).unwrap();

    let report = reconciler.reconcile().await;
    assert_eq!(report.outcome, PassOutcome::NoChanges);
    assert_eq!(report.unchanged, vec!["web".to_string()]);
    assert!(!layout.conf.join("reloaded").exists());
}

#[tokio::test]
async fn test_failed_config_test_withholds_commit_and_retries() {
    let server = web_cluster().await;
    let layout = Layout::new();
    layout.write_template("web", UPSTREAM_TPL);

    let mut reconciler = reconciler(&server, &layout, "false");
    let report = reconciler.reconcile().await;

    assert_eq!(report.outcome, PassOutcome::ReloadFailed);
    assert!(layout.conf_path("web").exists());
    assert!(!layout.conf.join("reloaded").exists());
    assert!(reconciler.state().is_empty());

    // Not committed, so the next pass renders again.
    let report = reconciler.reconcile().await;
    assert_eq!(report.rendered, vec!["web".to_string()]);
}

#[tokio::test]
async fn test_missing_template_does_not_block_other_services() {
    let server = MockServer::start().await;
    mount_consul(
        &server,
        &[
            ("api", vec![health_entry("api", "10.0.1.1", 9000, "passing", &[])]),
            ("web", vec![health_entry("web", "10.0.0.1", 80, "passing", &[])]),
        ],
    )
    .await;
    let layout = Layout::new();
    layout.write_template("web", UPSTREAM_TPL);

    let mut reconciler = reconciler(&server, &layout, "true");
    let report = reconciler.reconcile().await;

    assert_eq!(report.outcome, PassOutcome::Reloaded);
    assert_eq!(report.failed, vec!["api".to_string()]);
    assert_eq!(report.rendered, vec!["web".to_string()]);
    assert!(!layout.conf_path("api").exists());
    assert_eq!(
        layout.read_conf("web"),
        "upstream web\nserver 10.0.0.1:80 weight=1;\nend\n"
    );
}

#[tokio::test]
async fn test_unreachable_registry_fails_the_pass() {
    let layout = Layout::new();
    let registry = ConsulRegistry::new(&registry_config("http://127.0.0.1:1")).unwrap();
    let reload = ReloadConfig {
        test_cmd: "true".to_string(),
        reload_cmd: "true".to_string(),
        command_timeout_secs: 5,
    };
    let mut reconciler = Reconciler::new(
        Arc::new(registry),
        ConfigRenderer::new(&layout.paths()),
        Arc::new(ReloadInvoker::new(&reload).unwrap()),
        ReconcileConfig::default(),
    );

    let report = reconciler.reconcile().await;
    assert_eq!(report.outcome, PassOutcome::LookupFailed);
    assert!(report.outcome.is_failure());
}
