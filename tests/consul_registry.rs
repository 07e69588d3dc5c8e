//! Consul registry client against a mocked agent.

use std::time::Duration;

use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use upstream_visor::registry::{ConsulRegistry, HealthStatus, Registry, RegistryError};

mod common;

use common::{health_entry, mount_consul, registry_config, NODE_ADDRESS};

#[tokio::test]
async fn test_lookup_returns_every_instance() {
    let server = MockServer::start().await;
    mount_consul(
        &server,
        &[
            (
                "web",
                vec![
                    health_entry("web", "10.0.0.1", 80, "passing", &["SERVICE_WEIGHT=5"]),
                    health_entry("web", "10.0.0.2", 80, "critical", &[]),
                ],
            ),
            ("api", vec![health_entry("api", "10.0.1.1", 9000, "warning", &[])]),
        ],
    )
    .await;

    let registry = ConsulRegistry::new(&registry_config(server.uri())).unwrap();
    let entries = registry.lookup().await.unwrap();

    assert_eq!(entries.len(), 3);
    // Catalog names are visited in sorted order.
    assert_eq!(entries[0].name, "api");
    assert_eq!(entries[0].status, HealthStatus::Warning);
    assert_eq!(entries[1].address, "10.0.0.1");
    assert_eq!(entries[1].status, HealthStatus::Passing);
    assert_eq!(entries[1].tags, vec!["SERVICE_WEIGHT=5".to_string()]);
    assert_eq!(entries[2].status, HealthStatus::Critical);
}

#[tokio::test]
async fn test_empty_service_address_uses_node_address() {
    let server = MockServer::start().await;
    mount_consul(&server, &[("web", vec![health_entry("web", "", 8080, "passing", &[])])]).await;

    let registry = ConsulRegistry::new(&registry_config(server.uri())).unwrap();
    let entries = registry.lookup().await.unwrap();

    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].address, NODE_ADDRESS);
    assert_eq!(entries[0].port, 8080);
}

#[tokio::test]
async fn test_datacenter_and_token_are_sent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/catalog/services"))
        .and(query_param("dc", "dc2"))
        .and(header("X-Consul-Token", "s3cret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"web": []})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/health/service/web"))
        .and(query_param("dc", "dc2"))
        .and(header("X-Consul-Token", "s3cret"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(vec![health_entry("web", "10.0.0.1", 80, "passing", &[])]),
        )
        .expect(1)
        .mount(&server)
        .await;

    let dsn = format!("{}?dc=dc2&token=s3cret", server.uri());
    let registry = ConsulRegistry::new(&registry_config(dsn)).unwrap();
    let entries = registry.lookup().await.unwrap();
    assert_eq!(entries.len(), 1);
}

#[tokio::test]
async fn test_snapshot_cached_within_refresh_interval() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/catalog/services"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"web": []})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/health/service/web"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(vec![health_entry("web", "10.0.0.1", 80, "passing", &[])]),
        )
        .expect(1)
        .mount(&server)
        .await;

    let dsn = format!("{}?refresh_interval=60", server.uri());
    let registry = ConsulRegistry::new(&registry_config(dsn)).unwrap();

    let first = registry.lookup().await.unwrap();
    let second = registry.lookup().await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_polling_at_refresh_interval_fetches_every_tick() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/catalog/services"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({}))
                .set_delay(Duration::from_millis(100)),
        )
        .expect(4)
        .mount(&server)
        .await;

    let dsn = format!("{}?refresh_interval=1", server.uri());
    let registry = ConsulRegistry::new(&registry_config(dsn)).unwrap();

    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    for _ in 0..4 {
        ticker.tick().await;
        registry.lookup().await.unwrap();
    }
}

#[tokio::test]
async fn test_without_refresh_interval_every_lookup_fetches() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/catalog/services"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .expect(2)
        .mount(&server)
        .await;

    let registry = ConsulRegistry::new(&registry_config(server.uri())).unwrap();
    assert!(registry.lookup().await.unwrap().is_empty());
    assert!(registry.lookup().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_agent_error_status_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/catalog/services"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let registry = ConsulRegistry::new(&registry_config(server.uri())).unwrap();
    match registry.lookup().await {
        Err(RegistryError::Status { status, url }) => {
            assert_eq!(status, 500);
            assert!(url.ends_with("/v1/catalog/services"));
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unreachable_agent_is_transport_error() {
    let registry = ConsulRegistry::new(&registry_config("http://127.0.0.1:1")).unwrap();
    assert!(matches!(
        registry.lookup().await,
        Err(RegistryError::Http(_))
    ));
}

#[test]
fn test_invalid_dsn_is_rejected() {
    assert!(matches!(
        ConsulRegistry::new(&registry_config("consul://127.0.0.1:8500")),
        Err(RegistryError::InvalidDsn { .. })
    ));
}
