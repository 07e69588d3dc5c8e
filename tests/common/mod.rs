//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;

use serde_json::{json, Map, Value};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use upstream_visor::config::{PathsConfig, RegistryConfig};

pub const UPSTREAM_TPL: &str = "upstream {{service}}\n\
    {{#each servers}}server {{host}}:{{port}} weight={{weight}}{{#if backup}} backup{{/if}};\n{{/each}}end\n";

pub const NODE_ADDRESS: &str = "10.9.9.9";

/// One element of a `/v1/health/service/<name>` response.
pub fn health_entry(service: &str, address: &str, port: u16, status: &str, tags: &[&str]) -> Value {
    json!({
        "Node": { "Node": "node-1", "Address": NODE_ADDRESS },
        "Service": {
            "ID": format!("{service}-{port}"),
            "Service": service,
            "Address": address,
            "Port": port,
            "Tags": tags,
        },
        "Checks": [
            { "CheckID": "serfHealth", "Status": "passing" },
            { "CheckID": format!("service:{service}"), "Status": status },
        ],
    })
}

/// Mount the catalog listing plus one health endpoint per service.
pub async fn mount_consul(server: &MockServer, services: &[(&str, Vec<Value>)]) {
    let catalog: Map<String, Value> = services
        .iter()
        .map(|(name, _)| (name.to_string(), json!([])))
        .collect();

    Mock::given(method("GET"))
        .and(path("/v1/catalog/services"))
        .respond_with(ResponseTemplate::new(200).set_body_json(Value::Object(catalog)))
        .mount(server)
        .await;

    for (name, entries) in services {
        Mock::given(method("GET"))
            .and(path(format!("/v1/health/service/{name}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(Value::Array(entries.clone())))
            .mount(server)
            .await;
    }
}

pub fn registry_config(dsn: impl Into<String>) -> RegistryConfig {
    RegistryConfig {
        dsn: dsn.into(),
        request_timeout_secs: 5,
    }
}

/// Temporary templates and conf directories.
pub struct Layout {
    _dir: TempDir,
    pub templates: PathBuf,
    pub conf: PathBuf,
}

impl Layout {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let templates = dir.path().join("templates");
        let conf = dir.path().join("conf.d");
        fs::create_dir_all(&templates).unwrap();
        fs::create_dir_all(&conf).unwrap();
        Self {
            _dir: dir,
            templates,
            conf,
        }
    }

    pub fn paths(&self) -> PathsConfig {
        PathsConfig {
            templates_dir: self.templates.clone(),
            conf_dir: self.conf.clone(),
        }
    }

    pub fn write_template(&self, service: &str, body: &str) {
        fs::write(self.templates.join(format!("{service}.tpl")), body).unwrap();
    }

    pub fn conf_path(&self, service: &str) -> PathBuf {
        self.conf.join(format!("{service}.conf"))
    }

    pub fn read_conf(&self, service: &str) -> String {
        fs::read_to_string(self.conf_path(service)).unwrap()
    }
}
