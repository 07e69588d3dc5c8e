//! Consul registry client.
//!
//! Talks to the Consul HTTP API directly:
//! - `GET /v1/catalog/services` lists service names
//! - `GET /v1/health/service/<name>` returns instances with their checks

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwapOption;
use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use url::Url;

use crate::config::RegistryConfig;
use crate::registry::{HealthStatus, Registry, RegistryDsn, RegistryEntry, RegistryError};

/// Tolerance for timer jitter when deciding whether a snapshot expired.
pub const CACHE_EXPIRY_SLACK: Duration = Duration::from_millis(500);

/// Snapshot kept between lookups.
struct CachedSnapshot {
    fetched_at: Instant,
    entries: Vec<RegistryEntry>,
}

/// Consul-backed registry.
pub struct ConsulRegistry {
    http_client: HttpClient,
    dsn: RegistryDsn,
    cache: ArcSwapOption<CachedSnapshot>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct HealthEntry {
    node: NodeInfo,
    service: ServiceInfo,
    #[serde(default)]
    checks: Vec<CheckInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct NodeInfo {
    #[serde(default)]
    address: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ServiceInfo {
    service: String,
    #[serde(default)]
    address: String,
    port: u16,
    #[serde(default)]
    tags: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CheckInfo {
    status: String,
}

impl From<HealthEntry> for RegistryEntry {
    fn from(entry: HealthEntry) -> Self {
        let address = if entry.service.address.is_empty() {
            entry.node.address
        } else {
            entry.service.address
        };
        let status = HealthStatus::aggregate(
            entry
                .checks
                .iter()
                .map(|check| HealthStatus::from_check(&check.status)),
        );

        RegistryEntry {
            name: entry.service.service,
            address,
            port: entry.service.port,
            status,
            tags: entry.service.tags.unwrap_or_default(),
        }
    }
}

impl ConsulRegistry {
    /// Create a client from the registry configuration.
    pub fn new(config: &RegistryConfig) -> Result<Self, RegistryError> {
        let dsn = RegistryDsn::parse(&config.dsn)?;
        let http_client = HttpClient::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        tracing::info!(
            agent = %dsn.base_url,
            datacenter = dsn.datacenter.as_deref().unwrap_or("default"),
            refresh_interval = ?dsn.refresh_interval,
            "Consul registry client ready"
        );

        Ok(Self {
            http_client,
            dsn,
            cache: ArcSwapOption::empty(),
        })
    }

    /// A snapshot is reused only while it is younger than the refresh
    /// interval minus [`CACHE_EXPIRY_SLACK`]. A caller polling at exactly the
    /// refresh interval therefore fetches on every call.
    fn cached(&self) -> Option<Vec<RegistryEntry>> {
        let ttl = self.dsn.refresh_interval?;
        let snapshot = self.cache.load_full()?;
        let fresh_for = ttl.checked_sub(CACHE_EXPIRY_SLACK)?;
        (snapshot.fetched_at.elapsed() < fresh_for).then(|| snapshot.entries.clone())
    }

    async fn fetch(&self) -> Result<Vec<RegistryEntry>, RegistryError> {
        let services: BTreeMap<String, serde_json::Value> = self
            .get_json(self.dsn.endpoint(&["v1", "catalog", "services"]))
            .await?;

        let mut entries = Vec::new();
        for name in services.keys() {
            let health: Vec<HealthEntry> = self
                .get_json(self.dsn.endpoint(&["v1", "health", "service", name.as_str()]))
                .await?;
            entries.extend(health.into_iter().map(RegistryEntry::from));
        }
        Ok(entries)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, RegistryError> {
        let mut request = self.http_client.get(url.clone());
        if let Some(dc) = &self.dsn.datacenter {
            request = request.query(&[("dc", dc)]);
        }
        if let Some(token) = &self.dsn.token {
            request = request.header("X-Consul-Token", token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(RegistryError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl Registry for ConsulRegistry {
    async fn lookup(&self) -> Result<Vec<RegistryEntry>, RegistryError> {
        if let Some(entries) = self.cached() {
            tracing::trace!(count = entries.len(), "Serving cached registry snapshot");
            return Ok(entries);
        }

        let started = Instant::now();
        let entries = self.fetch().await?;
        if self.dsn.refresh_interval.is_some() {
            self.cache.store(Some(Arc::new(CachedSnapshot {
                fetched_at: started,
                entries: entries.clone(),
            })));
        }
        Ok(entries)
    }
}
