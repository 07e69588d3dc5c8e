//! Registry DSN parsing.
//!
//! Form: `http://127.0.0.1:8500?dc=dc1&refresh_interval=5&token=secret`

use std::time::Duration;

use url::Url;

use crate::registry::RegistryError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryDsn {
    /// Agent base URL with the query stripped.
    pub base_url: Url,
    pub datacenter: Option<String>,
    pub token: Option<String>,
    /// Lifetime of a cached snapshot. `None` disables caching.
    pub refresh_interval: Option<Duration>,
}

impl RegistryDsn {
    pub fn parse(dsn: &str) -> Result<Self, RegistryError> {
        let invalid = |reason: String| RegistryError::InvalidDsn {
            dsn: dsn.to_string(),
            reason,
        };

        let mut url = Url::parse(dsn).map_err(|e| invalid(e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid(format!("unsupported scheme {:?}", url.scheme())));
        }
        if url.host_str().is_none() {
            return Err(invalid("missing host".to_string()));
        }

        let mut datacenter = None;
        let mut token = None;
        let mut refresh_interval = None;
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "dc" if !value.is_empty() => datacenter = Some(value.into_owned()),
                "token" if !value.is_empty() => token = Some(value.into_owned()),
                "refresh_interval" => {
                    let secs: u64 = value
                        .parse()
                        .map_err(|_| invalid(format!("refresh_interval {value:?} is not a number")))?;
                    refresh_interval = (secs > 0).then(|| Duration::from_secs(secs));
                }
                other => tracing::debug!(key = other, "Ignoring unknown registry DSN option"),
            }
        }

        url.set_query(None);
        url.set_fragment(None);

        Ok(Self {
            base_url: url,
            datacenter,
            token,
            refresh_interval,
        })
    }

    /// Build an API URL such as `/v1/catalog/services` relative to the agent.
    pub fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}
