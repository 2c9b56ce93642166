//! Container platform lookup
//!
//! Resolves the configured network label to the Docker network's id and
//! name through the Docker Engine HTTP API.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::error::{FixerError, Result};

/// Identity of an overlay network on the container platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkInfo {
    pub id: String,
    pub name: String,
}

/// Resolves overlay networks by label
#[async_trait]
pub trait NetworkLookup: Send + Sync {
    /// Returns the network named `label`, or `NetworkNotFound`
    async fn find_network(&self, label: &str) -> Result<NetworkInfo>;
}

#[derive(Debug, Deserialize)]
struct DockerNetwork {
    #[serde(rename = "Id")]
    id: String,
    #[serde(rename = "Name")]
    name: String,
}

/// Docker Engine API client
#[derive(Debug, Clone)]
pub struct DockerClient {
    base_url: String,
    client: Client,
}

impl DockerClient {
    /// Create a client for the Docker daemon at `base_url` (e.g. `http://127.0.0.1:2375`)
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FixerError::Platform(format!("Cannot build Docker client: {}", e)))?;

        Ok(Self {
            base_url: base_url.into(),
            client,
        })
    }
}

#[async_trait]
impl NetworkLookup for DockerClient {
    #[instrument(skip(self))]
    async fn find_network(&self, label: &str) -> Result<NetworkInfo> {
        let filters = serde_json::json!({ "name": [label] }).to_string();
        let url = format!("{}/networks", self.base_url.trim_end_matches('/'));

        let response = self
            .client
            .get(&url)
            .query(&[("filters", filters)])
            .send()
            .await
            .map_err(|e| FixerError::Platform(format!("GET {}: {}", url, e)))?;

        if !response.status().is_success() {
            return Err(FixerError::Platform(format!(
                "GET {}: HTTP {}",
                url,
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| FixerError::Platform(format!("GET {}: {}", url, e)))?;

        let network = select_network(&body, label)?;
        debug!(id = %network.id, name = %network.name, "Resolved overlay network");
        Ok(network)
    }
}

/// Pick the network for `label` out of a `/networks` response body.
///
/// Docker's name filter matches substrings, so an exact name match is
/// preferred over the first entry returned.
pub fn select_network(body: &str, label: &str) -> Result<NetworkInfo> {
    let networks: Vec<DockerNetwork> = serde_json::from_str(body)
        .map_err(|e| FixerError::Platform(format!("Malformed network list: {}", e)))?;

    let chosen = networks
        .iter()
        .find(|n| n.name == label)
        .or_else(|| networks.first())
        .ok_or_else(|| FixerError::NetworkNotFound(label.to_string()))?;

    Ok(NetworkInfo {
        id: chosen.id.clone(),
        name: chosen.name.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_select_exact_match() {
        let body = r#"[
            {"Id": "aaa111", "Name": "overlay0-test", "Driver": "overlay"},
            {"Id": "bbb222", "Name": "overlay0", "Driver": "overlay"}
        ]"#;
        let network = select_network(body, "overlay0").unwrap();
        assert_eq!(
            network,
            NetworkInfo {
                id: "bbb222".to_string(),
                name: "overlay0".to_string()
            }
        );
    }

    #[test]
    fn test_select_falls_back_to_first() {
        let body = r#"[{"Id": "aaa111", "Name": "overlay0-test"}]"#;
        let network = select_network(body, "overlay0").unwrap();
        assert_eq!(network.id, "aaa111");
    }

    #[test]
    fn test_select_empty_is_not_found() {
        let err = select_network("[]", "overlay0").unwrap_err();
        assert!(matches!(err, FixerError::NetworkNotFound(ref n) if n == "overlay0"));
    }

    #[test]
    fn test_select_malformed() {
        let err = select_network("{\"message\": \"oops\"}", "overlay0").unwrap_err();
        assert!(matches!(err, FixerError::Platform(_)));
    }
}
