//! Endpoint directory reader
//!
//! Docker's overlay driver stores one JSON record per endpoint in Consul
//! under `docker/network/v1.0/endpoint/`. Each record names the endpoint's
//! interface MAC (`ep_iface.mac`) and the host it lives on (`locator`).
//! Together they form the canonical endpoint set.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument, warn};
use vxlanfix_types::{Endpoint, EndpointSet};

use crate::error::{FixerError, Result};

/// Source of the canonical endpoint set
#[async_trait]
pub trait EndpointDirectory: Send + Sync {
    /// Queries the directory for every registered endpoint
    async fn list_endpoints(&self) -> Result<EndpointSet>;
}

/// One entry of a recursive Consul KV listing
#[derive(Debug, Deserialize)]
struct KvPair {
    #[serde(rename = "Key")]
    key: String,
    /// Base64-encoded payload; `null` for keys without a value
    #[serde(rename = "Value")]
    value: Option<String>,
}

/// Endpoint record as written by the overlay driver
#[derive(Debug, Deserialize)]
struct EndpointRecord {
    ep_iface: Option<EndpointIface>,
    locator: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EndpointIface {
    mac: Option<String>,
}

/// Consul KV-backed endpoint directory
#[derive(Debug, Clone)]
pub struct ConsulDirectory {
    base_url: String,
    prefix: String,
    client: Client,
}

impl ConsulDirectory {
    /// Create a directory reader for the Consul agent at `base_url`
    pub fn new(
        base_url: impl Into<String>,
        prefix: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FixerError::directory(format!("Cannot build Consul client: {}", e)))?;

        Ok(Self {
            base_url: base_url.into(),
            prefix: prefix.into(),
            client,
        })
    }

    fn kv_url(&self) -> String {
        format!(
            "{}/v1/kv/{}",
            self.base_url.trim_end_matches('/'),
            self.prefix.trim_start_matches('/')
        )
    }
}

#[async_trait]
impl EndpointDirectory for ConsulDirectory {
    #[instrument(skip(self), fields(prefix = %self.prefix))]
    async fn list_endpoints(&self) -> Result<EndpointSet> {
        let url = self.kv_url();
        let response = self
            .client
            .get(&url)
            .query(&[("recurse", "true")])
            .send()
            .await
            .map_err(|e| FixerError::directory(format!("GET {}: {}", url, e)))?;

        // Consul answers 404 for a prefix with no keys
        if response.status() == StatusCode::NOT_FOUND {
            debug!("No endpoints registered under prefix");
            return Ok(EndpointSet::new());
        }
        if !response.status().is_success() {
            return Err(FixerError::directory(format!(
                "GET {}: HTTP {}",
                url,
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| FixerError::directory(format!("GET {}: {}", url, e)))?;

        let endpoints = parse_kv_listing(&body)?;
        debug!(count = endpoints.len(), "Read canonical endpoints");
        Ok(endpoints)
    }
}

/// Decode a recursive KV listing into endpoints.
///
/// Keys without a value and records lacking the MAC or locator field are
/// skipped. A listing or value that cannot be decoded at all is an error.
pub fn parse_kv_listing(body: &str) -> Result<EndpointSet> {
    let pairs: Vec<KvPair> = serde_json::from_str(body)
        .map_err(|e| FixerError::directory(format!("Malformed KV listing: {}", e)))?;

    let mut endpoints = EndpointSet::new();
    for pair in pairs {
        let Some(encoded) = pair.value else {
            continue;
        };

        let raw = STANDARD.decode(encoded.trim()).map_err(|e| {
            FixerError::directory(format!("Malformed value under {}: {}", pair.key, e))
        })?;
        let record: EndpointRecord = serde_json::from_slice(&raw).map_err(|e| {
            FixerError::directory(format!("Malformed record under {}: {}", pair.key, e))
        })?;

        let mac = record.ep_iface.and_then(|iface| iface.mac);
        let (Some(mac), Some(locator)) = (mac, record.locator) else {
            debug!(key = %pair.key, "Skipping record without mac or locator");
            continue;
        };

        match Endpoint::parse(&mac, &locator) {
            Ok(endpoint) => {
                endpoints.insert(endpoint);
            }
            Err(e) => warn!(key = %pair.key, error = %e, "Skipping unparseable endpoint"),
        }
    }

    Ok(endpoints)
}
