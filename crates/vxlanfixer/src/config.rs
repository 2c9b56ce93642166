//! Configuration file support for vxlanfixer
//!
//! Loads and validates the YAML configuration named on the command line:
//!
//! ```yaml
//! docker:
//!   host: 127.0.0.1
//!   port: 2375
//! consul:
//!   host: 127.0.0.1
//!   port: 8500
//! netns: my-overlay
//! device: vxlan0
//! dry_run: true
//! ```

use crate::error::{FixerError, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Address of an HTTP API (Docker Engine, Consul agent)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ApiEndpoint {
    pub host: String,
    pub port: u16,
}

impl ApiEndpoint {
    /// Base URL for plain HTTP requests, e.g. `http://127.0.0.1:8500`
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    fn validate(&self, section: &str) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(FixerError::config(format!("{}.host must not be empty", section)));
        }
        if self.port == 0 {
            return Err(FixerError::config(format!("{}.port must not be 0", section)));
        }
        Ok(())
    }
}

/// Complete vxlanfixer configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FixerConfig {
    /// Docker Engine API
    pub docker: ApiEndpoint,

    /// Consul agent API
    pub consul: ApiEndpoint,

    /// Name of the overlay network to repair
    pub netns: String,

    /// VXLAN device inside the overlay namespace
    pub device: String,

    /// Report the plan without touching the forwarding table
    #[serde(default)]
    pub dry_run: bool,

    /// Bridge whose forwarding table is inspected
    #[serde(default = "default_bridge")]
    pub bridge: String,

    /// Directory holding the namespace handles of Docker networks
    #[serde(default = "default_netns_dir")]
    pub netns_dir: PathBuf,

    /// Explicit network id/name -> namespace handle table
    #[serde(default)]
    pub netns_map: HashMap<String, PathBuf>,

    /// Consul key prefix under which endpoints are stored
    #[serde(default = "default_kv_prefix")]
    pub kv_prefix: String,

    /// Print both endpoint tables before the report
    #[serde(default)]
    pub dump_endpoints: bool,

    /// HTTP timeout for the Docker and Consul clients, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_bridge() -> String {
    "br0".to_string()
}

fn default_netns_dir() -> PathBuf {
    PathBuf::from("/var/run/docker/netns")
}

fn default_kv_prefix() -> String {
    "docker/network/v1.0/endpoint/".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl FixerConfig {
    /// Load and validate configuration from a YAML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            FixerError::config(format!("Cannot read config file {}: {}", path.display(), e))
        })?;

        let config = Self::from_yaml(&content).map_err(|e| match e {
            FixerError::Config(msg) => {
                FixerError::config(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })?;

        tracing::debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Parse and validate configuration from YAML text
    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(content)
            .map_err(|e| FixerError::config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        self.docker.validate("docker")?;
        self.consul.validate("consul")?;

        if self.netns.trim().is_empty() {
            return Err(FixerError::config("netns must not be empty"));
        }
        if self.device.trim().is_empty() {
            return Err(FixerError::config("device must not be empty"));
        }
        if self.bridge.trim().is_empty() {
            return Err(FixerError::config("bridge must not be empty"));
        }
        if self.timeout_secs == 0 {
            return Err(FixerError::config("timeout_secs must be greater than 0"));
        }

        Ok(())
    }

    /// Get HTTP timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
