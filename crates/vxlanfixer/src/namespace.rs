//! Namespace locator
//!
//! Finds the namespace handle that hosts an overlay network's VXLAN device.
//! An explicit id/name table is consulted first. Otherwise the handle
//! directory is scanned and each file name is offered to a
//! [`NamespaceMatcher`]; the default [`DockerOverlayConvention`] encodes
//! Docker's `<n>-<id prefix>` naming for overlay sandboxes.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{FixerError, Result};
use crate::platform::NetworkInfo;

/// Decides whether a namespace handle file belongs to a network
pub trait NamespaceMatcher: Send + Sync {
    fn matches(&self, file_name: &str, network: &NetworkInfo) -> bool;
}

/// Docker overlay naming: `<n>-<fragment of network id>`.
///
/// Local network namespaces are named `<id>` without a dash and never match.
#[derive(Debug, Clone, Copy, Default)]
pub struct DockerOverlayConvention;

impl NamespaceMatcher for DockerOverlayConvention {
    fn matches(&self, file_name: &str, network: &NetworkInfo) -> bool {
        match file_name.split('-').nth(1) {
            Some(fragment) if !fragment.is_empty() => network.id.contains(fragment),
            _ => false,
        }
    }
}

/// Resolves namespace handles for overlay networks
pub struct NamespaceLocator {
    dir: PathBuf,
    overrides: HashMap<String, PathBuf>,
    matcher: Box<dyn NamespaceMatcher>,
}

impl NamespaceLocator {
    /// Create a locator scanning `dir` with the Docker overlay convention
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            overrides: HashMap::new(),
            matcher: Box::new(DockerOverlayConvention),
        }
    }

    /// Use an explicit network id/name -> handle table ahead of the directory scan
    pub fn with_overrides(mut self, overrides: HashMap<String, PathBuf>) -> Self {
        self.overrides = overrides;
        self
    }

    /// Replace the file-name matching strategy
    pub fn with_matcher(mut self, matcher: impl NamespaceMatcher + 'static) -> Self {
        self.matcher = Box::new(matcher);
        self
    }

    /// Return the namespace handle for `network`
    pub fn resolve(&self, network: &NetworkInfo) -> Result<PathBuf> {
        if let Some(path) = self
            .overrides
            .get(&network.id)
            .or_else(|| self.overrides.get(&network.name))
        {
            info!(
                network = %network.name,
                netns = %path.display(),
                "Using configured namespace handle"
            );
            return Ok(path.clone());
        }

        let mut candidates = self.handle_files(network)?;
        candidates.sort();

        for (name, path) in candidates {
            if self.matcher.matches(&name, network) {
                debug!(
                    network = %network.name,
                    netns = %path.display(),
                    "Matched namespace handle"
                );
                return Ok(path);
            }
        }

        Err(self.not_found(network))
    }

    fn handle_files(&self, network: &NetworkInfo) -> Result<Vec<(String, PathBuf)>> {
        let entries = fs::read_dir(&self.dir).map_err(|e| {
            debug!(dir = %self.dir.display(), error = %e, "Cannot list namespace directory");
            self.not_found(network)
        })?;

        let mut files = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if !is_file(&path) {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                files.push((name.to_string(), path));
            }
        }
        Ok(files)
    }

    fn not_found(&self, network: &NetworkInfo) -> FixerError {
        FixerError::NamespaceNotFound {
            network: network.name.clone(),
            dir: self.dir.clone(),
        }
    }
}

fn is_file(path: &Path) -> bool {
    fs::metadata(path).map(|m| m.is_file()).unwrap_or(false)
}
