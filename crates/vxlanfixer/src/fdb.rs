//! Kernel forwarding table access
//!
//! [`FdbTable`] reads the VXLAN device's remote entries out of the bridge
//! forwarding table and applies correction plans to it. Both operations run
//! inside the overlay network's namespace, each as a single scope: one
//! entry for the read, one entry for the whole plan.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use vxlanfix_common::{CommandRunner, NamespaceEntry};
use vxlanfix_types::{Endpoint, EndpointSet, MacAddress};

use crate::commands::{build_fdb_delete_cmd, build_fdb_replace_cmd, build_fdb_show_cmd};
use crate::error::{FixerError, Result};
use crate::reconcile::Plan;

/// Marker preceding the remote VTEP address in `bridge fdb show` output
const DST_MARKER: &str = "dst";

/// Marker preceding the device name in `bridge fdb show` output
const DEV_MARKER: &str = "dev";

/// Forwarding-table mutation kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    Replace,
    Delete,
}

impl MutationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MutationKind::Replace => "replace",
            MutationKind::Delete => "delete",
        }
    }
}

/// A mutation that produced output or failed; the rest of the plan still ran
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationWarning {
    pub kind: MutationKind,
    pub mac: MacAddress,
    pub output: String,
}

impl fmt::Display for MutationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}: {}", self.kind.as_str(), self.mac, self.output)
    }
}

/// Outcome of applying a plan
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyResult {
    /// True when the plan was only reported
    pub dry_run: bool,
    /// Mutation commands issued
    pub attempted: usize,
    /// Mutation commands that completed silently
    pub applied: usize,
    pub warnings: Vec<MutationWarning>,
}

impl ApplyResult {
    fn dry_run() -> Self {
        Self {
            dry_run: true,
            ..Self::default()
        }
    }
}

/// Forwarding table of one VXLAN device inside a network namespace
pub struct FdbTable {
    netns: PathBuf,
    bridge: String,
    device: String,
    runner: Arc<dyn CommandRunner>,
    namespaces: Arc<dyn NamespaceEntry>,
}

impl FdbTable {
    pub fn new(
        netns: impl Into<PathBuf>,
        bridge: impl Into<String>,
        device: impl Into<String>,
        runner: Arc<dyn CommandRunner>,
        namespaces: Arc<dyn NamespaceEntry>,
    ) -> Self {
        Self {
            netns: netns.into(),
            bridge: bridge.into(),
            device: device.into(),
            runner,
            namespaces,
        }
    }

    /// Read the observed endpoint set
    #[instrument(skip(self), fields(netns = %self.netns.display(), bridge = %self.bridge))]
    pub async fn read_endpoints(&self) -> Result<EndpointSet> {
        let _scope = self
            .namespaces
            .enter(&self.netns)
            .map_err(FixerError::NamespaceEntry)?;

        let output = self
            .runner
            .run_or_throw(&build_fdb_show_cmd(&self.bridge))
            .await
            .map_err(FixerError::CommandExecution)?;

        let endpoints = parse_fdb_output(&output, &self.device);
        debug!(count = endpoints.len(), "Read observed endpoints");
        Ok(endpoints)
    }

    /// Apply `plan` unless `dry_run` is set.
    ///
    /// Only a failure to enter the namespace is an error. Each mutation is
    /// attempted independently and problems are collected as warnings.
    #[instrument(skip(self, plan), fields(netns = %self.netns.display(), mutations = plan.len()))]
    pub async fn apply(&self, plan: &Plan, dry_run: bool) -> Result<ApplyResult> {
        if dry_run {
            info!("Dry run, forwarding table left untouched");
            return Ok(ApplyResult::dry_run());
        }
        if plan.is_empty() {
            return Ok(ApplyResult::default());
        }

        let _scope = self
            .namespaces
            .enter(&self.netns)
            .map_err(FixerError::NamespaceEntry)?;

        let mut result = ApplyResult::default();
        for r in &plan.replace {
            let cmd = build_fdb_replace_cmd(&r.mac, &self.device, &r.to);
            self.mutate(MutationKind::Replace, r.mac, &cmd, &mut result).await;
        }
        for d in &plan.delete {
            let cmd = build_fdb_delete_cmd(&d.mac, &self.device);
            self.mutate(MutationKind::Delete, d.mac, &cmd, &mut result).await;
        }

        info!(
            attempted = result.attempted,
            applied = result.applied,
            warnings = result.warnings.len(),
            "Applied correction plan"
        );
        Ok(result)
    }

    async fn mutate(
        &self,
        kind: MutationKind,
        mac: MacAddress,
        cmd: &str,
        result: &mut ApplyResult,
    ) {
        result.attempted += 1;

        let output = match self.runner.run(cmd).await {
            Ok(exec) if exec.success() && exec.combined_output().is_empty() => {
                result.applied += 1;
                return;
            }
            Ok(exec) if exec.success() => exec.combined_output(),
            Ok(exec) => format!("exit code {}: {}", exec.exit_code, exec.combined_output()),
            Err(e) => e.to_string(),
        };

        let warning = MutationWarning { kind, mac, output };
        warn!(%mac, kind = kind.as_str(), output = %warning.output, "Mutation produced output");
        result.warnings.push(warning);
    }
}

/// Extract the remote endpoints of `device` from `bridge fdb show` output.
///
/// A line qualifies when it names `device` after `dev` and carries a `dst`
/// locator; local and flood entries without a destination are dropped.
pub fn parse_fdb_output(output: &str, device: &str) -> EndpointSet {
    let mut endpoints = EndpointSet::new();

    for line in output.lines() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        let Some(mac) = fields.first() else {
            continue;
        };
        if value_after(&fields, DEV_MARKER) != Some(device) {
            continue;
        }
        let Some(locator) = value_after(&fields, DST_MARKER) else {
            continue;
        };

        match Endpoint::parse(mac, locator) {
            Ok(endpoint) => {
                endpoints.insert(endpoint);
            }
            Err(e) => debug!(line = %line, error = %e, "Skipping unparseable fdb entry"),
        }
    }

    endpoints
}

fn value_after<'a>(fields: &[&'a str], marker: &str) -> Option<&'a str> {
    fields
        .iter()
        .position(|f| *f == marker)
        .and_then(|i| fields.get(i + 1))
        .copied()
}
