//! VxlanFixer - one reconciliation pass over an overlay network
//!
//! Flow:
//! 1. [`VxlanContext::resolve`] finds the network and its namespace handle
//! 2. the canonical (directory) and observed (kernel) endpoint sets are read
//!    on first use and cached for the life of the fixer
//! 3. [`compute_plan`] diffs them
//! 4. the plan is applied to the forwarding table unless this is a dry run

use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{info, instrument, warn};
use vxlanfix_common::{CommandRunner, NamespaceEntry};
use vxlanfix_types::EndpointSet;

use crate::config::FixerConfig;
use crate::directory::EndpointDirectory;
use crate::error::{FixerError, Result};
use crate::fdb::FdbTable;
use crate::namespace::NamespaceLocator;
use crate::platform::NetworkLookup;
use crate::reconcile::{compute_plan, Plan};
use crate::report::Report;

/// The overlay network being repaired
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VxlanContext {
    /// Platform network id
    pub id: String,
    /// Platform network name
    pub name: String,
    /// VXLAN device inside the namespace
    pub device: String,
    /// Bridge the device is enslaved to
    pub bridge: String,
    /// Namespace handle hosting the device
    pub netns: PathBuf,
}

impl VxlanContext {
    /// Resolve the configured network and its namespace handle.
    ///
    /// Fails with `NetworkNotFound` or `NamespaceNotFound`.
    #[instrument(skip_all, fields(network = %config.netns))]
    pub async fn resolve(
        config: &FixerConfig,
        platform: &dyn NetworkLookup,
        locator: &NamespaceLocator,
    ) -> Result<Self> {
        let network = platform.find_network(&config.netns).await?;
        let netns = locator.resolve(&network)?;

        info!(
            id = %network.id,
            name = %network.name,
            netns = %netns.display(),
            device = %config.device,
            "Resolved VXLAN context"
        );

        Ok(Self {
            id: network.id,
            name: network.name,
            device: config.device.clone(),
            bridge: config.bridge.clone(),
            netns,
        })
    }
}

/// Reconciles one overlay network's forwarding table with the directory
pub struct VxlanFixer {
    context: VxlanContext,
    directory: Arc<dyn EndpointDirectory>,
    fdb: FdbTable,
    canonical: OnceCell<EndpointSet>,
    observed: OnceCell<EndpointSet>,
}

impl VxlanFixer {
    pub fn new(
        context: VxlanContext,
        directory: Arc<dyn EndpointDirectory>,
        runner: Arc<dyn CommandRunner>,
        namespaces: Arc<dyn NamespaceEntry>,
    ) -> Self {
        let fdb = FdbTable::new(
            context.netns.clone(),
            context.bridge.clone(),
            context.device.clone(),
            runner,
            namespaces,
        );

        Self {
            context,
            directory,
            fdb,
            canonical: OnceCell::new(),
            observed: OnceCell::new(),
        }
    }

    /// Directory snapshot, queried on first call
    pub async fn canonical_endpoints(&self) -> Result<&EndpointSet> {
        self.canonical
            .get_or_try_init(|| async {
                let endpoints = self.directory.list_endpoints().await?;
                for mac in endpoints.conflicting_macs() {
                    warn!(
                        %mac,
                        "Directory lists several locators for one MAC, using the first"
                    );
                }
                info!(count = endpoints.len(), "Canonical endpoints loaded");
                Ok::<_, FixerError>(endpoints)
            })
            .await
    }

    /// Forwarding-table snapshot, read on first call
    pub async fn observed_endpoints(&self) -> Result<&EndpointSet> {
        self.observed
            .get_or_try_init(|| async {
                let endpoints = self.fdb.read_endpoints().await?;
                info!(
                    count = endpoints.len(),
                    device = %self.context.device,
                    "Observed endpoints loaded"
                );
                Ok::<_, FixerError>(endpoints)
            })
            .await
    }

    /// Compute the correction plan from both snapshots
    pub async fn find_messy_entries(&self) -> Result<Plan> {
        let canonical = self.canonical_endpoints().await?;
        let observed = self.observed_endpoints().await?;

        let plan = compute_plan(canonical, observed);
        info!(
            replace = plan.replace.len(),
            delete = plan.delete.len(),
            "Computed correction plan"
        );
        Ok(plan)
    }

    /// Compute the plan and apply it unless `dry_run` is set
    #[instrument(skip(self), fields(network = %self.context.name))]
    pub async fn run(&self, dry_run: bool) -> Result<Report> {
        let plan = self.find_messy_entries().await?;
        let outcome = self.fdb.apply(&plan, dry_run).await?;
        Ok(Report { plan, outcome })
    }
}
