//! End-to-end reconciliation passes driven through in-memory fakes

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use vxlanfix_common::{
    CommandRunner, CommonError, CommonResult, ExecResult, NamespaceEntry, NamespaceScope,
};
use vxlanfix_types::{Endpoint, EndpointSet};
use vxlanfixer::{
    EndpointDirectory, FixerConfig, FixerError, NamespaceLocator, NetworkInfo, NetworkLookup,
    VxlanContext, VxlanFixer,
};

const NETWORK_ID: &str = "4f1d8c2e9ab3771c0e0d7a5b";

const FDB_SHOW: &str = "\
02:42:0a:00:00:02 dev veth0 master br0
02:42:0a:00:00:03 dev vxlan0 dst 192.168.1.12 link-netnsid 0 self permanent
02:42:0a:00:00:04 dev vxlan0 dst 192.168.1.11 link-netnsid 0 self permanent
02:42:0a:00:00:05 dev vxlan0 dst 192.168.1.13 link-netnsid 0 self permanent
";

struct StaticDirectory {
    endpoints: Option<EndpointSet>,
    calls: AtomicUsize,
}

impl StaticDirectory {
    fn new(entries: &[(&str, &str)]) -> Self {
        Self {
            endpoints: Some(
                entries
                    .iter()
                    .map(|(mac, loc)| Endpoint::parse(mac, loc).unwrap())
                    .collect(),
            ),
            calls: AtomicUsize::new(0),
        }
    }

    fn unavailable() -> Self {
        Self {
            endpoints: None,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl EndpointDirectory for StaticDirectory {
    async fn list_endpoints(&self) -> vxlanfixer::Result<EndpointSet> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.endpoints
            .clone()
            .ok_or_else(|| FixerError::directory("connection refused"))
    }
}

/// Answers `fdb show` with a fixed table and records every command
struct FakeBridge {
    table: String,
    commands: Mutex<Vec<String>>,
}

impl FakeBridge {
    fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            commands: Mutex::new(Vec::new()),
        }
    }

    fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }

    fn mutations(&self) -> Vec<String> {
        self.commands()
            .into_iter()
            .filter(|c| !c.contains(" fdb show "))
            .collect()
    }
}

#[async_trait]
impl CommandRunner for FakeBridge {
    async fn run(&self, cmd: &str) -> CommonResult<ExecResult> {
        self.commands.lock().unwrap().push(cmd.to_string());
        if cmd.contains(" fdb show ") {
            Ok(ExecResult::ok(self.table.clone()))
        } else {
            Ok(ExecResult::default())
        }
    }
}

/// Counts namespace entries and the scopes still held open
#[derive(Default)]
struct CountingNamespaces {
    entered: AtomicUsize,
    live: Arc<AtomicUsize>,
}

impl CountingNamespaces {
    fn entered(&self) -> usize {
        self.entered.load(Ordering::SeqCst)
    }

    fn live(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }
}

struct OpenScope(Arc<AtomicUsize>);

impl Drop for OpenScope {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl NamespaceEntry for CountingNamespaces {
    fn enter(&self, handle: &Path) -> CommonResult<NamespaceScope> {
        if !handle.exists() {
            return Err(CommonError::namespace_switch(handle, "no such handle"));
        }
        self.entered.fetch_add(1, Ordering::SeqCst);
        self.live.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(OpenScope(self.live.clone())))
    }
}

struct FixedNetworks(Vec<NetworkInfo>);

#[async_trait]
impl NetworkLookup for FixedNetworks {
    async fn find_network(&self, label: &str) -> vxlanfixer::Result<NetworkInfo> {
        self.0
            .iter()
            .find(|n| n.name == label)
            .cloned()
            .ok_or_else(|| FixerError::NetworkNotFound(label.to_string()))
    }
}

fn config(network: &str, netns_dir: &Path) -> FixerConfig {
    let yaml = format!(
        "docker:\n  host: 127.0.0.1\n  port: 2375\n\
         consul:\n  host: 127.0.0.1\n  port: 8500\n\
         netns: {}\n\
         device: vxlan0\n\
         netns_dir: {}\n",
        network,
        netns_dir.display()
    );
    FixerConfig::from_yaml(&yaml).unwrap()
}

fn networks() -> FixedNetworks {
    FixedNetworks(vec![NetworkInfo {
        id: NETWORK_ID.to_string(),
        name: "overlay0".to_string(),
    }])
}

fn netns_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    File::create(dir.path().join("8b7c6d5e4f3a")).unwrap();
    File::create(dir.path().join("1-4f1d8c2e9a")).unwrap();
    dir
}

async fn resolve(dir: &Path) -> VxlanContext {
    let cfg = config("overlay0", dir);
    let locator = NamespaceLocator::new(cfg.netns_dir.clone());
    VxlanContext::resolve(&cfg, &networks(), &locator)
        .await
        .unwrap()
}

fn canonical() -> StaticDirectory {
    StaticDirectory::new(&[
        ("02:42:0a:00:00:03", "192.168.1.11"),
        ("02:42:0a:00:00:04", "192.168.1.11"),
    ])
}

#[tokio::test]
async fn test_context_resolution() {
    let dir = netns_dir();
    let context = resolve(dir.path()).await;

    assert_eq!(context.id, NETWORK_ID);
    assert_eq!(context.name, "overlay0");
    assert_eq!(context.device, "vxlan0");
    assert_eq!(context.bridge, "br0");
    assert_eq!(context.netns, dir.path().join("1-4f1d8c2e9a"));
}

#[tokio::test]
async fn test_unknown_network_is_fatal() {
    let dir = netns_dir();
    let cfg = config("missing", dir.path());
    let locator = NamespaceLocator::new(cfg.netns_dir.clone());

    let err = VxlanContext::resolve(&cfg, &networks(), &locator)
        .await
        .unwrap_err();
    assert!(matches!(err, FixerError::NetworkNotFound(ref n) if n == "missing"));
    assert_eq!(err.exit_code(), 1);
}

#[tokio::test]
async fn test_missing_namespace_handle_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config("overlay0", dir.path());
    let locator = NamespaceLocator::new(cfg.netns_dir.clone());

    let err = VxlanContext::resolve(&cfg, &networks(), &locator)
        .await
        .unwrap_err();
    assert!(matches!(err, FixerError::NamespaceNotFound { .. }));
}

#[tokio::test]
async fn test_dry_run_issues_no_mutations() {
    let dir = netns_dir();
    let bridge = Arc::new(FakeBridge::new(FDB_SHOW));
    let namespaces = Arc::new(CountingNamespaces::default());
    let fixer = VxlanFixer::new(
        resolve(dir.path()).await,
        Arc::new(canonical()),
        bridge.clone(),
        namespaces.clone(),
    );

    let report = fixer.run(true).await.unwrap();

    assert_eq!(report.plan.replace.len(), 1);
    assert_eq!(report.plan.delete.len(), 1);
    assert!(report.outcome.dry_run);
    assert!(bridge.mutations().is_empty());
    assert_eq!(namespaces.entered(), 1);
    assert_eq!(namespaces.live(), 0);
    assert!(report
        .to_string()
        .ends_with("This is a dry run, no modifications will be made to your system\n"));
}

#[tokio::test]
async fn test_run_applies_plan() {
    let dir = netns_dir();
    let bridge = Arc::new(FakeBridge::new(FDB_SHOW));
    let namespaces = Arc::new(CountingNamespaces::default());
    let fixer = VxlanFixer::new(
        resolve(dir.path()).await,
        Arc::new(canonical()),
        bridge.clone(),
        namespaces.clone(),
    );

    let report = fixer.run(false).await.unwrap();

    assert_eq!(
        bridge.mutations(),
        vec![
            "/sbin/bridge fdb replace 02:42:0a:00:00:03 dev \"vxlan0\" dst 192.168.1.11"
                .to_string(),
            "/sbin/bridge fdb delete 02:42:0a:00:00:05 dev \"vxlan0\"".to_string(),
        ]
    );
    assert_eq!(report.outcome.attempted, 2);
    assert_eq!(report.outcome.applied, 2);
    assert!(report.outcome.warnings.is_empty());
    // one scope for the read, one for the plan
    assert_eq!(namespaces.entered(), 2);
    assert_eq!(namespaces.live(), 0);
}

#[tokio::test]
async fn test_consistent_table_skips_mutation_scope() {
    let dir = netns_dir();
    let bridge = Arc::new(FakeBridge::new(
        "02:42:0a:00:00:04 dev vxlan0 dst 192.168.1.11 self permanent\n",
    ));
    let namespaces = Arc::new(CountingNamespaces::default());
    let fixer = VxlanFixer::new(
        resolve(dir.path()).await,
        Arc::new(canonical()),
        bridge.clone(),
        namespaces.clone(),
    );

    let report = fixer.run(false).await.unwrap();

    assert!(report.plan.is_empty());
    assert_eq!(bridge.commands().len(), 1);
    assert_eq!(namespaces.entered(), 1);
    assert_eq!(
        report.to_string(),
        "--- Messy entries ---\nNothing to replace\nNothing to delete\n"
    );
}

#[tokio::test]
async fn test_snapshots_are_cached() {
    let dir = netns_dir();
    let directory = Arc::new(canonical());
    let bridge = Arc::new(FakeBridge::new(FDB_SHOW));
    let fixer = VxlanFixer::new(
        resolve(dir.path()).await,
        directory.clone(),
        bridge.clone(),
        Arc::new(CountingNamespaces::default()),
    );

    let first = fixer.find_messy_entries().await.unwrap();
    let second = fixer.find_messy_entries().await.unwrap();

    assert_eq!(first, second);
    assert_eq!(directory.calls.load(Ordering::SeqCst), 1);
    assert_eq!(bridge.commands().len(), 1);
}

#[tokio::test]
async fn test_directory_failure_aborts_before_mutation() {
    let dir = netns_dir();
    let bridge = Arc::new(FakeBridge::new(FDB_SHOW));
    let fixer = VxlanFixer::new(
        resolve(dir.path()).await,
        Arc::new(StaticDirectory::unavailable()),
        bridge.clone(),
        Arc::new(CountingNamespaces::default()),
    );

    let err = fixer.run(false).await.unwrap_err();
    assert!(matches!(err, FixerError::DirectoryUnavailable(_)));
    assert!(bridge.mutations().is_empty());
}

#[tokio::test]
async fn test_vanished_namespace_is_fatal() {
    let dir = netns_dir();
    let mut context = resolve(dir.path()).await;
    context.netns = PathBuf::from("/nonexistent/netns/1-4f1d8c2e9a");

    let fixer = VxlanFixer::new(
        context,
        Arc::new(canonical()),
        Arc::new(FakeBridge::new(FDB_SHOW)),
        Arc::new(CountingNamespaces::default()),
    );

    let err = fixer.run(false).await.unwrap_err();
    assert!(matches!(err, FixerError::NamespaceEntry(_)));
}
