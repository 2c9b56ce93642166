//! Scoped network namespace entry.
//!
//! Network namespaces are per-thread kernel state. [`NetnsGuard`] records
//! the calling thread's namespace, switches into the target, and switches
//! back when dropped, including on early return and unwind. Callers must
//! not move the scope to another thread; the tool runs on a current-thread
//! runtime.

use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, error};

use crate::error::{CommonError, CommonResult};

/// Handle to the calling thread's current network namespace.
pub const CURRENT_NETNS: &str = "/proc/thread-self/ns/net";

/// Open namespace scope. Dropping it leaves the namespace.
pub type NamespaceScope = Box<dyn Send>;

/// Enters network namespaces on behalf of the FDB reader and mutator.
pub trait NamespaceEntry: Send + Sync {
    /// Switches into the namespace behind `handle` until the returned scope is dropped.
    fn enter(&self, handle: &Path) -> CommonResult<NamespaceScope>;
}

/// [`NamespaceEntry`] backed by `setns(2)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SetnsEntry;

impl NamespaceEntry for SetnsEntry {
    fn enter(&self, handle: &Path) -> CommonResult<NamespaceScope> {
        Ok(Box::new(NetnsGuard::enter(handle)?))
    }
}

/// Restores the original network namespace on drop.
#[derive(Debug)]
pub struct NetnsGuard {
    original: File,
    target: PathBuf,
}

impl NetnsGuard {
    /// Switches the calling thread into the namespace at `target`.
    pub fn enter(target: impl AsRef<Path>) -> CommonResult<Self> {
        let target = target.as_ref();
        let original = open_handle(Path::new(CURRENT_NETNS))?;
        let handle = open_handle(target)?;

        switch_to(&handle).map_err(|message| CommonError::namespace_switch(target, message))?;
        debug!(netns = %target.display(), "Entered network namespace");

        Ok(Self {
            original,
            target: target.to_path_buf(),
        })
    }
}

impl Drop for NetnsGuard {
    fn drop(&mut self) {
        match switch_to(&self.original) {
            Ok(()) => debug!(netns = %self.target.display(), "Left network namespace"),
            Err(message) => error!(
                netns = %self.target.display(),
                error = %message,
                "Failed to restore original network namespace"
            ),
        }
    }
}

fn open_handle(path: &Path) -> CommonResult<File> {
    File::open(path).map_err(|source| CommonError::NamespaceOpen {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(target_os = "linux")]
fn switch_to(handle: &File) -> Result<(), String> {
    use nix::sched::{setns, CloneFlags};

    setns(handle, CloneFlags::CLONE_NEWNET).map_err(|errno| errno.to_string())
}

#[cfg(not(target_os = "linux"))]
fn switch_to(_handle: &File) -> Result<(), String> {
    Err("network namespaces are only supported on Linux".to_string())
}
