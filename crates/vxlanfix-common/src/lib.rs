//! Plumbing shared by the VXLAN forwarding-table reconciler.
//!
//! - [`shell`]: shell command execution with proper quoting, and the
//!   [`CommandRunner`] seam used to substitute a recorder in tests
//! - [`netns`]: scoped network namespace entry ([`NetnsGuard`]) and the
//!   [`NamespaceEntry`] seam
//! - [`error`]: error types for the above
//!
//! # Example
//!
//! ```ignore
//! use vxlanfix_common::{netns::NetnsGuard, shell::{self, BRIDGE_CMD, shellquote}};
//!
//! async fn show_fdb(handle: &std::path::Path, bridge: &str) -> CommonResult<String> {
//!     let _scope = NetnsGuard::enter(handle)?;
//!     shell::exec_or_throw(&format!("{} fdb show {}", BRIDGE_CMD, shellquote(bridge))).await
//! }
//! ```

pub mod error;
pub mod netns;
pub mod shell;

pub use error::{CommonError, CommonResult};
pub use netns::{NamespaceEntry, NamespaceScope, NetnsGuard, SetnsEntry};
pub use shell::{CommandRunner, ExecResult, ShellRunner};
