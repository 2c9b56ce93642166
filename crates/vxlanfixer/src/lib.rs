//! vxlanfixer - repairs the forwarding table of a Docker overlay network
//!
//! Improper container start/stop can leave the VXLAN device's forwarding
//! table pointing hardware addresses at the wrong host, or keep entries for
//! containers that no longer exist. vxlanfixer compares the table with the
//! endpoint records Docker keeps in Consul and, in one pass, redirects
//! mismatched entries and deletes orphaned ones.

pub mod commands;
pub mod config;
pub mod directory;
pub mod error;
pub mod fdb;
pub mod fixer;
pub mod namespace;
pub mod platform;
pub mod reconcile;
pub mod report;

pub use config::FixerConfig;
pub use directory::{ConsulDirectory, EndpointDirectory};
pub use error::{FixerError, Result};
pub use fdb::{ApplyResult, FdbTable, MutationKind, MutationWarning};
pub use fixer::{VxlanContext, VxlanFixer};
pub use namespace::{DockerOverlayConvention, NamespaceLocator, NamespaceMatcher};
pub use platform::{DockerClient, NetworkInfo, NetworkLookup};
pub use reconcile::{compute_plan, Deletion, Plan, Replacement};
pub use report::{render_endpoints, Report};
