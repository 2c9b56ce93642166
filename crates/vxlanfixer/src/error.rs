//! Error types for vxlanfixer
//!
//! Every variant here is fatal to the run. Per-mutation problems are not
//! errors; they are reported as [`MutationWarning`](crate::fdb::MutationWarning)s.

use std::path::PathBuf;
use thiserror::Error;
use vxlanfix_common::CommonError;

/// Errors that abort a reconciliation pass
#[derive(Debug, Error)]
pub enum FixerError {
    /// Missing, unreadable or invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// The container platform has no network with the configured label
    #[error("Network namespace {0} not found")]
    NetworkNotFound(String),

    /// No namespace handle belongs to the resolved network
    #[error("No netns file corresponding to {network} in {}", dir.display())]
    NamespaceNotFound { network: String, dir: PathBuf },

    /// The endpoint directory could not be queried or returned garbage
    #[error("Directory unavailable: {0}")]
    DirectoryUnavailable(String),

    /// The container platform API could not be queried
    #[error("Platform API error: {0}")]
    Platform(String),

    /// The target namespace could not be entered
    #[error("Namespace entry failed: {0}")]
    NamespaceEntry(#[source] CommonError),

    /// The forwarding-table query failed
    #[error("Command execution failed: {0}")]
    CommandExecution(#[source] CommonError),
}

impl FixerError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates a directory error.
    pub fn directory(message: impl Into<String>) -> Self {
        Self::DirectoryUnavailable(message.into())
    }

    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        1
    }
}

impl From<CommonError> for FixerError {
    fn from(err: CommonError) -> Self {
        if err.is_namespace_error() {
            FixerError::NamespaceEntry(err)
        } else {
            FixerError::CommandExecution(err)
        }
    }
}

/// Result type alias for vxlanfixer operations
pub type Result<T> = std::result::Result<T, FixerError>;
