//! Error types for shell and namespace operations.
//!
//! All errors implement `std::error::Error` via `thiserror`.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for common operations.
pub type CommonResult<T> = Result<T, CommonError>;

/// Errors raised by the shell and netns plumbing.
#[derive(Debug, Error)]
pub enum CommonError {
    /// Failed to execute a shell command (spawn error).
    #[error("Failed to execute shell command '{command}': {source}")]
    ShellExec {
        /// The command that failed to execute.
        command: String,
        /// The underlying IO error.
        #[source]
        source: io::Error,
    },

    /// Shell command returned non-zero exit code.
    #[error("Shell command failed: '{command}' (exit code {exit_code}): {output}")]
    ShellCommandFailed {
        /// The command that failed.
        command: String,
        /// The exit code.
        exit_code: i32,
        /// Combined stdout/stderr output.
        output: String,
    },

    /// A namespace handle could not be opened.
    #[error("Cannot open network namespace {}: {source}", path.display())]
    NamespaceOpen {
        /// Path of the namespace handle.
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The kernel refused to switch into a namespace.
    #[error("Cannot enter network namespace {}: {message}", path.display())]
    NamespaceSwitch {
        /// Path of the namespace handle.
        path: PathBuf,
        /// Error message from the kernel.
        message: String,
    },
}

impl CommonError {
    /// Creates a namespace switch error.
    pub fn namespace_switch(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::NamespaceSwitch {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Returns true for failures that happened while entering a namespace.
    pub fn is_namespace_error(&self) -> bool {
        matches!(
            self,
            CommonError::NamespaceOpen { .. } | CommonError::NamespaceSwitch { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shell_command_failed() {
        let err = CommonError::ShellCommandFailed {
            command: "/sbin/bridge fdb show br0".to_string(),
            exit_code: 255,
            output: "Cannot find device \"br0\"".to_string(),
        };
        assert!(err.to_string().contains("bridge fdb show"));
        assert!(err.to_string().contains("exit code 255"));
        assert!(!err.is_namespace_error());
    }

    #[test]
    fn test_namespace_errors() {
        let err = CommonError::namespace_switch("/var/run/docker/netns/1-abc", "EPERM");
        assert_eq!(
            err.to_string(),
            "Cannot enter network namespace /var/run/docker/netns/1-abc: EPERM"
        );
        assert!(err.is_namespace_error());

        let err = CommonError::NamespaceOpen {
            path: PathBuf::from("/nonexistent"),
            source: io::Error::from(io::ErrorKind::NotFound),
        };
        assert!(err.is_namespace_error());
    }
}
