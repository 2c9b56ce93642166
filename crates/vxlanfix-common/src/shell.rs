//! Shell command execution utilities.
//!
//! Commands are run through `/bin/sh -c`, so every argument that comes from
//! outside the process (hardware addresses, device names, locators) must go
//! through [`shellquote`].
//!
//! # Example
//!
//! ```ignore
//! use vxlanfix_common::shell::{self, BRIDGE_CMD, shellquote};
//!
//! let cmd = format!("{} fdb show {}", BRIDGE_CMD, shellquote("br0"));
//! let table = shell::exec_or_throw(&cmd).await?;
//! ```

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::process::Stdio;
use tokio::process::Command;

use crate::error::{CommonError, CommonResult};

/// Path to the `bridge` command for forwarding-table inspection and mutation.
pub const BRIDGE_CMD: &str = "/sbin/bridge";

/// Regex for characters that need escaping in shell double-quotes.
/// Matches: $, `, ", \, and newline
static SHELL_ESCAPE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"([$`"\\\n])"#).expect("Invalid regex pattern"));

/// Quotes a string for safe use in shell commands.
///
/// The string is wrapped in double quotes and `$`, `` ` ``, `"`, `\` and
/// newline are backslash-escaped.
///
/// # Example
///
/// ```
/// use vxlanfix_common::shell::shellquote;
///
/// assert_eq!(shellquote("vxlan0"), "\"vxlan0\"");
/// assert_eq!(shellquote("with$var"), "\"with\\$var\"");
/// ```
pub fn shellquote(s: &str) -> String {
    let escaped = SHELL_ESCAPE_RE.replace_all(s, r"\$1");
    format!("\"{}\"", escaped)
}

/// Result of a shell command execution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecResult {
    /// The exit code of the command (0 = success).
    pub exit_code: i32,
    /// Trimmed stdout output.
    pub stdout: String,
    /// Trimmed stderr output.
    pub stderr: String,
}

impl ExecResult {
    /// A successful result carrying `stdout`.
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            exit_code: 0,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// Returns true if the command succeeded (exit code 0).
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Returns the combined output (stdout + stderr) for error messages.
    pub fn combined_output(&self) -> String {
        if self.stderr.is_empty() {
            self.stdout.clone()
        } else if self.stdout.is_empty() {
            self.stderr.clone()
        } else {
            format!("{}\n{}", self.stdout, self.stderr)
        }
    }
}

/// Executes a shell command asynchronously.
///
/// Returns `Err` only when the command could not be spawned; a non-zero
/// exit is reported through [`ExecResult::exit_code`].
pub async fn exec(cmd: &str) -> CommonResult<ExecResult> {
    tracing::debug!(command = %cmd, "Executing shell command");

    let output = Command::new("/bin/sh")
        .arg("-c")
        .arg(cmd)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|e| CommonError::ShellExec {
            command: cmd.to_string(),
            source: e,
        })?;

    let exit_code = output.status.code().unwrap_or(-1);
    let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

    let result = ExecResult {
        exit_code,
        stdout,
        stderr,
    };

    if result.success() {
        tracing::trace!(command = %cmd, exit_code = exit_code, "Command succeeded");
    } else {
        tracing::warn!(
            command = %cmd,
            exit_code = exit_code,
            stderr = %result.stderr,
            "Command failed"
        );
    }

    Ok(result)
}

/// Executes a shell command and returns an error on non-zero exit.
///
/// Returns the trimmed stdout on success.
pub async fn exec_or_throw(cmd: &str) -> CommonResult<String> {
    check(cmd, exec(cmd).await?)
}

fn check(cmd: &str, result: ExecResult) -> CommonResult<String> {
    if result.success() {
        Ok(result.stdout)
    } else {
        Err(CommonError::ShellCommandFailed {
            command: cmd.to_string(),
            exit_code: result.exit_code,
            output: result.combined_output(),
        })
    }
}

/// Something that can run shell commands.
///
/// The production implementation is [`ShellRunner`]; tests substitute a
/// recorder that captures commands instead of running them.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Runs `cmd`, reporting a non-zero exit through the result.
    async fn run(&self, cmd: &str) -> CommonResult<ExecResult>;

    /// Runs `cmd` and fails on a non-zero exit.
    async fn run_or_throw(&self, cmd: &str) -> CommonResult<String> {
        let result = self.run(cmd).await?;
        check(cmd, result)
    }
}

/// Runs commands through `/bin/sh` on the calling thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShellRunner;

#[async_trait]
impl CommandRunner for ShellRunner {
    async fn run(&self, cmd: &str) -> CommonResult<ExecResult> {
        exec(cmd).await
    }
}
