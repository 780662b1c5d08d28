// crates/infra-harness-terraform/src/command.rs
// ============================================================================
// Module: Terraform Command Runner
// Description: Builds and executes terraform CLI invocations.
// Purpose: Run one subcommand non-interactively and capture its output.
// Dependencies: infra-harness-core, thiserror, tokio
// ============================================================================

//! ## Overview
//! Every invocation runs with `-chdir` pointing at the module definition,
//! stdin closed, and automation environment flags set. Children are killed
//! when their future is dropped, so an outer timeout never leaves a stray
//! terraform process behind.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::Path;
use std::process::Stdio;

use infra_harness_core::EngineError;
use thiserror::Error;
use tokio::process::Command;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Maximum bytes of stderr kept in an error message.
const MAX_STDERR_TAIL: usize = 4 * 1024;

/// Terraform engine errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TerraformError {
    /// The binary could not be started.
    #[error("failed to launch `{binary}`: {message}")]
    Launch {
        /// Binary path.
        binary: String,
        /// OS error text.
        message: String,
    },
    /// A subcommand exited unsuccessfully.
    #[error("terraform {subcommand} failed ({status}): {stderr}")]
    Failed {
        /// Subcommand name.
        subcommand: String,
        /// Exit status description.
        status: String,
        /// Tail of stderr.
        stderr: String,
    },
    /// Workspace files could not be written or read.
    #[error("terraform workspace io error: {0}")]
    Io(String),
    /// `terraform output -json` produced something unexpected.
    #[error("unreadable terraform outputs: {0}")]
    Output(String),
    /// An apply was cut off before terraform wrote any state.
    #[error(
        "apply for {instance} was interrupted before terraform wrote state; resources may exist"
    )]
    Interrupted {
        /// Instance whose apply never returned.
        instance: String,
    },
    /// A retryable error pattern does not compile.
    #[error("invalid retryable error pattern `{pattern}`: {reason}")]
    InvalidPattern {
        /// Pattern text.
        pattern: String,
        /// Compile error text.
        reason: String,
    },
}

impl From<TerraformError> for EngineError {
    fn from(err: TerraformError) -> Self {
        match err {
            TerraformError::Io(message) => Self::Io(message),
            TerraformError::InvalidPattern {
                ..
            } => Self::Rejected(err.to_string()),
            other => Self::Backend(other.to_string()),
        }
    }
}

// ============================================================================
// SECTION: Commands
// ============================================================================

/// One terraform subcommand with its arguments.
#[derive(Debug, Clone)]
pub(crate) struct TerraformCommand {
    /// Subcommand name (`init`, `apply`, ...).
    subcommand: &'static str,
    /// Arguments after the subcommand.
    args: Vec<OsString>,
}

impl TerraformCommand {
    /// Starts a subcommand with the non-interactive flags every call uses.
    pub(crate) fn new(subcommand: &'static str) -> Self {
        Self {
            subcommand,
            args: vec![OsString::from("-no-color")],
        }
    }

    /// Appends a literal argument.
    pub(crate) fn arg(mut self, arg: &str) -> Self {
        self.args.push(OsString::from(arg));
        self
    }

    /// Appends `<flag>=<path>`.
    pub(crate) fn path_flag(mut self, flag: &str, path: &Path) -> Self {
        let mut value = OsString::from(flag);
        value.push("=");
        value.push(path.as_os_str());
        self.args.push(value);
        self
    }

    /// Returns the subcommand name.
    pub(crate) const fn subcommand(&self) -> &'static str {
        self.subcommand
    }

    /// Builds the full argument list for a definition directory.
    fn argv(&self, definition: &Path) -> Vec<OsString> {
        let mut chdir = OsString::from("-chdir=");
        chdir.push(definition.as_os_str());
        let mut argv = Vec::with_capacity(self.args.len() + 2);
        argv.push(chdir);
        argv.push(OsString::from(self.subcommand));
        argv.extend(self.args.iter().cloned());
        argv
    }
}

/// Captured output of a successful invocation.
#[derive(Debug, Clone)]
pub(crate) struct CommandOutput {
    /// Standard output.
    pub(crate) stdout: String,
}

/// Runs a command and returns its stdout, or a [`TerraformError::Failed`].
pub(crate) async fn execute(
    binary: &Path,
    definition: &Path,
    env: &BTreeMap<String, String>,
    command: &TerraformCommand,
) -> Result<CommandOutput, TerraformError> {
    let output = Command::new(binary)
        .args(command.argv(definition))
        .envs(env)
        .env("TF_IN_AUTOMATION", "1")
        .env("TF_INPUT", "0")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|err| TerraformError::Launch {
            binary: binary.display().to_string(),
            message: err.to_string(),
        })?;
    if !output.status.success() {
        return Err(TerraformError::Failed {
            subcommand: command.subcommand().to_string(),
            status: output.status.to_string(),
            stderr: stderr_tail(&output.stderr),
        });
    }
    Ok(CommandOutput {
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
    })
}

/// Keeps the trimmed tail of stderr, cut on a character boundary.
fn stderr_tail(raw: &[u8]) -> String {
    let text = String::from_utf8_lossy(raw);
    let text = text.trim();
    if text.len() <= MAX_STDERR_TAIL {
        return text.to_string();
    }
    let mut start = text.len() - MAX_STDERR_TAIL;
    while !text.is_char_boundary(start) {
        start += 1;
    }
    format!("...{}", &text[start ..])
}

// ============================================================================
// SECTION: Tests
// ============================================================================
