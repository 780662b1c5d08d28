// crates/infra-harness-terraform/src/engine.rs
// ============================================================================
// Module: Terraform Engine
// Description: ProvisioningEngine implementation over the terraform CLI.
// Purpose: Init, apply, read outputs, and destroy one instance at a time.
// Dependencies: async-trait, infra-harness-core, regex, tokio
// ============================================================================

//! ## Overview
//! Each call resolves the instance workspace, refreshes its variable file,
//! and runs the matching terraform subcommands against the module source
//! directory. `init` and `apply` are retried when stderr matches one of the
//! configured transient error patterns. Destroying an instance that never
//! wrote state is a successful no-op, unless an apply was started and never
//! returned: terraform may have created resources before being killed, so
//! that destroy fails instead.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use infra_harness_core::EngineError;
use infra_harness_core::ModuleTarget;
use infra_harness_core::ProvisioningEngine;
use regex::Regex;

use crate::command::CommandOutput;
use crate::command::TerraformCommand;
use crate::command::TerraformError;
use crate::command::execute;
use crate::outputs::parse_outputs;
use crate::workspace::InstanceWorkspace;

// ============================================================================
// SECTION: Options
// ============================================================================

/// Transient terraform errors worth another attempt.
pub const DEFAULT_RETRYABLE_ERRORS: &[&str] = &[
    "(?i)connection reset by peer",
    "(?i)TLS handshake timeout",
    "Error installing provider",
    "Failed to query available provider packages",
    "could not query provider registry for",
    "timeout while waiting for plugin to start",
    "timed out waiting for server handshake",
    "Provider produced inconsistent result after apply",
    "RequestError: send request failed",
];

/// Terraform engine settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerraformOptions {
    /// Terraform binary name or path.
    pub binary: PathBuf,
    /// Directory holding one workspace per instance.
    pub work_root: PathBuf,
    /// Extra environment passed to every invocation.
    pub env: BTreeMap<String, String>,
    /// Regex patterns matched against stderr of failed `init`/`apply` runs.
    pub retryable_errors: Vec<String>,
    /// Retries after the first failed attempt.
    pub max_retries: u32,
    /// Pause between retries.
    pub retry_backoff: Duration,
}

impl Default for TerraformOptions {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("terraform"),
            work_root: PathBuf::from(".infra-harness/work"),
            env: BTreeMap::new(),
            retryable_errors: DEFAULT_RETRYABLE_ERRORS
                .iter()
                .map(|pattern| (*pattern).to_string())
                .collect(),
            max_retries: 3,
            retry_backoff: Duration::from_secs(5),
        }
    }
}

impl TerraformOptions {
    /// Checks the options and compiles the retryable patterns.
    ///
    /// # Errors
    ///
    /// Returns [`TerraformError::InvalidPattern`] for a pattern that does
    /// not compile and [`TerraformError::Io`] for empty paths.
    pub fn validate(&self) -> Result<(), TerraformError> {
        self.compile_patterns().map(|_| ())
    }

    /// Compiles every retryable pattern.
    fn compile_patterns(&self) -> Result<Vec<Regex>, TerraformError> {
        if self.binary.as_os_str().is_empty() {
            return Err(TerraformError::Io("terraform binary must be set".to_string()));
        }
        if self.work_root.as_os_str().is_empty() {
            return Err(TerraformError::Io("terraform work root must be set".to_string()));
        }
        self.retryable_errors
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|err| TerraformError::InvalidPattern {
                    pattern: pattern.clone(),
                    reason: err.to_string(),
                })
            })
            .collect()
    }
}

// ============================================================================
// SECTION: Engine
// ============================================================================

/// Provisioning engine that shells out to terraform.
#[derive(Debug)]
pub struct TerraformEngine {
    /// Options as configured.
    options: TerraformOptions,
    /// Absolute work root.
    work_root: PathBuf,
    /// Compiled retryable patterns.
    retryable: Vec<Regex>,
}

impl TerraformEngine {
    /// Creates an engine, resolving the work root to an absolute path.
    ///
    /// # Errors
    ///
    /// Returns [`TerraformError`] when the options are invalid or the work
    /// root cannot be resolved.
    pub fn new(options: TerraformOptions) -> Result<Self, TerraformError> {
        let retryable = options.compile_patterns()?;
        let work_root = std::path::absolute(&options.work_root)
            .map_err(|err| TerraformError::Io(format!("{}: {err}", options.work_root.display())))?;
        Ok(Self {
            options,
            work_root,
            retryable,
        })
    }

    /// Returns the options.
    #[must_use]
    pub const fn options(&self) -> &TerraformOptions {
        &self.options
    }

    /// Returns the absolute work root.
    #[must_use]
    pub fn work_root(&self) -> &Path {
        &self.work_root
    }

    /// Workspace of one target.
    fn workspace(&self, target: &ModuleTarget) -> InstanceWorkspace {
        InstanceWorkspace::new(&self.work_root, &target.instance)
    }

    /// Environment for commands run in a workspace.
    fn env_for(&self, workspace: &InstanceWorkspace) -> BTreeMap<String, String> {
        let mut env = self.options.env.clone();
        env.insert("TF_DATA_DIR".to_string(), workspace.data_dir().display().to_string());
        env
    }

    /// Returns true when a failure matches a retryable pattern.
    fn is_retryable(&self, err: &TerraformError) -> bool {
        match err {
            TerraformError::Failed {
                stderr, ..
            } => self.retryable.iter().any(|pattern| pattern.is_match(stderr)),
            _ => false,
        }
    }

    /// Runs a command, retrying transient failures.
    async fn run_retrying(
        &self,
        definition: &Path,
        env: &BTreeMap<String, String>,
        command: &TerraformCommand,
    ) -> Result<CommandOutput, TerraformError> {
        let mut retries = 0;
        loop {
            match execute(&self.options.binary, definition, env, command).await {
                Err(err) if retries < self.options.max_retries && self.is_retryable(&err) => {
                    retries += 1;
                    tokio::time::sleep(self.options.retry_backoff).await;
                }
                result => return result,
            }
        }
    }

    /// Runs `terraform init` for a workspace.
    async fn init(
        &self,
        definition: &Path,
        env: &BTreeMap<String, String>,
    ) -> Result<(), TerraformError> {
        let command = TerraformCommand::new("init").arg("-input=false");
        self.run_retrying(definition, env, &command).await.map(|_| ())
    }
}

#[async_trait]
impl ProvisioningEngine for TerraformEngine {
    fn name(&self) -> &str {
        "terraform"
    }

    async fn init_and_apply(&self, target: &ModuleTarget) -> Result<(), EngineError> {
        let workspace = self.workspace(target);
        workspace.prepare(&target.parameters).await?;
        let definition = target.definition.as_path();
        let env = self.env_for(&workspace);
        self.init(definition, &env).await?;
        let apply = TerraformCommand::new("apply")
            .arg("-input=false")
            .arg("-auto-approve")
            .path_flag("-state", &workspace.state_path())
            .path_flag("-var-file", &workspace.var_file());
        workspace.mark_apply_started().await?;
        let applied = self.run_retrying(definition, &env, &apply).await;
        workspace.clear_apply_marker().await?;
        applied?;
        Ok(())
    }

    async fn output(&self, target: &ModuleTarget, name: &str) -> Result<String, EngineError> {
        let workspace = self.workspace(target);
        if !workspace.has_state().await? {
            return Err(EngineError::OutputNotFound {
                name: name.to_string(),
            });
        }
        let command = TerraformCommand::new("output")
            .arg("-json")
            .path_flag("-state", &workspace.state_path());
        let output = execute(
            &self.options.binary,
            target.definition.as_path(),
            &self.env_for(&workspace),
            &command,
        )
        .await?;
        parse_outputs(&output.stdout)?.remove(name).ok_or_else(|| EngineError::OutputNotFound {
            name: name.to_string(),
        })
    }

    async fn destroy(&self, target: &ModuleTarget) -> Result<(), EngineError> {
        let workspace = self.workspace(target);
        if !workspace.has_state().await? {
            if workspace.apply_interrupted().await? {
                return Err(TerraformError::Interrupted {
                    instance: target.instance.to_string(),
                }
                .into());
            }
            return Ok(());
        }
        workspace.prepare(&target.parameters).await?;
        let definition = target.definition.as_path();
        let env = self.env_for(&workspace);
        if !workspace.is_initialized().await {
            self.init(definition, &env).await?;
        }
        let destroy = TerraformCommand::new("destroy")
            .arg("-input=false")
            .arg("-auto-approve")
            .path_flag("-state", &workspace.state_path())
            .path_flag("-var-file", &workspace.var_file());
        self.run_retrying(definition, &env, &destroy).await?;
        workspace.clear_apply_marker().await?;
        Ok(())
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
