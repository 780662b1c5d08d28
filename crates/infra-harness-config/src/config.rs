// crates/infra-harness-config/src/config.rs
// ============================================================================
// Module: Suite Configuration
// Description: Configuration loading and validation for infra-harness.toml.
// Purpose: Turn a suite file into validated module specs and run settings.
// Dependencies: infra-harness-core, infra-harness-terraform, serde, toml
// ============================================================================

//! ## Overview
//! A suite file has four sections: `[run]`, `[timeouts]`, `[terraform]`, and
//! one `[[modules]]` table per module under test. Module sources, the work
//! root, and report paths are resolved relative to the directory holding the
//! suite file, so a suite runs the same from any working directory.
//!
//! Security posture: suite files are untrusted input; size, encoding, and
//! path lengths are bounded before parsing.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::num::NonZeroUsize;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use infra_harness_core::CoordinatorConfig;
use infra_harness_core::Expectation;
use infra_harness_core::ExpectationSet;
use infra_harness_core::FileAuditSink;
use infra_harness_core::LifecycleAuditSink;
use infra_harness_core::LifecycleTimeouts;
use infra_harness_core::ModuleDefinitionRef;
use infra_harness_core::ModuleName;
use infra_harness_core::ModuleSpec;
use infra_harness_core::NoopAuditSink;
use infra_harness_core::ParameterSet;
use infra_harness_core::RunId;
use infra_harness_core::StderrAuditSink;
use infra_harness_terraform::DEFAULT_RETRYABLE_ERRORS;
use infra_harness_terraform::TerraformOptions;
use serde::Deserialize;
use thiserror::Error;

use crate::env::EnvOverrides;
use crate::env::HarnessEnv;

// ============================================================================
// SECTION: Limits and Defaults
// ============================================================================

/// Default config file name.
pub const DEFAULT_CONFIG_NAME: &str = "infra-harness.toml";
/// Maximum size of a suite file in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum length of a path string.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum number of modules in one suite.
pub(crate) const MAX_MODULES: usize = 256;
/// Maximum number of expectations per module.
pub(crate) const MAX_EXPECTATIONS: usize = 128;
/// Upper bound for any timeout, in seconds (one day).
pub(crate) const MAX_TIMEOUT_SECONDS: u64 = 86_400;
/// Upper bound for destroy attempts.
pub(crate) const MAX_DESTROY_ATTEMPTS: u32 = 20;
/// Upper bound for terraform retries.
pub(crate) const MAX_TERRAFORM_RETRIES: u32 = 20;

/// Default provisioning timeout in seconds.
const DEFAULT_PROVISION_SECONDS: u64 = 1800;
/// Default destroy timeout in seconds.
const DEFAULT_DESTROY_SECONDS: u64 = 1800;
/// Default output read timeout in seconds.
const DEFAULT_OUTPUT_SECONDS: u64 = 60;
/// Default destroy attempts.
const DEFAULT_DESTROY_ATTEMPTS: u32 = 3;
/// Default pause between destroy attempts in seconds.
const DEFAULT_DESTROY_BACKOFF_SECONDS: u64 = 10;
/// Default terraform retries.
const DEFAULT_TERRAFORM_RETRIES: u32 = 3;
/// Default pause between terraform retries in seconds.
const DEFAULT_TERRAFORM_BACKOFF_SECONDS: u64 = 5;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading or validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Suite Config
// ============================================================================

/// A validated suite file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SuiteConfig {
    /// Run-wide settings.
    #[serde(default)]
    pub run: RunConfig,
    /// Lifecycle timeouts.
    #[serde(default)]
    pub timeouts: TimeoutsConfig,
    /// Terraform engine settings.
    #[serde(default)]
    pub terraform: TerraformConfig,
    /// Modules under test.
    #[serde(default)]
    pub modules: Vec<ModuleConfig>,
    /// Directory relative paths resolve against (not serialized).
    #[serde(skip)]
    pub base_dir: PathBuf,
}

impl SuiteConfig {
    /// Loads a suite from disk using the default resolution rules.
    ///
    /// Resolution order: explicit path, then `INFRA_HARNESS_CONFIG`, then
    /// `infra-harness.toml` in the working directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        let base_dir = resolved
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
        Self::from_toml_str(content, &base_dir)
    }

    /// Parses and validates a suite from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn from_toml_str(content: &str, base_dir: &Path) -> Result<Self, ConfigError> {
        let mut config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.base_dir = base_dir.to_path_buf();
        config.validate()?;
        Ok(config)
    }

    /// Validates the suite for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when any section is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.run.validate()?;
        self.timeouts.validate()?;
        self.terraform.validate()?;
        if self.modules.is_empty() {
            return Err(ConfigError::Invalid("suite must declare at least one module".to_string()));
        }
        if self.modules.len() > MAX_MODULES {
            return Err(ConfigError::Invalid(format!(
                "suite declares more than {MAX_MODULES} modules"
            )));
        }
        let mut names = BTreeSet::new();
        for module in &self.modules {
            module.validate()?;
            if !names.insert(module.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate module name `{}`",
                    module.name
                )));
            }
        }
        Ok(())
    }

    /// Applies environment overrides on top of the file values.
    ///
    /// A timeout override raises the provision and destroy timeouts to at
    /// least the given value; it never shortens them.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when an override is invalid.
    pub fn apply_overrides(&mut self, overrides: &EnvOverrides) -> Result<(), ConfigError> {
        if let Some(run_id) = &overrides.run_id {
            RunId::parse(run_id.as_str()).map_err(|err| {
                ConfigError::Invalid(format!("{}: {err}", HarnessEnv::RunId.as_str()))
            })?;
            self.run.run_id = Some(run_id.clone());
        }
        if let Some(timeout) = overrides.timeout {
            let seconds = timeout.as_secs();
            self.timeouts.provision_seconds = self.timeouts.provision_seconds.max(seconds);
            self.timeouts.destroy_seconds = self.timeouts.destroy_seconds.max(seconds);
        }
        self.validate()
    }

    /// Returns the configured run id, or generates one.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the configured run id is malformed.
    pub fn run_id(&self) -> Result<RunId, ConfigError> {
        self.run.run_id.as_ref().map_or_else(
            || Ok(RunId::generate()),
            |value| {
                RunId::parse(value.as_str())
                    .map_err(|err| ConfigError::Invalid(format!("run.run_id: {err}")))
            },
        )
    }

    /// Converts every module table into a core module spec.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a module name is malformed.
    pub fn module_specs(&self) -> Result<Vec<ModuleSpec>, ConfigError> {
        self.modules
            .iter()
            .map(|module| {
                let name = module.module_name()?;
                let test = Arc::new(ExpectationSet::new(module.expect.clone()));
                let spec = ModuleSpec::new(name, self.definition_for(module), test)
                    .with_parameters(module.vars.clone());
                Ok(module.isolate.iter().fold(spec, |spec, key| spec.isolate(key.as_str())))
            })
            .collect()
    }

    /// Resolves a module source against the suite directory.
    #[must_use]
    pub fn definition_for(&self, module: &ModuleConfig) -> ModuleDefinitionRef {
        ModuleDefinitionRef::from(self.resolve(&module.source))
    }

    /// Lifecycle timeouts for every module.
    #[must_use]
    pub fn lifecycle_timeouts(&self) -> LifecycleTimeouts {
        self.timeouts.to_lifecycle()
    }

    /// Coordinator settings for a run.
    #[must_use]
    pub fn coordinator_config(&self, run_id: RunId) -> CoordinatorConfig {
        CoordinatorConfig {
            run_id,
            max_parallel: self.run.max_parallel.and_then(NonZeroUsize::new),
            timeouts: self.lifecycle_timeouts(),
        }
    }

    /// Terraform engine options with paths resolved.
    #[must_use]
    pub fn terraform_options(&self) -> TerraformOptions {
        self.terraform.to_options(&self.base_dir)
    }

    /// Directory receiving the run report.
    #[must_use]
    pub fn report_dir(&self) -> PathBuf {
        self.resolve(&self.run.report_dir)
    }

    /// Opens the configured audit sink.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] when the audit file cannot be opened.
    pub fn audit_sink(&self) -> Result<Arc<dyn LifecycleAuditSink>, ConfigError> {
        match &self.run.audit {
            AuditSinkConfig::Stderr => Ok(Arc::new(StderrAuditSink)),
            AuditSinkConfig::Off => Ok(Arc::new(NoopAuditSink)),
            AuditSinkConfig::File {
                path,
            } => {
                let path = self.resolve(path);
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent).map_err(|err| ConfigError::Io(err.to_string()))?;
                }
                let sink = FileAuditSink::new(&path)
                    .map_err(|err| ConfigError::Io(format!("{}: {err}", path.display())))?;
                Ok(Arc::new(sink))
            }
        }
    }

    /// Resolves a path string against the suite directory.
    fn resolve(&self, value: &str) -> PathBuf {
        resolve_against(&self.base_dir, value)
    }
}

// ============================================================================
// SECTION: Run Config
// ============================================================================

/// Run-wide settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    /// Fixed run id; generated per run when unset.
    #[serde(default)]
    pub run_id: Option<String>,
    /// Maximum concurrently running modules; unbounded when unset.
    #[serde(default)]
    pub max_parallel: Option<usize>,
    /// Audit sink selection.
    #[serde(default)]
    pub audit: AuditSinkConfig,
    /// Report output directory.
    #[serde(default = "default_report_dir")]
    pub report_dir: String,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            run_id: None,
            max_parallel: None,
            audit: AuditSinkConfig::default(),
            report_dir: default_report_dir(),
        }
    }
}

impl RunConfig {
    /// Validates run settings.
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(run_id) = &self.run_id {
            RunId::parse(run_id.as_str())
                .map_err(|err| ConfigError::Invalid(format!("run.run_id: {err}")))?;
        }
        if self.max_parallel == Some(0) {
            return Err(ConfigError::Invalid(
                "run.max_parallel must be greater than zero".to_string(),
            ));
        }
        validate_path_string("run.report_dir", &self.report_dir)?;
        if let AuditSinkConfig::File {
            path,
        } = &self.audit
        {
            validate_path_string("run.audit.path", path)?;
        }
        Ok(())
    }
}

/// Where lifecycle audit events go.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(tag = "sink", rename_all = "snake_case")]
pub enum AuditSinkConfig {
    /// JSON lines on stderr.
    #[default]
    Stderr,
    /// JSON lines appended to a file.
    File {
        /// File path, relative to the suite directory.
        path: String,
    },
    /// Audit disabled.
    Off,
}

// ============================================================================
// SECTION: Timeouts
// ============================================================================

/// Lifecycle timeouts in seconds.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TimeoutsConfig {
    /// Bound on init-and-apply.
    #[serde(default = "default_provision_seconds")]
    pub provision_seconds: u64,
    /// Bound on each destroy attempt.
    #[serde(default = "default_destroy_seconds")]
    pub destroy_seconds: u64,
    /// Bound on each output read.
    #[serde(default = "default_output_seconds")]
    pub output_seconds: u64,
    /// Bound on the test body; unbounded when unset.
    #[serde(default)]
    pub test_seconds: Option<u64>,
    /// Destroy attempts before a module is flagged leak-suspected.
    #[serde(default = "default_destroy_attempts")]
    pub destroy_attempts: u32,
    /// Pause between destroy attempts.
    #[serde(default = "default_destroy_backoff_seconds")]
    pub retry_backoff_seconds: u64,
}

impl Default for TimeoutsConfig {
    fn default() -> Self {
        Self {
            provision_seconds: DEFAULT_PROVISION_SECONDS,
            destroy_seconds: DEFAULT_DESTROY_SECONDS,
            output_seconds: DEFAULT_OUTPUT_SECONDS,
            test_seconds: None,
            destroy_attempts: DEFAULT_DESTROY_ATTEMPTS,
            retry_backoff_seconds: DEFAULT_DESTROY_BACKOFF_SECONDS,
        }
    }
}

impl TimeoutsConfig {
    /// Validates timeout bounds.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_seconds("timeouts.provision_seconds", self.provision_seconds)?;
        validate_seconds("timeouts.destroy_seconds", self.destroy_seconds)?;
        validate_seconds("timeouts.output_seconds", self.output_seconds)?;
        if let Some(test_seconds) = self.test_seconds {
            validate_seconds("timeouts.test_seconds", test_seconds)?;
        }
        if self.destroy_attempts == 0 || self.destroy_attempts > MAX_DESTROY_ATTEMPTS {
            return Err(ConfigError::Invalid(format!(
                "timeouts.destroy_attempts must be between 1 and {MAX_DESTROY_ATTEMPTS}"
            )));
        }
        if self.retry_backoff_seconds > MAX_TIMEOUT_SECONDS {
            return Err(ConfigError::Invalid(
                "timeouts.retry_backoff_seconds exceeds max".to_string(),
            ));
        }
        Ok(())
    }

    /// Converts to core lifecycle timeouts.
    fn to_lifecycle(&self) -> LifecycleTimeouts {
        LifecycleTimeouts {
            provision: Duration::from_secs(self.provision_seconds),
            destroy: Duration::from_secs(self.destroy_seconds),
            output: Duration::from_secs(self.output_seconds),
            test_body: self.test_seconds.map(Duration::from_secs),
            destroy_attempts: self.destroy_attempts,
            retry_backoff: Duration::from_secs(self.retry_backoff_seconds),
        }
    }
}

// ============================================================================
// SECTION: Terraform
// ============================================================================

/// Terraform engine settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TerraformConfig {
    /// Binary name (looked up on `PATH`) or path.
    #[serde(default = "default_terraform_binary")]
    pub binary: String,
    /// Per-instance workspace root.
    #[serde(default = "default_work_root")]
    pub work_root: String,
    /// Extra environment for every terraform invocation.
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    /// Retryable stderr patterns; built-in list when unset.
    #[serde(default)]
    pub retryable_errors: Option<Vec<String>>,
    /// Retries after a retryable failure.
    #[serde(default = "default_terraform_retries")]
    pub max_retries: u32,
    /// Pause between retries.
    #[serde(default = "default_terraform_backoff_seconds")]
    pub retry_backoff_seconds: u64,
}

impl Default for TerraformConfig {
    fn default() -> Self {
        Self {
            binary: default_terraform_binary(),
            work_root: default_work_root(),
            env: BTreeMap::new(),
            retryable_errors: None,
            max_retries: DEFAULT_TERRAFORM_RETRIES,
            retry_backoff_seconds: DEFAULT_TERRAFORM_BACKOFF_SECONDS,
        }
    }
}

impl TerraformConfig {
    /// Validates engine settings, including the retryable patterns.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_path_string("terraform.binary", &self.binary)?;
        validate_path_string("terraform.work_root", &self.work_root)?;
        if self.max_retries > MAX_TERRAFORM_RETRIES {
            return Err(ConfigError::Invalid(format!(
                "terraform.max_retries must be at most {MAX_TERRAFORM_RETRIES}"
            )));
        }
        if self.retry_backoff_seconds > MAX_TIMEOUT_SECONDS {
            return Err(ConfigError::Invalid(
                "terraform.retry_backoff_seconds exceeds max".to_string(),
            ));
        }
        if self.env.keys().any(|key| key.trim().is_empty() || key.contains('=')) {
            return Err(ConfigError::Invalid(
                "terraform.env keys must be non-empty and must not contain `=`".to_string(),
            ));
        }
        self.to_options(Path::new("."))
            .validate()
            .map_err(|err| ConfigError::Invalid(format!("terraform: {err}")))
    }

    /// Builds engine options, resolving paths against `base_dir`.
    ///
    /// A bare binary name stays as-is so it is looked up on `PATH`.
    fn to_options(&self, base_dir: &Path) -> TerraformOptions {
        let binary = if self.binary.contains(std::path::MAIN_SEPARATOR) || self.binary.contains('/')
        {
            resolve_against(base_dir, &self.binary)
        } else {
            PathBuf::from(&self.binary)
        };
        let retryable_errors = self.retryable_errors.clone().unwrap_or_else(|| {
            DEFAULT_RETRYABLE_ERRORS.iter().map(|pattern| (*pattern).to_string()).collect()
        });
        TerraformOptions {
            binary,
            work_root: resolve_against(base_dir, &self.work_root),
            env: self.env.clone(),
            retryable_errors,
            max_retries: self.max_retries,
            retry_backoff: Duration::from_secs(self.retry_backoff_seconds),
        }
    }
}

// ============================================================================
// SECTION: Modules
// ============================================================================

/// One module under test.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModuleConfig {
    /// Module name, unique within the suite.
    pub name: String,
    /// Module source directory, relative to the suite file.
    pub source: String,
    /// Variables naming externally visible resources; the run id is appended.
    #[serde(default)]
    pub isolate: Vec<String>,
    /// Variables passed to the module.
    #[serde(default)]
    pub vars: ParameterSet,
    /// Checks applied to the module outputs.
    #[serde(default)]
    pub expect: Vec<Expectation>,
}

impl ModuleConfig {
    /// Parses the module name.
    fn module_name(&self) -> Result<ModuleName, ConfigError> {
        ModuleName::parse(self.name.as_str())
            .map_err(|err| ConfigError::Invalid(format!("modules.name: {err}")))
    }

    /// Validates one module table.
    fn validate(&self) -> Result<(), ConfigError> {
        self.module_name()?;
        let name = &self.name;
        validate_path_string(&format!("modules.{name}.source"), &self.source)?;
        for key in &self.isolate {
            match self.vars.get(key) {
                None => {
                    return Err(ConfigError::Invalid(format!(
                        "modules.{name}.isolate names `{key}` but vars does not set it"
                    )));
                }
                Some(value) if value.as_str().is_none() => {
                    return Err(ConfigError::Invalid(format!(
                        "modules.{name}.isolate names `{key}` but its value is not a string"
                    )));
                }
                Some(_) => {}
            }
        }
        if self.expect.len() > MAX_EXPECTATIONS {
            return Err(ConfigError::Invalid(format!(
                "modules.{name}.expect has more than {MAX_EXPECTATIONS} entries"
            )));
        }
        for expectation in &self.expect {
            if expectation.output.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "modules.{name}.expect entries must name an output"
                )));
            }
            expectation
                .validate()
                .map_err(|err| ConfigError::Invalid(format!("modules.{name}.expect: {err}")))?;
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Default report directory.
fn default_report_dir() -> String {
    "infra-harness-report".to_string()
}

/// Default terraform binary.
fn default_terraform_binary() -> String {
    "terraform".to_string()
}

/// Default workspace root.
fn default_work_root() -> String {
    ".infra-harness/work".to_string()
}

/// Default provisioning timeout.
const fn default_provision_seconds() -> u64 {
    DEFAULT_PROVISION_SECONDS
}

/// Default destroy timeout.
const fn default_destroy_seconds() -> u64 {
    DEFAULT_DESTROY_SECONDS
}

/// Default output timeout.
const fn default_output_seconds() -> u64 {
    DEFAULT_OUTPUT_SECONDS
}

/// Default destroy attempts.
const fn default_destroy_attempts() -> u32 {
    DEFAULT_DESTROY_ATTEMPTS
}

/// Default destroy backoff.
const fn default_destroy_backoff_seconds() -> u64 {
    DEFAULT_DESTROY_BACKOFF_SECONDS
}

/// Default terraform retries.
const fn default_terraform_retries() -> u32 {
    DEFAULT_TERRAFORM_RETRIES
}

/// Default terraform backoff.
const fn default_terraform_backoff_seconds() -> u64 {
    DEFAULT_TERRAFORM_BACKOFF_SECONDS
}

/// Resolves the config path using explicit, env, and default sources.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(HarnessEnv::Config.as_str()) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved path against length limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    let path = Path::new(trimmed);
    for component in path.components() {
        let component_value = component.as_os_str().to_string_lossy();
        if component_value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

/// Validates a positive, bounded number of seconds.
fn validate_seconds(field: &str, value: u64) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::Invalid(format!("{field} must be greater than zero")));
    }
    if value > MAX_TIMEOUT_SECONDS {
        return Err(ConfigError::Invalid(format!("{field} exceeds max of {MAX_TIMEOUT_SECONDS}")));
    }
    Ok(())
}

/// Joins a relative path onto `base_dir`; absolute paths are kept.
fn resolve_against(base_dir: &Path, value: &str) -> PathBuf {
    let path = Path::new(value.trim());
    if path.is_absolute() { path.to_path_buf() } else { base_dir.join(path) }
}
