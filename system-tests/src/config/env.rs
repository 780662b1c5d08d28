// system-tests/src/config/env.rs
// ============================================================================
// Module: System Test Environment
// Description: Environment-backed configuration for system tests.
// Purpose: Centralize env parsing with strict UTF-8 validation.
// Dependencies: infra-harness-config
// ============================================================================

//! ## Overview
//! Environment values are parsed with the same strict helpers the harness
//! uses for its own overrides. Invalid UTF-8 or empty values fail closed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::PathBuf;
use std::time::Duration;

use infra_harness_config::env::parse_bool_env;
use infra_harness_config::env::parse_timeout_seconds;
use infra_harness_config::env::read_env_nonempty;

// ============================================================================
// SECTION: Environment Constants
// ============================================================================

/// Environment keys for system test configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemTestEnv {
    /// Enables suites that provision real cloud resources (`true`/`false` or `1`/`0`).
    LiveEnabled,
    /// Optional run root override for artifacts.
    RunRoot,
    /// Optional suite timeout override in seconds (positive integer).
    TimeoutSeconds,
    /// Optional terraform binary for the live suite.
    TerraformBinary,
    /// Optional directory holding the terraform modules for the live suite.
    ModulesDir,
}

impl SystemTestEnv {
    /// Returns the canonical environment variable name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LiveEnabled => "INFRA_HARNESS_SYSTEM_TEST_LIVE",
            Self::RunRoot => "INFRA_HARNESS_SYSTEM_TEST_RUN_ROOT",
            Self::TimeoutSeconds => "INFRA_HARNESS_SYSTEM_TEST_TIMEOUT_SEC",
            Self::TerraformBinary => "INFRA_HARNESS_SYSTEM_TEST_TERRAFORM",
            Self::ModulesDir => "INFRA_HARNESS_SYSTEM_TEST_MODULES_DIR",
        }
    }
}

// ============================================================================
// SECTION: Config Types
// ============================================================================

/// Typed system test configuration derived from environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SystemTestConfig {
    /// Whether the live AWS suite may run.
    pub live_enabled: bool,
    /// Optional run root override.
    pub run_root: Option<PathBuf>,
    /// Optional timeout override in seconds (positive integer).
    pub timeout: Option<Duration>,
    /// Optional terraform binary override.
    pub terraform_binary: Option<PathBuf>,
    /// Optional terraform modules directory override.
    pub modules_dir: Option<PathBuf>,
}

impl SystemTestConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error when an environment value is not valid UTF-8, is empty,
    /// or fails validation (for example, an invalid timeout or boolean value).
    pub fn load() -> Result<Self, String> {
        let live_enabled = parse_bool_env(
            SystemTestEnv::LiveEnabled.as_str(),
            read_env_nonempty(SystemTestEnv::LiveEnabled.as_str())?,
        )?;
        let run_root = read_env_nonempty(SystemTestEnv::RunRoot.as_str())?.map(PathBuf::from);
        let timeout = read_env_nonempty(SystemTestEnv::TimeoutSeconds.as_str())?
            .map(|value| parse_timeout_seconds(SystemTestEnv::TimeoutSeconds.as_str(), &value))
            .transpose()?;
        let terraform_binary =
            read_env_nonempty(SystemTestEnv::TerraformBinary.as_str())?.map(PathBuf::from);
        let modules_dir =
            read_env_nonempty(SystemTestEnv::ModulesDir.as_str())?.map(PathBuf::from);
        Ok(Self {
            live_enabled,
            run_root,
            timeout,
            terraform_binary,
            modules_dir,
        })
    }

    /// Returns the suite timeout, never shorter than `requested`.
    #[must_use]
    pub fn resolve_timeout(&self, requested: Duration) -> Duration {
        self.timeout.map_or(requested, |timeout| requested.max(timeout))
    }
}
