// crates/infra-harness-config/src/env.rs
// ============================================================================
// Module: Harness Environment
// Description: Environment-backed overrides for suite runs.
// Purpose: Centralize env parsing with strict UTF-8 validation.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Environment values are parsed with strict UTF-8 enforcement to avoid
//! silent misconfiguration. Invalid UTF-8 or empty values fail closed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

// ============================================================================
// SECTION: Environment Constants
// ============================================================================

/// Environment keys read by the harness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HarnessEnv {
    /// Suite file path when none is given explicitly.
    Config,
    /// Run id override.
    RunId,
    /// Minimum provision/destroy timeout in seconds (positive integer).
    TimeoutSeconds,
}

impl HarnessEnv {
    /// Returns the canonical environment variable name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Config => "INFRA_HARNESS_CONFIG",
            Self::RunId => "INFRA_HARNESS_RUN_ID",
            Self::TimeoutSeconds => "INFRA_HARNESS_TIMEOUT_SEC",
        }
    }
}

// ============================================================================
// SECTION: Overrides
// ============================================================================

/// Overrides taken from the environment.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EnvOverrides {
    /// Run id override.
    pub run_id: Option<String>,
    /// Minimum provision/destroy timeout.
    pub timeout: Option<Duration>,
}

impl EnvOverrides {
    /// Loads overrides from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error when a value is not valid UTF-8, is empty, or fails
    /// validation.
    pub fn load() -> Result<Self, String> {
        let run_id = read_env_nonempty(HarnessEnv::RunId.as_str())?
            .map(|value| value.trim().to_string());
        let timeout = read_env_nonempty(HarnessEnv::TimeoutSeconds.as_str())?
            .map(|value| parse_timeout_seconds(HarnessEnv::TimeoutSeconds.as_str(), &value))
            .transpose()?;
        Ok(Self {
            run_id,
            timeout,
        })
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Reads an environment variable and enforces UTF-8 validity.
///
/// # Errors
///
/// Returns an error when the environment variable contains invalid UTF-8.
pub fn read_env_strict(name: &str) -> Result<Option<String>, String> {
    std::env::var_os(name).map_or(Ok(None), |raw| {
        raw.into_string().map(Some).map_err(|_| format!("{name} must be valid UTF-8"))
    })
}

/// Reads an environment variable and rejects empty values.
///
/// # Errors
///
/// Returns an error when the variable is set but empty or whitespace.
pub fn read_env_nonempty(name: &str) -> Result<Option<String>, String> {
    match read_env_strict(name)? {
        Some(value) if value.trim().is_empty() => Err(format!("{name} must not be empty")),
        Some(value) => Ok(Some(value)),
        None => Ok(None),
    }
}

/// Parses a positive timeout value from an environment variable string.
///
/// # Errors
///
/// Returns an error when the value is missing, non-numeric, or zero.
pub fn parse_timeout_seconds(name: &str, raw: &str) -> Result<Duration, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(format!("{name} must be a positive integer number of seconds"));
    }
    let secs: u64 = trimmed
        .parse()
        .map_err(|_| format!("{name} must be a positive integer number of seconds"))?;
    if secs == 0 {
        return Err(format!("{name} must be greater than zero"));
    }
    Ok(Duration::from_secs(secs))
}

/// Parses a boolean environment variable; unset means false.
///
/// # Errors
///
/// Returns an error when the value is not a recognized boolean literal.
pub fn parse_bool_env(name: &str, raw: Option<String>) -> Result<bool, String> {
    let Some(value) = raw else {
        return Ok(false);
    };
    let trimmed = value.trim();
    if trimmed.eq_ignore_ascii_case("true") || trimmed == "1" {
        return Ok(true);
    }
    if trimmed.eq_ignore_ascii_case("false") || trimmed == "0" {
        return Ok(false);
    }
    Err(format!("{name} must be 1, 0, true, or false"))
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
