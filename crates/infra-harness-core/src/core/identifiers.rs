// crates/infra-harness-core/src/core/identifiers.rs
// ============================================================================
// Module: Infra Harness Identifiers
// Description: Typed identifiers for modules, runs, instances, and definitions.
// Purpose: Provide strongly typed, serializable IDs with stable string forms.
// Dependencies: rand, serde
// ============================================================================

//! ## Overview
//! Module names and run identifiers end up inside backend resource names and
//! on-disk workspace paths, so their parse constructors restrict them to a
//! conservative character set (lowercase ASCII letters, digits, `-`, `_`).
//! [`InstanceId`] combines both into the per-run key a provisioning engine
//! uses to keep the state of two handles of one definition apart.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::path::Path;
use std::path::PathBuf;

use rand::Rng;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Maximum length of a module name.
pub const MAX_MODULE_NAME_LENGTH: usize = 64;
/// Maximum length of a run identifier.
pub const MAX_RUN_ID_LENGTH: usize = 16;
/// Length of generated run identifiers.
pub const GENERATED_RUN_ID_LENGTH: usize = 6;
/// Alphabet for generated run identifiers (lowercase to satisfy bucket naming rules).
const RUN_ID_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Identifier validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentifierError {
    /// Identifier was empty.
    #[error("{kind} must not be empty")]
    Empty {
        /// Identifier kind label.
        kind: &'static str,
    },
    /// Identifier exceeded its length limit.
    #[error("{kind} `{value}` exceeds {max} characters")]
    TooLong {
        /// Identifier kind label.
        kind: &'static str,
        /// Rejected value.
        value: String,
        /// Maximum allowed length.
        max: usize,
    },
    /// Identifier contained a disallowed character.
    #[error("{kind} `{value}` may only contain lowercase letters, digits, `-`, and `_`")]
    InvalidCharacter {
        /// Identifier kind label.
        kind: &'static str,
        /// Rejected value.
        value: String,
    },
}

/// Validates an identifier against the shared character policy.
fn validate_identifier(kind: &'static str, value: &str, max: usize) -> Result<(), IdentifierError> {
    if value.is_empty() {
        return Err(IdentifierError::Empty {
            kind,
        });
    }
    if value.len() > max {
        return Err(IdentifierError::TooLong {
            kind,
            value: value.to_string(),
            max,
        });
    }
    let allowed =
        |ch: char| ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '-' || ch == '_';
    if !value.chars().all(allowed) {
        return Err(IdentifierError::InvalidCharacter {
            kind,
            value: value.to_string(),
        });
    }
    Ok(())
}

// ============================================================================
// SECTION: Identifier Types
// ============================================================================

/// Name of a module under test; the key of the suite outcome map.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleName(String);

impl ModuleName {
    /// Parses a module name, enforcing the identifier character policy.
    ///
    /// # Errors
    ///
    /// Returns [`IdentifierError`] when the name is empty, too long, or
    /// contains disallowed characters.
    pub fn parse(value: impl Into<String>) -> Result<Self, IdentifierError> {
        let value = value.into();
        validate_identifier("module name", &value, MAX_MODULE_NAME_LENGTH)?;
        Ok(Self(value))
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModuleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Per-run unique token embedded in externally visible resource names.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(String);

impl RunId {
    /// Generates a fresh random run identifier.
    #[must_use]
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let id = (0 .. GENERATED_RUN_ID_LENGTH)
            .map(|_| char::from(RUN_ID_ALPHABET[rng.gen_range(0 .. RUN_ID_ALPHABET.len())]))
            .collect();
        Self(id)
    }

    /// Parses an explicit run identifier.
    ///
    /// # Errors
    ///
    /// Returns [`IdentifierError`] when the identifier violates the character
    /// policy or exceeds [`MAX_RUN_ID_LENGTH`].
    pub fn parse(value: impl Into<String>) -> Result<Self, IdentifierError> {
        let value = value.into();
        validate_identifier("run id", &value, MAX_RUN_ID_LENGTH)?;
        Ok(Self(value))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Engine-facing key for one module instance within one run.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstanceId(String);

impl InstanceId {
    /// Derives the instance key for a module within a run.
    #[must_use]
    pub fn derive(module: &ModuleName, run_id: &RunId) -> Self {
        Self(format!("{module}-{run_id}"))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Locator of a module's declarative source (a directory for Terraform).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleDefinitionRef(PathBuf);

impl ModuleDefinitionRef {
    /// Creates a definition reference from a path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    /// Returns the definition path.
    #[must_use]
    pub fn as_path(&self) -> &Path {
        &self.0
    }
}

impl fmt::Display for ModuleDefinitionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

impl From<&str> for ModuleDefinitionRef {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<PathBuf> for ModuleDefinitionRef {
    fn from(value: PathBuf) -> Self {
        Self(value)
    }
}
