// crates/infra-harness-core/src/core/outputs.rs
// ============================================================================
// Module: Infra Harness Output Sets
// Description: Named output values read back from a provisioned module.
// Purpose: Hold first-read output values so repeated reads stay stable.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Outputs are opaque strings until an assertion inspects them. An entry is
//! written once per provisioned lifetime; later writes for the same name keep
//! the first value. An empty string is a real value, distinct from absence.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Output Set
// ============================================================================

/// Mapping from output name to string value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OutputSet(BTreeMap<String, String>);

impl OutputSet {
    /// Creates an empty output set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value for an output, if it has been read.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Iterates outputs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Returns the number of recorded outputs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true when no outputs are recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Records an output unless one is already present; returns the stored value.
    pub fn record(&mut self, name: &str, value: String) -> &str {
        self.0.entry(name.to_string()).or_insert(value)
    }
}
