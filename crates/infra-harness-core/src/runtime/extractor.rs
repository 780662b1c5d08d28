// crates/infra-harness-core/src/runtime/extractor.rs
// ============================================================================
// Module: Output Extractor
// Description: Reads named outputs from a provisioned module instance.
// Purpose: Give test bodies stable, bounded, state-checked output access.
// Dependencies: crate::{core, interfaces}, tokio
// ============================================================================

//! ## Overview
//! An [`OutputExtractor`] is attached to a handle when provisioning succeeds
//! and retired when teardown begins. Reads outside that window fail with
//! [`OutputError::NotProvisioned`]. Each name is fetched from the engine at
//! most once per provisioned lifetime; later reads return the first value,
//! so outputs stay stable even if a body reads them repeatedly or from
//! several tasks.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::PoisonError;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::time::Duration;

use thiserror::Error;

use crate::core::ModuleName;
use crate::core::ModuleTarget;
use crate::core::OutputSet;
use crate::core::ParameterSet;
use crate::interfaces::EngineError;
use crate::interfaces::ProvisioningEngine;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Output extraction errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OutputError {
    /// The module is not in its provisioned window.
    #[error("module `{module}` is not provisioned")]
    NotProvisioned {
        /// Module name.
        module: ModuleName,
    },
    /// The module defines no such output.
    #[error("module `{module}` defines no output `{name}`")]
    NotFound {
        /// Module name.
        module: ModuleName,
        /// Requested output name.
        name: String,
    },
    /// The engine did not answer in time.
    #[error("reading output `{name}` of module `{module}` timed out after {after_ms} ms")]
    TimedOut {
        /// Module name.
        module: ModuleName,
        /// Requested output name.
        name: String,
        /// Timeout in milliseconds.
        after_ms: u64,
    },
    /// The engine failed while reading the output.
    #[error("reading output `{name}` of module `{module}` failed: {message}")]
    Engine {
        /// Module name.
        module: ModuleName,
        /// Requested output name.
        name: String,
        /// Engine error text.
        message: String,
    },
}

impl OutputError {
    /// Returns the output name involved, when the error concerns one output.
    #[must_use]
    pub fn output_name(&self) -> Option<&str> {
        match self {
            Self::NotProvisioned {
                ..
            } => None,
            Self::NotFound {
                name, ..
            }
            | Self::TimedOut {
                name, ..
            }
            | Self::Engine {
                name, ..
            } => Some(name),
        }
    }
}

/// Converts a duration into whole milliseconds, saturating.
pub(crate) fn duration_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

// ============================================================================
// SECTION: Output Extractor
// ============================================================================

/// State shared between clones of one extractor.
struct ExtractorShared {
    /// Cleared when teardown begins.
    live: AtomicBool,
    /// First-read values.
    cache: Mutex<OutputSet>,
}

/// Reads outputs of one provisioned module instance.
#[derive(Clone)]
pub struct OutputExtractor {
    /// Engine the outputs are read from.
    engine: Arc<dyn ProvisioningEngine>,
    /// Instance being read.
    target: Arc<ModuleTarget>,
    /// Bound on each engine call.
    timeout: Duration,
    /// Liveness flag and cache.
    shared: Arc<ExtractorShared>,
}

impl OutputExtractor {
    /// Attaches a live extractor to a freshly provisioned target.
    pub(crate) fn attach(
        engine: Arc<dyn ProvisioningEngine>,
        target: Arc<ModuleTarget>,
        timeout: Duration,
    ) -> Self {
        Self {
            engine,
            target,
            timeout,
            shared: Arc::new(ExtractorShared {
                live: AtomicBool::new(true),
                cache: Mutex::new(OutputSet::new()),
            }),
        }
    }

    /// Returns true while outputs may be read.
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.shared.live.load(Ordering::Acquire)
    }

    /// Reads one output by name.
    ///
    /// # Errors
    ///
    /// Returns [`OutputError::NotProvisioned`] outside the provisioned window,
    /// [`OutputError::NotFound`] when the module defines no such output, and
    /// timeout or engine errors otherwise.
    pub async fn output(&self, name: &str) -> Result<String, OutputError> {
        if !self.is_live() {
            return Err(OutputError::NotProvisioned {
                module: self.target.name.clone(),
            });
        }
        if let Some(value) = self.cached(name) {
            return Ok(value);
        }
        let fetched = tokio::time::timeout(self.timeout, self.engine.output(&self.target, name))
            .await
            .map_err(|_| OutputError::TimedOut {
                module: self.target.name.clone(),
                name: name.to_string(),
                after_ms: duration_millis(self.timeout),
            })?
            .map_err(|err| self.map_engine_error(name, err))?;
        let mut cache = self.shared.cache.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(cache.record(name, fetched).to_string())
    }

    /// Reads several outputs, keeping each result independent.
    pub async fn outputs(&self, names: &[&str]) -> Vec<(String, Result<String, OutputError>)> {
        let mut results = Vec::with_capacity(names.len());
        for name in names {
            results.push(((*name).to_string(), self.output(name).await));
        }
        results
    }

    /// Returns a snapshot of every output read so far.
    #[must_use]
    pub fn observed(&self) -> OutputSet {
        self.shared.cache.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Closes the provisioned window; later reads fail.
    pub(crate) fn retire(&self) {
        self.shared.live.store(false, Ordering::Release);
    }

    /// Returns a cached value for a name.
    fn cached(&self, name: &str) -> Option<String> {
        let cache = self.shared.cache.lock().unwrap_or_else(PoisonError::into_inner);
        cache.get(name).map(str::to_string)
    }

    /// Maps an engine error into an output error for this module.
    fn map_engine_error(&self, name: &str, err: EngineError) -> OutputError {
        match err {
            EngineError::OutputNotFound {
                ..
            } => OutputError::NotFound {
                module: self.target.name.clone(),
                name: name.to_string(),
            },
            other => OutputError::Engine {
                module: self.target.name.clone(),
                name: name.to_string(),
                message: other.to_string(),
            },
        }
    }
}

// ============================================================================
// SECTION: Module Context
// ============================================================================

/// View of a provisioned module handed to a test body.
#[derive(Clone)]
pub struct ModuleContext {
    /// Output reader bound to the module instance.
    extractor: OutputExtractor,
}

impl ModuleContext {
    /// Wraps an extractor for a test body.
    pub(crate) const fn new(extractor: OutputExtractor) -> Self {
        Self {
            extractor,
        }
    }

    /// Returns the module target.
    #[must_use]
    pub fn target(&self) -> &ModuleTarget {
        &self.extractor.target
    }

    /// Returns the module name.
    #[must_use]
    pub fn name(&self) -> &ModuleName {
        &self.extractor.target.name
    }

    /// Returns the parameters the module was applied with (after isolation).
    #[must_use]
    pub fn parameters(&self) -> &ParameterSet {
        &self.extractor.target.parameters
    }

    /// Returns the output extractor.
    #[must_use]
    pub const fn extractor(&self) -> &OutputExtractor {
        &self.extractor
    }

    /// Reads one output by name.
    ///
    /// # Errors
    ///
    /// See [`OutputExtractor::output`].
    pub async fn output(&self, name: &str) -> Result<String, OutputError> {
        self.extractor.output(name).await
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
#[path = "extractor_tests.rs"]
mod tests;
