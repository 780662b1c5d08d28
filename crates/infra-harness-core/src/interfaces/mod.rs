// crates/infra-harness-core/src/interfaces/mod.rs
// ============================================================================
// Module: Infra Harness Interfaces
// Description: Provisioning engine and test body contracts.
// Purpose: Define the seams between the harness and external collaborators.
// Dependencies: async-trait, thiserror, crate::{core, runtime}
// ============================================================================

//! ## Overview
//! The harness consumes a provisioning engine through three operations
//! (init-and-apply, output lookup, destroy) and hands each provisioned module
//! to a test body. Both seams are async traits so implementations can shell
//! out to long-running external tools without blocking sibling modules.

// ============================================================================
// SECTION: Imports
// ============================================================================

use async_trait::async_trait;
use thiserror::Error;

use crate::core::ModuleTarget;
use crate::runtime::AssertionSet;
use crate::runtime::ModuleContext;
use crate::runtime::OutputError;

// ============================================================================
// SECTION: Provisioning Engine
// ============================================================================

/// Provisioning engine errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// The engine rejected the definition or its parameters.
    #[error("engine rejected module: {0}")]
    Rejected(String),
    /// The backend or the engine process failed.
    #[error("engine backend failure: {0}")]
    Backend(String),
    /// The module defines no output with this name (or is not provisioned).
    #[error("output `{name}` not found")]
    OutputNotFound {
        /// Requested output name.
        name: String,
    },
    /// Local I/O failed while preparing or reading engine state.
    #[error("engine io error: {0}")]
    Io(String),
}

/// Black-box provisioning engine driven by the harness.
#[async_trait]
pub trait ProvisioningEngine: Send + Sync {
    /// Returns a short engine label for audit logs.
    fn name(&self) -> &str;

    /// Initializes and applies the module; outputs are readable on success.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] when the module cannot be provisioned. Partial
    /// resources may exist afterwards; callers must still destroy.
    async fn init_and_apply(&self, target: &ModuleTarget) -> Result<(), EngineError>;

    /// Reads one named output of a provisioned module.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::OutputNotFound`] when the output is not defined
    /// or the instance holds no state, and other variants on engine failure.
    async fn output(&self, target: &ModuleTarget, name: &str) -> Result<String, EngineError>;

    /// Destroys every resource created for the instance.
    ///
    /// Must be idempotent: destroying an absent or already-destroyed instance
    /// succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] when removal could not be confirmed.
    async fn destroy(&self, target: &ModuleTarget) -> Result<(), EngineError>;
}

// ============================================================================
// SECTION: Test Body
// ============================================================================

/// Errors a test body may return instead of assertion results.
#[derive(Debug, Error)]
pub enum TestBodyError {
    /// A required output could not be read.
    #[error(transparent)]
    Output(#[from] OutputError),
    /// The body failed for its own reasons.
    #[error("test body failed: {0}")]
    Failed(String),
    /// The body panicked.
    #[error("test body panicked: {0}")]
    Panicked(String),
    /// The body did not finish within its time limit.
    #[error("test body timed out after {after_ms} ms")]
    TimedOut {
        /// Timeout in milliseconds.
        after_ms: u64,
    },
}

/// Test logic run against a provisioned module.
#[async_trait]
pub trait ModuleTest: Send + Sync {
    /// Inspects the provisioned module and returns collected assertions.
    ///
    /// # Errors
    ///
    /// Returns [`TestBodyError`] when the body cannot complete; assertions
    /// gathered before the error are lost, so bodies that want partial
    /// results should record output errors on the [`AssertionSet`] instead.
    async fn run(&self, ctx: ModuleContext) -> Result<AssertionSet, TestBodyError>;
}
