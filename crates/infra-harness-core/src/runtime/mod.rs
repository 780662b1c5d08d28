// crates/infra-harness-core/src/runtime/mod.rs
// ============================================================================
// Module: Infra Harness Runtime
// Description: Lifecycle orchestration, output extraction, assertions, and coordination.
// Purpose: Drive modules through provision, test, and guaranteed teardown.
// Dependencies: crate::{audit, core, interfaces}, tokio
// ============================================================================

//! ## Overview
//! The runtime wires the pieces together: [`LifecycleManager`] owns one
//! module handle end to end, [`OutputExtractor`] reads outputs while the
//! handle is live, the assertion helpers evaluate predicates, and
//! [`ConcurrentTestCoordinator`] runs one lifecycle task per module.
//! [`InMemoryEngine`] is a deterministic engine for tests.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod assertions;
pub mod coordinator;
pub mod extractor;
pub mod lifecycle;
pub mod memory;
pub mod naming;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use assertions::AssertionSet;
pub use assertions::CheckError;
pub use assertions::Check;
pub use assertions::Expectation;
pub use assertions::ExpectationSet;
pub use coordinator::ConcurrentTestCoordinator;
pub use coordinator::CoordinatorConfig;
pub use coordinator::CoordinatorError;
pub use coordinator::ModuleSpec;
pub use coordinator::PreparedModule;
pub use extractor::ModuleContext;
pub use extractor::OutputError;
pub use extractor::OutputExtractor;
pub use lifecycle::LifecycleManager;
pub use lifecycle::LifecycleTimeouts;
pub use lifecycle::ProvisionError;
pub use lifecycle::TeardownError;
pub use memory::InMemoryEngine;
pub use memory::ModuleBlueprint;
