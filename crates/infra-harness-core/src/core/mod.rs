// crates/infra-harness-core/src/core/mod.rs
// ============================================================================
// Module: Infra Harness Core Types
// Description: Canonical module, parameter, state, and outcome structures.
// Purpose: Provide stable, serializable types shared by the runtime and reports.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Core types describe what is under test (module handles, definitions, and
//! parameter sets), where each handle sits in its lifecycle, and what the
//! harness concluded about it. These types are the canonical source of truth
//! for reports written by the CLI.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod handle;
pub mod identifiers;
pub mod outcome;
pub mod outputs;
pub mod parameters;
pub mod state;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use handle::ModuleHandle;
pub use handle::ModuleTarget;
pub use identifiers::IdentifierError;
pub use identifiers::InstanceId;
pub use identifiers::ModuleDefinitionRef;
pub use identifiers::ModuleName;
pub use identifiers::RunId;
pub use outcome::AssertionResult;
pub use outcome::ModuleOutcome;
pub use outcome::OutcomeStatus;
pub use outcome::Phase;
pub use outcome::PhaseFailure;
pub use outcome::SuiteReport;
pub use outputs::OutputSet;
pub use parameters::ParamValue;
pub use parameters::ParameterSet;
pub use state::LifecycleState;
