// crates/infra-harness-core/src/lib.rs
// ============================================================================
// Module: Infra Harness Core Library
// Description: Public API surface for the infrastructure module test harness.
// Purpose: Expose lifecycle types, engine interfaces, and runtime orchestration.
// Dependencies: crate::{audit, core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! Infra Harness core drives declarative infrastructure modules through a
//! provision, extract, assert, and teardown lifecycle. The provisioning engine
//! is a black box behind [`ProvisioningEngine`]; the harness owns ordering,
//! timeouts, fault isolation between modules, and the guarantee that every
//! provisioned module is destroyed (or reported as a suspected leak).

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod audit;
pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use audit::FileAuditSink;
pub use audit::LifecycleAuditEvent;
pub use audit::LifecycleAuditSink;
pub use audit::NoopAuditSink;
pub use audit::StderrAuditSink;
pub use audit::SuiteAuditEvent;
pub use crate::core::*;
pub use interfaces::EngineError;
pub use interfaces::ModuleTest;
pub use interfaces::ProvisioningEngine;
pub use interfaces::TestBodyError;
pub use runtime::AssertionSet;
pub use runtime::Check;
pub use runtime::CheckError;
pub use runtime::ConcurrentTestCoordinator;
pub use runtime::CoordinatorConfig;
pub use runtime::CoordinatorError;
pub use runtime::Expectation;
pub use runtime::ExpectationSet;
pub use runtime::InMemoryEngine;
pub use runtime::LifecycleManager;
pub use runtime::LifecycleTimeouts;
pub use runtime::ModuleBlueprint;
pub use runtime::ModuleContext;
pub use runtime::ModuleSpec;
pub use runtime::OutputError;
pub use runtime::OutputExtractor;
pub use runtime::PreparedModule;
pub use runtime::ProvisionError;
pub use runtime::TeardownError;
