// crates/infra-harness-core/src/core/handle.rs
// ============================================================================
// Module: Infra Harness Module Handles
// Description: Identity and lifecycle state of one module instance under test.
// Purpose: Pair an immutable target with the state owned by its lifecycle manager.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! A [`ModuleTarget`] is what the provisioning engine sees: the module name,
//! its per-run instance key, the definition locator, and the parameter set.
//! It never changes after creation and is shared by reference with the test
//! body. A [`ModuleHandle`] adds the lifecycle state, which only the owning
//! lifecycle manager advances.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use crate::core::identifiers::InstanceId;
use crate::core::identifiers::ModuleDefinitionRef;
use crate::core::identifiers::ModuleName;
use crate::core::parameters::ParameterSet;
use crate::core::state::LifecycleState;

// ============================================================================
// SECTION: Module Target
// ============================================================================

/// Immutable identity of a module instance as seen by the provisioning engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleTarget {
    /// Module name (suite key).
    pub name: ModuleName,
    /// Per-run instance key.
    pub instance: InstanceId,
    /// Declarative source locator.
    pub definition: ModuleDefinitionRef,
    /// Parameters passed at apply time.
    pub parameters: ParameterSet,
}

// ============================================================================
// SECTION: Module Handle
// ============================================================================

/// A module target plus its lifecycle state.
#[derive(Debug)]
pub struct ModuleHandle {
    /// Shared immutable target.
    target: Arc<ModuleTarget>,
    /// Current lifecycle state.
    state: LifecycleState,
}

impl ModuleHandle {
    /// Creates an idle handle for a target.
    #[must_use]
    pub fn new(target: ModuleTarget) -> Self {
        Self {
            target: Arc::new(target),
            state: LifecycleState::Idle,
        }
    }

    /// Returns the shared target.
    #[must_use]
    pub const fn target(&self) -> &Arc<ModuleTarget> {
        &self.target
    }

    /// Returns the module name.
    #[must_use]
    pub fn name(&self) -> &ModuleName {
        &self.target.name
    }

    /// Returns the instance key.
    #[must_use]
    pub fn instance(&self) -> &InstanceId {
        &self.target.instance
    }

    /// Returns the current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> LifecycleState {
        self.state
    }

    /// Moves the handle to `next`, returning the previous state.
    pub(crate) fn advance(&mut self, next: LifecycleState) -> LifecycleState {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal lifecycle transition {} -> {}",
            self.state,
            next
        );
        std::mem::replace(&mut self.state, next)
    }
}
