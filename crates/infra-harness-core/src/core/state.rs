// crates/infra-harness-core/src/core/state.rs
// ============================================================================
// Module: Infra Harness Lifecycle State
// Description: Lifecycle state machine for a module handle.
// Purpose: Encode legal transitions and resource-existence windows.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A module handle moves through
//! `idle → provisioning → provisioned → testing → destroying → destroyed`.
//! A failed provision jumps straight to `destroying`, and a destroy that never
//! confirms success ends in `leak_suspected`. Backend resources may exist only
//! between `provisioning` and the terminal state.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Lifecycle State
// ============================================================================

/// Lifecycle state of a module handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    /// Handle created; nothing provisioned yet.
    Idle,
    /// Init and apply in progress; partial resources may exist.
    Provisioning,
    /// Provisioning succeeded; outputs are readable.
    Provisioned,
    /// Test body running against live resources.
    Testing,
    /// Teardown in progress.
    Destroying,
    /// Teardown confirmed; no resources remain.
    Destroyed,
    /// Teardown never confirmed after resources may have been created.
    LeakSuspected,
}

impl LifecycleState {
    /// Returns a stable label for logs and reports.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Provisioning => "provisioning",
            Self::Provisioned => "provisioned",
            Self::Testing => "testing",
            Self::Destroying => "destroying",
            Self::Destroyed => "destroyed",
            Self::LeakSuspected => "leak_suspected",
        }
    }

    /// Returns true for terminal states.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Destroyed | Self::LeakSuspected)
    }

    /// Returns true while outputs may be read.
    #[must_use]
    pub const fn is_live(self) -> bool {
        matches!(self, Self::Provisioned | Self::Testing)
    }

    /// Returns true when backend resources may exist in this state.
    #[must_use]
    pub const fn may_hold_resources(self) -> bool {
        !matches!(self, Self::Idle | Self::Destroyed)
    }

    /// Returns true when `next` is a legal successor of this state.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::Provisioning)
                | (Self::Provisioning, Self::Provisioned | Self::Destroying)
                | (Self::Provisioned, Self::Testing | Self::Destroying)
                | (Self::Testing, Self::Destroying)
                | (Self::Destroying, Self::Destroyed | Self::LeakSuspected)
        )
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
