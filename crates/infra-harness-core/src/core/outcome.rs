// crates/infra-harness-core/src/core/outcome.rs
// ============================================================================
// Module: Infra Harness Outcomes
// Description: Assertion results, per-module outcomes, and suite reports.
// Purpose: Record which phase failed and why, without losing sibling failures.
// Dependencies: serde, crate::core
// ============================================================================

//! ## Overview
//! A [`ModuleOutcome`] keeps every failure a module produced, tagged with the
//! [`Phase`] it came from, alongside every assertion result (passed or not).
//! Status is derived from the failures: any teardown failure makes the module
//! [`OutcomeStatus::LeakSuspected`] even if its assertions passed, because a
//! possible resource leak outweighs a functional pass.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::InstanceId;
use crate::core::identifiers::ModuleName;
use crate::core::identifiers::RunId;
use crate::core::outputs::OutputSet;
use crate::core::state::LifecycleState;

// ============================================================================
// SECTION: Assertion Results
// ============================================================================

/// Result of one predicate applied to one subject value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssertionResult {
    /// Predicate label (`not_empty`, `contains`, `matches`, `equals`).
    pub predicate: String,
    /// Output the subject was read from, when known.
    pub output: Option<String>,
    /// Subject value the predicate inspected.
    pub subject: String,
    /// Human-readable expected condition.
    pub expected: String,
    /// Whether the predicate held.
    pub passed: bool,
    /// Diagnostic message.
    pub message: String,
}

impl AssertionResult {
    /// Attributes the result to a named output.
    #[must_use]
    pub fn for_output(mut self, output: impl Into<String>) -> Self {
        self.output = Some(output.into());
        self
    }

    /// Replaces the diagnostic message.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Formats a one-line description of the result.
    #[must_use]
    pub fn describe(&self) -> String {
        let verdict = if self.passed { "passed" } else { "failed" };
        let output = self.output.as_deref().unwrap_or("<value>");
        format!(
            "{output}: {} {verdict} (expected {}, got \"{}\"): {}",
            self.predicate, self.expected, self.subject, self.message
        )
    }
}

// ============================================================================
// SECTION: Phases
// ============================================================================

/// Lifecycle phase a failure is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Init and apply.
    Provision,
    /// Output extraction.
    Output,
    /// Assertion evaluation.
    Assert,
    /// Test body error, panic, or timeout.
    TestBody,
    /// Destroy.
    Teardown,
    /// Harness task failure outside the lifecycle manager.
    Harness,
}

impl Phase {
    /// Returns a stable label for logs and reports.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Provision => "provision",
            Self::Output => "output",
            Self::Assert => "assert",
            Self::TestBody => "test_body",
            Self::Teardown => "teardown",
            Self::Harness => "harness",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A failure recorded against a phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseFailure {
    /// Phase the failure belongs to.
    pub phase: Phase,
    /// Failure detail.
    pub detail: String,
}

impl PhaseFailure {
    /// Creates a phase failure.
    #[must_use]
    pub fn new(phase: Phase, detail: impl Into<String>) -> Self {
        Self {
            phase,
            detail: detail.into(),
        }
    }
}

// ============================================================================
// SECTION: Outcome Status
// ============================================================================

/// Overall verdict for a module or suite, ordered by severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    /// Every phase succeeded.
    Passed,
    /// A provision, output, assertion, or test-body failure occurred.
    Failed,
    /// Teardown was not confirmed; resources may have leaked.
    LeakSuspected,
}

impl OutcomeStatus {
    /// Derives a status from recorded failures.
    #[must_use]
    pub fn from_failures(failures: &[PhaseFailure]) -> Self {
        failures.iter().fold(Self::Passed, |status, failure| {
            let current = match failure.phase {
                Phase::Teardown | Phase::Harness => Self::LeakSuspected,
                _ => Self::Failed,
            };
            status.max(current)
        })
    }

    /// Returns a stable label for logs and reports.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::LeakSuspected => "leak_suspected",
        }
    }
}

impl fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ============================================================================
// SECTION: Module Outcome
// ============================================================================

/// Final result of one module's lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleOutcome {
    /// Module name.
    pub module: ModuleName,
    /// Instance key used with the engine.
    pub instance: InstanceId,
    /// Derived verdict.
    pub status: OutcomeStatus,
    /// Lifecycle state when the manager returned.
    pub final_state: LifecycleState,
    /// Every failure, in the order it occurred.
    pub failures: Vec<PhaseFailure>,
    /// Every assertion result, passed or failed.
    pub assertions: Vec<AssertionResult>,
    /// Outputs read during the provisioned lifetime.
    pub outputs: OutputSet,
    /// Destroy attempts made (zero only for aborted tasks).
    pub teardown_attempts: u32,
    /// Wall-clock duration of the lifecycle in milliseconds.
    pub duration_ms: u64,
}

impl ModuleOutcome {
    /// Builds the outcome for a module whose lifecycle task died unexpectedly.
    ///
    /// Resource state is unknown, so the module is treated as leak-suspected.
    #[must_use]
    pub fn aborted(module: ModuleName, instance: InstanceId, detail: impl Into<String>) -> Self {
        let failures = vec![PhaseFailure::new(Phase::Harness, detail)];
        Self {
            module,
            instance,
            status: OutcomeStatus::from_failures(&failures),
            final_state: LifecycleState::LeakSuspected,
            failures,
            assertions: Vec::new(),
            outputs: OutputSet::new(),
            teardown_attempts: 0,
            duration_ms: 0,
        }
    }

    /// Returns true when the module passed every phase.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.status == OutcomeStatus::Passed
    }

    /// Iterates failed assertion results.
    pub fn failed_assertions(&self) -> impl Iterator<Item = &AssertionResult> {
        self.assertions.iter().filter(|result| !result.passed)
    }

    /// Iterates failures recorded against a phase.
    pub fn failures_in(&self, phase: Phase) -> impl Iterator<Item = &PhaseFailure> {
        self.failures.iter().filter(move |failure| failure.phase == phase)
    }

    /// Returns the distinct failed phases in lifecycle order.
    #[must_use]
    pub fn failed_phases(&self) -> Vec<Phase> {
        let mut phases: Vec<Phase> = self.failures.iter().map(|failure| failure.phase).collect();
        phases.sort_unstable();
        phases.dedup();
        phases
    }
}

// ============================================================================
// SECTION: Suite Report
// ============================================================================

/// Aggregated outcomes for every module in a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuiteReport {
    /// Run identifier embedded in resource names.
    pub run_id: RunId,
    /// Worst module status (passed for an empty suite).
    pub status: OutcomeStatus,
    /// Outcomes keyed by module name.
    pub modules: BTreeMap<ModuleName, ModuleOutcome>,
}

impl SuiteReport {
    /// Builds a report and derives the composite status.
    #[must_use]
    pub fn new(run_id: RunId, modules: BTreeMap<ModuleName, ModuleOutcome>) -> Self {
        let status =
            modules.values().map(|outcome| outcome.status).max().unwrap_or(OutcomeStatus::Passed);
        Self {
            run_id,
            status,
            modules,
        }
    }

    /// Returns true when every module passed.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.status == OutcomeStatus::Passed
    }

    /// Returns the outcome for a module.
    #[must_use]
    pub fn get(&self, module: &str) -> Option<&ModuleOutcome> {
        self.modules.values().find(|outcome| outcome.module.as_str() == module)
    }

    /// Returns modules that did not pass.
    #[must_use]
    pub fn failed_modules(&self) -> Vec<&ModuleName> {
        self.modules.values().filter(|outcome| !outcome.passed()).map(|outcome| &outcome.module).collect()
    }

    /// Returns modules whose teardown was not confirmed.
    #[must_use]
    pub fn leak_suspected_modules(&self) -> Vec<&ModuleName> {
        self.modules
            .values()
            .filter(|outcome| outcome.status == OutcomeStatus::LeakSuspected)
            .map(|outcome| &outcome.module)
            .collect()
    }
}
