// crates/infra-harness-core/src/runtime/lifecycle.rs
// ============================================================================
// Module: Lifecycle Manager
// Description: Provision, test, and guaranteed teardown of one module handle.
// Purpose: Never return while provisioned resources are unregistered for cleanup.
// Dependencies: crate::{audit, core, interfaces, runtime}, tokio
// ============================================================================

//! ## Overview
//! [`LifecycleManager::run`] owns a [`ModuleHandle`] end to end. Every step
//! captures its result instead of returning early, so control always reaches
//! the destroy step: provisioning failure, output errors, failed assertions,
//! a body error, a body panic, and a body timeout all fall through to
//! teardown. The body runs as its own task so a panic surfaces as a
//! [`JoinError`] rather than unwinding through the manager.
//!
//! Destroy is bounded per attempt and retried. A destroy that never confirms
//! leaves the handle in [`LifecycleState::LeakSuspected`]. If the `run`
//! future itself is dropped mid-flight, the internal guard retires the
//! extractor, aborts the body, and spawns a best-effort destroy whose result
//! is audited as `teardown_on_drop_finished`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;

use thiserror::Error;
use tokio::task::AbortHandle;
use tokio::task::JoinError;

use super::extractor::duration_millis;
use crate::audit::LifecycleAuditEvent;
use crate::audit::LifecycleAuditSink;
use crate::audit::NoopAuditSink;
use crate::core::AssertionResult;
use crate::core::LifecycleState;
use crate::core::ModuleHandle;
use crate::core::ModuleName;
use crate::core::ModuleOutcome;
use crate::core::ModuleTarget;
use crate::core::OutcomeStatus;
use crate::core::OutputSet;
use crate::core::Phase;
use crate::core::PhaseFailure;
use crate::core::RunId;
use crate::interfaces::ModuleTest;
use crate::interfaces::ProvisioningEngine;
use crate::interfaces::TestBodyError;
use crate::runtime::AssertionSet;
use crate::runtime::ModuleContext;
use crate::runtime::OutputExtractor;

// ============================================================================
// SECTION: Timeouts
// ============================================================================

/// Time bounds and retry policy for one lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifecycleTimeouts {
    /// Bound on init-and-apply.
    pub provision: Duration,
    /// Bound on each destroy attempt.
    pub destroy: Duration,
    /// Bound on each output read.
    pub output: Duration,
    /// Optional bound on the test body.
    pub test_body: Option<Duration>,
    /// Destroy attempts before the module is flagged leak-suspected.
    pub destroy_attempts: u32,
    /// Pause between destroy attempts.
    pub retry_backoff: Duration,
}

impl Default for LifecycleTimeouts {
    fn default() -> Self {
        Self {
            provision: Duration::from_secs(30 * 60),
            destroy: Duration::from_secs(30 * 60),
            output: Duration::from_secs(60),
            test_body: None,
            destroy_attempts: 3,
            retry_backoff: Duration::from_secs(10),
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Provisioning failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProvisionError {
    /// The engine rejected the module or the backend failed.
    #[error("provisioning module `{module}` failed: {message}")]
    Engine {
        /// Module name.
        module: ModuleName,
        /// Engine error text.
        message: String,
    },
    /// Init-and-apply did not finish in time.
    #[error("provisioning module `{module}` timed out after {after_ms} ms")]
    TimedOut {
        /// Module name.
        module: ModuleName,
        /// Timeout in milliseconds.
        after_ms: u64,
    },
}

/// Teardown failures. Always implies possible resource leakage.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TeardownError {
    /// No destroy attempt confirmed success.
    #[error("teardown of module `{module}` unconfirmed after {attempts} attempt(s): {last_error}")]
    Unconfirmed {
        /// Module name.
        module: ModuleName,
        /// Attempts made.
        attempts: u32,
        /// Error from the final attempt.
        last_error: String,
    },
}

// ============================================================================
// SECTION: Lifecycle Manager
// ============================================================================

/// Drives module handles through provision, test, and teardown.
pub struct LifecycleManager {
    /// Engine used for every step.
    engine: Arc<dyn ProvisioningEngine>,
    /// Time bounds and retry policy.
    timeouts: LifecycleTimeouts,
    /// Audit sink for transitions and retries.
    audit: Arc<dyn LifecycleAuditSink>,
    /// Run identifier stamped on audit events.
    run_id: RunId,
}

impl LifecycleManager {
    /// Creates a manager with default timeouts and no audit output.
    #[must_use]
    pub fn new(engine: Arc<dyn ProvisioningEngine>, run_id: RunId) -> Self {
        Self {
            engine,
            timeouts: LifecycleTimeouts::default(),
            audit: Arc::new(NoopAuditSink),
            run_id,
        }
    }

    /// Replaces the timeouts.
    #[must_use]
    pub fn with_timeouts(mut self, timeouts: LifecycleTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Replaces the audit sink.
    #[must_use]
    pub fn with_audit(mut self, audit: Arc<dyn LifecycleAuditSink>) -> Self {
        self.audit = audit;
        self
    }

    /// Returns the configured timeouts.
    #[must_use]
    pub const fn timeouts(&self) -> &LifecycleTimeouts {
        &self.timeouts
    }

    /// Runs one module to a terminal state and reports what happened.
    ///
    /// Teardown runs on every path once provisioning has started. The
    /// returned outcome lists every failure by phase; a teardown failure
    /// marks the module leak-suspected even when its assertions passed.
    pub async fn run(&self, handle: ModuleHandle, test: Arc<dyn ModuleTest>) -> ModuleOutcome {
        let started = Instant::now();
        let mut guard = TeardownGuard {
            manager: self,
            handle,
            extractor: None,
            body: None,
            settled: false,
        };
        let mut failures = Vec::new();
        let mut assertions = Vec::new();

        guard.transition(LifecycleState::Provisioning, None);
        let target = Arc::clone(guard.handle.target());
        let outputs = match self.provision(&target).await {
            Ok(()) => {
                guard.transition(LifecycleState::Provisioned, None);
                let extractor = OutputExtractor::attach(
                    Arc::clone(&self.engine),
                    Arc::clone(&target),
                    self.timeouts.output,
                );
                guard.extractor = Some(extractor.clone());
                guard.transition(LifecycleState::Testing, None);
                let body = self.run_body(&mut guard, &extractor, test).await;
                extractor.retire();
                record_body(body, &mut failures, &mut assertions);
                extractor.observed()
            }
            Err(err) => {
                failures.push(PhaseFailure::new(Phase::Provision, err.to_string()));
                OutputSet::new()
            }
        };

        guard.transition(LifecycleState::Destroying, None);
        let (teardown_attempts, teardown) = self.teardown(&target).await;
        match teardown {
            Ok(()) => guard.transition(LifecycleState::Destroyed, None),
            Err(err) => {
                let detail = err.to_string();
                failures.push(PhaseFailure::new(Phase::Teardown, detail.clone()));
                guard.transition(LifecycleState::LeakSuspected, Some(detail));
            }
        }
        guard.settled = true;

        ModuleOutcome {
            module: target.name.clone(),
            instance: target.instance.clone(),
            status: OutcomeStatus::from_failures(&failures),
            final_state: guard.handle.state(),
            failures,
            assertions,
            outputs,
            teardown_attempts,
            duration_ms: duration_millis(started.elapsed()),
        }
    }

    /// Runs init-and-apply under the provision timeout.
    async fn provision(&self, target: &ModuleTarget) -> Result<(), ProvisionError> {
        match tokio::time::timeout(self.timeouts.provision, self.engine.init_and_apply(target)).await
        {
            Ok(Ok(())) => Ok(()),
            Ok(Err(err)) => Err(ProvisionError::Engine {
                module: target.name.clone(),
                message: err.to_string(),
            }),
            Err(_) => Err(ProvisionError::TimedOut {
                module: target.name.clone(),
                after_ms: duration_millis(self.timeouts.provision),
            }),
        }
    }

    /// Runs the test body as its own task, bounded by the body timeout.
    async fn run_body(
        &self,
        guard: &mut TeardownGuard<'_>,
        extractor: &OutputExtractor,
        test: Arc<dyn ModuleTest>,
    ) -> Result<AssertionSet, TestBodyError> {
        let ctx = ModuleContext::new(extractor.clone());
        let mut task = tokio::spawn(async move { test.run(ctx).await });
        guard.body = Some(task.abort_handle());
        let joined = match self.timeouts.test_body {
            None => (&mut task).await,
            Some(limit) => {
                if let Ok(joined) = tokio::time::timeout(limit, &mut task).await {
                    joined
                } else {
                    task.abort();
                    return Err(TestBodyError::TimedOut {
                        after_ms: duration_millis(limit),
                    });
                }
            }
        };
        guard.body = None;
        joined.unwrap_or_else(|err| Err(TestBodyError::Panicked(join_failure(err))))
    }

    /// Destroys the instance, retrying until confirmed or attempts run out.
    async fn teardown(&self, target: &ModuleTarget) -> (u32, Result<(), TeardownError>) {
        let attempts = self.timeouts.destroy_attempts.max(1);
        let mut last_error = String::new();
        for attempt in 1 ..= attempts {
            let error =
                match tokio::time::timeout(self.timeouts.destroy, self.engine.destroy(target)).await {
                    Ok(Ok(())) => return (attempt, Ok(())),
                    Ok(Err(err)) => err.to_string(),
                    Err(_) => format!(
                        "destroy timed out after {} ms",
                        duration_millis(self.timeouts.destroy)
                    ),
                };
            self.audit.record(&LifecycleAuditEvent::destroy_retry(
                &self.run_id,
                &target.name,
                &target.instance,
                attempt,
                error.clone(),
            ));
            last_error = error;
            if attempt < attempts {
                tokio::time::sleep(self.timeouts.retry_backoff).await;
            }
        }
        (
            attempts,
            Err(TeardownError::Unconfirmed {
                module: target.name.clone(),
                attempts,
                last_error,
            }),
        )
    }
}

/// Folds a body result into the outcome's failures and assertions.
fn record_body(
    body: Result<AssertionSet, TestBodyError>,
    failures: &mut Vec<PhaseFailure>,
    assertions: &mut Vec<AssertionResult>,
) {
    match body {
        Ok(set) => {
            let (results, output_errors) = set.into_parts();
            failures.extend(
                output_errors.iter().map(|err| PhaseFailure::new(Phase::Output, err.to_string())),
            );
            failures.extend(
                results
                    .iter()
                    .filter(|result| !result.passed)
                    .map(|result| PhaseFailure::new(Phase::Assert, result.describe())),
            );
            *assertions = results;
        }
        Err(TestBodyError::Output(err)) => {
            failures.push(PhaseFailure::new(Phase::Output, err.to_string()));
        }
        Err(err) => failures.push(PhaseFailure::new(Phase::TestBody, err.to_string())),
    }
}

/// Extracts a readable message from a failed body task.
fn join_failure(err: JoinError) -> String {
    if !err.is_panic() {
        return "test body task was cancelled".to_string();
    }
    let payload = err.into_panic();
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

// ============================================================================
// SECTION: Teardown Guard
// ============================================================================

/// Owns the handle while a lifecycle is in flight.
///
/// Dropping an unsettled guard that may still hold resources launches a
/// detached destroy on the current runtime.
struct TeardownGuard<'a> {
    /// Manager driving the lifecycle.
    manager: &'a LifecycleManager,
    /// Handle being driven.
    handle: ModuleHandle,
    /// Extractor attached while provisioned.
    extractor: Option<OutputExtractor>,
    /// Running body task.
    body: Option<AbortHandle>,
    /// Set once teardown has reached a terminal state.
    settled: bool,
}

impl TeardownGuard<'_> {
    /// Advances the handle and audits the transition.
    fn transition(&mut self, next: LifecycleState, detail: Option<String>) {
        let from = self.handle.advance(next);
        let event = LifecycleAuditEvent::transition(
            &self.manager.run_id,
            self.handle.name(),
            self.handle.instance(),
            from,
            next,
        );
        let event = match detail {
            Some(detail) => event.with_detail(detail),
            None => event,
        };
        self.manager.audit.record(&event);
    }
}

impl Drop for TeardownGuard<'_> {
    fn drop(&mut self) {
        if self.settled || !self.handle.state().may_hold_resources() {
            return;
        }
        if let Some(extractor) = &self.extractor {
            extractor.retire();
        }
        if let Some(body) = &self.body {
            body.abort();
        }
        let manager = self.manager;
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            manager.audit.record(&LifecycleAuditEvent::teardown_on_drop(
                &manager.run_id,
                self.handle.name(),
                self.handle.instance(),
                self.handle.state(),
                "no runtime available; resources may leak",
            ));
            return;
        };
        manager.audit.record(&LifecycleAuditEvent::teardown_on_drop(
            &manager.run_id,
            self.handle.name(),
            self.handle.instance(),
            self.handle.state(),
            "lifecycle dropped before teardown; destroying in background",
        ));
        let engine = Arc::clone(&manager.engine);
        let audit = Arc::clone(&manager.audit);
        let run_id = manager.run_id.clone();
        let target = Arc::clone(self.handle.target());
        let limit = manager.timeouts.destroy;
        runtime.spawn(async move {
            let (to, detail) = match tokio::time::timeout(limit, engine.destroy(&target)).await {
                Ok(Ok(())) => {
                    (LifecycleState::Destroyed, "background destroy confirmed".to_string())
                }
                Ok(Err(err)) => (LifecycleState::LeakSuspected, err.to_string()),
                Err(_) => (
                    LifecycleState::LeakSuspected,
                    format!("destroy timed out after {} ms", duration_millis(limit)),
                ),
            };
            audit.record(&LifecycleAuditEvent::teardown_on_drop_finished(
                &run_id,
                &target.name,
                &target.instance,
                to,
                detail,
            ));
        });
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
