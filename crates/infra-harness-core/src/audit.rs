// crates/infra-harness-core/src/audit.rs
// ============================================================================
// Module: Infra Harness Audit Logging
// Description: Structured lifecycle and suite events.
// Purpose: Emit JSON-lines audit records for every state transition.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Every lifecycle transition, destroy retry, and suite boundary becomes a
//! JSON-lines record. Sinks never fail the run: serialization and write
//! errors are dropped so logging cannot change an outcome.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Serialize;

use crate::core::InstanceId;
use crate::core::LifecycleState;
use crate::core::ModuleName;
use crate::core::OutcomeStatus;
use crate::core::RunId;
use crate::core::SuiteReport;

/// Returns the current time in milliseconds since the Unix epoch.
fn now_millis() -> u128 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis()
}

// ============================================================================
// SECTION: Types
// ============================================================================

/// Lifecycle transition audit event.
#[derive(Debug, Clone, Serialize)]
pub struct LifecycleAuditEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Run identifier.
    pub run_id: RunId,
    /// Module name.
    pub module: ModuleName,
    /// Instance key.
    pub instance: InstanceId,
    /// State before the transition.
    pub from: LifecycleState,
    /// State after the transition.
    pub to: LifecycleState,
    /// Attempt number for retried operations.
    pub attempt: Option<u32>,
    /// Optional detail (error text or retry reason).
    pub detail: Option<String>,
}

impl LifecycleAuditEvent {
    /// Creates a state transition event.
    #[must_use]
    pub fn transition(
        run_id: &RunId,
        module: &ModuleName,
        instance: &InstanceId,
        from: LifecycleState,
        to: LifecycleState,
    ) -> Self {
        Self {
            event: "lifecycle_transition",
            timestamp_ms: now_millis(),
            run_id: run_id.clone(),
            module: module.clone(),
            instance: instance.clone(),
            from,
            to,
            attempt: None,
            detail: None,
        }
    }

    /// Creates a retry event for a failed destroy attempt.
    #[must_use]
    pub fn destroy_retry(
        run_id: &RunId,
        module: &ModuleName,
        instance: &InstanceId,
        attempt: u32,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            event: "destroy_attempt_failed",
            attempt: Some(attempt),
            detail: Some(detail.into()),
            ..Self::transition(
                run_id,
                module,
                instance,
                LifecycleState::Destroying,
                LifecycleState::Destroying,
            )
        }
    }

    /// Creates an event for a teardown launched because a lifecycle was dropped mid-flight.
    #[must_use]
    pub fn teardown_on_drop(
        run_id: &RunId,
        module: &ModuleName,
        instance: &InstanceId,
        from: LifecycleState,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            event: "teardown_on_drop",
            detail: Some(detail.into()),
            ..Self::transition(run_id, module, instance, from, LifecycleState::Destroying)
        }
    }

    /// Creates an event for the end of a teardown launched on drop.
    ///
    /// `to` is [`LifecycleState::Destroyed`] when destroy was confirmed and
    /// [`LifecycleState::LeakSuspected`] otherwise.
    #[must_use]
    pub fn teardown_on_drop_finished(
        run_id: &RunId,
        module: &ModuleName,
        instance: &InstanceId,
        to: LifecycleState,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            event: "teardown_on_drop_finished",
            detail: Some(detail.into()),
            ..Self::transition(run_id, module, instance, LifecycleState::Destroying, to)
        }
    }

    /// Attaches a detail string.
    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// Suite boundary audit event.
#[derive(Debug, Clone, Serialize)]
pub struct SuiteAuditEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Run identifier.
    pub run_id: RunId,
    /// Module names in the suite.
    pub modules: Vec<ModuleName>,
    /// Composite status (finish events only).
    pub status: Option<OutcomeStatus>,
    /// Modules that did not pass (finish events only).
    pub failed: Vec<ModuleName>,
    /// Modules whose teardown was not confirmed (finish events only).
    pub leak_suspected: Vec<ModuleName>,
}

impl SuiteAuditEvent {
    /// Creates a suite start event.
    #[must_use]
    pub fn started(run_id: &RunId, modules: Vec<ModuleName>) -> Self {
        Self {
            event: "suite_started",
            timestamp_ms: now_millis(),
            run_id: run_id.clone(),
            modules,
            status: None,
            failed: Vec::new(),
            leak_suspected: Vec::new(),
        }
    }

    /// Creates a suite finish event from a report.
    #[must_use]
    pub fn finished(report: &SuiteReport) -> Self {
        Self {
            event: "suite_finished",
            timestamp_ms: now_millis(),
            run_id: report.run_id.clone(),
            modules: report.modules.keys().cloned().collect(),
            status: Some(report.status),
            failed: report.failed_modules().into_iter().cloned().collect(),
            leak_suspected: report.leak_suspected_modules().into_iter().cloned().collect(),
        }
    }
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Audit sink for lifecycle and suite events.
pub trait LifecycleAuditSink: Send + Sync {
    /// Record a lifecycle event.
    fn record(&self, event: &LifecycleAuditEvent);

    /// Record a suite boundary event.
    fn record_suite(&self, _event: &SuiteAuditEvent) {}
}

/// Audit sink that drops every event.
pub struct NoopAuditSink;

impl LifecycleAuditSink for NoopAuditSink {
    fn record(&self, _event: &LifecycleAuditEvent) {}
}

/// Audit sink that logs JSON lines to stderr.
pub struct StderrAuditSink;

impl LifecycleAuditSink for StderrAuditSink {
    fn record(&self, event: &LifecycleAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }

    fn record_suite(&self, event: &SuiteAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }
}

/// Audit sink that logs JSON lines to a file.
pub struct FileAuditSink {
    /// File handle used for append-only logging.
    file: Mutex<std::fs::File>,
}

impl FileAuditSink {
    /// Opens the audit log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }

    /// Appends one serialized record.
    fn append<T: Serialize>(&self, event: &T) {
        if let Ok(payload) = serde_json::to_string(event)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

impl LifecycleAuditSink for FileAuditSink {
    fn record(&self, event: &LifecycleAuditEvent) {
        self.append(event);
    }

    fn record_suite(&self, event: &SuiteAuditEvent) {
        self.append(event);
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
