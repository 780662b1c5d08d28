// crates/infra-harness-core/src/runtime/lifecycle_tests.rs
// ============================================================================
// Module: Lifecycle Manager Unit Tests
// Description: Exit-path coverage for provision, body, and teardown failures.
// Purpose: Ensure teardown runs on every path and failures are attributed.
// Dependencies: tokio
// ============================================================================

//! ## Overview
//! Drives single lifecycles against the in-memory engine with injected
//! faults, checking the final state, phase attribution, and audit trail.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    reason = "Test-only assertions favor direct unwrap/expect for clarity."
)]

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::time::Duration;

use async_trait::async_trait;

use super::LifecycleManager;
use super::LifecycleTimeouts;
use crate::audit::LifecycleAuditEvent;
use crate::audit::LifecycleAuditSink;
use crate::core::InstanceId;
use crate::core::LifecycleState;
use crate::core::ModuleDefinitionRef;
use crate::core::ModuleHandle;
use crate::core::ModuleName;
use crate::core::ModuleTarget;
use crate::core::OutcomeStatus;
use crate::core::ParameterSet;
use crate::core::Phase;
use crate::core::RunId;
use crate::interfaces::ModuleTest;
use crate::interfaces::TestBodyError;
use crate::runtime::AssertionSet;
use crate::runtime::Check;
use crate::runtime::ExpectationSet;
use crate::runtime::InMemoryEngine;
use crate::runtime::ModuleBlueprint;
use crate::runtime::ModuleContext;
use crate::runtime::OutputError;

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Audit sink that keeps every event.
#[derive(Default)]
struct RecordingSink {
    events: Mutex<Vec<LifecycleAuditEvent>>,
}

impl RecordingSink {
    fn events(&self) -> Vec<LifecycleAuditEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl LifecycleAuditSink for RecordingSink {
    fn record(&self, event: &LifecycleAuditEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

struct PanicBody;

#[async_trait]
impl ModuleTest for PanicBody {
    async fn run(&self, ctx: ModuleContext) -> Result<AssertionSet, TestBodyError> {
        if ctx.name().as_str() == "s3" {
            panic!("boom");
        }
        Ok(AssertionSet::new())
    }
}

struct SleepBody(Duration);

#[async_trait]
impl ModuleTest for SleepBody {
    async fn run(&self, _ctx: ModuleContext) -> Result<AssertionSet, TestBodyError> {
        tokio::time::sleep(self.0).await;
        Ok(AssertionSet::new())
    }
}

/// Keeps the context so it can be used after the lifecycle ends.
struct StashBody(Arc<Mutex<Option<ModuleContext>>>);

#[async_trait]
impl ModuleTest for StashBody {
    async fn run(&self, ctx: ModuleContext) -> Result<AssertionSet, TestBodyError> {
        let value = ctx.output("bucket_id").await?;
        *self.0.lock().unwrap() = Some(ctx);
        let mut set = AssertionSet::new();
        set.check("bucket_id", &value, &Check::NotEmpty);
        Ok(set)
    }
}

struct FlagBody(Arc<AtomicBool>);

#[async_trait]
impl ModuleTest for FlagBody {
    async fn run(&self, _ctx: ModuleContext) -> Result<AssertionSet, TestBodyError> {
        self.0.store(true, Ordering::SeqCst);
        Ok(AssertionSet::new())
    }
}

fn engine() -> InMemoryEngine {
    InMemoryEngine::new().with_blueprint(
        "modules/s3",
        ModuleBlueprint::new()
            .output("bucket_id", "{bucket_name}")
            .output("bucket_name", "{bucket_name}")
            .resource("s3:{bucket_name}"),
    )
}

fn handle() -> ModuleHandle {
    let name = ModuleName::parse("s3").unwrap();
    let run_id = RunId::parse("t1").unwrap();
    ModuleHandle::new(ModuleTarget {
        instance: InstanceId::derive(&name, &run_id),
        name,
        definition: ModuleDefinitionRef::from("modules/s3"),
        parameters: ParameterSet::new().with("bucket_name", "test-demo-bucket-t1"),
    })
}

fn fast_timeouts() -> LifecycleTimeouts {
    LifecycleTimeouts {
        retry_backoff: Duration::from_millis(1),
        ..LifecycleTimeouts::default()
    }
}

fn manager(engine: Arc<InMemoryEngine>, sink: Arc<RecordingSink>) -> LifecycleManager {
    LifecycleManager::new(engine, RunId::parse("t1").unwrap())
        .with_timeouts(fast_timeouts())
        .with_audit(sink)
}

fn storage_expectations() -> Arc<ExpectationSet> {
    Arc::new(ExpectationSet::default().expect("bucket_id", Check::NotEmpty).expect(
        "bucket_name",
        Check::Contains {
            value: "test-demo-bucket".to_string(),
        },
    ))
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[tokio::test]
async fn passing_module_ends_destroyed_with_audit_trail() {
    let engine = Arc::new(engine());
    let sink = Arc::new(RecordingSink::default());

    let outcome = manager(engine.clone(), sink.clone()).run(handle(), storage_expectations()).await;

    assert_eq!(outcome.status, OutcomeStatus::Passed);
    assert_eq!(outcome.final_state, LifecycleState::Destroyed);
    assert_eq!(outcome.teardown_attempts, 1);
    assert_eq!(outcome.assertions.len(), 2);
    assert_eq!(outcome.outputs.get("bucket_id"), Some("test-demo-bucket-t1"));
    assert_eq!(engine.destroy_calls("s3-t1"), 1);
    assert!(!engine.is_deployed("s3-t1"));

    let transitions: Vec<(LifecycleState, LifecycleState)> =
        sink.events().iter().map(|event| (event.from, event.to)).collect();
    assert_eq!(transitions, vec![
        (LifecycleState::Idle, LifecycleState::Provisioning),
        (LifecycleState::Provisioning, LifecycleState::Provisioned),
        (LifecycleState::Provisioned, LifecycleState::Testing),
        (LifecycleState::Testing, LifecycleState::Destroying),
        (LifecycleState::Destroying, LifecycleState::Destroyed),
    ]);
}

#[tokio::test]
async fn failed_provision_skips_body_but_still_destroys() {
    let engine = Arc::new(engine().fail_apply_for("s3"));
    let ran = Arc::new(AtomicBool::new(false));

    let outcome = manager(engine.clone(), Arc::default())
        .run(handle(), Arc::new(FlagBody(ran.clone())))
        .await;

    assert!(!ran.load(Ordering::SeqCst));
    assert_eq!(outcome.status, OutcomeStatus::Failed);
    assert_eq!(outcome.failed_phases(), vec![Phase::Provision]);
    assert_eq!(outcome.final_state, LifecycleState::Destroyed);
    assert!(outcome.outputs.is_empty());
    assert_eq!(engine.destroy_calls("s3-t1"), 1);
    assert!(!engine.is_deployed("s3-t1"));
}

#[tokio::test]
async fn teardown_failure_outranks_and_keeps_assertion_failure() {
    let engine = Arc::new(engine().fail_destroy_for("s3", 10));
    let sink = Arc::new(RecordingSink::default());
    let test = Arc::new(ExpectationSet::default().expect("bucket_name", Check::Equals {
        value: "other".to_string(),
    }));
    let manager = LifecycleManager::new(engine.clone(), RunId::parse("t1").unwrap())
        .with_timeouts(LifecycleTimeouts {
            destroy_attempts: 2,
            ..fast_timeouts()
        })
        .with_audit(sink.clone());

    let outcome = manager.run(handle(), test).await;

    assert_eq!(outcome.status, OutcomeStatus::LeakSuspected);
    assert_eq!(outcome.final_state, LifecycleState::LeakSuspected);
    assert_eq!(outcome.failed_phases(), vec![Phase::Assert, Phase::Teardown]);
    assert_eq!(outcome.teardown_attempts, 2);
    assert_eq!(engine.destroy_calls("s3-t1"), 2);
    let retries = sink.events().iter().filter(|event| event.event == "destroy_attempt_failed").count();
    assert_eq!(retries, 2);
}

#[tokio::test]
async fn destroy_retry_recovers_from_transient_failure() {
    let engine = Arc::new(engine().fail_destroy_for("s3", 1));

    let outcome = manager(engine.clone(), Arc::default()).run(handle(), storage_expectations()).await;

    assert_eq!(outcome.status, OutcomeStatus::Passed);
    assert_eq!(outcome.teardown_attempts, 2);
    assert!(!engine.is_deployed("s3-t1"));
}

#[tokio::test]
async fn panicking_body_is_a_failure_and_still_tears_down() {
    let engine = Arc::new(engine());

    let outcome = manager(engine.clone(), Arc::default()).run(handle(), Arc::new(PanicBody)).await;

    assert_eq!(outcome.status, OutcomeStatus::Failed);
    let failure = outcome.failures_in(Phase::TestBody).next().unwrap();
    assert!(failure.detail.contains("boom"), "{}", failure.detail);
    assert_eq!(outcome.final_state, LifecycleState::Destroyed);
    assert!(!engine.is_deployed("s3-t1"));
}

#[tokio::test(start_paused = true)]
async fn body_timeout_is_a_failure_and_still_tears_down() {
    let engine = Arc::new(engine());
    let manager = LifecycleManager::new(engine.clone(), RunId::parse("t1").unwrap()).with_timeouts(
        LifecycleTimeouts {
            test_body: Some(Duration::from_secs(5)),
            ..fast_timeouts()
        },
    );

    let outcome = manager.run(handle(), Arc::new(SleepBody(Duration::from_secs(3600)))).await;

    let failure = outcome.failures_in(Phase::TestBody).next().unwrap();
    assert!(failure.detail.contains("timed out after 5000 ms"), "{}", failure.detail);
    assert_eq!(outcome.final_state, LifecycleState::Destroyed);
    assert_eq!(engine.destroy_calls("s3-t1"), 1);
}

#[tokio::test(start_paused = true)]
async fn provision_timeout_is_a_provision_failure() {
    let engine = Arc::new(engine().delay_apply_for("s3", Duration::from_secs(3600)));
    let manager = LifecycleManager::new(engine.clone(), RunId::parse("t1").unwrap()).with_timeouts(
        LifecycleTimeouts {
            provision: Duration::from_secs(10),
            ..fast_timeouts()
        },
    );

    let outcome = manager.run(handle(), storage_expectations()).await;

    let failure = outcome.failures_in(Phase::Provision).next().unwrap();
    assert!(failure.detail.contains("timed out"), "{}", failure.detail);
    assert_eq!(engine.apply_calls("s3-t1"), 0);
    assert_eq!(engine.destroy_calls("s3-t1"), 1);
}

#[tokio::test(start_paused = true)]
async fn slow_destroy_is_retried_then_flagged() {
    let engine = Arc::new(engine().delay_destroy_for("s3", Duration::from_secs(3600)));
    let manager = LifecycleManager::new(engine.clone(), RunId::parse("t1").unwrap()).with_timeouts(
        LifecycleTimeouts {
            destroy: Duration::from_secs(30),
            destroy_attempts: 3,
            ..fast_timeouts()
        },
    );

    let outcome = manager.run(handle(), storage_expectations()).await;

    assert_eq!(outcome.status, OutcomeStatus::LeakSuspected);
    assert_eq!(outcome.teardown_attempts, 3);
    let failure = outcome.failures_in(Phase::Teardown).next().unwrap();
    assert!(failure.detail.contains("destroy timed out"), "{}", failure.detail);
}

#[tokio::test]
async fn outputs_are_refused_after_teardown() {
    let engine = Arc::new(engine());
    let stash = Arc::new(Mutex::new(None));

    let outcome =
        manager(engine.clone(), Arc::default()).run(handle(), Arc::new(StashBody(stash.clone()))).await;
    assert!(outcome.passed());

    let ctx = stash.lock().unwrap().take().unwrap();
    let err = ctx.output("bucket_id").await.unwrap_err();
    assert!(matches!(err, OutputError::NotProvisioned { .. }));
}

#[tokio::test]
async fn missing_output_is_an_output_phase_failure() {
    let engine = Arc::new(engine());
    let test = Arc::new(
        ExpectationSet::default()
            .expect("bucket_id", Check::NotEmpty)
            .expect("bucket_region", Check::NotEmpty),
    );

    let outcome = manager(engine, Arc::default()).run(handle(), test).await;

    assert_eq!(outcome.status, OutcomeStatus::Failed);
    assert_eq!(outcome.failed_phases(), vec![Phase::Output]);
    assert_eq!(outcome.assertions.len(), 1);
    assert!(outcome.assertions[0].passed);
}

#[tokio::test(start_paused = true)]
async fn dropping_the_run_future_destroys_in_background() {
    let engine = Arc::new(engine());
    let sink = Arc::new(RecordingSink::default());
    let manager = manager(engine.clone(), sink.clone());

    let run = manager.run(handle(), Arc::new(SleepBody(Duration::from_secs(3600))));
    let result = tokio::time::timeout(Duration::from_secs(1), run).await;
    assert!(result.is_err());
    tokio::time::sleep(Duration::from_millis(10)).await;

    assert_eq!(engine.destroy_calls("s3-t1"), 1);
    assert!(!engine.is_deployed("s3-t1"));
    let events = sink.events();
    assert!(events.iter().any(|event| event.event == "teardown_on_drop"));
    let finished = events.iter().find(|event| event.event == "teardown_on_drop_finished").unwrap();
    assert_eq!(finished.to, LifecycleState::Destroyed);
}

#[tokio::test(start_paused = true)]
async fn failed_background_destroy_is_audited_as_leak_suspected() {
    let engine = Arc::new(engine().fail_destroy_for("s3", 1));
    let sink = Arc::new(RecordingSink::default());
    let manager = manager(engine.clone(), sink.clone());

    let run = manager.run(handle(), Arc::new(SleepBody(Duration::from_secs(3600))));
    let result = tokio::time::timeout(Duration::from_secs(1), run).await;
    assert!(result.is_err());
    tokio::time::sleep(Duration::from_millis(10)).await;

    assert_eq!(engine.destroy_calls("s3-t1"), 1);
    assert!(engine.is_deployed("s3-t1"));
    let events = sink.events();
    let finished = events.iter().find(|event| event.event == "teardown_on_drop_finished").unwrap();
    assert_eq!(finished.to, LifecycleState::LeakSuspected);
    assert_eq!(finished.from, LifecycleState::Destroying);
    assert!(finished.detail.as_deref().is_some_and(|detail| !detail.is_empty()));
}
