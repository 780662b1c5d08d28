// system-tests/tests/suites/offline_lifecycle.rs
// ============================================================================
// Module: Offline Lifecycle Tests
// Description: Bundled suite runs against a scripted terraform.
// Purpose: Validate isolation, fault containment, and guaranteed teardown.
// Dependencies: system-tests helpers
// ============================================================================

//! ## Overview
//! Runs the bundled five-module suite end to end with the real terraform
//! engine and coordinator; only the terraform binary is scripted. Faults
//! are injected into single modules to check the others are unaffected.

use std::time::Duration;

use helpers::artifacts::TestReporter;
use helpers::fake_terraform::count_calls;
use helpers::fake_terraform::fake_terraform;
use helpers::suite::load_bundled_suite;
use helpers::suite::run_suite;
use infra_harness_config::SuiteConfig;
use infra_harness_core::LifecycleState;
use infra_harness_core::OutcomeStatus;
use infra_harness_core::Phase;
use system_tests::config::SystemTestConfig;

use crate::helpers;

const MODULES: [&str; 5] = ["iam", "s3", "lambda", "api_gateway", "ssm"];

fn offline_suite(
    reporter: &TestReporter,
    faults: &[(&str, &str)],
) -> Result<SuiteConfig, Box<dyn std::error::Error>> {
    let mut config = load_bundled_suite(reporter.artifacts())?;
    config.terraform.binary = fake_terraform()?.display().to_string();
    config.terraform.retry_backoff_seconds = 0;
    config.timeouts.retry_backoff_seconds = 0;
    let log = reporter.artifacts().root().join("terraform.log");
    config.terraform.env.insert("FAKE_TF_LOG".to_string(), log.display().to_string());
    for (key, value) in faults {
        config.terraform.env.insert((*key).to_string(), (*value).to_string());
    }
    Ok(config)
}

fn suite_timeout() -> Result<Duration, Box<dyn std::error::Error>> {
    Ok(SystemTestConfig::load()?.resolve_timeout(Duration::from_secs(120)))
}

#[tokio::test(flavor = "multi_thread")]
async fn bundled_suite_passes_and_destroys_everything() -> Result<(), Box<dyn std::error::Error>> {
    let mut reporter = TestReporter::new("bundled_suite_passes_and_destroys_everything")?;
    let config = offline_suite(&reporter, &[])?;
    let log = reporter.artifacts().root().join("terraform.log");

    let report = run_suite(&config, "off1", suite_timeout()?).await?;

    assert!(report.passed(), "suite status {}", report.status);
    assert_eq!(report.modules.len(), MODULES.len());
    for module in MODULES {
        let outcome = report.get(module).ok_or("missing module outcome")?;
        assert_eq!(outcome.final_state, LifecycleState::Destroyed);
        assert_eq!(outcome.assertions.len(), 3);
        assert!(outcome.outputs.iter().any(|(_, value)| value.contains("-off1")));
        assert_eq!(count_calls(&log, module, "apply"), 1);
        assert_eq!(count_calls(&log, module, "destroy"), 1);
    }
    let bucket = report.get("s3").and_then(|outcome| outcome.outputs.get("bucket_name"));
    assert_eq!(bucket, Some("test-demo-bucket-off1"));
    let parameter = report.get("ssm").and_then(|outcome| outcome.outputs.get("parameter_name"));
    assert_eq!(parameter, Some("/test/config-off1"));
    assert!(config.report_dir().join("report.json").exists());

    reporter.finish(
        "pass",
        vec!["five modules provisioned, verified, and destroyed".to_string()],
        vec!["report/report.json".to_string(), "report/report.md".to_string()],
    )?;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn failed_apply_is_contained_to_one_module() -> Result<(), Box<dyn std::error::Error>> {
    let mut reporter = TestReporter::new("failed_apply_is_contained_to_one_module")?;
    let config = offline_suite(&reporter, &[("FAKE_TF_FAIL_APPLY", "lambda")])?;
    let log = reporter.artifacts().root().join("terraform.log");

    let report = run_suite(&config, "off2", suite_timeout()?).await?;

    assert_eq!(report.status, OutcomeStatus::Failed);
    let lambda = report.get("lambda").ok_or("missing lambda outcome")?;
    assert_eq!(lambda.status, OutcomeStatus::Failed);
    assert_eq!(lambda.failed_phases(), vec![Phase::Provision]);
    assert_eq!(lambda.final_state, LifecycleState::Destroyed);
    assert!(lambda.assertions.is_empty());
    for module in MODULES.iter().filter(|module| **module != "lambda") {
        let outcome = report.get(module).ok_or("missing module outcome")?;
        assert_eq!(outcome.status, OutcomeStatus::Passed, "module {module}");
        assert_eq!(count_calls(&log, module, "destroy"), 1);
    }

    reporter.finish(
        "pass",
        vec!["apply failure stayed inside the lambda module".to_string()],
        vec!["report/report.md".to_string()],
    )?;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn unconfirmed_destroy_flags_only_that_module() -> Result<(), Box<dyn std::error::Error>> {
    let mut reporter = TestReporter::new("unconfirmed_destroy_flags_only_that_module")?;
    let config = offline_suite(&reporter, &[("FAKE_TF_FAIL_DESTROY", "s3")])?;
    let log = reporter.artifacts().root().join("terraform.log");

    let report = run_suite(&config, "off3", suite_timeout()?).await?;

    assert_eq!(report.status, OutcomeStatus::LeakSuspected);
    let names: Vec<&str> =
        report.leak_suspected_modules().into_iter().map(|name| name.as_str()).collect();
    assert_eq!(names, vec!["s3"]);
    let s3 = report.get("s3").ok_or("missing s3 outcome")?;
    assert_eq!(s3.final_state, LifecycleState::LeakSuspected);
    assert_eq!(s3.teardown_attempts, config.timeouts.destroy_attempts);
    assert_eq!(count_calls(&log, "s3", "destroy"), 3);
    assert!(report.get("ssm").is_some_and(|outcome| outcome.passed()));

    reporter.finish(
        "pass",
        vec!["destroy failure flagged s3 as leak suspected".to_string()],
        vec!["report/report.md".to_string()],
    )?;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn serial_run_reaches_the_same_verdicts() -> Result<(), Box<dyn std::error::Error>> {
    let mut reporter = TestReporter::new("serial_run_reaches_the_same_verdicts")?;
    let mut config = offline_suite(&reporter, &[("FAKE_TF_FAIL_APPLY", "iam")])?;
    config.run.max_parallel = Some(1);

    let report = run_suite(&config, "off4", suite_timeout()?).await?;

    let failed: Vec<&str> = report.failed_modules().into_iter().map(|name| name.as_str()).collect();
    assert_eq!(failed, vec!["iam"]);
    assert!(report.modules.values().all(|outcome| outcome.final_state.is_terminal()));

    reporter.finish(
        "pass",
        vec!["max_parallel = 1 produced the same isolation".to_string()],
        Vec::new(),
    )?;
    Ok(())
}
