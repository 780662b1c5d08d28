// system-tests/tests/suites/live_aws.rs
// ============================================================================
// Module: Live AWS Tests
// Description: Bundled suite against real terraform and a real AWS account.
// Purpose: Validate the modules themselves, not just the harness.
// Dependencies: system-tests helpers
// ============================================================================

//! ## Overview
//! Skipped unless `INFRA_HARNESS_SYSTEM_TEST_LIVE` is true. Credentials come
//! from the usual AWS environment; the terraform binary and module directory
//! can be overridden through the system-test environment.

use std::time::Duration;

use helpers::artifacts::TestReporter;
use helpers::suite::load_bundled_suite;
use helpers::suite::run_suite;
use infra_harness_core::RunId;
use system_tests::config::SystemTestConfig;

use crate::helpers;

#[tokio::test(flavor = "multi_thread")]
async fn bundled_suite_against_aws() -> Result<(), Box<dyn std::error::Error>> {
    let mut reporter = TestReporter::new("bundled_suite_against_aws")?;
    let env = SystemTestConfig::load()?;
    if !env.live_enabled {
        reporter.finish("skipped", vec!["live suite not enabled".to_string()], Vec::new())?;
        return Ok(());
    }

    let mut config = load_bundled_suite(reporter.artifacts())?;
    if let Some(binary) = &env.terraform_binary {
        config.terraform.binary = binary.display().to_string();
    }
    if let Some(dir) = &env.modules_dir {
        let dir = std::path::absolute(dir)?;
        for module in &mut config.modules {
            module.source = dir.join(&module.name).display().to_string();
        }
    }
    for module in &config.modules {
        let definition = config.definition_for(module);
        if !definition.as_path().is_dir() {
            return Err(format!("module source {definition} does not exist").into());
        }
    }

    let run_id = RunId::generate();
    let report =
        run_suite(&config, run_id.as_str(), env.resolve_timeout(Duration::from_secs(3600))).await?;

    let leaked: Vec<String> =
        report.leak_suspected_modules().into_iter().map(ToString::to_string).collect();
    let failed: Vec<String> =
        report.failed_modules().into_iter().map(ToString::to_string).collect();
    let notes = vec![
        format!("run id {run_id}"),
        format!("failed modules: {}", failed.join(", ")),
        format!("leak suspected modules: {}", leaked.join(", ")),
    ];
    let status = if report.passed() { "pass" } else { "fail" };
    reporter.finish(status, notes, vec!["report/report.md".to_string()])?;
    if !report.passed() {
        return Err(format!("suite {} (failed: {})", report.status, failed.join(", ")).into());
    }
    Ok(())
}
