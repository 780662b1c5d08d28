// system-tests/tests/helpers/suite.rs
// ============================================================================
// Module: Bundled Suite Helpers
// Description: Load the bundled AWS suite and run it under test settings.
// Purpose: Keep every system test on the suite file CI actually uses.
// Dependencies: infra-harness-cli, infra-harness-config, infra-harness-core
// ============================================================================

use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use infra_harness_cli::report::write_report;
use infra_harness_config::AuditSinkConfig;
use infra_harness_config::SuiteConfig;
use infra_harness_core::ConcurrentTestCoordinator;
use infra_harness_core::RunId;
use infra_harness_core::SuiteReport;
use infra_harness_terraform::TerraformEngine;

use super::artifacts::TestArtifacts;

/// Path of the bundled suite file.
pub fn bundled_suite_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../suites/aws-modules.toml")
}

/// Loads the bundled suite and points its outputs at the test artifact root.
pub fn load_bundled_suite(artifacts: &TestArtifacts) -> Result<SuiteConfig, String> {
    let mut config =
        SuiteConfig::load(Some(&bundled_suite_path())).map_err(|err| err.to_string())?;
    config.run.report_dir = artifacts.report_dir().display().to_string();
    config.run.audit = AuditSinkConfig::File {
        path: artifacts.report_dir().join("audit.jsonl").display().to_string(),
    };
    config.terraform.work_root = artifacts.work_dir().display().to_string();
    Ok(config)
}

/// Runs every module of `config` under `run_id` and persists the report.
pub async fn run_suite(
    config: &SuiteConfig,
    run_id: &str,
    timeout: Duration,
) -> Result<SuiteReport, String> {
    config.validate().map_err(|err| err.to_string())?;
    let run_id = RunId::parse(run_id).map_err(|err| err.to_string())?;
    let engine = TerraformEngine::new(config.terraform_options()).map_err(|err| err.to_string())?;
    let audit = config.audit_sink().map_err(|err| err.to_string())?;
    let specs = config.module_specs().map_err(|err| err.to_string())?;
    let coordinator =
        ConcurrentTestCoordinator::new(Arc::new(engine), config.coordinator_config(run_id))
            .with_audit(audit);
    let report = tokio::time::timeout(timeout, coordinator.run_all(specs))
        .await
        .map_err(|_| format!("suite did not finish within {}s", timeout.as_secs()))?
        .map_err(|err| err.to_string())?;
    write_report(&config.report_dir(), &report).map_err(|err| err.to_string())?;
    Ok(report)
}
