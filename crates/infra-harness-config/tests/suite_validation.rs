//! Suite semantics tests for infra-harness-config.
// crates/infra-harness-config/tests/suite_validation.rs
// =============================================================================
// Module: Suite Validation Tests
// Description: Validate module tables, isolation keys, timeouts, overrides.
// Purpose: Ensure inconsistent suites are rejected before provisioning.
// =============================================================================

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use infra_harness_config::AuditSinkConfig;
use infra_harness_config::ConfigError;
use infra_harness_config::EnvOverrides;
use infra_harness_config::SuiteConfig;
use infra_harness_core::Check;
use infra_harness_core::ConcurrentTestCoordinator;
use infra_harness_core::InMemoryEngine;
use infra_harness_core::ParamValue;
use infra_harness_core::RunId;

type TestResult = Result<(), String>;

const BUNDLED_SUITE: &str = include_str!("../../../suites/aws-modules.toml");

const MINIMAL: &str = r#"
[[modules]]
name = "s3"
source = "modules/s3"
isolate = ["bucket_name"]

[modules.vars]
bucket_name = "test-demo-bucket"

[[modules.expect]]
output = "bucket_name"
check = "contains"
value = "test-demo-bucket"
"#;

fn parse(content: &str) -> Result<SuiteConfig, ConfigError> {
    SuiteConfig::from_toml_str(content, Path::new("/suite"))
}

fn assert_invalid(content: &str, needle: &str) -> TestResult {
    match parse(content) {
        Err(error) => {
            let message = error.to_string();
            if message.contains(needle) {
                Ok(())
            } else {
                Err(format!("error {message} did not contain {needle}"))
            }
        }
        Ok(_) => Err(format!("expected suite to be rejected ({needle})")),
    }
}

// ============================================================================
// SECTION: Bundled Suite
// ============================================================================

#[test]
fn bundled_suite_checks_every_output_for_emptiness() -> TestResult {
    let config = parse(BUNDLED_SUITE).map_err(|err| err.to_string())?;

    for module in &config.modules {
        for expectation in &module.expect {
            let guarded = module.expect.iter().any(|other| {
                other.output == expectation.output && matches!(other.check, Check::NotEmpty)
            });
            if !guarded {
                return Err(format!(
                    "output {} of module {} has no not_empty check",
                    expectation.output, module.name
                ));
            }
        }
    }
    Ok(())
}

#[test]
fn bundled_suite_declares_five_modules() -> TestResult {
    let config = parse(BUNDLED_SUITE).map_err(|err| err.to_string())?;

    let names: Vec<&str> = config.modules.iter().map(|module| module.name.as_str()).collect();
    if names != ["iam", "s3", "lambda", "api_gateway", "ssm"] {
        return Err(format!("unexpected modules {}", names.join(",")));
    }
    if config.modules.iter().any(|module| module.expect.len() != 3 || module.isolate.len() != 1) {
        return Err("every module should isolate one name and carry three checks".to_string());
    }
    if config.run.audit == AuditSinkConfig::Stderr {
        return Err("bundled suite should audit to a file".to_string());
    }
    let specs = config.module_specs().map_err(|err| err.to_string())?;
    if specs.len() != 5 {
        return Err("expected five module specs".to_string());
    }
    Ok(())
}

#[test]
fn bundled_suite_isolates_resource_names_with_the_run_id() -> TestResult {
    let config = parse(BUNDLED_SUITE).map_err(|err| err.to_string())?;
    let run_id = RunId::parse("ci7").map_err(|err| err.to_string())?;
    let coordinator = ConcurrentTestCoordinator::new(
        Arc::new(InMemoryEngine::new()),
        config.coordinator_config(run_id),
    );

    let prepared = coordinator
        .prepare(config.module_specs().map_err(|err| err.to_string())?)
        .map_err(|err| err.to_string())?;

    let s3 = prepared
        .iter()
        .find(|module| module.handle.name().as_str() == "s3")
        .ok_or("s3 module missing")?;
    let target = s3.handle.target();
    if target.parameters.get("bucket_name").and_then(ParamValue::as_str)
        != Some("test-demo-bucket-ci7")
    {
        return Err("bucket name was not suffixed with the run id".to_string());
    }
    if target.parameters.get("force_destroy") != Some(&ParamValue::Bool(true)) {
        return Err("typed vars should survive isolation".to_string());
    }
    let lambda = prepared
        .iter()
        .find(|module| module.handle.name().as_str() == "lambda")
        .ok_or("lambda module missing")?;
    if lambda.handle.target().parameters.get("timeout") != Some(&ParamValue::Integer(5)) {
        return Err("integer vars should stay integers".to_string());
    }
    if lambda.handle.target().definition.as_path() != Path::new("/suite/../modules/lambda") {
        return Err("module source should resolve against the suite directory".to_string());
    }
    Ok(())
}

#[test]
fn bundled_suite_maps_run_settings() -> TestResult {
    let config = parse(BUNDLED_SUITE).map_err(|err| err.to_string())?;
    let run_id = RunId::parse("ci7").map_err(|err| err.to_string())?;

    let coordinator = config.coordinator_config(run_id);

    if coordinator.max_parallel.map(std::num::NonZeroUsize::get) != Some(5) {
        return Err("max_parallel not mapped".to_string());
    }
    if coordinator.timeouts.provision != Duration::from_secs(1800)
        || coordinator.timeouts.destroy_attempts != 3
        || coordinator.timeouts.test_body.is_some()
    {
        return Err("timeouts not mapped".to_string());
    }
    let options = config.terraform_options();
    if options.env.get("AWS_REGION").map(String::as_str) != Some("us-east-1") {
        return Err("terraform env not mapped".to_string());
    }
    if options.binary != Path::new("terraform") {
        return Err("bare binary name should stay a PATH lookup".to_string());
    }
    if options.retryable_errors.is_empty() {
        return Err("default retryable errors should apply".to_string());
    }
    Ok(())
}

// ============================================================================
// SECTION: Rejections
// ============================================================================

#[test]
fn suite_without_modules_is_rejected() -> TestResult {
    assert_invalid("[run]\nmax_parallel = 2\n", "at least one module")
}

#[test]
fn duplicate_module_names_are_rejected() -> TestResult {
    let content = format!("{MINIMAL}\n{MINIMAL}");
    assert_invalid(&content, "duplicate module name `s3`")
}

#[test]
fn malformed_module_name_is_rejected() -> TestResult {
    assert_invalid("[[modules]]\nname = \"S3 Bucket\"\nsource = \"m\"\n", "modules.name")
}

#[test]
fn isolated_key_must_be_set() -> TestResult {
    let content = "[[modules]]\nname = \"s3\"\nsource = \"m\"\nisolate = [\"bucket_name\"]\n";
    assert_invalid(content, "vars does not set it")
}

#[test]
fn isolated_key_must_be_a_string() -> TestResult {
    let content = "[[modules]]\nname = \"s3\"\nsource = \"m\"\nisolate = [\"count\"]\n\n[modules.vars]\ncount = 3\n";
    assert_invalid(content, "not a string")
}

#[test]
fn bad_match_pattern_is_rejected() -> TestResult {
    let content = "[[modules]]\nname = \"s3\"\nsource = \"m\"\n\n[[modules.expect]]\noutput = \"bucket_id\"\ncheck = \"matches\"\nvalue = \"([\"\n";
    assert_invalid(content, "modules.s3.expect")
}

#[test]
fn unknown_check_is_a_parse_error() -> TestResult {
    let content = "[[modules]]\nname = \"s3\"\nsource = \"m\"\n\n[[modules.expect]]\noutput = \"bucket_id\"\ncheck = \"starts_with\"\nvalue = \"x\"\n";
    assert_invalid(content, "config parse error")
}

#[test]
fn unknown_fields_are_rejected() -> TestResult {
    let content = format!("{MINIMAL}\n[run]\nparallelism = 4\n");
    assert_invalid(&content, "config parse error")
}

#[test]
fn zero_values_are_rejected() -> TestResult {
    assert_invalid(&format!("[timeouts]\nprovision_seconds = 0\n{MINIMAL}"), "provision_seconds")?;
    assert_invalid(&format!("[timeouts]\ndestroy_attempts = 0\n{MINIMAL}"), "destroy_attempts")?;
    assert_invalid(&format!("[timeouts]\ntest_seconds = 0\n{MINIMAL}"), "test_seconds")?;
    assert_invalid(&format!("[run]\nmax_parallel = 0\n{MINIMAL}"), "max_parallel")?;
    Ok(())
}

#[test]
fn malformed_run_id_is_rejected() -> TestResult {
    assert_invalid(&format!("[run]\nrun_id = \"Not Valid\"\n{MINIMAL}"), "run.run_id")
}

#[test]
fn bad_retryable_pattern_is_rejected() -> TestResult {
    assert_invalid(&format!("[terraform]\nretryable_errors = [\"(\"]\n{MINIMAL}"), "terraform:")
}

// ============================================================================
// SECTION: Overrides
// ============================================================================

#[test]
fn timeout_override_only_raises_timeouts() -> TestResult {
    let mut config = parse(&format!("[timeouts]\nprovision_seconds = 60\ndestroy_seconds = 7200\n{MINIMAL}"))
        .map_err(|err| err.to_string())?;
    let overrides = EnvOverrides {
        run_id: None,
        timeout: Some(Duration::from_secs(600)),
    };

    config.apply_overrides(&overrides).map_err(|err| err.to_string())?;

    if config.timeouts.provision_seconds != 600 || config.timeouts.destroy_seconds != 7200 {
        return Err("timeout override should act as a minimum".to_string());
    }
    Ok(())
}

#[test]
fn run_id_override_wins() -> TestResult {
    let mut config = parse(&format!("[run]\nrun_id = \"file1\"\n{MINIMAL}")).map_err(|err| err.to_string())?;
    let overrides = EnvOverrides {
        run_id: Some("env2".to_string()),
        timeout: None,
    };

    config.apply_overrides(&overrides).map_err(|err| err.to_string())?;

    let run_id = config.run_id().map_err(|err| err.to_string())?;
    if run_id.as_str() != "env2" {
        return Err(format!("expected env2, got {run_id}"));
    }
    Ok(())
}

#[test]
fn invalid_run_id_override_is_rejected() -> TestResult {
    let mut config = parse(MINIMAL).map_err(|err| err.to_string())?;
    let overrides = EnvOverrides {
        run_id: Some("UPPER".to_string()),
        timeout: None,
    };
    match config.apply_overrides(&overrides) {
        Err(err) if err.to_string().contains("INFRA_HARNESS_RUN_ID") => Ok(()),
        Err(err) => Err(format!("unexpected error {err}")),
        Ok(()) => Err("expected override to be rejected".to_string()),
    }
}

#[test]
fn generated_run_ids_differ() -> TestResult {
    let config = parse(MINIMAL).map_err(|err| err.to_string())?;
    let first = config.run_id().map_err(|err| err.to_string())?;
    let second = config.run_id().map_err(|err| err.to_string())?;
    if first == second {
        return Err("generated run ids should be fresh per call".to_string());
    }
    Ok(())
}

#[test]
fn file_audit_sink_is_created_under_the_suite_directory() -> TestResult {
    let dir = tempfile::tempdir().map_err(|err| err.to_string())?;
    let content = format!("[run]\naudit = {{ sink = \"file\", path = \"logs/audit.jsonl\" }}\n{MINIMAL}");
    let config = SuiteConfig::from_toml_str(&content, dir.path()).map_err(|err| err.to_string())?;

    config.audit_sink().map_err(|err| err.to_string())?;

    if !dir.path().join("logs/audit.jsonl").exists() {
        return Err("audit file should be created".to_string());
    }
    Ok(())
}
