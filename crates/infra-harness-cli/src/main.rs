// crates/infra-harness-cli/src/main.rs
// ============================================================================
// Module: Infra Harness CLI Entry Point
// Description: Command dispatcher for suite runs and suite checks.
// Purpose: Provision, verify, and tear down the modules a suite file lists.
// Dependencies: clap, infra-harness-config, infra-harness-core, tokio
// ============================================================================

//! ## Overview
//! `infra-harness run` loads a suite file, provisions every module through
//! terraform, checks their outputs, tears everything down, and writes a
//! report. `infra-harness check` validates a suite and prints the resolved
//! plan without touching any infrastructure.
//!
//! Exit codes: 0 when every module passed, 1 when any module failed or may
//! have leaked resources, 2 when the run could not start.

// ============================================================================
// SECTION: Modules
// ============================================================================


// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt::Write as _;
use std::io::Write;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Args;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use infra_harness_cli::report::canonical_json;
use infra_harness_cli::report::render_markdown;
use infra_harness_cli::report::write_report;
use infra_harness_config::EnvOverrides;
use infra_harness_config::SuiteConfig;
use infra_harness_core::ConcurrentTestCoordinator;
use infra_harness_core::PreparedModule;
use infra_harness_core::RunId;
use infra_harness_core::SuiteReport;
use infra_harness_terraform::TerraformEngine;
use thiserror::Error;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "infra-harness", version, disable_help_subcommand = true)]
struct Cli {
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Provision, verify, and destroy every module in a suite.
    Run(RunCommand),
    /// Validate a suite and print the resolved plan.
    Check(CheckCommand),
}

/// Suite selection shared by every command.
#[derive(Args, Debug)]
struct SuiteArgs {
    /// Suite file (defaults to `INFRA_HARNESS_CONFIG`, then `infra-harness.toml`).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Run id appended to isolated resource names.
    #[arg(long, value_name = "ID")]
    run_id: Option<String>,
}

/// Arguments for `run`.
#[derive(Args, Debug)]
struct RunCommand {
    /// Suite selection.
    #[command(flatten)]
    suite: SuiteArgs,
    /// Maximum modules running at once.
    #[arg(long, value_name = "N")]
    max_parallel: Option<NonZeroUsize>,
    /// Directory receiving `report.json` and `report.md`.
    #[arg(long, value_name = "DIR")]
    report_dir: Option<PathBuf>,
    /// Report format printed to stdout.
    #[arg(long, value_enum, default_value_t = ReportFormat::Markdown)]
    format: ReportFormat,
}

/// Arguments for `check`.
#[derive(Args, Debug)]
struct CheckCommand {
    /// Suite selection.
    #[command(flatten)]
    suite: SuiteArgs,
}

/// Output formats for the run report.
#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
enum ReportFormat {
    /// Canonical JSON output.
    Json,
    /// Markdown summary output.
    Markdown,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper for user-facing messages.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`].
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

/// Exit code when the run could not start or the report could not be written.
const EXIT_USAGE: u8 = 2;
/// Exit code when any module did not pass.
const EXIT_FAILED: u8 = 1;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
async fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Run(command) => command_run(command).await,
        Commands::Check(command) => command_check(&command),
    }
}

// ============================================================================
// SECTION: Run Command
// ============================================================================

/// Executes the `run` command.
async fn command_run(command: RunCommand) -> CliResult<ExitCode> {
    let mut config = load_suite(&command.suite)?;
    if let Some(max_parallel) = command.max_parallel {
        config.run.max_parallel = Some(max_parallel.get());
    }
    let run_id = resolve_run_id(&command.suite, &config)?;
    let engine = TerraformEngine::new(config.terraform_options())
        .map_err(|err| CliError::new(format!("failed to configure terraform: {err}")))?;
    let audit = config
        .audit_sink()
        .map_err(|err| CliError::new(format!("failed to open audit sink: {err}")))?;
    let specs = config.module_specs().map_err(|err| CliError::new(err.to_string()))?;
    let coordinator =
        ConcurrentTestCoordinator::new(Arc::new(engine), config.coordinator_config(run_id))
            .with_audit(audit);

    let report = coordinator
        .run_all(specs)
        .await
        .map_err(|err| CliError::new(format!("suite rejected: {err}")))?;

    let report_dir = command.report_dir.unwrap_or_else(|| config.report_dir());
    write_report(&report_dir, &report).map_err(|err| CliError::new(err.to_string()))?;
    emit_report(&report, command.format)?;
    Ok(exit_code(&report))
}

/// Prints the report in the requested format.
fn emit_report(report: &SuiteReport, format: ReportFormat) -> CliResult<()> {
    let bytes = match format {
        ReportFormat::Json => canonical_json(report).map_err(|err| CliError::new(err.to_string()))?,
        ReportFormat::Markdown => render_markdown(report).into_bytes(),
    };
    write_stdout_bytes(&bytes).map_err(|err| CliError::new(output_error("stdout", &err)))
}

/// Maps a report to the process exit code.
fn exit_code(report: &SuiteReport) -> ExitCode {
    if report.passed() { ExitCode::SUCCESS } else { ExitCode::from(EXIT_FAILED) }
}

// ============================================================================
// SECTION: Check Command
// ============================================================================

/// Executes the `check` command.
fn command_check(command: &CheckCommand) -> CliResult<ExitCode> {
    let config = load_suite(&command.suite)?;
    let run_id = resolve_run_id(&command.suite, &config)?;
    let engine = TerraformEngine::new(config.terraform_options())
        .map_err(|err| CliError::new(format!("failed to configure terraform: {err}")))?;
    let specs = config.module_specs().map_err(|err| CliError::new(err.to_string()))?;
    let coordinator =
        ConcurrentTestCoordinator::new(Arc::new(engine), config.coordinator_config(run_id));
    let prepared = coordinator
        .prepare(specs)
        .map_err(|err| CliError::new(format!("suite rejected: {err}")))?;
    let plan = render_plan(coordinator.run_id(), &config, &prepared);
    write_stdout_bytes(plan.as_bytes()).map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

/// Renders the resolved plan for `check`.
fn render_plan(run_id: &RunId, config: &SuiteConfig, prepared: &[PreparedModule]) -> String {
    let mut output = format!("suite ok: {} module(s), run id `{run_id}`\n", prepared.len());
    for (module, table) in prepared.iter().zip(&config.modules) {
        let target = module.handle.target();
        let _ = write!(
            output,
            "\n{} ({})\n  source: {}\n  checks: {}\n",
            target.name,
            target.instance,
            target.definition,
            table.expect.len()
        );
        for key in &table.isolate {
            if let Some(value) = target.parameters.get(key) {
                let _ = writeln!(output, "  {key} = {}", value.to_plain_string());
            }
        }
    }
    output
}

// ============================================================================
// SECTION: Shared Helpers
// ============================================================================

/// Loads the suite and applies environment overrides.
fn load_suite(args: &SuiteArgs) -> CliResult<SuiteConfig> {
    let mut config = SuiteConfig::load(args.config.as_deref())
        .map_err(|err| CliError::new(format!("failed to load suite: {err}")))?;
    let overrides = EnvOverrides::load().map_err(CliError::new)?;
    config
        .apply_overrides(&overrides)
        .map_err(|err| CliError::new(format!("failed to load suite: {err}")))?;
    Ok(config)
}

/// Picks the run id: flag, then environment or suite file, then generated.
fn resolve_run_id(args: &SuiteArgs, config: &SuiteConfig) -> CliResult<RunId> {
    match &args.run_id {
        Some(value) => RunId::parse(value.as_str())
            .map_err(|err| CliError::new(format!("invalid --run-id: {err}"))),
        None => config.run_id().map_err(|err| CliError::new(err.to_string())),
    }
}

/// Writes raw bytes to stdout without adding a newline.
fn write_stdout_bytes(bytes: &[u8]) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    stdout.write_all(bytes)?;
    stdout.flush()
}

/// Writes a line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats an output error message.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    format!("failed to write to {stream}: {error}")
}

/// Emits an error message to stderr and returns the usage exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(&format!("error: {message}"));
    ExitCode::from(EXIT_USAGE)
}
