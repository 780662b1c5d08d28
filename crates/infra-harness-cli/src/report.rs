// crates/infra-harness-cli/src/report.rs
// ============================================================================
// Module: Suite Report Rendering
// Description: Canonical JSON and markdown renderings of a suite report.
// Purpose: Persist run results for CI artifacts and human review.
// Dependencies: infra-harness-core, serde_jcs, thiserror
// ============================================================================

//! ## Overview
//! `report.json` is canonical JSON (JCS) so two reports of the same run
//! compare byte for byte. `report.md` lists every module with its verdict,
//! then every failed phase and failed assertion, most severe modules first.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use infra_harness_core::ModuleOutcome;
use infra_harness_core::OutcomeStatus;
use infra_harness_core::SuiteReport;
use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Report rendering or persistence failures.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Canonical serialization failed.
    #[error("failed to serialize report: {0}")]
    Serialize(String),
    /// Writing a report file failed.
    #[error("failed to write {path}: {error}")]
    Io {
        /// Target path.
        path: String,
        /// OS error text.
        error: String,
    },
}

// ============================================================================
// SECTION: Rendering
// ============================================================================

/// Renders the report as canonical JSON followed by a newline.
///
/// # Errors
///
/// Returns [`ReportError::Serialize`] when canonicalization fails.
pub fn canonical_json(report: &SuiteReport) -> Result<Vec<u8>, ReportError> {
    let mut bytes =
        serde_jcs::to_vec(report).map_err(|err| ReportError::Serialize(err.to_string()))?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// Renders a markdown summary of the report.
#[must_use]
pub fn render_markdown(report: &SuiteReport) -> String {
    let mut output = String::new();
    let total = report.modules.len();
    let failed = count(report, OutcomeStatus::Failed);
    let leaked = count(report, OutcomeStatus::LeakSuspected);
    let _ = writeln!(output, "# Infra Harness Report\n");
    let _ = writeln!(output, "- Run: `{}`", report.run_id);
    let _ = writeln!(output, "- Status: **{}**", report.status);
    let _ = writeln!(
        output,
        "- Modules: {total} ({} passed, {failed} failed, {leaked} leak suspected)\n",
        total - failed - leaked
    );
    let _ = writeln!(output, "| Module | Status | Final state | Teardown attempts | Duration (ms) |");
    let _ = writeln!(output, "| --- | --- | --- | --- | --- |");
    for outcome in ordered(report) {
        let _ = writeln!(
            output,
            "| {} | {} | {} | {} | {} |",
            outcome.module,
            outcome.status,
            outcome.final_state,
            outcome.teardown_attempts,
            outcome.duration_ms
        );
    }
    for outcome in ordered(report).into_iter().filter(|outcome| !outcome.passed()) {
        render_failures(&mut output, outcome);
    }
    if !report.leak_suspected_modules().is_empty() {
        let _ = writeln!(
            output,
            "\n> Teardown was not confirmed for some modules. Check the cloud account for \
             resources carrying the run id `{}`.",
            report.run_id
        );
    }
    output
}

/// Writes `report.json` and `report.md` into `dir`, creating it if needed.
///
/// # Errors
///
/// Returns [`ReportError`] when rendering or writing fails.
pub fn write_report(dir: &Path, report: &SuiteReport) -> Result<ReportPaths, ReportError> {
    fs::create_dir_all(dir).map_err(|err| io_error(dir, &err))?;
    let paths = ReportPaths {
        json: dir.join("report.json"),
        markdown: dir.join("report.md"),
    };
    fs::write(&paths.json, canonical_json(report)?).map_err(|err| io_error(&paths.json, &err))?;
    fs::write(&paths.markdown, render_markdown(report))
        .map_err(|err| io_error(&paths.markdown, &err))?;
    Ok(paths)
}

/// Files written by [`write_report`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportPaths {
    /// Canonical JSON report.
    pub json: PathBuf,
    /// Markdown summary.
    pub markdown: PathBuf,
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Number of modules with a given status.
fn count(report: &SuiteReport, status: OutcomeStatus) -> usize {
    report.modules.values().filter(|outcome| outcome.status == status).count()
}

/// Outcomes ordered by severity, then name.
fn ordered(report: &SuiteReport) -> Vec<&ModuleOutcome> {
    let mut outcomes: Vec<&ModuleOutcome> = report.modules.values().collect();
    outcomes.sort_by(|a, b| b.status.cmp(&a.status).then_with(|| a.module.cmp(&b.module)));
    outcomes
}

/// Appends the failure section of one module.
fn render_failures(output: &mut String, outcome: &ModuleOutcome) {
    let _ = writeln!(output, "\n## {} ({})\n", outcome.module, outcome.status);
    let _ = writeln!(output, "Instance `{}`.\n", outcome.instance);
    for failure in &outcome.failures {
        let _ = writeln!(output, "- **{}**: {}", failure.phase, single_line(&failure.detail));
    }
    for assertion in outcome.failed_assertions() {
        let _ = writeln!(
            output,
            "- assertion `{}` on `{}`: expected {}, got `{}` ({})",
            assertion.predicate,
            assertion.output.as_deref().unwrap_or("<value>"),
            assertion.expected,
            single_line(&assertion.subject),
            single_line(&assertion.message)
        );
    }
}

/// Collapses newlines so multi-line engine errors stay in one list item.
fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Formats an I/O error with its path.
fn io_error(path: &Path, err: &std::io::Error) -> ReportError {
    ReportError::Io {
        path: path.display().to_string(),
        error: err.to_string(),
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
#[path = "report_tests.rs"]
mod tests;
