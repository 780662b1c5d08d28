// crates/infra-harness-cli/src/lib.rs
// ============================================================================
// Module: Infra Harness CLI Library
// Description: Shared helpers for the infra-harness command-line interface.
// Purpose: Provide report rendering for the CLI binary and tests.
// Dependencies: infra-harness-core, serde_jcs, thiserror
// ============================================================================

//! ## Overview
//! This library houses the pieces of the CLI that are worth testing without
//! spawning the binary: rendering a suite report as canonical JSON and as a
//! markdown summary, and writing both into a report directory.

// ============================================================================
// SECTION: Modules
// ============================================================================

/// Suite report rendering and persistence.
pub mod report;
