// system-tests/src/lib.rs
// ============================================================================
// Module: Infra Harness System Tests Library
// Description: Shared configuration for system test scenarios.
// Purpose: Provide common settings for the offline and live AWS suites.
// Dependencies: infra-harness-config
// ============================================================================

//! ## Overview
//! This crate hosts the environment-backed settings used by the system-test
//! binaries in `system-tests/tests`. The offline suite drives the bundled
//! suite file against a scripted terraform; the live suite provisions real
//! AWS resources and only runs when explicitly enabled.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
