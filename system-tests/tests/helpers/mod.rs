// system-tests/tests/helpers/mod.rs
// ============================================================================
// Module: System Test Helpers
// Description: Shared helpers for Infra Harness system-tests.
// Purpose: Provide artifact reporting, a scripted terraform, and suite loading.
// Dependencies: system-tests, infra-harness-config, infra-harness-core
// ============================================================================

//! ## Overview
//! Shared helpers for Infra Harness system-tests. Every suite loads the
//! bundled suite file so the tests exercise the same configuration CI uses.

#![allow(dead_code, reason = "Shared helpers are reused across multiple test suites.")]

pub mod artifacts;
pub mod fake_terraform;
pub mod suite;
