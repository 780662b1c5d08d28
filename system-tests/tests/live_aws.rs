// system-tests/tests/live_aws.rs
// ============================================================================
// Module: Live AWS Suite
// Description: Aggregates system tests that provision real AWS resources.
// Purpose: Keep cloud-touching coverage in a binary that is opt-in.
// Dependencies: suites/*, helpers
// ============================================================================

//! Live AWS suite entry point for system-tests.

#![cfg(unix)]

mod helpers;

#[path = "suites/live_aws.rs"]
mod live_aws;
