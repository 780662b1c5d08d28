// crates/infra-harness-terraform/src/lib.rs
// ============================================================================
// Module: Infra Harness Terraform
// Description: Provisioning engine that drives the terraform CLI.
// Purpose: Provision, read, and destroy real modules with per-instance state.
// Dependencies: infra-harness-core, regex, serde_json, tokio
// ============================================================================

//! ## Overview
//! [`TerraformEngine`] implements the harness provisioning contract on top of
//! the `terraform` binary. Every module instance gets a private workspace
//! directory holding its variables file, local state, and plugin data, so two
//! instances of the same definition never share state. Applies failing with
//! a known transient error are retried.

// ============================================================================
// SECTION: Modules
// ============================================================================

mod command;
pub mod engine;
mod outputs;
mod workspace;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use command::TerraformError;
pub use engine::DEFAULT_RETRYABLE_ERRORS;
pub use engine::TerraformEngine;
pub use engine::TerraformOptions;
