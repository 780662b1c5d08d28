// crates/infra-harness-config/src/lib.rs
// ============================================================================
// Module: Infra Harness Config Library
// Description: Suite configuration model, validation, and env overrides.
// Purpose: Single source of truth for infra-harness.toml semantics.
// Dependencies: infra-harness-core, infra-harness-terraform, serde, toml
// ============================================================================

//! ## Overview
//! `infra-harness-config` loads a suite file describing which modules to
//! provision, with which variables, and what their outputs must satisfy.
//! Loading is strict and fail-closed: oversized, non-UTF-8, or inconsistent
//! files are rejected before any infrastructure is touched.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod env;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
pub use env::EnvOverrides;
pub use env::HarnessEnv;
