// crates/infra-harness-core/src/runtime/naming.rs
// ============================================================================
// Module: Resource Name Isolation
// Description: Run-scoped suffixing for externally visible resource names.
// Purpose: Keep concurrent runs against one backend namespace from colliding.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! Isolation is a naming discipline: every parameter that names a backend
//! resource carries the run id as a `-<run_id>` suffix. A value that already
//! ends with that suffix is left alone so suffixing is idempotent; the run id
//! appearing anywhere else in the value does not count.

use crate::core::RunId;

/// Returns `value` with `-<run_id>` appended unless it already ends with it.
#[must_use]
pub fn isolate_value(value: &str, run_id: &RunId) -> String {
    let already_isolated = value
        .strip_suffix(run_id.as_str())
        .is_some_and(|stem| stem.ends_with('-'));
    if already_isolated {
        value.to_string()
    } else {
        format!("{value}-{run_id}")
    }
}
