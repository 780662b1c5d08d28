// crates/infra-harness-terraform/src/outputs.rs
// ============================================================================
// Module: Output Parsing
// Description: Decodes `terraform output -json`.
// Purpose: Turn typed terraform outputs into the harness's string values.
// Dependencies: serde_json
// ============================================================================

//! ## Overview
//! `terraform output -json` prints an object keyed by output name whose
//! entries carry `value`, `type`, and `sensitive`. String values are kept
//! verbatim; every other value, `null` included, is rendered as compact JSON
//! so assertions can still match against it.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::command::TerraformError;

/// Parses every output value of an instance.
pub(crate) fn parse_outputs(stdout: &str) -> Result<BTreeMap<String, String>, TerraformError> {
    let trimmed = stdout.trim();
    if trimmed.is_empty() {
        return Ok(BTreeMap::new());
    }
    let parsed: Value =
        serde_json::from_str(trimmed).map_err(|err| TerraformError::Output(err.to_string()))?;
    let Value::Object(entries) = parsed else {
        return Err(TerraformError::Output("expected a JSON object".to_string()));
    };
    entries
        .into_iter()
        .map(|(name, entry)| {
            let value = entry
                .get("value")
                .ok_or_else(|| TerraformError::Output(format!("output `{name}` has no value")))?;
            Ok((name, render(value)))
        })
        .collect()
}

/// Renders one output value.
fn render(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test-only assertions favor direct unwrap/expect for clarity."
    )]

    use super::parse_outputs;

    #[test]
    fn strings_are_verbatim_and_others_json() {
        let stdout = r#"{
            "bucket_name": {"sensitive": false, "type": "string", "value": "demo-r1"},
            "tags": {"sensitive": false, "type": ["map", "string"], "value": {"env": "test"}},
            "count": {"sensitive": false, "type": "number", "value": 2},
            "unset": {"sensitive": false, "type": "string", "value": null}
        }"#;

        let outputs = parse_outputs(stdout).unwrap();

        assert_eq!(outputs["bucket_name"], "demo-r1");
        assert_eq!(outputs["tags"], r#"{"env":"test"}"#);
        assert_eq!(outputs["count"], "2");
        assert_eq!(outputs["unset"], "null");
    }

    #[test]
    fn null_is_distinct_from_an_empty_string() {
        let stdout = r#"{
            "unset": {"sensitive": false, "type": "string", "value": null},
            "blank": {"sensitive": false, "type": "string", "value": ""}
        }"#;

        let outputs = parse_outputs(stdout).unwrap();

        assert_eq!(outputs["unset"], "null");
        assert_eq!(outputs["blank"], "");
    }

    #[test]
    fn empty_output_means_no_outputs() {
        assert!(parse_outputs("").unwrap().is_empty());
        assert!(parse_outputs("{}\n").unwrap().is_empty());
    }

    #[test]
    fn non_object_is_rejected() {
        assert!(parse_outputs("[1, 2]").is_err());
        assert!(parse_outputs(r#"{"a": {"type": "string"}}"#).is_err());
    }
}
