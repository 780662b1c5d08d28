// crates/infra-harness-core/src/core/parameters.rs
// ============================================================================
// Module: Infra Harness Parameters
// Description: Typed parameter sets passed to infrastructure modules.
// Purpose: Represent module inputs with a stable JSON form for engines.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! A [`ParameterSet`] maps parameter names to typed values. The harness does
//! not check sets against a module's declared inputs; the provisioning engine
//! rejects unknown or missing parameters when the module is applied.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

// ============================================================================
// SECTION: Parameter Values
// ============================================================================

/// A single module parameter value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// Boolean flag.
    Bool(bool),
    /// Signed integer.
    Integer(i64),
    /// UTF-8 string.
    String(String),
    /// Nested structured value (lists, maps, floats).
    Structured(Value),
}

impl ParamValue {
    /// Returns the string payload when this is a string value.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value),
            _ => None,
        }
    }

    /// Converts the value into its JSON representation.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Bool(value) => Value::Bool(*value),
            Self::Integer(value) => Value::from(*value),
            Self::String(value) => Value::String(value.clone()),
            Self::Structured(value) => value.clone(),
        }
    }

    /// Renders the value as plain text: strings verbatim, everything else as JSON.
    #[must_use]
    pub fn to_plain_string(&self) -> String {
        match self {
            Self::String(value) => value.clone(),
            other => other.to_json().to_string(),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<Value> for ParamValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Bool(flag) => Self::Bool(flag),
            Value::String(text) => Self::String(text),
            Value::Number(number) => {
                number.as_i64().map_or_else(|| Self::Structured(Value::Number(number)), Self::Integer)
            }
            other => Self::Structured(other),
        }
    }
}

// ============================================================================
// SECTION: Parameter Sets
// ============================================================================

/// Mapping from parameter name to value, ordered by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterSet(BTreeMap<String, ParamValue>);

impl ParameterSet {
    /// Creates an empty parameter set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a parameter, returning the updated set.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.insert(name, value);
        self
    }

    /// Inserts or replaces a parameter, returning the previous value.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        value: impl Into<ParamValue>,
    ) -> Option<ParamValue> {
        self.0.insert(name.into(), value.into())
    }

    /// Returns the value for a parameter.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.0.get(name)
    }

    /// Returns true when the parameter is present.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Iterates parameters in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.0.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Returns the number of parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true when no parameters are set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Converts the set into a JSON object (the shape of a `*.tfvars.json` file).
    #[must_use]
    pub fn to_json(&self) -> Value {
        let map: Map<String, Value> =
            self.0.iter().map(|(name, value)| (name.clone(), value.to_json())).collect();
        Value::Object(map)
    }
}

impl<K, V> FromIterator<(K, V)> for ParameterSet
where
    K: Into<String>,
    V: Into<ParamValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(name, value)| (name.into(), value.into())).collect())
    }
}
