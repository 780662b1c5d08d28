// crates/infra-harness-core/src/runtime/assertions.rs
// ============================================================================
// Module: Assertion Engine
// Description: Side-effect-free predicates over extracted output values.
// Purpose: Produce per-assertion results that never abort sibling checks.
// Dependencies: regex, serde, crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! Each predicate takes a subject string and returns an [`AssertionResult`]
//! carrying the subject, the expected condition, and a verdict. Predicates
//! never mutate the subject or call the engine. [`Check`] is the
//! serializable form used by declarative suites, and [`ExpectationSet`]
//! turns a list of checks into a [`ModuleTest`] body.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::AssertionResult;
use crate::interfaces::ModuleTest;
use crate::interfaces::TestBodyError;
use crate::runtime::ModuleContext;
use crate::runtime::OutputError;

// ============================================================================
// SECTION: Predicates
// ============================================================================

/// Builds a result with a verdict-dependent message.
fn verdict(
    predicate: &str,
    subject: &str,
    expected: String,
    passed: bool,
    failure: impl FnOnce() -> String,
) -> AssertionResult {
    AssertionResult {
        predicate: predicate.to_string(),
        output: None,
        subject: subject.to_string(),
        expected,
        passed,
        message: if passed { "ok".to_string() } else { failure() },
    }
}

/// Fails when the subject is the empty string.
#[must_use]
pub fn not_empty(subject: &str) -> AssertionResult {
    verdict("not_empty", subject, "non-empty value".to_string(), !subject.is_empty(), || {
        "value is empty".to_string()
    })
}

/// Fails when `substring` does not occur in the subject (literal, case-sensitive).
#[must_use]
pub fn contains(subject: &str, substring: &str) -> AssertionResult {
    verdict(
        "contains",
        subject,
        format!("contains \"{substring}\""),
        subject.contains(substring),
        || format!("\"{substring}\" not found in value"),
    )
}

/// Fails when the subject does not match the regular expression `pattern`.
///
/// An invalid pattern yields a failed result describing the compile error.
#[must_use]
pub fn matches(subject: &str, pattern: &str) -> AssertionResult {
    let expected = format!("matches /{pattern}/");
    match Regex::new(pattern) {
        Ok(regex) => verdict("matches", subject, expected, regex.is_match(subject), || {
            format!("value does not match /{pattern}/")
        }),
        Err(err) => verdict("matches", subject, expected, false, || format!("invalid pattern: {err}")),
    }
}

/// Fails unless the subject equals `expected` exactly.
#[must_use]
pub fn equals(subject: &str, expected: &str) -> AssertionResult {
    verdict("equals", subject, format!("equals \"{expected}\""), subject == expected, || {
        "value differs".to_string()
    })
}

// ============================================================================
// SECTION: Declarative Checks
// ============================================================================

/// Declarative check validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckError {
    /// A `matches` pattern does not compile.
    #[error("invalid pattern for output `{output}`: {reason}")]
    InvalidPattern {
        /// Output the check applies to.
        output: String,
        /// Compile error text.
        reason: String,
    },
}

/// Serializable predicate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "check", rename_all = "snake_case")]
pub enum Check {
    /// See [`not_empty`].
    NotEmpty,
    /// See [`contains`].
    Contains {
        /// Substring to look for.
        value: String,
    },
    /// See [`matches`].
    Matches {
        /// Regular expression.
        value: String,
    },
    /// See [`equals`].
    Equals {
        /// Expected value.
        value: String,
    },
}

impl Check {
    /// Applies the check to a subject.
    #[must_use]
    pub fn evaluate(&self, subject: &str) -> AssertionResult {
        match self {
            Self::NotEmpty => not_empty(subject),
            Self::Contains {
                value,
            } => contains(subject, value),
            Self::Matches {
                value,
            } => matches(subject, value),
            Self::Equals {
                value,
            } => equals(subject, value),
        }
    }

    /// Returns the predicate label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::NotEmpty => "not_empty",
            Self::Contains {
                ..
            } => "contains",
            Self::Matches {
                ..
            } => "matches",
            Self::Equals {
                ..
            } => "equals",
        }
    }
}

/// One check bound to one named output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expectation {
    /// Output name the check reads.
    pub output: String,
    /// Predicate to apply.
    #[serde(flatten)]
    pub check: Check,
    /// Message replacing the default failure text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Expectation {
    /// Creates an expectation without a custom message.
    #[must_use]
    pub fn new(output: impl Into<String>, check: Check) -> Self {
        Self {
            output: output.into(),
            check,
            message: None,
        }
    }

    /// Sets the custom failure message.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Evaluates the check against the output's value.
    #[must_use]
    pub fn evaluate(&self, subject: &str) -> AssertionResult {
        let result = self.check.evaluate(subject).for_output(&self.output);
        match &self.message {
            Some(message) if !result.passed => result.with_message(message),
            _ => result,
        }
    }

    /// Rejects checks that cannot be evaluated meaningfully.
    ///
    /// # Errors
    ///
    /// Returns [`CheckError::InvalidPattern`] for a pattern that does not compile.
    pub fn validate(&self) -> Result<(), CheckError> {
        if let Check::Matches {
            value,
        } = &self.check
        {
            Regex::new(value).map_err(|err| CheckError::InvalidPattern {
                output: self.output.clone(),
                reason: err.to_string(),
            })?;
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Assertion Set
// ============================================================================

/// Results collected by a test body.
///
/// Failures are collected, never short-circuited. An output that could not be
/// read is recorded as an output error and its checks are skipped.
#[derive(Debug, Clone, Default)]
pub struct AssertionSet {
    /// Every assertion evaluated, in order.
    results: Vec<AssertionResult>,
    /// Outputs that could not be read.
    output_errors: Vec<OutputError>,
}

impl AssertionSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a result.
    pub fn push(&mut self, result: AssertionResult) {
        self.results.push(result);
    }

    /// Applies `check` to an output value, adds the result, and returns its verdict.
    pub fn check(&mut self, output: &str, subject: &str, check: &Check) -> bool {
        let result = check.evaluate(subject).for_output(output);
        let passed = result.passed;
        self.results.push(result);
        passed
    }

    /// Records an output that could not be read.
    pub fn record_output_error(&mut self, error: OutputError) {
        self.output_errors.push(error);
    }

    /// Returns the collected results.
    #[must_use]
    pub fn results(&self) -> &[AssertionResult] {
        &self.results
    }

    /// Returns the recorded output errors.
    #[must_use]
    pub fn output_errors(&self) -> &[OutputError] {
        &self.output_errors
    }

    /// Returns the number of failed results.
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.results.iter().filter(|result| !result.passed).count()
    }

    /// Splits the set into results and output errors.
    #[must_use]
    pub fn into_parts(self) -> (Vec<AssertionResult>, Vec<OutputError>) {
        (self.results, self.output_errors)
    }
}

// ============================================================================
// SECTION: Expectation Set
// ============================================================================

/// Declarative test body: a list of expectations evaluated against outputs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExpectationSet {
    /// Expectations in evaluation order.
    expectations: Vec<Expectation>,
}

impl ExpectationSet {
    /// Creates a set from expectations.
    #[must_use]
    pub const fn new(expectations: Vec<Expectation>) -> Self {
        Self {
            expectations,
        }
    }

    /// Appends an expectation.
    #[must_use]
    pub fn expect(mut self, output: impl Into<String>, check: Check) -> Self {
        self.expectations.push(Expectation::new(output, check));
        self
    }

    /// Returns the expectations.
    #[must_use]
    pub fn expectations(&self) -> &[Expectation] {
        &self.expectations
    }

    /// Returns the distinct output names in first-use order.
    #[must_use]
    pub fn output_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for expectation in &self.expectations {
            if !names.contains(&expectation.output.as_str()) {
                names.push(&expectation.output);
            }
        }
        names
    }

    /// Validates every expectation.
    ///
    /// # Errors
    ///
    /// Returns the first [`CheckError`] found.
    pub fn validate(&self) -> Result<(), CheckError> {
        self.expectations.iter().try_for_each(Expectation::validate)
    }
}

#[async_trait]
impl ModuleTest for ExpectationSet {
    async fn run(&self, ctx: ModuleContext) -> Result<AssertionSet, TestBodyError> {
        let mut set = AssertionSet::new();
        let mut values: BTreeMap<&str, Option<String>> = BTreeMap::new();
        for name in self.output_names() {
            let value = match ctx.output(name).await {
                Ok(value) => Some(value),
                Err(err) => {
                    set.record_output_error(err);
                    None
                }
            };
            values.insert(name, value);
        }
        for expectation in &self.expectations {
            if let Some(Some(subject)) = values.get(expectation.output.as_str()) {
                set.push(expectation.evaluate(subject));
            }
        }
        Ok(set)
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
#[path = "assertions_tests.rs"]
mod tests;
