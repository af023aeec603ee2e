// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversion of Jest-compatible JSON reports into the result model.

use crate::errors::{DisplayErrorChain, NormalizeError};
use camino::Utf8PathBuf;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;
use verdict_metadata::{AssertionRecord, AssertionStatus, RunSummary, SourceLocation, SuiteResult};

/// The summary counters a JSON report may carry.
const COUNTER_KEYS: [&str; 8] = [
    "numFailedTestSuites",
    "numFailedTests",
    "numPassedTestSuites",
    "numPassedTests",
    "numPendingTestSuites",
    "numPendingTests",
    "numTotalTestSuites",
    "numTotalTests",
];

/// The shape a JSON report was recognized as.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JsonSchema {
    /// Every summary counter and the success flag are present with the right types.
    ///
    /// This is what Jest produces with `--json`.
    Primary,

    /// A `testResults` array is present, but some counters are missing or mistyped.
    ///
    /// This is what Vitest and most Jest-compatible reporters produce.
    Secondary,
}

/// Determines whether `value` is a test result object, and of which shape.
pub fn classify_schema(value: &Value) -> Result<JsonSchema, NormalizeError> {
    let map = value
        .as_object()
        .ok_or(NormalizeError::UnrecognizedSchema {
            reason: "document is not a JSON object",
        })?;
    if !map.get("testResults").is_some_and(Value::is_array) {
        return Err(NormalizeError::UnrecognizedSchema {
            reason: "`testResults` is missing or is not an array",
        });
    }

    let counters_typed = COUNTER_KEYS
        .iter()
        .all(|key| map.get(*key).is_some_and(Value::is_u64));
    let success_typed = map.get("success").is_some_and(Value::is_boolean);
    if counters_typed && success_typed {
        Ok(JsonSchema::Primary)
    } else {
        Ok(JsonSchema::Secondary)
    }
}

/// Parses `document` and converts it into a [`RunSummary`].
pub fn normalize_json(document: &str, expected: JsonSchema) -> Result<RunSummary, NormalizeError> {
    let value: Value =
        serde_json::from_str(document).map_err(|err| NormalizeError::InvalidJson { err })?;
    normalize_value(value, expected)
}

/// Converts an already-parsed JSON document into a [`RunSummary`].
pub fn normalize_value(value: Value, expected: JsonSchema) -> Result<RunSummary, NormalizeError> {
    let schema = classify_schema(&value)?;
    if schema != expected {
        debug!("JSON report recognized as {schema:?} schema (expected {expected:?})");
    }

    let Value::Object(mut map) = value else {
        return Err(NormalizeError::UnrecognizedSchema {
            reason: "document is not a JSON object",
        });
    };

    let test_results = match map.remove("testResults") {
        Some(Value::Array(suites)) => suites.into_iter().filter_map(convert_suite).collect(),
        _ => Vec::new(),
    };

    match schema {
        JsonSchema::Primary => Ok(summary_with_counters(&map, test_results)),
        JsonSchema::Secondary => {
            let has_counters = COUNTER_KEYS.iter().any(|key| map.contains_key(*key));
            if has_counters || map.contains_key("success") {
                return Ok(summary_with_counters(&map, test_results));
            }

            // No summary information at all: the records are the only evidence.
            let summary = RunSummary::from_suites(test_results);
            if summary.record_count() == 0 {
                return Err(NormalizeError::NoEvidence);
            }
            debug!(
                "JSON report has no summary counters, tallied {} records",
                summary.record_count(),
            );
            Ok(summary)
        }
    }
}

fn summary_with_counters(map: &Map<String, Value>, test_results: Vec<SuiteResult>) -> RunSummary {
    let counter = |key: &str| {
        map.get(key)
            .and_then(Value::as_u64)
            .map_or(0, |n| usize::try_from(n).unwrap_or(usize::MAX))
    };

    let success = match map.get("success").and_then(Value::as_bool) {
        Some(success) => success,
        None => match map.get("numFailedTests").and_then(Value::as_u64) {
            Some(failed) => failed == 0,
            None => !test_results.iter().any(|suite| {
                suite
                    .assertion_results
                    .iter()
                    .any(|record| record.status == AssertionStatus::Failed)
            }),
        },
    };

    RunSummary {
        num_failed_test_suites: counter("numFailedTestSuites"),
        num_failed_tests: counter("numFailedTests"),
        num_passed_test_suites: counter("numPassedTestSuites"),
        num_passed_tests: counter("numPassedTests"),
        num_pending_test_suites: counter("numPendingTestSuites"),
        num_pending_tests: counter("numPendingTests"),
        num_total_test_suites: counter("numTotalTestSuites"),
        num_total_tests: counter("numTotalTests"),
        success,
        test_results,
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSuite {
    #[serde(default, alias = "testFilePath")]
    name: Option<Utf8PathBuf>,
    #[serde(default)]
    assertion_results: Option<Vec<Value>>,
}

/// One assertion record as found in the report.
///
/// Only the identity fields are typed. The rest are kept as raw values and read one at a time, so
/// a mistyped duration or location loses that field rather than the whole record.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawAssertion {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    full_name: Option<String>,
    #[serde(default)]
    ancestor_titles: Option<Value>,
    #[serde(default)]
    status: Option<Value>,
    #[serde(default)]
    duration: Option<Value>,
    #[serde(default)]
    failure_messages: Option<Value>,
    #[serde(default)]
    location: Option<Value>,
}

fn convert_suite(value: Value) -> Option<SuiteResult> {
    let raw: RawSuite = match serde_json::from_value(value) {
        Ok(raw) => raw,
        Err(err) => {
            debug!("skipping malformed suite: {}", DisplayErrorChain::new(err));
            return None;
        }
    };

    let assertion_results = raw
        .assertion_results
        .unwrap_or_default()
        .into_iter()
        .filter_map(convert_assertion)
        .collect();
    Some(SuiteResult {
        name: raw.name.filter(|name| !name.as_str().is_empty()),
        assertion_results,
    })
}

fn convert_assertion(value: Value) -> Option<AssertionRecord> {
    let raw: RawAssertion = match serde_json::from_value(value) {
        Ok(raw) => raw,
        Err(err) => {
            debug!("skipping malformed assertion record: {}", DisplayErrorChain::new(err));
            return None;
        }
    };

    let (title, full_name) = match (raw.title, raw.full_name) {
        (Some(title), full_name) => (title, full_name.unwrap_or_default()),
        (None, Some(full_name)) => (full_name.clone(), full_name),
        (None, None) => {
            debug!("skipping assertion record with neither title nor fullName");
            return None;
        }
    };

    let status = match raw.status {
        Some(Value::String(token)) => status_from_token(&token),
        Some(other) => {
            debug!("`{title}`: ignoring non-string status {other}");
            AssertionStatus::Pending
        }
        None => AssertionStatus::Pending,
    };
    let duration_ms = raw.duration.and_then(|value| {
        let duration = value.as_f64();
        if duration.is_none() && !value.is_null() {
            debug!("`{title}`: ignoring non-numeric duration {value}");
        }
        duration
    });
    let ancestor_titles = raw
        .ancestor_titles
        .map(|value| read_strings(&title, "ancestorTitles", value))
        .unwrap_or_default();
    let failure_messages = raw
        .failure_messages
        .map(|value| read_strings(&title, "failureMessages", value))
        .unwrap_or_default();
    let source_location = raw
        .location
        .and_then(|value| read_location(&title, &value));

    Some(
        AssertionRecord::new(ancestor_titles, title, full_name, status)
            .with_duration_ms(duration_ms)
            .with_failure_messages(failure_messages)
            .with_source_location(source_location),
    )
}

/// Reads an array of strings, stringifying any other entries. A non-array is dropped.
fn read_strings(title: &str, field: &str, value: Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .into_iter()
            .filter(|item| !item.is_null())
            .map(|item| match item {
                Value::String(s) => s,
                other => other.to_string(),
            })
            .collect(),
        Value::Null => Vec::new(),
        other => {
            debug!("`{title}`: ignoring non-array {field} {other}");
            Vec::new()
        }
    }
}

/// Reads a `{line, column}` object. A line that is missing or not a 32-bit unsigned integer
/// drops the location; a bad column reads as 0.
fn read_location(title: &str, value: &Value) -> Option<SourceLocation> {
    if value.is_null() {
        return None;
    }
    let line = value
        .get("line")
        .and_then(Value::as_u64)
        .and_then(|line| u32::try_from(line).ok());
    let Some(line) = line else {
        debug!("`{title}`: ignoring unusable location {value}");
        return None;
    };
    let column = value
        .get("column")
        .and_then(Value::as_u64)
        .and_then(|column| u32::try_from(column).ok())
        .unwrap_or(0);
    Some(SourceLocation { line, column })
}

/// Maps a runner status token to the canonical status.
///
/// Anything other than an explicit pass or failure (skipped, todo, disabled, focused, or a
/// token this parser does not know) counts as pending.
pub fn status_from_token(token: &str) -> AssertionStatus {
    match token {
        "passed" => AssertionStatus::Passed,
        "failed" => AssertionStatus::Failed,
        _ => AssertionStatus::Pending,
    }
}
