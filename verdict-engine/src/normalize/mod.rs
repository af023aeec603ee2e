// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Normalization of raw runner output into the canonical result model.
//!
//! Each supported framework selects a normalizer. JSON normalizers first try to parse the
//! whole output, then fall back to locating a result object embedded in log noise. Every
//! failure is a [`NormalizeError`], which callers treat as "not recoverable by structured
//! parsing" and route to the fallback parser.

mod extract;
mod json;
mod line_protocol;

pub use extract::{extract_json_object, find_json_start, scan_json_object};
pub use json::{JsonSchema, classify_schema, normalize_json, normalize_value, status_from_token};
pub use line_protocol::parse_line_protocol;

use crate::errors::{DisplayErrorChain, NormalizeError};
use camino::Utf8Path;
use std::fmt;
use tracing::debug;
use verdict_metadata::RunSummary;

/// A test framework whose output can be reconciled.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Framework {
    /// Jest, run with `--json`. The primary JSON schema is expected.
    Jest,
    /// Vitest with the JSON reporter. The secondary JSON schema is tolerated.
    Vitest,
    /// The `node --test` runner with its TAP reporter.
    NodeTap,
}

impl Framework {
    /// Returns the identifier for this framework used on the command line.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Jest => "jest",
            Self::Vitest => "vitest",
            Self::NodeTap => "node-tap",
        }
    }

    /// Returns the normalizer for this framework.
    ///
    /// `source_path` names the suite produced by line-protocol output, which carries no file
    /// names of its own.
    pub fn normalizer(self, source_path: Option<&Utf8Path>) -> NormalizerKind<'_> {
        match self {
            Self::Jest => NormalizerKind::Json(JsonNormalizer::new(JsonSchema::Primary)),
            Self::Vitest => NormalizerKind::Json(JsonNormalizer::new(JsonSchema::Secondary)),
            Self::NodeTap => NormalizerKind::LineProtocol(LineProtocolNormalizer::new(source_path)),
        }
    }
}

impl fmt::Display for Framework {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Converts raw runner output into a [`RunSummary`].
pub trait Normalize {
    /// Normalizes `raw_output`.
    fn normalize(&self, raw_output: &str) -> Result<RunSummary, NormalizeError>;
}

/// Normalizes Jest-compatible JSON reports, possibly surrounded by log lines.
#[derive(Clone, Copy, Debug)]
pub struct JsonNormalizer {
    expected: JsonSchema,
}

impl JsonNormalizer {
    /// Creates a normalizer that expects documents of the given shape.
    ///
    /// Documents of the other shape are still accepted.
    pub fn new(expected: JsonSchema) -> Self {
        Self { expected }
    }
}

impl Normalize for JsonNormalizer {
    fn normalize(&self, raw_output: &str) -> Result<RunSummary, NormalizeError> {
        let trimmed = raw_output.trim();
        if trimmed.is_empty() {
            return Err(NormalizeError::EmptyInput);
        }

        // A document that parses as a whole is authoritative, even if it is unrelated JSON.
        match serde_json::from_str(trimmed) {
            Ok(value) => return normalize_value(value, self.expected),
            Err(err) => debug!(
                "runner output is not a single JSON document ({}), scanning for an embedded result object",
                DisplayErrorChain::new(err),
            ),
        }

        let document = extract_json_object(trimmed)?;
        normalize_json(document, self.expected)
    }
}

/// Normalizes TAP line-protocol output.
#[derive(Clone, Copy, Debug)]
pub struct LineProtocolNormalizer<'a> {
    source_path: Option<&'a Utf8Path>,
}

impl<'a> LineProtocolNormalizer<'a> {
    /// Creates a normalizer that names its suite after `source_path`.
    pub fn new(source_path: Option<&'a Utf8Path>) -> Self {
        Self { source_path }
    }
}

impl Normalize for LineProtocolNormalizer<'_> {
    fn normalize(&self, raw_output: &str) -> Result<RunSummary, NormalizeError> {
        if raw_output.trim().is_empty() {
            return Err(NormalizeError::EmptyInput);
        }
        parse_line_protocol(raw_output, self.source_path)
    }
}

/// The normalizer selected by a [`Framework`].
#[derive(Clone, Copy, Debug)]
pub enum NormalizerKind<'a> {
    /// A JSON report normalizer.
    Json(JsonNormalizer),
    /// A TAP line-protocol normalizer.
    LineProtocol(LineProtocolNormalizer<'a>),
}

impl Normalize for NormalizerKind<'_> {
    fn normalize(&self, raw_output: &str) -> Result<RunSummary, NormalizeError> {
        match self {
            Self::Json(normalizer) => normalizer.normalize(raw_output),
            Self::LineProtocol(normalizer) => normalizer.normalize(raw_output),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    const REPORT: &str = r#"{"numFailedTestSuites":0,"numFailedTests":0,"numPassedTestSuites":1,"numPassedTests":1,"numPendingTestSuites":0,"numPendingTests":0,"numTotalTestSuites":1,"numTotalTests":1,"success":true,"testResults":[{"assertionResults":[{"ancestorTitles":[],"title":"adds","fullName":"adds","status":"passed","duration":5,"failureMessages":[]}]}]}"#;

    #[test]
    fn whole_and_embedded_documents_agree() {
        let normalizer = Framework::Jest.normalizer(None);
        let whole = normalizer.normalize(REPORT).expect("whole document");
        let wrapped = format!("[INFO] starting\n{REPORT}\n");
        let embedded = normalizer.normalize(&wrapped).expect("embedded document");
        assert_eq!(whole, embedded);
        assert_eq!(whole.num_passed_tests, 1);
    }

    #[test_case(""; "empty")]
    #[test_case("   \n\t"; "whitespace")]
    #[test_case("[INFO] nothing to see here"; "log noise only")]
    #[test_case(r#"{"name": "package", "version": "1.0.0"}"#; "unrelated object")]
    #[test_case("[1, 2, 3]"; "unrelated array")]
    #[test_case(r#"starting {"testResults": [{"#; "unterminated")]
    fn not_recoverable(output: &str) {
        for framework in [Framework::Jest, Framework::Vitest, Framework::NodeTap] {
            let result = framework.normalizer(None).normalize(output);
            assert!(result.is_err(), "{framework} accepted {output:?}: {result:?}");
        }
    }

    #[test]
    fn node_tap_names_suite_after_source_path() {
        let path = Utf8Path::new("test/a.test.mjs");
        let summary = Framework::NodeTap
            .normalizer(Some(path))
            .normalize("ok 1 - works\n")
            .expect("test point present");
        assert_eq!(summary.test_results[0].name.as_deref(), Some(path));
    }
}
