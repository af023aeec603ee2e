// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Extraction of a JSON result object embedded among log lines.
//!
//! Wrapper tools (package managers, monorepo task runners) commonly print diagnostics before
//! and after the runner's JSON report. The report object is located by its opening keys and
//! then delimited with a string-aware brace scan.

use crate::errors::NormalizeError;
use regex::Regex;
use std::sync::LazyLock;

/// Opening signatures of a result object: `{`, optional whitespace, then one of the keys a
/// Jest-compatible JSON report starts with.
static JSON_START: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"\{\s*"(?:numFailedTestSuites|numFailedTests|numPassedTestSuites|numPendingTestSuites|numTotalTestSuites|numTotalTests|testResults)""#,
    )
    .expect("JSON start regex is valid")
});

/// Returns the byte offset of the first result-object signature in `output`.
pub fn find_json_start(output: &str) -> Option<usize> {
    JSON_START.find(output).map(|m| m.start())
}

/// Returns the first embedded result object in `output`.
pub fn extract_json_object(output: &str) -> Result<&str, NormalizeError> {
    let start = find_json_start(output).ok_or(NormalizeError::NoJsonStart)?;
    scan_json_object(output, start)
}

/// Returns the JSON object that starts with the `{` at byte offset `start`.
///
/// Braces inside string literals are not counted, and backslash escapes inside strings are
/// honored so that `\"` does not end the string.
pub fn scan_json_object(output: &str, start: usize) -> Result<&str, NormalizeError> {
    let bytes = output.as_bytes();
    if bytes.get(start) != Some(&b'{') {
        return Err(NormalizeError::UnterminatedJson { start });
    }

    // All the bytes inspected here are ASCII, so every offset found is a char boundary.
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (offset, &byte) in bytes[start..].iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if byte == b'\\' {
                escaped = true;
            } else if byte == b'"' {
                in_string = false;
            }
            continue;
        }

        match byte {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(&output[start..=start + offset]);
                }
            }
            _ => {}
        }
    }

    Err(NormalizeError::UnterminatedJson { start })
}
