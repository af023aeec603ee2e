// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors produced by the reconciliation engine.
//!
//! None of these escape a reconciliation pass: a [`NormalizeError`] routes the pass to the
//! fallback parser and a [`SideChannelError`] drops the offending marker line. Only
//! [`ConfigParseError`] is returned to callers, from configuration loading.

use camino::Utf8PathBuf;
use std::{error::Error, fmt};
use thiserror::Error;

/// The reason runner output could not be normalized into a result model.
///
/// Any value of this type means the output is not recoverable by structured parsing.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum NormalizeError {
    /// The output was empty or only whitespace.
    #[error("runner output is empty")]
    EmptyInput,

    /// No opening signature of a JSON result object was found in the output.
    #[error("no JSON result object found in runner output")]
    NoJsonStart,

    /// A JSON result object started but its closing brace was never found.
    #[error("JSON result object starting at byte {start} is not terminated")]
    UnterminatedJson {
        /// The byte offset the object starts at.
        start: usize,
    },

    /// The candidate JSON document failed to parse.
    #[error("failed to parse JSON result object")]
    InvalidJson {
        /// The underlying error.
        #[source]
        err: serde_json::Error,
    },

    /// The JSON document parsed, but is not a test result object.
    #[error("JSON document is not a test result object: {reason}")]
    UnrecognizedSchema {
        /// Why the document was rejected.
        reason: &'static str,
    },

    /// The JSON document has neither summary counters nor assertion records.
    #[error("JSON result object has no summary counters and no assertion records")]
    NoEvidence,

    /// Line-protocol output contained no test points.
    #[error("line protocol output contained no test points")]
    NoTestPoints,
}

/// A problem with one side-channel marker line.
#[derive(Debug, Error)]
pub enum SideChannelError {
    /// The marker line was not followed by a session attribute.
    #[error("side-channel marker on line {line_number} has no session attribute")]
    MissingSession {
        /// The 1-indexed line number.
        line_number: usize,
    },

    /// The payload after the marker failed to deserialize.
    #[error("malformed side-channel payload on line {line_number}")]
    MalformedPayload {
        /// The 1-indexed line number.
        line_number: usize,
        /// The underlying error.
        #[source]
        err: serde_json::Error,
    },
}

/// An error that occurred while loading reconciliation configuration.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigParseError {
    /// An explicitly requested config file does not exist.
    #[error("config file not found at `{path}`")]
    FileNotFound {
        /// The path that was checked.
        path: Utf8PathBuf,
    },

    /// The config file could not be read.
    #[error("failed to read config file at `{path}`")]
    Read {
        /// The path that was read.
        path: Utf8PathBuf,
        /// The underlying error.
        #[source]
        error: std::io::Error,
    },

    /// The config file is not valid TOML or has values of the wrong type.
    #[error("failed to parse config file at `{path}`")]
    Parse {
        /// The path that was parsed.
        path: Utf8PathBuf,
        /// The underlying error.
        #[source]
        error: toml::de::Error,
    },

    /// A value in the config file parsed, but is invalid.
    #[error("invalid value for `{key}` in config file at `{path}`: {reason}")]
    InvalidValue {
        /// The path of the config file.
        path: Utf8PathBuf,
        /// The dotted key of the invalid value.
        key: &'static str,
        /// Why the value is invalid.
        reason: String,
    },
}

/// Displays an error along with the chain of errors that caused it.
///
/// Used when logging a diagnostic on a single line.
pub struct DisplayErrorChain<E>(E);

impl<E: Error> DisplayErrorChain<E> {
    /// Creates a new `DisplayErrorChain`.
    pub fn new(error: E) -> Self {
        Self(error)
    }
}

impl<E: Error> fmt::Display for DisplayErrorChain<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)?;
        let mut source = self.0.source();
        while let Some(err) = source {
            write!(f, ": {err}")?;
            source = err.source();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_error_chain_includes_sources() {
        let err = serde_json::from_str::<serde_json::Value>("{").expect_err("unterminated");
        let chain = DisplayErrorChain::new(NormalizeError::InvalidJson { err });
        let displayed = chain.to_string();
        assert!(
            displayed.starts_with("failed to parse JSON result object: EOF while parsing"),
            "unexpected chain: {displayed}"
        );
    }
}
