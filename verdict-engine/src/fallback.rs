// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Heuristic verdicts for runner output that could not be normalized.
//!
//! The fallback parser never reports a pass unless the output contains a pass indicator and
//! no failure indicator.

use crate::{
    config::FallbackConfig,
    helpers::plural,
    reporter::VerdictSink,
};
use aho_corasick::{AhoCorasick, BuildError};
use itertools::Itertools;
use tracing::debug;
use verdict_metadata::{DeclaredTestId, Verdict};

/// The message used when the output carries no indicator at all.
pub const NO_INDICATORS_MESSAGE: &str =
    "runner output could not be parsed and contains no pass or failure indicators";

/// Scans unparseable output for configured pass and failure indicators.
#[derive(Clone, Debug)]
pub struct FallbackParser {
    failure: AhoCorasick,
    pass: AhoCorasick,
}

impl FallbackParser {
    /// Builds the indicator automata.
    pub fn new(config: &FallbackConfig) -> Result<Self, BuildError> {
        Ok(Self {
            failure: AhoCorasick::new(&config.failure_indicators)?,
            pass: AhoCorasick::new(&config.pass_indicators)?,
        })
    }

    /// Emits one heuristic verdict per identifier.
    pub fn report<S: VerdictSink + ?Sized>(
        &self,
        raw_output: &str,
        test_ids: &[DeclaredTestId],
        sink: &mut S,
    ) {
        let failure_lines: Vec<&str> = raw_output
            .lines()
            .filter(|line| self.failure.is_match(line))
            .collect();
        let has_pass = self.pass.is_match(raw_output);
        debug!(
            "fallback: {} failure indicator {}, pass indicator {}",
            failure_lines.len(),
            plural::lines_str(failure_lines.len()),
            if has_pass { "present" } else { "absent" },
        );

        for test_id in test_ids {
            sink.emit(test_id, self.verdict_for(test_id, &failure_lines, has_pass));
        }
    }

    fn verdict_for(&self, test_id: &DeclaredTestId, failure_lines: &[&str], has_pass: bool) -> Verdict {
        if failure_lines.is_empty() {
            return if has_pass {
                Verdict::Passed { duration_ms: 0.0 }
            } else {
                Verdict::Errored {
                    message: NO_INDICATORS_MESSAGE.to_owned(),
                }
            };
        }

        let last_token = test_id.label.split_whitespace().next_back();
        let message = failure_lines
            .iter()
            .filter(|line| {
                line.contains(test_id.label.as_str())
                    || last_token.is_some_and(|token| line.contains(token))
            })
            .join("\n");

        if message.is_empty() {
            Verdict::Errored {
                message: format!(
                    "runner output could not be parsed; failure indicators were found, \
                     but none mention `{}`",
                    test_id.label,
                ),
            }
        } else {
            Verdict::Failed {
                message,
                location: None,
                duration_ms: None,
            }
        }
    }
}
