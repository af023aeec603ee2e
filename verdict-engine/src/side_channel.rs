// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Structured results delivered alongside ordinary output.
//!
//! A cooperating runner may print lines of the form
//!
//! ```text
//! ##verdict[session=<id>] {"numTotalTests": 1, "testResults": [...]}
//! ```
//!
//! where the payload is a serialized [`RunSummary`]. When such lines are present for the
//! current session, their summaries replace output parsing entirely.

use crate::{
    config::SideChannelConfig,
    errors::{DisplayErrorChain, SideChannelError},
};
use tracing::{debug, warn};
use verdict_metadata::{RunSummary, SuiteResult};

/// Reads side-channel lines for one session.
#[derive(Clone, Copy, Debug)]
pub struct SideChannelReader<'a> {
    marker: &'a str,
    session: &'a str,
}

impl<'a> SideChannelReader<'a> {
    /// Creates a reader for lines tagged with `session`.
    pub fn new(config: &'a SideChannelConfig, session: &'a str) -> Self {
        Self {
            marker: &config.marker,
            session,
        }
    }

    /// Merges every well-formed summary for this session, in order.
    ///
    /// Returns `None` if no line carried a summary for this session.
    pub fn read(&self, raw_output: &str) -> Option<RunSummary> {
        let mut merged: Option<RunSummary> = None;
        for (index, line) in raw_output.lines().enumerate() {
            match self.parse_line(index + 1, line) {
                Ok(Some(summary)) => match &mut merged {
                    Some(merged) => merged.merge(summary),
                    None => merged = Some(summary),
                },
                Ok(None) => {}
                Err(error) => warn!("ignoring side-channel line: {}", DisplayErrorChain::new(error)),
            }
        }

        if let Some(summary) = &merged {
            debug!(
                session = self.session,
                records = summary.record_count(),
                "side-channel results found",
            );
        }
        merged
    }

    fn parse_line(&self, line_number: usize, line: &str) -> Result<Option<RunSummary>, SideChannelError> {
        let Some(rest) = line.trim_start().strip_prefix(self.marker) else {
            return Ok(None);
        };
        let (session, payload) = rest
            .strip_prefix("[session=")
            .and_then(|rest| rest.split_once(']'))
            .ok_or(SideChannelError::MissingSession { line_number })?;

        if session != self.session {
            debug!(line_number, "skipping side-channel line for session `{session}`");
            return Ok(None);
        }

        let summary: RunSummary = serde_json::from_str(payload.trim())
            .map_err(|err| SideChannelError::MalformedPayload { line_number, err })?;
        Ok(Some(canonicalize(summary)))
    }
}

/// Restores model invariants that deserialization alone does not enforce.
fn canonicalize(summary: RunSummary) -> RunSummary {
    let RunSummary { test_results, .. } = summary;
    let test_results = test_results
        .into_iter()
        .map(|suite| SuiteResult {
            name: suite.name,
            assertion_results: suite
                .assertion_results
                .into_iter()
                .map(|record| record.into_canonical())
                .collect(),
        })
        .collect();
    RunSummary::from_suites(test_results)
}
