// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The reconciliation entry point.
//!
//! A pass takes the captured output of one runner invocation and the tests declared for it,
//! and emits exactly one verdict per declared test. Structured results are preferred in
//! this order: side-channel summaries, then the framework's normalizer. Output that cannot
//! be normalized is handed to the fallback parser.

use crate::{
    config::ReconcileConfig,
    errors::{DisplayErrorChain, NormalizeError},
    fallback::FallbackParser,
    helpers::plural,
    matcher::Matcher,
    normalize::{Framework, Normalize},
    reporter::{CountingSink, VerdictCounts, VerdictReporter, VerdictSink},
    side_channel::SideChannelReader,
};
use camino::Utf8Path;
use serde::Serialize;
use std::fmt;
use thiserror::Error;
use tracing::{debug, info};
use verdict_metadata::{DeclaredTestId, RunSummary};

/// The captured output of one runner invocation.
#[derive(Clone, Copy, Debug)]
pub struct ReconcileInput<'a> {
    /// The raw text the runner wrote.
    pub raw_output: &'a str,
    /// The framework that produced the output.
    pub framework: Framework,
    /// The file the run was scoped to. Names the suite of line-protocol output.
    pub source_path: Option<&'a Utf8Path>,
    /// The session id that side-channel lines for this run are tagged with.
    pub session: Option<&'a str>,
}

impl<'a> ReconcileInput<'a> {
    /// Creates an input with no source path and no session.
    pub fn new(raw_output: &'a str, framework: Framework) -> Self {
        Self {
            raw_output,
            framework,
            source_path: None,
            session: None,
        }
    }

    /// Sets the source path.
    pub fn with_source_path(mut self, source_path: &'a Utf8Path) -> Self {
        self.source_path = Some(source_path);
        self
    }

    /// Sets the session id.
    pub fn with_session(mut self, session: &'a str) -> Self {
        self.session = Some(session);
        self
    }
}

/// Which path through the engine produced the verdicts of a pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReconcilePath {
    /// Summaries read from side-channel lines.
    Structured,
    /// Runner output parsed by the framework's normalizer.
    Normalized,
    /// The heuristic fallback parser.
    Fallback,
}

impl fmt::Display for ReconcilePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Structured => write!(f, "structured"),
            Self::Normalized => write!(f, "normalized"),
            Self::Fallback => write!(f, "fallback"),
        }
    }
}

/// The result of a reconciliation pass.
#[derive(Debug)]
pub struct ReconcileOutcome {
    /// The path that produced the verdicts.
    pub path: ReconcilePath,
    /// Per-kind counts of the emitted verdicts.
    pub counts: VerdictCounts,
    /// Why normalization failed, if the fallback path was taken.
    pub normalize_error: Option<NormalizeError>,
}

/// An error that occurred while preparing a [`Reconciler`].
#[derive(Debug, Error)]
pub enum ReconcilerBuildError {
    /// The fallback indicators could not be compiled.
    #[error("failed to compile fallback indicators")]
    FallbackIndicators(#[from] aho_corasick::BuildError),
}

/// Runs reconciliation passes against a fixed configuration.
///
/// Passes share nothing mutable, so one reconciler can serve any number of passes.
#[derive(Clone, Debug)]
pub struct Reconciler {
    config: ReconcileConfig,
    fallback: FallbackParser,
}

impl Reconciler {
    /// Prepares a reconciler for `config`.
    pub fn new(config: ReconcileConfig) -> Result<Self, ReconcilerBuildError> {
        let fallback = FallbackParser::new(&config.fallback)?;
        Ok(Self { config, fallback })
    }

    /// Emits one verdict per declared test to `sink`.
    pub fn reconcile<S: VerdictSink + ?Sized>(
        &self,
        input: &ReconcileInput<'_>,
        test_ids: &[DeclaredTestId],
        sink: &mut S,
    ) -> ReconcileOutcome {
        let mut counting = CountingSink::new(sink);

        if let Some(summary) = self.read_side_channel(input) {
            self.report_summary(&summary, test_ids, &mut counting);
            return self.finish(ReconcilePath::Structured, counting.counts(), None);
        }

        let normalizer = input.framework.normalizer(input.source_path);
        match normalizer.normalize(input.raw_output) {
            Ok(summary) => {
                debug!(
                    "{} output normalized: {} {} in {} {}",
                    input.framework,
                    summary.record_count(),
                    plural::records_str(summary.record_count()),
                    summary.test_results.len(),
                    plural::suites_str(summary.test_results.len()),
                );
                self.report_summary(&summary, test_ids, &mut counting);
                self.finish(ReconcilePath::Normalized, counting.counts(), None)
            }
            Err(error) => {
                debug!(
                    "{} output not recoverable, using fallback parser: {}",
                    input.framework,
                    DisplayErrorChain::new(&error),
                );
                self.fallback
                    .report(input.raw_output, test_ids, &mut counting);
                self.finish(ReconcilePath::Fallback, counting.counts(), Some(error))
            }
        }
    }

    fn read_side_channel(&self, input: &ReconcileInput<'_>) -> Option<RunSummary> {
        let session = input.session?;
        SideChannelReader::new(&self.config.side_channel, session).read(input.raw_output)
    }

    fn report_summary<S: VerdictSink + ?Sized>(
        &self,
        summary: &RunSummary,
        test_ids: &[DeclaredTestId],
        sink: &mut S,
    ) {
        let records = summary.flatten();
        let match_result = Matcher::new(&self.config.matching).match_records(&records, test_ids);
        VerdictReporter::new(&records).report(&match_result, sink);
    }

    fn finish(
        &self,
        path: ReconcilePath,
        counts: VerdictCounts,
        normalize_error: Option<NormalizeError>,
    ) -> ReconcileOutcome {
        info!(
            %path,
            passed = counts.passed,
            failed = counts.failed,
            skipped = counts.skipped,
            errored = counts.errored,
            "reconciled {} {}",
            counts.total(),
            plural::tests_str(counts.total()),
        );
        ReconcileOutcome {
            path,
            counts,
            normalize_error,
        }
    }
}
