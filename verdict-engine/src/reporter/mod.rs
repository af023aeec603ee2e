// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversion of match results into verdicts, and the sinks verdicts are delivered to.
//!
//! The reporter makes exactly one [`VerdictSink::emit`] call per declared identifier.

mod aggregate;
mod junit;

pub use aggregate::aggregate_verdict;
pub use junit::JunitSink;

use crate::matcher::{IdentifierMatch, MatchOutcome, MatchResult};
use serde::Serialize;
use verdict_metadata::{
    AssertionStatus, DeclaredTestId, RecordRef, Verdict, VerdictKind, VerdictLocation,
    VerdictRecord,
};

/// The message used for a failure that came with no failure messages.
pub const DEFAULT_FAILURE_MESSAGE: &str = "test failed";

/// A destination for verdicts.
pub trait VerdictSink {
    /// Records the verdict for one declared test.
    fn emit(&mut self, test_id: &DeclaredTestId, verdict: Verdict);
}

impl<S: VerdictSink + ?Sized> VerdictSink for &mut S {
    fn emit(&mut self, test_id: &DeclaredTestId, verdict: Verdict) {
        (**self).emit(test_id, verdict)
    }
}

/// A sink that collects verdicts in the order they were emitted.
#[derive(Clone, Debug, Default)]
pub struct VerdictCollector {
    records: Vec<VerdictRecord>,
}

impl VerdictCollector {
    /// Creates an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the collected verdicts.
    pub fn records(&self) -> &[VerdictRecord] {
        &self.records
    }

    /// Returns the verdict collected for `id`.
    pub fn get(&self, id: &str) -> Option<&Verdict> {
        self.records
            .iter()
            .find(|record| record.id == id)
            .map(|record| &record.verdict)
    }

    /// Consumes the collector, returning the collected verdicts.
    pub fn into_records(self) -> Vec<VerdictRecord> {
        self.records
    }
}

impl VerdictSink for VerdictCollector {
    fn emit(&mut self, test_id: &DeclaredTestId, verdict: Verdict) {
        self.records.push(VerdictRecord {
            id: test_id.id.clone(),
            verdict,
        });
    }
}

/// Per-kind counts of the verdicts emitted by a pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct VerdictCounts {
    /// The number of passed verdicts.
    pub passed: usize,
    /// The number of failed verdicts.
    pub failed: usize,
    /// The number of skipped verdicts.
    pub skipped: usize,
    /// The number of errored verdicts.
    pub errored: usize,
}

impl VerdictCounts {
    /// Counts one verdict of the given kind.
    pub fn add(&mut self, kind: VerdictKind) {
        match kind {
            VerdictKind::Passed => self.passed += 1,
            VerdictKind::Failed => self.failed += 1,
            VerdictKind::Skipped => self.skipped += 1,
            VerdictKind::Errored => self.errored += 1,
        }
    }

    /// Returns the total number of verdicts.
    pub fn total(&self) -> usize {
        self.passed + self.failed + self.skipped + self.errored
    }
}

/// A sink that counts verdicts while forwarding them to another sink.
pub(crate) struct CountingSink<'a, S: ?Sized> {
    inner: &'a mut S,
    counts: VerdictCounts,
}

impl<'a, S: VerdictSink + ?Sized> CountingSink<'a, S> {
    pub(crate) fn new(inner: &'a mut S) -> Self {
        Self {
            inner,
            counts: VerdictCounts::default(),
        }
    }

    pub(crate) fn counts(&self) -> VerdictCounts {
        self.counts
    }
}

impl<S: VerdictSink + ?Sized> VerdictSink for CountingSink<'_, S> {
    fn emit(&mut self, test_id: &DeclaredTestId, verdict: Verdict) {
        self.counts.add(verdict.kind());
        self.inner.emit(test_id, verdict);
    }
}

/// Turns match results into verdicts.
#[derive(Clone, Copy, Debug)]
pub struct VerdictReporter<'a, 'r> {
    records: &'a [RecordRef<'r>],
}

impl<'a, 'r> VerdictReporter<'a, 'r> {
    /// Creates a reporter over the flattened records that `match_result` refers to.
    pub fn new(records: &'a [RecordRef<'r>]) -> Self {
        Self { records }
    }

    /// Emits one verdict per identifier in `match_result`, in declaration order.
    pub fn report<S: VerdictSink + ?Sized>(&self, match_result: &MatchResult<'_>, sink: &mut S) {
        for identifier_match in match_result.iter() {
            let verdict = self.verdict_for(identifier_match);
            sink.emit(identifier_match.test_id, verdict);
        }
    }

    /// Returns the verdict for one identifier.
    pub fn verdict_for(&self, identifier_match: &IdentifierMatch<'_>) -> Verdict {
        let test_id = identifier_match.test_id;
        match &identifier_match.outcome {
            MatchOutcome::Unmatched => Verdict::Skipped,
            MatchOutcome::Single(position) => single_verdict(&self.records[*position], test_id),
            MatchOutcome::Aggregated(positions) => {
                let members: Vec<_> = positions
                    .iter()
                    .map(|&position| self.records[position])
                    .collect();
                aggregate_verdict(&members, test_id)
            }
        }
    }
}

fn single_verdict(record_ref: &RecordRef<'_>, test_id: &DeclaredTestId) -> Verdict {
    let record = record_ref.record;
    match record.status {
        AssertionStatus::Passed => Verdict::Passed {
            duration_ms: record.duration_ms.unwrap_or(0.0),
        },
        AssertionStatus::Failed => Verdict::Failed {
            message: failure_message(&record.failure_messages),
            location: verdict_location(record_ref, test_id),
            duration_ms: record.duration_ms,
        },
        AssertionStatus::Pending => Verdict::Skipped,
    }
}

/// Joins failure messages with newlines, substituting a default for an empty list.
pub(crate) fn failure_message(messages: &[String]) -> String {
    if messages.is_empty() {
        DEFAULT_FAILURE_MESSAGE.to_owned()
    } else {
        messages.join("\n")
    }
}

/// Converts a record's 1-indexed location into a 0-indexed verdict location.
pub(crate) fn verdict_location(
    record_ref: &RecordRef<'_>,
    test_id: &DeclaredTestId,
) -> Option<VerdictLocation> {
    let location = record_ref.record.source_location?;
    Some(VerdictLocation {
        file_path: test_id
            .file_path
            .clone()
            .or_else(|| record_ref.suite_path.map(|path| path.to_path_buf())),
        line: location.line.saturating_sub(1),
        column: location.column,
    })
}
