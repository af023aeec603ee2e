// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The canonical result model that every output normalizer converges to.
//!
//! The serialized form uses the same camelCase keys as the JSON reports produced by
//! Jest-compatible runners, so a [`RunSummary`] can be written out and read back unchanged.

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The normalized result of a single test-runner invocation.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    /// The number of suites with at least one failing test.
    pub num_failed_test_suites: usize,
    /// The number of failing tests.
    pub num_failed_tests: usize,
    /// The number of suites where every test passed.
    pub num_passed_test_suites: usize,
    /// The number of passing tests.
    pub num_passed_tests: usize,
    /// The number of suites where no test ran.
    pub num_pending_test_suites: usize,
    /// The number of skipped or todo tests.
    pub num_pending_tests: usize,
    /// The total number of suites.
    pub num_total_test_suites: usize,
    /// The total number of tests.
    pub num_total_tests: usize,
    /// Whether the run as a whole succeeded.
    pub success: bool,
    /// Per-file results, in the order the runner reported them.
    pub test_results: Vec<SuiteResult>,
}

impl RunSummary {
    /// Builds a summary from suites, tallying every counter from the records themselves.
    pub fn from_suites(test_results: Vec<SuiteResult>) -> Self {
        let mut summary = Self {
            test_results,
            ..Default::default()
        };
        summary.retally();
        summary
    }

    /// Recomputes every counter and the success flag from the contained records.
    pub fn retally(&mut self) {
        let mut counts = SuiteCounts::default();
        for suite in &self.test_results {
            counts.add_suite(suite);
        }
        counts.apply(self);
    }

    /// Returns the total number of assertion records across all suites.
    pub fn record_count(&self) -> usize {
        self.test_results
            .iter()
            .map(|suite| suite.assertion_results.len())
            .sum()
    }

    /// Returns the records of every suite flattened into one sequence.
    ///
    /// Positions in this sequence are the record addresses used while matching.
    pub fn flatten(&self) -> Vec<RecordRef<'_>> {
        self.test_results
            .iter()
            .flat_map(|suite| {
                suite.assertion_results.iter().map(move |record| RecordRef {
                    suite_path: suite.name.as_deref(),
                    record,
                })
            })
            .collect()
    }

    /// Appends the suites of `other` to this summary and recomputes the counters.
    pub fn merge(&mut self, other: RunSummary) {
        self.test_results.extend(other.test_results);
        self.retally();
    }
}

#[derive(Default)]
struct SuiteCounts {
    suites_failed: usize,
    suites_passed: usize,
    suites_pending: usize,
    failed: usize,
    passed: usize,
    pending: usize,
}

impl SuiteCounts {
    fn add_suite(&mut self, suite: &SuiteResult) {
        let mut any_failed = false;
        let mut any_passed = false;
        for record in &suite.assertion_results {
            match record.status {
                AssertionStatus::Passed => {
                    self.passed += 1;
                    any_passed = true;
                }
                AssertionStatus::Failed => {
                    self.failed += 1;
                    any_failed = true;
                }
                AssertionStatus::Pending => self.pending += 1,
            }
        }
        if any_failed {
            self.suites_failed += 1;
        } else if any_passed {
            self.suites_passed += 1;
        } else {
            self.suites_pending += 1;
        }
    }

    fn apply(self, summary: &mut RunSummary) {
        summary.num_failed_test_suites = self.suites_failed;
        summary.num_passed_test_suites = self.suites_passed;
        summary.num_pending_test_suites = self.suites_pending;
        summary.num_total_test_suites = self.suites_failed + self.suites_passed + self.suites_pending;
        summary.num_failed_tests = self.failed;
        summary.num_passed_tests = self.passed;
        summary.num_pending_tests = self.pending;
        summary.num_total_tests = self.failed + self.passed + self.pending;
        summary.success = self.failed == 0;
    }
}

/// A file-level grouping of assertion records.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuiteResult {
    /// The path of the source file this suite was loaded from, if the runner reported one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<Utf8PathBuf>,

    /// The leaf-level outcomes in this suite.
    #[serde(default)]
    pub assertion_results: Vec<AssertionRecord>,
}

/// One leaf-level test outcome emitted by a runner.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssertionRecord {
    /// The titles of the enclosing `describe` blocks, outermost first.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ancestor_titles: Vec<String>,

    /// The leaf name of the test.
    pub title: String,

    /// The fully qualified name, prefixed with every ancestor title.
    pub full_name: String,

    /// The outcome of the test.
    pub status: AssertionStatus,

    /// How long the test took, in milliseconds. Never negative.
    #[serde(rename = "duration", default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<f64>,

    /// Failure messages, in the order the runner reported them.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failure_messages: Vec<String>,

    /// Where the test is declared. The line is 1-indexed.
    #[serde(rename = "location", default, skip_serializing_if = "Option::is_none")]
    pub source_location: Option<SourceLocation>,
}

impl AssertionRecord {
    /// Creates a new record, deriving the full name from the ancestor titles if it is empty.
    pub fn new(
        ancestor_titles: Vec<String>,
        title: impl Into<String>,
        full_name: impl Into<String>,
        status: AssertionStatus,
    ) -> Self {
        let title = title.into();
        let mut full_name = full_name.into();
        if full_name.is_empty() {
            full_name = join_full_name(&ancestor_titles, &title);
        }
        Self {
            ancestor_titles,
            title,
            full_name,
            status,
            duration_ms: None,
            failure_messages: Vec::new(),
            source_location: None,
        }
    }

    /// Sets the duration, dropping values that are negative or not finite and clamping
    /// values above [`MAX_DURATION_MS`].
    pub fn with_duration_ms(mut self, duration_ms: Option<f64>) -> Self {
        self.duration_ms = duration_ms
            .filter(|ms| ms.is_finite() && *ms >= 0.0)
            .map(clamp_duration_ms);
        self
    }

    /// Sets the failure messages.
    pub fn with_failure_messages(mut self, failure_messages: Vec<String>) -> Self {
        self.failure_messages = failure_messages;
        self
    }

    /// Sets the source location.
    pub fn with_source_location(mut self, source_location: Option<SourceLocation>) -> Self {
        self.source_location = source_location;
        self
    }

    /// Restores the record invariants on a record deserialized from an untrusted source.
    pub fn into_canonical(mut self) -> Self {
        if self.full_name.is_empty() {
            self.full_name = join_full_name(&self.ancestor_titles, &self.title);
        }
        let duration_ms = self.duration_ms.take();
        self.with_duration_ms(duration_ms)
    }
}

/// The largest duration the model records, in milliseconds (about 31,700 years).
///
/// Every duration up to this bound converts to a [`std::time::Duration`] and survives a JSON
/// round trip.
pub const MAX_DURATION_MS: f64 = 1e15;

/// Clamps a finite, non-negative duration to [`MAX_DURATION_MS`].
///
/// Sums of clamped durations can exceed the bound or overflow to infinity; this brings them
/// back into range.
pub fn clamp_duration_ms(duration_ms: f64) -> f64 {
    duration_ms.min(MAX_DURATION_MS)
}

/// Joins ancestor titles and a leaf title with single spaces, the way Jest builds `fullName`.
pub fn join_full_name(ancestor_titles: &[String], title: &str) -> String {
    let mut full_name = String::new();
    for part in ancestor_titles
        .iter()
        .map(String::as_str)
        .chain(std::iter::once(title))
        .filter(|part| !part.is_empty())
    {
        if !full_name.is_empty() {
            full_name.push(' ');
        }
        full_name.push_str(part);
    }
    full_name
}

/// The canonical status of an assertion record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssertionStatus {
    /// The test ran and passed.
    Passed,
    /// The test ran and failed.
    Failed,
    /// The test was skipped, marked todo, or otherwise not run.
    Pending,
}

impl AssertionStatus {
    /// Returns the string used for this status in serialized output.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::Pending => "pending",
        }
    }
}

impl fmt::Display for AssertionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(feature = "proptest1")]
mod proptest_impls {
    use super::AssertionStatus;
    use proptest::prelude::*;

    impl Arbitrary for AssertionStatus {
        type Parameters = ();
        type Strategy = BoxedStrategy<Self>;

        fn arbitrary_with(_args: Self::Parameters) -> Self::Strategy {
            prop_oneof![
                Just(AssertionStatus::Passed),
                Just(AssertionStatus::Failed),
                Just(AssertionStatus::Pending),
            ]
            .boxed()
        }
    }
}

/// A position in a source file. The line is 1-indexed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceLocation {
    /// The 1-indexed line.
    pub line: u32,
    /// The column, as reported by the runner.
    pub column: u32,
}

/// A borrowed view of one record in a flattened [`RunSummary`].
#[derive(Clone, Copy, Debug)]
pub struct RecordRef<'a> {
    /// The path of the suite the record belongs to, if known.
    pub suite_path: Option<&'a Utf8Path>,
    /// The record itself.
    pub record: &'a AssertionRecord,
}
