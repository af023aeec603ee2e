// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A sink that renders verdicts as a JUnit XML report.

use super::VerdictSink;
use quick_junit::{NonSuccessKind, Report, TestCase, TestCaseStatus, TestSuite};
use std::time::Duration;
use verdict_metadata::{DeclaredTestId, Verdict};

/// Collects verdicts into a single JUnit test suite.
#[derive(Clone, Debug)]
pub struct JunitSink {
    report_name: String,
    test_suite: TestSuite,
}

impl JunitSink {
    /// Creates a sink whose report and suite are named `name`.
    pub fn new(name: impl Into<String>) -> Self {
        let report_name = name.into();
        let test_suite = TestSuite::new(report_name.as_str());
        Self {
            report_name,
            test_suite,
        }
    }

    /// Consumes the sink, returning the finished report.
    pub fn finish(self) -> Report {
        let mut report = Report::new(self.report_name);
        report.add_test_suite(self.test_suite);
        report
    }
}

impl VerdictSink for JunitSink {
    fn emit(&mut self, test_id: &DeclaredTestId, verdict: Verdict) {
        let (status, duration_ms) = match verdict {
            Verdict::Passed { duration_ms } => (TestCaseStatus::success(), Some(duration_ms)),
            Verdict::Failed {
                message,
                location,
                duration_ms,
            } => {
                let mut status = TestCaseStatus::non_success(NonSuccessKind::Failure);
                let first_line = message.lines().next().unwrap_or_default().to_owned();
                status.set_message(first_line).set_description(message);
                if let Some(location) = location {
                    let file = location
                        .file_path
                        .as_ref()
                        .map_or("<unknown>", |path| path.as_str());
                    // JUnit consumers expect 1-indexed lines.
                    status.set_type(format!("failure at {file}:{}", location.line + 1));
                }
                (status, duration_ms)
            }
            Verdict::Skipped => (TestCaseStatus::skipped(), None),
            Verdict::Errored { message } => {
                let mut status = TestCaseStatus::non_success(NonSuccessKind::Error);
                status.set_message(message);
                (status, None)
            }
        };

        let mut test_case = TestCase::new(test_id.label.as_str(), status);
        test_case.set_classname(
            test_id
                .file_path
                .as_ref()
                .map_or(test_id.id.as_str(), |path| path.as_str()),
        );
        let time = duration_ms.and_then(|ms| Duration::try_from_secs_f64(ms / 1000.0).ok());
        if let Some(time) = time {
            test_case.set_time(time);
        }
        self.test_suite.add_test_case(test_case);
    }
}
