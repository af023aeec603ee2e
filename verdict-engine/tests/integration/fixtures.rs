// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use indoc::indoc;
use verdict_engine::{
    config::ReconcileConfig,
    normalize::Framework,
    reconcile::{ReconcileInput, ReconcileOutcome, Reconciler},
    reporter::VerdictCollector,
};
use verdict_metadata::DeclaredTestId;

/// A Jest `--json` report with a single passing test.
pub(crate) const JEST_SINGLE_PASS: &str = r#"{"numFailedTestSuites":0,"numFailedTests":0,"numPassedTestSuites":1,"numPassedTests":1,"numPendingTestSuites":0,"numPendingTests":0,"numTotalTestSuites":1,"numTotalTests":1,"success":true,"testResults":[{"name":"/repo/src/math.test.js","assertionResults":[{"ancestorTitles":[],"title":"adds","fullName":"adds","status":"passed","duration":5,"failureMessages":[],"location":{"line":1,"column":1}}]}]}"#;

/// A Jest report for `test.each` with one failing parameter set.
pub(crate) const JEST_PARAMETERIZED: &str = indoc! {r#"
    {
      "numFailedTestSuites": 1, "numFailedTests": 1, "numPassedTestSuites": 0,
      "numPassedTests": 2, "numPendingTestSuites": 0, "numPendingTests": 0,
      "numTotalTestSuites": 1, "numTotalTests": 3, "success": false,
      "testResults": [{
        "name": "/repo/src/add.test.js",
        "assertionResults": [
          {"ancestorTitles": ["add"], "title": "add(1, 1)", "fullName": "add add(1, 1)",
           "status": "passed", "duration": 2, "failureMessages": []},
          {"ancestorTitles": ["add"], "title": "add(1, 2)", "fullName": "add add(1, 2)",
           "status": "failed", "duration": 3,
           "failureMessages": ["expect(received).toBe(expected)\nExpected: 3\nReceived: 4"],
           "location": {"line": 12, "column": 5}},
          {"ancestorTitles": ["add"], "title": "add(2, 2)", "fullName": "add add(2, 2)",
           "status": "passed", "duration": 4, "failureMessages": []}
        ]
      }]
    }
"#};

/// A Vitest JSON report spanning two files that both declare `works`.
pub(crate) const VITEST_TWO_FILES: &str = indoc! {r#"
    {
      "numTotalTestSuites": 2,
      "numTotalTests": 2,
      "testResults": [
        {"name": "/repo/src/a.test.ts", "assertionResults": [
          {"title": "works", "fullName": "works", "status": "passed", "duration": 1.25}
        ]},
        {"name": "/repo/src/b.test.ts", "assertionResults": [
          {"title": "works", "fullName": "works", "status": "failed", "duration": 0.5,
           "failureMessages": ["AssertionError: expected false to be true"]}
        ]}
      ]
    }
"#};

/// `node --test` output with nested subtests.
pub(crate) const NODE_TAP_NESTED: &str = indoc! {"
    TAP version 13
    # Subtest: parser
        # Subtest: handles empty input
        ok 1 - handles empty input
          ---
          duration_ms: 0.41
          ...
        # Subtest: rejects bad tokens
        not ok 2 - rejects bad tokens
          ---
          duration_ms: 1.2
          location: '/repo/test/parser.test.mjs:9:3'
          failureType: 'testCodeFailure'
          error: 'Missing expected exception.'
          code: 'ERR_ASSERTION'
          ...
        1..2
    not ok 1 - parser
      ---
      duration_ms: 2.5
      type: 'suite'
      ...
    1..1
    # tests 2
    # pass 1
    # fail 1
"};

pub(crate) fn ids(labels: &[&str]) -> Vec<DeclaredTestId> {
    labels
        .iter()
        .map(|label| DeclaredTestId::new(*label, *label))
        .collect()
}

pub(crate) fn reconcile(
    input: ReconcileInput<'_>,
    test_ids: &[DeclaredTestId],
) -> (ReconcileOutcome, VerdictCollector) {
    let reconciler =
        Reconciler::new(ReconcileConfig::default()).expect("default config is valid");
    let mut collector = VerdictCollector::new();
    let outcome = reconciler.reconcile(&input, test_ids, &mut collector);
    assert_eq!(
        collector.records().len(),
        test_ids.len(),
        "exactly one verdict per identifier"
    );
    (outcome, collector)
}

pub(crate) fn reconcile_output(
    output: &str,
    framework: Framework,
    test_ids: &[DeclaredTestId],
) -> (ReconcileOutcome, VerdictCollector) {
    reconcile(ReconcileInput::new(output, framework), test_ids)
}
