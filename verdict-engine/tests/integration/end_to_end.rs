// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::fixtures::*;
use camino::Utf8Path;
use color_eyre::eyre::{Result, ensure};
use pretty_assertions::assert_eq;
use test_case::test_case;
use verdict_engine::{
    config::ReconcileConfig,
    normalize::Framework,
    reconcile::{ReconcileInput, ReconcilePath, Reconciler},
    reporter::JunitSink,
};
use verdict_metadata::{DeclaredTestId, MAX_DURATION_MS, Verdict, VerdictKind, VerdictLocation};

#[test]
fn clean_json_passes() {
    let (outcome, verdicts) = reconcile_output(JEST_SINGLE_PASS, Framework::Jest, &ids(&["adds"]));
    assert_eq!(outcome.path, ReconcilePath::Normalized);
    assert_eq!(verdicts.get("adds"), Some(&Verdict::Passed { duration_ms: 5.0 }));
}

#[test_case(Framework::Jest; "jest")]
#[test_case(Framework::Vitest; "vitest")]
fn wrapped_json_passes(framework: Framework) {
    let output = format!("[INFO] starting\n{JEST_SINGLE_PASS}\n");
    let (outcome, verdicts) = reconcile_output(&output, framework, &ids(&["adds"]));
    assert_eq!(outcome.path, ReconcilePath::Normalized);
    assert_eq!(verdicts.get("adds"), Some(&Verdict::Passed { duration_ms: 5.0 }));
}

#[test]
fn wrapped_json_without_counters_passes() {
    let output = "[INFO] starting\n{\"testResults\":[{\"assertionResults\":[{\"title\":\"adds\",\"fullName\":\"adds\",\"status\":\"passed\",\"duration\":5}]}]}\n";
    let (outcome, verdicts) = reconcile_output(output, Framework::Vitest, &ids(&["adds"]));
    assert_eq!(outcome.path, ReconcilePath::Normalized);
    assert_eq!(verdicts.get("adds"), Some(&Verdict::Passed { duration_ms: 5.0 }));
}

#[test]
fn binary_garbage_errors() -> Result<()> {
    let bytes = [0x00, 0x9f, 0x92, 0x96, 0xff, 0x1b, b'[', b'x', 0x7f, 0xc3];
    let output = String::from_utf8_lossy(&bytes);
    let (outcome, verdicts) = reconcile_output(&output, Framework::Jest, &ids(&["a", "b"]));

    ensure!(
        outcome.path == ReconcilePath::Fallback,
        "garbage must go through the fallback parser, got {:?}",
        outcome.path
    );
    for record in verdicts.records() {
        ensure!(
            record.verdict.kind() == VerdictKind::Errored,
            "{} should be errored, got {:?}",
            record.id,
            record.verdict
        );
    }
    Ok(())
}

#[test]
fn template_identifier_aggregates_instances() {
    let test_ids = vec![
        DeclaredTestId::new("add", "add(%i, %i)")
            .with_file_path("src/add.test.js")
            .with_line_range(10, 14),
    ];
    let (_, verdicts) = reconcile_output(JEST_PARAMETERIZED, Framework::Jest, &test_ids);
    assert_eq!(
        verdicts.get("add"),
        Some(&Verdict::Failed {
            message: "add(1, 2): expect(received).toBe(expected)\n\
                      add(1, 2): Expected: 3\n\
                      add(1, 2): Received: 4"
                .to_owned(),
            location: Some(VerdictLocation {
                file_path: Some("src/add.test.js".into()),
                line: 11,
                column: 5,
            }),
            duration_ms: Some(9.0),
        })
    );
}

#[test]
fn literal_identifier_claims_single_instance() {
    // A literal label consumes its record first; the template gets the rest.
    let test_ids = vec![
        DeclaredTestId::new("literal", "add(1, 2)"),
        DeclaredTestId::new("template", "add(%i, %i)"),
    ];
    let (_, verdicts) = reconcile_output(JEST_PARAMETERIZED, Framework::Jest, &test_ids);
    assert_eq!(
        verdicts.get("literal").map(Verdict::kind),
        Some(VerdictKind::Failed)
    );
    assert_eq!(
        verdicts.get("template"),
        Some(&Verdict::Passed { duration_ms: 6.0 })
    );
}

#[test]
fn file_scoping_separates_same_named_tests() {
    let test_ids = vec![
        DeclaredTestId::new("b", "works").with_file_path("src/b.test.ts"),
        DeclaredTestId::new("a", "works").with_file_path("src/a.test.ts"),
    ];
    let (outcome, verdicts) = reconcile_output(VITEST_TWO_FILES, Framework::Vitest, &test_ids);
    assert_eq!(outcome.path, ReconcilePath::Normalized);
    assert_eq!(verdicts.get("a"), Some(&Verdict::Passed { duration_ms: 1.25 }));
    assert_eq!(
        verdicts.get("b"),
        Some(&Verdict::Failed {
            message: "AssertionError: expected false to be true".to_owned(),
            location: None,
            duration_ms: Some(0.5),
        })
    );
}

#[test]
fn node_tap_nested_subtests() {
    let test_ids = ids(&[
        "parser handles empty input",
        "rejects bad tokens",
        "parser",
    ]);
    let input = ReconcileInput::new(NODE_TAP_NESTED, Framework::NodeTap)
        .with_source_path(Utf8Path::new("test/parser.test.mjs"));
    let (outcome, verdicts) = reconcile(input, &test_ids);

    assert_eq!(outcome.path, ReconcilePath::Normalized);
    assert_eq!(
        verdicts.get("parser handles empty input"),
        Some(&Verdict::Passed { duration_ms: 0.41 })
    );
    assert_eq!(
        verdicts.get("rejects bad tokens"),
        Some(&Verdict::Failed {
            message: "Missing expected exception.".to_owned(),
            location: Some(VerdictLocation {
                file_path: Some("test/parser.test.mjs".into()),
                line: 8,
                column: 3,
            }),
            duration_ms: Some(1.2),
        })
    );
    // Groups produce no records, so the suite itself is never observed.
    assert_eq!(verdicts.get("parser"), Some(&Verdict::Skipped));
}

#[test]
fn fallback_error_token_never_passes() {
    for output in ["Error:", "Error:\nTests passed", "PASS\nError: boom"] {
        let (outcome, verdicts) = reconcile_output(output, Framework::Jest, &ids(&["boom", "x"]));
        assert_eq!(outcome.path, ReconcilePath::Fallback);
        for record in verdicts.records() {
            assert_ne!(
                record.verdict.kind(),
                VerdictKind::Passed,
                "{output:?} passed {}",
                record.id
            );
        }
    }
}

#[test]
fn fallback_pass_indicators() {
    let output = "PASS src/math.test.js\n  ✓ adds (5 ms)\n\nTests: 1 passed, 1 total\n";
    let (outcome, verdicts) = reconcile_output(output, Framework::Jest, &ids(&["adds"]));
    assert_eq!(outcome.path, ReconcilePath::Fallback);
    assert_eq!(verdicts.get("adds"), Some(&Verdict::Passed { duration_ms: 0.0 }));
}

#[test]
fn huge_duration_is_clamped_and_reported() -> Result<()> {
    let output = r#"{"testResults":[{"assertionResults":[{"title":"adds","fullName":"adds","status":"passed","duration":1e300}]}]}"#;
    let test_ids = ids(&["adds"]);

    let (_, verdicts) = reconcile_output(output, Framework::Vitest, &test_ids);
    assert_eq!(
        verdicts.get("adds"),
        Some(&Verdict::Passed {
            duration_ms: MAX_DURATION_MS
        })
    );

    let reconciler = Reconciler::new(ReconcileConfig::default())?;
    let mut sink = JunitSink::new("verdict");
    let outcome = reconciler.reconcile(
        &ReconcileInput::new(output, Framework::Vitest),
        &test_ids,
        &mut sink,
    );
    ensure!(outcome.counts.passed == 1, "one pass: {:?}", outcome.counts);
    let xml = sink.finish().to_string()?;
    ensure!(xml.contains(r#"name="adds""#), "report names the test: {xml}");
    Ok(())
}

#[test]
fn failed_record_with_bad_location_still_fails() {
    let output = r#"{"testResults":[{"assertionResults":[{"title":"divides","status":"failed","failureMessages":["boom"],"location":{"line":-1,"column":0}}]}]}"#;
    let (outcome, verdicts) = reconcile_output(output, Framework::Vitest, &ids(&["divides"]));
    assert_eq!(outcome.path, ReconcilePath::Normalized);
    assert_eq!(
        verdicts.get("divides"),
        Some(&Verdict::Failed {
            message: "boom".to_owned(),
            location: None,
            duration_ms: None,
        })
    );
}
