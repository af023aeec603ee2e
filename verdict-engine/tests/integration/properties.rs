// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::fixtures::*;
use proptest::prelude::*;
use test_strategy::proptest;
use verdict_engine::normalize::{Framework, Normalize};
use verdict_metadata::{
    AssertionRecord, AssertionStatus, RunSummary, SourceLocation, SuiteResult, VerdictKind,
};

fn record_strategy() -> impl Strategy<Value = AssertionRecord> {
    (
        prop::collection::vec("[a-z]{1,6}", 0..3),
        "[a-zA-Z0-9 ()]{1,12}",
        any::<AssertionStatus>(),
        prop::option::of((0u32..100_000).prop_map(|n| f64::from(n) / 4.0)),
        prop::collection::vec("[a-z :]{0,20}", 0..3),
        prop::option::of((1u32..5_000, 0u32..200)),
    )
        .prop_map(|(ancestors, title, status, duration, messages, location)| {
            AssertionRecord::new(ancestors, title, "", status)
                .with_duration_ms(duration)
                .with_failure_messages(messages)
                .with_source_location(location.map(|(line, column)| SourceLocation { line, column }))
        })
}

fn summary_strategy() -> impl Strategy<Value = RunSummary> {
    prop::collection::vec(
        (
            prop::option::of("[a-z]{1,8}/[a-z]{1,8}\\.test\\.js"),
            prop::collection::vec(record_strategy(), 0..6),
        ),
        0..4,
    )
    .prop_map(|suites| {
        RunSummary::from_suites(
            suites
                .into_iter()
                .map(|(name, assertion_results)| SuiteResult {
                    name: name.map(Into::into),
                    assertion_results,
                })
                .collect(),
        )
    })
}

#[proptest(cases = 64)]
fn normalized_model_round_trips(#[strategy(summary_strategy())] summary: RunSummary) {
    let serialized = serde_json::to_string(&summary).expect("model serializes");
    for framework in [Framework::Jest, Framework::Vitest] {
        let reparsed = framework
            .normalizer(None)
            .normalize(&serialized)
            .expect("serialized model is a valid report");
        prop_assert_eq!(&reparsed, &summary);
    }
}

#[proptest(cases = 256)]
fn normalizers_never_panic(output: String) {
    for framework in [Framework::Jest, Framework::Vitest, Framework::NodeTap] {
        let _ = framework.normalizer(None).normalize(&output);
    }
}

#[proptest(cases = 128)]
fn no_pass_without_pass_evidence(#[strategy("[a-zA-Z:!. \n]{0,80}")] noise: String) {
    // Output with a failure indicator and no parseable report never yields a pass.
    let output = format!("{noise}\nError: something broke\n{noise}");
    let (_, verdicts) = reconcile_output(&output, Framework::Jest, &ids(&["a", "b c"]));
    for record in verdicts.records() {
        prop_assert_ne!(record.verdict.kind(), VerdictKind::Passed);
    }
}
