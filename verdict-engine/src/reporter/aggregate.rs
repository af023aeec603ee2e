// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{failure_message, verdict_location};
use swrite::{SWrite, swrite};
use verdict_metadata::{AssertionStatus, DeclaredTestId, RecordRef, Verdict, clamp_duration_ms};

/// Combines the records matched by a parameterized identifier into one verdict.
///
/// The group fails if any member failed, passes if any member passed and none failed, and
/// is skipped otherwise. Durations are summed over members that reported one. Each line of
/// a failure message is prefixed with the failing member's title, or its 1-based position
/// in the group if the title is empty.
pub fn aggregate_verdict(members: &[RecordRef<'_>], test_id: &DeclaredTestId) -> Verdict {
    let any_failed = members
        .iter()
        .any(|member| member.record.status == AssertionStatus::Failed);
    let any_passed = members
        .iter()
        .any(|member| member.record.status == AssertionStatus::Passed);
    let total_duration_ms = clamp_duration_ms(
        members
            .iter()
            .filter_map(|member| member.record.duration_ms)
            .sum(),
    );

    if any_failed {
        let mut message = String::new();
        for (index, member) in members.iter().enumerate() {
            if member.record.status != AssertionStatus::Failed {
                continue;
            }
            let prefix = if member.record.title.is_empty() {
                (index + 1).to_string()
            } else {
                member.record.title.clone()
            };
            for line in failure_message(&member.record.failure_messages).lines() {
                if !message.is_empty() {
                    message.push('\n');
                }
                swrite!(message, "{prefix}: {line}");
            }
        }

        let location = members
            .iter()
            .filter(|member| member.record.status == AssertionStatus::Failed)
            .find_map(|member| verdict_location(member, test_id));

        Verdict::Failed {
            message,
            location,
            duration_ms: Some(total_duration_ms),
        }
    } else if any_passed {
        Verdict::Passed {
            duration_ms: total_duration_ms,
        }
    } else {
        Verdict::Skipped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use verdict_metadata::{AssertionRecord, MAX_DURATION_MS, SourceLocation, VerdictLocation};

    fn member(title: &str, status: AssertionStatus, duration_ms: f64) -> AssertionRecord {
        AssertionRecord::new(vec![], title, "", status).with_duration_ms(Some(duration_ms))
    }

    fn refs(records: &[AssertionRecord]) -> Vec<RecordRef<'_>> {
        records
            .iter()
            .map(|record| RecordRef {
                suite_path: None,
                record,
            })
            .collect()
    }

    #[test]
    fn failed_member_fails_group() {
        let records = vec![
            member("add(1, 1)", AssertionStatus::Passed, 1.0),
            member("add(1, 2)", AssertionStatus::Failed, 2.0)
                .with_failure_messages(vec!["expected 3\nreceived 4".into()])
                .with_source_location(Some(SourceLocation { line: 7, column: 2 })),
            member("add(2, 2)", AssertionStatus::Passed, 4.0),
        ];
        let test_id = DeclaredTestId::new("t", "add(%i, %i)").with_file_path("math.test.js");

        assert_eq!(
            aggregate_verdict(&refs(&records), &test_id),
            Verdict::Failed {
                message: "add(1, 2): expected 3\nadd(1, 2): received 4".to_owned(),
                location: Some(VerdictLocation {
                    file_path: Some("math.test.js".into()),
                    line: 6,
                    column: 2,
                }),
                duration_ms: Some(7.0),
            }
        );
    }

    #[test]
    fn untitled_members_use_ordinal() {
        let records = vec![
            member("", AssertionStatus::Passed, 1.0),
            member("", AssertionStatus::Failed, 1.0),
        ];
        let test_id = DeclaredTestId::new("t", "%s");
        let Verdict::Failed { message, location, .. } = aggregate_verdict(&refs(&records), &test_id)
        else {
            panic!("group with a failed member must fail");
        };
        assert_eq!(message, "2: test failed");
        assert_eq!(location, None);
    }

    #[test]
    fn passed_and_skipped_groups() {
        let records = vec![
            member("a", AssertionStatus::Passed, 1.5),
            member("b", AssertionStatus::Pending, 0.0),
            member("c", AssertionStatus::Passed, 2.5),
        ];
        let test_id = DeclaredTestId::new("t", "$name");
        assert_eq!(
            aggregate_verdict(&refs(&records), &test_id),
            Verdict::Passed { duration_ms: 4.0 }
        );

        let pending = vec![
            member("a", AssertionStatus::Pending, 0.0),
            member("b", AssertionStatus::Pending, 0.0),
        ];
        assert_eq!(aggregate_verdict(&refs(&pending), &test_id), Verdict::Skipped);
    }

    #[test]
    fn summed_duration_stays_in_range() {
        let mut records = vec![
            member("a", AssertionStatus::Passed, f64::MAX),
            member("b", AssertionStatus::Passed, f64::MAX),
        ];
        // Bypass the clamping builder, as a record deserialized without canonicalization would.
        records[1].duration_ms = Some(f64::MAX);
        let test_id = DeclaredTestId::new("t", "%s");

        let verdict = aggregate_verdict(&refs(&records), &test_id);
        assert_eq!(
            verdict,
            Verdict::Passed {
                duration_ms: MAX_DURATION_MS
            }
        );
        let json = serde_json::to_string(&verdict).expect("verdict serializes");
        assert!(json.contains("durationMs"), "duration survives: {json}");
        assert!(!json.contains("null"), "duration is not null: {json}");
    }
}
