// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Attribution of runner records to declared test identifiers.
//!
//! Identifiers are processed in declaration order. Each record is attributed to at most one
//! identifier: once a record is attributed it is consumed, and no later identifier can
//! claim it.

mod template;

pub use template::TemplatePattern;

use crate::{config::MatchingConfig, helpers::paths_refer_to_same_file};
use indexmap::IndexMap;
use std::collections::BTreeSet;
use tracing::{debug, trace};
use verdict_metadata::{DeclaredTestId, RecordRef};

/// The records attributed to one identifier.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MatchOutcome {
    /// No record matched the identifier.
    Unmatched,

    /// Exactly one record was attributed to the identifier.
    Single(usize),

    /// A parameterized identifier matched several records, which are reported together.
    ///
    /// Positions are in ascending order.
    Aggregated(Vec<usize>),
}

impl MatchOutcome {
    /// Returns the attributed record positions.
    pub fn positions(&self) -> &[usize] {
        match self {
            Self::Unmatched => &[],
            Self::Single(position) => std::slice::from_ref(position),
            Self::Aggregated(positions) => positions,
        }
    }
}

/// One identifier and the records attributed to it.
#[derive(Clone, Debug)]
pub struct IdentifierMatch<'ids> {
    /// The declared identifier.
    pub test_id: &'ids DeclaredTestId,
    /// The attributed records.
    pub outcome: MatchOutcome,
}

/// The result of matching a set of identifiers against records.
#[derive(Clone, Debug, Default)]
pub struct MatchResult<'ids> {
    matches: IndexMap<&'ids str, IdentifierMatch<'ids>>,
    consumed: ConsumedSet,
}

impl<'ids> MatchResult<'ids> {
    /// Iterates over identifiers and their matches, in declaration order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &IdentifierMatch<'ids>> + '_ {
        self.matches.values()
    }

    /// Returns the match for the identifier with the given id.
    pub fn get(&self, id: &str) -> Option<&IdentifierMatch<'ids>> {
        self.matches.get(id)
    }

    /// Returns the number of identifiers.
    pub fn len(&self) -> usize {
        self.matches.len()
    }

    /// Returns true if there are no identifiers.
    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    /// Returns the number of records attributed to some identifier.
    pub fn consumed_count(&self) -> usize {
        self.consumed.len()
    }
}

/// The set of record positions already attributed to an identifier.
#[derive(Clone, Debug, Default)]
struct ConsumedSet(BTreeSet<usize>);

impl ConsumedSet {
    fn contains(&self, position: usize) -> bool {
        self.0.contains(&position)
    }

    fn consume(&mut self, position: usize) {
        let inserted = self.0.insert(position);
        debug_assert!(inserted, "record {position} consumed twice");
    }

    fn len(&self) -> usize {
        self.0.len()
    }
}

/// Matches declared identifiers to runner records.
#[derive(Clone, Copy, Debug)]
pub struct Matcher<'cfg> {
    config: &'cfg MatchingConfig,
}

impl<'cfg> Matcher<'cfg> {
    /// Creates a new matcher.
    pub fn new(config: &'cfg MatchingConfig) -> Self {
        Self { config }
    }

    /// Attributes `records` to `test_ids`.
    ///
    /// Every identifier appears in the result, in declaration order.
    pub fn match_records<'ids>(
        &self,
        records: &[RecordRef<'_>],
        test_ids: &'ids [DeclaredTestId],
    ) -> MatchResult<'ids> {
        let mut result = MatchResult::default();
        for test_id in test_ids {
            let outcome = self.match_one(records, test_id, &mut result.consumed);
            trace!(id = %test_id.id, ?outcome, "matched identifier");
            result
                .matches
                .insert(test_id.id.as_str(), IdentifierMatch { test_id, outcome });
        }
        debug!(
            identifiers = result.len(),
            records = records.len(),
            consumed = result.consumed_count(),
            "matching complete",
        );
        result
    }

    fn match_one(
        &self,
        records: &[RecordRef<'_>],
        test_id: &DeclaredTestId,
        consumed: &mut ConsumedSet,
    ) -> MatchOutcome {
        let template = TemplatePattern::compile(&test_id.label);
        let candidates: Vec<usize> = records
            .iter()
            .enumerate()
            .filter(|&(position, record)| {
                !consumed.contains(position)
                    && self.in_scope(record, test_id)
                    && names_match(record, &test_id.label, template.as_ref())
            })
            .map(|(position, _)| position)
            .collect();

        match candidates.as_slice() {
            [] => MatchOutcome::Unmatched,
            [position] => {
                consumed.consume(*position);
                MatchOutcome::Single(*position)
            }
            _ if template.is_some() => {
                for &position in &candidates {
                    consumed.consume(position);
                }
                MatchOutcome::Aggregated(candidates)
            }
            _ => {
                let position = tie_break(records, &candidates, test_id);
                debug!(
                    id = %test_id.id,
                    candidates = candidates.len(),
                    chosen = position,
                    "resolved duplicate test names",
                );
                consumed.consume(position);
                MatchOutcome::Single(position)
            }
        }
    }

    fn in_scope(&self, record: &RecordRef<'_>, test_id: &DeclaredTestId) -> bool {
        if !self.config.scope_to_file {
            return true;
        }
        match (test_id.file_path.as_deref(), record.suite_path) {
            (Some(declared), Some(reported)) => paths_refer_to_same_file(declared, reported),
            _ => true,
        }
    }
}

fn names_match(record: &RecordRef<'_>, label: &str, template: Option<&TemplatePattern>) -> bool {
    let record = record.record;
    if record.full_name == label || record.title == label {
        return true;
    }
    template.is_some_and(|template| {
        template.is_match(&record.full_name) || template.is_match(&record.title)
    })
}

/// Picks one of several records with the same name.
///
/// The record whose 0-indexed line is closest to the start of the declared range wins.
/// Records without a location rank after every located record, and remaining ties go to
/// the earliest record.
fn tie_break(records: &[RecordRef<'_>], candidates: &[usize], test_id: &DeclaredTestId) -> usize {
    let Some(range) = test_id.line_range else {
        return candidates[0];
    };
    candidates
        .iter()
        .copied()
        .min_by_key(|&position| {
            let distance = records[position]
                .record
                .source_location
                .map(|location| location.line.saturating_sub(1).abs_diff(range.start));
            (distance.is_none(), distance.unwrap_or(0), position)
        })
        .unwrap_or(candidates[0])
}
