// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Parsing of TAP output as emitted by `node --test`.
//!
//! Nesting is expressed with indentation (four spaces per level). A named test opens with
//! `# Subtest: <name>` and closes with a test point (`ok N - <name>` or `not ok N - <name>`)
//! at the same depth, optionally followed by an indented YAML diagnostic block.

use crate::errors::NormalizeError;
use camino::Utf8Path;
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;
use verdict_metadata::{AssertionRecord, AssertionStatus, RunSummary, SourceLocation, SuiteResult};

static TEST_POINT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<not>not )?ok\b(?:\s+(?P<number>\d+))?(?:\s+-)?\s*(?P<description>.*?)(?:\s+#\s*(?P<directive>(?i:skip|todo))\b.*)?$",
    )
    .expect("test point regex is valid")
});

const INDENT_WIDTH: usize = 4;

/// Parses TAP output into a [`RunSummary`] with a single suite named after `source_path`.
pub fn parse_line_protocol(
    output: &str,
    source_path: Option<&Utf8Path>,
) -> Result<RunSummary, NormalizeError> {
    let mut parser = TapParser::default();
    for line in output.lines() {
        if parser.process_line(line) == LineAction::Stop {
            debug!("TAP stream bailed out, ignoring the rest of the output");
            break;
        }
    }
    let records = parser.finish();
    if records.is_empty() {
        return Err(NormalizeError::NoTestPoints);
    }

    Ok(RunSummary::from_suites(vec![SuiteResult {
        name: source_path.map(Utf8Path::to_path_buf),
        assertion_results: records,
    }]))
}

#[derive(Debug, PartialEq, Eq)]
enum LineAction {
    Continue,
    Stop,
}

#[derive(Debug)]
struct OpenSubtest {
    depth: usize,
    name: String,
    has_children: bool,
}

/// A test point waiting for its optional diagnostic block.
#[derive(Debug)]
struct PendingPoint {
    depth: usize,
    ancestors: Vec<String>,
    title: String,
    status: AssertionStatus,
    is_group: bool,
    diagnostics: Vec<String>,
    in_diagnostics: bool,
}

#[derive(Debug, Default)]
struct TapParser {
    stack: Vec<OpenSubtest>,
    pending: Option<PendingPoint>,
    records: Vec<AssertionRecord>,
}

impl TapParser {
    fn process_line(&mut self, line: &str) -> LineAction {
        let line = line.trim_end_matches('\r');
        let content = line.trim_start();
        let depth = (line.len() - content.len()) / INDENT_WIDTH;

        if let Some(pending) = &mut self.pending {
            if pending.in_diagnostics {
                if content == "..." {
                    pending.in_diagnostics = false;
                    self.flush_pending();
                } else {
                    pending.diagnostics.push(line.to_owned());
                }
                return LineAction::Continue;
            }
            if content == "---" {
                pending.in_diagnostics = true;
                return LineAction::Continue;
            }
        }

        if content.starts_with("Bail out!") {
            return LineAction::Stop;
        }

        if let Some(name) = content.strip_prefix("# Subtest:") {
            self.flush_pending();
            self.stack.retain(|open| open.depth < depth);
            self.mark_parent(depth);
            self.stack.push(OpenSubtest {
                depth,
                name: name.trim().to_owned(),
                has_children: false,
            });
            return LineAction::Continue;
        }

        if let Some(captures) = TEST_POINT.captures(content) {
            self.flush_pending();

            let description = captures
                .name("description")
                .map_or("", |m| m.as_str())
                .to_owned();
            let directive = captures
                .name("directive")
                .map(|m| m.as_str().to_ascii_lowercase());
            let status = match (captures.name("not").is_some(), directive.as_deref()) {
                (_, Some(_)) => AssertionStatus::Pending,
                (true, None) => AssertionStatus::Failed,
                (false, None) => AssertionStatus::Passed,
            };

            // Deeper subtests are closed by now; the subtest at this depth is the one closing.
            self.stack.retain(|open| open.depth <= depth);
            let closing = match self.stack.last() {
                Some(open) if open.depth == depth => self.stack.pop(),
                _ => None,
            };
            let (title, has_children) = match closing {
                Some(open) if description.is_empty() => (open.name, open.has_children),
                Some(open) => (description, open.has_children),
                None => (description, false),
            };
            self.mark_parent(depth);

            self.pending = Some(PendingPoint {
                depth,
                ancestors: self.stack.iter().map(|open| open.name.clone()).collect(),
                title,
                status,
                is_group: has_children,
                diagnostics: Vec::new(),
                in_diagnostics: false,
            });
        }

        // Plan lines, version lines, comments and interleaved stdout are ignored.
        LineAction::Continue
    }

    fn mark_parent(&mut self, depth: usize) {
        if let Some(parent) = self.stack.iter_mut().rev().find(|open| open.depth < depth) {
            parent.has_children = true;
        }
    }

    fn flush_pending(&mut self) {
        let Some(point) = self.pending.take() else {
            return;
        };
        let diagnostics = Diagnostics::parse(&point.diagnostics);
        if point.is_group || diagnostics.is_suite {
            debug!(depth = point.depth, "TAP test point `{}` is a group", point.title);
            return;
        }

        let failure_messages = match (point.status, diagnostics.error) {
            (AssertionStatus::Failed, Some(error)) => vec![error],
            _ => Vec::new(),
        };
        self.records.push(
            AssertionRecord::new(point.ancestors, point.title, "", point.status)
                .with_duration_ms(diagnostics.duration_ms)
                .with_failure_messages(failure_messages)
                .with_source_location(diagnostics.location),
        );
    }

    fn finish(mut self) -> Vec<AssertionRecord> {
        self.flush_pending();
        self.records
    }
}

/// The fields of a YAML diagnostic block that carry result information.
#[derive(Debug, Default, PartialEq)]
struct Diagnostics {
    duration_ms: Option<f64>,
    error: Option<String>,
    location: Option<SourceLocation>,
    is_suite: bool,
}

impl Diagnostics {
    fn parse(lines: &[String]) -> Self {
        let mut diagnostics = Self::default();
        let Some(base_indent) = lines.iter().map(|line| indent_of(line)).min() else {
            return diagnostics;
        };

        let mut index = 0;
        while index < lines.len() {
            let line = &lines[index];
            index += 1;
            if indent_of(line) != base_indent {
                continue;
            }
            let Some((key, value)) = line.trim().split_once(':') else {
                continue;
            };
            let value = value.trim();

            let value = if is_block_indicator(value) {
                let start = index;
                while index < lines.len() && indent_of(&lines[index]) > base_indent {
                    index += 1;
                }
                block_scalar(&lines[start..index])
            } else {
                unquote(value)
            };

            match key.trim() {
                "duration_ms" => diagnostics.duration_ms = value.parse().ok(),
                "type" => diagnostics.is_suite = value == "suite",
                "error" | "message" if diagnostics.error.is_none() && !value.is_empty() => {
                    diagnostics.error = Some(value);
                }
                "location" => diagnostics.location = parse_location(&value),
                _ => {}
            }
        }
        diagnostics
    }
}

fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

fn is_block_indicator(value: &str) -> bool {
    matches!(value, "|" | "|-" | "|+" | ">" | ">-" | ">+")
}

fn block_scalar(lines: &[String]) -> String {
    let indent = lines
        .iter()
        .filter(|line| !line.trim().is_empty())
        .map(|line| indent_of(line))
        .min()
        .unwrap_or(0);
    lines
        .iter()
        .map(|line| line.get(indent..).unwrap_or("").trim_end())
        .collect::<Vec<_>>()
        .join("\n")
}

fn unquote(value: &str) -> String {
    if value.len() >= 2 && value.starts_with('\'') && value.ends_with('\'') {
        return value[1..value.len() - 1].replace("''", "'");
    }
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        return serde_json::from_str(value).unwrap_or_else(|_| value[1..value.len() - 1].to_owned());
    }
    value.to_owned()
}

/// Parses `path:line:col`, where the path itself may contain colons.
fn parse_location(value: &str) -> Option<SourceLocation> {
    let mut parts = value.rsplitn(3, ':');
    let column = parts.next()?.parse().ok()?;
    let line = parts.next()?.parse().ok()?;
    parts.next()?;
    Some(SourceLocation { line, column })
}
