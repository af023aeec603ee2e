// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::DeclaredTestsError;
use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A statically known test node that the host expects a verdict for.
///
/// Declared identifiers are owned by the host's test tree. The label is the display name and
/// may contain template placeholders such as `%i`, `$name` or `${expr}` for parameterized
/// tests.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeclaredTestId {
    /// A unique identifier for this test in the host's tree.
    pub id: String,

    /// The display name.
    pub label: String,

    /// The source file the test is declared in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<Utf8PathBuf>,

    /// The lines the declaration spans, 0-indexed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_range: Option<LineRange>,
}

impl DeclaredTestId {
    /// Creates a new identifier with no file path or line range.
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            file_path: None,
            line_range: None,
        }
    }

    /// Sets the file path.
    pub fn with_file_path(mut self, file_path: impl Into<Utf8PathBuf>) -> Self {
        self.file_path = Some(file_path.into());
        self
    }

    /// Sets the line range.
    pub fn with_line_range(mut self, start: u32, end: u32) -> Self {
        self.line_range = Some(LineRange { start, end });
        self
    }

    /// Parses a JSON array of declared identifiers.
    ///
    /// Identifiers must be unique and labels must be non-empty.
    pub fn parse_list(json: &str) -> Result<Vec<Self>, DeclaredTestsError> {
        let ids: Vec<Self> = serde_json::from_str(json).map_err(DeclaredTestsError::Json)?;

        let mut seen = BTreeSet::new();
        for test_id in &ids {
            if test_id.label.is_empty() {
                return Err(DeclaredTestsError::EmptyLabel {
                    id: test_id.id.clone(),
                });
            }
            if !seen.insert(test_id.id.as_str()) {
                return Err(DeclaredTestsError::DuplicateId {
                    id: test_id.id.clone(),
                });
            }
        }

        Ok(ids)
    }
}

/// A 0-indexed, inclusive range of lines in a source file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineRange {
    /// The first line.
    pub start: u32,
    /// The last line.
    pub end: u32,
}
