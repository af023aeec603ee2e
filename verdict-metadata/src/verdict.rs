// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The final outcome reported for one declared test identifier.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum Verdict {
    /// The runner reported a pass.
    Passed {
        /// How long the test took, in milliseconds.
        duration_ms: f64,
    },

    /// The runner reported a failure.
    Failed {
        /// The failure messages, joined by newlines.
        message: String,
        /// Where the failure happened, if known.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        location: Option<VerdictLocation>,
        /// How long the test took, in milliseconds, if known.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        duration_ms: Option<f64>,
    },

    /// The test was declared but either skipped by the runner or never observed.
    Skipped,

    /// The result could not be determined from the runner output.
    Errored {
        /// Why the result could not be determined.
        message: String,
    },
}

impl Verdict {
    /// Returns the kind of this verdict.
    pub fn kind(&self) -> VerdictKind {
        match self {
            Self::Passed { .. } => VerdictKind::Passed,
            Self::Failed { .. } => VerdictKind::Failed,
            Self::Skipped => VerdictKind::Skipped,
            Self::Errored { .. } => VerdictKind::Errored,
        }
    }
}

/// The kind of a [`Verdict`], without any associated data.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum VerdictKind {
    /// See [`Verdict::Passed`].
    Passed,
    /// See [`Verdict::Failed`].
    Failed,
    /// See [`Verdict::Skipped`].
    Skipped,
    /// See [`Verdict::Errored`].
    Errored,
}

impl VerdictKind {
    /// Returns the lowercase name of this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
            Self::Errored => "errored",
        }
    }
}

impl fmt::Display for VerdictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A location attached to a failed verdict, in editor convention: the line is 0-indexed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerdictLocation {
    /// The file the failure is in, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<Utf8PathBuf>,
    /// The 0-indexed line.
    pub line: u32,
    /// The column.
    pub column: u32,
}

/// A verdict paired with the identifier it was reported for.
///
/// This is the unit of machine-readable output: one JSON object per line.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VerdictRecord {
    /// The declared test identifier.
    pub id: String,
    /// The verdict.
    #[serde(flatten)]
    pub verdict: Verdict,
}
