// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! General support code for verdict-engine.

use camino::{Utf8Path, Utf8PathBuf};

/// Utilities for pluralizing various words based on count.
pub mod plural {
    /// Returns "test" if `count` is 1, otherwise "tests".
    pub fn tests_str(count: usize) -> &'static str {
        if count == 1 { "test" } else { "tests" }
    }

    /// Returns "record" if `count` is 1, otherwise "records".
    pub fn records_str(count: usize) -> &'static str {
        if count == 1 { "record" } else { "records" }
    }

    /// Returns "suite" if `count` is 1, otherwise "suites".
    pub fn suites_str(count: usize) -> &'static str {
        if count == 1 { "suite" } else { "suites" }
    }

    /// Returns "line" if `count` is 1, otherwise "lines".
    pub fn lines_str(count: usize) -> &'static str {
        if count == 1 { "line" } else { "lines" }
    }
}

/// Returns true if `a` and `b` refer to the same file.
///
/// Runners report absolute paths while declared tests usually carry workspace-relative
/// ones, so two paths are the same file if they are equal or if one is a component-wise
/// suffix of the other. Backslash separators are treated as forward slashes.
pub fn paths_refer_to_same_file(a: &Utf8Path, b: &Utf8Path) -> bool {
    let a = convert_to_forward_slash(a);
    let b = convert_to_forward_slash(b);
    a == b || a.ends_with(&b) || b.ends_with(&a)
}

fn convert_to_forward_slash(path: &Utf8Path) -> Utf8PathBuf {
    path.as_str().replace('\\', "/").into()
}
