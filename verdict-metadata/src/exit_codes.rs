// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

/// Documented exit codes for `verdict` invocations.
///
/// A reconciliation pass may finish with failing or undetermined verdicts, or may not run at
/// all because its inputs were unusable. This structure documents the exit codes for each case.
///
/// Unknown/unexpected failures will always result in exit code 1.
pub enum VerdictExitCode {}

impl VerdictExitCode {
    /// Every declared test passed or was skipped.
    pub const OK: i32 = 0;

    /// One or more declared tests failed.
    pub const TESTS_FAILED: i32 = 100;

    /// No test failed, but the result of one or more declared tests could not be determined
    /// from the runner output.
    pub const TESTS_ERRORED: i32 = 101;

    /// A user issue happened while setting up a reconciliation pass (unreadable input files,
    /// malformed test identifier lists, invalid configuration).
    pub const SETUP_ERROR: i32 = 96;

    /// Writing data to stdout or stderr produced an error.
    pub const WRITE_OUTPUT_ERROR: i32 = 110;
}
