// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Structured data shared by the verdict reconciliation engine and its consumers.
//!
//! This crate contains:
//!
//! * the canonical result model ([`RunSummary`] and friends) that every runner output format is
//!   normalized into,
//! * [`DeclaredTestId`], the statically known tests a host expects verdicts for,
//! * [`Verdict`] and [`VerdictRecord`], the per-test outcomes produced by a reconciliation pass,
//! * [`VerdictExitCode`], the documented exit codes of the `verdict` binary.

mod errors;
mod exit_codes;
mod model;
mod test_id;
mod verdict;

pub use errors::*;
pub use exit_codes::*;
pub use model::*;
pub use test_id::*;
pub use verdict::*;
