// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration for reconciliation passes.
//!
//! Configuration is read from an optional TOML file layered over defaults embedded in this
//! crate. It is loaded once, before any reconciliation pass, and is read-only afterwards.

mod imp;

pub use imp::*;
