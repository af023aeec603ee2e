// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests for reconciliation passes.

mod end_to_end;
mod fixtures;
mod properties;
