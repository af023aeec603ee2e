// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reconciles what a JavaScript test runner printed with the tests a client declared.
//!
//! `verdict reconcile` reads the captured output of one runner invocation and a JSON list of
//! declared tests, and reports exactly one verdict per declared test.

#![warn(missing_docs)]

mod dispatch;
mod display;
mod errors;
mod output;

#[doc(hidden)]
pub use dispatch::*;
#[doc(hidden)]
pub use errors::*;
#[doc(hidden)]
pub use output::{OutputContext, OutputWriter};
