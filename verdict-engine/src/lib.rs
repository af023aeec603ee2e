// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Core functionality for verdict: reconciling what a JavaScript test runner printed with
//! the tests a client declared.
//!
//! The basic flow of a pass is:
//!
//! 1. If a session id is known, look for side-channel result lines ([`side_channel`]).
//! 2. Otherwise normalize the raw output with the framework's normalizer ([`normalize`]).
//! 3. Attribute the normalized records to declared tests ([`matcher`]).
//! 4. Emit exactly one verdict per declared test ([`reporter`]).
//! 5. If the output could not be normalized, derive verdicts heuristically ([`fallback`]).
//!
//! [`reconcile::Reconciler`] ties these together.

pub mod config;
pub mod errors;
pub mod fallback;
pub mod helpers;
pub mod matcher;
pub mod normalize;
pub mod reconcile;
pub mod reporter;
pub mod side_channel;
