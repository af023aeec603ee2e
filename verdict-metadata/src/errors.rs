// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::{error, fmt};

/// An error that occurs while reading a list of declared test identifiers.
#[derive(Debug)]
pub enum DeclaredTestsError {
    /// Error parsing the JSON input.
    Json(serde_json::Error),

    /// The same identifier was declared more than once.
    DuplicateId {
        /// The repeated identifier.
        id: String,
    },

    /// An identifier was declared with an empty label.
    EmptyLabel {
        /// The identifier with the empty label.
        id: String,
    },
}

impl fmt::Display for DeclaredTestsError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Json(_) => {
                write!(f, "parsing declared test identifiers failed")
            }
            Self::DuplicateId { id } => {
                write!(f, "test identifier `{id}` was declared more than once")
            }
            Self::EmptyLabel { id } => {
                write!(f, "test identifier `{id}` has an empty label")
            }
        }
    }
}

impl error::Error for DeclaredTestsError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Self::Json(err) => Some(err),
            Self::DuplicateId { .. } | Self::EmptyLabel { .. } => None,
        }
    }
}
