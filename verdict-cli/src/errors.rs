// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::output::NO_HEADING_TARGET;
use camino::Utf8PathBuf;
use owo_colors::{OwoColorize, Style};
use std::error::Error;
use thiserror::Error;
use tracing::error;
use verdict_engine::{errors::ConfigParseError, reconcile::ReconcilerBuildError};
use verdict_metadata::{DeclaredTestsError, VerdictExitCode};

pub(crate) type Result<T, E = ExpectedError> = std::result::Result<T, E>;

// Note that the #[error()] strings are mostly placeholder messages -- the expected way to print out
// errors is with the display_to_stderr method, which colorizes errors.

/// An expected error: the inputs or environment were unusable.
#[derive(Debug, Error)]
#[doc(hidden)]
pub enum ExpectedError {
    #[error("config parse error")]
    ConfigParseError {
        #[from]
        err: ConfigParseError,
    },
    #[error("failed to prepare reconciler")]
    ReconcilerBuildError {
        #[from]
        err: ReconcilerBuildError,
    },
    #[error("failed to read runner output")]
    RunnerOutputReadError {
        /// `None` for standard input.
        path: Option<Utf8PathBuf>,
        #[source]
        err: std::io::Error,
    },
    #[error("failed to read declared tests")]
    DeclaredTestsReadError {
        path: Utf8PathBuf,
        #[source]
        err: std::io::Error,
    },
    #[error("failed to parse declared tests")]
    DeclaredTestsParseError {
        path: Utf8PathBuf,
        #[source]
        err: DeclaredTestsError,
    },
    #[error("error writing output")]
    WriteOutputError {
        #[source]
        err: std::io::Error,
    },
    #[error("error serializing JUnit report")]
    JunitSerializeError {
        #[source]
        err: quick_junit::SerializeError,
    },
}

impl ExpectedError {
    pub(crate) fn write_output_error(err: std::io::Error) -> Self {
        Self::WriteOutputError { err }
    }

    /// Returns the exit code for the process.
    pub fn process_exit_code(&self) -> i32 {
        match self {
            Self::ConfigParseError { .. }
            | Self::ReconcilerBuildError { .. }
            | Self::RunnerOutputReadError { .. }
            | Self::DeclaredTestsReadError { .. }
            | Self::DeclaredTestsParseError { .. } => VerdictExitCode::SETUP_ERROR,
            Self::WriteOutputError { .. } | Self::JunitSerializeError { .. } => {
                VerdictExitCode::WRITE_OUTPUT_ERROR
            }
        }
    }

    /// Displays this error to stderr.
    pub fn display_to_stderr(&self) {
        let colorize = supports_color::on_cached(supports_color::Stream::Stderr).is_some();
        let style = path_style(colorize);
        let mut next_error = match self {
            Self::ConfigParseError { err } => {
                error!("{err}");
                err.source()
            }
            Self::ReconcilerBuildError { err } => {
                error!("{err}");
                err.source()
            }
            Self::RunnerOutputReadError { path, err } => {
                match path {
                    Some(path) => error!(
                        "failed to read runner output from `{}`",
                        path.style(style)
                    ),
                    None => error!("failed to read runner output from standard input"),
                }
                Some(err as &dyn Error)
            }
            Self::DeclaredTestsReadError { path, err } => {
                error!(
                    "failed to read declared tests from `{}`",
                    path.style(style)
                );
                Some(err as &dyn Error)
            }
            Self::DeclaredTestsParseError { path, err } => {
                error!(
                    "failed to parse declared tests in `{}`",
                    path.style(style)
                );
                Some(err as &dyn Error)
            }
            Self::WriteOutputError { err } => {
                error!("error writing output");
                Some(err as &dyn Error)
            }
            Self::JunitSerializeError { err } => {
                error!("error serializing JUnit report");
                Some(err as &dyn Error)
            }
        };

        while let Some(err) = next_error {
            error!(target: NO_HEADING_TARGET, "\nCaused by:\n  {}", err);
            next_error = err.source();
        }
    }
}

fn path_style(colorize: bool) -> Style {
    if colorize {
        Style::new().bold()
    } else {
        Style::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn paths_are_plain_without_color() {
        let path = Utf8PathBuf::from("tests.json");
        assert_eq!(path.style(path_style(false)).to_string(), "tests.json");
        assert_eq!(
            path.style(path_style(true)).to_string(),
            "\u{1b}[1mtests.json\u{1b}[0m"
        );
    }

    #[test]
    fn setup_errors_exit_with_setup_code() {
        let err = ExpectedError::DeclaredTestsReadError {
            path: "tests.json".into(),
            err: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert_eq!(err.process_exit_code(), VerdictExitCode::SETUP_ERROR);
        err.display_to_stderr();

        let err = ExpectedError::write_output_error(std::io::Error::from(
            std::io::ErrorKind::BrokenPipe,
        ));
        assert_eq!(err.process_exit_code(), VerdictExitCode::WRITE_OUTPUT_ERROR);
        err.display_to_stderr();
    }
}
