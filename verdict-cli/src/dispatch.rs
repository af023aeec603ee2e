// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{
    ExpectedError, Result,
    display::HumanDisplayer,
    output::{OutputContext, OutputOpts, OutputWriter, clap_styles},
};
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::io::{Read, Write};
use tracing::{debug, warn};
use verdict_engine::{
    config::{CONFIG_FILE_ENV, ConfigLocation, ReconcileConfig},
    errors::DisplayErrorChain,
    normalize::Framework,
    reconcile::{ReconcileInput, ReconcileOutcome, ReconcilePath, Reconciler},
    reporter::{JunitSink, VerdictCollector},
};
use verdict_metadata::{DeclaredTestId, VerdictExitCode};

/// Reconciles JavaScript test-runner output with declared tests.
///
/// Reads the captured output of one runner invocation together with the tests a client
/// expects results for, and reports exactly one verdict per declared test.
#[derive(Debug, Parser)]
#[command(
    version,
    name = "verdict",
    styles = clap_styles::style(),
    max_term_width = 100,
)]
pub struct VerdictApp {
    #[clap(flatten)]
    output: OutputOpts,

    #[clap(subcommand)]
    command: Command,
}

impl VerdictApp {
    /// Initializes the output context.
    pub fn init_output(&self) -> OutputContext {
        self.output.init()
    }

    /// Executes the app, returning the process exit code.
    pub fn exec(self, output: OutputContext, output_writer: &mut OutputWriter) -> Result<i32> {
        match self.command {
            Command::Reconcile(opts) => opts.exec(output, output_writer),
        }
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Reconcile captured runner output with declared tests
    ///
    /// Exits with 100 if any declared test failed, or 101 if none failed but the outcome of
    /// at least one could not be determined.
    #[command(visible_alias = "r")]
    Reconcile(ReconcileOpts),
}

#[derive(Debug, Args)]
struct ReconcileOpts {
    /// File containing the captured runner output, or `-` for standard input
    #[arg(long = "output", value_name = "PATH")]
    output_path: Utf8PathBuf,

    /// JSON file listing the declared tests
    #[arg(long, value_name = "PATH")]
    tests: Utf8PathBuf,

    /// The framework that produced the output
    #[arg(long, value_enum, value_name = "FRAMEWORK")]
    framework: FrameworkOpt,

    /// The file the run was scoped to
    ///
    /// Line-protocol output carries no file names; this path names its results.
    #[arg(long, value_name = "PATH")]
    source_path: Option<Utf8PathBuf>,

    /// Session id that structured side-channel lines for this run are tagged with
    #[arg(long, value_name = "ID")]
    session: Option<String>,

    #[clap(flatten)]
    config_opts: ConfigOpts,

    /// Output format
    #[arg(
        long,
        short = 'T',
        value_enum,
        default_value_t,
        value_name = "FORMAT"
    )]
    message_format: MessageFormat,
}

impl ReconcileOpts {
    fn exec(self, output: OutputContext, output_writer: &mut OutputWriter) -> Result<i32> {
        let config = self.config_opts.make_config()?;
        let reconciler = Reconciler::new(config)?;

        let test_ids = read_declared_tests(&self.tests)?;
        let raw_output = read_runner_output(&self.output_path)?;
        debug!(
            "read {} bytes of {} output, {} declared",
            raw_output.len(),
            self.framework,
            test_ids.len(),
        );

        let mut input = ReconcileInput::new(&raw_output, self.framework.into());
        if let Some(source_path) = &self.source_path {
            input = input.with_source_path(source_path);
        }
        if let Some(session) = &self.session {
            input = input.with_session(session);
        }

        let mut writer = output_writer.stdout_writer();
        let outcome = match self.message_format {
            MessageFormat::Human => {
                let mut collector = VerdictCollector::new();
                let outcome = reconciler.reconcile(&input, &test_ids, &mut collector);
                HumanDisplayer::new(output.verbose, output.colorize_stdout())
                    .write_verdicts(collector.records(), &outcome, &mut writer)
                    .map_err(ExpectedError::write_output_error)?;
                outcome
            }
            MessageFormat::Json => {
                let mut collector = VerdictCollector::new();
                let outcome = reconciler.reconcile(&input, &test_ids, &mut collector);
                for record in collector.records() {
                    serde_json::to_writer(&mut writer, record)
                        .map_err(|err| ExpectedError::write_output_error(err.into()))?;
                    writeln!(writer).map_err(ExpectedError::write_output_error)?;
                }
                outcome
            }
            MessageFormat::Junit => {
                let mut sink = JunitSink::new("verdict");
                let outcome = reconciler.reconcile(&input, &test_ids, &mut sink);
                sink.finish()
                    .serialize(&mut writer)
                    .map_err(|err| ExpectedError::JunitSerializeError { err })?;
                outcome
            }
        };
        writer.flush().map_err(ExpectedError::write_output_error)?;

        log_fallback(&outcome);
        Ok(exit_code(&outcome))
    }
}

fn read_runner_output(path: &Utf8Path) -> Result<String> {
    let bytes = if path == "-" {
        let mut buf = Vec::new();
        std::io::stdin()
            .lock()
            .read_to_end(&mut buf)
            .map_err(|err| ExpectedError::RunnerOutputReadError { path: None, err })?;
        buf
    } else {
        std::fs::read(path).map_err(|err| ExpectedError::RunnerOutputReadError {
            path: Some(path.to_owned()),
            err,
        })?
    };
    // Runner output may contain arbitrary bytes; only the text matters.
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn read_declared_tests(path: &Utf8Path) -> Result<Vec<DeclaredTestId>> {
    let contents =
        std::fs::read_to_string(path).map_err(|err| ExpectedError::DeclaredTestsReadError {
            path: path.to_owned(),
            err,
        })?;
    DeclaredTestId::parse_list(&contents).map_err(|err| ExpectedError::DeclaredTestsParseError {
        path: path.to_owned(),
        err,
    })
}

fn log_fallback(outcome: &ReconcileOutcome) {
    if outcome.path != ReconcilePath::Fallback {
        return;
    }
    match &outcome.normalize_error {
        Some(error) => warn!(
            "runner output could not be parsed, verdicts are heuristic: {}",
            DisplayErrorChain::new(error)
        ),
        None => warn!("runner output could not be parsed, verdicts are heuristic"),
    }
}

fn exit_code(outcome: &ReconcileOutcome) -> i32 {
    if outcome.counts.failed > 0 {
        VerdictExitCode::TESTS_FAILED
    } else if outcome.counts.errored > 0 {
        VerdictExitCode::TESTS_ERRORED
    } else {
        VerdictExitCode::OK
    }
}

#[derive(Debug, Args)]
#[command(next_help_heading = "Config options")]
struct ConfigOpts {
    /// Config file [default: built-in defaults]
    #[arg(long, value_name = "PATH", env = CONFIG_FILE_ENV)]
    config_file: Option<Utf8PathBuf>,
}

impl ConfigOpts {
    fn make_config(&self) -> Result<ReconcileConfig> {
        let location = match &self.config_file {
            Some(path) => ConfigLocation::Explicit(path),
            None => ConfigLocation::Embedded,
        };
        Ok(ReconcileConfig::load(location)?)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum FrameworkOpt {
    Jest,
    Vitest,
    NodeTap,
}

impl From<FrameworkOpt> for Framework {
    fn from(opt: FrameworkOpt) -> Self {
        match opt {
            FrameworkOpt::Jest => Framework::Jest,
            FrameworkOpt::Vitest => Framework::Vitest,
            FrameworkOpt::NodeTap => Framework::NodeTap,
        }
    }
}

impl std::fmt::Display for FrameworkOpt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", Framework::from(*self))
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
enum MessageFormat {
    /// One line per declared test, followed by a summary
    #[default]
    Human,
    /// One JSON object per declared test, one per line
    Json,
    /// A JUnit XML report
    Junit,
}
