// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Human-readable verdict output.

use owo_colors::{OwoColorize, Style};
use std::io::{self, Write};
use verdict_engine::{helpers::plural, reconcile::ReconcileOutcome};
use verdict_metadata::{Verdict, VerdictRecord};

/// Width of the status column, wide enough for the summary heading.
const STATUS_WIDTH: usize = 12;

pub(crate) struct HumanDisplayer {
    verbose: bool,
    styles: Styles,
}

impl HumanDisplayer {
    pub(crate) fn new(verbose: bool, colorize: bool) -> Self {
        let mut styles = Styles::default();
        if colorize {
            styles.colorize();
        }
        Self { verbose, styles }
    }

    pub(crate) fn write_verdicts(
        &self,
        records: &[VerdictRecord],
        outcome: &ReconcileOutcome,
        writer: &mut dyn Write,
    ) -> io::Result<()> {
        for record in records {
            self.write_record(record, writer)?;
        }
        self.write_summary(outcome, writer)
    }

    fn write_record(&self, record: &VerdictRecord, writer: &mut dyn Write) -> io::Result<()> {
        let (status, style, duration_ms) = match &record.verdict {
            Verdict::Passed { duration_ms } => ("PASS", self.styles.pass, Some(*duration_ms)),
            Verdict::Failed { duration_ms, .. } => ("FAIL", self.styles.fail, *duration_ms),
            Verdict::Skipped => ("SKIP", self.styles.skip, None),
            Verdict::Errored { .. } => ("ERROR", self.styles.error, None),
        };

        write!(
            writer,
            "{:>width$} ",
            status.style(style),
            width = STATUS_WIDTH
        )?;
        match duration_ms {
            Some(ms) => write!(writer, "[{:>8.3}s] ", ms / 1000.0)?,
            None => write!(writer, "[{:>9}] ", "")?,
        }
        writeln!(writer, "{}", record.id.style(self.styles.id))?;

        match &record.verdict {
            Verdict::Failed {
                message, location, ..
            } => {
                if let Some(location) = location {
                    let file = location
                        .file_path
                        .as_ref()
                        .map_or("<unknown>", |path| path.as_str());
                    writeln!(
                        writer,
                        "{:width$}  at {}:{}:{}",
                        "",
                        file,
                        location.line + 1,
                        location.column,
                        width = STATUS_WIDTH
                    )?;
                }
                self.write_indented(message, writer)?;
            }
            Verdict::Errored { message } => self.write_indented(message, writer)?,
            Verdict::Passed { .. } | Verdict::Skipped => {}
        }

        Ok(())
    }

    fn write_indented(&self, message: &str, writer: &mut dyn Write) -> io::Result<()> {
        for line in message.lines() {
            writeln!(writer, "{:width$}  {}", "", line, width = STATUS_WIDTH)?;
        }
        Ok(())
    }

    fn write_summary(&self, outcome: &ReconcileOutcome, writer: &mut dyn Write) -> io::Result<()> {
        let counts = &outcome.counts;
        let heading_style = if counts.failed > 0 || counts.errored > 0 {
            self.styles.fail
        } else {
            self.styles.pass
        };

        write!(
            writer,
            "{:>width$} {} {} reconciled",
            "Summary".style(heading_style),
            counts.total().style(self.styles.count),
            plural::tests_str(counts.total()),
            width = STATUS_WIDTH
        )?;
        if self.verbose {
            write!(writer, " via {}", outcome.path)?;
        }
        writeln!(
            writer,
            ": {} passed, {} failed, {} skipped, {} errored",
            counts.passed.style(self.styles.count),
            counts.failed.style(self.styles.count),
            counts.skipped.style(self.styles.count),
            counts.errored.style(self.styles.count),
        )
    }
}

#[derive(Debug, Default)]
struct Styles {
    pass: Style,
    fail: Style,
    skip: Style,
    error: Style,
    id: Style,
    count: Style,
}

impl Styles {
    fn colorize(&mut self) {
        self.pass = Style::new().green().bold();
        self.fail = Style::new().red().bold();
        self.skip = Style::new().yellow().bold();
        self.error = Style::new().magenta().bold();
        self.id = Style::new().bold();
        self.count = Style::new().bold();
    }
}
