use std::io::{self, Write};

use serde::Serialize;

use crate::app::{CheckResult, CombineResult, GatherResult, ReportSink};

#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    Interactive,
    NonInteractive,
}

/// Prints report lines to stdout as they are produced.
pub struct StdoutSink;

impl ReportSink for StdoutSink {
    fn line(&self, line: &str) {
        let mut stdout = io::stdout().lock();
        let _ = writeln!(stdout, "{line}");
    }
}

/// Prints report lines to stderr, leaving stdout to the JSON result.
pub struct StderrSink;

impl ReportSink for StderrSink {
    fn line(&self, line: &str) {
        let mut stderr = io::stderr().lock();
        let _ = writeln!(stderr, "{line}");
    }
}

/// Where report lines go for an output mode.
pub fn report_sink(mode: OutputMode) -> &'static dyn ReportSink {
    match mode {
        OutputMode::Interactive => &StdoutSink,
        OutputMode::NonInteractive => &StderrSink,
    }
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_check(result: &CheckResult) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_combine(result: &CombineResult) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_gather(result: &GatherResult) -> io::Result<()> {
        Self::print_json(result)
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}
