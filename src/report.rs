//! Error-reporting and display collaborator.
//!
//! Core components return typed errors; whoever drives a run hands them to a
//! [`Reporter`] exactly once, together with the final symbol table dump.
//! Printed values travel through the same collaborator so they always reach
//! the display channel ahead of the report of a later failure.

use std::fmt;
use std::io;

use crate::runtime::execution::SymbolTable;

/// Error taxonomy shared by the parser and both backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    IllegalValue,
    Uninitialized,
    DivideByZero,
    PrematureEnd,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::IllegalValue => "ILLEGAL_VALUE",
            Self::Uninitialized => "UNINITIALIZED",
            Self::DivideByZero => "DIVIDE_BY_ZERO",
            Self::PrematureEnd => "PREMATURE_END",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub trait Reporter {
    /// Emits one value produced by `Print` / `PRINT`.
    fn display(&mut self, value: i64);
    fn report(&mut self, kind: ErrorKind, message: &str);
    fn dump(&mut self, symbols: &SymbolTable);
}

/// Writes printed values to one stream (e.g. stdout) and reports and dumps
/// to another (e.g. stderr).
pub struct WriterReporter<D, W> {
    display: D,
    diagnostics: W,
}

impl<D: io::Write, W: io::Write> WriterReporter<D, W> {
    pub fn new(display: D, diagnostics: W) -> Self {
        Self {
            display,
            diagnostics,
        }
    }

    pub fn into_inner(self) -> (D, W) {
        (self.display, self.diagnostics)
    }
}

impl<D: io::Write, W: io::Write> Reporter for WriterReporter<D, W> {
    fn display(&mut self, value: i64) {
        if let Err(error) = writeln!(self.display, "{value}") {
            log::warn!("Failed to write printed value: {error}");
        }
    }

    fn report(&mut self, kind: ErrorKind, message: &str) {
        // A broken diagnostics stream has nowhere left to report to.
        if let Err(error) = writeln!(self.diagnostics, "**** {kind}: {message}") {
            log::warn!("Failed to write report: {error}");
        }
    }

    fn dump(&mut self, symbols: &SymbolTable) {
        if let Err(error) = write!(self.diagnostics, "{symbols}") {
            log::warn!("Failed to write symbol table dump: {error}");
        }
    }
}

/// Keeps every printed value, report and dump in memory.
#[derive(Debug, Default)]
pub struct MemoryReporter {
    pub displayed: Vec<i64>,
    pub reports: Vec<(ErrorKind, String)>,
    pub dumps: Vec<SymbolTable>,
    /// Number of values displayed when each report arrived.
    pub displayed_before: Vec<usize>,
}

impl MemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn kinds(&self) -> Vec<ErrorKind> {
        self.reports.iter().map(|(kind, _)| *kind).collect()
    }
}

impl Reporter for MemoryReporter {
    fn display(&mut self, value: i64) {
        self.displayed.push(value);
    }

    fn report(&mut self, kind: ErrorKind, message: &str) {
        self.displayed_before.push(self.displayed.len());
        self.reports.push((kind, message.to_string()));
    }

    fn dump(&mut self, symbols: &SymbolTable) {
        self.dumps.push(symbols.clone());
    }
}
