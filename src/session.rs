//! Drives parsing and execution, routing every failure to a [`Reporter`].

use crate::ast::Program;
use crate::backend::{Backend, Execution};
use crate::parser::{ParseOptions, Parser};
use crate::report::{ErrorKind, Reporter};
use crate::runtime::{Halted, RuntimeError};

pub struct Session<'r> {
    options: ParseOptions,
    reporter: &'r mut dyn Reporter,
    failed: bool,
}

impl<'r> Session<'r> {
    pub fn new(options: ParseOptions, reporter: &'r mut dyn Reporter) -> Self {
        Self {
            options,
            reporter,
            failed: false,
        }
    }

    /// True once any error has been reported.
    pub fn failed(&self) -> bool {
        self.failed
    }

    /// Parses `tokens`, reporting each parse error once. Returns `None` when
    /// the parse was aborted.
    pub fn parse<S: AsRef<str>>(&mut self, tokens: &[S]) -> Option<Program> {
        let mut parser = Parser::with_options(self.options);
        let result = parser.parse(tokens);
        for error in parser.diagnostics() {
            self.report(error.kind(), &error.to_string());
        }
        match result {
            Ok(program) => Some(program),
            Err(error) => {
                self.report(error.kind(), &error.to_string());
                None
            }
        }
    }

    /// Runs `program` on `backend`. Printed values reach the reporter's
    /// display first, including those printed before a failure. A failed run
    /// is then reported once; a successful one hands its final symbol table
    /// to the reporter's dump.
    pub fn execute(&mut self, backend: &dyn Backend, program: &Program) -> Option<Execution> {
        log::debug!("Running {} statements on {}", program.statements.len(), backend.name());
        match backend.run(program) {
            Ok(execution) => {
                self.display(&execution.printed);
                if execution.residual != 0 {
                    log::warn!(
                        "{}: {} values left on the stack",
                        backend.name(),
                        execution.residual
                    );
                }
                self.reporter.dump(&execution.symbols);
                Some(execution)
            }
            Err(error) => {
                let kind = if let Some(halted) = error.downcast_ref::<Halted>() {
                    self.display(&halted.printed);
                    halted.kind()
                } else {
                    error
                        .downcast_ref::<RuntimeError>()
                        .map_or(ErrorKind::IllegalValue, RuntimeError::kind)
                };
                self.report(kind, &format!("{}: {error:#}", backend.name()));
                None
            }
        }
    }

    fn display(&mut self, printed: &[i64]) {
        for value in printed {
            self.reporter.display(*value);
        }
    }

    fn report(&mut self, kind: ErrorKind, message: &str) {
        log::debug!("Reporting {kind}: {message}");
        self.failed = true;
        self.reporter.report(kind, message);
    }
}
