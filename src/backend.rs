use anyhow::Result;

use crate::ast::Program;
use crate::runtime::SymbolTable;

pub use crate::bytecode;
pub use crate::interpreter;
pub use crate::vm;

/// Observable result of one completed run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Execution {
    /// Values emitted by `Print` / `PRINT`, in order.
    pub printed: Vec<i64>,
    /// Final variable bindings.
    pub symbols: SymbolTable,
    /// Values left on the value stack after the last instruction.
    pub residual: usize,
}

impl Execution {
    /// Printed values, one per line.
    pub fn output(&self) -> String {
        self.printed
            .iter()
            .map(i64::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Executable artifact produced by a backend `prepare` step.
///
/// This keeps compilation and execution separated so benchmarks and tests can
/// measure/validate prepare-vs-run phases independently.
pub trait PreparedBackend {
    fn run(&self) -> Result<Execution>;
}

/// Common interface implemented by each execution backend.
///
/// `prepare` translates the AST into backend-owned executable state, while
/// `run` offers the convenience path for one-shot execution. Every run starts
/// from an empty symbol table.
pub trait Backend {
    fn name(&self) -> &'static str;
    fn prepare(&self, program: &Program) -> Result<Box<dyn PreparedBackend>>;

    fn run(&self, program: &Program) -> Result<Execution> {
        self.prepare(program)?.run()
    }
}

pub fn backends() -> Vec<Box<dyn Backend>> {
    vec![
        Box::new(crate::interpreter::Interpreter::new()),
        Box::new(crate::vm::StackMachine::new()),
    ]
}

pub fn backend_by_name(name: &str) -> Option<Box<dyn Backend>> {
    backends().into_iter().find(|backend| backend.name() == name)
}
