use thiserror::Error;

use crate::ast::Name;
use crate::report::ErrorKind;
use crate::runtime::execution::SymbolTable;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    #[error("Variable '{name}' is not initialized")]
    Uninitialized { name: Name },
    #[error("Integer divide by zero")]
    DivideByZero,
    #[error("Premature end: {instruction} needs {needed} stack items, found {found}")]
    PrematureEnd {
        instruction: &'static str,
        needed: usize,
        found: usize,
    },
    #[error("Square root of negative value {operand}")]
    NegativeSqrt { operand: i64 },
}

impl RuntimeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Uninitialized { .. } => ErrorKind::Uninitialized,
            Self::DivideByZero => ErrorKind::DivideByZero,
            Self::PrematureEnd { .. } => ErrorKind::PrematureEnd,
            Self::NegativeSqrt { .. } => ErrorKind::IllegalValue,
        }
    }
}

pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// A run stopped by a [`RuntimeError`], with the state reached up to the
/// failing statement or instruction.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{error}")]
pub struct Halted {
    pub error: RuntimeError,
    /// Values printed before the failure, in order.
    pub printed: Vec<i64>,
    pub symbols: SymbolTable,
}

impl Halted {
    pub fn kind(&self) -> ErrorKind {
        self.error.kind()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn assert_send_sync<T: Send + Sync + 'static>() {}

    #[test]
    fn errors_convert_into_anyhow_and_back() {
        assert_send_sync::<RuntimeError>();
        assert_send_sync::<Halted>();

        let error = anyhow::Error::from(RuntimeError::Uninitialized {
            name: Arc::from("ghost"),
        });
        assert_eq!(error.to_string(), "Variable 'ghost' is not initialized");
        assert_eq!(
            error.downcast_ref::<RuntimeError>().map(RuntimeError::kind),
            Some(ErrorKind::Uninitialized)
        );
    }
}
