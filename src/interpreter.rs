use anyhow::Result;

use crate::ast::{Expression, Program, Statement};
use crate::backend::{Backend, Execution, PreparedBackend};
use crate::runtime::SymbolTable;
use crate::runtime::error::{Halted, RuntimeResult};
use crate::runtime::execution::{apply_binary, apply_unary};

/// AST-walking backend that executes programs directly without compilation.
pub struct Interpreter;

impl Interpreter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

/// Prepared executable program for the tree-walking interpreter.
pub struct PreparedInterpreter {
    program: Program,
}

impl PreparedInterpreter {
    fn run_once(&self) -> Result<Execution, Halted> {
        let mut symbols = SymbolTable::new();
        let mut printed = Vec::new();
        if let Err(error) = execute(&self.program, &mut symbols, &mut printed) {
            return Err(Halted {
                error,
                printed,
                symbols,
            });
        }
        Ok(Execution {
            printed,
            symbols,
            residual: 0,
        })
    }
}

impl PreparedBackend for PreparedInterpreter {
    fn run(&self) -> Result<Execution> {
        Ok(self.run_once()?)
    }
}

impl Backend for Interpreter {
    fn name(&self) -> &'static str {
        "interpreter"
    }

    fn prepare(&self, program: &Program) -> Result<Box<dyn PreparedBackend>> {
        Ok(Box::new(PreparedInterpreter {
            program: program.clone(),
        }))
    }
}

/// Runs every statement in order; the first failing statement ends the run.
pub fn execute(
    program: &Program,
    symbols: &mut SymbolTable,
    printed: &mut Vec<i64>,
) -> RuntimeResult<()> {
    for statement in &program.statements {
        exec_statement(statement, symbols, printed)?;
    }
    Ok(())
}

fn exec_statement(
    statement: &Statement,
    symbols: &mut SymbolTable,
    printed: &mut Vec<i64>,
) -> RuntimeResult<()> {
    match statement {
        Statement::Assign { target, value } => {
            let value = evaluate(value, symbols)?;
            symbols.assign(target.clone(), value);
        }
        Statement::Print(value) => {
            let value = evaluate(value, symbols)?;
            printed.push(value);
        }
    }
    Ok(())
}

/// Pure evaluation of an expression against the current bindings.
pub fn evaluate(expr: &Expression, symbols: &SymbolTable) -> RuntimeResult<i64> {
    match expr {
        Expression::Constant(value) => Ok(*value),
        Expression::Variable(name) => symbols.load(name),
        Expression::BinaryOp { op, left, right } => {
            let left = evaluate(left, symbols)?;
            let right = evaluate(right, symbols)?;
            apply_binary(*op, left, right)
        }
        Expression::UnaryOp { op, operand } => apply_unary(*op, evaluate(operand, symbols)?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{BinaryOperator, UnaryOperator};
    use crate::lexer::tokenize;
    use crate::parser::parse_tokens;
    use crate::report::ErrorKind;
    use crate::runtime::RuntimeError;
    use std::sync::Arc;

    fn run_source(source: &str) -> Result<Execution> {
        let program = parse_tokens(&tokenize(source))?;
        Interpreter::new().run(&program)
    }

    fn expect_runtime_error(error: anyhow::Error) -> RuntimeError {
        error.downcast::<Halted>().expect("expected Halted").error
    }

    #[test]
    fn evaluates_assignment_then_print() {
        let execution = run_source(":= x 5 @ x").expect("run failed");
        assert_eq!(execution.printed, vec![5]);
        assert_eq!(execution.symbols.get("x"), Some(5));
        assert_eq!(execution.residual, 0);
    }

    #[test]
    fn evaluates_nested_arithmetic() {
        let execution =
            run_source(":= a 7 := b - * a 3 / 9 2 @ b @ _ b @ # 17").expect("run failed");
        assert_eq!(execution.output(), "17\n-17\n4");
    }

    #[test]
    fn reassignment_overwrites_prior_binding() {
        let execution = run_source(":= n 1 := n + n 1 := n * n 10 @ n").expect("run failed");
        assert_eq!(execution.printed, vec![20]);
        assert_eq!(execution.symbols.len(), 1);
    }

    #[test]
    fn errors_on_reading_uninitialized_variable() {
        let error = expect_runtime_error(run_source("@ + 1 ghost").expect_err("expected error"));
        assert_eq!(
            error,
            RuntimeError::Uninitialized {
                name: Arc::from("ghost")
            }
        );
        assert_eq!(error.kind(), ErrorKind::Uninitialized);
    }

    #[test]
    fn errors_on_division_by_zero() {
        let error = expect_runtime_error(run_source("@ / 4 - 2 2").expect_err("expected error"));
        assert_eq!(error, RuntimeError::DivideByZero);
    }

    #[test]
    fn errors_on_square_root_of_negative() {
        let error = expect_runtime_error(run_source("@ # _ 4").expect_err("expected error"));
        assert_eq!(error, RuntimeError::NegativeSqrt { operand: -4 });
        assert_eq!(error.kind(), ErrorKind::IllegalValue);
    }

    #[test]
    fn failure_stops_before_later_statements() {
        let program = parse_tokens(&tokenize("@ 1 @ / 1 0 @ 2")).expect("parse");
        let mut symbols = SymbolTable::new();
        let mut printed = Vec::new();
        let result = execute(&program, &mut symbols, &mut printed);
        assert_eq!(result, Err(RuntimeError::DivideByZero));
        assert_eq!(printed, vec![1]);
    }

    #[test]
    fn halted_run_keeps_output_and_bindings_reached() {
        let halted = run_source(":= a 3 @ a @ 2 := b / a 0 @ 4")
            .expect_err("expected error")
            .downcast::<Halted>()
            .expect("expected Halted");
        assert_eq!(halted.error, RuntimeError::DivideByZero);
        assert_eq!(halted.printed, vec![3, 2]);
        assert_eq!(halted.symbols.get("a"), Some(3));
        assert_eq!(halted.symbols.get("b"), None);
        assert_eq!(halted.kind(), ErrorKind::DivideByZero);
    }

    #[test]
    fn evaluate_does_not_touch_bindings() {
        let mut symbols = SymbolTable::new();
        symbols.assign(Arc::from("x"), 9);
        let expr = Expression::binary(
            BinaryOperator::Add,
            Expression::Variable(Arc::from("x")),
            Expression::unary(UnaryOperator::Sqrt, Expression::Variable(Arc::from("x"))),
        );
        assert_eq!(evaluate(&expr, &symbols), Ok(12));
        assert_eq!(symbols.len(), 1);
    }

    #[test]
    fn starts_each_run_from_empty_symbol_table() {
        let interpreter = Interpreter::new();
        let first = parse_tokens(&tokenize(":= x 1 @ x")).expect("parse");
        let second = parse_tokens(&tokenize("@ x")).expect("parse");

        let execution = interpreter.run(&first).expect("first run failed");
        assert_eq!(execution.output(), "1");

        let error = expect_runtime_error(
            interpreter
                .run(&second)
                .expect_err("expected globals to be cleared between runs"),
        );
        assert_eq!(
            error,
            RuntimeError::Uninitialized {
                name: Arc::from("x")
            }
        );
    }
}
