use anyhow::Result;

use crate::ast::{BinaryOperator, Program, UnaryOperator};
use crate::backend::{Backend, Execution, PreparedBackend};
use crate::bytecode::{CompiledProgram, Instruction, compile};
use crate::runtime::error::{Halted, RuntimeError, RuntimeResult};
use crate::runtime::execution::{SymbolTable, apply_binary, apply_unary};

/// Stack machine executing [`CompiledProgram`]s.
///
/// The value stack and symbol table are reset at the start of every run and
/// stay inspectable afterwards, including after a failed run.
#[derive(Debug, Default)]
pub struct VM {
    stack: Vec<i64>,
    symbols: SymbolTable,
    printed: Vec<i64>,
}

/// Backend that compiles to bytecode and runs it on a fresh [`VM`].
pub struct StackMachine;

impl StackMachine {
    pub fn new() -> Self {
        Self
    }
}

impl Default for StackMachine {
    fn default() -> Self {
        Self::new()
    }
}

pub struct PreparedVM {
    compiled: CompiledProgram,
}

impl VM {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stack(&self) -> &[i64] {
        &self.stack
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    pub fn printed(&self) -> &[i64] {
        &self.printed
    }

    pub fn run_compiled(&mut self, program: &CompiledProgram) -> RuntimeResult<Execution> {
        self.stack.clear();
        self.symbols.clear();
        self.printed.clear();

        for instruction in &program.code {
            log::trace!("{instruction} stack={:?}", self.stack);
            self.step(instruction)?;
        }

        let residual = self.stack.len();
        log::info!("Machine: execution ended with {residual} items left on the stack");
        Ok(Execution {
            printed: self.printed.clone(),
            symbols: self.symbols.clone(),
            residual,
        })
    }

    /// Hands over the state reached when `error` stopped the run.
    pub fn into_halted(self, error: RuntimeError) -> Halted {
        Halted {
            error,
            printed: self.printed,
            symbols: self.symbols,
        }
    }

    fn step(&mut self, instruction: &Instruction) -> RuntimeResult<()> {
        match instruction {
            Instruction::PushConst(value) => self.stack.push(*value),
            Instruction::Load(name) => {
                let value = self.symbols.load(name)?;
                self.stack.push(value);
            }
            Instruction::Store(name) => {
                let [value] = self.pop_operands(instruction)?;
                self.symbols.assign(name.clone(), value);
            }
            Instruction::Add => self.binary_op(instruction, BinaryOperator::Add)?,
            Instruction::Sub => self.binary_op(instruction, BinaryOperator::Sub)?,
            Instruction::Mul => self.binary_op(instruction, BinaryOperator::Mul)?,
            Instruction::Div => self.binary_op(instruction, BinaryOperator::Div)?,
            Instruction::Negate => self.unary_op(instruction, UnaryOperator::Negate)?,
            Instruction::Sqrt => self.unary_op(instruction, UnaryOperator::Sqrt)?,
            Instruction::Print => {
                let [value] = self.pop_operands(instruction)?;
                self.printed.push(value);
            }
        }
        Ok(())
    }

    fn binary_op(&mut self, instruction: &Instruction, op: BinaryOperator) -> RuntimeResult<()> {
        // The right operand sits on top of the left one.
        let [left, right] = self.pop_operands(instruction)?;
        self.stack.push(apply_binary(op, left, right)?);
        Ok(())
    }

    fn unary_op(&mut self, instruction: &Instruction, op: UnaryOperator) -> RuntimeResult<()> {
        let [operand] = self.pop_operands(instruction)?;
        self.stack.push(apply_unary(op, operand)?);
        Ok(())
    }

    /// Pops the top `N` values, deepest first. Leaves the stack untouched
    /// when it holds fewer than `N` values.
    fn pop_operands<const N: usize>(
        &mut self,
        instruction: &Instruction,
    ) -> RuntimeResult<[i64; N]> {
        let found = self.stack.len();
        if found < N {
            return Err(RuntimeError::PrematureEnd {
                instruction: instruction.mnemonic(),
                needed: N,
                found,
            });
        }
        let mut operands = [0; N];
        operands.copy_from_slice(&self.stack[found - N..]);
        self.stack.truncate(found - N);
        Ok(operands)
    }
}

impl Backend for StackMachine {
    fn name(&self) -> &'static str {
        "vm"
    }

    fn prepare(&self, program: &Program) -> Result<Box<dyn PreparedBackend>> {
        Ok(Box::new(PreparedVM {
            compiled: compile(program),
        }))
    }
}

impl PreparedBackend for PreparedVM {
    fn run(&self) -> Result<Execution> {
        let mut vm = VM::new();
        match vm.run_compiled(&self.compiled) {
            Ok(execution) => Ok(execution),
            Err(error) => Err(vm.into_halted(error).into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::ErrorKind;
    use std::sync::Arc;

    fn code(instructions: Vec<Instruction>) -> CompiledProgram {
        CompiledProgram { code: instructions }
    }

    #[test]
    fn runs_arithmetic_in_written_operand_order() {
        // ( 20 - 6 ) / 7
        let program = code(vec![
            Instruction::PushConst(20),
            Instruction::PushConst(6),
            Instruction::Sub,
            Instruction::PushConst(7),
            Instruction::Div,
            Instruction::Print,
        ]);
        let execution = VM::new().run_compiled(&program).expect("run failed");
        assert_eq!(execution.printed, vec![2]);
        assert_eq!(execution.residual, 0);
    }

    #[test]
    fn stores_and_loads_variables() {
        let x: Arc<str> = Arc::from("x");
        let program = code(vec![
            Instruction::PushConst(16),
            Instruction::Sqrt,
            Instruction::Negate,
            Instruction::Store(x.clone()),
            Instruction::Load(x.clone()),
            Instruction::Load(x),
            Instruction::Mul,
            Instruction::Print,
        ]);
        let execution = VM::new().run_compiled(&program).expect("run failed");
        assert_eq!(execution.printed, vec![16]);
        assert_eq!(execution.symbols.get("x"), Some(-4));
    }

    #[test]
    fn reports_residual_stack_without_failing() {
        let program = code(vec![Instruction::PushConst(1), Instruction::PushConst(2)]);
        let execution = VM::new().run_compiled(&program).expect("run failed");
        assert_eq!(execution.residual, 2);
        assert!(execution.printed.is_empty());
    }

    #[test]
    fn load_of_unbound_name_is_uninitialized() {
        let mut vm = VM::new();
        let error = vm
            .run_compiled(&code(vec![Instruction::Load(Arc::from("y"))]))
            .expect_err("expected uninitialized");
        assert_eq!(error.kind(), ErrorKind::Uninitialized);
        assert!(vm.stack().is_empty());
    }

    #[test]
    fn division_by_zero_pushes_nothing() {
        let mut vm = VM::new();
        let error = vm
            .run_compiled(&code(vec![
                Instruction::PushConst(9),
                Instruction::PushConst(5),
                Instruction::PushConst(0),
                Instruction::Div,
                Instruction::Print,
            ]))
            .expect_err("expected divide by zero");
        assert_eq!(error, RuntimeError::DivideByZero);
        assert_eq!(vm.stack(), &[9]);
        assert!(vm.printed().is_empty());
    }

    #[test]
    fn underflow_leaves_stack_untouched() {
        for instruction in [
            Instruction::Add,
            Instruction::Sub,
            Instruction::Mul,
            Instruction::Div,
        ] {
            let mut vm = VM::new();
            let error = vm
                .run_compiled(&code(vec![Instruction::PushConst(3), instruction.clone()]))
                .expect_err("expected premature end");
            assert_eq!(
                error,
                RuntimeError::PrematureEnd {
                    instruction: instruction.mnemonic(),
                    needed: 2,
                    found: 1,
                }
            );
            assert_eq!(vm.stack(), &[3]);
        }
    }

    #[test]
    fn store_print_and_unary_ops_need_one_value() {
        for instruction in [
            Instruction::Store(Arc::from("x")),
            Instruction::Print,
            Instruction::Negate,
            Instruction::Sqrt,
        ] {
            let mut vm = VM::new();
            let error = vm
                .run_compiled(&code(vec![instruction]))
                .expect_err("expected premature end");
            assert_eq!(error.kind(), ErrorKind::PrematureEnd);
            assert!(vm.symbols().is_empty());
        }
    }

    #[test]
    fn sqrt_of_negative_is_illegal() {
        let error = VM::new()
            .run_compiled(&code(vec![Instruction::PushConst(-9), Instruction::Sqrt]))
            .expect_err("expected illegal value");
        assert_eq!(error, RuntimeError::NegativeSqrt { operand: -9 });
    }

    #[test]
    fn resets_state_between_runs() {
        let mut vm = VM::new();
        vm.run_compiled(&code(vec![
            Instruction::PushConst(1),
            Instruction::Store(Arc::from("x")),
            Instruction::PushConst(2),
        ]))
        .expect("first run failed");
        assert_eq!(vm.stack(), &[2]);

        let error = vm
            .run_compiled(&code(vec![Instruction::Load(Arc::from("x"))]))
            .expect_err("expected symbols to be reset");
        assert_eq!(error.kind(), ErrorKind::Uninitialized);
        assert!(vm.stack().is_empty());
    }

    #[test]
    fn backend_compiles_then_runs() {
        let program = crate::parser::parse_tokens(&[":=", "x", "5", "@", "x"]).expect("parse");
        let execution = StackMachine::new().run(&program).expect("run failed");
        assert_eq!(execution.output(), "5");
        assert_eq!(execution.symbols.get("x"), Some(5));
    }

    #[test]
    fn backend_failure_carries_output_printed_so_far() {
        let program = crate::parser::parse_tokens(&["@", "1", ":=", "k", "2", "@", "/", "k", "0"])
            .expect("parse");
        let halted = StackMachine::new()
            .run(&program)
            .expect_err("expected divide by zero")
            .downcast::<Halted>()
            .expect("expected Halted");
        assert_eq!(halted.error, RuntimeError::DivideByZero);
        assert_eq!(halted.printed, vec![1]);
        assert_eq!(halted.symbols.get("k"), Some(2));
    }
}
