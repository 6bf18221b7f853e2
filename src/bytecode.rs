use std::fmt;

use crate::ast::{BinaryOperator, Expression, Name, Program, Statement, UnaryOperator};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    PushConst(i64),
    Load(Name),
    Store(Name),
    Add,
    Sub,
    Mul,
    Div,
    Negate,
    Sqrt,
    Print,
}

impl Instruction {
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Instruction::PushConst(_) => "PUSH_CONST",
            Instruction::Load(_) => "LOAD",
            Instruction::Store(_) => "STORE",
            Instruction::Add => "ADD",
            Instruction::Sub => "SUB",
            Instruction::Mul => "MUL",
            Instruction::Div => "DIV",
            Instruction::Negate => "NEG",
            Instruction::Sqrt => "SQRT",
            Instruction::Print => "PRINT",
        }
    }

    fn binary(op: BinaryOperator) -> Self {
        match op {
            BinaryOperator::Add => Instruction::Add,
            BinaryOperator::Sub => Instruction::Sub,
            BinaryOperator::Mul => Instruction::Mul,
            BinaryOperator::Div => Instruction::Div,
        }
    }

    fn unary(op: UnaryOperator) -> Self {
        match op {
            UnaryOperator::Negate => Instruction::Negate,
            UnaryOperator::Sqrt => Instruction::Sqrt,
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::PushConst(value) => write!(f, "{} {value}", self.mnemonic()),
            Instruction::Load(name) | Instruction::Store(name) => {
                write!(f, "{} {name}", self.mnemonic())
            }
            _ => f.write_str(self.mnemonic()),
        }
    }
}

type CompiledBlock = Vec<Instruction>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompiledProgram {
    pub code: CompiledBlock,
}

impl fmt::Display for CompiledProgram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for instruction in &self.code {
            writeln!(f, "{instruction}")?;
        }
        Ok(())
    }
}

/// Lowers a program to stack-machine code. Names are resolved only at run
/// time, so compilation cannot fail and never looks at a symbol table.
pub fn compile(program: &Program) -> CompiledProgram {
    let mut code = Vec::new();
    for statement in &program.statements {
        compile_statement(statement, &mut code);
    }
    log::debug!(
        "Compiled {} statements into {} instructions",
        program.statements.len(),
        code.len()
    );
    CompiledProgram { code }
}

fn compile_statement(statement: &Statement, code: &mut CompiledBlock) {
    match statement {
        Statement::Assign { target, value } => {
            compile_expression(value, code);
            code.push(Instruction::Store(target.clone()));
        }
        Statement::Print(value) => {
            compile_expression(value, code);
            code.push(Instruction::Print);
        }
    }
}

/// Every expression compiles to code with a net stack effect of exactly +1.
fn compile_expression(expr: &Expression, code: &mut CompiledBlock) {
    match expr {
        Expression::Constant(value) => code.push(Instruction::PushConst(*value)),
        Expression::Variable(name) => code.push(Instruction::Load(name.clone())),
        Expression::BinaryOp { op, left, right } => {
            compile_expression(left, code);
            compile_expression(right, code);
            code.push(Instruction::binary(*op));
        }
        Expression::UnaryOp { op, operand } => {
            compile_expression(operand, code);
            code.push(Instruction::unary(*op));
        }
    }
}
