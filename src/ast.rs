use std::fmt;
use std::sync::Arc;

/// Interned variable name; every occurrence of one identifier shares storage.
pub type Name = Arc<str>;

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Expression {
    Constant(i64),
    Variable(Name),
    BinaryOp {
        op: BinaryOperator,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    UnaryOp {
        op: UnaryOperator,
        operand: Box<Expression>,
    },
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum BinaryOperator {
    Add,
    Sub,
    Mul,
    Div,
}

impl BinaryOperator {
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "+" => Some(Self::Add),
            "-" => Some(Self::Sub),
            "*" => Some(Self::Mul),
            "/" => Some(Self::Div),
            _ => None,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum UnaryOperator {
    Negate,
    Sqrt,
}

impl UnaryOperator {
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "_" => Some(Self::Negate),
            "#" => Some(Self::Sqrt),
            _ => None,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Self::Negate => "_",
            Self::Sqrt => "#",
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Statement {
    Assign { target: Name, value: Expression },
    Print(Expression),
}

/// Root of the tree: the program's statements in source order.
#[derive(Debug, PartialEq, Eq, Clone, Default)]
pub struct Program {
    pub statements: Vec<Statement>,
}

impl Expression {
    pub fn binary(op: BinaryOperator, left: Expression, right: Expression) -> Self {
        Self::BinaryOp {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn unary(op: UnaryOperator, operand: Expression) -> Self {
        Self::UnaryOp {
            op,
            operand: Box::new(operand),
        }
    }
}

// Infix rendering: binary operations fully parenthesized, unary symbols
// glued to their operand.

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Constant(value) => write!(f, "{value}"),
            Expression::Variable(name) => write!(f, "{name}"),
            Expression::BinaryOp { op, left, right } => {
                write!(f, "( {left} {} {right} )", op.symbol())
            }
            Expression::UnaryOp { op, operand } => write!(f, "{}{operand}", op.symbol()),
        }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statement::Assign { target, value } => write!(f, "{target} := {value}"),
            Statement::Print(value) => write!(f, "Print {value}"),
        }
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for statement in &self.statements {
            writeln!(f, "{statement}")?;
        }
        Ok(())
    }
}
