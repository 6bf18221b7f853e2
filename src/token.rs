use crate::ast::{BinaryOperator, UnaryOperator};

pub const ASSIGN_MARKER: &str = ":=";
pub const PRINT_MARKER: &str = "@";

/// Lexical class of one pre-split program token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind<'a> {
    // Statement introducers
    Assign, // :=
    Print,  // @

    // Operators
    Binary(BinaryOperator),
    Unary(UnaryOperator),

    // Operands
    Identifier(&'a str),
    Integer(i64),

    Illegal,
}

impl<'a> TokenKind<'a> {
    pub fn classify(token: &'a str) -> Self {
        match token {
            ASSIGN_MARKER => return Self::Assign,
            PRINT_MARKER => return Self::Print,
            _ => {}
        }
        if let Some(op) = BinaryOperator::from_symbol(token) {
            return Self::Binary(op);
        }
        if let Some(op) = UnaryOperator::from_symbol(token) {
            return Self::Unary(op);
        }
        if token.starts_with(|ch: char| ch.is_ascii_alphabetic()) {
            return Self::Identifier(token);
        }
        if is_integer_literal(token) {
            // Out-of-range literals are not representable, so they are illegal.
            return token.parse().map_or(Self::Illegal, Self::Integer);
        }
        Self::Illegal
    }

    pub fn is_introducer(&self) -> bool {
        matches!(self, Self::Assign | Self::Print)
    }
}

/// `[-+]?\d+`
fn is_integer_literal(token: &str) -> bool {
    let digits = token.strip_prefix(['-', '+']).unwrap_or(token);
    !digits.is_empty() && digits.bytes().all(|byte| byte.is_ascii_digit())
}
