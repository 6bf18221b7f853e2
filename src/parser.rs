//! Prefix-notation parser.
//!
//! Tokens are first grouped into one cluster per statement (every `:=` or `@`
//! starts a new cluster), then each cluster is reduced by scanning it from
//! the last token to the first over a single fragment stack. Because every
//! operator precedes its operands, the backward scan always finds operands
//! already on the stack when it reaches their operator: the mirror image of
//! postfix evaluation, with no lookahead or backtracking.

use rustc_hash::FxHashSet;
use serde::Deserialize;
use thiserror::Error;

use crate::ast::{Expression, Name, Program, Statement};
use crate::report::ErrorKind;
use crate::token::TokenKind;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Illegal token '{token}'")]
    IllegalToken { token: String },
    #[error("Assignment target must be a variable, found {found}")]
    NotAVariable { found: String },
    #[error("Program must start with ':=' or '@', found '{token}'")]
    MissingIntroducer { token: String },
    #[error("Missing operand for '{token}'")]
    MissingOperand { token: String },
    #[error("Statement '{statement}' leaves {count} unused operand(s)")]
    TrailingOperands { statement: String, count: usize },
    #[error("Expression under '{token}' nests deeper than {limit} levels")]
    TooDeep { token: String, limit: usize },
}

impl ParseError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingOperand { .. } => ErrorKind::PrematureEnd,
            Self::IllegalToken { .. }
            | Self::NotAVariable { .. }
            | Self::MissingIntroducer { .. }
            | Self::TrailingOperands { .. }
            | Self::TooDeep { .. } => ErrorKind::IllegalValue,
        }
    }
}

pub type ParseResult<T> = Result<T, ParseError>;

/// Deepest operator nesting a statement may contain. Evaluation, compilation
/// and display all recurse once per level.
pub const MAX_EXPRESSION_DEPTH: usize = 1024;

/// What to do with a statement that fails to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recovery {
    /// Stop at the first error.
    #[default]
    Abort,
    /// Drop the offending statement, record the error and keep parsing.
    SkipStatement,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ParseOptions {
    pub recovery: Recovery,
}

/// Partially reduced node on the parser stack.
#[derive(Debug, Clone, PartialEq)]
enum Fragment {
    /// A bare identifier: usable as an assignment target or as a variable read.
    Target(Name),
    /// A reduced expression and its nesting depth.
    Expr(Expression, usize),
}

impl Fragment {
    fn depth(&self) -> usize {
        match self {
            Fragment::Target(_) => 1,
            Fragment::Expr(_, depth) => *depth,
        }
    }

    fn into_expression(self) -> Expression {
        match self {
            Fragment::Target(name) => Expression::Variable(name),
            Fragment::Expr(expr, _) => expr,
        }
    }
}

pub struct Parser {
    options: ParseOptions,
    names: FxHashSet<Name>,
    stack: Vec<Fragment>,
    diagnostics: Vec<ParseError>,
}

impl Parser {
    pub fn new() -> Self {
        Self::with_options(ParseOptions::default())
    }

    pub fn with_options(options: ParseOptions) -> Self {
        Self {
            options,
            names: FxHashSet::default(),
            stack: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Errors recorded while recovering; always empty under [`Recovery::Abort`].
    pub fn diagnostics(&self) -> &[ParseError] {
        &self.diagnostics
    }

    pub fn parse<S: AsRef<str>>(&mut self, tokens: &[S]) -> ParseResult<Program> {
        self.diagnostics.clear();
        let clusters = cluster(tokens)?;
        log::debug!(
            "Parsing {} tokens in {} statement clusters",
            tokens.len(),
            clusters.len()
        );

        let mut statements = Vec::with_capacity(clusters.len());
        for cluster in clusters {
            match self.reduce_cluster(cluster) {
                Ok(statement) => statements.push(statement),
                Err(error) => match self.options.recovery {
                    Recovery::Abort => return Err(error),
                    Recovery::SkipStatement => {
                        log::debug!("Skipping statement '{}': {error}", render(cluster));
                        self.diagnostics.push(error);
                    }
                },
            }
        }

        Ok(Program { statements })
    }

    fn reduce_cluster<S: AsRef<str>>(&mut self, cluster: &[S]) -> ParseResult<Statement> {
        self.stack.clear();

        let Some((introducer, operands)) = cluster.split_first() else {
            return Err(ParseError::MissingIntroducer {
                token: String::new(),
            });
        };
        for token in operands.iter().rev() {
            self.reduce_token(token.as_ref())?;
        }

        let introducer = introducer.as_ref();
        let statement = match TokenKind::classify(introducer) {
            TokenKind::Assign => {
                let target = match self.pop(introducer)? {
                    Fragment::Target(name) => name,
                    Fragment::Expr(expr, _) => {
                        return Err(ParseError::NotAVariable {
                            found: expr.to_string(),
                        });
                    }
                };
                let value = self.pop(introducer)?.into_expression();
                Statement::Assign { target, value }
            }
            TokenKind::Print => Statement::Print(self.pop(introducer)?.into_expression()),
            _ => {
                return Err(ParseError::MissingIntroducer {
                    token: introducer.to_string(),
                });
            }
        };

        if !self.stack.is_empty() {
            return Err(ParseError::TrailingOperands {
                statement: statement.to_string(),
                count: self.stack.len(),
            });
        }
        Ok(statement)
    }

    fn reduce_token(&mut self, token: &str) -> ParseResult<()> {
        let fragment = match TokenKind::classify(token) {
            TokenKind::Integer(value) => Fragment::Expr(Expression::Constant(value), 1),
            TokenKind::Identifier(name) => Fragment::Target(self.intern(name)),
            TokenKind::Binary(op) => {
                // Operands were pushed right to left, so the first pop is the
                // operand written immediately after the operator.
                let left = self.pop(token)?;
                let right = self.pop(token)?;
                let depth = self.nested_depth(token, left.depth().max(right.depth()))?;
                let expr =
                    Expression::binary(op, left.into_expression(), right.into_expression());
                Fragment::Expr(expr, depth)
            }
            TokenKind::Unary(op) => {
                let operand = self.pop(token)?;
                let depth = self.nested_depth(token, operand.depth())?;
                Fragment::Expr(Expression::unary(op, operand.into_expression()), depth)
            }
            // An introducer inside a cluster, or anything unrecognised.
            TokenKind::Assign | TokenKind::Print | TokenKind::Illegal => {
                return Err(ParseError::IllegalToken {
                    token: token.to_string(),
                });
            }
        };
        self.stack.push(fragment);
        Ok(())
    }

    fn nested_depth(&self, token: &str, operand_depth: usize) -> ParseResult<usize> {
        let depth = operand_depth + 1;
        if depth > MAX_EXPRESSION_DEPTH {
            return Err(ParseError::TooDeep {
                token: token.to_string(),
                limit: MAX_EXPRESSION_DEPTH,
            });
        }
        Ok(depth)
    }

    fn pop(&mut self, token: &str) -> ParseResult<Fragment> {
        self.stack.pop().ok_or_else(|| ParseError::MissingOperand {
            token: token.to_string(),
        })
    }

    fn intern(&mut self, name: &str) -> Name {
        if let Some(interned) = self.names.get(name) {
            return interned.clone();
        }
        let interned = Name::from(name);
        self.names.insert(interned.clone());
        interned
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

/// Splits the token stream into statement clusters, each starting with its
/// introducer.
fn cluster<S: AsRef<str>>(tokens: &[S]) -> ParseResult<Vec<&[S]>> {
    if let Some(first) = tokens.first()
        && !TokenKind::classify(first.as_ref()).is_introducer()
    {
        return Err(ParseError::MissingIntroducer {
            token: first.as_ref().to_string(),
        });
    }

    let mut clusters = Vec::new();
    let mut start = 0;
    for (index, token) in tokens.iter().enumerate().skip(1) {
        if TokenKind::classify(token.as_ref()).is_introducer() {
            clusters.push(&tokens[start..index]);
            start = index;
        }
    }
    if !tokens.is_empty() {
        clusters.push(&tokens[start..]);
    }
    Ok(clusters)
}

fn render<S: AsRef<str>>(tokens: &[S]) -> String {
    tokens
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parses a whole program, stopping at the first error.
pub fn parse_tokens<S: AsRef<str>>(tokens: &[S]) -> ParseResult<Program> {
    Parser::new().parse(tokens)
}
