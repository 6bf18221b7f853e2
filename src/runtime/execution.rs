use std::fmt;

use rustc_hash::FxHashMap;

use crate::ast::{BinaryOperator, Name, UnaryOperator};
use crate::runtime::error::{RuntimeError, RuntimeResult};

/// Flat global variable bindings for one run.
///
/// Created empty when a run starts and only written by assignments
/// (`Statement::Assign` or `STORE`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymbolTable {
    bindings: FxHashMap<Name, i64>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<i64> {
        self.bindings.get(name).copied()
    }

    pub fn load(&self, name: &Name) -> RuntimeResult<i64> {
        self.get(name).ok_or_else(|| RuntimeError::Uninitialized { name: name.clone() })
    }

    pub fn assign(&mut self, name: Name, value: i64) {
        self.bindings.insert(name, value);
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn clear(&mut self) {
        self.bindings.clear();
    }

    pub fn iter_sorted(&self) -> Vec<(&str, i64)> {
        let mut entries = self
            .bindings
            .iter()
            .map(|(name, value)| (name.as_ref(), *value))
            .collect::<Vec<_>>();
        entries.sort_unstable_by(|left, right| left.0.cmp(right.0));
        entries
    }
}

impl fmt::Display for SymbolTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Symbol table:")?;
        for (name, value) in self.iter_sorted() {
            writeln!(f, "  {name} = {value}")?;
        }
        Ok(())
    }
}

/// Integer semantics of the binary operators. Arithmetic wraps on overflow.
pub(crate) fn apply_binary(op: BinaryOperator, left: i64, right: i64) -> RuntimeResult<i64> {
    match op {
        BinaryOperator::Add => Ok(left.wrapping_add(right)),
        BinaryOperator::Sub => Ok(left.wrapping_sub(right)),
        BinaryOperator::Mul => Ok(left.wrapping_mul(right)),
        BinaryOperator::Div => {
            if right == 0 {
                return Err(RuntimeError::DivideByZero);
            }
            Ok(left.wrapping_div(right))
        }
    }
}

pub(crate) fn apply_unary(op: UnaryOperator, operand: i64) -> RuntimeResult<i64> {
    match op {
        UnaryOperator::Negate => Ok(operand.wrapping_neg()),
        UnaryOperator::Sqrt => {
            if operand < 0 {
                return Err(RuntimeError::NegativeSqrt { operand });
            }
            Ok(operand.isqrt())
        }
    }
}
