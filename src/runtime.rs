//! Run state shared by the interpreter and VM backends.
//!
//! Both backends resolve names against the same [`execution::SymbolTable`],
//! fail with the same [`error::RuntimeError`] values, and apply operators
//! through the same arithmetic so their results cannot drift apart.
pub(crate) mod error;
pub(crate) mod execution;

pub use error::{Halted, RuntimeError};
pub use execution::SymbolTable;
