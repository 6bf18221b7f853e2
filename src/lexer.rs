//! Splits Dendron source text into the raw token list consumed by the parser.
//!
//! Dendron tokens are whitespace-delimited, so splitting never fails; tokens
//! that match no lexical class are rejected later by the parser.

pub fn tokenize(input: &str) -> Vec<&str> {
    input.split_whitespace().collect()
}
