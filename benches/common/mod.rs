#![allow(dead_code)]
use std::fs;
use std::path::{Path, PathBuf};

use dendron::ast::Program;
use dendron::{lexer, parser};

const PROGRAMS_DIR: &str = "tests/programs";

/// Bench-enabled fixture cases as `(label, program path)` pairs.
pub fn workloads() -> Vec<(String, PathBuf)> {
    test_support::load_cases(Path::new(PROGRAMS_DIR))
        .unwrap_or_else(|err| panic!("load cases: {err:#}"))
        .into_iter()
        .filter(|case| case.spec.bench.enabled)
        .map(|case| (case.name, case.program_path))
        .collect()
}

pub fn load_source(path: &Path) -> String {
    fs::read_to_string(path).unwrap_or_else(|err| panic!("read {}: {err}", path.display()))
}

pub fn load_program(path: &Path) -> Program {
    let source = load_source(path);
    let tokens = lexer::tokenize(&source);
    parser::parse_tokens(&tokens).unwrap_or_else(|err| panic!("parse {}: {err}", path.display()))
}
