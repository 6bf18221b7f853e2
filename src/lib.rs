pub mod ast;
pub mod backend;
pub mod bytecode;
pub mod config;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod report;
pub mod runtime;
pub mod session;
pub mod token;
pub mod vm;
