pub mod ast;
pub mod config;
pub mod environment;
pub mod error;
pub mod executor;
pub mod lexer;
pub mod parser;
pub mod repl;
