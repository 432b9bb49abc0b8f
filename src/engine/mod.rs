//! The kusmala engine: lexer, Pratt parser, tree-walking evaluator, environments and builtins.

pub mod ast;
pub mod builtins;
pub mod env;
pub mod eval;
pub mod lexer;
pub mod parser;
pub mod token;
pub mod value;
