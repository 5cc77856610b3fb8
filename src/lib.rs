//! `mylang` library crate.
//!
//! High-level layout:
//! - frontend: `lexer` + `parser` build the syntax tree (`ast`)
//! - `runtime`: value model, scopes, class descriptors, and the
//!   comparison/arithmetic kernel
//! - `ast`: node kinds plus the tree-walking executor
pub mod ast;
pub mod lexer;
pub mod parser;
pub mod runtime;
pub mod token;

use anyhow::Result;

use runtime::context::Context;
use runtime::scope::Scope;

/// Runs a complete program against an empty scope and returns its output.
pub fn run_program(source: &str) -> Result<String> {
    let lexer = lexer::Lexer::new(source)?;
    let program = parser::parse(lexer)?;
    let mut scope = Scope::new();
    let mut ctx = Context::new();
    program.execute(&mut scope, &mut ctx)?;
    Ok(ctx.into_output())
}
