//! Sort-script parser
//!
//! This module transforms source text into an Abstract Syntax Tree (AST):
//! - [`lexer`]: Tokenization (source text → tokens)
//! - [`parse`]: Parsing (tokens → AST), split across `statements` and
//!   `expressions`
//! - [`ast`]: AST node definitions
//!
//! # Supported Language
//!
//! A JavaScript subset large enough for classic sorting algorithms:
//! - Values: numbers, strings, template literals, booleans, `null`,
//!   `undefined`, arrays with spread
//! - Declarations: `function`, `let`, `const`, `var`
//! - Statements: `if`, `while`, `do-while`, `for`, `break`, `continue`,
//!   `return`, `throw`
//! - Expressions: arithmetic, comparison, logical, bitwise, ternary, calls,
//!   member access, indexing, arrow functions, destructuring swaps
//! - Semicolons are mandatory; there is no automatic insertion
//!
//! # Parser Implementation
//!
//! Hand-written recursive descent parser with one method per precedence level.
//! No external parser generator dependencies.

pub mod ast;
mod expressions;
pub mod lexer;
pub mod parse;
mod statements;

pub use parse::{parse, ParseError, Parser, MAX_NESTING_DEPTH};
