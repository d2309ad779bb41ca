//! Sort-script interpreter
//!
//! This module provides the core execution logic:
//! - [`engine`]: Main interpreter with scopes, calls and resource accounting
//! - [`errors`]: Runtime error types
//! - [`constants`]: Default resource limits
//!
//! # Execution Model
//!
//! The interpreter walks the AST and executes statements one at a time.
//! Nothing is recorded automatically: the script decides what to record by
//! calling `snapshot`, and every statement, loop iteration and call is
//! charged against an operation budget so runaway scripts terminate.
//!
//! # Built-in Functions
//!
//! Host functions (`snapshot`, `console.*`, `Math.*`, ...) and the methods
//! of arrays, strings and numbers are implemented directly on the
//! interpreter in `builtins` and `methods`.

mod builtins;
pub mod constants;
pub mod engine;
pub mod errors;
mod expressions;
mod loops;
mod methods;
mod ops;
mod statements;

pub use engine::Interpreter;
pub use errors::RuntimeError;
