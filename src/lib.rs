//! # Introduction
//!
//! algoviz runs a user-written sorting function inside a sandboxed
//! interpreter, records every array state the function reports through
//! `snapshot`, and replays those states step by step as a bar chart in a
//! terminal UI built with [ratatui](https://docs.rs/ratatui).
//!
//! ## Execution pipeline
//!
//! ```text
//! Source → Lexer → Parser → AST → Interpreter → Steps → Playback → TUI
//! ```
//!
//! 1. [`parser`]: tokenises the script and builds an AST.
//! 2. [`interpreter`]: walks the AST with exactly three injected bindings
//!    (`data`, `snapshot`, `console`) and enforces the step ceiling, an
//!    operation budget and a call-depth limit.
//! 3. [`memory`]: the script's values and lexical scopes.
//! 4. [`snapshot`]: recorded [`snapshot::Step`]s and the captured console.
//! 5. [`executor`]: one sandboxed run: source + dataset in,
//!    [`executor::ExecutionOutcome`] out.
//! 6. [`playback`]: cursor and timer over a recorded step sequence.
//! 7. [`assistant`]: optional AI analysis, code generation and chat.
//! 8. [`ui`]: ratatui-based TUI; not part of the stable library API.
//!
//! ## Supported script subset
//!
//! Functions (declarations, expressions, arrows), `let`/`const`/`var`,
//! `if/else`, `while`, `do-while`, `for`, `break`, `continue`, `return`,
//! `throw`, template literals, spread, array destructuring assignment and
//! the usual arithmetic, comparison, logical and bitwise operators.
//! Built-ins: `Math.*`, array/string/number methods, `parseInt`,
//! `parseFloat`, `isNaN`, `console.log/info/warn/error`.

pub mod algorithms;
pub mod assistant;
pub mod config;
pub mod dataset;
pub mod executor;
pub mod interpreter;
pub mod memory;
pub mod parser;
pub mod playback;
pub mod snapshot;
pub mod ui;

pub use executor::{execute, ExecutionError, ExecutionOutcome, Executor, ExecutorConfig};
pub use playback::{PlaybackController, PlaybackState};
