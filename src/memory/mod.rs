//! Memory model for the sort-script interpreter
//!
//! This module provides the core memory abstractions:
//! - [`value`]: Runtime value representation and JavaScript conversions
//! - [`scope`]: Lexical environments with `let`/`const`/`var` bindings
//!
//! # Reference semantics
//!
//! Arrays live behind `Rc<RefCell<..>>` and are shared between every binding
//! that refers to them. The sandbox hands scripts a copy of the host dataset,
//! so nothing a script does reaches host memory.

pub mod scope;
pub mod value;

pub use scope::{Scope, ScopeKind};
pub use value::{ArrayRef, Value};
