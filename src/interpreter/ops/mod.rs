pub mod access;
pub mod assign;
pub mod binary;
pub mod unary;

// Most of these modules only add `impl Interpreter` blocks; the value-level
// helpers below are shared with the built-in methods.
pub(crate) use binary::{same_value_zero, strict_equals};
