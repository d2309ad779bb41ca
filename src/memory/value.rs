//! Runtime value representation
//!
//! This module defines the [`Value`] enum, which represents all possible
//! runtime values of the sort-script language, plus the JavaScript
//! conversions (`ToNumber`, `ToString`, truthiness, `typeof`) the interpreter
//! builds its operators on.
//!
//! # Sharing
//!
//! Arrays are reference values: cloning a [`Value::Array`] clones the `Rc`,
//! so mutations are visible through every alias exactly like in JavaScript.
//! Everything else is immutable and cheap to clone.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use super::scope::Scope;
use crate::interpreter::constants::MAX_STRINGIFY_DEPTH;
use crate::parser::ast::FunctionDef;

/// Shared, mutable array storage
pub type ArrayRef = Rc<RefCell<Vec<Value>>>;

/// Runtime values in the interpreter
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    Str(Rc<str>),
    Array(ArrayRef),
    Function(Rc<Closure>),
    Builtin(Builtin),
    Method(Rc<BoundMethod>),
    Namespace(Namespace),
}

/// A user function together with the scope it was created in
pub struct Closure {
    pub def: Rc<FunctionDef>,
    pub env: Rc<Scope>,
}

impl fmt::Debug for Closure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The environment may contain this closure; don't recurse into it
        f.debug_struct("Closure")
            .field("name", &self.def.display_name())
            .field("params", &self.def.params)
            .finish()
    }
}

/// Host functions reachable from scripts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Snapshot,
    ConsoleLog,
    ConsoleInfo,
    ConsoleWarn,
    ConsoleError,
    MathFloor,
    MathCeil,
    MathRound,
    MathTrunc,
    MathAbs,
    MathMin,
    MathMax,
    MathSqrt,
    MathPow,
    Number,
    NumberIsInteger,
    String,
    Boolean,
    ArrayIsArray,
    ParseInt,
    ParseFloat,
    IsNaN,
    Error,
}

impl Builtin {
    pub fn name(self) -> &'static str {
        match self {
            Builtin::Snapshot => "snapshot",
            Builtin::ConsoleLog => "console.log",
            Builtin::ConsoleInfo => "console.info",
            Builtin::ConsoleWarn => "console.warn",
            Builtin::ConsoleError => "console.error",
            Builtin::MathFloor => "Math.floor",
            Builtin::MathCeil => "Math.ceil",
            Builtin::MathRound => "Math.round",
            Builtin::MathTrunc => "Math.trunc",
            Builtin::MathAbs => "Math.abs",
            Builtin::MathMin => "Math.min",
            Builtin::MathMax => "Math.max",
            Builtin::MathSqrt => "Math.sqrt",
            Builtin::MathPow => "Math.pow",
            Builtin::Number => "Number",
            Builtin::NumberIsInteger => "Number.isInteger",
            Builtin::String => "String",
            Builtin::Boolean => "Boolean",
            Builtin::ArrayIsArray => "Array.isArray",
            Builtin::ParseInt => "parseInt",
            Builtin::ParseFloat => "parseFloat",
            Builtin::IsNaN => "isNaN",
            Builtin::Error => "Error",
        }
    }
}

/// Built-in objects whose only purpose is to group functions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Namespace {
    Console,
    Math,
    Array,
}

impl Namespace {
    pub fn name(self) -> &'static str {
        match self {
            Namespace::Console => "console",
            Namespace::Math => "Math",
            Namespace::Array => "Array",
        }
    }
}

/// Methods of arrays, strings and numbers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Push,
    Pop,
    Shift,
    Unshift,
    Slice,
    Splice,
    Concat,
    IndexOf,
    Includes,
    Join,
    Reverse,
    Fill,
    ToUpperCase,
    ToLowerCase,
    ToFixed,
    ToString,
}

impl Method {
    /// Look up an array method by property name
    pub fn for_array(name: &str) -> Option<Self> {
        Some(match name {
            "push" => Method::Push,
            "pop" => Method::Pop,
            "shift" => Method::Shift,
            "unshift" => Method::Unshift,
            "slice" => Method::Slice,
            "splice" => Method::Splice,
            "concat" => Method::Concat,
            "indexOf" => Method::IndexOf,
            "includes" => Method::Includes,
            "join" => Method::Join,
            "reverse" => Method::Reverse,
            "fill" => Method::Fill,
            "toString" => Method::ToString,
            _ => return None,
        })
    }

    /// Look up a string method by property name
    pub fn for_string(name: &str) -> Option<Self> {
        Some(match name {
            "slice" => Method::Slice,
            "indexOf" => Method::IndexOf,
            "includes" => Method::Includes,
            "toUpperCase" => Method::ToUpperCase,
            "toLowerCase" => Method::ToLowerCase,
            "concat" => Method::Concat,
            "toString" => Method::ToString,
            _ => return None,
        })
    }

    /// Look up a number method by property name
    pub fn for_number(name: &str) -> Option<Self> {
        Some(match name {
            "toFixed" => Method::ToFixed,
            "toString" => Method::ToString,
            _ => return None,
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            Method::Push => "push",
            Method::Pop => "pop",
            Method::Shift => "shift",
            Method::Unshift => "unshift",
            Method::Slice => "slice",
            Method::Splice => "splice",
            Method::Concat => "concat",
            Method::IndexOf => "indexOf",
            Method::Includes => "includes",
            Method::Join => "join",
            Method::Reverse => "reverse",
            Method::Fill => "fill",
            Method::ToUpperCase => "toUpperCase",
            Method::ToLowerCase => "toLowerCase",
            Method::ToFixed => "toFixed",
            Method::ToString => "toString",
        }
    }
}

/// A method read off a receiver, e.g. the value of `data.push`
#[derive(Debug, Clone)]
pub struct BoundMethod {
    pub receiver: Value,
    pub method: Method,
}

impl Value {
    pub fn number(n: f64) -> Self {
        Value::Number(n)
    }

    pub fn string(s: &str) -> Self {
        Value::Str(Rc::from(s))
    }

    /// Wrap elements in a fresh shared array
    pub fn array(elements: Vec<Value>) -> Self {
        Value::Array(Rc::new(RefCell::new(elements)))
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&ArrayRef> {
        match self {
            Value::Array(array) => Some(array),
            _ => None,
        }
    }

    pub fn is_callable(&self) -> bool {
        matches!(
            self,
            Value::Function(_) | Value::Builtin(_) | Value::Method(_)
        )
    }

    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    /// Result of the `typeof` operator
    pub fn type_of(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "object",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::Str(_) => "string",
            Value::Array(_) | Value::Namespace(_) => "object",
            Value::Function(_) | Value::Builtin(_) | Value::Method(_) => {
                "function"
            }
        }
    }

    /// JavaScript truthiness
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::Str(s) => !s.is_empty(),
            _ => true,
        }
    }

    /// JavaScript `ToNumber`
    pub fn to_number(&self) -> f64 {
        match self {
            Value::Undefined => f64::NAN,
            Value::Null => 0.0,
            Value::Bool(b) => f64::from(u8::from(*b)),
            Value::Number(n) => *n,
            Value::Str(s) => string_to_number(s),
            Value::Array(array) => array_to_number(array),
            _ => f64::NAN,
        }
    }

    /// JavaScript `ToString`
    ///
    /// Arrays nested deeper than [`MAX_STRINGIFY_DEPTH`] are cut short; use
    /// [`Value::to_js_string_within`] for values a script controls.
    pub fn to_js_string(&self) -> String {
        let mut out = String::new();
        // Only the depth cap can fail without a length limit
        let _ = self.write_js_string(&mut out, &mut Vec::new(), usize::MAX);
        out
    }

    /// JavaScript `ToString`, giving up once the result passes `limit` bytes
    pub fn to_js_string_within(&self, limit: usize) -> Result<String, StringifyError> {
        let mut out = String::new();
        self.write_js_string(&mut out, &mut Vec::new(), limit)?;
        Ok(out)
    }

    fn write_js_string(
        &self,
        out: &mut String,
        seen: &mut Vec<*const ()>,
        limit: usize,
    ) -> Result<(), StringifyError> {
        match self {
            Value::Undefined => out.push_str("undefined"),
            Value::Null => out.push_str("null"),
            Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
            Value::Number(n) => out.push_str(&format_number(*n)),
            Value::Str(s) => out.push_str(s),
            Value::Array(array) => {
                // A cycle prints as an empty string, as in JavaScript
                let ptr = Rc::as_ptr(array) as *const ();
                if seen.contains(&ptr) {
                    return Ok(());
                }
                if seen.len() >= MAX_STRINGIFY_DEPTH {
                    return Err(StringifyError::TooDeep);
                }
                seen.push(ptr);
                for (i, element) in array.borrow().iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    if !element.is_nullish() {
                        element.write_js_string(out, seen, limit)?;
                    }
                    if out.len() > limit {
                        return Err(StringifyError::TooLong);
                    }
                }
                seen.pop();
            }
            Value::Function(closure) => {
                let keyword = if closure.def.is_arrow { "" } else { "function " };
                out.push_str(&format!(
                    "{}{}({}) {{ ... }}",
                    keyword,
                    closure.def.name.as_deref().unwrap_or(""),
                    closure.def.params.join(", ")
                ));
            }
            Value::Builtin(builtin) => out.push_str(&format!(
                "function {}() {{ [native code] }}",
                builtin.name()
            )),
            Value::Method(bound) => out.push_str(&format!(
                "function {}() {{ [native code] }}",
                bound.method.name()
            )),
            Value::Namespace(ns) => {
                out.push_str(&format!("[object {}]", ns.name()))
            }
        }
        if out.len() > limit {
            return Err(StringifyError::TooLong);
        }
        Ok(())
    }
}

/// Why a bounded `ToString` gave up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringifyError {
    /// The result would be longer than the limit
    TooLong,
    /// Arrays nest deeper than [`MAX_STRINGIFY_DEPTH`]
    TooDeep,
}

/// `ToNumber` of an array without building its string form.
///
/// Only an empty array or a chain of single-element arrays ending in a
/// number, string or nullish value converts to something other than NaN.
fn array_to_number(array: &ArrayRef) -> f64 {
    let mut current = Rc::clone(array);
    let mut seen: Vec<*const ()> = Vec::new();
    loop {
        let ptr = Rc::as_ptr(&current) as *const ();
        if seen.contains(&ptr) {
            // A cycle stringifies to ""
            return 0.0;
        }
        seen.push(ptr);

        let next = match current.borrow().as_slice() {
            [] | [Value::Undefined | Value::Null] => return 0.0,
            [Value::Number(n)] => return *n,
            [Value::Str(s)] => return string_to_number(s),
            [Value::Array(inner)] => Rc::clone(inner),
            _ => return f64::NAN,
        };
        current = next;
    }
}

/// Format a number the way JavaScript's `String(n)` does
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if n == 0.0 {
        return "0".to_string(); // covers -0
    }

    let abs = n.abs();
    if (1e-6..1e21).contains(&abs) {
        // Shortest round-trip representation; integers print without ".0"
        let s = format!("{}", n);
        return s.strip_suffix(".0").map(str::to_string).unwrap_or(s);
    }

    // Exponent form: 1e21 -> "1e+21", 1.5e-7 -> "1.5e-7"
    let s = format!("{:e}", n);
    match s.split_once('e') {
        Some((mantissa, exp)) if !exp.starts_with('-') => {
            format!("{}e+{}", mantissa, exp)
        }
        _ => s,
    }
}

/// JavaScript `ToNumber` applied to a string
pub fn string_to_number(s: &str) -> f64 {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    if let Some(hex) = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        return u64::from_str_radix(hex, 16)
            .map(|v| v as f64)
            .unwrap_or(f64::NAN);
    }
    match trimmed {
        "Infinity" | "+Infinity" => f64::INFINITY,
        "-Infinity" => f64::NEG_INFINITY,
        // Rust accepts spellings like "inf" and "nan" that JavaScript doesn't
        _ if trimmed
            .chars()
            .any(|c| c.is_ascii_alphabetic() && !matches!(c, 'e' | 'E')) =>
        {
            f64::NAN
        }
        _ => trimmed.parse::<f64>().unwrap_or(f64::NAN),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(42.0), "42");
        assert_eq!(format_number(-3.0), "-3");
        assert_eq!(format_number(0.5), "0.5");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(0.1 + 0.2), "0.30000000000000004");
        assert_eq!(format_number(f64::NAN), "NaN");
        assert_eq!(format_number(f64::NEG_INFINITY), "-Infinity");
        assert_eq!(format_number(1e21), "1e+21");
        assert_eq!(format_number(123456789.0), "123456789");
    }

    #[test]
    fn test_string_to_number() {
        assert_eq!(string_to_number(" 12 "), 12.0);
        assert_eq!(string_to_number(""), 0.0);
        assert_eq!(string_to_number("0x1f"), 31.0);
        assert_eq!(string_to_number("1e3"), 1000.0);
        assert!(string_to_number("12px").is_nan());
        assert!(string_to_number("inf").is_nan());
        assert_eq!(string_to_number("-Infinity"), f64::NEG_INFINITY);
    }

    #[test]
    fn test_array_to_string() {
        let inner = Value::array(vec![Value::number(2.0), Value::Null]);
        let outer = Value::array(vec![
            Value::number(1.0),
            inner,
            Value::Undefined,
            Value::string("x"),
        ]);
        assert_eq!(outer.to_js_string(), "1,2,,,x");
        assert!(outer.to_number().is_nan());
        assert_eq!(Value::array(vec![Value::number(7.0)]).to_number(), 7.0);
        let nested = Value::array(vec![Value::array(vec![Value::string(" 3 ")])]);
        assert_eq!(nested.to_number(), 3.0);
        assert_eq!(Value::array(vec![]).to_number(), 0.0);
        assert!(Value::array(vec![Value::Bool(true)]).to_number().is_nan());
    }

    #[test]
    fn test_bounded_to_string() {
        let array = Value::array(vec![Value::string("abcd"); 4]);
        assert_eq!(array.to_js_string_within(19).as_deref(), Ok("abcd,abcd,abcd,abcd"));
        assert_eq!(array.to_js_string_within(18), Err(StringifyError::TooLong));

        let mut deep = Value::number(1.0);
        for _ in 0..=MAX_STRINGIFY_DEPTH {
            deep = Value::array(vec![deep]);
        }
        assert_eq!(deep.to_js_string_within(usize::MAX), Err(StringifyError::TooDeep));
        assert_eq!(deep.to_number(), 1.0);
    }

    #[test]
    fn test_cyclic_array_to_string() {
        let array = Value::array(vec![Value::number(1.0)]);
        if let Value::Array(inner) = &array {
            inner.borrow_mut().push(array.clone());
        }
        assert_eq!(array.to_js_string(), "1,");
        // Break the cycle so the test doesn't leak
        if let Value::Array(inner) = &array {
            inner.borrow_mut().clear();
        }
    }

    #[test]
    fn test_truthiness_and_typeof() {
        assert!(!Value::number(0.0).is_truthy());
        assert!(!Value::number(f64::NAN).is_truthy());
        assert!(!Value::string("").is_truthy());
        assert!(Value::array(vec![]).is_truthy());
        assert_eq!(Value::Null.type_of(), "object");
        assert_eq!(Value::Builtin(Builtin::Snapshot).type_of(), "function");
        assert_eq!(Value::Namespace(Namespace::Math).type_of(), "object");
    }
}
