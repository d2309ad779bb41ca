// Binary operators with JavaScript conversion semantics

use std::cmp::Ordering;
use std::rc::Rc;

use crate::interpreter::engine::Interpreter;
use crate::interpreter::errors::RuntimeError;
use crate::memory::value::Value;
use crate::parser::ast::{AstNode, BinOp, SourceLocation};

impl Interpreter {
    /// Evaluate `left op right`, short-circuiting `&&`, `||` and `??`
    pub(crate) fn evaluate_binary(
        &mut self,
        op: BinOp,
        left: &AstNode,
        right: &AstNode,
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        let lhs = self.evaluate_expr(left)?;
        match op {
            BinOp::And if !lhs.is_truthy() => return Ok(lhs),
            BinOp::Or if lhs.is_truthy() => return Ok(lhs),
            BinOp::Nullish if !lhs.is_nullish() => return Ok(lhs),
            BinOp::And | BinOp::Or | BinOp::Nullish => {
                return self.evaluate_expr(right);
            }
            _ => {}
        }
        let rhs = self.evaluate_expr(right)?;
        self.apply_binary(op, &lhs, &rhs, location)
    }

    /// Apply a non-short-circuit operator to two values
    pub(crate) fn apply_binary(
        &self,
        op: BinOp,
        lhs: &Value,
        rhs: &Value,
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        let value = match op {
            BinOp::Add => {
                if is_numeric_primitive(lhs) && is_numeric_primitive(rhs) {
                    Value::Number(lhs.to_number() + rhs.to_number())
                } else {
                    let mut s = self.stringify(lhs, location)?;
                    let tail = self.stringify(rhs, location)?;
                    self.check_string_len(s.len() + tail.len(), location)?;
                    s.push_str(&tail);
                    Value::string(&s)
                }
            }
            BinOp::Sub => Value::Number(lhs.to_number() - rhs.to_number()),
            BinOp::Mul => Value::Number(lhs.to_number() * rhs.to_number()),
            BinOp::Div => Value::Number(lhs.to_number() / rhs.to_number()),
            // f64 `%` truncates like JavaScript's remainder
            BinOp::Mod => Value::Number(lhs.to_number() % rhs.to_number()),
            BinOp::Pow => Value::Number(js_pow(lhs.to_number(), rhs.to_number())),

            BinOp::Eq | BinOp::Ne => {
                // An array meets a primitive through its string form
                let equal = match (lhs, rhs) {
                    (Value::Array(_), Value::Number(_) | Value::Str(_) | Value::Bool(_)) => {
                        loose_equals(&self.primitive(lhs, location)?, rhs)
                    }
                    (Value::Number(_) | Value::Str(_) | Value::Bool(_), Value::Array(_)) => {
                        loose_equals(lhs, &self.primitive(rhs, location)?)
                    }
                    _ => loose_equals(lhs, rhs),
                };
                Value::Bool(equal == (op == BinOp::Eq))
            }
            BinOp::StrictEq => Value::Bool(strict_equals(lhs, rhs)),
            BinOp::StrictNe => Value::Bool(!strict_equals(lhs, rhs)),

            BinOp::Lt | BinOp::Gt | BinOp::Le | BinOp::Ge => {
                let ordering = compare(
                    &self.primitive(lhs, location)?,
                    &self.primitive(rhs, location)?,
                );
                Value::Bool(match op {
                    BinOp::Lt => ordering == Some(Ordering::Less),
                    BinOp::Gt => ordering == Some(Ordering::Greater),
                    BinOp::Le => matches!(ordering, Some(Ordering::Less | Ordering::Equal)),
                    _ => matches!(ordering, Some(Ordering::Greater | Ordering::Equal)),
                })
            }

            BinOp::BitAnd => int32_op(lhs, rhs, |a, b| a & b),
            BinOp::BitOr => int32_op(lhs, rhs, |a, b| a | b),
            BinOp::BitXor => int32_op(lhs, rhs, |a, b| a ^ b),
            BinOp::BitShl => int32_op(lhs, rhs, |a, b| a.wrapping_shl(b as u32 & 31)),
            BinOp::BitShr => int32_op(lhs, rhs, |a, b| a >> (b as u32 & 31)),
            BinOp::BitUShr => {
                let a = to_uint32(lhs.to_number());
                let b = to_uint32(rhs.to_number()) & 31;
                Value::Number(f64::from(a >> b))
            }

            BinOp::And | BinOp::Or | BinOp::Nullish => {
                return Err(RuntimeError::type_error(
                    format!("operator '{}' needs its operands unevaluated", op.symbol()),
                    location,
                ));
            }
        };
        Ok(value)
    }

    /// Arrays become their (bounded) string form; other values pass through
    fn primitive(&self, value: &Value, location: SourceLocation) -> Result<Value, RuntimeError> {
        match value {
            Value::Array(_) => Ok(Value::string(&self.stringify(value, location)?)),
            other => Ok(other.clone()),
        }
    }
}

/// Values that `+` adds numerically instead of concatenating
fn is_numeric_primitive(value: &Value) -> bool {
    matches!(
        value,
        Value::Number(_) | Value::Bool(_) | Value::Null | Value::Undefined
    )
}

pub(crate) fn js_pow(base: f64, exponent: f64) -> f64 {
    // powf(1, inf) and powf(1, NaN) are 1; in JavaScript both are NaN
    if exponent.is_nan() || (base.abs() == 1.0 && exponent.is_infinite()) {
        return f64::NAN;
    }
    base.powf(exponent)
}

fn int32_op(lhs: &Value, rhs: &Value, op: impl Fn(i32, i32) -> i32) -> Value {
    let a = to_int32(lhs.to_number());
    let b = to_int32(rhs.to_number());
    Value::Number(f64::from(op(a, b)))
}

/// JavaScript `ToInt32`
pub(crate) fn to_int32(n: f64) -> i32 {
    to_uint32(n) as i32
}

/// JavaScript `ToUint32`
pub(crate) fn to_uint32(n: f64) -> u32 {
    if !n.is_finite() {
        return 0;
    }
    n.trunc().rem_euclid(4_294_967_296.0) as u32
}

/// `===`
pub(crate) fn strict_equals(lhs: &Value, rhs: &Value) -> bool {
    match (lhs, rhs) {
        (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Number(a), Value::Number(b)) => a == b,
        (Value::Str(a), Value::Str(b)) => a == b,
        (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
        (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
        (Value::Method(a), Value::Method(b)) => Rc::ptr_eq(a, b),
        (Value::Builtin(a), Value::Builtin(b)) => a == b,
        (Value::Namespace(a), Value::Namespace(b)) => a == b,
        _ => false,
    }
}

/// Equality used by `includes`: like `===` except NaN equals NaN
pub(crate) fn same_value_zero(lhs: &Value, rhs: &Value) -> bool {
    match (lhs, rhs) {
        (Value::Number(a), Value::Number(b)) if a.is_nan() && b.is_nan() => true,
        _ => strict_equals(lhs, rhs),
    }
}

/// `==`
pub(crate) fn loose_equals(lhs: &Value, rhs: &Value) -> bool {
    match (lhs, rhs) {
        (Value::Undefined | Value::Null, Value::Undefined | Value::Null) => true,
        (Value::Undefined | Value::Null, _) | (_, Value::Undefined | Value::Null) => {
            false
        }
        (Value::Number(a), Value::Str(_)) => *a == rhs.to_number(),
        (Value::Str(_), Value::Number(b)) => lhs.to_number() == *b,
        (Value::Bool(_), _) => loose_equals(&Value::Number(lhs.to_number()), rhs),
        (_, Value::Bool(_)) => loose_equals(lhs, &Value::Number(rhs.to_number())),
        (Value::Array(_), Value::Number(_) | Value::Str(_)) => {
            loose_equals(&Value::string(&lhs.to_js_string()), rhs)
        }
        (Value::Number(_) | Value::Str(_), Value::Array(_)) => {
            loose_equals(lhs, &Value::string(&rhs.to_js_string()))
        }
        _ => strict_equals(lhs, rhs),
    }
}

/// Relational comparison of primitives; `None` when either side converts to NaN
fn compare(lhs: &Value, rhs: &Value) -> Option<Ordering> {
    match (lhs, rhs) {
        (Value::Str(a), Value::Str(b)) => {
            // JavaScript compares UTF-16 code units
            Some(a.encode_utf16().cmp(b.encode_utf16()))
        }
        (a, b) => a.to_number().partial_cmp(&b.to_number()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loose_equality() {
        assert!(loose_equals(&Value::number(1.0), &Value::string("1")));
        assert!(loose_equals(&Value::Null, &Value::Undefined));
        assert!(!loose_equals(&Value::Null, &Value::number(0.0)));
        assert!(loose_equals(&Value::Bool(true), &Value::number(1.0)));
        assert!(loose_equals(
            &Value::array(vec![Value::number(5.0)]),
            &Value::number(5.0)
        ));
        assert!(!loose_equals(
            &Value::number(f64::NAN),
            &Value::number(f64::NAN)
        ));
    }

    #[test]
    fn test_strict_equality() {
        let a = Value::array(vec![]);
        assert!(strict_equals(&a, &a.clone()));
        assert!(!strict_equals(&a, &Value::array(vec![])));
        assert!(!strict_equals(&Value::number(1.0), &Value::string("1")));
        assert!(same_value_zero(
            &Value::number(f64::NAN),
            &Value::number(f64::NAN)
        ));
    }

    #[test]
    fn test_comparisons() {
        assert_eq!(
            compare(&Value::string("10"), &Value::string("9")),
            Some(Ordering::Less)
        );
        assert_eq!(
            compare(&Value::string("10"), &Value::number(9.0)),
            Some(Ordering::Greater)
        );
        assert_eq!(compare(&Value::Undefined, &Value::number(1.0)), None);
        assert_eq!(
            compare(&Value::Null, &Value::number(0.0)),
            Some(Ordering::Equal)
        );
    }

    #[test]
    fn test_int32_conversions() {
        assert_eq!(to_int32(4_294_967_295.0), -1);
        assert_eq!(to_int32(-1.5), -1);
        assert_eq!(to_uint32(-1.0), 4_294_967_295);
        assert_eq!(to_int32(f64::NAN), 0);
        assert_eq!(js_pow(2.0, 10.0), 1024.0);
        assert!(js_pow(1.0, f64::INFINITY).is_nan());
    }
}
