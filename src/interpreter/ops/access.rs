// Property and element access on arrays, strings and built-in objects

use std::rc::Rc;

use crate::interpreter::engine::Interpreter;
use crate::interpreter::errors::RuntimeError;
use crate::memory::value::{
    format_number, BoundMethod, Builtin, Method, Namespace, Value,
};
use crate::parser::ast::SourceLocation;

/// Largest valid array index plus one, as in JavaScript
const MAX_ARRAY_INDEX: f64 = 4_294_967_295.0;

impl Interpreter {
    /// Evaluate `object.property`
    pub(crate) fn get_member(
        &self,
        object: &Value,
        property: &str,
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        let bind = |method: Method| {
            Value::Method(Rc::new(BoundMethod {
                receiver: object.clone(),
                method,
            }))
        };

        let value = match object {
            Value::Undefined | Value::Null => {
                return Err(RuntimeError::type_error(
                    format!(
                        "Cannot read properties of {} (reading '{}')",
                        object.to_js_string(),
                        property
                    ),
                    location,
                ));
            }
            Value::Array(array) => match property {
                "length" => Value::Number(array.borrow().len() as f64),
                _ => Method::for_array(property).map_or(Value::Undefined, bind),
            },
            Value::Str(s) => match property {
                "length" => Value::Number(s.encode_utf16().count() as f64),
                _ => Method::for_string(property).map_or(Value::Undefined, bind),
            },
            Value::Number(_) => {
                Method::for_number(property).map_or(Value::Undefined, bind)
            }
            Value::Namespace(namespace) => namespace_member(*namespace, property),
            Value::Builtin(Builtin::Number) => number_member(property),
            Value::Function(closure) => match property {
                "name" => Value::string(closure.def.name.as_deref().unwrap_or("")),
                "length" => Value::Number(closure.def.params.len() as f64),
                _ => Value::Undefined,
            },
            _ => Value::Undefined,
        };
        Ok(value)
    }

    /// Evaluate `object[key]`
    pub(crate) fn get_index(
        &self,
        object: &Value,
        key: &Value,
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        match (object, array_index(key)) {
            (Value::Array(array), Some(index)) => {
                Ok(array.borrow().get(index).cloned().unwrap_or_default())
            }
            (Value::Str(s), Some(index)) => Ok(s
                .chars()
                .nth(index)
                .map_or(Value::Undefined, |c| {
                    Value::string(c.encode_utf8(&mut [0; 4]))
                })),
            _ => self.get_member(object, &self.stringify(key, location)?, location),
        }
    }

    /// Perform `object[key] = value`
    pub(crate) fn set_index(
        &self,
        object: &Value,
        key: &Value,
        value: Value,
        location: SourceLocation,
    ) -> Result<(), RuntimeError> {
        match (object, array_index(key)) {
            (Value::Array(array), Some(index)) => {
                if index >= array.borrow().len() {
                    self.check_array_len(index + 1, location)?;
                }
                let mut elements = array.borrow_mut();
                if index >= elements.len() {
                    elements.resize(index + 1, Value::Undefined);
                }
                elements[index] = value;
                Ok(())
            }
            _ => self.set_member(object, &self.stringify(key, location)?, value, location),
        }
    }

    /// Perform `object.property = value`
    pub(crate) fn set_member(
        &self,
        object: &Value,
        property: &str,
        value: Value,
        location: SourceLocation,
    ) -> Result<(), RuntimeError> {
        match object {
            Value::Undefined | Value::Null => Err(RuntimeError::type_error(
                format!(
                    "Cannot set properties of {} (setting '{}')",
                    object.to_js_string(),
                    property
                ),
                location,
            )),
            Value::Array(array) if property == "length" => {
                let length = value.to_number();
                if length < 0.0 || length.fract() != 0.0 || length >= MAX_ARRAY_INDEX {
                    return Err(RuntimeError::type_error("Invalid array length", location));
                }
                let length = length as usize;
                self.check_array_len(length, location)?;
                array.borrow_mut().resize(length, Value::Undefined);
                Ok(())
            }
            Value::Array(_) => Err(RuntimeError::type_error(
                format!("Cannot add property '{property}' to an array"),
                location,
            )),
            other => Err(RuntimeError::type_error(
                format!(
                    "Cannot assign to property '{}' of {} '{}'",
                    property,
                    other.type_of(),
                    other.to_js_string()
                ),
                location,
            )),
        }
    }
}

/// Interpret `key` as an array index, if it is one
fn array_index(key: &Value) -> Option<usize> {
    let n = match key {
        Value::Number(n) => *n,
        // "3" indexes like 3, but "03" and "3.0" are plain property names
        Value::Str(s) => {
            let n = s.parse::<f64>().ok()?;
            if format_number(n) != **s {
                return None;
            }
            n
        }
        _ => return None,
    };
    if n >= 0.0 && n.fract() == 0.0 && n < MAX_ARRAY_INDEX {
        Some(n as usize)
    } else {
        None
    }
}

fn namespace_member(namespace: Namespace, property: &str) -> Value {
    let builtin = match (namespace, property) {
        (Namespace::Console, "log") => Builtin::ConsoleLog,
        (Namespace::Console, "info") => Builtin::ConsoleInfo,
        (Namespace::Console, "warn") => Builtin::ConsoleWarn,
        (Namespace::Console, "error") => Builtin::ConsoleError,
        (Namespace::Math, "floor") => Builtin::MathFloor,
        (Namespace::Math, "ceil") => Builtin::MathCeil,
        (Namespace::Math, "round") => Builtin::MathRound,
        (Namespace::Math, "trunc") => Builtin::MathTrunc,
        (Namespace::Math, "abs") => Builtin::MathAbs,
        (Namespace::Math, "min") => Builtin::MathMin,
        (Namespace::Math, "max") => Builtin::MathMax,
        (Namespace::Math, "sqrt") => Builtin::MathSqrt,
        (Namespace::Math, "pow") => Builtin::MathPow,
        (Namespace::Math, "PI") => return Value::Number(std::f64::consts::PI),
        (Namespace::Math, "E") => return Value::Number(std::f64::consts::E),
        (Namespace::Array, "isArray") => Builtin::ArrayIsArray,
        _ => return Value::Undefined,
    };
    Value::Builtin(builtin)
}

fn number_member(property: &str) -> Value {
    match property {
        "isInteger" => Value::Builtin(Builtin::NumberIsInteger),
        "MAX_SAFE_INTEGER" => Value::Number(9_007_199_254_740_991.0),
        "MIN_SAFE_INTEGER" => Value::Number(-9_007_199_254_740_991.0),
        "POSITIVE_INFINITY" => Value::Number(f64::INFINITY),
        "NEGATIVE_INFINITY" => Value::Number(f64::NEG_INFINITY),
        "NaN" => Value::Number(f64::NAN),
        _ => Value::Undefined,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::ExecutorConfig;

    fn interp() -> Interpreter {
        Interpreter::new(&ExecutorConfig::default(), &[])
    }

    #[test]
    fn test_out_of_range_read_is_undefined() {
        let interp = interp();
        let array = Value::array(vec![Value::number(1.0)]);
        let loc = SourceLocation::default();

        let value = interp.get_index(&array, &Value::number(5.0), loc).unwrap();
        assert!(matches!(value, Value::Undefined));
        let value = interp.get_index(&array, &Value::number(-1.0), loc).unwrap();
        assert!(matches!(value, Value::Undefined));
    }

    #[test]
    fn test_write_past_end_fills_holes() {
        let interp = interp();
        let array = Value::array(vec![Value::number(1.0)]);
        let loc = SourceLocation::default();

        interp
            .set_index(&array, &Value::number(3.0), Value::number(4.0), loc)
            .unwrap();
        assert_eq!(array.to_js_string(), "1,,,4");
    }

    #[test]
    fn test_string_keys_index_arrays() {
        let interp = interp();
        let array = Value::array(vec![Value::number(1.0), Value::number(2.0)]);
        let loc = SourceLocation::default();

        let value = interp.get_index(&array, &Value::string("1"), loc).unwrap();
        assert_eq!(value.as_number(), Some(2.0));
        let value = interp.get_index(&array, &Value::string("01"), loc).unwrap();
        assert!(matches!(value, Value::Undefined));
    }

    #[test]
    fn test_read_of_undefined_fails() {
        let interp = interp();
        let err = interp
            .get_member(&Value::Undefined, "length", SourceLocation::new(3, 1))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "TypeError: Cannot read properties of undefined (reading 'length')"
        );
        assert_eq!(err.location().line, 3);
    }

    #[test]
    fn test_length_assignment_truncates() {
        let interp = interp();
        let array = Value::array(vec![Value::number(1.0), Value::number(2.0)]);
        interp
            .set_member(&array, "length", Value::number(1.0), SourceLocation::default())
            .unwrap();
        assert_eq!(array.to_js_string(), "1");
    }

    #[test]
    fn test_array_length_limit() {
        let config = ExecutorConfig {
            max_array_len: 10,
            ..ExecutorConfig::default()
        };
        let interp = Interpreter::new(&config, &[]);
        let array = Value::array(vec![]);
        let err = interp
            .set_index(&array, &Value::number(10.0), Value::Null, SourceLocation::default())
            .unwrap_err();
        assert!(matches!(err, RuntimeError::ArrayTooLarge { length: 11, limit: 10, .. }));
    }
}
