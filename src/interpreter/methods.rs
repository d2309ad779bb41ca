//! Methods of arrays, strings and numbers
//!
//! A method read off a value (`data.push`) becomes a
//! [`crate::memory::value::BoundMethod`]; calling it lands here with the
//! receiver. Array methods mutate the shared storage in place, so every
//! alias of the array sees the change.

use crate::interpreter::engine::Interpreter;
use crate::interpreter::errors::RuntimeError;
use crate::interpreter::ops::{same_value_zero, strict_equals};
use crate::memory::value::{format_number, ArrayRef, Method, Value};
use crate::parser::ast::SourceLocation;

impl Interpreter {
    pub(crate) fn call_method(
        &mut self,
        receiver: &Value,
        method: Method,
        args: Vec<Value>,
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        match receiver {
            Value::Array(array) => self.call_array_method(array, receiver, method, args, location),
            Value::Str(s) => self.call_string_method(s, method, &args, location),
            Value::Number(n) => call_number_method(*n, method, &args, location),
            other => Err(RuntimeError::NotCallable {
                callee: format!("{}.{}", other.type_of(), method.name()),
                location,
            }),
        }
    }

    fn call_array_method(
        &mut self,
        array: &ArrayRef,
        receiver: &Value,
        method: Method,
        args: Vec<Value>,
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        let len = array.borrow().len();
        let arg = |i: usize| args.get(i).cloned().unwrap_or_default();

        let value = match method {
            Method::Push => {
                self.check_array_len(len + args.len(), location)?;
                let mut elements = array.borrow_mut();
                elements.extend(args.iter().cloned());
                Value::Number(elements.len() as f64)
            }
            Method::Pop => array.borrow_mut().pop().unwrap_or_default(),
            Method::Shift => {
                let mut elements = array.borrow_mut();
                if elements.is_empty() {
                    Value::Undefined
                } else {
                    elements.remove(0)
                }
            }
            Method::Unshift => {
                self.check_array_len(len + args.len(), location)?;
                let mut elements = array.borrow_mut();
                elements.splice(0..0, args.iter().cloned());
                Value::Number(elements.len() as f64)
            }
            Method::Slice => {
                let start = relative_index(args.first(), len, 0);
                let end = relative_index(args.get(1), len, len);
                let elements = array.borrow();
                Value::array(elements[start..end.max(start)].to_vec())
            }
            Method::Splice => {
                let start = relative_index(args.first(), len, 0);
                let delete_count = match args.get(1) {
                    None => len - start,
                    Some(count) => clamp_count(count.to_number(), len - start),
                };
                let inserted = args.iter().skip(2).cloned().collect::<Vec<_>>();
                self.check_array_len(len - delete_count + inserted.len(), location)?;
                let removed = array
                    .borrow_mut()
                    .splice(start..start + delete_count, inserted)
                    .collect::<Vec<_>>();
                Value::array(removed)
            }
            Method::Concat => {
                let mut elements = array.borrow().clone();
                for arg in &args {
                    match arg {
                        Value::Array(other) => elements.extend(other.borrow().iter().cloned()),
                        other => elements.push(other.clone()),
                    }
                }
                self.check_array_len(elements.len(), location)?;
                Value::array(elements)
            }
            Method::IndexOf => {
                let needle = arg(0);
                let from = relative_index(args.get(1), len, 0);
                let position = array.borrow()[from..]
                    .iter()
                    .position(|element| strict_equals(element, &needle));
                Value::Number(position.map_or(-1.0, |i| (i + from) as f64))
            }
            Method::Includes => {
                let needle = arg(0);
                let found = array
                    .borrow()
                    .iter()
                    .any(|element| same_value_zero(element, &needle));
                Value::Bool(found)
            }
            Method::Join | Method::ToString => {
                let separator = match (method, args.first()) {
                    (Method::Join, Some(sep)) if !matches!(sep, Value::Undefined) => {
                        self.stringify(sep, location)?
                    }
                    _ => ",".to_string(),
                };
                Value::string(&self.join_elements(array, &separator, location)?)
            }
            Method::Reverse => {
                array.borrow_mut().reverse();
                receiver.clone()
            }
            Method::Fill => {
                let fill = arg(0);
                let start = relative_index(args.get(1), len, 0);
                let end = relative_index(args.get(2), len, len);
                for element in array.borrow_mut().iter_mut().take(end).skip(start) {
                    *element = fill.clone();
                }
                receiver.clone()
            }
            Method::ToUpperCase | Method::ToLowerCase | Method::ToFixed => {
                return Err(RuntimeError::NotCallable {
                    callee: format!("array.{}", method.name()),
                    location,
                });
            }
        };
        Ok(value)
    }

    fn call_string_method(
        &self,
        s: &str,
        method: Method,
        args: &[Value],
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        // Positions count UTF-16 code units, as in JavaScript
        let units: Vec<u16> = s.encode_utf16().collect();
        let len = units.len();

        let value = match method {
            Method::Slice => {
                let start = relative_index(args.first(), len, 0);
                let end = relative_index(args.get(1), len, len);
                Value::string(&String::from_utf16_lossy(&units[start..end.max(start)]))
            }
            Method::IndexOf => {
                let needle: Vec<u16> = match args.first() {
                    Some(arg) => self.stringify(arg, location)?,
                    None => "undefined".to_string(),
                }
                .encode_utf16()
                .collect();
                let from = relative_index(args.get(1), len, 0);
                let position = if needle.is_empty() {
                    Some(from)
                } else {
                    units[from..]
                        .windows(needle.len())
                        .position(|window| window == needle.as_slice())
                        .map(|i| i + from)
                };
                Value::Number(position.map_or(-1.0, |i| i as f64))
            }
            Method::Includes => {
                let needle = match args.first() {
                    Some(arg) => self.stringify(arg, location)?,
                    None => String::new(),
                };
                Value::Bool(s.contains(needle.as_str()))
            }
            Method::ToUpperCase => Value::string(&s.to_uppercase()),
            Method::ToLowerCase => Value::string(&s.to_lowercase()),
            Method::Concat => {
                let mut out = s.to_string();
                for arg in args {
                    let piece = self.stringify(arg, location)?;
                    self.check_string_len(out.len() + piece.len(), location)?;
                    out.push_str(&piece);
                }
                Value::string(&out)
            }
            Method::ToString => Value::string(s),
            other => {
                return Err(RuntimeError::NotCallable {
                    callee: format!("string.{}", other.name()),
                    location,
                });
            }
        };
        Ok(value)
    }

    /// `Array.prototype.join`: nullish elements become empty strings
    fn join_elements(
        &self,
        array: &ArrayRef,
        separator: &str,
        location: SourceLocation,
    ) -> Result<String, RuntimeError> {
        // Join element-wise so an array containing itself doesn't recurse forever
        let elements = array.borrow().clone();
        let mut out = String::new();
        for (i, element) in elements.iter().enumerate() {
            if i > 0 {
                out.push_str(separator);
            }
            match element {
                Value::Undefined | Value::Null => {}
                Value::Array(inner) if std::rc::Rc::ptr_eq(inner, array) => {}
                other => out.push_str(&self.stringify(other, location)?),
            }
            self.check_string_len(out.len(), location)?;
        }
        Ok(out)
    }
}

fn call_number_method(
    n: f64,
    method: Method,
    args: &[Value],
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    match method {
        Method::ToFixed => {
            let digits = args.first().map_or(0.0, Value::to_number);
            let digits = if digits.is_nan() { 0.0 } else { digits.trunc() };
            if !(0.0..=100.0).contains(&digits) {
                return Err(RuntimeError::argument(
                    "toFixed",
                    "digits argument must be between 0 and 100",
                    location,
                ));
            }
            Ok(Value::string(&to_fixed(n, digits as usize)))
        }
        Method::ToString => match args.first() {
            None | Some(Value::Undefined) => Ok(Value::string(&format_number(n))),
            Some(radix) => {
                let radix = radix.to_number();
                if !(2.0..=36.0).contains(&radix) || radix.fract() != 0.0 {
                    return Err(RuntimeError::argument(
                        "toString",
                        "radix must be an integer between 2 and 36",
                        location,
                    ));
                }
                Ok(Value::string(&integer_to_radix(n, radix as u32)))
            }
        },
        other => Err(RuntimeError::NotCallable {
            callee: format!("number.{}", other.name()),
            location,
        }),
    }
}

/// Resolve a possibly negative index argument against `len`
fn relative_index(arg: Option<&Value>, len: usize, default: usize) -> usize {
    let n = match arg {
        None | Some(Value::Undefined) => return default,
        Some(value) => value.to_number(),
    };
    if n.is_nan() {
        return 0;
    }
    let n = n.trunc();
    if n < 0.0 {
        (len as f64 + n).max(0.0) as usize
    } else {
        n.min(len as f64) as usize
    }
}

fn clamp_count(n: f64, max: usize) -> usize {
    if n.is_nan() || n <= 0.0 {
        0
    } else {
        n.trunc().min(max as f64) as usize
    }
}

/// `Number.prototype.toFixed`; ties round away from zero
fn to_fixed(n: f64, digits: usize) -> String {
    if !n.is_finite() || n.abs() >= 1e21 {
        return format_number(n);
    }
    let scale = 10f64.powi(digits as i32);
    let scaled = n.abs() * scale;
    if scaled.fract() == 0.5 {
        let rounded = (scaled.floor() + 1.0) / scale;
        let sign = if n < 0.0 { "-" } else { "" };
        return format!("{}{:.*}", sign, digits, rounded);
    }
    format!("{:.*}", digits, n)
}

fn integer_to_radix(n: f64, radix: u32) -> String {
    if radix == 10 || !n.is_finite() || n.fract() != 0.0 {
        return format_number(n);
    }
    let mut magnitude = n.abs() as u64;
    if magnitude == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while magnitude > 0 {
        let digit = (magnitude % u64::from(radix)) as u32;
        digits.push(std::char::from_digit(digit, radix).unwrap_or('?'));
        magnitude /= u64::from(radix);
    }
    if n < 0.0 {
        digits.push('-');
    }
    digits.iter().rev().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::ExecutorConfig;
    use crate::parser::parse;

    fn output(source: &str) -> Vec<String> {
        let program = parse(source).unwrap();
        let mut interp = Interpreter::new(&ExecutorConfig::default(), &[]);
        interp.run(&program).unwrap();
        interp.take_console().get_output()
    }

    #[test]
    fn test_push_pop_shift_unshift() {
        let out = output(
            "let a = [2];\n\
             let n = a.push(3, 4);\n\
             a.unshift(1);\n\
             let last = a.pop();\n\
             let first = a.shift();\n\
             console.log(n, last, first, a.join('-'));",
        );
        assert_eq!(out, vec!["3 4 1 2-3"]);
    }

    #[test]
    fn test_slice_and_splice() {
        let out = output(
            "let a = [1, 2, 3, 4, 5];\n\
             let s = a.slice(1, -1);\n\
             let removed = a.splice(1, 2, 'x');\n\
             console.log(s.join(), removed.join(), a.join());",
        );
        assert_eq!(out, vec!["2,3,4 2,3 1,x,4,5"]);
    }

    #[test]
    fn test_search_methods() {
        let out = output(
            "let a = [3, NaN, 5];\n\
             console.log(a.indexOf(5), a.indexOf(NaN), a.includes(NaN), a.includes('3'));",
        );
        assert_eq!(out, vec!["2 -1 true false"]);
    }

    #[test]
    fn test_reverse_returns_same_array() {
        let out = output(
            "let a = [1, 2, 3];\n\
             let b = a.reverse();\n\
             b[0] = 9;\n\
             console.log(a.join(), a === b, [0, 0, 0].fill(7, 1).join());",
        );
        assert_eq!(out, vec!["9,2,1 true 0,7,7"]);
    }

    #[test]
    fn test_string_methods() {
        let out = output(
            "let s = 'Sorting';\n\
             console.log(s.length, s.slice(0, 4), s.toUpperCase(), s.indexOf('t'), s[1], s.includes('rt'));",
        );
        assert_eq!(out, vec!["7 Sort SORTING 3 o true"]);
    }

    #[test]
    fn test_number_methods() {
        assert_eq!(to_fixed(1.005, 2), "1.00");
        assert_eq!(to_fixed(2.5, 0), "3");
        assert_eq!(to_fixed(-2.5, 0), "-3");
        assert_eq!(to_fixed(3.14159, 3), "3.142");
        assert_eq!(integer_to_radix(255.0, 16), "ff");
        assert_eq!(integer_to_radix(-5.0, 2), "-101");

        let out = output("let x = 7; console.log(x.toFixed(1), (0.1 + 0.2).toFixed(2));");
        assert_eq!(out, vec!["7.0 0.30"]);
    }
}
