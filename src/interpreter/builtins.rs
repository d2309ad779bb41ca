//! Built-in function implementations
//!
//! This module provides the host functions scripts can call: the injected
//! `snapshot` recorder, the capturing `console`, and a handful of pure
//! helpers (`Math.*`, `Number`, `String`, `parseInt`, ...).
//!
//! # Supported Built-ins
//!
//! - `snapshot(array, highlights?, description?)`: record one [`Step`]
//! - `console.log/info/warn/error(...args)`: capture a line of output
//! - `Math.floor/ceil/round/trunc/abs/min/max/sqrt/pow`
//! - `Number`, `Number.isInteger`, `String`, `Boolean`, `Array.isArray`,
//!   `parseInt`, `parseFloat`, `isNaN`, `Error`
//!
//! None of them touch the host: no clock, randomness, files or network.

use tracing::trace;

use crate::interpreter::engine::Interpreter;
use crate::interpreter::errors::RuntimeError;
use crate::interpreter::ops::binary::js_pow;
use crate::memory::value::{Builtin, Value};
use crate::parser::ast::SourceLocation;
use crate::snapshot::{LogLevel, Step};

impl Interpreter {
    pub(crate) fn call_builtin(
        &mut self,
        builtin: Builtin,
        args: Vec<Value>,
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        let value = match builtin {
            Builtin::Snapshot => return self.builtin_snapshot(args, location),
            Builtin::ConsoleLog => return self.builtin_console(LogLevel::Log, &args, location),
            Builtin::ConsoleInfo => return self.builtin_console(LogLevel::Info, &args, location),
            Builtin::ConsoleWarn => return self.builtin_console(LogLevel::Warn, &args, location),
            Builtin::ConsoleError => {
                return self.builtin_console(LogLevel::Error, &args, location)
            }

            Builtin::MathFloor => Value::Number(number_arg(&args, 0).floor()),
            Builtin::MathCeil => Value::Number(number_arg(&args, 0).ceil()),
            Builtin::MathRound => Value::Number(js_round(number_arg(&args, 0))),
            Builtin::MathTrunc => Value::Number(number_arg(&args, 0).trunc()),
            Builtin::MathAbs => Value::Number(number_arg(&args, 0).abs()),
            Builtin::MathSqrt => Value::Number(number_arg(&args, 0).sqrt()),
            Builtin::MathPow => Value::Number(js_pow(number_arg(&args, 0), number_arg(&args, 1))),
            Builtin::MathMin => Value::Number(fold_numbers(&args, f64::INFINITY, f64::min)),
            Builtin::MathMax => {
                Value::Number(fold_numbers(&args, f64::NEG_INFINITY, f64::max))
            }

            Builtin::Number => Value::Number(args.first().map_or(0.0, Value::to_number)),
            Builtin::NumberIsInteger => Value::Bool(matches!(
                args.first(),
                Some(Value::Number(n)) if n.is_finite() && n.fract() == 0.0
            )),
            Builtin::String => match args.first() {
                Some(value) => Value::string(&self.stringify(value, location)?),
                None => Value::string(""),
            },
            Builtin::Boolean => Value::Bool(args.first().is_some_and(Value::is_truthy)),
            Builtin::ArrayIsArray => Value::Bool(matches!(args.first(), Some(Value::Array(_)))),
            Builtin::ParseInt => {
                let text = self.string_arg(&args, location)?;
                let radix = args.get(1).map_or(0.0, Value::to_number);
                Value::Number(parse_int(&text, radix))
            }
            Builtin::ParseFloat => {
                let text = self.string_arg(&args, location)?;
                Value::Number(parse_float(&text))
            }
            Builtin::IsNaN => Value::Bool(number_arg(&args, 0).is_nan()),

            // Errors are represented by their message
            Builtin::Error => match args.first() {
                None | Some(Value::Undefined) => Value::string("Error"),
                Some(message) => Value::string(&self.stringify(message, location)?),
            },
        };
        Ok(value)
    }

    /// `snapshot(array, highlights?, description?)`
    ///
    /// Copies the array and highlights into a new [`Step`]; nothing the
    /// script does afterwards can change what was recorded.
    fn builtin_snapshot(
        &mut self,
        args: Vec<Value>,
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        let mut args = args.into_iter();

        let array = match args.next() {
            Some(Value::Array(array)) => array,
            other => {
                return Err(RuntimeError::type_error(
                    format!(
                        "snapshot expects an array, got {}",
                        other.unwrap_or_default().type_of()
                    ),
                    location,
                ));
            }
        };
        let values = array
            .borrow()
            .iter()
            .enumerate()
            .map(|(i, element)| -> Result<f64, RuntimeError> {
                match element {
                    Value::Number(n) => Ok(*n),
                    other => Err(RuntimeError::type_error(
                        format!(
                            "snapshot: element {} is {} '{}', expected a number",
                            i,
                            other.type_of(),
                            self.stringify(other, location)?
                        ),
                        location,
                    )),
                }
            })
            .collect::<Result<Vec<f64>, _>>()?;

        let highlights = match args.next() {
            None | Some(Value::Undefined) => Vec::new(),
            Some(Value::Array(indices)) => {
                let indices = indices.borrow();
                let parsed = indices
                    .iter()
                    .map(|index| -> Result<usize, RuntimeError> {
                        match index {
                            Value::Number(n) if *n >= 0.0 && n.fract() == 0.0 => {
                                Ok(*n as usize)
                            }
                            other => Err(RuntimeError::type_error(
                                format!(
                                    "snapshot: highlight '{}' is not a valid index",
                                    self.stringify(other, location)?
                                ),
                                location,
                            )),
                        }
                    })
                    .collect::<Result<Vec<usize>, _>>()?;
                parsed
            }
            Some(other) => {
                return Err(RuntimeError::type_error(
                    format!(
                        "snapshot: highlights must be an array of indices, got {}",
                        other.type_of()
                    ),
                    location,
                ));
            }
        };

        let description = match args.next() {
            None | Some(Value::Undefined) => String::new(),
            Some(value) => self.stringify(&value, location)?,
        };

        self.recorder
            .push(Step::new(values, highlights, description))
            .map_err(|err| RuntimeError::StepLimitExceeded {
                limit: err.limit,
                location,
            })?;
        trace!(step = self.recorder.len(), line = location.line, "snapshot");
        Ok(Value::Undefined)
    }

    fn builtin_console(
        &mut self,
        level: LogLevel,
        args: &[Value],
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        let mut message = String::new();
        for (i, arg) in args.iter().enumerate() {
            if i > 0 {
                message.push(' ');
            }
            let text = self.stringify(arg, location)?;
            self.check_string_len(message.len() + text.len(), location)?;
            message.push_str(&text);
        }
        self.console.push(level, &message);
        Ok(Value::Undefined)
    }

    /// First argument as a string; missing is empty
    fn string_arg(&self, args: &[Value], location: SourceLocation) -> Result<String, RuntimeError> {
        match args.first() {
            Some(value) => self.stringify(value, location),
            None => Ok(String::new()),
        }
    }
}

/// Argument `i` converted to a number; missing arguments are NaN
fn number_arg(args: &[Value], i: usize) -> f64 {
    args.get(i).map_or(f64::NAN, Value::to_number)
}

/// `Math.round`: halves round towards +Infinity
fn js_round(n: f64) -> f64 {
    if !n.is_finite() {
        return n;
    }
    let floor = n.floor();
    if n - floor >= 0.5 {
        floor + 1.0
    } else {
        floor
    }
}

/// `Math.min` / `Math.max`: NaN if any argument converts to NaN
fn fold_numbers(args: &[Value], init: f64, pick: fn(f64, f64) -> f64) -> f64 {
    let mut acc = init;
    for arg in args {
        let n = arg.to_number();
        if n.is_nan() {
            return f64::NAN;
        }
        acc = pick(acc, n);
    }
    acc
}

/// JavaScript `parseInt`: the longest valid digit prefix, or NaN
pub(crate) fn parse_int(text: &str, radix: f64) -> f64 {
    let mut s = text.trim_start();
    let negative = s.starts_with('-');
    if let Some(rest) = s.strip_prefix('-').or_else(|| s.strip_prefix('+')) {
        s = rest;
    }

    let mut radix = if radix.is_finite() { radix.trunc() as i64 } else { 0 };
    if radix == 0 || radix == 16 {
        if let Some(rest) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            s = rest;
            radix = 16;
        }
    }
    if radix == 0 {
        radix = 10;
    }
    if !(2..=36).contains(&radix) {
        return f64::NAN;
    }

    let mut value = 0.0;
    let mut digits = 0;
    for c in s.chars() {
        let Some(digit) = c.to_digit(radix as u32) else {
            break;
        };
        value = value * radix as f64 + f64::from(digit);
        digits += 1;
    }
    if digits == 0 {
        return f64::NAN;
    }
    if negative {
        -value
    } else {
        value
    }
}

/// JavaScript `parseFloat`: the longest decimal-literal prefix, or NaN
pub(crate) fn parse_float(text: &str) -> f64 {
    let s = text.trim_start();
    let unsigned = s.strip_prefix(['+', '-']).unwrap_or(s);
    if unsigned.starts_with("Infinity") {
        return if s.starts_with('-') {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        };
    }

    // Find the longest prefix that parses, scanning the literal's shape
    let bytes = s.as_bytes();
    let mut end = 0;
    if end < bytes.len() && matches!(bytes[end], b'+' | b'-') {
        end += 1;
    }
    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end < bytes.len() && bytes[end] == b'.' {
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
    }
    if end == digits_start || &s[digits_start..end] == "." {
        return f64::NAN;
    }
    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && matches!(bytes[exp_end], b'+' | b'-') {
            exp_end += 1;
        }
        let exp_digits = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits {
            end = exp_end;
        }
    }
    s[..end].parse::<f64>().unwrap_or(f64::NAN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::ExecutorConfig;
    use crate::parser::parse;

    fn run(source: &str, data: &[f64]) -> Result<Interpreter, RuntimeError> {
        let program = parse(source).unwrap();
        let mut interp = Interpreter::new(&ExecutorConfig::default(), data);
        interp.run(&program)?;
        Ok(interp)
    }

    #[test]
    fn test_snapshot_copies_array() {
        let mut interp = run(
            "function sort(data, snapshot) {\n\
               snapshot(data, [0, 1], 'before');\n\
               data[0] = 99;\n\
               snapshot(data);\n\
             }",
            &[1.0, 2.0],
        )
        .unwrap();
        let steps = interp.take_steps();
        assert_eq!(steps.len(), 2);
        assert_eq!(steps.get(0).unwrap().array, vec![1.0, 2.0]);
        assert_eq!(steps.get(0).unwrap().highlights, vec![0, 1]);
        assert_eq!(steps.get(1).unwrap().array, vec![99.0, 2.0]);
        assert_eq!(steps.get(1).unwrap().description, "");
    }

    #[test]
    fn test_snapshot_rejects_non_numbers() {
        let err = run("snapshot(['a']);", &[]).err().unwrap();
        assert!(matches!(err, RuntimeError::TypeError { .. }));

        let err = run("snapshot(data, [-1]);", &[1.0]).err().unwrap();
        assert!(err.to_string().contains("not a valid index"));

        let err = run("snapshot(5);", &[]).err().unwrap();
        assert!(err.to_string().contains("snapshot expects an array, got number"));
    }

    #[test]
    fn test_snapshot_description_is_stringified() {
        let mut interp = run("snapshot(data, [], 42);", &[1.0]).unwrap();
        assert_eq!(interp.take_steps().get(0).unwrap().description, "42");
    }

    #[test]
    fn test_step_limit() {
        let config = ExecutorConfig {
            step_limit: 3,
            ..ExecutorConfig::default()
        };
        let program = parse("for (let i = 0; i < 10; i++) snapshot(data);").unwrap();
        let mut interp = Interpreter::new(&config, &[1.0]);
        let err = interp.run(&program).unwrap_err();
        assert!(matches!(err, RuntimeError::StepLimitExceeded { limit: 3, .. }));
        assert_eq!(interp.take_steps().len(), 3);
    }

    #[test]
    fn test_console_levels() {
        let mut interp = run(
            "console.log('a', 1, [2, 3]); console.warn('w'); console.error('e', null); console.info('i');",
            &[],
        )
        .unwrap();
        assert_eq!(
            interp.take_console().get_output(),
            vec!["a 1 2,3", "WARN: w", "ERROR: e null", "i"]
        );
    }

    #[test]
    fn test_math_helpers() {
        let mut interp = run(
            "console.log(Math.floor(2.7), Math.round(2.5), Math.round(-2.5), Math.max(), Math.min(3, 1, 2), Math.pow(2, 3));",
            &[],
        )
        .unwrap();
        assert_eq!(
            interp.take_console().get_output(),
            vec!["2 3 -2 -Infinity 1 8"]
        );
    }

    #[test]
    fn test_parse_int_and_float() {
        assert_eq!(parse_int("  42px", 10.0), 42.0);
        assert_eq!(parse_int("-0x1A", 0.0), -26.0);
        assert_eq!(parse_int("101", 2.0), 5.0);
        assert!(parse_int("px", 10.0).is_nan());
        assert_eq!(parse_float("3.14abc"), 3.14);
        assert_eq!(parse_float(".5"), 0.5);
        assert_eq!(parse_float("1e3x"), 1000.0);
        assert_eq!(parse_float("2e"), 2.0);
        assert!(parse_float("abc").is_nan());
        assert_eq!(parse_float("-Infinity"), f64::NEG_INFINITY);
    }
}
