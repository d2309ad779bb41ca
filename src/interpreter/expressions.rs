//! Expression evaluation
//!
//! [`Interpreter::evaluate_expr`] dispatches on the node type; operators,
//! member access and assignment are implemented in the `ops` modules and
//! host functions in `builtins` / `methods`.

use crate::interpreter::engine::Interpreter;
use crate::interpreter::errors::RuntimeError;
use crate::memory::value::Value;
use crate::parser::ast::*;

impl Interpreter {
    pub(crate) fn evaluate_expr(
        &mut self,
        expr: &AstNode,
    ) -> Result<Value, RuntimeError> {
        self.nested(expr.location(), |interp| interp.evaluate_node(expr))
    }

    fn evaluate_node(&mut self, expr: &AstNode) -> Result<Value, RuntimeError> {
        match expr {
            AstNode::NumberLiteral(n, _) => Ok(Value::Number(*n)),
            AstNode::StringLiteral(s, _) => Ok(Value::string(s)),
            AstNode::BoolLiteral(b, _) => Ok(Value::Bool(*b)),
            AstNode::Null { .. } => Ok(Value::Null),
            AstNode::Undefined { .. } => Ok(Value::Undefined),

            AstNode::TemplateLiteral { parts, location } => {
                let mut out = String::new();
                for part in parts {
                    match part {
                        TemplatePart::Text(text) => out.push_str(text),
                        TemplatePart::Expr(expr) => {
                            let value = self.evaluate_expr(expr)?;
                            let piece = self.stringify(&value, *location)?;
                            self.check_string_len(out.len() + piece.len(), *location)?;
                            out.push_str(&piece);
                        }
                    }
                }
                Ok(Value::string(&out))
            }

            AstNode::ArrayLiteral { elements, location } => {
                let values = self.evaluate_elements(elements, *location)?;
                Ok(Value::array(values))
            }

            AstNode::Variable(name, location) => {
                self.lookup_variable(name, *location)
            }

            AstNode::Function { def, .. } => Ok(self.make_closure(def)),

            AstNode::Assignment {
                target,
                value,
                location,
            } => self.evaluate_assignment(target, value, *location),

            AstNode::CompoundAssignment {
                target,
                op,
                value,
                location,
            } => self.evaluate_compound_assignment(target, *op, value, *location),

            AstNode::BinaryOp {
                op,
                left,
                right,
                location,
            } => self.evaluate_binary(*op, left, right, *location),

            AstNode::UnaryOp {
                op,
                operand,
                location,
            } => self.evaluate_unary(*op, operand, *location),

            AstNode::TernaryOp {
                condition,
                true_expr,
                false_expr,
                ..
            } => {
                if self.evaluate_expr(condition)?.is_truthy() {
                    self.evaluate_expr(true_expr)
                } else {
                    self.evaluate_expr(false_expr)
                }
            }

            AstNode::Call {
                callee,
                args,
                location,
            } => {
                let function = self.evaluate_expr(callee)?;
                let args = self.evaluate_elements(args, *location)?;
                self.call_value(&function, &describe_callee(callee), args, *location)
            }

            AstNode::Member {
                object,
                property,
                location,
            } => {
                let object = self.evaluate_expr(object)?;
                self.get_member(&object, property, *location)
            }

            AstNode::Index {
                object,
                index,
                location,
            } => {
                let object = self.evaluate_expr(object)?;
                let key = self.evaluate_expr(index)?;
                self.get_index(&object, &key, *location)
            }

            stmt => Err(RuntimeError::type_error(
                "statement used where an expression was expected",
                stmt.location(),
            )),
        }
    }

    /// Evaluate array literal elements or call arguments, expanding spreads
    pub(crate) fn evaluate_elements(
        &mut self,
        elements: &[Element],
        location: SourceLocation,
    ) -> Result<Vec<Value>, RuntimeError> {
        let mut values = Vec::with_capacity(elements.len());
        for element in elements {
            match element {
                Element::Item(expr) => values.push(self.evaluate_expr(expr)?),
                Element::Spread(expr) => {
                    let spread = self.evaluate_expr(expr)?;
                    values.extend(self.iterate(&spread, expr.location())?);
                }
            }
            self.check_array_len(values.len(), location)?;
        }
        Ok(values)
    }

    /// Elements produced by iterating `value` (spread and destructuring)
    pub(crate) fn iterate(
        &self,
        value: &Value,
        location: SourceLocation,
    ) -> Result<Vec<Value>, RuntimeError> {
        match value {
            Value::Array(array) => Ok(array.borrow().clone()),
            Value::Str(s) => Ok(s
                .chars()
                .map(|c| Value::string(c.encode_utf8(&mut [0; 4])))
                .collect()),
            other => Err(RuntimeError::type_error(
                format!("{} is not iterable", other.to_js_string()),
                location,
            )),
        }
    }
}

/// Source-like description of a callee for "is not a function" errors
pub(crate) fn describe_callee(callee: &AstNode) -> String {
    match callee {
        AstNode::Variable(name, _) => name.clone(),
        AstNode::Member {
            object, property, ..
        } => format!("{}.{}", describe_callee(object), property),
        AstNode::Index { object, .. } => format!("{}[...]", describe_callee(object)),
        AstNode::Call { callee, .. } => format!("{}(...)", describe_callee(callee)),
        _ => "expression".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use crate::executor::ExecutorConfig;
    use crate::interpreter::engine::Interpreter;
    use crate::interpreter::errors::RuntimeError;
    use crate::parser::parse;

    fn run(source: &str) -> Result<Vec<String>, RuntimeError> {
        let program = parse(source).unwrap();
        let mut interp = Interpreter::new(&ExecutorConfig::default(), &[]);
        interp.run(&program)?;
        Ok(interp.take_console().get_output())
    }

    #[test]
    fn test_template_literal() {
        let out = run("let k = 7, i = 2;\nconsole.log(`Selected key ${k} at index ${i}`);")
            .unwrap();
        assert_eq!(out, vec!["Selected key 7 at index 2"]);
    }

    #[test]
    fn test_spread_copies() {
        let out = run(
            "let a = [1, 2];\n\
             let b = [...a, 3];\n\
             b[0] = 9;\n\
             console.log(a.join(','), b.join(','), [...'hi'].length);",
        )
        .unwrap();
        assert_eq!(out, vec!["1,2 9,2,3 2"]);
    }

    #[test]
    fn test_not_callable_names_the_callee() {
        let err = run("let xs = [1];\nxs.sortBy(1);").unwrap_err();
        assert_eq!(
            err.to_string(),
            "TypeError: xs.sortBy is not a function"
        );
        assert_eq!(err.location().line, 2);
    }

    #[test]
    fn test_closures_capture_scope() {
        let out = run(
            "function counter() { let n = 0; return () => ++n; }\n\
             const next = counter();\n\
             next(); next();\n\
             console.log(next());",
        )
        .unwrap();
        assert_eq!(out, vec!["3"]);
    }

    #[test]
    fn test_ternary_and_nullish() {
        let out = run(
            "let a = null;\n\
             console.log(a ?? 'fallback', 0 ?? 1, 3 > 2 ? 'yes' : 'no');",
        )
        .unwrap();
        assert_eq!(out, vec!["fallback 0 yes"]);
    }
}
