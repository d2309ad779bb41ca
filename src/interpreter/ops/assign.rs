//! Assignment, compound assignment and array destructuring
//!
//! Targets are first resolved to a [`Place`] so that the object and key
//! sub-expressions of `a[i++] += 1` are evaluated exactly once.

use crate::interpreter::engine::Interpreter;
use crate::interpreter::errors::RuntimeError;
use crate::memory::value::Value;
use crate::parser::ast::{AstNode, BinOp, Element, SourceLocation};

/// A resolved assignment target
pub(crate) enum Place {
    Variable(String),
    Index(Value, Value),
    Member(Value, String),
}

impl Interpreter {
    /// Evaluate the object/key parts of `target` without reading it
    pub(crate) fn resolve_place(
        &mut self,
        target: &AstNode,
    ) -> Result<Place, RuntimeError> {
        match target {
            AstNode::Variable(name, _) => Ok(Place::Variable(name.clone())),
            AstNode::Index { object, index, .. } => {
                let object = self.evaluate_expr(object)?;
                let key = self.evaluate_expr(index)?;
                Ok(Place::Index(object, key))
            }
            AstNode::Member {
                object, property, ..
            } => {
                let object = self.evaluate_expr(object)?;
                Ok(Place::Member(object, property.clone()))
            }
            other => Err(RuntimeError::InvalidAssignmentTarget {
                location: other.location(),
            }),
        }
    }

    pub(crate) fn read_place(
        &self,
        place: &Place,
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        match place {
            Place::Variable(name) => self.lookup_variable(name, location),
            Place::Index(object, key) => self.get_index(object, key, location),
            Place::Member(object, property) => {
                self.get_member(object, property, location)
            }
        }
    }

    pub(crate) fn write_place(
        &self,
        place: &Place,
        value: Value,
        location: SourceLocation,
    ) -> Result<(), RuntimeError> {
        match place {
            Place::Variable(name) => self.assign_variable(name, value, location),
            Place::Index(object, key) => {
                self.set_index(object, key, value, location)
            }
            Place::Member(object, property) => {
                self.set_member(object, property, value, location)
            }
        }
    }

    /// `target = value`; evaluates to the assigned value
    pub(crate) fn evaluate_assignment(
        &mut self,
        target: &AstNode,
        value: &AstNode,
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        if let AstNode::ArrayLiteral { elements, .. } = target {
            let value = self.evaluate_expr(value)?;
            self.destructure(elements, &value, location)?;
            return Ok(value);
        }

        let place = self.resolve_place(target)?;
        let value = self.evaluate_expr(value)?;
        self.write_place(&place, value.clone(), location)?;
        Ok(value)
    }

    /// `target op= value`
    pub(crate) fn evaluate_compound_assignment(
        &mut self,
        target: &AstNode,
        op: BinOp,
        value: &AstNode,
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        let place = self.resolve_place(target)?;
        let current = self.read_place(&place, location)?;
        let rhs = self.evaluate_expr(value)?;
        let result = self.apply_binary(op, &current, &rhs, location)?;
        self.write_place(&place, result.clone(), location)?;
        Ok(result)
    }

    /// Assign the elements of `value` to the targets of `[a, b[i], [c]] = value`
    /// from left to right. The whole right-hand side is evaluated before
    /// any target is written, which is what makes `[x, y] = [y, x]` swap.
    fn destructure(
        &mut self,
        targets: &[Element],
        value: &Value,
        location: SourceLocation,
    ) -> Result<(), RuntimeError> {
        let items = self.iterate(value, location)?;
        for (i, target) in targets.iter().enumerate() {
            let Element::Item(target) = target else {
                return Err(RuntimeError::InvalidAssignmentTarget { location });
            };
            let item = items.get(i).cloned().unwrap_or_default();
            match target {
                AstNode::ArrayLiteral { elements, .. } => {
                    self.destructure(elements, &item, location)?
                }
                _ => {
                    let place = self.resolve_place(target)?;
                    self.write_place(&place, item, location)?;
                }
            }
        }
        Ok(())
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
    fn test_destructuring_swap() {
        let out = run(
            "let a = [1, 2, 3];\n\
             [a[0], a[2]] = [a[2], a[0]];\n\
             let x = 1, y = 2;\n\
             [x, y] = [y, x];\n\
             console.log(a.join(','), x, y);",
        )
        .unwrap();
        assert_eq!(out, vec!["3,2,1 2 1"]);
    }

    #[test]
    fn test_nested_destructuring_and_missing_items() {
        let out = run(
            "let p, q, r;\n\
             [p, [q, r]] = [1, [2]];\n\
             console.log(p, q, r);",
        )
        .unwrap();
        assert_eq!(out, vec!["1 2 undefined"]);
    }

    #[test]
    fn test_compound_assignment_evaluates_index_once() {
        let out = run(
            "let xs = [10, 20, 30];\n\
             let i = 0;\n\
             xs[i++] += 5;\n\
             console.log(xs.join(','), i);",
        )
        .unwrap();
        assert_eq!(out, vec!["15,20,30 1"]);
    }

    #[test]
    fn test_string_concatenation_assignment() {
        let out = run("let s = 'a'; s += 1; s += [2, 3]; console.log(s);").unwrap();
        assert_eq!(out, vec!["a12,3"]);
    }

    #[test]
    fn test_destructuring_non_iterable_fails() {
        let err = run("let a, b;\n[a, b] = 5;").unwrap_err();
        assert_eq!(err.to_string(), "TypeError: 5 is not iterable");
        assert_eq!(err.location().line, 2);
    }
}
