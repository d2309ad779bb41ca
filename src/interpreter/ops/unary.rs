use crate::interpreter::engine::Interpreter;
use crate::interpreter::errors::RuntimeError;
use crate::interpreter::ops::binary::to_int32;
use crate::memory::value::Value;
use crate::parser::ast::{AstNode, SourceLocation, UnOp};

impl Interpreter {
    pub(crate) fn evaluate_unary(
        &mut self,
        op: UnOp,
        operand: &AstNode,
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        match op {
            UnOp::Neg => Ok(Value::Number(-self.evaluate_expr(operand)?.to_number())),
            UnOp::Plus => Ok(Value::Number(self.evaluate_expr(operand)?.to_number())),
            UnOp::Not => Ok(Value::Bool(!self.evaluate_expr(operand)?.is_truthy())),
            UnOp::BitNot => {
                let n = to_int32(self.evaluate_expr(operand)?.to_number());
                Ok(Value::Number(f64::from(!n)))
            }
            UnOp::Typeof => {
                // `typeof undeclared` is "undefined", not a ReferenceError
                if let AstNode::Variable(name, _) = operand {
                    if self.scope.lookup(name).is_none() {
                        return Ok(Value::string("undefined"));
                    }
                }
                Ok(Value::string(self.evaluate_expr(operand)?.type_of()))
            }
            UnOp::PreInc => self.evaluate_update(operand, 1.0, true, location),
            UnOp::PreDec => self.evaluate_update(operand, -1.0, true, location),
            UnOp::PostInc => self.evaluate_update(operand, 1.0, false, location),
            UnOp::PostDec => self.evaluate_update(operand, -1.0, false, location),
        }
    }

    /// `++x`, `x--` and friends
    fn evaluate_update(
        &mut self,
        operand: &AstNode,
        delta: f64,
        prefix: bool,
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        let place = self.resolve_place(operand)?;
        let old = self.read_place(&place, location)?.to_number();
        let new = old + delta;
        self.write_place(&place, Value::Number(new), location)?;
        Ok(Value::Number(if prefix { new } else { old }))
    }
}

#[cfg(test)]
mod tests {
    use crate::executor::ExecutorConfig;
    use crate::interpreter::engine::Interpreter;
    use crate::parser::parse;

    fn output(source: &str) -> Vec<String> {
        let program = parse(source).unwrap();
        let mut interp = Interpreter::new(&ExecutorConfig::default(), &[]);
        interp.run(&program).unwrap();
        interp.take_console().get_output()
    }

    #[test]
    fn test_increment_forms() {
        let out = output(
            "let i = 5;\n\
             let a = i++;\n\
             let b = ++i;\n\
             let c = i--;\n\
             console.log(a, b, c, i);",
        );
        assert_eq!(out, vec!["5 7 7 6"]);
    }

    #[test]
    fn test_typeof() {
        let out = output(
            "console.log(typeof 1, typeof 'x', typeof [], typeof nope, typeof snapshot, typeof null);",
        );
        assert_eq!(out, vec!["number string object undefined function object"]);
    }

    #[test]
    fn test_numeric_unary() {
        let out = output("console.log(-'3', +true, !0, ~5, ~~4.7);");
        assert_eq!(out, vec!["-3 1 true -6 4"]);
    }
}
