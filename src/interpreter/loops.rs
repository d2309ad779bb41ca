//! Loop statement execution (`while`, `do-while`, `for`).
//!
//! `break` and `continue` are propagated via `LoopBodyResult` so the loop
//! driver can react without inspecting `control_flow` directly. A `return`
//! inside a loop body yields `LoopBodyResult::Exit`, which unwinds the loop
//! and leaves the signal for the enclosing call.
//!
//! Every iteration is charged against the operation budget, so a loop with
//! an empty body still terminates.

use crate::interpreter::engine::{ControlFlow, Interpreter};
use crate::interpreter::errors::RuntimeError;
use crate::memory::scope::{Scope, ScopeKind};
use crate::parser::ast::{AstNode, DeclKind};

/// How a loop body ended
pub(crate) enum LoopBodyResult {
    /// Ran to completion or hit `continue`
    Continue,
    /// Hit `break`
    Break,
    /// Hit `return`; the signal stays in `control_flow`
    Exit,
}

impl Interpreter {
    /// Executes `body` inside a fresh block scope and consumes any loop signal.
    pub(crate) fn execute_loop_body(
        &mut self,
        body: &[AstNode],
    ) -> Result<LoopBodyResult, RuntimeError> {
        self.execute_block(body)?;
        Ok(match self.control_flow {
            ControlFlow::Normal => LoopBodyResult::Continue,
            ControlFlow::Continue => {
                self.control_flow = ControlFlow::Normal;
                LoopBodyResult::Continue
            }
            ControlFlow::Break => {
                self.control_flow = ControlFlow::Normal;
                LoopBodyResult::Break
            }
            ControlFlow::Return => LoopBodyResult::Exit,
        })
    }

    /// Executes a `while (condition) { body }` loop.
    pub(crate) fn execute_while(
        &mut self,
        condition: &AstNode,
        body: &[AstNode],
    ) -> Result<(), RuntimeError> {
        loop {
            self.tick()?;
            if !self.evaluate_expr(condition)?.is_truthy() {
                break;
            }
            match self.execute_loop_body(body)? {
                LoopBodyResult::Continue => {}
                LoopBodyResult::Break | LoopBodyResult::Exit => break,
            }
        }
        Ok(())
    }

    /// Executes a `do { body } while (condition)` loop.
    ///
    /// The body always runs at least once; `continue` jumps to the condition.
    pub(crate) fn execute_do_while(
        &mut self,
        body: &[AstNode],
        condition: &AstNode,
    ) -> Result<(), RuntimeError> {
        loop {
            self.tick()?;
            match self.execute_loop_body(body)? {
                LoopBodyResult::Continue => {}
                LoopBodyResult::Break | LoopBodyResult::Exit => break,
            }
            if !self.evaluate_expr(condition)?.is_truthy() {
                break;
            }
        }
        Ok(())
    }

    /// Executes a `for (init; condition; increment) { body }` loop.
    ///
    /// Bindings made by a `let` in `init` are copied into a fresh scope
    /// before every increment, so closures created in one iteration keep
    /// that iteration's values.
    pub(crate) fn execute_for(
        &mut self,
        init: Option<&AstNode>,
        condition: Option<&AstNode>,
        increment: Option<&AstNode>,
        body: &[AstNode],
    ) -> Result<(), RuntimeError> {
        let per_iteration = matches!(
            init,
            Some(AstNode::VarDecl {
                kind: DeclKind::Let,
                ..
            })
        );
        let loop_scope = Scope::child(&self.scope, ScopeKind::Block);
        self.with_scope(loop_scope, |interp| {
            if let Some(init) = init {
                interp.execute_statement(init)?;
            }
            if per_iteration {
                interp.scope = interp.scope.fork();
            }

            loop {
                interp.tick()?;
                if let Some(condition) = condition {
                    if !interp.evaluate_expr(condition)?.is_truthy() {
                        break;
                    }
                }

                match interp.execute_loop_body(body)? {
                    LoopBodyResult::Continue => {}
                    LoopBodyResult::Break | LoopBodyResult::Exit => break,
                }

                if per_iteration {
                    interp.scope = interp.scope.fork();
                }
                if let Some(increment) = increment {
                    interp.evaluate_expr(increment)?;
                }
            }
            Ok(())
        })
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
    fn test_for_with_break_and_continue() {
        let out = output(
            "let s = '';\n\
             for (let i = 0; i < 10; i++) {\n\
               if (i % 2 === 1) continue;\n\
               if (i > 6) break;\n\
               s += i;\n\
             }\n\
             console.log(s);",
        );
        assert_eq!(out, vec!["0246"]);
    }

    #[test]
    fn test_for_scope_does_not_leak() {
        let out = output(
            "let i = 'outer';\n\
             for (let i = 0; i < 3; i++) {}\n\
             console.log(i);",
        );
        assert_eq!(out, vec!["outer"]);
    }

    #[test]
    fn test_while_and_do_while() {
        let out = output(
            "let n = 0; while (n < 5) n++;\n\
             let m = 10; do { m++; } while (false);\n\
             console.log(n, m);",
        );
        assert_eq!(out, vec!["5 11"]);
    }

    #[test]
    fn test_return_inside_nested_loops() {
        let out = output(
            "function find(xs, t) {\n\
               for (let i = 0; i < xs.length; i++) {\n\
                 let j = 0;\n\
                 while (true) { if (xs[i] === t) return i; j++; if (j > 2) break; }\n\
               }\n\
               return -1;\n\
             }\n\
             console.log(find([4, 5, 6], 6), find([1], 9));",
        );
        assert_eq!(out, vec!["2 -1"]);
    }

    #[test]
    fn test_for_let_closures_capture_each_iteration() {
        let out = output(
            "const fns = [];\n\
             for (let i = 0; i < 3; i++) { fns.push(() => i); }\n\
             const shared = [];\n\
             for (var j = 0; j < 3; j++) { shared.push(() => j); }\n\
             console.log(fns[0](), fns[2](), shared[0]());",
        );
        assert_eq!(out, vec!["0 2 3"]);
    }

    #[test]
    fn test_for_let_updates_in_body_carry_over() {
        let out = output(
            "let seen = '';\n\
             for (let i = 0; i < 6; i++) { seen += i; i++; }\n\
             console.log(seen);",
        );
        assert_eq!(out, vec!["024"]);
    }

    #[test]
    fn test_let_in_loop_body_is_fresh_each_iteration() {
        let out = output(
            "let total = 0;\n\
             for (let i = 0; i < 3; i++) { let x = i * 2; total += x; }\n\
             console.log(total);",
        );
        assert_eq!(out, vec!["6"]);
    }
}
