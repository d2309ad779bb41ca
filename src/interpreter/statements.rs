//! Statement execution implementation
//!
//! This module handles the execution of all statement types, including:
//!
//! - Variable declarations (`let`, `const`, `var`)
//! - Conditionals and blocks
//! - `return`, `break`, `continue` and `throw`
//!
//! Loops live in [`super::loops`].
//!
//! # Control Flow
//!
//! `break`, `continue` and `return` only set `control_flow` (and
//! `return_value`); the enclosing loop or call consumes the signal.
//! `throw` has no handler in the language and becomes a [`RuntimeError`].

use crate::interpreter::engine::{ControlFlow, Interpreter};
use crate::interpreter::errors::RuntimeError;
use crate::memory::value::Value;
use crate::parser::ast::*;

impl Interpreter {
    /// Execute a single statement
    pub(crate) fn execute_statement(
        &mut self,
        stmt: &AstNode,
    ) -> Result<(), RuntimeError> {
        self.nested(stmt.location(), |interp| interp.execute_node(stmt))
    }

    fn execute_node(&mut self, stmt: &AstNode) -> Result<(), RuntimeError> {
        self.current_location = stmt.location();
        self.tick()?;

        match stmt {
            // Bound when the enclosing block was entered
            AstNode::FunctionDecl { .. } => Ok(()),

            AstNode::VarDecl {
                kind, declarators, ..
            } => self.execute_var_decl(*kind, declarators),

            AstNode::Block { body, .. } => self.execute_block(body),

            AstNode::Return { expr, .. } => {
                self.return_value = match expr {
                    Some(expr) => self.evaluate_expr(expr)?,
                    None => Value::Undefined,
                };
                self.control_flow = ControlFlow::Return;
                Ok(())
            }

            AstNode::Throw { expr, location } => {
                let value = self.evaluate_expr(expr)?;
                Err(RuntimeError::Thrown {
                    message: self.stringify(&value, *location)?,
                    location: *location,
                })
            }

            AstNode::If {
                condition,
                then_branch,
                else_branch,
                ..
            } => {
                if self.evaluate_expr(condition)?.is_truthy() {
                    self.execute_block(then_branch)
                } else if let Some(else_branch) = else_branch {
                    self.execute_block(else_branch)
                } else {
                    Ok(())
                }
            }

            AstNode::While {
                condition, body, ..
            } => self.execute_while(condition, body),

            AstNode::DoWhile {
                body, condition, ..
            } => self.execute_do_while(body, condition),

            AstNode::For {
                init,
                condition,
                increment,
                body,
                ..
            } => self.execute_for(
                init.as_deref(),
                condition.as_deref(),
                increment.as_deref(),
                body,
            ),

            AstNode::Break { .. } => {
                self.control_flow = ControlFlow::Break;
                Ok(())
            }

            AstNode::Continue { .. } => {
                self.control_flow = ControlFlow::Continue;
                Ok(())
            }

            AstNode::ExpressionStatement { expr, .. } => {
                self.evaluate_expr(expr)?;
                Ok(())
            }

            AstNode::Empty { .. } => Ok(()),

            expr => {
                self.evaluate_expr(expr)?;
                Ok(())
            }
        }
    }

    fn execute_var_decl(
        &mut self,
        kind: DeclKind,
        declarators: &[Declarator],
    ) -> Result<(), RuntimeError> {
        for declarator in declarators {
            let name = declarator.name.as_str();
            match kind {
                DeclKind::Var => {
                    // Hoisted already; a bare `var x;` keeps the current value
                    if let Some(init) = &declarator.init {
                        let value = self.evaluate_expr(init)?;
                        self.scope.function_scope().define(name, value);
                    }
                }
                DeclKind::Let | DeclKind::Const => {
                    let value = match &declarator.init {
                        Some(init) => self.evaluate_expr(init)?,
                        None => Value::Undefined,
                    };
                    let mutable = kind == DeclKind::Let;
                    if !self.scope.declare(name, value, mutable) {
                        return Err(RuntimeError::AlreadyDeclared {
                            name: name.to_string(),
                            location: declarator.location,
                        });
                    }
                }
            }
        }
        Ok(())
    }
}
