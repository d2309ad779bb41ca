//! Statement parsing implementation
//!
//! This module handles parsing of all statement types:
//!
//! - Declarations: `let x = 1, y;`, `const n = data.length;`, `function f() {}`
//! - Control flow: `if`, `while`, `for`, `do-while`
//! - Jump statements: `return`, `break`, `continue`, `throw`
//! - Compound statements: `{ ... }`
//! - Expression statements: function calls, assignments
//!
//! # Grammar
//!
//! ```text
//! statement ::= function_decl | var_decl | if_stmt | while_stmt | for_stmt
//!             | do_while_stmt | return_stmt | throw_stmt
//!             | break_stmt | continue_stmt | block | ';' | expr_stmt
//! ```
//!
//! All parsing methods are implemented as `pub(crate)` methods on the [`Parser`] struct.

use std::rc::Rc;

use crate::parser::ast::*;
use crate::parser::lexer::Token;
use crate::parser::parse::{ParseError, Parser};

impl Parser {
    /// Parse block statements (inside braces, excluding the braces themselves)
    pub(crate) fn parse_block_statements(&mut self) -> Result<Vec<AstNode>, ParseError> {
        let mut statements = Vec::new();

        while !self.check(&Token::RBrace(self.current_location())) && !self.is_at_end() {
            statements.push(self.parse_statement()?);
        }

        Ok(statements)
    }

    /// Parse a statement
    pub(crate) fn parse_statement(&mut self) -> Result<AstNode, ParseError> {
        self.nested(Self::statement)
    }

    fn statement(&mut self) -> Result<AstNode, ParseError> {
        let loc = self.current_location();

        match self.peek() {
            Token::Function(_) if self.check_ahead(1, &Token::Ident(String::new(), loc)) => {
                self.advance();
                let name = self.expect_identifier()?;
                let def = self.parse_function_rest(Some(name), loc)?;
                return Ok(AstNode::FunctionDecl { def, location: loc });
            }
            Token::Let(_) | Token::Const(_) | Token::Var(_) => {
                let decl = self.parse_variable_declaration()?;
                self.expect_semicolon("after variable declaration")?;
                return Ok(decl);
            }
            _ => {}
        }

        if self.match_token(&Token::Return(loc)) {
            return self.parse_return_statement();
        }

        if self.match_token(&Token::Throw(loc)) {
            let expr = Box::new(self.parse_expression()?);
            self.expect_semicolon("after 'throw' expression")?;
            return Ok(AstNode::Throw { expr, location: loc });
        }

        if self.match_token(&Token::If(loc)) {
            return self.parse_if_statement();
        }

        if self.match_token(&Token::While(loc)) {
            return self.parse_while_statement();
        }

        if self.match_token(&Token::Do(loc)) {
            return self.parse_do_while_statement();
        }

        if self.match_token(&Token::For(loc)) {
            return self.parse_for_statement();
        }

        if self.match_token(&Token::Break(loc)) {
            if self.loop_depth == 0 {
                return Err(ParseError {
                    message: "'break' outside of a loop".to_string(),
                    location: loc,
                });
            }
            self.expect_semicolon("after 'break'")?;
            return Ok(AstNode::Break { location: loc });
        }

        if self.match_token(&Token::Continue(loc)) {
            if self.loop_depth == 0 {
                return Err(ParseError {
                    message: "'continue' outside of a loop".to_string(),
                    location: loc,
                });
            }
            self.expect_semicolon("after 'continue'")?;
            return Ok(AstNode::Continue { location: loc });
        }

        if self.match_token(&Token::LBrace(loc)) {
            let body = self.parse_block_statements()?;
            self.expect_rbrace("after block")?;
            return Ok(AstNode::Block { body, location: loc });
        }

        if self.match_token(&Token::Semicolon(loc)) {
            return Ok(AstNode::Empty { location: loc });
        }

        // Otherwise, it's an expression statement
        let expr = self.parse_expression()?;
        self.expect_semicolon("after expression")?;
        Ok(AstNode::ExpressionStatement {
            expr: Box::new(expr),
            location: loc,
        })
    }

    /// Parse parameter list and body after `function [name]`.
    ///
    /// Loop nesting does not cross function boundaries, so `break` inside a
    /// function defined in a loop body is still rejected.
    pub(crate) fn parse_function_rest(
        &mut self,
        name: Option<String>,
        loc: SourceLocation,
    ) -> Result<Rc<FunctionDef>, ParseError> {
        self.expect_lparen("after function name")?;
        let mut params = Vec::new();
        if !self.check(&Token::RParen(self.current_location())) {
            loop {
                params.push(self.expect_identifier()?);
                if !self.match_token(&Token::Comma(self.current_location())) {
                    break;
                }
            }
        }
        self.expect_rparen("after parameters")?;

        self.expect_lbrace("before function body")?;
        let body = self.parse_function_body()?;

        Ok(Rc::new(FunctionDef {
            name,
            params,
            body: FunctionBody::Block(body),
            is_arrow: false,
            location: loc,
        }))
    }

    /// Parse statements up to the closing `}` of a function body
    pub(crate) fn parse_function_body(&mut self) -> Result<Vec<AstNode>, ParseError> {
        let saved_depth = std::mem::take(&mut self.loop_depth);
        let body = self.parse_block_statements();
        self.loop_depth = saved_depth;
        let body = body?;
        self.expect_rbrace("after function body")?;
        Ok(body)
    }

    /// Parse return statement
    fn parse_return_statement(&mut self) -> Result<AstNode, ParseError> {
        let loc = self.previous_location();

        let expr = if self.check(&Token::Semicolon(self.current_location())) {
            None
        } else {
            Some(Box::new(self.parse_expression()?))
        };

        self.expect_semicolon("after return")?;

        Ok(AstNode::Return {
            expr,
            location: loc,
        })
    }

    /// Parse if statement
    fn parse_if_statement(&mut self) -> Result<AstNode, ParseError> {
        let loc = self.previous_location();

        self.expect_lparen("after 'if'")?;
        let condition = Box::new(self.parse_expression()?);
        self.expect_rparen("after if condition")?;

        let then_branch = self.parse_statement_or_block()?;

        let else_branch = if self.match_token(&Token::Else(self.current_location())) {
            Some(self.parse_statement_or_block()?)
        } else {
            None
        };

        Ok(AstNode::If {
            condition,
            then_branch,
            else_branch,
            location: loc,
        })
    }

    /// Parse while statement
    fn parse_while_statement(&mut self) -> Result<AstNode, ParseError> {
        let loc = self.previous_location();

        self.expect_lparen("after 'while'")?;
        let condition = Box::new(self.parse_expression()?);
        self.expect_rparen("after while condition")?;

        let body = self.parse_loop_body()?;

        Ok(AstNode::While {
            condition,
            body,
            location: loc,
        })
    }

    /// Parse do-while statement
    fn parse_do_while_statement(&mut self) -> Result<AstNode, ParseError> {
        let loc = self.previous_location();

        let body = self.parse_loop_body()?;

        self.expect_token(
            &Token::While(self.current_location()),
            "Expected 'while' after do body",
        )?;
        self.expect_lparen("after 'while'")?;
        let condition = Box::new(self.parse_expression()?);
        self.expect_rparen("after do-while condition")?;
        self.expect_semicolon("after do-while")?;

        Ok(AstNode::DoWhile {
            body,
            condition,
            location: loc,
        })
    }

    /// Parse for statement
    fn parse_for_statement(&mut self) -> Result<AstNode, ParseError> {
        let loc = self.previous_location();

        self.expect_lparen("after 'for'")?;

        // Init (optional)
        let init = if self.check(&Token::Semicolon(self.current_location())) {
            None
        } else if matches!(self.peek(), Token::Let(_) | Token::Const(_) | Token::Var(_)) {
            Some(Box::new(self.parse_variable_declaration()?))
        } else {
            let expr_loc = self.current_location();
            let expr = self.parse_expression()?;
            Some(Box::new(AstNode::ExpressionStatement {
                expr: Box::new(expr),
                location: expr_loc,
            }))
        };
        self.expect_semicolon("after for init")?;

        // Condition (optional)
        let condition = if self.check(&Token::Semicolon(self.current_location())) {
            None
        } else {
            Some(Box::new(self.parse_expression()?))
        };
        self.expect_semicolon("after for condition")?;

        // Increment (optional)
        let increment = if self.check(&Token::RParen(self.current_location())) {
            None
        } else {
            Some(Box::new(self.parse_expression()?))
        };
        self.expect_rparen("after for clauses")?;

        let body = self.parse_loop_body()?;

        Ok(AstNode::For {
            init,
            condition,
            increment,
            body,
            location: loc,
        })
    }

    /// Parse `let`/`const`/`var` with one or more declarators (no trailing `;`)
    pub(crate) fn parse_variable_declaration(&mut self) -> Result<AstNode, ParseError> {
        let loc = self.current_location();
        let kind = match self.advance() {
            Token::Let(_) => DeclKind::Let,
            Token::Const(_) => DeclKind::Const,
            Token::Var(_) => DeclKind::Var,
            other => {
                return Err(ParseError {
                    message: format!("Expected declaration, found {}", other),
                    location: loc,
                });
            }
        };

        let mut declarators = Vec::new();
        loop {
            let name_loc = self.current_location();
            let name = self.expect_identifier()?;

            let init = if self.match_token(&Token::Eq(self.current_location())) {
                Some(self.parse_assignment()?)
            } else if kind == DeclKind::Const {
                return Err(ParseError {
                    message: format!("Missing initializer in const declaration '{}'", name),
                    location: name_loc,
                });
            } else {
                None
            };

            declarators.push(Declarator {
                name,
                init,
                location: name_loc,
            });

            if !self.match_token(&Token::Comma(self.current_location())) {
                break;
            }
        }

        Ok(AstNode::VarDecl {
            kind,
            declarators,
            location: loc,
        })
    }

    /// Parse a loop body, tracking nesting for `break`/`continue`
    fn parse_loop_body(&mut self) -> Result<Vec<AstNode>, ParseError> {
        self.loop_depth += 1;
        let body = self.parse_statement_or_block();
        self.loop_depth -= 1;
        body
    }

    /// Parse statement or block (for if/while/for bodies)
    pub(crate) fn parse_statement_or_block(&mut self) -> Result<Vec<AstNode>, ParseError> {
        if self.match_token(&Token::LBrace(self.current_location())) {
            let statements = self.parse_block_statements()?;
            self.expect_rbrace("after block")?;
            Ok(statements)
        } else {
            // Single statement
            Ok(vec![self.parse_statement()?])
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::ast::*;
    use crate::parser::parse::parse;

    #[test]
    fn test_multiple_declarators() {
        let program = parse("let i = 0, j, k = i + 1;").unwrap();

        match &program.nodes[0] {
            AstNode::VarDecl {
                kind: DeclKind::Let,
                declarators,
                ..
            } => {
                let names: Vec<_> = declarators.iter().map(|d| d.name.as_str()).collect();
                assert_eq!(names, vec!["i", "j", "k"]);
                assert!(declarators[1].init.is_none());
            }
            other => panic!("Expected declaration, got {other:?}"),
        }
    }

    #[test]
    fn test_const_requires_initializer() {
        let err = parse("const n;").unwrap_err();
        assert!(err.message.contains("Missing initializer"));
    }

    #[test]
    fn test_for_loop_with_declaration() {
        let program = parse("for (let i = 1; i < n; i++) { continue; }").unwrap();

        match &program.nodes[0] {
            AstNode::For {
                init: Some(init),
                condition: Some(_),
                increment: Some(_),
                body,
                ..
            } => {
                assert!(matches!(**init, AstNode::VarDecl { .. }));
                assert!(matches!(body[0], AstNode::Continue { .. }));
            }
            other => panic!("Expected for loop, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_for_clauses() {
        let program = parse("for (;;) { break; }").unwrap();
        assert!(matches!(
            program.nodes[0],
            AstNode::For {
                init: None,
                condition: None,
                increment: None,
                ..
            }
        ));
    }

    #[test]
    fn test_do_while() {
        let program = parse("do { x--; } while (x > 0);").unwrap();
        assert!(matches!(program.nodes[0], AstNode::DoWhile { .. }));
    }

    #[test]
    fn test_break_outside_loop_is_rejected() {
        let err = parse("function f() { break; }").unwrap_err();
        assert!(err.message.contains("'break' outside of a loop"));
    }

    #[test]
    fn test_break_does_not_cross_function_boundary() {
        let err = parse("while (true) { function f() { continue; } }").unwrap_err();
        assert!(err.message.contains("'continue' outside of a loop"));
    }

    #[test]
    fn test_throw_and_empty_statements() {
        let program = parse(";throw \"bad\";").unwrap();
        assert!(matches!(program.nodes[0], AstNode::Empty { .. }));
        assert!(matches!(program.nodes[1], AstNode::Throw { .. }));
    }
}
