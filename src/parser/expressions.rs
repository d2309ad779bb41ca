//! Expression parsing implementation
//!
//! This module handles parsing of expressions using one method per precedence
//! level for binary operators and recursive descent for other expression forms.
//!
//! # Supported Expressions
//!
//! - Literals: numbers, strings, template literals, `true`/`false`,
//!   `null`/`undefined`, array literals with `...spread`
//! - Identifiers and variables
//! - Binary operators: arithmetic, comparison, logical, nullish, bitwise
//! - Unary operators: `-`, `+`, `!`, `~`, `typeof`, `++`, `--`
//! - Postfix: `[]`, `.`, `()`, `++`, `--`
//! - Ternary: `? :`
//! - Assignment, compound assignment and array destructuring assignment
//! - Function expressions and arrow functions
//!
//! All parsing methods are implemented as `pub(crate)` methods on the [`Parser`] struct.

use std::rc::Rc;

use crate::parser::ast::*;
use crate::parser::lexer::{TemplateChunk, Token};
use crate::parser::parse::{ParseError, Parser};

type Operand = fn(&mut Parser) -> Result<AstNode, ParseError>;

impl Parser {
    /// Parse expression (top-level entry point)
    pub(crate) fn parse_expression(&mut self) -> Result<AstNode, ParseError> {
        self.parse_assignment()
    }

    /// Parse assignment, arrow function or ternary (right-associative)
    pub(crate) fn parse_assignment(&mut self) -> Result<AstNode, ParseError> {
        self.nested(Self::assignment)
    }

    fn assignment(&mut self) -> Result<AstNode, ParseError> {
        if let Some(arrow) = self.try_parse_arrow()? {
            return Ok(arrow);
        }

        let expr = self.parse_ternary()?;

        let loc = self.current_location();
        if self.match_token(&Token::Eq(loc)) {
            if !expr.is_assignment_target() {
                return Err(ParseError {
                    message: "Invalid assignment target".to_string(),
                    location: expr.location(),
                });
            }
            let value = Box::new(self.parse_assignment()?);
            return Ok(AstNode::Assignment {
                target: Box::new(expr),
                value,
                location: loc,
            });
        }

        // Compound assignments
        let compound_op = if self.match_token(&Token::PlusEq(loc)) {
            Some(BinOp::Add)
        } else if self.match_token(&Token::MinusEq(loc)) {
            Some(BinOp::Sub)
        } else if self.match_token(&Token::StarEq(loc)) {
            Some(BinOp::Mul)
        } else if self.match_token(&Token::SlashEq(loc)) {
            Some(BinOp::Div)
        } else if self.match_token(&Token::PercentEq(loc)) {
            Some(BinOp::Mod)
        } else {
            None
        };

        if let Some(op) = compound_op {
            if !is_simple_target(&expr) {
                return Err(ParseError {
                    message: "Invalid compound assignment target".to_string(),
                    location: expr.location(),
                });
            }
            let value = Box::new(self.parse_assignment()?);
            return Ok(AstNode::CompoundAssignment {
                target: Box::new(expr),
                op,
                value,
                location: loc,
            });
        }

        Ok(expr)
    }

    /// Recognize `x => ...` and `(a, b) => ...`, restoring position otherwise
    fn try_parse_arrow(&mut self) -> Result<Option<AstNode>, ParseError> {
        let loc = self.current_location();

        if let Token::Ident(name, _) = self.peek() {
            if !self.check_ahead(1, &Token::FatArrow(loc)) {
                return Ok(None);
            }
            let params = vec![name.clone()];
            self.advance(); // parameter
            self.advance(); // =>
            return self.parse_arrow_body(params, loc).map(Some);
        }

        if !self.check(&Token::LParen(loc)) {
            return Ok(None);
        }

        let saved_pos = self.position;
        match self.try_parse_arrow_params() {
            Some(params) => self.parse_arrow_body(params, loc).map(Some),
            None => {
                self.position = saved_pos;
                Ok(None)
            }
        }
    }

    /// Lookahead for `( ident, ... ) =>`; consumes the tokens on success
    fn try_parse_arrow_params(&mut self) -> Option<Vec<String>> {
        self.advance(); // '('
        let mut params = Vec::new();

        if !self.match_token(&Token::RParen(self.current_location())) {
            loop {
                let Token::Ident(name, _) = self.peek() else {
                    return None;
                };
                params.push(name.clone());
                self.advance();

                if self.match_token(&Token::Comma(self.current_location())) {
                    continue;
                }
                if self.match_token(&Token::RParen(self.current_location())) {
                    break;
                }
                return None;
            }
        }

        self.match_token(&Token::FatArrow(self.current_location()))
            .then_some(params)
    }

    fn parse_arrow_body(
        &mut self,
        params: Vec<String>,
        loc: SourceLocation,
    ) -> Result<AstNode, ParseError> {
        let body = if self.match_token(&Token::LBrace(self.current_location())) {
            FunctionBody::Block(self.parse_function_body()?)
        } else {
            let saved_depth = std::mem::take(&mut self.loop_depth);
            let expr = self.parse_assignment();
            self.loop_depth = saved_depth;
            FunctionBody::Expr(Box::new(expr?))
        };

        Ok(AstNode::Function {
            def: Rc::new(FunctionDef {
                name: None,
                params,
                body,
                is_arrow: true,
                location: loc,
            }),
            location: loc,
        })
    }

    /// Parse ternary: condition ? true_expr : false_expr
    fn parse_ternary(&mut self) -> Result<AstNode, ParseError> {
        let expr = self.parse_nullish()?;

        if self.match_token(&Token::Question(self.current_location())) {
            let loc = self.previous_location();
            let true_expr = Box::new(self.parse_assignment()?);
            self.expect_token(
                &Token::Colon(self.current_location()),
                "Expected ':' in ternary expression",
            )?;
            let false_expr = Box::new(self.parse_assignment()?);

            return Ok(AstNode::TernaryOp {
                condition: Box::new(expr),
                true_expr,
                false_expr,
                location: loc,
            });
        }

        Ok(expr)
    }

    /// Parse one left-associative binary precedence level
    fn parse_binary_level(
        &mut self,
        operand: Operand,
        operators: &[(Token, BinOp)],
    ) -> Result<AstNode, ParseError> {
        let mut left = operand(self)?;

        'outer: loop {
            let loc = self.current_location();
            for (token, op) in operators {
                if self.match_token(token) {
                    let right = Box::new(operand(self)?);
                    left = AstNode::BinaryOp {
                        op: *op,
                        left: Box::new(left),
                        right,
                        location: loc,
                    };
                    continue 'outer;
                }
            }
            break;
        }

        Ok(left)
    }

    /// Parse nullish coalescing (??)
    fn parse_nullish(&mut self) -> Result<AstNode, ParseError> {
        let loc = self.current_location();
        self.parse_binary_level(
            Parser::parse_logical_or,
            &[(Token::Nullish(loc), BinOp::Nullish)],
        )
    }

    /// Parse logical OR (||)
    fn parse_logical_or(&mut self) -> Result<AstNode, ParseError> {
        let loc = self.current_location();
        self.parse_binary_level(
            Parser::parse_logical_and,
            &[(Token::OrOr(loc), BinOp::Or)],
        )
    }

    /// Parse logical AND (&&)
    fn parse_logical_and(&mut self) -> Result<AstNode, ParseError> {
        let loc = self.current_location();
        self.parse_binary_level(
            Parser::parse_bitwise_or,
            &[(Token::AndAnd(loc), BinOp::And)],
        )
    }

    /// Parse bitwise OR (|)
    fn parse_bitwise_or(&mut self) -> Result<AstNode, ParseError> {
        let loc = self.current_location();
        self.parse_binary_level(
            Parser::parse_bitwise_xor,
            &[(Token::Pipe(loc), BinOp::BitOr)],
        )
    }

    /// Parse bitwise XOR (^)
    fn parse_bitwise_xor(&mut self) -> Result<AstNode, ParseError> {
        let loc = self.current_location();
        self.parse_binary_level(
            Parser::parse_bitwise_and,
            &[(Token::Caret(loc), BinOp::BitXor)],
        )
    }

    /// Parse bitwise AND (&)
    fn parse_bitwise_and(&mut self) -> Result<AstNode, ParseError> {
        let loc = self.current_location();
        self.parse_binary_level(
            Parser::parse_equality,
            &[(Token::Amp(loc), BinOp::BitAnd)],
        )
    }

    /// Parse equality (== != === !==)
    fn parse_equality(&mut self) -> Result<AstNode, ParseError> {
        let loc = self.current_location();
        self.parse_binary_level(
            Parser::parse_relational,
            &[
                (Token::EqEqEq(loc), BinOp::StrictEq),
                (Token::NotEqEq(loc), BinOp::StrictNe),
                (Token::EqEq(loc), BinOp::Eq),
                (Token::NotEq(loc), BinOp::Ne),
            ],
        )
    }

    /// Parse relational (< <= > >=)
    fn parse_relational(&mut self) -> Result<AstNode, ParseError> {
        let loc = self.current_location();
        self.parse_binary_level(
            Parser::parse_shift,
            &[
                (Token::Lt(loc), BinOp::Lt),
                (Token::Le(loc), BinOp::Le),
                (Token::Gt(loc), BinOp::Gt),
                (Token::Ge(loc), BinOp::Ge),
            ],
        )
    }

    /// Parse bitwise shift (<< >> >>>)
    fn parse_shift(&mut self) -> Result<AstNode, ParseError> {
        let loc = self.current_location();
        self.parse_binary_level(
            Parser::parse_additive,
            &[
                (Token::LtLt(loc), BinOp::BitShl),
                (Token::GtGt(loc), BinOp::BitShr),
                (Token::GtGtGt(loc), BinOp::BitUShr),
            ],
        )
    }

    /// Parse additive (+ -)
    fn parse_additive(&mut self) -> Result<AstNode, ParseError> {
        let loc = self.current_location();
        self.parse_binary_level(
            Parser::parse_multiplicative,
            &[(Token::Plus(loc), BinOp::Add), (Token::Minus(loc), BinOp::Sub)],
        )
    }

    /// Parse multiplicative (* / %)
    fn parse_multiplicative(&mut self) -> Result<AstNode, ParseError> {
        let loc = self.current_location();
        self.parse_binary_level(
            Parser::parse_exponent,
            &[
                (Token::Star(loc), BinOp::Mul),
                (Token::Slash(loc), BinOp::Div),
                (Token::Percent(loc), BinOp::Mod),
            ],
        )
    }

    /// Parse exponentiation (**), right-associative
    fn parse_exponent(&mut self) -> Result<AstNode, ParseError> {
        let base = self.parse_unary()?;

        if self.match_token(&Token::StarStar(self.current_location())) {
            let loc = self.previous_location();
            let exponent = Box::new(self.nested(Self::parse_exponent)?);
            return Ok(AstNode::BinaryOp {
                op: BinOp::Pow,
                left: Box::new(base),
                right: exponent,
                location: loc,
            });
        }

        Ok(base)
    }

    /// Parse unary (! ~ - + typeof ++ --)
    fn parse_unary(&mut self) -> Result<AstNode, ParseError> {
        let loc = self.current_location();

        let op = match self.peek() {
            Token::Bang(_) => UnOp::Not,
            Token::Tilde(_) => UnOp::BitNot,
            Token::Minus(_) => UnOp::Neg,
            Token::Plus(_) => UnOp::Plus,
            Token::Typeof(_) => UnOp::Typeof,
            Token::PlusPlus(_) => UnOp::PreInc,
            Token::MinusMinus(_) => UnOp::PreDec,
            _ => return self.parse_postfix(),
        };
        self.advance();

        let operand = self.nested(Self::parse_unary)?;
        if matches!(op, UnOp::PreInc | UnOp::PreDec) && !is_simple_target(&operand) {
            return Err(ParseError {
                message: "Invalid left-hand side expression in prefix operation"
                    .to_string(),
                location: operand.location(),
            });
        }

        Ok(AstNode::UnaryOp {
            op,
            operand: Box::new(operand),
            location: loc,
        })
    }

    /// Parse postfix (++ -- [] . ())
    fn parse_postfix(&mut self) -> Result<AstNode, ParseError> {
        let mut expr = self.parse_primary()?;

        loop {
            let loc = self.current_location();

            if self.check(&Token::PlusPlus(loc)) || self.check(&Token::MinusMinus(loc)) {
                if !is_simple_target(&expr) {
                    return Err(ParseError {
                        message: "Invalid left-hand side expression in postfix operation"
                            .to_string(),
                        location: expr.location(),
                    });
                }
                let op = if self.match_token(&Token::PlusPlus(loc)) {
                    UnOp::PostInc
                } else {
                    self.advance();
                    UnOp::PostDec
                };
                expr = AstNode::UnaryOp {
                    op,
                    operand: Box::new(expr),
                    location: loc,
                };
            } else if self.at_member_suffix() {
                expr = self.parse_member_suffix(expr)?;
            } else {
                break;
            }
        }

        Ok(expr)
    }

    fn at_member_suffix(&self) -> bool {
        matches!(
            self.peek(),
            Token::LBracket(_) | Token::Dot(_) | Token::LParen(_)
        )
    }

    /// Parse one `.name`, `[index]` or `(args)` suffix applied to `expr`
    fn parse_member_suffix(
        &mut self,
        expr: AstNode,
    ) -> Result<AstNode, ParseError> {
        let loc = self.current_location();

        if self.match_token(&Token::LBracket(loc)) {
            let index = Box::new(self.parse_expression()?);
            self.expect_token(
                &Token::RBracket(self.current_location()),
                "Expected ']' after index",
            )?;
            Ok(AstNode::Index {
                object: Box::new(expr),
                index,
                location: loc,
            })
        } else if self.match_token(&Token::Dot(loc)) {
            let property = self.expect_identifier()?;
            Ok(AstNode::Member {
                object: Box::new(expr),
                property,
                location: loc,
            })
        } else if self.match_token(&Token::LParen(loc)) {
            let args = self.parse_element_list(&Token::RParen(loc))?;
            self.expect_rparen("after function arguments")?;
            Ok(AstNode::Call {
                callee: Box::new(expr),
                args,
                location: loc,
            })
        } else {
            Err(self.error(format!("Unexpected token: {}", self.peek())))
        }
    }

    /// Parse comma-separated elements (with `...spread`) up to `close`.
    ///
    /// A trailing comma before `close` is accepted.
    fn parse_element_list(&mut self, close: &Token) -> Result<Vec<Element>, ParseError> {
        let mut elements = Vec::new();

        while !self.check(close) {
            if self.match_token(&Token::Ellipsis(self.current_location())) {
                elements.push(Element::Spread(self.parse_assignment()?));
            } else {
                elements.push(Element::Item(self.parse_assignment()?));
            }

            if !self.match_token(&Token::Comma(self.current_location())) {
                break;
            }
        }

        Ok(elements)
    }

    /// Parse primary (literals, variables, parenthesized expressions)
    fn parse_primary(&mut self) -> Result<AstNode, ParseError> {
        let loc = self.current_location();

        let literal = match self.peek() {
            Token::Number(n, _) => Some(AstNode::NumberLiteral(*n, loc)),
            Token::Str(s, _) => Some(AstNode::StringLiteral(s.clone(), loc)),
            Token::Ident(name, _) => Some(AstNode::Variable(name.clone(), loc)),
            Token::True(_) => Some(AstNode::BoolLiteral(true, loc)),
            Token::False(_) => Some(AstNode::BoolLiteral(false, loc)),
            Token::Null(_) => Some(AstNode::Null { location: loc }),
            Token::Undefined(_) => Some(AstNode::Undefined { location: loc }),
            _ => None,
        };
        if let Some(node) = literal {
            self.advance();
            return Ok(node);
        }

        if let Token::Template(chunks, _) = self.peek() {
            let chunks = chunks.clone();
            self.advance();
            return self.parse_template(chunks, loc);
        }

        // Array literal
        if self.match_token(&Token::LBracket(loc)) {
            let elements = self.parse_element_list(&Token::RBracket(loc))?;
            self.expect_token(
                &Token::RBracket(self.current_location()),
                "Expected ']' after array elements",
            )?;
            return Ok(AstNode::ArrayLiteral {
                elements,
                location: loc,
            });
        }

        // Function expression
        if self.match_token(&Token::Function(loc)) {
            let name = if let Token::Ident(name, _) = self.peek() {
                let name = name.clone();
                self.advance();
                Some(name)
            } else {
                None
            };
            let def = self.parse_function_rest(name, loc)?;
            return Ok(AstNode::Function { def, location: loc });
        }

        // `new Error("...")` evaluates like a plain call
        if self.match_token(&Token::New(loc)) {
            let mut callee = self.parse_primary()?;
            while self.check(&Token::Dot(loc)) {
                callee = self.parse_member_suffix(callee)?;
            }
            let args = if self.match_token(&Token::LParen(loc)) {
                let args = self.parse_element_list(&Token::RParen(loc))?;
                self.expect_rparen("after constructor arguments")?;
                args
            } else {
                Vec::new()
            };
            return Ok(AstNode::Call {
                callee: Box::new(callee),
                args,
                location: loc,
            });
        }

        // Parenthesized expression
        if self.match_token(&Token::LParen(loc)) {
            let expr = self.parse_expression()?;
            self.expect_rparen("after expression")?;
            return Ok(expr);
        }

        Err(ParseError {
            message: format!("Unexpected token: {}", self.peek()),
            location: loc,
        })
    }

    /// Parse the interpolations of a lexed template literal
    fn parse_template(
        &mut self,
        chunks: Vec<TemplateChunk>,
        loc: SourceLocation,
    ) -> Result<AstNode, ParseError> {
        let mut parts = Vec::with_capacity(chunks.len());

        for chunk in chunks {
            match chunk {
                TemplateChunk::Text(text) => parts.push(TemplatePart::Text(text)),
                TemplateChunk::Expr(tokens) => {
                    let mut inner = Parser::from_tokens(tokens);
                    inner.depth = self.depth;
                    if inner.is_at_end() {
                        return Err(ParseError {
                            message: "Empty template interpolation".to_string(),
                            location: loc,
                        });
                    }
                    let expr = inner.parse_expression()?;
                    if !inner.is_at_end() {
                        return Err(inner.error(format!(
                            "Expected '}}' after template expression, found {}",
                            inner.peek()
                        )));
                    }
                    parts.push(TemplatePart::Expr(expr));
                }
            }
        }

        Ok(AstNode::TemplateLiteral {
            parts,
            location: loc,
        })
    }
}

/// Targets of compound assignment and `++`/`--`: no destructuring patterns
fn is_simple_target(node: &AstNode) -> bool {
    matches!(
        node,
        AstNode::Variable(..) | AstNode::Member { .. } | AstNode::Index { .. }
    )
}

#[cfg(test)]
mod tests {
    use crate::parser::ast::*;
    use crate::parser::parse::parse;

    fn expr(source: &str) -> AstNode {
        let program = parse(&format!("{source};")).unwrap();
        match program.nodes.into_iter().next() {
            Some(AstNode::ExpressionStatement { expr, .. }) => *expr,
            other => panic!("Expected expression statement, got {other:?}"),
        }
    }

    #[test]
    fn test_destructuring_swap() {
        match expr("[a[i], a[j]] = [a[j], a[i]]") {
            AstNode::Assignment { target, value, .. } => {
                assert!(matches!(*target, AstNode::ArrayLiteral { ref elements, .. } if elements.len() == 2));
                assert!(matches!(*value, AstNode::ArrayLiteral { .. }));
            }
            other => panic!("Expected assignment, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_assignment_target() {
        let err = parse("1 = x;").unwrap_err();
        assert!(err.message.contains("Invalid assignment target"));

        let err = parse("[a, ...b] = c;").unwrap_err();
        assert!(err.message.contains("Invalid assignment target"));
    }

    #[test]
    fn test_arrow_functions() {
        match expr("x => x * 2") {
            AstNode::Function { def, .. } => {
                assert!(def.is_arrow);
                assert_eq!(def.params, vec!["x"]);
                assert!(matches!(def.body, FunctionBody::Expr(_)));
            }
            other => panic!("Expected arrow function, got {other:?}"),
        }

        match expr("(a, b) => { return a - b; }") {
            AstNode::Function { def, .. } => {
                assert_eq!(def.params, vec!["a", "b"]);
                assert!(matches!(def.body, FunctionBody::Block(ref b) if b.len() == 1));
            }
            other => panic!("Expected arrow function, got {other:?}"),
        }
    }

    #[test]
    fn test_parenthesized_expression_is_not_arrow() {
        assert!(matches!(
            expr("(a + b) * c"),
            AstNode::BinaryOp { op: BinOp::Mul, .. }
        ));
        assert!(matches!(expr("(a)"), AstNode::Variable(ref n, _) if n == "a"));
    }

    #[test]
    fn test_spread_and_method_call() {
        match expr("snapshot([...data], [i, j], `i=${i}`)") {
            AstNode::Call { callee, args, .. } => {
                assert!(matches!(*callee, AstNode::Variable(ref n, _) if n == "snapshot"));
                assert_eq!(args.len(), 3);
                match &args[0] {
                    Element::Item(AstNode::ArrayLiteral { elements, .. }) => {
                        assert!(matches!(elements[0], Element::Spread(_)));
                    }
                    other => panic!("Expected array literal, got {other:?}"),
                }
                assert!(matches!(
                    args[2],
                    Element::Item(AstNode::TemplateLiteral { .. })
                ));
            }
            other => panic!("Expected call, got {other:?}"),
        }
    }

    #[test]
    fn test_member_chain() {
        match expr("console.log(data.length)") {
            AstNode::Call { callee, .. } => {
                assert!(matches!(*callee, AstNode::Member { ref property, .. } if property == "log"));
            }
            other => panic!("Expected call, got {other:?}"),
        }
    }

    #[test]
    fn test_logical_precedence() {
        // && binds tighter than ||
        match expr("a || b && c") {
            AstNode::BinaryOp { op: BinOp::Or, right, .. } => {
                assert!(matches!(*right, AstNode::BinaryOp { op: BinOp::And, .. }));
            }
            other => panic!("Expected ||, got {other:?}"),
        }
    }

    #[test]
    fn test_exponent_is_right_associative() {
        match expr("2 ** 3 ** 2") {
            AstNode::BinaryOp { op: BinOp::Pow, right, .. } => {
                assert!(matches!(*right, AstNode::BinaryOp { op: BinOp::Pow, .. }));
            }
            other => panic!("Expected **, got {other:?}"),
        }
    }

    #[test]
    fn test_ternary_and_typeof() {
        assert!(matches!(
            expr("typeof sort === 'function' ? 1 : 0"),
            AstNode::TernaryOp { .. }
        ));
    }

    #[test]
    fn test_new_is_a_call() {
        match expr("new Error(\"boom\")") {
            AstNode::Call { callee, args, .. } => {
                assert!(matches!(*callee, AstNode::Variable(ref n, _) if n == "Error"));
                assert_eq!(args.len(), 1);
            }
            other => panic!("Expected call, got {other:?}"),
        }
    }

    #[test]
    fn test_template_interpolation_errors() {
        let err = parse("let s = `${}`;").unwrap_err();
        assert!(err.message.contains("Empty template interpolation"));

        let err = parse("let s = `${a b}`;").unwrap_err();
        assert!(err.message.contains("after template expression"));
    }

    #[test]
    fn test_postfix_requires_target() {
        let err = parse("5++;").unwrap_err();
        assert!(err.message.contains("postfix"));
    }
}
