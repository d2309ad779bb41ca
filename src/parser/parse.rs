//! Main parser coordinator
//!
//! This module provides the [`Parser`] struct and core parsing infrastructure,
//! including error types, helper methods, and the main parse entry point.
//!
//! # Parser Architecture
//!
//! The Parser uses a recursive descent approach with the following organization:
//! - This module: Parser struct, helper methods, and coordination
//! - `statements`: declarations and statements (if, while, for, etc.)
//! - `expressions`: expressions with precedence climbing, arrow functions
//!
//! # Implementation
//!
//! Parser methods are split across multiple files using `impl Parser` blocks,
//! allowing each module to extend the Parser with related functionality while
//! maintaining access to the shared parser state.

use crate::parser::ast::*;
use crate::parser::lexer::{LexError, Lexer, Token};
use thiserror::Error;

/// Deepest nesting of expressions and statements the parser accepts
pub const MAX_NESTING_DEPTH: usize = 200;

/// Parser error type
#[derive(Debug, Clone, Error)]
#[error("SyntaxError: {message}")]
pub struct ParseError {
    pub message: String,
    pub location: SourceLocation,
}

impl From<LexError> for ParseError {
    fn from(err: LexError) -> Self {
        ParseError {
            message: err.message,
            location: err.location,
        }
    }
}

/// Parse a complete source text into a [`Program`].
pub fn parse(source: &str) -> Result<Program, ParseError> {
    Parser::new(source)?.parse_program()
}

/// Recursive descent parser for the sort-script language
pub struct Parser {
    pub(crate) tokens: Vec<Token>,
    pub(crate) position: usize,
    /// Number of enclosing loops inside the current function body
    pub(crate) loop_depth: usize,
    /// Current expression/statement nesting, bounded by [`MAX_NESTING_DEPTH`]
    pub(crate) depth: usize,
}

impl Parser {
    pub fn new(source: &str) -> Result<Self, ParseError> {
        let mut lexer = Lexer::new(source);
        let tokens = lexer.tokenize()?;
        Ok(Self::from_tokens(tokens))
    }

    /// Build a parser over an already-lexed token stream ending in `Eof`.
    pub(crate) fn from_tokens(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            position: 0,
            loop_depth: 0,
            depth: 0,
        }
    }

    /// Run `parse` one nesting level deeper
    pub(crate) fn nested<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Result<T, ParseError>,
    ) -> Result<T, ParseError> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(self.error(format!(
                "Nesting exceeds {MAX_NESTING_DEPTH} levels"
            )));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    /// Parse the entire program (top-level statements)
    pub fn parse_program(&mut self) -> Result<Program, ParseError> {
        let mut program = Program::new();

        while !self.is_at_end() {
            let stmt = self.parse_statement()?;
            program.nodes.push(stmt);
        }

        Ok(program)
    }

    // ===== Helper methods =====

    pub(crate) fn match_token(&mut self, token: &Token) -> bool {
        if self.check(token) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn check(&self, token: &Token) -> bool {
        std::mem::discriminant(self.peek()) == std::mem::discriminant(token)
    }

    pub(crate) fn check_ahead(&self, n: usize, token: &Token) -> bool {
        self.peek_ahead(n).is_some_and(|t| {
            std::mem::discriminant(t) == std::mem::discriminant(token)
        })
    }

    pub(crate) fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.position += 1;
        }
        self.previous()
    }

    pub(crate) fn is_at_end(&self) -> bool {
        matches!(self.peek(), Token::Eof(_))
    }

    pub(crate) fn peek(&self) -> &Token {
        // The stream always ends with Eof and `advance` never moves past it
        &self.tokens[self.position.min(self.tokens.len() - 1)]
    }

    pub(crate) fn peek_ahead(&self, n: usize) -> Option<&Token> {
        self.tokens.get(self.position + n)
    }

    pub(crate) fn previous(&self) -> &Token {
        &self.tokens[self.position.saturating_sub(1)]
    }

    pub(crate) fn previous_location(&self) -> SourceLocation {
        self.previous().location()
    }

    pub(crate) fn current_location(&self) -> SourceLocation {
        self.peek().location()
    }

    pub(crate) fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError {
            message: message.into(),
            location: self.current_location(),
        }
    }

    pub(crate) fn expect_token(
        &mut self,
        token: &Token,
        message: &str,
    ) -> Result<(), ParseError> {
        if self.check(token) {
            self.advance();
            Ok(())
        } else {
            Err(self.error(format!("{}, found {}", message, self.peek())))
        }
    }

    pub(crate) fn expect_lparen(
        &mut self,
        ctx: &str,
    ) -> Result<(), ParseError> {
        self.expect_token(
            &Token::LParen(self.current_location()),
            &format!("Expected '(' {ctx}"),
        )
    }

    pub(crate) fn expect_rparen(
        &mut self,
        ctx: &str,
    ) -> Result<(), ParseError> {
        self.expect_token(
            &Token::RParen(self.current_location()),
            &format!("Expected ')' {ctx}"),
        )
    }

    pub(crate) fn expect_lbrace(
        &mut self,
        ctx: &str,
    ) -> Result<(), ParseError> {
        self.expect_token(
            &Token::LBrace(self.current_location()),
            &format!("Expected '{{' {ctx}"),
        )
    }

    pub(crate) fn expect_rbrace(
        &mut self,
        ctx: &str,
    ) -> Result<(), ParseError> {
        self.expect_token(
            &Token::RBrace(self.current_location()),
            &format!("Expected '}}' {ctx}"),
        )
    }

    pub(crate) fn expect_semicolon(
        &mut self,
        ctx: &str,
    ) -> Result<(), ParseError> {
        self.expect_token(
            &Token::Semicolon(self.current_location()),
            &format!("Expected ';' {ctx}"),
        )
    }

    pub(crate) fn expect_identifier(&mut self) -> Result<String, ParseError> {
        if let Token::Ident(name, _) = self.peek() {
            let name = name.clone();
            self.advance();
            Ok(name)
        } else {
            Err(self.error(format!("Expected identifier, found {}", self.peek())))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_function() {
        let source = "function sort(data, snapshot) { return 0; }";
        let program = parse(source).unwrap();

        assert_eq!(program.nodes.len(), 1);
        match &program.nodes[0] {
            AstNode::FunctionDecl { def, .. } => {
                assert_eq!(def.name.as_deref(), Some("sort"));
                assert_eq!(def.params, vec!["data", "snapshot"]);
                match &def.body {
                    FunctionBody::Block(body) => assert_eq!(body.len(), 1),
                    FunctionBody::Expr(_) => panic!("Expected block body"),
                }
            }
            _ => panic!("Expected function declaration"),
        }
        assert_eq!(program.function_names().collect::<Vec<_>>(), vec!["sort"]);
    }

    #[test]
    fn test_parse_expression_precedence() {
        let program = parse("let x = 1 + 2 * 3;").unwrap();

        let AstNode::VarDecl { declarators, .. } = &program.nodes[0] else {
            panic!("Expected declaration");
        };
        match &declarators[0].init {
            Some(AstNode::BinaryOp {
                op: BinOp::Add,
                right,
                ..
            }) => {
                assert!(matches!(
                    **right,
                    AstNode::BinaryOp { op: BinOp::Mul, .. }
                ));
            }
            other => panic!("Expected addition, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_if_statement() {
        let source = "if (x > 0) y = 1; else { y = 0; }";
        let program = parse(source).unwrap();

        assert_eq!(program.nodes.len(), 1);
        match &program.nodes[0] {
            AstNode::If {
                then_branch,
                else_branch: Some(else_branch),
                ..
            } => {
                assert_eq!(then_branch.len(), 1);
                assert_eq!(else_branch.len(), 1);
            }
            _ => panic!("Expected if statement"),
        }
    }

    #[test]
    fn test_missing_semicolon_is_an_error() {
        let err = parse("let x = 1\nlet y = 2;").unwrap_err();

        assert_eq!(err.location, SourceLocation::new(2, 1));
        assert_eq!(
            err.to_string(),
            "SyntaxError: Expected ';' after variable declaration, found 'let'"
        );
    }

    #[test]
    fn test_deep_nesting_is_rejected() {
        // Same stack budget as the sandbox thread
        let handle = std::thread::Builder::new()
            .stack_size(64 * 1024 * 1024)
            .spawn(|| {
                let depth = 20_000;
                let source = format!("let x = {}1{};", "(".repeat(depth), ")".repeat(depth));
                let err = parse(&source).unwrap_err();
                assert!(err.message.contains("Nesting exceeds"));

                let unary = format!("let y = {}1;", "-".repeat(depth));
                assert!(parse(&unary).is_err());

                let blocks = format!("{}{}", "{".repeat(depth), "}".repeat(depth));
                assert!(parse(&blocks).is_err());

                let templates = format!("let t = {}1{};", "`${".repeat(depth), "}`".repeat(depth));
                assert!(parse(&templates).is_err());

                let nested_ok = format!("let z = {}1{};", "(".repeat(50), ")".repeat(50));
                assert!(parse(&nested_ok).is_ok());
            })
            .unwrap();
        handle.join().unwrap();
    }

    #[test]
    fn test_lex_error_is_reported_as_parse_error() {
        let err = parse("let s = \"unterminated;").unwrap_err();
        assert!(err.message.contains("Unterminated string literal"));
    }
}
