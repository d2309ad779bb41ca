//! Lexer (tokenizer) for sort-script source code
//!
//! Converts raw source text into a flat [`Token`] stream consumed by the parser.
//! Template literals are lexed eagerly: every `${ ... }` interpolation is
//! tokenized in place, so the parser never has to re-read source text.

use super::ast::SourceLocation;
use super::parse::MAX_NESTING_DEPTH;
use std::fmt;
use thiserror::Error;

/// One piece of a template literal as produced by the lexer.
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateChunk {
    Text(String),
    /// Tokens of an interpolated expression, terminated by [`Token::Eof`]
    Expr(Vec<Token>),
}

/// All token variants produced by the lexer.
///
/// Every variant carries a [`SourceLocation`] so that parse errors can report
/// an accurate line and column without a separate token→location table.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Literals
    Number(f64, SourceLocation),
    Str(String, SourceLocation),
    Template(Vec<TemplateChunk>, SourceLocation),

    // Identifiers
    Ident(String, SourceLocation),

    // Keywords
    Function(SourceLocation),
    Let(SourceLocation),
    Const(SourceLocation),
    Var(SourceLocation),
    If(SourceLocation),
    Else(SourceLocation),
    While(SourceLocation),
    Do(SourceLocation),
    For(SourceLocation),
    Break(SourceLocation),
    Continue(SourceLocation),
    Return(SourceLocation),
    Throw(SourceLocation),
    New(SourceLocation),
    Typeof(SourceLocation),
    True(SourceLocation),
    False(SourceLocation),
    Null(SourceLocation),
    Undefined(SourceLocation),

    // Arithmetic
    Plus(SourceLocation),     // +
    Minus(SourceLocation),    // -
    Star(SourceLocation),     // *
    StarStar(SourceLocation), // **
    Slash(SourceLocation),    // /
    Percent(SourceLocation),  // %

    // Comparison
    EqEq(SourceLocation),     // ==
    NotEq(SourceLocation),    // !=
    EqEqEq(SourceLocation),   // ===
    NotEqEq(SourceLocation),  // !==
    Lt(SourceLocation),       // <
    Le(SourceLocation),       // <=
    Gt(SourceLocation),       // >
    Ge(SourceLocation),       // >=

    // Logical
    AndAnd(SourceLocation),   // &&
    OrOr(SourceLocation),     // ||
    Nullish(SourceLocation),  // ??
    Bang(SourceLocation),     // !

    // Bitwise
    Amp(SourceLocation),      // &
    Pipe(SourceLocation),     // |
    Caret(SourceLocation),    // ^
    Tilde(SourceLocation),    // ~
    LtLt(SourceLocation),     // <<
    GtGt(SourceLocation),     // >>
    GtGtGt(SourceLocation),   // >>>

    // Assignment
    Eq(SourceLocation),        // =
    PlusEq(SourceLocation),    // +=
    MinusEq(SourceLocation),   // -=
    StarEq(SourceLocation),    // *=
    SlashEq(SourceLocation),   // /=
    PercentEq(SourceLocation), // %=

    // Increment/Decrement
    PlusPlus(SourceLocation),   // ++
    MinusMinus(SourceLocation), // --

    // Member access, spread and arrows
    Dot(SourceLocation),      // .
    Ellipsis(SourceLocation), // ...
    FatArrow(SourceLocation), // =>

    // Ternary
    Question(SourceLocation), // ?
    Colon(SourceLocation),    // :

    // Punctuation
    LParen(SourceLocation),    // (
    RParen(SourceLocation),    // )
    LBrace(SourceLocation),    // {
    RBrace(SourceLocation),    // }
    LBracket(SourceLocation),  // [
    RBracket(SourceLocation),  // ]
    Semicolon(SourceLocation), // ;
    Comma(SourceLocation),     // ,

    // End of file
    Eof(SourceLocation),
}

impl Token {
    /// Returns the source location where this token appears.
    pub fn location(&self) -> SourceLocation {
        match self {
            Token::Number(_, loc)
            | Token::Str(_, loc)
            | Token::Template(_, loc)
            | Token::Ident(_, loc)
            | Token::Function(loc)
            | Token::Let(loc)
            | Token::Const(loc)
            | Token::Var(loc)
            | Token::If(loc)
            | Token::Else(loc)
            | Token::While(loc)
            | Token::Do(loc)
            | Token::For(loc)
            | Token::Break(loc)
            | Token::Continue(loc)
            | Token::Return(loc)
            | Token::Throw(loc)
            | Token::New(loc)
            | Token::Typeof(loc)
            | Token::True(loc)
            | Token::False(loc)
            | Token::Null(loc)
            | Token::Undefined(loc)
            | Token::Plus(loc)
            | Token::Minus(loc)
            | Token::Star(loc)
            | Token::StarStar(loc)
            | Token::Slash(loc)
            | Token::Percent(loc)
            | Token::EqEq(loc)
            | Token::NotEq(loc)
            | Token::EqEqEq(loc)
            | Token::NotEqEq(loc)
            | Token::Lt(loc)
            | Token::Le(loc)
            | Token::Gt(loc)
            | Token::Ge(loc)
            | Token::AndAnd(loc)
            | Token::OrOr(loc)
            | Token::Nullish(loc)
            | Token::Bang(loc)
            | Token::Amp(loc)
            | Token::Pipe(loc)
            | Token::Caret(loc)
            | Token::Tilde(loc)
            | Token::LtLt(loc)
            | Token::GtGt(loc)
            | Token::GtGtGt(loc)
            | Token::Eq(loc)
            | Token::PlusEq(loc)
            | Token::MinusEq(loc)
            | Token::StarEq(loc)
            | Token::SlashEq(loc)
            | Token::PercentEq(loc)
            | Token::PlusPlus(loc)
            | Token::MinusMinus(loc)
            | Token::Dot(loc)
            | Token::Ellipsis(loc)
            | Token::FatArrow(loc)
            | Token::Question(loc)
            | Token::Colon(loc)
            | Token::LParen(loc)
            | Token::RParen(loc)
            | Token::LBrace(loc)
            | Token::RBrace(loc)
            | Token::LBracket(loc)
            | Token::RBracket(loc)
            | Token::Semicolon(loc)
            | Token::Comma(loc)
            | Token::Eof(loc) => *loc,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Number(n, _) => write!(f, "number {}", n),
            Token::Str(s, _) => write!(f, "string \"{}\"", s),
            Token::Template(..) => write!(f, "template literal"),
            Token::Ident(s, _) => write!(f, "identifier '{}'", s),
            Token::Function(_) => write!(f, "'function'"),
            Token::Let(_) => write!(f, "'let'"),
            Token::Const(_) => write!(f, "'const'"),
            Token::Var(_) => write!(f, "'var'"),
            Token::If(_) => write!(f, "'if'"),
            Token::Else(_) => write!(f, "'else'"),
            Token::While(_) => write!(f, "'while'"),
            Token::Do(_) => write!(f, "'do'"),
            Token::For(_) => write!(f, "'for'"),
            Token::Break(_) => write!(f, "'break'"),
            Token::Continue(_) => write!(f, "'continue'"),
            Token::Return(_) => write!(f, "'return'"),
            Token::Throw(_) => write!(f, "'throw'"),
            Token::New(_) => write!(f, "'new'"),
            Token::Typeof(_) => write!(f, "'typeof'"),
            Token::True(_) => write!(f, "'true'"),
            Token::False(_) => write!(f, "'false'"),
            Token::Null(_) => write!(f, "'null'"),
            Token::Undefined(_) => write!(f, "'undefined'"),
            Token::Plus(_) => write!(f, "'+'"),
            Token::Minus(_) => write!(f, "'-'"),
            Token::Star(_) => write!(f, "'*'"),
            Token::StarStar(_) => write!(f, "'**'"),
            Token::Slash(_) => write!(f, "'/'"),
            Token::Percent(_) => write!(f, "'%'"),
            Token::EqEq(_) => write!(f, "'=='"),
            Token::NotEq(_) => write!(f, "'!='"),
            Token::EqEqEq(_) => write!(f, "'==='"),
            Token::NotEqEq(_) => write!(f, "'!=='"),
            Token::Lt(_) => write!(f, "'<'"),
            Token::Le(_) => write!(f, "'<='"),
            Token::Gt(_) => write!(f, "'>'"),
            Token::Ge(_) => write!(f, "'>='"),
            Token::AndAnd(_) => write!(f, "'&&'"),
            Token::OrOr(_) => write!(f, "'||'"),
            Token::Nullish(_) => write!(f, "'??'"),
            Token::Bang(_) => write!(f, "'!'"),
            Token::Amp(_) => write!(f, "'&'"),
            Token::Pipe(_) => write!(f, "'|'"),
            Token::Caret(_) => write!(f, "'^'"),
            Token::Tilde(_) => write!(f, "'~'"),
            Token::LtLt(_) => write!(f, "'<<'"),
            Token::GtGt(_) => write!(f, "'>>'"),
            Token::GtGtGt(_) => write!(f, "'>>>'"),
            Token::Eq(_) => write!(f, "'='"),
            Token::PlusEq(_) => write!(f, "'+='"),
            Token::MinusEq(_) => write!(f, "'-='"),
            Token::StarEq(_) => write!(f, "'*='"),
            Token::SlashEq(_) => write!(f, "'/='"),
            Token::PercentEq(_) => write!(f, "'%='"),
            Token::PlusPlus(_) => write!(f, "'++'"),
            Token::MinusMinus(_) => write!(f, "'--'"),
            Token::Dot(_) => write!(f, "'.'"),
            Token::Ellipsis(_) => write!(f, "'...'"),
            Token::FatArrow(_) => write!(f, "'=>'"),
            Token::Question(_) => write!(f, "'?'"),
            Token::Colon(_) => write!(f, "':'"),
            Token::LParen(_) => write!(f, "'('"),
            Token::RParen(_) => write!(f, "')'"),
            Token::LBrace(_) => write!(f, "'{{'"),
            Token::RBrace(_) => write!(f, "'}}'"),
            Token::LBracket(_) => write!(f, "'['"),
            Token::RBracket(_) => write!(f, "']'"),
            Token::Semicolon(_) => write!(f, "';'"),
            Token::Comma(_) => write!(f, "','"),
            Token::Eof(_) => write!(f, "end of file"),
        }
    }
}

/// Lexer error type
#[derive(Debug, Clone, Error)]
#[error(
    "Lexer error at line {}, column {}: {message}",
    .location.line,
    .location.column
)]
pub struct LexError {
    pub message: String,
    pub location: SourceLocation,
}

/// Lexer for sort-script source code
pub struct Lexer {
    input: Vec<char>,
    position: usize,
    line: usize,
    column: usize,
    /// Template literals currently open
    template_depth: usize,
}

impl Lexer {
    /// Create a new lexer for the given source string.
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
            line: 1,
            column: 1,
            template_depth: 0,
        }
    }

    /// Tokenize the entire input
    pub fn tokenize(&mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();

        loop {
            self.skip_whitespace_and_comments()?;

            if self.is_at_end() {
                tokens.push(Token::Eof(self.current_location()));
                break;
            }

            tokens.push(self.next_token()?);
        }

        Ok(tokens)
    }

    /// Get next token
    fn next_token(&mut self) -> Result<Token, LexError> {
        let loc = self.current_location();
        let ch = self.advance().ok_or_else(|| LexError {
            message: "Unexpected end of file".to_string(),
            location: loc,
        })?;

        match ch {
            // String literals
            '"' | '\'' => self.string_literal(ch, loc),

            // Template literals
            '`' => self.template_literal(loc),

            // Numeric literals
            '0'..='9' => self.number_literal(ch, loc),
            '.' if self.peek().is_some_and(|c| c.is_ascii_digit()) => {
                self.number_literal(ch, loc)
            }

            // Identifiers and keywords
            'a'..='z' | 'A'..='Z' | '_' | '$' => {
                Ok(self.identifier_or_keyword(ch, loc))
            }

            // Operators and punctuation
            '+' => Ok(if self.match_char('+') {
                Token::PlusPlus(loc)
            } else if self.match_char('=') {
                Token::PlusEq(loc)
            } else {
                Token::Plus(loc)
            }),
            '-' => Ok(if self.match_char('-') {
                Token::MinusMinus(loc)
            } else if self.match_char('=') {
                Token::MinusEq(loc)
            } else {
                Token::Minus(loc)
            }),
            '*' => Ok(if self.match_char('*') {
                Token::StarStar(loc)
            } else if self.match_char('=') {
                Token::StarEq(loc)
            } else {
                Token::Star(loc)
            }),
            '/' => Ok(if self.match_char('=') {
                Token::SlashEq(loc)
            } else {
                Token::Slash(loc)
            }),
            '%' => Ok(if self.match_char('=') {
                Token::PercentEq(loc)
            } else {
                Token::Percent(loc)
            }),
            '=' => Ok(if self.match_char('=') {
                if self.match_char('=') {
                    Token::EqEqEq(loc)
                } else {
                    Token::EqEq(loc)
                }
            } else if self.match_char('>') {
                Token::FatArrow(loc)
            } else {
                Token::Eq(loc)
            }),
            '!' => Ok(if self.match_char('=') {
                if self.match_char('=') {
                    Token::NotEqEq(loc)
                } else {
                    Token::NotEq(loc)
                }
            } else {
                Token::Bang(loc)
            }),
            '<' => Ok(if self.match_char('=') {
                Token::Le(loc)
            } else if self.match_char('<') {
                Token::LtLt(loc)
            } else {
                Token::Lt(loc)
            }),
            '>' => Ok(if self.match_char('=') {
                Token::Ge(loc)
            } else if self.match_char('>') {
                if self.match_char('>') {
                    Token::GtGtGt(loc)
                } else {
                    Token::GtGt(loc)
                }
            } else {
                Token::Gt(loc)
            }),
            '&' => Ok(if self.match_char('&') {
                Token::AndAnd(loc)
            } else {
                Token::Amp(loc)
            }),
            '|' => Ok(if self.match_char('|') {
                Token::OrOr(loc)
            } else {
                Token::Pipe(loc)
            }),
            '?' => Ok(if self.match_char('?') {
                Token::Nullish(loc)
            } else {
                Token::Question(loc)
            }),
            '.' => {
                if self.peek() == Some('.') && self.peek_ahead(1) == Some('.')
                {
                    self.advance();
                    self.advance();
                    Ok(Token::Ellipsis(loc))
                } else {
                    Ok(Token::Dot(loc))
                }
            }
            '^' => Ok(Token::Caret(loc)),
            '~' => Ok(Token::Tilde(loc)),
            ':' => Ok(Token::Colon(loc)),
            '(' => Ok(Token::LParen(loc)),
            ')' => Ok(Token::RParen(loc)),
            '{' => Ok(Token::LBrace(loc)),
            '}' => Ok(Token::RBrace(loc)),
            '[' => Ok(Token::LBracket(loc)),
            ']' => Ok(Token::RBracket(loc)),
            ';' => Ok(Token::Semicolon(loc)),
            ',' => Ok(Token::Comma(loc)),

            _ => Err(LexError {
                message: format!("Unexpected character: '{}'", ch),
                location: loc,
            }),
        }
    }

    /// Parse a single- or double-quoted string literal
    fn string_literal(
        &mut self,
        quote: char,
        loc: SourceLocation,
    ) -> Result<Token, LexError> {
        let mut string = String::new();

        while let Some(ch) = self.peek() {
            if ch == quote {
                self.advance(); // consume closing quote
                return Ok(Token::Str(string, loc));
            }
            if ch == '\n' {
                break;
            }

            self.advance();
            if ch == '\\' {
                string.push(self.escape_sequence()?);
            } else {
                string.push(ch);
            }
        }

        Err(LexError {
            message: "Unterminated string literal".to_string(),
            location: loc,
        })
    }

    /// Parse a template literal, tokenizing each `${ ... }` interpolation
    fn template_literal(
        &mut self,
        loc: SourceLocation,
    ) -> Result<Token, LexError> {
        if self.template_depth >= MAX_NESTING_DEPTH {
            return Err(LexError {
                message: format!("Template literals nested deeper than {MAX_NESTING_DEPTH} levels"),
                location: loc,
            });
        }
        self.template_depth += 1;
        let token = self.template_body(loc);
        self.template_depth -= 1;
        token
    }

    fn template_body(&mut self, loc: SourceLocation) -> Result<Token, LexError> {
        let mut chunks = Vec::new();
        let mut text = String::new();

        loop {
            match self.advance() {
                None => {
                    return Err(LexError {
                        message: "Unterminated template literal".to_string(),
                        location: loc,
                    });
                }
                Some('`') => break,
                Some('\\') => text.push(self.escape_sequence()?),
                Some('$') if self.peek() == Some('{') => {
                    self.advance();
                    if !text.is_empty() {
                        chunks.push(TemplateChunk::Text(std::mem::take(
                            &mut text,
                        )));
                    }
                    chunks.push(TemplateChunk::Expr(self.interpolation(loc)?));
                }
                Some(ch) => text.push(ch),
            }
        }

        if !text.is_empty() {
            chunks.push(TemplateChunk::Text(text));
        }
        Ok(Token::Template(chunks, loc))
    }

    /// Tokens of one `${ ... }` body, up to its matching `}`
    fn interpolation(
        &mut self,
        template_loc: SourceLocation,
    ) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        let mut depth = 0usize;

        loop {
            self.skip_whitespace_and_comments()?;
            if self.is_at_end() {
                return Err(LexError {
                    message: "Unterminated template interpolation".to_string(),
                    location: template_loc,
                });
            }

            let token = self.next_token()?;
            match token {
                Token::LBrace(_) => depth += 1,
                Token::RBrace(loc) if depth == 0 => {
                    tokens.push(Token::Eof(loc));
                    return Ok(tokens);
                }
                Token::RBrace(_) => depth -= 1,
                _ => {}
            }
            tokens.push(token);
        }
    }

    /// Decode the character after a backslash
    fn escape_sequence(&mut self) -> Result<char, LexError> {
        let loc = self.current_location();
        let escaped = self.advance().ok_or_else(|| LexError {
            message: "Unexpected end of file in escape sequence".to_string(),
            location: loc,
        })?;

        Ok(match escaped {
            'n' => '\n',
            't' => '\t',
            'r' => '\r',
            '0' => '\0',
            'u' => {
                let mut hex = String::new();
                for _ in 0..4 {
                    match self.advance() {
                        Some(c) if c.is_ascii_hexdigit() => hex.push(c),
                        _ => {
                            return Err(LexError {
                                message: "Invalid unicode escape sequence"
                                    .to_string(),
                                location: loc,
                            });
                        }
                    }
                }
                u32::from_str_radix(&hex, 16)
                    .ok()
                    .and_then(char::from_u32)
                    .ok_or_else(|| LexError {
                        message: format!("Invalid unicode escape: \\u{}", hex),
                        location: loc,
                    })?
            }
            // Any other escaped character stands for itself
            other => other,
        })
    }

    /// Parse numeric literal (decimal, fraction, exponent or `0x` hex)
    fn number_literal(
        &mut self,
        first: char,
        loc: SourceLocation,
    ) -> Result<Token, LexError> {
        if first == '0' && matches!(self.peek(), Some('x') | Some('X')) {
            self.advance();
            let mut hex = String::new();
            while let Some(ch) = self.peek().filter(char::is_ascii_hexdigit) {
                hex.push(ch);
                self.advance();
            }
            let value = u64::from_str_radix(&hex, 16).map_err(|_| LexError {
                message: format!("Invalid hex literal: 0x{}", hex),
                location: loc,
            })?;
            return Ok(Token::Number(value as f64, loc));
        }

        let mut num_str = String::new();
        num_str.push(first);
        let mut seen_dot = first == '.';

        while let Some(ch) = self.peek() {
            if ch.is_ascii_digit() {
                num_str.push(ch);
                self.advance();
            } else if ch == '.'
                && !seen_dot
                && self.peek_ahead(1).is_some_and(|c| c.is_ascii_digit())
            {
                seen_dot = true;
                num_str.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        if matches!(self.peek(), Some('e') | Some('E')) {
            let sign = self.peek_ahead(1);
            let digit_at = if matches!(sign, Some('+') | Some('-')) { 2 } else { 1 };
            if self.peek_ahead(digit_at).is_some_and(|c| c.is_ascii_digit()) {
                for _ in 0..digit_at {
                    num_str.extend(self.advance());
                }
                while let Some(ch) = self.peek().filter(char::is_ascii_digit) {
                    num_str.push(ch);
                    self.advance();
                }
            }
        }

        let value = num_str.parse::<f64>().map_err(|_| LexError {
            message: format!("Invalid number literal: {}", num_str),
            location: loc,
        })?;

        Ok(Token::Number(value, loc))
    }

    /// Parse identifier or keyword
    fn identifier_or_keyword(
        &mut self,
        first_char: char,
        loc: SourceLocation,
    ) -> Token {
        let mut ident = String::new();
        ident.push(first_char);

        while let Some(ch) = self.peek() {
            if ch.is_ascii_alphanumeric() || ch == '_' || ch == '$' {
                ident.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        match ident.as_str() {
            "function" => Token::Function(loc),
            "let" => Token::Let(loc),
            "const" => Token::Const(loc),
            "var" => Token::Var(loc),
            "if" => Token::If(loc),
            "else" => Token::Else(loc),
            "while" => Token::While(loc),
            "do" => Token::Do(loc),
            "for" => Token::For(loc),
            "break" => Token::Break(loc),
            "continue" => Token::Continue(loc),
            "return" => Token::Return(loc),
            "throw" => Token::Throw(loc),
            "new" => Token::New(loc),
            "typeof" => Token::Typeof(loc),
            "true" => Token::True(loc),
            "false" => Token::False(loc),
            "null" => Token::Null(loc),
            "undefined" => Token::Undefined(loc),
            _ => Token::Ident(ident, loc),
        }
    }

    /// Skip whitespace and comments
    fn skip_whitespace_and_comments(&mut self) -> Result<(), LexError> {
        loop {
            match self.peek() {
                Some(ch) if ch.is_whitespace() => {
                    self.advance();
                }
                Some('/') => {
                    if self.peek_ahead(1) == Some('/') {
                        // Single-line comment
                        self.skip_line_comment();
                    } else if self.peek_ahead(1) == Some('*') {
                        // Multi-line comment
                        self.skip_block_comment()?;
                    } else {
                        break;
                    }
                }
                _ => break,
            }
        }
        Ok(())
    }

    /// Skip single-line comment (// ...)
    fn skip_line_comment(&mut self) {
        while let Some(ch) = self.peek() {
            self.advance();
            if ch == '\n' {
                break;
            }
        }
    }

    /// Skip multi-line comment (/* ... */)
    fn skip_block_comment(&mut self) -> Result<(), LexError> {
        let start_loc = self.current_location();
        self.advance(); // skip '/'
        self.advance(); // skip '*'

        while !self.is_at_end() {
            if self.peek() == Some('*') && self.peek_ahead(1) == Some('/') {
                self.advance(); // skip '*'
                self.advance(); // skip '/'
                return Ok(());
            }
            self.advance();
        }

        Err(LexError {
            message: "Unterminated block comment".to_string(),
            location: start_loc,
        })
    }

    /// Consume the next character if it equals `expected`
    fn match_char(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn peek(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_ahead(&self, n: usize) -> Option<char> {
        self.input.get(self.position + n).copied()
    }

    /// Advance to next character
    fn advance(&mut self) -> Option<char> {
        let ch = *self.input.get(self.position)?;
        self.position += 1;

        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }

        Some(ch)
    }

    fn is_at_end(&self) -> bool {
        self.position >= self.input.len()
    }

    fn current_location(&self) -> SourceLocation {
        SourceLocation::new(self.line, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(source: &str) -> Vec<Token> {
        Lexer::new(source).tokenize().unwrap()
    }

    #[test]
    fn test_simple_tokens() {
        let tokens = lex("function sort(data) { return 0; }");

        assert!(matches!(tokens[0], Token::Function(_)));
        assert!(matches!(tokens[1], Token::Ident(ref s, _) if s == "sort"));
        assert!(matches!(tokens[2], Token::LParen(_)));
        assert!(matches!(tokens[3], Token::Ident(ref s, _) if s == "data"));
        assert!(matches!(tokens[4], Token::RParen(_)));
        assert!(matches!(tokens[5], Token::LBrace(_)));
        assert!(matches!(tokens[6], Token::Return(_)));
        assert!(matches!(tokens[7], Token::Number(n, _) if n == 0.0));
        assert!(matches!(tokens[8], Token::Semicolon(_)));
        assert!(matches!(tokens[9], Token::RBrace(_)));
        assert!(matches!(tokens[10], Token::Eof(_)));
    }

    #[test]
    fn test_operators() {
        let tokens = lex("++ -- += === !== => ... ?? ** >>> >>");

        assert!(matches!(tokens[0], Token::PlusPlus(_)));
        assert!(matches!(tokens[1], Token::MinusMinus(_)));
        assert!(matches!(tokens[2], Token::PlusEq(_)));
        assert!(matches!(tokens[3], Token::EqEqEq(_)));
        assert!(matches!(tokens[4], Token::NotEqEq(_)));
        assert!(matches!(tokens[5], Token::FatArrow(_)));
        assert!(matches!(tokens[6], Token::Ellipsis(_)));
        assert!(matches!(tokens[7], Token::Nullish(_)));
        assert!(matches!(tokens[8], Token::StarStar(_)));
        assert!(matches!(tokens[9], Token::GtGtGt(_)));
        assert!(matches!(tokens[10], Token::GtGt(_)));
    }

    #[test]
    fn test_numbers() {
        let tokens = lex("42 3.5 .25 1e3 0xff 7.toFixed");

        assert!(matches!(tokens[0], Token::Number(n, _) if n == 42.0));
        assert!(matches!(tokens[1], Token::Number(n, _) if n == 3.5));
        assert!(matches!(tokens[2], Token::Number(n, _) if n == 0.25));
        assert!(matches!(tokens[3], Token::Number(n, _) if n == 1000.0));
        assert!(matches!(tokens[4], Token::Number(n, _) if n == 255.0));
        assert!(matches!(tokens[5], Token::Number(n, _) if n == 7.0));
        assert!(matches!(tokens[6], Token::Dot(_)));
    }

    #[test]
    fn test_comments() {
        let tokens = lex("let x; // comment\nlet y; /* block\ncomment */ z;");

        assert!(matches!(tokens[0], Token::Let(_)));
        assert!(matches!(tokens[1], Token::Ident(ref s, _) if s == "x"));
        assert!(matches!(tokens[2], Token::Semicolon(_)));
        assert!(matches!(tokens[3], Token::Let(_)));
        assert!(matches!(tokens[4], Token::Ident(ref s, _) if s == "y"));
        assert!(matches!(tokens[5], Token::Semicolon(_)));
        assert!(matches!(tokens[6], Token::Ident(ref s, _) if s == "z"));
        assert_eq!(tokens[6].location(), SourceLocation::new(3, 12));
    }

    #[test]
    fn test_string_literals() {
        let tokens = lex(r#""hello\nworld" 'it\'s'"#);

        match &tokens[0] {
            Token::Str(s, _) => assert_eq!(s, "hello\nworld"),
            other => panic!("Expected string literal, got {other}"),
        }
        match &tokens[1] {
            Token::Str(s, _) => assert_eq!(s, "it's"),
            other => panic!("Expected string literal, got {other}"),
        }
    }

    #[test]
    fn test_template_literal_interpolation() {
        let tokens = lex("`Compare ${a[j]} > ${ {x}.y }!`");

        let Token::Template(chunks, _) = &tokens[0] else {
            panic!("Expected template literal");
        };
        assert_eq!(chunks.len(), 5);
        assert_eq!(chunks[0], TemplateChunk::Text("Compare ".to_string()));
        match &chunks[1] {
            TemplateChunk::Expr(inner) => {
                assert!(matches!(inner[0], Token::Ident(ref s, _) if s == "a"));
                assert!(matches!(inner.last(), Some(Token::Eof(_))));
                assert_eq!(inner.len(), 5);
            }
            other => panic!("Expected interpolation, got {other:?}"),
        }
        assert_eq!(chunks[2], TemplateChunk::Text(" > ".to_string()));
        assert_eq!(chunks[4], TemplateChunk::Text("!".to_string()));
        assert!(matches!(tokens[1], Token::Eof(_)));
    }

    #[test]
    fn test_unterminated_string_reports_location() {
        let err = Lexer::new("let s = 'oops;\n").tokenize().unwrap_err();
        assert_eq!(err.location, SourceLocation::new(1, 9));
        assert!(err.to_string().contains("Unterminated string literal"));
    }

    #[test]
    fn test_unexpected_character() {
        let err = Lexer::new("let a = #;").tokenize().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Lexer error at line 1, column 9: Unexpected character: '#'"
        );
    }
}
