//! Statement parser for Dex programs
//!
//! Recursive descent with one token of lookahead. Parses statements like:
//! - `x = 1`, `{a, b} = {1, 2}`, `let y = x`
//! - `def add(a, b) do return a + b end`
//! - `if c do ... elif c do ... else ... end`
//! - `while c do ... end`
//!
//! Expression precedence, lowest first: match (`=`, right-associative),
//! `or`, `and`, `not`, relational, additive, multiplicative, unary minus,
//! call/member chaining, primary.

use crate::parser::ast::{BinaryOp, Expression, IfClause, Program, Statement};
use crate::parser::error::{DexError, Result};
use crate::parser::lexer::{Lexer, Span, Token, TokenKind};
use crate::parser::stack::ensure_sufficient_stack;
use std::collections::VecDeque;
use std::rc::Rc;

/// Parses token streams into a `Program`
#[derive(Debug, Default)]
pub struct Parser {
    tokens: VecDeque<Token>,
}

impl Parser {
    pub fn new() -> Self {
        Parser {
            tokens: VecDeque::new(),
        }
    }

    /// Lex `source` and parse it to a complete program
    pub fn produce_ast(&mut self, source: &str) -> Result<Program> {
        self.tokens = Lexer::new(source).tokenize()?.into();

        let mut program = Program::new();
        loop {
            self.skip_separators();
            if !self.not_eof() {
                break;
            }
            program.push(self.parse_statement()?);
        }

        Ok(program)
    }

    // ------------------------------------------------------------------------
    // Token stream helpers
    // ------------------------------------------------------------------------

    fn not_eof(&self) -> bool {
        self.current_kind() != TokenKind::Eof
    }

    fn current_kind(&self) -> TokenKind {
        self.tokens.front().map_or(TokenKind::Eof, |t| t.kind)
    }

    fn current_span(&self) -> Span {
        self.tokens.front().map(|t| t.span).unwrap_or_default()
    }

    /// Kind of the token after the current one
    fn peek_kind(&self) -> TokenKind {
        self.tokens.get(1).map_or(TokenKind::Eof, |t| t.kind)
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.current_kind() == kind
    }

    /// Pop the current token. The trailing `Eof` is never removed.
    fn advance(&mut self) -> Token {
        if self.tokens.len() > 1 {
            if let Some(token) = self.tokens.pop_front() {
                return token;
            }
        }
        self.tokens
            .front()
            .cloned()
            .unwrap_or_else(|| Token::new(TokenKind::Eof, "EndOfFile", Span::default()))
    }

    /// Consume a token of the given kind or fail with `message`
    fn expect(&mut self, kind: TokenKind, message: &str) -> Result<Token> {
        if self.check(kind) {
            return Ok(self.advance());
        }
        Err(self.unexpected(message, kind.to_string()))
    }

    fn unexpected(&self, message: &str, expected: String) -> DexError {
        let found = self
            .tokens
            .front()
            .map_or_else(|| "EndOfFile".to_string(), |t| t.to_string());
        DexError::UnexpectedToken {
            message: message.to_string(),
            found,
            expected,
            span: self.current_span(),
        }
    }

    fn skip_separators(&mut self) {
        while self.check(TokenKind::Semicolon) {
            self.advance();
        }
    }

    // ------------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------------

    /// Parse a single statement
    pub fn parse_statement(&mut self) -> Result<Statement> {
        ensure_sufficient_stack(|| self.parse_statement_inner())
    }

    fn parse_statement_inner(&mut self) -> Result<Statement> {
        match self.current_kind() {
            TokenKind::If => self.parse_if_statement(),
            TokenKind::Def => self.parse_function_declaration(),
            TokenKind::Return => self.parse_return_statement(),
            TokenKind::While => self.parse_while_statement(),
            TokenKind::Break => {
                self.advance();
                Ok(Statement::Break)
            }
            TokenKind::Continue => {
                self.advance();
                Ok(Statement::Continue)
            }
            _ => Ok(Statement::Expression(self.parse_expression()?)),
        }
    }

    /// Parse statements until one of `terminators` (not consumed)
    fn parse_block(&mut self, terminators: &[TokenKind]) -> Result<Vec<Statement>> {
        let mut body = Vec::new();
        loop {
            self.skip_separators();
            if terminators.contains(&self.current_kind()) {
                return Ok(body);
            }
            if !self.not_eof() {
                return Err(self.unexpected("Unexpected end of input inside a block", "End".to_string()));
            }
            body.push(self.parse_statement()?);
        }
    }

    /// Parse: if <cond> do ... [elif <cond> do ...]* [else ...] end
    fn parse_if_statement(&mut self) -> Result<Statement> {
        self.expect(TokenKind::If, "Expected 'if'")?;
        let condition = self.parse_expression()?;
        self.expect(TokenKind::Do, "Expected 'do' after the if condition")?;
        let body = self.parse_block(&[TokenKind::Elif, TokenKind::Else, TokenKind::End])?;

        let mut clauses = vec![IfClause {
            condition: Some(condition),
            body,
            is_else: false,
        }];

        while self.check(TokenKind::Elif) {
            self.advance();
            let condition = self.parse_expression()?;
            self.expect(TokenKind::Do, "Expected 'do' after the elif condition")?;
            let body = self.parse_block(&[TokenKind::Elif, TokenKind::Else, TokenKind::End])?;
            clauses.push(IfClause {
                condition: Some(condition),
                body,
                is_else: false,
            });
        }

        if self.check(TokenKind::Else) {
            self.advance();
            if self.check(TokenKind::Do) {
                self.advance();
            }
            let body = self.parse_block(&[TokenKind::End])?;
            clauses.push(IfClause {
                condition: None,
                body,
                is_else: true,
            });
        }

        self.expect(TokenKind::End, "Expected 'end' to close the if statement")?;
        Ok(Statement::If(clauses))
    }

    /// Parse: while <cond> do ... end
    fn parse_while_statement(&mut self) -> Result<Statement> {
        self.expect(TokenKind::While, "Expected 'while'")?;
        let condition = self.parse_expression()?;
        self.expect(TokenKind::Do, "Expected 'do' after the while condition")?;
        let body = self.parse_block(&[TokenKind::End])?;
        self.expect(TokenKind::End, "Expected 'end' to close the while loop")?;
        Ok(Statement::While { condition, body })
    }

    /// Parse: def <name>(<params>) do ... end
    fn parse_function_declaration(&mut self) -> Result<Statement> {
        self.expect(TokenKind::Def, "Expected 'def'")?;
        let name = self
            .expect(TokenKind::Identifier, "Expected a function name after 'def'")?
            .text;
        self.expect(TokenKind::OpenParen, "Expected '(' after the function name")?;
        let params = self.parse_params(TokenKind::CloseParen)?;
        self.expect(TokenKind::CloseParen, "Expected ')' after the parameter list")?;
        self.expect(TokenKind::Do, "Expected 'do' before the function body")?;
        let body = self.parse_block(&[TokenKind::End])?;
        self.expect(TokenKind::End, "Expected 'end' to close the function body")?;

        Ok(Statement::FunctionDeclaration {
            name,
            params,
            body: Rc::from(body),
        })
    }

    /// Comma-separated identifiers up to `close` (not consumed)
    fn parse_params(&mut self, close: TokenKind) -> Result<Vec<String>> {
        let mut params = Vec::new();
        while !self.check(close) {
            let param = self.expect(TokenKind::Identifier, "Expected a parameter name")?;
            params.push(param.text);
            if self.check(TokenKind::Comma) {
                self.advance();
            } else {
                break;
            }
        }
        Ok(params)
    }

    /// Parse: return [<expr>]
    fn parse_return_statement(&mut self) -> Result<Statement> {
        self.expect(TokenKind::Return, "Expected 'return'")?;
        match self.current_kind() {
            TokenKind::End
            | TokenKind::Elif
            | TokenKind::Else
            | TokenKind::Semicolon
            | TokenKind::Eof => Ok(Statement::Return(None)),
            _ => Ok(Statement::Return(Some(self.parse_expression()?))),
        }
    }

    // ------------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------------

    /// Parse a full expression (entry point for match precedence)
    pub fn parse_expression(&mut self) -> Result<Expression> {
        ensure_sufficient_stack(|| self.parse_match_expression())
    }

    fn parse_match_expression(&mut self) -> Result<Expression> {
        if self.check(TokenKind::Let) {
            return self.parse_let_expression();
        }

        let left = self.parse_or_expression()?;
        if self.check(TokenKind::Match) {
            self.advance();
            let right = self.parse_match_expression()?;
            return Ok(Expression::Match {
                pattern: Box::new(left),
                value: Box::new(right),
            });
        }
        Ok(left)
    }

    /// Parse: let <name> = <expr>
    fn parse_let_expression(&mut self) -> Result<Expression> {
        self.expect(TokenKind::Let, "Expected 'let'")?;
        let name = self
            .expect(TokenKind::Identifier, "Expected identifier after 'let'")?
            .text;
        self.expect(TokenKind::Match, "Expected '=' after the let binding name")?;
        let value = self.parse_match_expression()?;
        Ok(Expression::Let {
            name,
            value: Box::new(value),
        })
    }

    fn parse_or_expression(&mut self) -> Result<Expression> {
        let mut left = self.parse_and_expression()?;
        while self.check(TokenKind::Or) {
            self.advance();
            let right = self.parse_and_expression()?;
            left = Expression::binary(left, BinaryOp::Or, right);
        }
        Ok(left)
    }

    fn parse_and_expression(&mut self) -> Result<Expression> {
        let mut left = self.parse_not_expression()?;
        while self.check(TokenKind::And) {
            self.advance();
            let right = self.parse_not_expression()?;
            left = Expression::binary(left, BinaryOp::And, right);
        }
        Ok(left)
    }

    fn parse_not_expression(&mut self) -> Result<Expression> {
        if self.check(TokenKind::Not) {
            self.advance();
            let operand = ensure_sufficient_stack(|| self.parse_not_expression())?;
            return Ok(Expression::Not(Box::new(operand)));
        }
        self.parse_relational_expression()
    }

    fn parse_relational_expression(&mut self) -> Result<Expression> {
        let mut left = self.parse_additive_expression()?;
        while self.current_kind().is_relational() {
            let token = self.advance();
            let operator = self.operator(&token)?;
            let right = self.parse_additive_expression()?;
            left = Expression::binary(left, operator, right);
        }
        Ok(left)
    }

    fn parse_additive_expression(&mut self) -> Result<Expression> {
        let mut left = self.parse_multiplicative_expression()?;
        while self.is_additive_operator() {
            let token = self.advance();
            let operator = self.operator(&token)?;
            let right = self.parse_multiplicative_expression()?;
            left = Expression::binary(left, operator, right);
        }
        Ok(left)
    }

    fn is_additive_operator(&self) -> bool {
        match self.tokens.front() {
            Some(token) if token.kind == TokenKind::Minus => true,
            Some(token) if token.kind == TokenKind::BinaryOperator => {
                token.text == "+" || token.text == "-"
            }
            _ => false,
        }
    }

    fn parse_multiplicative_expression(&mut self) -> Result<Expression> {
        let mut left = self.parse_unary_expression()?;
        while self.is_multiplicative_operator() {
            let token = self.advance();
            let operator = self.operator(&token)?;
            let right = self.parse_unary_expression()?;
            left = Expression::binary(left, operator, right);
        }
        Ok(left)
    }

    fn is_multiplicative_operator(&self) -> bool {
        self.tokens.front().is_some_and(|token| {
            token.kind == TokenKind::BinaryOperator
                && matches!(token.text.as_str(), "*" | "/" | "%")
        })
    }

    fn operator(&self, token: &Token) -> Result<BinaryOp> {
        BinaryOp::from_symbol(&token.text)
            .ok_or_else(|| DexError::parse(format!("Unknown operator '{}'", token.text), token.span))
    }

    /// Unary minus: folds into numeric literals, otherwise `0 - operand`
    fn parse_unary_expression(&mut self) -> Result<Expression> {
        if self.check(TokenKind::Minus) {
            self.advance();
            let operand = ensure_sufficient_stack(|| self.parse_unary_expression())?;
            return Ok(match operand {
                Expression::NumericLiteral(n) => Expression::NumericLiteral(-n),
                other => Expression::binary(
                    Expression::NumericLiteral(0.0),
                    BinaryOp::Subtract,
                    other,
                ),
            });
        }
        self.parse_call_member_expression()
    }

    /// Left-associative chain of calls, `.name` and `[expr]`
    fn parse_call_member_expression(&mut self) -> Result<Expression> {
        let mut expr = self.parse_primary_expression()?;

        loop {
            match self.current_kind() {
                TokenKind::OpenParen => {
                    let args = self.parse_arguments()?;
                    expr = Expression::call(expr, args);
                }
                TokenKind::Dot => {
                    self.advance();
                    let property = self
                        .expect(TokenKind::Identifier, "Expected a member name after '.'")?
                        .text;
                    expr = Expression::Member {
                        object: Box::new(expr),
                        property: Box::new(Expression::Identifier(property)),
                        computed: false,
                    };
                }
                TokenKind::OpenBracket => {
                    self.advance();
                    let property = self.parse_expression()?;
                    self.expect(TokenKind::CloseBracket, "Expected ']' after the computed member")?;
                    expr = Expression::Member {
                        object: Box::new(expr),
                        property: Box::new(property),
                        computed: true,
                    };
                }
                _ => return Ok(expr),
            }
        }
    }

    /// Parse: ( [<expr> [, <expr>]*] )
    fn parse_arguments(&mut self) -> Result<Vec<Expression>> {
        self.expect(TokenKind::OpenParen, "Expected '(' to start the argument list")?;
        let args = self.parse_sequence(TokenKind::CloseParen)?;
        self.expect(TokenKind::CloseParen, "Expected ')' after the argument list")?;
        Ok(args)
    }

    /// Comma-separated match expressions up to `close` (not consumed).
    /// A trailing comma is accepted.
    fn parse_sequence(&mut self, close: TokenKind) -> Result<Vec<Expression>> {
        let mut items = Vec::new();
        while !self.check(close) {
            items.push(self.parse_expression()?);
            if self.check(TokenKind::Comma) {
                self.advance();
            } else {
                break;
            }
        }
        Ok(items)
    }

    fn parse_primary_expression(&mut self) -> Result<Expression> {
        match self.current_kind() {
            TokenKind::Identifier => Ok(Expression::Identifier(self.advance().text)),
            TokenKind::Number => {
                let token = self.advance();
                let value = token.text.parse::<f64>().map_err(|_| {
                    DexError::parse(format!("Invalid number '{}'", token.text), token.span)
                })?;
                Ok(Expression::NumericLiteral(value))
            }
            TokenKind::Atom => {
                let token = self.advance();
                Ok(Expression::Atom(token.text.trim_start_matches(':').to_string()))
            }
            TokenKind::String => {
                let token = self.advance();
                parse_string_literal(&token.text, token.span)
            }
            TokenKind::OpenParen => {
                self.advance();
                let value = self.parse_expression()?;
                self.expect(
                    TokenKind::CloseParen,
                    "Unexpected token found inside the parenthesised expression",
                )?;
                Ok(value)
            }
            TokenKind::OpenBrace => {
                self.advance();
                let items = self.parse_sequence(TokenKind::CloseBrace)?;
                self.expect(TokenKind::CloseBrace, "Expected '}' to close the tuple")?;
                Ok(Expression::Tuple(items))
            }
            TokenKind::OpenBracket => {
                self.advance();
                let items = self.parse_sequence(TokenKind::CloseBracket)?;
                self.expect(TokenKind::CloseBracket, "Expected ']' to close the list")?;
                Ok(Expression::List(items))
            }
            TokenKind::MapOpen => self.parse_map_literal(),
            TokenKind::Fn => self.parse_anonymous_fn(),
            _ => Err(self.unexpected(
                "Unexpected token found during parsing",
                "an expression".to_string(),
            )),
        }
    }

    /// Parse: %{ <key> => <value>, <name>: <value> }
    fn parse_map_literal(&mut self) -> Result<Expression> {
        self.expect(TokenKind::MapOpen, "Expected '%{'")?;
        let mut entries = Vec::new();

        while !self.check(TokenKind::CloseBrace) {
            let key = if self.check(TokenKind::Identifier) && self.peek_kind() == TokenKind::Colon {
                let name = self.advance().text;
                self.advance();
                Expression::Atom(name)
            } else {
                let key = self.parse_expression()?;
                self.expect(TokenKind::FatArrow, "Expected '=>' after the map key")?;
                key
            };
            let value = self.parse_expression()?;
            entries.push((key, value));

            if self.check(TokenKind::Comma) {
                self.advance();
            } else {
                break;
            }
        }

        self.expect(TokenKind::CloseBrace, "Expected '}' to close the map")?;
        Ok(Expression::Map(entries))
    }

    /// Parse: fn (<params>) -> <expr> end   (parentheses optional)
    fn parse_anonymous_fn(&mut self) -> Result<Expression> {
        self.expect(TokenKind::Fn, "Expected 'fn'")?;

        let params = if self.check(TokenKind::OpenParen) {
            self.advance();
            let params = self.parse_params(TokenKind::CloseParen)?;
            self.expect(TokenKind::CloseParen, "Expected ')' after the parameter list")?;
            params
        } else {
            self.parse_params(TokenKind::Arrow)?
        };

        self.expect(TokenKind::Arrow, "Expected '->' after the parameters")?;
        let body = self.parse_expression()?;
        self.expect(TokenKind::End, "Expected 'end' to close the anonymous function")?;

        Ok(Expression::AnonymousFn {
            params,
            body: Rc::new(body),
        })
    }
}

// ============================================================================
// String literals and interpolation
// ============================================================================

/// Build a string literal from the lexer's raw body, parsing every
/// `#{...}` marker as an independent source snippet.
fn parse_string_literal(body: &str, span: Span) -> Result<Expression> {
    let mut fragments = Vec::new();
    let mut expressions = Vec::new();

    for (marker, inner) in find_interpolations(body, span)? {
        let source = unescape(&inner);
        let program = Parser::new().produce_ast(&source)?;
        let expression = match program.body.as_slice() {
            [Statement::Expression(expr)] => expr.clone(),
            _ => {
                return Err(DexError::parse(
                    format!("Interpolation '{}' must contain a single expression", marker),
                    span,
                ))
            }
        };
        fragments.push(unescape(&marker));
        expressions.push(expression);
    }

    Ok(Expression::StringLiteral {
        raw: unescape(body),
        fragments,
        expressions,
    })
}

/// Locate `#{...}` markers, returning (full marker, inner source) pairs.
/// Braces nest, so `#{ {1, 2} }` is one marker.
fn find_interpolations(body: &str, span: Span) -> Result<Vec<(String, String)>> {
    let chars: Vec<char> = body.chars().collect();
    let mut found = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        if chars[i] == '\\' {
            i += 2;
            continue;
        }
        if chars[i] == '#' && chars.get(i + 1) == Some(&'{') {
            let start = i;
            let mut depth = 0usize;
            let mut j = i + 1;
            let mut end = None;
            while j < chars.len() {
                match chars[j] {
                    '{' => depth += 1,
                    '}' => {
                        depth -= 1;
                        if depth == 0 {
                            end = Some(j);
                            break;
                        }
                    }
                    _ => {}
                }
                j += 1;
            }
            let end = end.ok_or_else(|| {
                DexError::parse("Unterminated interpolation '#{' in string literal", span)
            })?;
            let marker: String = chars[start..=end].iter().collect();
            let inner: String = chars[start + 2..end].iter().collect();
            found.push((marker, inner));
            i = end + 1;
        } else {
            i += 1;
        }
    }

    Ok(found)
}

/// Decode backslash escapes. Unknown escapes are kept verbatim.
fn unescape(raw: &str) -> String {
    let mut result = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            result.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => result.push('\n'),
            Some('t') => result.push('\t'),
            Some('r') => result.push('\r'),
            Some('"') => result.push('"'),
            Some('\\') => result.push('\\'),
            Some(other) => {
                result.push('\\');
                result.push(other);
            }
            None => result.push('\\'),
        }
    }
    result
}

/// Parse source text into a program
pub fn produce_ast(source: &str) -> Result<Program> {
    Parser::new().produce_ast(source)
}

/// Parse source text that must hold exactly one expression
pub fn parse_expression(source: &str) -> Result<Expression> {
    let program = produce_ast(source)?;
    match program.body.as_slice() {
        [Statement::Expression(expr)] => Ok(expr.clone()),
        _ => Err(DexError::parse(
            "Expected a single expression",
            Span::default(),
        )),
    }
}
