use crate::parser::error::{DexError, Result};
use std::fmt;

/// Position of a token in source (1-based line and column)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub line: usize,
    pub column: usize,
}

impl Span {
    pub fn new(line: usize, column: usize) -> Self {
        Span { line, column }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// Kinds of tokens in the Dex language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Literals
    Number,     // 42, 1.5
    String,     // "raw body"
    Atom,       // :ok
    Identifier, // name, List

    // Delimiters
    OpenParen,    // (
    CloseParen,   // )
    OpenBrace,    // {
    CloseBrace,   // }
    OpenBracket,  // [
    CloseBracket, // ]
    MapOpen,      // %{
    Comma,        // ,
    Dot,          // .
    Colon,        // :
    Semicolon,    // ;

    // Operators
    BinaryOperator,     // + - * / %
    Minus,              // unary -
    Arrow,              // ->
    FatArrow,           // =>
    Match,              // =
    Equal,              // ==
    NotEqual,           // !=
    LessThan,           // <
    GreaterThan,        // >
    LessThanOrEqual,    // <=
    GreaterThanOrEqual, // >=

    // Keywords
    If,
    Elif,
    Else,
    Do,
    End,
    And,
    Or,
    Not,
    Def,
    Return,
    While,
    Fn,
    Let,
    Break,
    Continue,

    // End of input
    Eof,
}

impl TokenKind {
    /// Reclassify an identifier as a keyword
    pub fn keyword(ident: &str) -> Option<TokenKind> {
        let kind = match ident {
            "if" => TokenKind::If,
            "elif" => TokenKind::Elif,
            "else" => TokenKind::Else,
            "do" => TokenKind::Do,
            "end" => TokenKind::End,
            "and" => TokenKind::And,
            "or" => TokenKind::Or,
            "not" => TokenKind::Not,
            "def" => TokenKind::Def,
            "return" => TokenKind::Return,
            "while" => TokenKind::While,
            "fn" => TokenKind::Fn,
            "let" => TokenKind::Let,
            "break" => TokenKind::Break,
            "continue" => TokenKind::Continue,
            _ => return None,
        };
        Some(kind)
    }

    pub fn is_relational(self) -> bool {
        matches!(
            self,
            TokenKind::Equal
                | TokenKind::NotEqual
                | TokenKind::LessThan
                | TokenKind::GreaterThan
                | TokenKind::LessThanOrEqual
                | TokenKind::GreaterThanOrEqual
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// A lexed token: its kind plus the exact source text it covers
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, span: Span) -> Self {
        Token {
            kind,
            text: text.into(),
            span,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}('{}')", self.kind, self.text)
    }
}

/// Tokenizes source text into tokens
pub struct Lexer {
    input: Vec<char>,
    position: usize,
    current_char: Option<char>,
    line: usize,
    column: usize,
    /// Kind of the last emitted token, drives unary/binary minus
    previous: Option<TokenKind>,
}

impl Lexer {
    /// Create a new lexer for the given input
    pub fn new(input: &str) -> Self {
        let chars: Vec<char> = input.chars().collect();
        let current_char = chars.first().copied();

        Lexer {
            input: chars,
            position: 0,
            current_char,
            line: 1,
            column: 1,
            previous: None,
        }
    }

    /// Advance to the next character
    fn advance(&mut self) {
        if self.current_char == Some('\n') {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        self.position += 1;
        self.current_char = self.input.get(self.position).copied();
    }

    /// Peek at the next character without advancing
    fn peek(&self) -> Option<char> {
        self.input.get(self.position + 1).copied()
    }

    fn span(&self) -> Span {
        Span::new(self.line, self.column)
    }

    /// Skip whitespace, newlines and `#` comments
    fn skip_trivia(&mut self) {
        while let Some(ch) = self.current_char {
            if ch.is_whitespace() {
                self.advance();
            } else if ch == '#' {
                while let Some(c) = self.current_char {
                    if c == '\n' {
                        break;
                    }
                    self.advance();
                }
            } else {
                break;
            }
        }
    }

    /// Read a digit run with an optional fractional part
    fn read_number(&mut self) -> String {
        let mut result = String::new();
        while let Some(ch) = self.current_char {
            if ch.is_ascii_digit() {
                result.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        if self.current_char == Some('.') && self.peek().is_some_and(|c| c.is_ascii_digit()) {
            result.push('.');
            self.advance();
            while let Some(ch) = self.current_char {
                if ch.is_ascii_digit() {
                    result.push(ch);
                    self.advance();
                } else {
                    break;
                }
            }
        }

        result
    }

    fn read_identifier(&mut self) -> String {
        let mut result = String::new();
        while let Some(ch) = self.current_char {
            if ch.is_alphanumeric() || ch == '_' {
                result.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        result
    }

    /// Read a string body verbatim up to the next unescaped quote.
    /// The opening quote is the current character.
    fn read_string(&mut self, start: Span) -> Result<String> {
        self.advance();
        let mut body = String::new();
        loop {
            match self.current_char {
                None => return Err(DexError::UnterminatedString { span: start }),
                Some('"') => {
                    self.advance();
                    return Ok(body);
                }
                Some('\\') => {
                    body.push('\\');
                    self.advance();
                    match self.current_char {
                        Some(escaped) => {
                            body.push(escaped);
                            self.advance();
                        }
                        None => return Err(DexError::UnterminatedString { span: start }),
                    }
                }
                Some(ch) => {
                    body.push(ch);
                    self.advance();
                }
            }
        }
    }

    /// Consume one character and produce a token of the given kind
    fn single(&mut self, kind: TokenKind, ch: char, span: Span) -> Token {
        self.advance();
        Token::new(kind, ch.to_string(), span)
    }

    /// Consume two characters and produce a token of the given kind
    fn double(&mut self, kind: TokenKind, text: &str, span: Span) -> Token {
        self.advance();
        self.advance();
        Token::new(kind, text, span)
    }

    /// Get the next token
    pub fn next_token(&mut self) -> Result<Token> {
        self.skip_trivia();
        let span = self.span();

        let token = match self.current_char {
            None => Token::new(TokenKind::Eof, "EndOfFile", span),

            Some(ch @ '(') => self.single(TokenKind::OpenParen, ch, span),
            Some(ch @ ')') => self.single(TokenKind::CloseParen, ch, span),
            Some(ch @ '{') => self.single(TokenKind::OpenBrace, ch, span),
            Some(ch @ '}') => self.single(TokenKind::CloseBrace, ch, span),
            Some(ch @ '[') => self.single(TokenKind::OpenBracket, ch, span),
            Some(ch @ ']') => self.single(TokenKind::CloseBracket, ch, span),
            Some(ch @ ',') => self.single(TokenKind::Comma, ch, span),
            Some(ch @ '.') => self.single(TokenKind::Dot, ch, span),
            Some(ch @ ';') => self.single(TokenKind::Semicolon, ch, span),

            Some('-') => {
                if self.peek() == Some('>') {
                    self.double(TokenKind::Arrow, "->", span)
                } else if self.previous == Some(TokenKind::Number) {
                    self.single(TokenKind::BinaryOperator, '-', span)
                } else {
                    self.single(TokenKind::Minus, '-', span)
                }
            }

            Some('%') => {
                if self.peek() == Some('{') {
                    self.double(TokenKind::MapOpen, "%{", span)
                } else {
                    self.single(TokenKind::BinaryOperator, '%', span)
                }
            }

            Some(ch @ ('+' | '*' | '/')) => self.single(TokenKind::BinaryOperator, ch, span),

            Some('=') => match self.peek() {
                Some('=') => self.double(TokenKind::Equal, "==", span),
                Some('>') => self.double(TokenKind::FatArrow, "=>", span),
                _ => self.single(TokenKind::Match, '=', span),
            },

            Some('!') => {
                if self.peek() == Some('=') {
                    self.double(TokenKind::NotEqual, "!=", span)
                } else {
                    return Err(DexError::UnrecognizedCharacter { ch: '!', span });
                }
            }

            Some('<') => {
                if self.peek() == Some('=') {
                    self.double(TokenKind::LessThanOrEqual, "<=", span)
                } else {
                    self.single(TokenKind::LessThan, '<', span)
                }
            }

            Some('>') => {
                if self.peek() == Some('=') {
                    self.double(TokenKind::GreaterThanOrEqual, ">=", span)
                } else {
                    self.single(TokenKind::GreaterThan, '>', span)
                }
            }

            Some(':') => {
                if self.peek().is_some_and(|c| c.is_alphabetic()) {
                    self.advance();
                    let name = self.read_identifier();
                    Token::new(TokenKind::Atom, format!(":{}", name), span)
                } else {
                    self.single(TokenKind::Colon, ':', span)
                }
            }

            Some('"') => {
                let body = self.read_string(span)?;
                Token::new(TokenKind::String, body, span)
            }

            Some(ch) if ch.is_ascii_digit() => {
                let number = self.read_number();
                Token::new(TokenKind::Number, number, span)
            }

            Some(ch) if ch.is_alphabetic() || ch == '_' => {
                let identifier = self.read_identifier();
                let kind = TokenKind::keyword(&identifier).unwrap_or(TokenKind::Identifier);
                Token::new(kind, identifier, span)
            }

            Some(ch) => return Err(DexError::UnrecognizedCharacter { ch, span }),
        };

        self.previous = Some(token.kind);
        Ok(token)
    }

    /// Tokenize the entire input into a vector of tokens ending in `Eof`
    pub fn tokenize(&mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();

        loop {
            let token = self.next_token()?;
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);

            if is_eof {
                break;
            }
        }

        Ok(tokens)
    }
}

/// Tokenize a complete source string
pub fn tokenize(source: &str) -> Result<Vec<Token>> {
    Lexer::new(source).tokenize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn kinds_and_text(source: &str) -> Vec<(TokenKind, String)> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .map(|t| (t.kind, t.text))
            .collect()
    }

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_relational_expression() {
        assert_eq!(
            kinds_and_text("x <= 3"),
            vec![
                (TokenKind::Identifier, "x".to_string()),
                (TokenKind::LessThanOrEqual, "<=".to_string()),
                (TokenKind::Number, "3".to_string()),
                (TokenKind::Eof, "EndOfFile".to_string()),
            ]
        );
    }

    #[test]
    fn test_punctuation() {
        assert_eq!(
            kinds("(){}[],.;"),
            vec![
                TokenKind::OpenParen,
                TokenKind::CloseParen,
                TokenKind::OpenBrace,
                TokenKind::CloseBrace,
                TokenKind::OpenBracket,
                TokenKind::CloseBracket,
                TokenKind::Comma,
                TokenKind::Dot,
                TokenKind::Semicolon,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_multi_character_operators() {
        assert_eq!(
            kinds("== != >= <= => -> = < >"),
            vec![
                TokenKind::Equal,
                TokenKind::NotEqual,
                TokenKind::GreaterThanOrEqual,
                TokenKind::LessThanOrEqual,
                TokenKind::FatArrow,
                TokenKind::Arrow,
                TokenKind::Match,
                TokenKind::LessThan,
                TokenKind::GreaterThan,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_minus_after_number_is_binary() {
        assert_eq!(
            kinds("3 - 1"),
            vec![
                TokenKind::Number,
                TokenKind::BinaryOperator,
                TokenKind::Number,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_minus_elsewhere_is_unary() {
        assert_eq!(kinds("-1")[0], TokenKind::Minus);
        assert_eq!(kinds("x - 1")[1], TokenKind::Minus);
        assert_eq!(kinds("f(-2)")[2], TokenKind::Minus);
    }

    #[test]
    fn test_atoms_and_colons() {
        assert_eq!(
            kinds_and_text(":ok %{name: 1}"),
            vec![
                (TokenKind::Atom, ":ok".to_string()),
                (TokenKind::MapOpen, "%{".to_string()),
                (TokenKind::Identifier, "name".to_string()),
                (TokenKind::Colon, ":".to_string()),
                (TokenKind::Number, "1".to_string()),
                (TokenKind::CloseBrace, "}".to_string()),
                (TokenKind::Eof, "EndOfFile".to_string()),
            ]
        );
    }

    #[test]
    fn test_string_keeps_interpolation_markers() {
        let tokens = tokenize(r#""a#{1 + 1}b""#).unwrap();
        assert_eq!(tokens[0].kind, TokenKind::String);
        assert_eq!(tokens[0].text, "a#{1 + 1}b");
    }

    #[test]
    fn test_string_with_escaped_quote() {
        let tokens = tokenize(r#""say \"hi\"""#).unwrap();
        assert_eq!(tokens[0].text, r#"say \"hi\""#);
        assert_eq!(tokens[1].kind, TokenKind::Eof);
    }

    #[test]
    fn test_keywords() {
        assert_eq!(
            kinds("if elif else do end and or not def return while fn let break continue"),
            vec![
                TokenKind::If,
                TokenKind::Elif,
                TokenKind::Else,
                TokenKind::Do,
                TokenKind::End,
                TokenKind::And,
                TokenKind::Or,
                TokenKind::Not,
                TokenKind::Def,
                TokenKind::Return,
                TokenKind::While,
                TokenKind::Fn,
                TokenKind::Let,
                TokenKind::Break,
                TokenKind::Continue,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_decimal_numbers_and_member_dots() {
        assert_eq!(
            kinds_and_text("1.5 List.at"),
            vec![
                (TokenKind::Number, "1.5".to_string()),
                (TokenKind::Identifier, "List".to_string()),
                (TokenKind::Dot, ".".to_string()),
                (TokenKind::Identifier, "at".to_string()),
                (TokenKind::Eof, "EndOfFile".to_string()),
            ]
        );
    }

    #[test]
    fn test_comments_and_newlines_are_skipped() {
        assert_eq!(
            kinds("x # trailing comment\n  y"),
            vec![TokenKind::Identifier, TokenKind::Identifier, TokenKind::Eof]
        );
    }

    #[test]
    fn test_spans_track_lines() {
        let tokens = tokenize("a\n  b").unwrap();
        assert_eq!(tokens[0].span, Span::new(1, 1));
        assert_eq!(tokens[1].span, Span::new(2, 3));
    }

    #[test]
    fn test_empty_input_is_just_eof() {
        assert_eq!(kinds("   \n\t"), vec![TokenKind::Eof]);
    }

    #[test]
    fn test_invalid_character() {
        let result = tokenize("x @ y");
        assert!(matches!(
            result,
            Err(DexError::UnrecognizedCharacter { ch: '@', .. })
        ));
    }

    #[test]
    fn test_unterminated_string() {
        let result = tokenize("\"never closed");
        assert!(matches!(result, Err(DexError::UnterminatedString { .. })));
    }
}
