use crate::parser::lexer::Span;
use thiserror::Error;

/// Errors raised anywhere in the Dex pipeline.
///
/// The display text always starts with the error category (`NameError`,
/// `MatchError`, ...) so hosts can print it verbatim.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DexError {
    #[error("LexError: unrecognized character '{ch}' at {span}")]
    UnrecognizedCharacter { ch: char, span: Span },

    #[error("LexError: unterminated string literal starting at {span}")]
    UnterminatedString { span: Span },

    #[error("ParseError: {message} at {span}, found {found}, expected {expected}")]
    UnexpectedToken {
        message: String,
        found: String,
        expected: String,
        span: Span,
    },

    #[error("ParseError: {message} at {span}")]
    Parse { message: String, span: Span },

    #[error("NameError: cannot resolve variable '{0}' as it doesn't exist")]
    Name(String),

    #[error("ConstAssignmentError: cannot reassign to '{0}' as it was declared as a constant")]
    ConstAssignment(String),

    #[error("TypeError: {0}")]
    Type(String),

    #[error("ArityError: {callee} expects {expected} argument(s), got {got}")]
    Arity {
        callee: String,
        expected: usize,
        got: usize,
    },

    #[error("MatchError: {0}")]
    Match(String),

    #[error("NotCallable: {0} is not a function")]
    NotCallable(String),

    #[error("IndexError: {0}")]
    Index(String),

    #[error("NameError: module {module} has no function '{member}'")]
    UnknownMember { module: String, member: String },

    #[error("UsageError: {0}")]
    Usage(String),

    #[error("StackOverflow: maximum call depth of {depth} exceeded")]
    StackOverflow { depth: usize },
}

impl DexError {
    pub fn parse(message: impl Into<String>, span: Span) -> Self {
        DexError::Parse {
            message: message.into(),
            span,
        }
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        DexError::Type(message.into())
    }

    pub fn match_error(message: impl Into<String>) -> Self {
        DexError::Match(message.into())
    }

    pub fn index_error(message: impl Into<String>) -> Self {
        DexError::Index(message.into())
    }

    /// Category name as shown to the user
    pub fn category(&self) -> &'static str {
        match self {
            DexError::UnrecognizedCharacter { .. } | DexError::UnterminatedString { .. } => {
                "LexError"
            }
            DexError::UnexpectedToken { .. } | DexError::Parse { .. } => "ParseError",
            DexError::Name(_) | DexError::UnknownMember { .. } => "NameError",
            DexError::ConstAssignment(_) => "ConstAssignmentError",
            DexError::Type(_) => "TypeError",
            DexError::Arity { .. } => "ArityError",
            DexError::Match(_) => "MatchError",
            DexError::NotCallable(_) => "NotCallable",
            DexError::Index(_) => "IndexError",
            DexError::Usage(_) => "UsageError",
            DexError::StackOverflow { .. } => "StackOverflow",
        }
    }

    /// True for errors produced before evaluation started
    pub fn is_syntax_error(&self) -> bool {
        matches!(self.category(), "LexError" | "ParseError")
    }
}

pub type Result<T> = std::result::Result<T, DexError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_starts_with_category() {
        let errors = vec![
            DexError::Name("x".to_string()),
            DexError::ConstAssignment("true".to_string()),
            DexError::match_error("no match"),
            DexError::Arity {
                callee: "add".to_string(),
                expected: 2,
                got: 1,
            },
            DexError::UnrecognizedCharacter {
                ch: '@',
                span: Span::new(1, 3),
            },
        ];

        for error in errors {
            assert!(
                error.to_string().starts_with(error.category()),
                "{} should start with {}",
                error,
                error.category()
            );
        }
    }

    #[test]
    fn test_syntax_errors() {
        assert!(DexError::parse("bad", Span::default()).is_syntax_error());
        assert!(!DexError::type_error("bad").is_syntax_error());
    }
}
