use thiserror::Error;

use crate::lexer::{LexerError, Token};

#[derive(Debug, PartialEq, Clone, Error)]
pub enum ParserError {
    #[error("line {line}: expected token {expected:?}, found {found:?}")]
    ExpectedToken {
        expected: Token,
        found: Token,
        line: usize,
    },
    #[error("line {line}: unexpected token {token:?}")]
    UnexpectedToken { token: Token, line: usize },
    #[error("line {line}: {message}")]
    SyntaxError { message: String, line: usize },
    #[error(transparent)]
    Lexer(#[from] LexerError),
}

impl ParserError {
    pub fn syntax_error(message: impl Into<String>, line: usize) -> Self {
        Self::SyntaxError {
            message: message.into(),
            line,
        }
    }

    pub fn unexpected(token: Token, line: usize) -> Self {
        Self::UnexpectedToken { token, line }
    }

    pub fn line(&self) -> usize {
        match self {
            Self::ExpectedToken { line, .. }
            | Self::UnexpectedToken { line, .. }
            | Self::SyntaxError { line, .. } => *line,
            Self::Lexer(e) => e.line(),
        }
    }

    /// The diagnostic without the line prefix.
    pub fn message(&self) -> String {
        match self {
            Self::ExpectedToken {
                expected, found, ..
            } => format!("expected token {expected:?}, found {found:?}"),
            Self::UnexpectedToken { token, .. } => format!("unexpected token {token:?}"),
            Self::SyntaxError { message, .. } => message.clone(),
            Self::Lexer(e) => e.to_string(),
        }
    }
}
