use thiserror::Error;

#[derive(Debug, PartialEq, Clone, Error)]
pub enum LexerError {
    #[error("line {line}: unexpected character: {ch:?}")]
    UnexpectedCharacter { ch: char, line: usize },
    #[error("line {line}: invalid token: {token}")]
    InvalidToken { token: String, line: usize },
    #[error("line {line}: unterminated string literal")]
    UnterminatedString { line: usize },
    #[error("line {line}: unindent does not match any outer indentation level")]
    InconsistentDedent { line: usize },
    #[error("line {line}: unmatched '{ch}'")]
    UnmatchedDelimiter { ch: char, line: usize },
}

impl LexerError {
    pub fn line(&self) -> usize {
        match self {
            Self::UnexpectedCharacter { line, .. }
            | Self::InvalidToken { line, .. }
            | Self::UnterminatedString { line }
            | Self::InconsistentDedent { line }
            | Self::UnmatchedDelimiter { line, .. } => *line,
        }
    }
}

pub type LexerResult<T> = Result<T, LexerError>;
