use crate::lexer::{Lexed, Token};

static EOF: Token = Token::Eof;

/// A cursor over a fully lexed token stream with arbitrary lookahead.
pub struct TokenBuffer<'a> {
    tokens: &'a [Lexed],
    position: usize,
}

impl<'a> TokenBuffer<'a> {
    pub fn new(tokens: &'a [Lexed]) -> Self {
        Self {
            tokens,
            position: 0,
        }
    }

    /// Peek `offset` tokens past the current one. Reads past the end yield `Token::Eof`.
    pub fn peek(&self, offset: usize) -> &Token {
        self.tokens
            .get(self.position + offset)
            .map(|l| &l.token)
            .unwrap_or(&EOF)
    }

    /// The line of the current token, or of the last token once exhausted.
    pub fn line(&self) -> usize {
        self.tokens
            .get(self.position)
            .or_else(|| self.tokens.last())
            .map(|l| l.line)
            .unwrap_or(1)
    }

    /// The most recently consumed token.
    pub fn previous(&self) -> Option<&Token> {
        self.position
            .checked_sub(1)
            .and_then(|i| self.tokens.get(i))
            .map(|l| &l.token)
    }

    pub fn consume(&mut self) {
        if self.position < self.tokens.len() {
            self.position += 1;
        }
    }

    /// Whether the upcoming tokens start with `sequence`.
    pub fn peek_ahead_contains(&self, sequence: &[Token]) -> bool {
        sequence
            .iter()
            .enumerate()
            .all(|(offset, token)| self.peek(offset) == token)
    }
}
