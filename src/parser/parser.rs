use tracing::trace;

use crate::{
    domain::{Identifier, Text},
    lexer::{Lexed, Lexer, Token},
    parser::{types::Ast, ParserError, TokenBuffer},
};

mod block;
mod expr;
mod import;
mod signature;
mod stmt;

/// A recursive-descent parser for the supported subset of the Python grammar.
pub struct Parser<'a> {
    tokens: TokenBuffer<'a>,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [Lexed]) -> Self {
        Parser {
            tokens: TokenBuffer::new(tokens),
        }
    }

    /// Lex and parse a complete source text.
    pub fn parse_text(text: &Text) -> Result<Ast, ParserError> {
        let tokens = Lexer::new(text).tokenize()?;
        Parser::new(&tokens).parse()
    }

    /// Return the full AST. This will consume all the tokens.
    pub fn parse(&mut self) -> Result<Ast, ParserError> {
        self.consume_newlines();

        let stmts = self.parse_statement_list_until(
            |tok| matches!(tok, Token::Eof),
            |tok| matches!(tok, Token::Newline | Token::Semicolon),
        )?;
        self.consume(&Token::Eof)?;

        Ok(stmts)
    }

    pub fn consume_newlines(&mut self) {
        while self.current_token() == &Token::Newline {
            self.tokens.consume();
        }
    }

    pub fn is_finished(&self) -> bool {
        self.current_token() == &Token::Eof
    }

    fn current_token(&self) -> &Token {
        self.tokens.peek(0)
    }

    fn line_number(&self) -> usize {
        self.tokens.line()
    }

    fn end_of_statement(&self) -> bool {
        self.is_finished() || self.is_statement_separator()
    }

    fn is_statement_separator(&self) -> bool {
        matches!(self.current_token(), Token::Newline | Token::Semicolon)
    }

    fn consume_current(&mut self) {
        trace!(token = ?self.current_token(), "consume");
        self.tokens.consume();
    }

    fn consume(&mut self, expected: &Token) -> Result<(), ParserError> {
        let current = self.current_token();
        if current != expected {
            return Err(ParserError::ExpectedToken {
                expected: expected.clone(),
                found: current.clone(),
                line: self.line_number(),
            });
        }

        self.consume_current();
        Ok(())
    }

    fn consume_optional(&mut self, expected: &Token) -> bool {
        if self.current_token() == expected {
            self.consume_current();
            true
        } else {
            false
        }
    }

    fn unexpected(&self) -> ParserError {
        ParserError::unexpected(self.current_token().clone(), self.line_number())
    }

    fn syntax_error(&self, message: impl Into<String>) -> ParserError {
        ParserError::syntax_error(message, self.line_number())
    }

    /// Parse a `Token::Identifier` without any semantic analysis.
    fn parse_identifier(&mut self) -> Result<Identifier, ParserError> {
        match self.current_token().clone() {
            Token::Identifier(ident) => {
                self.consume_current();
                Ok(ident)
            }
            _ => Err(self.syntax_error("invalid identifier")),
        }
    }

    fn parse_identifiers(&mut self) -> Result<Vec<Identifier>, ParserError> {
        let mut identifiers = vec![self.parse_identifier()?];
        while self.consume_optional(&Token::Comma) {
            identifiers.push(self.parse_identifier()?);
        }
        Ok(identifiers)
    }
}
