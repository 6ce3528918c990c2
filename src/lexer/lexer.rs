use tracing::trace;

use crate::{
    domain::{Identifier, Text},
    lexer::{LexerError, LexerResult, Token},
};

const EOF_CHAR: char = '\0';
const TAB_WIDTH: usize = 8;

/// A token together with the line it starts on.
#[derive(Debug, PartialEq, Clone)]
pub struct Lexed {
    pub token: Token,
    pub line: usize,
}

/// Converts Python source text into a token stream, including the `Newline`, `Indent` and
/// `Dedent` tokens which encode block structure. Newlines inside brackets are implicit line
/// joins and produce nothing.
pub struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    at_line_start: bool,
    indent_stack: Vec<usize>,
    delimiters: Vec<(char, usize)>,
    tokens: Vec<Lexed>,
}

impl Lexer {
    pub fn new(text: &Text) -> Self {
        Self::starting_at(text.as_str(), 1)
    }

    fn starting_at(text: &str, line: usize) -> Self {
        Self {
            chars: text.chars().collect(),
            pos: 0,
            line,
            at_line_start: true,
            indent_stack: vec![0],
            delimiters: vec![],
            tokens: vec![],
        }
    }

    /// Lex the full text. The result always ends with `Eof`.
    pub fn tokenize(mut self) -> LexerResult<Vec<Lexed>> {
        loop {
            if self.at_line_start && self.delimiters.is_empty() {
                self.handle_indentation()?;
            }

            let c = self.peek();
            if self.is_eof() {
                break;
            }

            match c {
                ' ' | '\t' | '\x0c' | '\r' => self.advance(),
                '\n' => {
                    self.advance();
                    if self.delimiters.is_empty() {
                        self.emit_newline();
                        self.at_line_start = true;
                    }
                    self.line += 1;
                }
                '#' => self.skip_comment(),
                '\\' if self.peek_at(1) == '\n' => {
                    // Explicit line joining.
                    self.advance();
                    self.advance();
                    self.line += 1;
                }
                '\\' if self.peek_at(1) == '\r' && self.peek_at(2) == '\n' => {
                    self.pos += 3;
                    self.line += 1;
                }
                '"' | '\'' => self.lex_string("")?,
                c if c.is_ascii_digit() => self.lex_number()?,
                '.' if self.peek_at(1).is_ascii_digit() => self.lex_number()?,
                c if c == '_' || c.is_alphabetic() => self.lex_word()?,
                _ => self.lex_operator()?,
            }
        }

        if let Some((ch, line)) = self.delimiters.last() {
            return Err(LexerError::UnmatchedDelimiter { ch: *ch, line: *line });
        }

        self.emit_newline();
        while self.indent_stack.len() > 1 {
            self.indent_stack.pop();
            self.emit(Token::Dedent);
        }
        self.emit(Token::Eof);

        trace!(count = self.tokens.len(), "lexed tokens");
        Ok(self.tokens)
    }

    fn is_eof(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn peek(&self) -> char {
        self.peek_at(0)
    }

    fn peek_at(&self, offset: usize) -> char {
        self.chars.get(self.pos + offset).copied().unwrap_or(EOF_CHAR)
    }

    fn advance(&mut self) {
        self.pos += 1;
    }

    fn emit(&mut self, token: Token) {
        self.tokens.push(Lexed {
            token,
            line: self.line,
        });
    }

    fn emit_at(&mut self, token: Token, line: usize) {
        self.tokens.push(Lexed { token, line });
    }

    /// Emit a logical-line terminator unless the line was empty.
    fn emit_newline(&mut self) {
        match self.tokens.last() {
            None => {}
            Some(Lexed {
                token: Token::Newline,
                ..
            }) => {}
            Some(_) => self.emit(Token::Newline),
        }
    }

    fn skip_comment(&mut self) {
        while !self.is_eof() && self.peek() != '\n' {
            self.advance();
        }
    }

    fn handle_indentation(&mut self) -> LexerResult<()> {
        let mut width = 0;
        loop {
            match self.peek() {
                ' ' => width += 1,
                '\t' => width = (width / TAB_WIDTH + 1) * TAB_WIDTH,
                '\x0c' => width = 0,
                _ => break,
            }
            self.advance();
        }

        // Blank and comment-only lines do not affect indentation.
        if self.is_eof() || matches!(self.peek(), '\n' | '#' | '\r') {
            return Ok(());
        }
        self.at_line_start = false;

        let current = *self.indent_stack.last().unwrap_or(&0);
        if width > current {
            self.indent_stack.push(width);
            self.emit(Token::Indent);
        } else if width < current {
            while *self.indent_stack.last().unwrap_or(&0) > width {
                self.indent_stack.pop();
                self.emit(Token::Dedent);
            }
            if *self.indent_stack.last().unwrap_or(&0) != width {
                return Err(LexerError::InconsistentDedent { line: self.line });
            }
        }
        Ok(())
    }

    fn lex_word(&mut self) -> LexerResult<()> {
        let start = self.pos;
        while self.peek() == '_' || self.peek().is_alphanumeric() {
            self.advance();
        }
        let word: String = self.chars[start..self.pos].iter().collect();

        if matches!(self.peek(), '"' | '\'') && is_string_prefix(&word) {
            return self.lex_string(&word.to_ascii_lowercase());
        }

        if let Some(keyword) = Token::keyword(&word) {
            self.emit(keyword);
            return Ok(());
        }

        let ident = Identifier::new(word.clone()).ok_or(LexerError::InvalidToken {
            token: word,
            line: self.line,
        })?;
        self.emit(Token::Identifier(ident));
        Ok(())
    }

    fn lex_number(&mut self) -> LexerResult<()> {
        let start = self.pos;
        let line = self.line;

        if self.peek() == '0' && matches!(self.peek_at(1), 'x' | 'X' | 'o' | 'O' | 'b' | 'B') {
            let radix = match self.peek_at(1) {
                'x' | 'X' => 16,
                'o' | 'O' => 8,
                _ => 2,
            };
            self.pos += 2;
            while self.peek().is_ascii_alphanumeric() || self.peek() == '_' {
                self.advance();
            }
            let digits: String = self.chars[start + 2..self.pos]
                .iter()
                .filter(|c| **c != '_')
                .collect();
            let value = i64::from_str_radix(&digits, radix).map_err(|_| self.invalid(start))?;
            self.emit_at(Token::Integer(value), line);
            return Ok(());
        }

        let mut is_float = false;
        self.eat_digits();
        if self.peek() == '.' {
            is_float = true;
            self.advance();
            self.eat_digits();
        }
        if matches!(self.peek(), 'e' | 'E')
            && (self.peek_at(1).is_ascii_digit()
                || (matches!(self.peek_at(1), '+' | '-') && self.peek_at(2).is_ascii_digit()))
        {
            is_float = true;
            self.pos += 2;
            self.eat_digits();
        }

        if self.peek() == '_' || self.peek().is_alphabetic() {
            // e.g. `1j` or `12abc`
            while self.peek() == '_' || self.peek().is_alphanumeric() {
                self.advance();
            }
            return Err(self.invalid(start));
        }

        let literal: String = self.chars[start..self.pos]
            .iter()
            .filter(|c| **c != '_')
            .collect();

        let token = if is_float {
            Token::FloatingPoint(literal.parse().map_err(|_| self.invalid(start))?)
        } else {
            Token::Integer(literal.parse().map_err(|_| self.invalid(start))?)
        };
        self.emit_at(token, line);
        Ok(())
    }

    fn eat_digits(&mut self) {
        while self.peek().is_ascii_digit() || (self.peek() == '_' && self.peek_at(1).is_ascii_digit())
        {
            self.advance();
        }
    }

    fn invalid(&self, start: usize) -> LexerError {
        LexerError::InvalidToken {
            token: self.chars[start..self.pos].iter().collect(),
            line: self.line,
        }
    }

    /// Lex a string literal whose (lowercased) prefix has already been consumed.
    fn lex_string(&mut self, prefix: &str) -> LexerResult<()> {
        let line = self.line;
        let raw = prefix.contains('r');
        let body = self.read_string_body()?;

        if prefix.contains('f') {
            return self.lex_f_string(&body, raw, line);
        }

        let text = if raw { body } else { unescape(&body) };
        let token = if prefix.contains('b') {
            Token::BytesLiteral(text.into_bytes())
        } else {
            Token::StringLiteral(text)
        };
        self.emit_at(token, line);
        Ok(())
    }

    /// Consume a quoted string starting at the opening quote and return the text between the
    /// quotes with escapes left in place.
    fn read_string_body(&mut self) -> LexerResult<String> {
        let start_line = self.line;
        let quote = self.peek();
        let triple = self.peek_at(1) == quote && self.peek_at(2) == quote;
        self.pos += if triple { 3 } else { 1 };

        let mut body = String::new();
        loop {
            if self.is_eof() {
                return Err(LexerError::UnterminatedString { line: start_line });
            }

            let c = self.peek();
            if c == '\\' {
                // Escapes (even in raw strings) keep the next character from closing the string.
                body.push(c);
                self.advance();
                let escaped = self.peek();
                if self.is_eof() {
                    return Err(LexerError::UnterminatedString { line: start_line });
                }
                if escaped == '\n' {
                    self.line += 1;
                }
                body.push(escaped);
                self.advance();
                continue;
            }

            if c == quote {
                if !triple {
                    self.advance();
                    break;
                }
                if self.peek_at(1) == quote && self.peek_at(2) == quote {
                    self.pos += 3;
                    break;
                }
            }

            if c == '\n' {
                if !triple {
                    return Err(LexerError::UnterminatedString { line: start_line });
                }
                self.line += 1;
            }

            body.push(c);
            self.advance();
        }

        Ok(body)
    }

    /// Expand an f-string body into `FStringStart`, literal and expression tokens, `FStringEnd`.
    /// Each replacement field becomes `LBrace <expr tokens> [! conv] [: spec] RBrace`.
    fn lex_f_string(&mut self, body: &str, raw: bool, line: usize) -> LexerResult<()> {
        self.emit_at(Token::FStringStart, line);

        let chars: Vec<char> = body.chars().collect();
        let mut literal = String::new();
        let mut i = 0;

        while i < chars.len() {
            match chars[i] {
                '{' if chars.get(i + 1) == Some(&'{') => {
                    literal.push('{');
                    i += 2;
                }
                '}' if chars.get(i + 1) == Some(&'}') => {
                    literal.push('}');
                    i += 2;
                }
                '}' => {
                    return Err(LexerError::InvalidToken {
                        token: "f-string: single '}' is not allowed".to_string(),
                        line,
                    })
                }
                '{' => {
                    self.flush_f_string_literal(&mut literal, raw, line);
                    i = self.lex_replacement_field(&chars, i + 1, line)?;
                }
                c => {
                    literal.push(c);
                    i += 1;
                }
            }
        }

        self.flush_f_string_literal(&mut literal, raw, line);
        self.emit_at(Token::FStringEnd, line);
        Ok(())
    }

    fn flush_f_string_literal(&mut self, literal: &mut String, raw: bool, line: usize) {
        if literal.is_empty() {
            return;
        }
        let text = if raw {
            std::mem::take(literal)
        } else {
            unescape(&std::mem::take(literal))
        };
        self.emit_at(Token::StringLiteral(text), line);
    }

    /// Lex one `{...}` field starting just after the opening brace. Returns the index just past
    /// the closing brace.
    fn lex_replacement_field(
        &mut self,
        chars: &[char],
        start: usize,
        line: usize,
    ) -> LexerResult<usize> {
        let mut depth = 0usize;
        let mut quote: Option<char> = None;
        let mut expr_end = None;
        let mut conversion = None;
        let mut spec_start = None;
        let mut i = start;

        while i < chars.len() {
            let c = chars[i];
            if let Some(q) = quote {
                if c == q {
                    quote = None;
                }
                i += 1;
                continue;
            }

            match c {
                '\'' | '"' if spec_start.is_none() => quote = Some(c),
                '(' | '[' | '{' if spec_start.is_none() => depth += 1,
                ')' | ']' if spec_start.is_none() => depth = depth.saturating_sub(1),
                '}' if depth > 0 && spec_start.is_none() => depth -= 1,
                '}' => {
                    let expr_end = expr_end.unwrap_or(i);
                    let expr: String = chars[start..expr_end].iter().collect();
                    let spec: Option<String> =
                        spec_start.map(|s| chars[s..i].iter().collect::<String>());
                    self.emit_replacement_field(&expr, conversion, spec, line)?;
                    return Ok(i + 1);
                }
                '!' if depth == 0
                    && spec_start.is_none()
                    && expr_end.is_none()
                    && chars.get(i + 1) != Some(&'=') =>
                {
                    expr_end = Some(i);
                    conversion = chars.get(i + 1).copied();
                    i += 1;
                }
                ':' if depth == 0 && spec_start.is_none() => {
                    expr_end.get_or_insert(i);
                    spec_start = Some(i + 1);
                }
                _ => {}
            }
            i += 1;
        }

        Err(LexerError::UnterminatedString { line })
    }

    fn emit_replacement_field(
        &mut self,
        expr: &str,
        conversion: Option<char>,
        spec: Option<String>,
        line: usize,
    ) -> LexerResult<()> {
        if expr.trim().is_empty() {
            return Err(LexerError::InvalidToken {
                token: "f-string: empty expression not allowed".to_string(),
                line,
            });
        }

        let inner = Lexer::starting_at(expr.trim(), line).tokenize()?;

        self.emit_at(Token::LBrace, line);
        for lexed in inner {
            if !matches!(
                lexed.token,
                Token::Newline | Token::Indent | Token::Dedent | Token::Eof
            ) {
                self.tokens.push(lexed);
            }
        }
        if let Some(conversion) = conversion {
            let ident = Identifier::new(conversion.to_string()).ok_or(LexerError::InvalidToken {
                token: format!("!{conversion}"),
                line,
            })?;
            self.emit_at(Token::Exclamation, line);
            self.emit_at(Token::Identifier(ident), line);
        }
        if let Some(spec) = spec {
            self.emit_at(Token::Colon, line);
            self.emit_at(Token::StringLiteral(spec), line);
        }
        self.emit_at(Token::RBrace, line);
        Ok(())
    }

    fn lex_operator(&mut self) -> LexerResult<()> {
        let c = self.peek();
        let (token, width) = match (c, self.peek_at(1), self.peek_at(2)) {
            ('*', '*', '=') => (Token::ExpoEquals, 3),
            ('/', '/', '=') => (Token::DoubleSlashEquals, 3),
            ('<', '<', '=') => (Token::LeftShiftEquals, 3),
            ('>', '>', '=') => (Token::RightShiftEquals, 3),
            ('.', '.', '.') => (Token::Ellipsis, 3),
            ('*', '*', _) => (Token::DoubleAsterisk, 2),
            ('/', '/', _) => (Token::DoubleSlash, 2),
            ('<', '<', _) => (Token::LeftShift, 2),
            ('>', '>', _) => (Token::RightShift, 2),
            ('=', '=', _) => (Token::Equal, 2),
            ('!', '=', _) => (Token::NotEqual, 2),
            ('<', '=', _) => (Token::LessThanOrEqual, 2),
            ('>', '=', _) => (Token::GreaterThanOrEqual, 2),
            ('-', '>', _) => (Token::ReturnTypeArrow, 2),
            ('+', '=', _) => (Token::PlusEquals, 2),
            ('-', '=', _) => (Token::MinusEquals, 2),
            ('*', '=', _) => (Token::AsteriskEquals, 2),
            ('/', '=', _) => (Token::SlashEquals, 2),
            ('%', '=', _) => (Token::ModEquals, 2),
            ('@', '=', _) => (Token::MatMulEquals, 2),
            ('&', '=', _) => (Token::BitwiseAndEquals, 2),
            ('|', '=', _) => (Token::BitwiseOrEquals, 2),
            ('^', '=', _) => (Token::BitwiseXorEquals, 2),
            (':', '=', _) => (Token::Walrus, 2),
            ('+', _, _) => (Token::Plus, 1),
            ('-', _, _) => (Token::Minus, 1),
            ('*', _, _) => (Token::Asterisk, 1),
            ('/', _, _) => (Token::Slash, 1),
            ('%', _, _) => (Token::Modulo, 1),
            ('@', _, _) => (Token::AtSign, 1),
            ('&', _, _) => (Token::BitwiseAnd, 1),
            ('|', _, _) => (Token::BitwiseOr, 1),
            ('^', _, _) => (Token::BitwiseXor, 1),
            ('~', _, _) => (Token::BitwiseNot, 1),
            ('<', _, _) => (Token::LessThan, 1),
            ('>', _, _) => (Token::GreaterThan, 1),
            ('=', _, _) => (Token::Assign, 1),
            ('!', _, _) => (Token::Exclamation, 1),
            ('(', _, _) => (Token::LParen, 1),
            (')', _, _) => (Token::RParen, 1),
            ('[', _, _) => (Token::LBracket, 1),
            (']', _, _) => (Token::RBracket, 1),
            ('{', _, _) => (Token::LBrace, 1),
            ('}', _, _) => (Token::RBrace, 1),
            (',', _, _) => (Token::Comma, 1),
            (':', _, _) => (Token::Colon, 1),
            (';', _, _) => (Token::Semicolon, 1),
            ('.', _, _) => (Token::Dot, 1),
            _ => {
                return Err(LexerError::UnexpectedCharacter {
                    ch: c,
                    line: self.line,
                })
            }
        };

        if token.is_opening_delimiter() {
            self.delimiters.push((c, self.line));
        } else if token.is_closing_delimiter() {
            let expected = match c {
                ')' => '(',
                ']' => '[',
                _ => '{',
            };
            match self.delimiters.pop() {
                Some((open, _)) if open == expected => {}
                _ => {
                    return Err(LexerError::UnmatchedDelimiter {
                        ch: c,
                        line: self.line,
                    })
                }
            }
        }

        self.pos += width;
        self.emit(token);
        Ok(())
    }
}

fn is_string_prefix(word: &str) -> bool {
    matches!(
        word.to_ascii_lowercase().as_str(),
        "r" | "u" | "b" | "f" | "br" | "rb" | "fr" | "rf"
    )
}

/// Process backslash escapes in a non-raw string body.
fn unescape(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }

        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some('a') => out.push('\x07'),
            Some('b') => out.push('\x08'),
            Some('f') => out.push('\x0c'),
            Some('v') => out.push('\x0b'),
            Some('\\') => out.push('\\'),
            Some('\'') => out.push('\''),
            Some('"') => out.push('"'),
            // Backslash-newline is a line continuation inside the literal.
            Some('\n') => {}
            Some(kind @ ('x' | 'u' | 'U')) => {
                let width = match kind {
                    'x' => 2,
                    'u' => 4,
                    _ => 8,
                };
                let digits: String = (0..width).filter_map(|_| chars.next()).collect();
                match u32::from_str_radix(&digits, 16)
                    .ok()
                    .and_then(char::from_u32)
                {
                    Some(decoded) => out.push(decoded),
                    None => {
                        out.push('\\');
                        out.push(kind);
                        out.push_str(&digits);
                    }
                }
            }
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(input: &str) -> Vec<Token> {
        Lexer::new(&Text::new(input))
            .tokenize()
            .expect("Failed to lex")
            .into_iter()
            .map(|l| l.token)
            .collect()
    }

    fn ident(name: &str) -> Token {
        Token::Identifier(Identifier::new(name).unwrap())
    }

    #[test]
    fn assignment() {
        assert_eq!(
            tokens("a = 10"),
            vec![
                ident("a"),
                Token::Assign,
                Token::Integer(10),
                Token::Newline,
                Token::Eof
            ]
        );
    }

    #[test]
    fn indentation() {
        let input = "
def f(x):
    if x:
        return 1
    return 2
";
        assert_eq!(
            tokens(input),
            vec![
                Token::Def,
                ident("f"),
                Token::LParen,
                ident("x"),
                Token::RParen,
                Token::Colon,
                Token::Newline,
                Token::Indent,
                Token::If,
                ident("x"),
                Token::Colon,
                Token::Newline,
                Token::Indent,
                Token::Return,
                Token::Integer(1),
                Token::Newline,
                Token::Dedent,
                Token::Return,
                Token::Integer(2),
                Token::Newline,
                Token::Dedent,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn implicit_line_joining() {
        let input = "x = (1,\n     2)\n";
        assert_eq!(
            tokens(input),
            vec![
                ident("x"),
                Token::Assign,
                Token::LParen,
                Token::Integer(1),
                Token::Comma,
                Token::Integer(2),
                Token::RParen,
                Token::Newline,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn comments_and_blank_lines() {
        let input = "a = 1  # trailing\n\n    # indented comment\nb = 2\n";
        assert_eq!(
            tokens(input),
            vec![
                ident("a"),
                Token::Assign,
                Token::Integer(1),
                Token::Newline,
                ident("b"),
                Token::Assign,
                Token::Integer(2),
                Token::Newline,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn numbers() {
        assert_eq!(
            tokens("0x1F 0b101 0o17 1_000 2.5 1e3 .5")[..7],
            [
                Token::Integer(31),
                Token::Integer(5),
                Token::Integer(15),
                Token::Integer(1000),
                Token::FloatingPoint(2.5),
                Token::FloatingPoint(1000.0),
                Token::FloatingPoint(0.5),
            ]
        );
    }

    #[test]
    fn strings() {
        assert_eq!(
            tokens(r#"'a\n' "b" r'\d' b'x' """multi
line""""#)[..5],
            [
                Token::StringLiteral("a\n".to_string()),
                Token::StringLiteral("b".to_string()),
                Token::StringLiteral("\\d".to_string()),
                Token::BytesLiteral(b"x".to_vec()),
                Token::StringLiteral("multi\nline".to_string()),
            ]
        );
    }

    #[test]
    fn f_string() {
        assert_eq!(
            tokens(r#"f"ran {command!r:>5} {{x}}""#)[..10],
            [
                Token::FStringStart,
                Token::StringLiteral("ran ".to_string()),
                Token::LBrace,
                ident("command"),
                Token::Exclamation,
                ident("r"),
                Token::Colon,
                Token::StringLiteral(">5".to_string()),
                Token::RBrace,
                Token::StringLiteral(" {x}".to_string()),
            ]
        );
    }

    #[test]
    fn operators() {
        assert_eq!(
            tokens("a **= b -> c != d ... e // f")[..11],
            [
                ident("a"),
                Token::ExpoEquals,
                ident("b"),
                Token::ReturnTypeArrow,
                ident("c"),
                Token::NotEqual,
                ident("d"),
                Token::Ellipsis,
                ident("e"),
                Token::DoubleSlash,
                ident("f"),
            ]
        );
    }

    #[test]
    fn unterminated_string() {
        let result = Lexer::new(&Text::new("x = 'abc\n")).tokenize();
        assert_eq!(result, Err(LexerError::UnterminatedString { line: 1 }));
    }

    #[test]
    fn inconsistent_dedent() {
        let input = "if x:\n        a = 1\n    b = 2\n";
        let result = Lexer::new(&Text::new(input)).tokenize();
        assert_eq!(result, Err(LexerError::InconsistentDedent { line: 3 }));
    }

    #[test]
    fn unmatched_delimiter() {
        let result = Lexer::new(&Text::new("x = (1, 2]\n")).tokenize();
        assert_eq!(
            result,
            Err(LexerError::UnmatchedDelimiter { ch: ']', line: 1 })
        );

        let result = Lexer::new(&Text::new("x = (1, 2\n")).tokenize();
        assert_eq!(
            result,
            Err(LexerError::UnmatchedDelimiter { ch: '(', line: 1 })
        );
    }

    #[test]
    fn line_numbers() {
        let lexed = Lexer::new(&Text::new("a = 1\n\nb = '''x\ny'''\nc = 2\n"))
            .tokenize()
            .unwrap();
        let c = lexed.iter().find(|l| l.token == ident("c")).unwrap();
        assert_eq!(c.line, 5);
    }
}
