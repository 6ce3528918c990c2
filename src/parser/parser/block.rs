use crate::{
    lexer::Token,
    parser::{
        types::{ast, Ast},
        Parser, ParserError,
    },
};

impl Parser<'_> {
    pub fn parse_block(&mut self) -> Result<Ast, ParserError> {
        if self.current_token() == &Token::Newline {
            self.consume_current();
            self.parse_indented_block()
        } else {
            self.parse_single_line_block()
        }
    }

    pub fn parse_statement_list_until<F, G>(
        &mut self,
        is_terminator: F,
        is_separator: G,
    ) -> Result<Ast, ParserError>
    where
        F: Fn(&Token) -> bool,
        G: Fn(&Token) -> bool,
    {
        let mut stmts = ast![];

        while !is_terminator(self.current_token()) {
            stmts.push(self.parse_statement()?);

            // Compound statements end on their own `Newline` or `Dedent`.
            let block_ended = matches!(
                self.tokens.previous(),
                Some(Token::Newline | Token::Dedent)
            );
            if !block_ended
                && !is_terminator(self.current_token())
                && !is_separator(self.current_token())
            {
                return Err(self.unexpected());
            }
            while is_separator(self.current_token()) {
                self.consume_current();
            }
        }

        Ok(stmts)
    }

    fn parse_indented_block(&mut self) -> Result<Ast, ParserError> {
        self.consume(&Token::Indent)?;
        self.consume_newlines();

        let stmts = self.parse_statement_list_until(
            |tok| matches!(tok, Token::Dedent | Token::Eof),
            |tok| matches!(tok, Token::Newline | Token::Semicolon),
        )?;
        self.consume(&Token::Dedent)?;

        Ok(stmts)
    }

    /// Support single-line functions, classes, or any blocks.
    ///
    /// Examples:
    /// def _f() : pass
    /// def four(): return 4
    /// class Foo: pass
    /// def a(): pass; pass
    fn parse_single_line_block(&mut self) -> Result<Ast, ParserError> {
        let stmts = self.parse_statement_list_until(
            |tok| matches!(tok, Token::Newline | Token::Eof),
            |tok| matches!(tok, Token::Semicolon),
        )?;
        if !self.is_finished() {
            self.consume(&Token::Newline)?;
        }
        Ok(stmts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::parser::{
        test_utils::*,
        types::{ConditionalAst, Expr, StatementKind},
    };

    #[test]
    fn invalid_identifier() {
        let e = expect_error!("a.if");
        assert_eq!(
            e,
            ParserError::SyntaxError {
                message: "invalid identifier".to_string(),
                line: 1
            }
        );
    }

    #[test]
    fn semicolon() {
        let ast = parse!("a = 10; 4 + a");
        assert_eq!(ast.len(), 2);
        assert!(matches!(ast[0].kind, StatementKind::Assignment { .. }));
        assert!(matches!(
            ast[1].kind,
            StatementKind::Expression(Expr::BinaryOperation { .. })
        ));
    }

    #[test]
    fn single_line_blocks() {
        let input = "
if True: a = 4
else: a = 6
";
        let ast = parse!(input);
        assert_eq!(
            ast[0].kind,
            StatementKind::IfElse {
                if_part: ConditionalAst {
                    condition: Expr::Boolean(true),
                    ast: vec![stmt_assign!(2, var!("a"), Expr::Integer(4))],
                },
                elif_parts: vec![],
                else_part: Some(vec![stmt_assign!(3, var!("a"), Expr::Integer(6))]),
            }
        );
    }

    #[test]
    fn semicolons_in_indented_block() {
        let input = "
if True:
    a = 4; b = 8
";
        let ast = parse!(input);
        let StatementKind::IfElse { if_part, .. } = &ast[0].kind else {
            panic!("Expected an if statement");
        };
        assert_eq!(
            if_part.ast,
            vec![
                stmt_assign!(3, var!("a"), Expr::Integer(4)),
                stmt_assign!(3, var!("b"), Expr::Integer(8)),
            ]
        );
    }

    #[test]
    fn single_line_block_split_lines() {
        let input = "
if True: a = 3
    b = 8
";
        let e = expect_error!(input);
        assert_eq!(e, ParserError::unexpected(Token::Indent, 3));
    }

    #[test]
    fn missing_block() {
        let e = expect_error!("def f():\n");
        assert!(matches!(
            e,
            ParserError::ExpectedToken {
                expected: Token::Indent,
                ..
            }
        ));
    }
}
