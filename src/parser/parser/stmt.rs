use std::rc::Rc;

use crate::{
    lexer::Token,
    parser::{
        types::{
            BinOp, ClassDef, ConditionalAst, ExceptHandler, Expr, FunctionDef, KwargsOperation,
            RaiseKind, Statement, StatementKind,
        },
        Parser, ParserError,
    },
};

impl Parser<'_> {
    pub fn parse_statement(&mut self) -> Result<Statement, ParserError> {
        self.consume_newlines();
        let start_line = self.line_number();
        let stmt = match self.current_token() {
            Token::Del => {
                self.consume(&Token::Del)?;
                let mut targets = vec![self.parse_simple_expr()?];
                while self.consume_optional(&Token::Comma) {
                    targets.push(self.parse_simple_expr()?);
                }
                Ok(StatementKind::Delete(targets))
            }
            Token::Def | Token::AtSign => self.parse_decorated_definition(),
            Token::Async => Err(self.syntax_error("coroutines are not supported")),
            Token::With => Err(self.syntax_error("'with' statements are not supported")),
            Token::Assert => {
                self.consume(&Token::Assert)?;
                let condition = self.parse_simple_expr()?;
                let message = if self.consume_optional(&Token::Comma) {
                    Some(self.parse_simple_expr()?)
                } else {
                    None
                };
                Ok(StatementKind::Assert { condition, message })
            }
            Token::Class => self.parse_class_definition(vec![]),
            Token::Return => {
                self.consume(&Token::Return)?;
                let value = if self.end_of_statement() {
                    None
                } else {
                    Some(self.parse_expr()?)
                };
                Ok(StatementKind::Return(value))
            }
            Token::Pass => {
                self.consume(&Token::Pass)?;
                Ok(StatementKind::Pass)
            }
            Token::Break => {
                self.consume(&Token::Break)?;
                Ok(StatementKind::Break)
            }
            Token::Continue => {
                self.consume(&Token::Continue)?;
                Ok(StatementKind::Continue)
            }
            Token::Nonlocal => {
                self.consume(&Token::Nonlocal)?;
                let identifiers = self.parse_identifiers()?;
                Ok(StatementKind::Nonlocal(identifiers))
            }
            Token::Global => {
                self.consume(&Token::Global)?;
                let identifiers = self.parse_identifiers()?;
                Ok(StatementKind::Global(identifiers))
            }
            Token::If => self.parse_if_else(),
            Token::While => self.parse_while_loop(),
            Token::For => self.parse_for_in_loop(),
            Token::Import => self.parse_regular_import(),
            Token::From => self.parse_selective_import(),
            Token::Try => self.parse_try_except(),
            Token::Raise => self.parse_raise(),
            _ => self.parse_statement_without_starting_keyword(),
        }?;

        Ok(Statement::new(start_line, stmt))
    }

    fn parse_statement_without_starting_keyword(&mut self) -> Result<StatementKind, ParserError> {
        let left = self.parse_expr()?;

        if self.current_token() == &Token::Colon {
            self.consume(&Token::Colon)?;
            if !matches!(
                left,
                Expr::Variable(_) | Expr::MemberAccess { .. } | Expr::IndexAccess { .. }
            ) {
                return Err(self.syntax_error("illegal target for annotation"));
            }
            let annotation = self.parse_simple_expr()?;
            let value = if self.consume_optional(&Token::Assign) {
                Some(self.parse_expr()?)
            } else {
                None
            };
            return Ok(StatementKind::AnnotatedAssignment {
                target: left,
                annotation,
                value,
            });
        }

        if self.current_token() == &Token::Assign {
            let mut targets = vec![left];
            self.consume(&Token::Assign)?;
            let mut value = self.parse_expr()?;
            while self.consume_optional(&Token::Assign) {
                targets.push(value);
                value = self.parse_expr()?;
            }

            if !targets.iter().all(Expr::is_assignable) {
                return Err(self.syntax_error("cannot assign to expression"));
            }
            return Ok(StatementKind::Assignment { targets, value });
        }

        if let Some(operator) = BinOp::from_compound(self.current_token()) {
            self.consume_current();
            if !matches!(
                left,
                Expr::Variable(_) | Expr::MemberAccess { .. } | Expr::IndexAccess { .. }
            ) {
                return Err(self.syntax_error("illegal expression for augmented assignment"));
            }
            let value = self.parse_expr()?;
            return Ok(StatementKind::CompoundAssignment {
                operator,
                target: left,
                value,
            });
        }

        Ok(StatementKind::Expression(left))
    }

    fn parse_decorated_definition(&mut self) -> Result<StatementKind, ParserError> {
        let mut decorators: Vec<Expr> = vec![];

        while self.consume_optional(&Token::AtSign) {
            decorators.push(self.parse_simple_expr()?);

            // Each decorator must be ended by 1 and only 1 newline
            self.consume(&Token::Newline)?;
        }

        match self.current_token() {
            Token::Def => self.parse_function_definition(decorators),
            Token::Class => self.parse_class_definition(decorators),
            _ => Err(self.unexpected()),
        }
    }

    fn parse_function_definition(
        &mut self,
        decorators: Vec<Expr>,
    ) -> Result<StatementKind, ParserError> {
        self.consume(&Token::Def)?;
        let name = self.parse_identifier()?;
        self.consume(&Token::LParen)?;
        let params = self.parse_params(&Token::RParen)?;
        self.consume(&Token::RParen)?;

        let returns = if self.consume_optional(&Token::ReturnTypeArrow) {
            Some(self.parse_simple_expr()?)
        } else {
            None
        };

        self.consume(&Token::Colon)?;
        let body = self.parse_block()?;

        Ok(StatementKind::FunctionDef(Rc::new(FunctionDef {
            name,
            params,
            returns,
            body: Rc::new(body),
            decorators,
        })))
    }

    /// Bases are positional arguments. Keyword arguments such as `metaclass=` are accepted and
    /// ignored.
    fn parse_class_definition(
        &mut self,
        decorators: Vec<Expr>,
    ) -> Result<StatementKind, ParserError> {
        self.consume(&Token::Class)?;
        let name = self.parse_identifier()?;

        let bases = if self.current_token() == &Token::LParen {
            let args = self.parse_function_call_args()?;
            if args
                .kwargs
                .iter()
                .any(|kw| matches!(kw, KwargsOperation::Unpacking(_)))
            {
                return Err(self.syntax_error("invalid class keyword arguments"));
            }
            args.args
        } else {
            vec![]
        };

        self.consume(&Token::Colon)?;
        let body = self.parse_block()?;

        Ok(StatementKind::ClassDef(Rc::new(ClassDef {
            name,
            bases,
            body,
            decorators,
        })))
    }

    fn parse_if_else(&mut self) -> Result<StatementKind, ParserError> {
        self.consume(&Token::If)?;
        let condition = self.parse_simple_expr()?;
        self.consume(&Token::Colon)?;
        let if_part = ConditionalAst {
            condition,
            ast: self.parse_block()?,
        };

        let mut elif_parts = vec![];
        while self.consume_optional(&Token::Elif) {
            let condition = self.parse_simple_expr()?;
            self.consume(&Token::Colon)?;

            // We must use push because these will be evaluated in order
            elif_parts.push(ConditionalAst {
                condition,
                ast: self.parse_block()?,
            });
        }

        let else_part = self.parse_optional_else()?;

        Ok(StatementKind::IfElse {
            if_part,
            elif_parts,
            else_part,
        })
    }

    fn parse_optional_else(&mut self) -> Result<Option<Vec<Statement>>, ParserError> {
        if self.consume_optional(&Token::Else) {
            self.consume(&Token::Colon)?;
            Ok(Some(self.parse_block()?))
        } else {
            Ok(None)
        }
    }

    fn parse_while_loop(&mut self) -> Result<StatementKind, ParserError> {
        self.consume(&Token::While)?;
        let condition = self.parse_simple_expr()?;
        self.consume(&Token::Colon)?;
        let body = self.parse_block()?;
        let else_block = self.parse_optional_else()?;

        Ok(StatementKind::WhileLoop {
            condition,
            body,
            else_block,
        })
    }

    fn parse_for_in_loop(&mut self) -> Result<StatementKind, ParserError> {
        self.consume(&Token::For)?;
        let target = self.parse_target_list()?;
        self.consume(&Token::In)?;
        let iterable = self.parse_expr()?;
        self.consume(&Token::Colon)?;
        let body = self.parse_block()?;
        let else_block = self.parse_optional_else()?;

        Ok(StatementKind::ForInLoop {
            target,
            iterable,
            body,
            else_block,
        })
    }

    fn parse_try_except(&mut self) -> Result<StatementKind, ParserError> {
        self.consume(&Token::Try)?;
        self.consume(&Token::Colon)?;
        let try_block = self.parse_block()?;

        let mut handlers: Vec<ExceptHandler> = vec![];
        while self.consume_optional(&Token::Except) {
            if self.consume_optional(&Token::Colon) {
                let block = self.parse_block()?;
                handlers.push(ExceptHandler::default(block));
            } else {
                let expr = self.parse_expr()?;
                let alias = self.parse_optional_alias()?;
                self.consume(&Token::Colon)?;
                let block = self.parse_block()?;
                handlers.push(ExceptHandler::typed(expr, alias, block));
            }
        }

        if handlers
            .iter()
            .take(handlers.len().saturating_sub(1))
            .any(|h| h.is_default())
        {
            return Err(self.syntax_error("default 'except:' must be last"));
        }

        let else_block = self.parse_optional_else()?;

        let finally_block = if self.consume_optional(&Token::Finally) {
            self.consume(&Token::Colon)?;
            Some(self.parse_block()?)
        } else {
            None
        };

        if handlers.is_empty() && finally_block.is_none() {
            return Err(self.syntax_error("expected 'except' or 'finally' block"));
        }

        Ok(StatementKind::TryExcept {
            try_block,
            handlers,
            else_block,
            finally_block,
        })
    }

    fn parse_raise(&mut self) -> Result<StatementKind, ParserError> {
        self.consume(&Token::Raise)?;

        if self.end_of_statement() {
            return Ok(StatementKind::Raise(RaiseKind::Reraise));
        }

        let exception = self.parse_simple_expr()?;

        if self.consume_optional(&Token::From) {
            let cause = self.parse_simple_expr()?;
            Ok(StatementKind::Raise(RaiseKind::RaiseFrom { exception, cause }))
        } else {
            Ok(StatementKind::Raise(RaiseKind::Raise(exception)))
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        domain::{FromImportPath, ModulePath},
        parser::{test_utils::*, types::*, ParserError},
    };

    #[test]
    fn function_definition() {
        let input = r#"
@decorator
def execute(command: str, retries=3) -> str:
    """Run a command."""
    return f"ran {command}"
"#;
        let ast = parse!(input);
        let StatementKind::FunctionDef(def) = &ast[0].kind else {
            panic!("Expected a function definition");
        };
        assert_eq!(ast[0].line, 2);
        assert_eq!(def.name, ident!("execute"));
        assert_eq!(def.decorators, vec![var!("decorator")]);
        assert_eq!(def.params.args[0].annotation, Some(var!("str")));
        assert_eq!(def.params.args[1].default, Some(Expr::Integer(3)));
        assert_eq!(def.returns, Some(var!("str")));
        assert_eq!(docstring(&def.body), Some("Run a command."));
    }

    #[test]
    fn class_definition() {
        let input = "
class Foo(Base, mixins.Mixin, metaclass=Meta):
    x = 1

    def method(self):
        pass
";
        let ast = parse!(input);
        let StatementKind::ClassDef(def) = &ast[0].kind else {
            panic!("Expected a class definition");
        };
        assert_eq!(def.name, ident!("Foo"));
        assert_eq!(
            def.bases,
            vec![
                var!("Base"),
                Expr::MemberAccess {
                    object: Box::new(var!("mixins")),
                    field: ident!("Mixin"),
                }
            ]
        );
        assert_eq!(def.body.len(), 2);
        assert_eq!(def.body[1].line, 5);
    }

    #[test]
    fn assignments() {
        let ast = parse!("a = b = 1\nx, *y = items\nn: int = 0\ncount += 1\n");
        assert_eq!(
            ast[0].kind,
            StatementKind::Assignment {
                targets: vec![var!("a"), var!("b")],
                value: Expr::Integer(1),
            }
        );
        assert_eq!(
            ast[1].kind,
            StatementKind::Assignment {
                targets: vec![Expr::Tuple(vec![
                    var!("x"),
                    Expr::Starred(Box::new(var!("y")))
                ])],
                value: var!("items"),
            }
        );
        assert_eq!(
            ast[2].kind,
            StatementKind::AnnotatedAssignment {
                target: var!("n"),
                annotation: var!("int"),
                value: Some(Expr::Integer(0)),
            }
        );
        assert_eq!(
            ast[3].kind,
            StatementKind::CompoundAssignment {
                operator: BinOp::Add,
                target: var!("count"),
                value: Expr::Integer(1),
            }
        );
    }

    #[test]
    fn invalid_assignment_target() {
        let e = expect_error!("f() = 1");
        assert_eq!(e.message(), "cannot assign to expression");
    }

    #[test]
    fn loops() {
        let input = "
for i, v in enumerate(items):
    if v:
        break
else:
    pass
while x:
    x -= 1
";
        let ast = parse!(input);
        assert_eq!(ast.len(), 2);
        let StatementKind::ForInLoop {
            target, else_block, ..
        } = &ast[0].kind
        else {
            panic!("Expected a for loop");
        };
        assert_eq!(target, &Expr::Tuple(vec![var!("i"), var!("v")]));
        assert_eq!(else_block.as_ref().map(Vec::len), Some(1));
        assert_eq!(ast[1].line, 7);
    }

    #[test]
    fn try_except() {
        let input = "
try:
    risky()
except (KeyError, ValueError) as e:
    handle(e)
except:
    pass
else:
    ok()
finally:
    cleanup()
";
        let ast = parse!(input);
        let StatementKind::TryExcept {
            handlers,
            else_block,
            finally_block,
            ..
        } = &ast[0].kind
        else {
            panic!("Expected a try statement");
        };
        assert_eq!(handlers.len(), 2);
        assert_eq!(handlers[0].alias, Some(ident!("e")));
        assert!(handlers[1].is_default());
        assert!(else_block.is_some());
        assert!(finally_block.is_some());
    }

    #[test]
    fn default_except_must_be_last() {
        let input = "
try:
    pass
except:
    pass
except ValueError:
    pass
";
        let e = expect_error!(input);
        assert_eq!(e.message(), "default 'except:' must be last");
    }

    #[test]
    fn raise_from() {
        let ast = parse!("raise ValueError('bad') from exc");
        assert!(matches!(
            ast[0].kind,
            StatementKind::Raise(RaiseKind::RaiseFrom { .. })
        ));
    }

    #[test]
    fn imports() {
        let ast = parse!("import os.path as p, sys\nfrom ..pkg import (a, b as c,)\nfrom . import *\n");
        assert_eq!(
            ast[0].kind,
            StatementKind::RegularImport(vec![
                RegularImport {
                    module_path: ModulePath::new(vec![ident!("os"), ident!("path")]),
                    alias: Some(ident!("p")),
                },
                RegularImport {
                    module_path: ModulePath::new(vec![ident!("sys")]),
                    alias: None,
                },
            ])
        );
        assert_eq!(
            ast[1].kind,
            StatementKind::SelectiveImport {
                import_path: FromImportPath::Relative(2, ModulePath::new(vec![ident!("pkg")])),
                mode: FromImportMode::List(vec![
                    FromImportItem::direct(ident!("a")),
                    FromImportItem::aliased(ident!("b"), ident!("c")),
                ]),
            }
        );
        assert_eq!(
            ast[2].kind,
            StatementKind::SelectiveImport {
                import_path: FromImportPath::Relative(1, ModulePath::default()),
                mode: FromImportMode::All,
            }
        );
    }

    #[test]
    fn unsupported_statements() {
        let e = expect_error!("with open(p) as f:\n    pass\n");
        assert!(matches!(e, ParserError::SyntaxError { line: 1, .. }));
    }
}
