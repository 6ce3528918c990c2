use std::collections::HashSet;

use crate::{
    lexer::Token,
    parser::{
        types::{Param, Params},
        Parser, ParserError,
    },
};

impl Parser<'_> {
    /// Parse a parameter list up to (not including) `end_token`, which is `RParen` for `def` and
    /// `Colon` for `lambda`. Annotations are only accepted in the former.
    pub fn parse_params(&mut self, end_token: &Token) -> Result<Params, ParserError> {
        let allow_annotations = end_token != &Token::Colon;
        let mut params = Params::default();
        let mut seen_star = false;
        let mut seen_default = false;

        while self.current_token() != end_token {
            // Positional-only marker.
            // Context: PEP 570 (https://peps.python.org/pep-0570/)
            if self.current_token() == &Token::Slash {
                if seen_star || params.positional_only > 0 || params.args.is_empty() {
                    return Err(self.syntax_error("invalid syntax"));
                }
                self.consume_current();
                params.positional_only = params.args.len();
                if !self.consume_optional(&Token::Comma) {
                    break;
                }
                continue;
            }

            // A bare `*` starts keyword-only parameters.
            // Context: PEP 3102 (https://peps.python.org/pep-3102/)
            if self.current_token() == &Token::Asterisk {
                if seen_star {
                    return Err(self.syntax_error("* argument may appear only once"));
                }
                self.consume_current();
                seen_star = true;
                if matches!(self.current_token(), Token::Identifier(_)) {
                    params.args_var = Some(self.parse_param(allow_annotations, false)?);
                }
                if !self.consume_optional(&Token::Comma) {
                    break;
                }
                continue;
            }

            if self.consume_optional(&Token::DoubleAsterisk) {
                params.kwargs_var = Some(self.parse_param(allow_annotations, false)?);
                self.consume_optional(&Token::Comma);
                break;
            }

            let param = self.parse_param(allow_annotations, true)?;
            if seen_star {
                params.kwonly.push(param);
            } else {
                if param.default.is_some() {
                    seen_default = true;
                } else if seen_default {
                    return Err(
                        self.syntax_error("non-default argument follows default argument")
                    );
                }
                params.args.push(param);
            }

            if !self.consume_optional(&Token::Comma) {
                break;
            }
        }

        let mut seen = HashSet::new();
        let names = params
            .args
            .iter()
            .chain(params.args_var.iter())
            .chain(params.kwonly.iter())
            .chain(params.kwargs_var.iter())
            .map(|p| p.arg.as_str());
        for name in names {
            if !seen.insert(name) {
                return Err(self.syntax_error(format!(
                    "duplicate argument '{name}' in function definition"
                )));
            }
        }

        Ok(params)
    }

    fn parse_param(
        &mut self,
        allow_annotation: bool,
        allow_default: bool,
    ) -> Result<Param, ParserError> {
        let mut param = Param::new(self.parse_identifier()?);

        if allow_annotation && self.consume_optional(&Token::Colon) {
            param.annotation = Some(self.parse_simple_expr()?);
        }

        if allow_default && self.consume_optional(&Token::Assign) {
            param.default = Some(self.parse_simple_expr()?);
        }

        Ok(param)
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::{test_utils::*, types::*};

    fn params_of(input: &str) -> Params {
        let ast = parse!(input);
        match &ast[0].kind {
            StatementKind::FunctionDef(def) => def.params.clone(),
            _ => panic!("Expected a function definition"),
        }
    }

    #[test]
    fn all_parameter_kinds() {
        let params = params_of("def f(a, b=1, /, c: int = 2, *args: str, d, e=3, **kwargs): pass");
        assert_eq!(params.positional_only, 2);
        assert_eq!(
            params
                .args
                .iter()
                .map(|p| p.arg.as_str())
                .collect::<Vec<_>>(),
            vec!["a", "b", "c"]
        );
        assert_eq!(params.args[2].annotation, Some(var!("int")));
        assert_eq!(params.args_var.as_ref().map(|p| p.arg.as_str()), Some("args"));
        assert_eq!(
            params.args_var.and_then(|p| p.annotation),
            Some(var!("str"))
        );
        assert_eq!(params.kwonly.len(), 2);
        assert_eq!(params.kwonly[1].default, Some(Expr::Integer(3)));
        assert_eq!(
            params.kwargs_var.map(|p| p.arg),
            Some(ident!("kwargs"))
        );
    }

    #[test]
    fn bare_star() {
        let params = params_of("def f(a, *, key): pass");
        assert!(params.args_var.is_none());
        assert_eq!(params.kwonly[0].arg, ident!("key"));
    }

    #[test]
    fn subscripted_annotation() {
        let params = params_of("def f(items: list[str], value: Optional[int] = None): pass");
        assert_eq!(
            params.args[0].annotation,
            Some(Expr::IndexAccess {
                object: Box::new(var!("list")),
                index: Box::new(var!("str")),
            })
        );
        assert_eq!(params.args[1].default, Some(Expr::None));
    }

    #[test]
    fn non_default_after_default() {
        let e = expect_error!("def f(a=1, b): pass");
        assert_eq!(e.message(), "non-default argument follows default argument");
    }

    #[test]
    fn duplicate_argument() {
        let e = expect_error!("def f(a, a): pass");
        assert_eq!(
            e.message(),
            "duplicate argument 'a' in function definition"
        );
    }
}
