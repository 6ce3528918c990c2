use crate::{
    domain::Text,
    parser::{types::Ast, Parser, ParserError},
};

pub fn parse_text(text: &str) -> Result<Ast, ParserError> {
    Parser::parse_text(&Text::new(text))
}

macro_rules! expect_error {
    ($input:expr) => {
        match $crate::parser::test_utils::parse_text($input) {
            Ok(_) => panic!("Expected a ParserError!"),
            Err(e) => e,
        }
    };
}

macro_rules! parse {
    ($input:expr) => {
        match $crate::parser::test_utils::parse_text($input) {
            Err(e) => panic!("Parser error: {:?}", e),
            Ok(ast) => ast,
        }
    };
}

/// Parse a single expression statement and return the expression.
macro_rules! parse_expr {
    ($input:expr) => {{
        let ast = parse!($input);
        assert_eq!(ast.len(), 1, "Expected a single statement");
        match &ast[0].kind {
            $crate::parser::types::StatementKind::Expression(expr) => expr.clone(),
            other => panic!("Expected an expression, found {:?}", other),
        }
    }};
}

macro_rules! ident {
    ($name:expr) => {
        $crate::domain::Identifier::new($name).expect("Invalid identifier")
    };
}

macro_rules! var {
    ($name:expr) => {
        $crate::parser::types::Expr::Variable(ident!($name))
    };
}

macro_rules! bin_op {
    ($left:expr, $op:ident, $right:expr) => {
        $crate::parser::types::Expr::BinaryOperation {
            left: Box::new($left),
            op: $crate::parser::types::BinOp::$op,
            right: Box::new($right),
        }
    };
}

macro_rules! stmt_assign {
    ($line:expr, $target:expr, $value:expr) => {
        $crate::parser::types::Statement::new(
            $line,
            $crate::parser::types::StatementKind::Assignment {
                targets: vec![$target],
                value: $value,
            },
        )
    };
}

pub(crate) use bin_op;
pub(crate) use expect_error;
pub(crate) use ident;
pub(crate) use parse;
pub(crate) use parse_expr;
pub(crate) use stmt_assign;
pub(crate) use var;
