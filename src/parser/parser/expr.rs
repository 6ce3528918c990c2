use std::rc::Rc;

use tracing::trace;

use crate::{
    lexer::Token,
    parser::{
        types::{
            BinOp, CallArgs, CompareOp, DictOperation, Expr, ExprFormat, FStringPart, ForClause,
            FormatOption, KwargsOperation, LogicalOp, Statement, StatementKind, UnaryOp,
        },
        Parser, ParserError,
    },
};

impl Parser<'_> {
    /// Parse an expression in a context where tuples may be expected. A good option if you're not
    /// sure. By tuples here, we mean those that are not indicated by parentheses (those are
    /// handled by detecting a LParen in `parse_factor`).
    ///
    /// ```python
    /// 4, 5
    /// a = 4, 5
    /// a = 1,
    /// ```
    ///
    /// All other expression parsing is immediately delegated to `parse_simple_expr`.
    pub fn parse_expr(&mut self) -> Result<Expr, ParserError> {
        trace!("parse_expr");
        let left = self.parse_starred_or_simple_expr()?;

        if self.current_token() != &Token::Comma {
            return Ok(left);
        }

        let mut items = vec![left];
        while self.consume_optional(&Token::Comma) {
            // A trailing comma, most often used for a tuple with a single element.
            if !self.starts_expression() {
                break;
            }
            items.push(self.parse_starred_or_simple_expr()?);
        }

        Ok(Expr::Tuple(items))
    }

    /// Parse an expression where open tuples are not expected. If you need to support this in a
    /// given context (i.e. a = 4, 5), try `parse_expr`.
    pub fn parse_simple_expr(&mut self) -> Result<Expr, ParserError> {
        trace!("parse_simple_expr");
        match self.current_token() {
            Token::Lambda => self.parse_lambda(),
            Token::Yield | Token::Await => Err(self.syntax_error(format!(
                "'{}' is not supported",
                if self.current_token() == &Token::Yield {
                    "yield"
                } else {
                    "await"
                }
            ))),
            _ => self.parse_ternary_expr(),
        }
    }

    fn parse_starred_or_simple_expr(&mut self) -> Result<Expr, ParserError> {
        if self.consume_optional(&Token::Asterisk) {
            let inner = self.parse_bitwise_or()?;
            return Ok(Expr::Starred(Box::new(inner)));
        }
        self.parse_simple_expr()
    }

    /// Whether the current token can begin an expression. Used to detect trailing commas.
    fn starts_expression(&self) -> bool {
        matches!(
            self.current_token(),
            Token::Identifier(_)
                | Token::Integer(_)
                | Token::FloatingPoint(_)
                | Token::StringLiteral(_)
                | Token::BytesLiteral(_)
                | Token::BooleanLiteral(_)
                | Token::FStringStart
                | Token::None
                | Token::Ellipsis
                | Token::LParen
                | Token::LBracket
                | Token::LBrace
                | Token::Minus
                | Token::Plus
                | Token::BitwiseNot
                | Token::Not
                | Token::Lambda
                | Token::Asterisk
        )
    }

    /// Python precedence, lowest first:
    /// - Lambda - `parse_simple_expr`
    /// - Ternary Expression (inline-if) - `parse_ternary_expr`
    /// - Logical operators (or, and, not) - `parse_or_test`
    /// - Comparisons, membership and identity tests - `parse_comparison`
    /// - Bitwise OR (|), XOR (^), AND (&) - `parse_bitwise_or`
    /// - Bitwise Shifts (<<, >>) - `parse_bitwise_shift`
    /// - Addition, Subtraction - `parse_add_sub`
    /// - Multiplication, Division, Modulo - `parse_term`
    /// - Unary minus, plus, invert - `parse_unary`
    /// - Exponentiation (**) - `parse_exponentiation`
    /// - Member Access, Index Access, Calls - `parse_access_operations`
    /// - Literals, Identifiers - `parse_factor`
    fn parse_ternary_expr(&mut self) -> Result<Expr, ParserError> {
        let if_value = self.parse_or_test()?;

        if self.consume_optional(&Token::If) {
            let condition = self.parse_or_test()?;
            self.consume(&Token::Else)?;
            let else_value = self.parse_simple_expr()?;

            return Ok(Expr::TernaryOp {
                condition: Box::new(condition),
                if_value: Box::new(if_value),
                else_value: Box::new(else_value),
            });
        }

        Ok(if_value)
    }

    pub fn parse_or_test(&mut self) -> Result<Expr, ParserError> {
        let mut left = self.parse_and_test()?;

        while self.consume_optional(&Token::Or) {
            let right = self.parse_and_test()?;
            left = Expr::LogicalOperation {
                left: Box::new(left),
                op: LogicalOp::Or,
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn parse_and_test(&mut self) -> Result<Expr, ParserError> {
        let mut left = self.parse_not_test()?;

        while self.consume_optional(&Token::And) {
            let right = self.parse_not_test()?;
            left = Expr::LogicalOperation {
                left: Box::new(left),
                op: LogicalOp::And,
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn parse_not_test(&mut self) -> Result<Expr, ParserError> {
        if self.consume_optional(&Token::Not) {
            let right = self.parse_not_test()?;
            return Ok(Expr::UnaryOperation {
                op: UnaryOp::Not,
                right: Box::new(right),
            });
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<Expr, ParserError> {
        let left = self.parse_bitwise_or()?;

        let mut ops = vec![];
        loop {
            // Two tokens produce one `CompareOp::NotIn` or `CompareOp::IsNot` operation.
            let op = if self.tokens.peek_ahead_contains(&[Token::Not, Token::In]) {
                self.consume_current();
                self.consume_current();
                CompareOp::NotIn
            } else if self.tokens.peek_ahead_contains(&[Token::Is, Token::Not]) {
                self.consume_current();
                self.consume_current();
                CompareOp::IsNot
            } else if let Ok(op) = CompareOp::try_from(self.current_token()) {
                self.consume_current();
                op
            } else {
                break;
            };

            // A flat chain: `a < b < c` compares pairwise.
            let right = self.parse_bitwise_or()?;
            ops.push((op, right));
        }

        if ops.is_empty() {
            Ok(left)
        } else {
            Ok(Expr::ComparisonChain {
                left: Box::new(left),
                ops,
            })
        }
    }

    fn parse_binary_level<F>(&mut self, operators: &[Token], next: F) -> Result<Expr, ParserError>
    where
        F: Fn(&mut Self) -> Result<Expr, ParserError>,
    {
        let mut left = next(self)?;

        while operators.contains(self.current_token()) {
            let op = BinOp::try_from(self.current_token())?;
            self.consume_current();
            let right = next(self)?;
            left = Expr::BinaryOperation {
                left: Box::new(left),
                op,
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    pub fn parse_bitwise_or(&mut self) -> Result<Expr, ParserError> {
        self.parse_binary_level(&[Token::BitwiseOr], Self::parse_bitwise_xor)
    }

    fn parse_bitwise_xor(&mut self) -> Result<Expr, ParserError> {
        self.parse_binary_level(&[Token::BitwiseXor], Self::parse_bitwise_and)
    }

    fn parse_bitwise_and(&mut self) -> Result<Expr, ParserError> {
        self.parse_binary_level(&[Token::BitwiseAnd], Self::parse_bitwise_shift)
    }

    fn parse_bitwise_shift(&mut self) -> Result<Expr, ParserError> {
        self.parse_binary_level(&[Token::LeftShift, Token::RightShift], Self::parse_add_sub)
    }

    fn parse_add_sub(&mut self) -> Result<Expr, ParserError> {
        self.parse_binary_level(&[Token::Plus, Token::Minus], Self::parse_term)
    }

    fn parse_term(&mut self) -> Result<Expr, ParserError> {
        self.parse_binary_level(
            &[
                Token::Asterisk,
                Token::Slash,
                Token::DoubleSlash,
                Token::Modulo,
                Token::AtSign,
            ],
            Self::parse_unary,
        )
    }

    fn parse_unary(&mut self) -> Result<Expr, ParserError> {
        let op = match self.current_token() {
            Token::Minus => UnaryOp::Minus,
            Token::Plus => UnaryOp::Plus,
            Token::BitwiseNot => UnaryOp::BitwiseNot,
            _ => return self.parse_exponentiation(),
        };
        self.consume_current();
        let right = self.parse_unary()?;

        // Fold signed numeric literals.
        Ok(match (op, right) {
            (UnaryOp::Minus, Expr::Integer(i)) => Expr::Integer(-i),
            (UnaryOp::Minus, Expr::Float(f)) => Expr::Float(-f),
            (UnaryOp::Plus, Expr::Integer(i)) => Expr::Integer(i),
            (UnaryOp::Plus, Expr::Float(f)) => Expr::Float(f),
            (op, right) => Expr::UnaryOperation {
                op,
                right: Box::new(right),
            },
        })
    }

    /// Right-associative: `2 ** -1` and `2 ** 3 ** 2` both bind to the right.
    fn parse_exponentiation(&mut self) -> Result<Expr, ParserError> {
        let left = self.parse_access_operations()?;

        if self.consume_optional(&Token::DoubleAsterisk) {
            let right = self.parse_unary()?;
            return Ok(Expr::BinaryOperation {
                left: Box::new(left),
                op: BinOp::Expo,
                right: Box::new(right),
            });
        }

        Ok(left)
    }

    fn parse_access_operations(&mut self) -> Result<Expr, ParserError> {
        let mut left = self.parse_factor()?;

        loop {
            left = match self.current_token() {
                Token::Dot => {
                    self.consume_current();
                    let field = self.parse_identifier()?;
                    Expr::MemberAccess {
                        object: Box::new(left),
                        field,
                    }
                }
                Token::LBracket => self.parse_index_access(left)?,
                Token::LParen => {
                    let args = self.parse_function_call_args()?;
                    Expr::FunctionCall {
                        callee: Box::new(left),
                        args,
                    }
                }
                _ => break,
            };
        }

        Ok(left)
    }

    fn parse_index_access(&mut self, left: Expr) -> Result<Expr, ParserError> {
        self.consume(&Token::LBracket)?;

        let mut items = vec![self.parse_subscript_item()?];
        let mut is_tuple = false;
        while self.consume_optional(&Token::Comma) {
            is_tuple = true;
            if self.current_token() == &Token::RBracket {
                break;
            }
            items.push(self.parse_subscript_item()?);
        }
        self.consume(&Token::RBracket)?;

        let index = match items.pop() {
            Some(item) if !is_tuple => item,
            Some(item) => {
                items.push(item);
                Expr::Tuple(items)
            }
            None => return Err(self.syntax_error("invalid subscript")),
        };

        Ok(Expr::IndexAccess {
            object: Box::new(left),
            index: Box::new(index),
        })
    }

    /// A single subscript, which is either an expression or a slice such as `1:`, `:2`, `::-1`.
    fn parse_subscript_item(&mut self) -> Result<Expr, ParserError> {
        let start = if self.current_token() == &Token::Colon {
            None
        } else {
            Some(self.parse_simple_expr()?)
        };

        if !self.consume_optional(&Token::Colon) {
            return start.ok_or_else(|| self.syntax_error("invalid subscript"));
        }

        let slice_part_ends = |token: &Token| {
            matches!(token, Token::Colon | Token::RBracket | Token::Comma)
        };

        let stop = if slice_part_ends(self.current_token()) {
            None
        } else {
            Some(Box::new(self.parse_simple_expr()?))
        };

        let step = if self.consume_optional(&Token::Colon)
            && !matches!(self.current_token(), Token::RBracket | Token::Comma)
        {
            Some(Box::new(self.parse_simple_expr()?))
        } else {
            None
        };

        Ok(Expr::Slice {
            start: start.map(Box::new),
            stop,
            step,
        })
    }

    fn parse_factor(&mut self) -> Result<Expr, ParserError> {
        trace!(token = ?self.current_token(), "parse_factor");
        match self.current_token().clone() {
            Token::None => {
                self.consume_current();
                Ok(Expr::None)
            }
            Token::Ellipsis => {
                self.consume_current();
                Ok(Expr::Ellipsis)
            }
            Token::Integer(i) => {
                self.consume_current();
                Ok(Expr::Integer(i))
            }
            Token::FloatingPoint(f) => {
                self.consume_current();
                Ok(Expr::Float(f))
            }
            Token::BooleanLiteral(b) => {
                self.consume_current();
                Ok(Expr::Boolean(b))
            }
            Token::Identifier(ident) => {
                self.consume_current();
                Ok(Expr::Variable(ident))
            }
            Token::StringLiteral(_) | Token::FStringStart => self.parse_string_concatenation(),
            Token::BytesLiteral(_) => {
                let mut bytes = vec![];
                while let Token::BytesLiteral(next) = self.current_token().clone() {
                    self.consume_current();
                    bytes.extend(next);
                }
                Ok(Expr::BytesLiteral(bytes))
            }
            Token::LParen => self.parse_tuple(),
            Token::LBracket => self.parse_list(),
            Token::LBrace => self.parse_dict(),
            Token::Lambda => self.parse_lambda(),
            Token::Yield | Token::Await | Token::Async => {
                Err(self.syntax_error("generators and coroutines are not supported"))
            }
            _ => Err(self.unexpected()),
        }
    }

    /// Adjacent string literals are joined: `"a" "b"` is `"ab"`. If any part is an f-string the
    /// result is an f-string.
    fn parse_string_concatenation(&mut self) -> Result<Expr, ParserError> {
        let mut parts = vec![];
        let mut is_f_string = false;

        loop {
            match self.current_token().clone() {
                Token::StringLiteral(s) => {
                    self.consume_current();
                    parts.push(FStringPart::String(s));
                }
                Token::FStringStart => {
                    is_f_string = true;
                    parts.extend(self.parse_f_string()?);
                }
                _ => break,
            }
        }

        if is_f_string {
            return Ok(Expr::FString(parts));
        }

        let joined = parts
            .into_iter()
            .map(|part| match part {
                FStringPart::String(s) => s,
                FStringPart::Expr(_) => String::new(),
            })
            .collect();
        Ok(Expr::StringLiteral(joined))
    }

    fn parse_f_string(&mut self) -> Result<Vec<FStringPart>, ParserError> {
        self.consume(&Token::FStringStart)?;

        let mut parts = vec![];
        while self.current_token() != &Token::FStringEnd {
            match self.current_token().clone() {
                Token::StringLiteral(s) => {
                    self.consume_current();
                    parts.push(FStringPart::String(s));
                }
                Token::LBrace => {
                    self.consume_current();
                    let expr = self.parse_expr()?;

                    let format = if self.consume_optional(&Token::Exclamation) {
                        match self.parse_identifier()?.as_str() {
                            "r" | "a" => FormatOption::Repr,
                            "s" => FormatOption::Str,
                            _ => return Err(self.syntax_error("invalid conversion character")),
                        }
                    } else {
                        FormatOption::Str
                    };

                    let spec = if self.consume_optional(&Token::Colon) {
                        match self.current_token().clone() {
                            Token::StringLiteral(spec) => {
                                self.consume_current();
                                Some(spec)
                            }
                            _ => None,
                        }
                    } else {
                        None
                    };

                    self.consume(&Token::RBrace)?;
                    parts.push(FStringPart::Expr(ExprFormat {
                        expr: Box::new(expr),
                        format,
                        spec,
                    }));
                }
                _ => return Err(self.unexpected()),
            }
        }

        self.consume(&Token::FStringEnd)?;
        Ok(parts)
    }

    fn parse_lambda(&mut self) -> Result<Expr, ParserError> {
        let line = self.line_number();
        self.consume(&Token::Lambda)?;
        let params = self.parse_params(&Token::Colon)?;
        self.consume(&Token::Colon)?;
        let expr = self.parse_simple_expr()?;

        Ok(Expr::Lambda {
            params: Rc::new(params),
            body: Rc::new(vec![Statement::new(
                line,
                StatementKind::Return(Some(expr)),
            )]),
        })
    }

    fn parse_list(&mut self) -> Result<Expr, ParserError> {
        self.consume(&Token::LBracket)?;
        if self.consume_optional(&Token::RBracket) {
            return Ok(Expr::List(vec![]));
        }

        let first = self.parse_starred_or_simple_expr()?;
        if self.current_token() == &Token::For {
            let clauses = self.parse_comprehension_clauses()?;
            self.consume(&Token::RBracket)?;
            return Ok(Expr::ListComprehension {
                body: Box::new(first),
                clauses,
            });
        }

        let mut items = vec![first];
        while self.consume_optional(&Token::Comma) {
            // Handle trailing comma
            if self.current_token() == &Token::RBracket {
                break;
            }
            items.push(self.parse_starred_or_simple_expr()?);
        }
        self.consume(&Token::RBracket)?;

        Ok(Expr::List(items))
    }

    fn parse_dict(&mut self) -> Result<Expr, ParserError> {
        self.consume(&Token::LBrace)?;

        let mut ops = vec![];
        while self.current_token() != &Token::RBrace {
            if self.consume_optional(&Token::DoubleAsterisk) {
                ops.push(DictOperation::Unpack(self.parse_bitwise_or()?));
            } else {
                let key = self.parse_simple_expr()?;
                if self.current_token() != &Token::Colon {
                    return Err(self.syntax_error("set literals are not supported"));
                }
                self.consume_current();
                let value = self.parse_simple_expr()?;

                if ops.is_empty() && self.current_token() == &Token::For {
                    let clauses = self.parse_comprehension_clauses()?;
                    self.consume(&Token::RBrace)?;
                    return Ok(Expr::DictComprehension {
                        key: Box::new(key),
                        value: Box::new(value),
                        clauses,
                    });
                }
                ops.push(DictOperation::Pair(key, value));
            }

            if !self.consume_optional(&Token::Comma) {
                break;
            }
        }
        self.consume(&Token::RBrace)?;

        Ok(Expr::Dict(ops))
    }

    /// Single elements without a comma will be returned as is, everything else will be wrapped in
    /// `Expr::Tuple`.
    ///
    /// For example:
    ///
    /// (4) => int(4)
    /// (4,) => Expr::Tuple(vec!\[int(4)\])
    ///
    /// Generator expressions are evaluated eagerly, so `(x for x in y)` is a list comprehension.
    fn parse_tuple(&mut self) -> Result<Expr, ParserError> {
        self.consume(&Token::LParen)?;
        if self.consume_optional(&Token::RParen) {
            return Ok(Expr::Tuple(vec![]));
        }

        let first = self.parse_starred_or_simple_expr()?;
        if self.current_token() == &Token::For {
            let clauses = self.parse_comprehension_clauses()?;
            self.consume(&Token::RParen)?;
            return Ok(Expr::ListComprehension {
                body: Box::new(first),
                clauses,
            });
        }

        if self.consume_optional(&Token::RParen) {
            return match first {
                Expr::Starred(_) => Err(self.syntax_error("cannot use starred expression here")),
                expr => Ok(expr),
            };
        }

        let mut items = vec![first];
        while self.consume_optional(&Token::Comma) {
            if self.current_token() == &Token::RParen {
                break;
            }
            items.push(self.parse_starred_or_simple_expr()?);
        }
        self.consume(&Token::RParen)?;

        Ok(Expr::Tuple(items))
    }

    pub fn parse_function_call_args(&mut self) -> Result<CallArgs, ParserError> {
        self.consume(&Token::LParen)?;

        let mut args = CallArgs::default();
        while self.current_token() != &Token::RParen {
            if self.consume_optional(&Token::Asterisk) {
                let expr = self.parse_simple_expr()?;
                args.args.push(Expr::Starred(Box::new(expr)));
            } else if self.consume_optional(&Token::DoubleAsterisk) {
                let expr = self.parse_simple_expr()?;
                args.kwargs.push(KwargsOperation::Unpacking(expr));
            } else if matches!(self.current_token(), Token::Identifier(_))
                && self.tokens.peek(1) == &Token::Assign
            {
                // This is to support the format foo(a=2, b=1)
                let name = self.parse_identifier()?;
                self.consume(&Token::Assign)?;
                let expr = self.parse_simple_expr()?;
                args.kwargs.push(KwargsOperation::Pair(name, expr));
            } else {
                let expr = self.parse_simple_expr()?;
                if !args.kwargs.is_empty() {
                    return Err(self.syntax_error("positional argument follows keyword argument"));
                }
                if self.current_token() == &Token::For {
                    let clauses = self.parse_comprehension_clauses()?;
                    args.args.push(Expr::ListComprehension {
                        body: Box::new(expr),
                        clauses,
                    });
                } else {
                    args.args.push(expr);
                }
            }

            if !self.consume_optional(&Token::Comma) {
                break;
            }
        }

        self.consume(&Token::RParen)?;
        Ok(args)
    }

    fn parse_comprehension_clauses(&mut self) -> Result<Vec<ForClause>, ParserError> {
        let mut clauses = vec![];
        while self.consume_optional(&Token::For) {
            let target = self.parse_target_list()?;
            self.consume(&Token::In)?;

            // Stay below the ternary level, otherwise `a if cond` would expect an `else`.
            let iterable = self.parse_or_test()?;

            let mut conditions = vec![];
            while self.consume_optional(&Token::If) {
                conditions.push(self.parse_or_test()?);
            }

            clauses.push(ForClause {
                target,
                iterable,
                conditions,
            });
        }
        Ok(clauses)
    }

    /// The target of a `for` loop or comprehension, parsed below the comparison level so that
    /// the `in` keyword is not mistaken for a membership test.
    pub fn parse_target_list(&mut self) -> Result<Expr, ParserError> {
        let mut items = vec![self.parse_target_item()?];
        let mut is_tuple = false;
        while self.consume_optional(&Token::Comma) {
            is_tuple = true;
            if self.current_token() == &Token::In {
                break;
            }
            items.push(self.parse_target_item()?);
        }

        let target = match items.pop() {
            Some(item) if !is_tuple => item,
            Some(item) => {
                items.push(item);
                Expr::Tuple(items)
            }
            None => return Err(self.syntax_error("invalid target")),
        };

        if !target.is_assignable() {
            return Err(self.syntax_error("cannot assign to expression"));
        }
        Ok(target)
    }

    fn parse_target_item(&mut self) -> Result<Expr, ParserError> {
        if self.consume_optional(&Token::Asterisk) {
            let inner = self.parse_bitwise_or()?;
            return Ok(Expr::Starred(Box::new(inner)));
        }
        self.parse_bitwise_or()
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::{test_utils::*, types::*};

    #[test]
    fn precedence() {
        let expr = parse_expr!("1 + 2 * 3 ** 2");
        assert_eq!(
            expr,
            bin_op!(
                Expr::Integer(1),
                Add,
                bin_op!(
                    Expr::Integer(2),
                    Mul,
                    bin_op!(Expr::Integer(3), Expo, Expr::Integer(2))
                )
            )
        );

        let expr = parse_expr!("-2 ** 2");
        assert_eq!(
            expr,
            Expr::UnaryOperation {
                op: UnaryOp::Minus,
                right: Box::new(bin_op!(Expr::Integer(2), Expo, Expr::Integer(2))),
            }
        );
    }

    #[test]
    fn logical_and_comparison() {
        let expr = parse_expr!("not a in b and c is not None");
        assert_eq!(
            expr,
            Expr::LogicalOperation {
                left: Box::new(Expr::UnaryOperation {
                    op: UnaryOp::Not,
                    right: Box::new(Expr::ComparisonChain {
                        left: Box::new(var!("a")),
                        ops: vec![(CompareOp::In, var!("b"))],
                    }),
                }),
                op: LogicalOp::And,
                right: Box::new(Expr::ComparisonChain {
                    left: Box::new(var!("c")),
                    ops: vec![(CompareOp::IsNot, Expr::None)],
                }),
            }
        );
    }

    #[test]
    fn comparison_chain() {
        let expr = parse_expr!("1 < x <= 10");
        assert_eq!(
            expr,
            Expr::ComparisonChain {
                left: Box::new(Expr::Integer(1)),
                ops: vec![
                    (CompareOp::LessThan, var!("x")),
                    (CompareOp::LessThanOrEqual, Expr::Integer(10)),
                ],
            }
        );
    }

    #[test]
    fn ternary() {
        let expr = parse_expr!("a if b else c");
        assert_eq!(
            expr,
            Expr::TernaryOp {
                condition: Box::new(var!("b")),
                if_value: Box::new(var!("a")),
                else_value: Box::new(var!("c")),
            }
        );
    }

    #[test]
    fn tuples() {
        assert_eq!(
            parse_expr!("1,"),
            Expr::Tuple(vec![Expr::Integer(1)])
        );
        assert_eq!(parse_expr!("(1)"), Expr::Integer(1));
        assert_eq!(parse_expr!("()"), Expr::Tuple(vec![]));
        assert_eq!(
            parse_expr!("(1, 2,)"),
            Expr::Tuple(vec![Expr::Integer(1), Expr::Integer(2)])
        );
    }

    #[test]
    fn calls() {
        let expr = parse_expr!("f(1, *rest, key=2, **opts)");
        assert_eq!(
            expr,
            Expr::FunctionCall {
                callee: Box::new(var!("f")),
                args: CallArgs {
                    args: vec![
                        Expr::Integer(1),
                        Expr::Starred(Box::new(var!("rest")))
                    ],
                    kwargs: vec![
                        KwargsOperation::Pair(ident!("key"), Expr::Integer(2)),
                        KwargsOperation::Unpacking(var!("opts")),
                    ],
                },
            }
        );
    }

    #[test]
    fn positional_after_keyword() {
        let e = expect_error!("f(a=1, 2)");
        assert_eq!(e.message(), "positional argument follows keyword argument");
    }

    #[test]
    fn member_and_index_access() {
        let expr = parse_expr!("a.b[0][1:]");
        assert_eq!(
            expr,
            Expr::IndexAccess {
                object: Box::new(Expr::IndexAccess {
                    object: Box::new(Expr::MemberAccess {
                        object: Box::new(var!("a")),
                        field: ident!("b"),
                    }),
                    index: Box::new(Expr::Integer(0)),
                }),
                index: Box::new(Expr::Slice {
                    start: Some(Box::new(Expr::Integer(1))),
                    stop: None,
                    step: None,
                }),
            }
        );

        let expr = parse_expr!("a[::-1]");
        assert_eq!(
            expr,
            Expr::IndexAccess {
                object: Box::new(var!("a")),
                index: Box::new(Expr::Slice {
                    start: None,
                    stop: None,
                    step: Some(Box::new(Expr::Integer(-1))),
                }),
            }
        );
    }

    #[test]
    fn subscripted_generic() {
        let expr = parse_expr!("dict[str, int]");
        assert_eq!(
            expr,
            Expr::IndexAccess {
                object: Box::new(var!("dict")),
                index: Box::new(Expr::Tuple(vec![var!("str"), var!("int")])),
            }
        );
    }

    #[test]
    fn f_string() {
        let expr = parse_expr!(r#"f"ran {command!r} {n:>3}""#);
        assert_eq!(
            expr,
            Expr::FString(vec![
                FStringPart::String("ran ".to_string()),
                FStringPart::Expr(ExprFormat {
                    expr: Box::new(var!("command")),
                    format: FormatOption::Repr,
                    spec: None,
                }),
                FStringPart::String(" ".to_string()),
                FStringPart::Expr(ExprFormat {
                    expr: Box::new(var!("n")),
                    format: FormatOption::Str,
                    spec: Some(">3".to_string()),
                }),
            ])
        );
    }

    #[test]
    fn string_concatenation() {
        assert_eq!(
            parse_expr!(r#""a" 'b'"#),
            Expr::StringLiteral("ab".to_string())
        );
    }

    #[test]
    fn comprehensions() {
        let expr = parse_expr!("[x * 2 for x in items if x]");
        assert_eq!(
            expr,
            Expr::ListComprehension {
                body: Box::new(bin_op!(var!("x"), Mul, Expr::Integer(2))),
                clauses: vec![ForClause {
                    target: var!("x"),
                    iterable: var!("items"),
                    conditions: vec![var!("x")],
                }],
            }
        );

        let expr = parse_expr!("{k: v for k, v in pairs}");
        assert_eq!(
            expr,
            Expr::DictComprehension {
                key: Box::new(var!("k")),
                value: Box::new(var!("v")),
                clauses: vec![ForClause {
                    target: Expr::Tuple(vec![var!("k"), var!("v")]),
                    iterable: var!("pairs"),
                    conditions: vec![],
                }],
            }
        );
    }

    #[test]
    fn dict_literal() {
        let expr = parse_expr!("{'a': 1, **rest}");
        assert_eq!(
            expr,
            Expr::Dict(vec![
                DictOperation::Pair(Expr::StringLiteral("a".to_string()), Expr::Integer(1)),
                DictOperation::Unpack(var!("rest")),
            ])
        );
    }

    #[test]
    fn set_literal_rejected() {
        let e = expect_error!("{1, 2}");
        assert_eq!(e.message(), "set literals are not supported");
    }

    #[test]
    fn lambda() {
        let expr = parse_expr!("lambda x, y=1: x + y");
        let Expr::Lambda { params, body } = expr else {
            panic!("Expected a lambda");
        };
        assert_eq!(params.args.len(), 2);
        assert_eq!(params.args[1].default, Some(Expr::Integer(1)));
        assert_eq!(
            body[0].kind,
            StatementKind::Return(Some(bin_op!(var!("x"), Add, var!("y"))))
        );
    }

    #[test]
    fn yield_rejected() {
        let e = expect_error!("def f():\n    yield 1\n");
        assert_eq!(e.line(), 2);
    }
}
