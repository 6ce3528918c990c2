use std::rc::Rc;

use crate::{
    domain::{FromImportPath, Identifier, ModulePath},
    lexer::Token,
    parser::ParserError,
};

pub type Ast = Vec<Statement>;

macro_rules! ast {
    () => {
        Vec::<$crate::parser::types::Statement>::new()
    };
    ($($stmt:expr),+ $(,)?) => {
        vec![$($stmt),+]
    };
}
pub(crate) use ast;

#[derive(Debug, PartialEq, Clone)]
pub struct Statement {
    pub line: usize,
    pub kind: StatementKind,
}

impl Statement {
    pub fn new(line: usize, kind: StatementKind) -> Self {
        Self { line, kind }
    }
}

#[derive(Debug, PartialEq, Clone)]
pub enum StatementKind {
    Expression(Expr),
    /// `a = b = value`. Each target may be a name, attribute, subscript, or a tuple/list of
    /// targets for unpacking.
    Assignment {
        targets: Vec<Expr>,
        value: Expr,
    },
    AnnotatedAssignment {
        target: Expr,
        annotation: Expr,
        value: Option<Expr>,
    },
    CompoundAssignment {
        operator: BinOp,
        target: Expr,
        value: Expr,
    },
    FunctionDef(Rc<FunctionDef>),
    ClassDef(Rc<ClassDef>),
    Return(Option<Expr>),
    IfElse {
        if_part: ConditionalAst,
        elif_parts: Vec<ConditionalAst>,
        else_part: Option<Ast>,
    },
    WhileLoop {
        condition: Expr,
        body: Ast,
        else_block: Option<Ast>,
    },
    ForInLoop {
        target: Expr,
        iterable: Expr,
        body: Ast,
        else_block: Option<Ast>,
    },
    Break,
    Continue,
    Pass,
    RegularImport(Vec<RegularImport>),
    SelectiveImport {
        import_path: FromImportPath,
        mode: FromImportMode,
    },
    Global(Vec<Identifier>),
    Nonlocal(Vec<Identifier>),
    Raise(RaiseKind),
    TryExcept {
        try_block: Ast,
        handlers: Vec<ExceptHandler>,
        else_block: Option<Ast>,
        finally_block: Option<Ast>,
    },
    Assert {
        condition: Expr,
        message: Option<Expr>,
    },
    Delete(Vec<Expr>),
}

#[derive(Debug, PartialEq, Clone)]
pub struct ConditionalAst {
    pub condition: Expr,
    pub ast: Ast,
}

#[derive(Debug, PartialEq, Clone)]
pub struct FunctionDef {
    pub name: Identifier,
    pub params: Params,
    pub returns: Option<Expr>,
    pub body: Rc<Ast>,
    pub decorators: Vec<Expr>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct ClassDef {
    pub name: Identifier,
    pub bases: Vec<Expr>,
    pub body: Ast,
    pub decorators: Vec<Expr>,
}

/// The docstring of a body is its first statement if that is a bare string literal.
pub fn docstring(body: &[Statement]) -> Option<&str> {
    match body.first().map(|s| &s.kind) {
        Some(StatementKind::Expression(Expr::StringLiteral(doc))) => Some(doc),
        _ => None,
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct Param {
    pub arg: Identifier,
    pub annotation: Option<Expr>,
    pub default: Option<Expr>,
}

impl Param {
    pub fn new(arg: Identifier) -> Self {
        Self {
            arg,
            annotation: None,
            default: None,
        }
    }
}

/// The parameter list of a `def` or `lambda`.
///
/// ```python
/// def f(a, b=1, /, c: int = 2, *args, d, e=3, **kwargs): ...
/// ```
/// `args` holds `a, b, c` with `positional_only == 2`; `kwonly` holds `d, e`.
#[derive(Debug, Default, PartialEq, Clone)]
pub struct Params {
    pub args: Vec<Param>,
    pub positional_only: usize,
    pub args_var: Option<Param>,
    pub kwonly: Vec<Param>,
    pub kwargs_var: Option<Param>,
}

impl Params {
    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
            && self.args_var.is_none()
            && self.kwonly.is_empty()
            && self.kwargs_var.is_none()
    }
}

#[derive(Debug, PartialEq, Clone)]
pub enum Expr {
    None,
    Ellipsis,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    StringLiteral(String),
    BytesLiteral(Vec<u8>),
    FString(Vec<FStringPart>),
    Variable(Identifier),
    List(Vec<Expr>),
    Tuple(Vec<Expr>),
    Dict(Vec<DictOperation>),
    /// `*expr` inside a literal, a call, or an assignment target.
    Starred(Box<Expr>),
    ListComprehension {
        body: Box<Expr>,
        clauses: Vec<ForClause>,
    },
    DictComprehension {
        key: Box<Expr>,
        value: Box<Expr>,
        clauses: Vec<ForClause>,
    },
    MemberAccess {
        object: Box<Expr>,
        field: Identifier,
    },
    IndexAccess {
        object: Box<Expr>,
        index: Box<Expr>,
    },
    Slice {
        start: Option<Box<Expr>>,
        stop: Option<Box<Expr>>,
        step: Option<Box<Expr>>,
    },
    FunctionCall {
        callee: Box<Expr>,
        args: CallArgs,
    },
    BinaryOperation {
        left: Box<Expr>,
        op: BinOp,
        right: Box<Expr>,
    },
    UnaryOperation {
        op: UnaryOp,
        right: Box<Expr>,
    },
    LogicalOperation {
        left: Box<Expr>,
        op: LogicalOp,
        right: Box<Expr>,
    },
    ComparisonChain {
        left: Box<Expr>,
        ops: Vec<(CompareOp, Expr)>,
    },
    TernaryOp {
        condition: Box<Expr>,
        if_value: Box<Expr>,
        else_value: Box<Expr>,
    },
    Lambda {
        params: Rc<Params>,
        body: Rc<Ast>,
    },
}

impl Expr {
    pub fn as_variable(&self) -> Option<&Identifier> {
        match self {
            Expr::Variable(name) => Some(name),
            _ => None,
        }
    }

    pub fn is_assignable(&self) -> bool {
        match self {
            Expr::Variable(_) | Expr::MemberAccess { .. } | Expr::IndexAccess { .. } => true,
            Expr::Tuple(items) | Expr::List(items) => items.iter().all(Expr::is_assignable),
            Expr::Starred(inner) => inner.is_assignable(),
            _ => false,
        }
    }
}

#[derive(Debug, PartialEq, Clone)]
pub enum FStringPart {
    String(String),
    Expr(ExprFormat),
}

#[derive(Debug, PartialEq, Clone)]
pub struct ExprFormat {
    pub expr: Box<Expr>,
    pub format: FormatOption,
    pub spec: Option<String>,
}

#[derive(Debug, PartialEq, Clone)]
pub enum FormatOption {
    Str,
    Repr,
}

#[derive(Debug, PartialEq, Clone)]
pub enum DictOperation {
    Pair(Expr, Expr),
    Unpack(Expr),
}

#[derive(Debug, PartialEq, Clone)]
pub struct ForClause {
    pub target: Expr,
    pub iterable: Expr,
    pub conditions: Vec<Expr>,
}

#[derive(Debug, Default, PartialEq, Clone)]
pub struct CallArgs {
    pub args: Vec<Expr>,
    pub kwargs: Vec<KwargsOperation>,
}

#[derive(Debug, PartialEq, Clone)]
pub enum KwargsOperation {
    Pair(Identifier, Expr),
    Unpacking(Expr),
}

#[derive(Debug, PartialEq, Clone)]
pub struct RegularImport {
    pub module_path: ModulePath,
    pub alias: Option<Identifier>,
}

#[derive(Debug, PartialEq, Clone)]
pub enum FromImportMode {
    All,
    List(Vec<FromImportItem>),
}

#[derive(Debug, PartialEq, Clone)]
pub struct FromImportItem {
    pub symbol: Identifier,
    pub alias: Option<Identifier>,
}

impl FromImportItem {
    pub fn direct(symbol: Identifier) -> Self {
        Self {
            symbol,
            alias: None,
        }
    }

    pub fn aliased(symbol: Identifier, alias: Identifier) -> Self {
        Self {
            symbol,
            alias: Some(alias),
        }
    }

    /// The name this item binds in the importing namespace.
    pub fn bound_name(&self) -> &Identifier {
        self.alias.as_ref().unwrap_or(&self.symbol)
    }
}

#[derive(Debug, PartialEq, Clone)]
pub enum RaiseKind {
    Reraise,
    Raise(Expr),
    RaiseFrom { exception: Expr, cause: Expr },
}

#[derive(Debug, PartialEq, Clone)]
pub struct ExceptHandler {
    pub exception_type: Option<Expr>,
    pub alias: Option<Identifier>,
    pub block: Ast,
}

impl ExceptHandler {
    pub fn default(block: Ast) -> Self {
        Self {
            exception_type: None,
            alias: None,
            block,
        }
    }

    pub fn typed(exception_type: Expr, alias: Option<Identifier>, block: Ast) -> Self {
        Self {
            exception_type: Some(exception_type),
            alias,
            block,
        }
    }

    pub fn is_default(&self) -> bool {
        self.exception_type.is_none()
    }
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    IntegerDiv,
    Mod,
    Expo,
    MatMul,
    LeftShift,
    RightShift,
    BitwiseAnd,
    BitwiseOr,
    BitwiseXor,
}

impl BinOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::IntegerDiv => "//",
            BinOp::Mod => "%",
            BinOp::Expo => "**",
            BinOp::MatMul => "@",
            BinOp::LeftShift => "<<",
            BinOp::RightShift => ">>",
            BinOp::BitwiseAnd => "&",
            BinOp::BitwiseOr => "|",
            BinOp::BitwiseXor => "^",
        }
    }

    /// Map a compound assignment token such as `+=` to its operator.
    pub fn from_compound(token: &Token) -> Option<Self> {
        let op = match token {
            Token::PlusEquals => BinOp::Add,
            Token::MinusEquals => BinOp::Sub,
            Token::AsteriskEquals => BinOp::Mul,
            Token::SlashEquals => BinOp::Div,
            Token::DoubleSlashEquals => BinOp::IntegerDiv,
            Token::ModEquals => BinOp::Mod,
            Token::ExpoEquals => BinOp::Expo,
            Token::MatMulEquals => BinOp::MatMul,
            Token::LeftShiftEquals => BinOp::LeftShift,
            Token::RightShiftEquals => BinOp::RightShift,
            Token::BitwiseAndEquals => BinOp::BitwiseAnd,
            Token::BitwiseOrEquals => BinOp::BitwiseOr,
            Token::BitwiseXorEquals => BinOp::BitwiseXor,
            _ => return None,
        };
        Some(op)
    }
}

impl TryFrom<&Token> for BinOp {
    type Error = ParserError;

    fn try_from(token: &Token) -> Result<Self, Self::Error> {
        let op = match token {
            Token::Plus => BinOp::Add,
            Token::Minus => BinOp::Sub,
            Token::Asterisk => BinOp::Mul,
            Token::Slash => BinOp::Div,
            Token::DoubleSlash => BinOp::IntegerDiv,
            Token::Modulo => BinOp::Mod,
            Token::DoubleAsterisk => BinOp::Expo,
            Token::AtSign => BinOp::MatMul,
            Token::LeftShift => BinOp::LeftShift,
            Token::RightShift => BinOp::RightShift,
            Token::BitwiseAnd => BinOp::BitwiseAnd,
            Token::BitwiseOr => BinOp::BitwiseOr,
            Token::BitwiseXor => BinOp::BitwiseXor,
            _ => return Err(ParserError::unexpected(token.clone(), 0)),
        };
        Ok(op)
    }
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum UnaryOp {
    Minus,
    Plus,
    Not,
    BitwiseNot,
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum LogicalOp {
    And,
    Or,
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum CompareOp {
    Equals,
    NotEquals,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    In,
    NotIn,
    Is,
    IsNot,
}

impl CompareOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            CompareOp::Equals => "==",
            CompareOp::NotEquals => "!=",
            CompareOp::LessThan => "<",
            CompareOp::LessThanOrEqual => "<=",
            CompareOp::GreaterThan => ">",
            CompareOp::GreaterThanOrEqual => ">=",
            CompareOp::In => "in",
            CompareOp::NotIn => "not in",
            CompareOp::Is => "is",
            CompareOp::IsNot => "is not",
        }
    }
}

impl TryFrom<&Token> for CompareOp {
    type Error = ParserError;

    fn try_from(token: &Token) -> Result<Self, Self::Error> {
        let op = match token {
            Token::Equal => CompareOp::Equals,
            Token::NotEqual => CompareOp::NotEquals,
            Token::LessThan => CompareOp::LessThan,
            Token::LessThanOrEqual => CompareOp::LessThanOrEqual,
            Token::GreaterThan => CompareOp::GreaterThan,
            Token::GreaterThanOrEqual => CompareOp::GreaterThanOrEqual,
            Token::In => CompareOp::In,
            Token::Is => CompareOp::Is,
            _ => return Err(ParserError::unexpected(token.clone(), 0)),
        };
        Ok(op)
    }
}
