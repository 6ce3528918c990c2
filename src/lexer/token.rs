use crate::domain::Identifier;

#[derive(Debug, PartialEq, Clone)]
pub enum Token {
    Identifier(Identifier),
    Integer(i64),
    FloatingPoint(f64),
    StringLiteral(String),
    BytesLiteral(Vec<u8>),
    BooleanLiteral(bool),
    FStringStart,
    FStringEnd,

    // Keywords
    None,
    Def,
    Class,
    Return,
    If,
    Elif,
    Else,
    While,
    For,
    In,
    Is,
    Not,
    And,
    Or,
    Pass,
    Break,
    Continue,
    Import,
    From,
    As,
    Global,
    Nonlocal,
    Raise,
    Try,
    Except,
    Finally,
    Assert,
    Del,
    Lambda,
    With,
    Yield,
    Async,
    Await,

    // Operators
    Plus,
    Minus,
    Asterisk,
    DoubleAsterisk,
    Slash,
    DoubleSlash,
    Modulo,
    AtSign,
    LeftShift,
    RightShift,
    BitwiseAnd,
    BitwiseOr,
    BitwiseXor,
    BitwiseNot,
    LessThan,
    GreaterThan,
    LessThanOrEqual,
    GreaterThanOrEqual,
    Equal,
    NotEqual,
    Assign,
    Walrus,
    PlusEquals,
    MinusEquals,
    AsteriskEquals,
    SlashEquals,
    DoubleSlashEquals,
    ModEquals,
    ExpoEquals,
    MatMulEquals,
    BitwiseAndEquals,
    BitwiseOrEquals,
    BitwiseXorEquals,
    LeftShiftEquals,
    RightShiftEquals,
    ReturnTypeArrow,

    // Delimiters
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Colon,
    Semicolon,
    Dot,
    Ellipsis,
    Exclamation,

    // Structure
    Newline,
    Indent,
    Dedent,
    Eof,
}

impl Token {
    pub fn keyword(word: &str) -> Option<Token> {
        let token = match word {
            "None" => Token::None,
            "True" => Token::BooleanLiteral(true),
            "False" => Token::BooleanLiteral(false),
            "def" => Token::Def,
            "class" => Token::Class,
            "return" => Token::Return,
            "if" => Token::If,
            "elif" => Token::Elif,
            "else" => Token::Else,
            "while" => Token::While,
            "for" => Token::For,
            "in" => Token::In,
            "is" => Token::Is,
            "not" => Token::Not,
            "and" => Token::And,
            "or" => Token::Or,
            "pass" => Token::Pass,
            "break" => Token::Break,
            "continue" => Token::Continue,
            "import" => Token::Import,
            "from" => Token::From,
            "as" => Token::As,
            "global" => Token::Global,
            "nonlocal" => Token::Nonlocal,
            "raise" => Token::Raise,
            "try" => Token::Try,
            "except" => Token::Except,
            "finally" => Token::Finally,
            "assert" => Token::Assert,
            "del" => Token::Del,
            "lambda" => Token::Lambda,
            "with" => Token::With,
            "yield" => Token::Yield,
            "async" => Token::Async,
            "await" => Token::Await,
            _ => return None,
        };
        Some(token)
    }

    pub fn is_compound_assign(&self) -> bool {
        matches!(
            self,
            Token::PlusEquals
                | Token::MinusEquals
                | Token::AsteriskEquals
                | Token::SlashEquals
                | Token::DoubleSlashEquals
                | Token::ModEquals
                | Token::ExpoEquals
                | Token::MatMulEquals
                | Token::BitwiseAndEquals
                | Token::BitwiseOrEquals
                | Token::BitwiseXorEquals
                | Token::LeftShiftEquals
                | Token::RightShiftEquals
        )
    }

    pub fn is_opening_delimiter(&self) -> bool {
        matches!(self, Token::LParen | Token::LBracket | Token::LBrace)
    }

    pub fn is_closing_delimiter(&self) -> bool {
        matches!(self, Token::RParen | Token::RBracket | Token::RBrace)
    }
}
