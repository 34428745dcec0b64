use crate::span::Span;
use std::fmt;

#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub token_type: TokenType,
    pub lexeme: String,
    pub span: Span,
}

impl Token {
    pub fn new(token_type: TokenType, lexeme: impl Into<String>, span: Span) -> Self {
        Token {
            token_type,
            lexeme: lexeme.into(),
            span,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:>4}:{:<4} {:<12} {:?}",
            self.span.line,
            self.span.col,
            self.token_type.kind_name(),
            self.lexeme
        )
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum TokenType {
    // Literals
    Identifier,  // variable names, function names
    Str(String), // "你好" (raw text between the quotes)
    Number(f64), // 123, 45.67

    Keyword(Keyword),
    Operator(Operator),
    Delimiter(Delimiter),

    // Control
    Newline, // soft separator, dropped by the parser
    Eof,     // end of file
}

impl TokenType {
    pub fn kind_name(&self) -> &'static str {
        match self {
            TokenType::Identifier => "identifier",
            TokenType::Str(_) => "string",
            TokenType::Number(_) => "number",
            TokenType::Keyword(_) => "keyword",
            TokenType::Operator(_) => "operator",
            TokenType::Delimiter(_) => "delimiter",
            TokenType::Newline => "newline",
            TokenType::Eof => "eof",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Keyword {
    Variable, // 变量
    Constant, // 常量
    If,       // 如果
    Else,     // 否则
    Loop,     // 循环
    Function, // 函数
    Return,   // 返回
    Print,    // 输出
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operator {
    Assign,       // =
    Plus,         // +
    Minus,        // -
    Star,         // *
    Slash,        // /
    Percent,      // %
    Less,         // <
    LessEqual,    // <=
    Greater,      // >
    GreaterEqual, // >=
    Bang,         // !
    NotEqual,     // !=
    Equal,        // ==
    Ampersand,    // &
    And,          // &&
    Pipe,         // |
    Or,           // ||
}

impl Operator {
    pub fn symbol(self) -> &'static str {
        match self {
            Operator::Assign => "=",
            Operator::Plus => "+",
            Operator::Minus => "-",
            Operator::Star => "*",
            Operator::Slash => "/",
            Operator::Percent => "%",
            Operator::Less => "<",
            Operator::LessEqual => "<=",
            Operator::Greater => ">",
            Operator::GreaterEqual => ">=",
            Operator::Bang => "!",
            Operator::NotEqual => "!=",
            Operator::Equal => "==",
            Operator::Ampersand => "&",
            Operator::And => "&&",
            Operator::Pipe => "|",
            Operator::Or => "||",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Delimiter {
    LeftParen,    // (
    RightParen,   // )
    LeftBrace,    // {
    RightBrace,   // }
    LeftBracket,  // [
    RightBracket, // ]
    Comma,        // ,
    Dot,          // .
    Semicolon,    // ;
}
