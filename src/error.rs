use crate::interpreter::RuntimeError;
use crate::parser::ParseError;
use crate::scanner::ScanError;
use crate::span::Span;
use thiserror::Error;

/// Failure of any pipeline stage. Each stage stops at its first error, so there is only ever
/// one of these per run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error("lexical error: {0}")]
    Scan(#[from] ScanError),
    #[error("syntax error: {0}")]
    Parse(#[from] ParseError),
    #[error("runtime error: {0}")]
    Runtime(#[from] RuntimeError),
}

impl Error {
    pub fn stage(&self) -> &'static str {
        match self {
            Error::Scan(_) => "lexer",
            Error::Parse(_) => "parser",
            Error::Runtime(_) => "runtime",
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Error::Scan(e) => e.span,
            Error::Parse(e) => e.span,
            Error::Runtime(e) => e.span,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Error::Scan(e) => &e.message,
            Error::Parse(e) => &e.message,
            Error::Runtime(e) => &e.message,
        }
    }
}
