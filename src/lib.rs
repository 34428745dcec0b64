//! Kunyu (坤舆), a small imperative scripting language with Chinese keywords.
//!
//! The pipeline is `tokenize` → `parse` → [`Interpreter::evaluate`]; [`run`] chains all
//! three for hosts that only have source text.

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod interpreter;
pub mod keywords;
pub mod parser;
pub mod scanner;
pub mod span;

pub use crate::config::RuntimeConfig;
pub use crate::error::Error;
pub use crate::interpreter::Interpreter;

use crate::keywords::{default_keywords, Keywords};
use crate::parser::ast::Program;
use crate::parser::{ParseError, Parser};
use crate::scanner::token::Token;
use crate::scanner::{ScanError, Scanner};
use std::io::Write;

/// Tokenizes with the default keyword set.
pub fn tokenize(source: &str) -> Result<Vec<Token>, ScanError> {
    tokenize_with(source, &default_keywords())
}

pub fn tokenize_with(source: &str, keywords: &Keywords) -> Result<Vec<Token>, ScanError> {
    Scanner::new(source, keywords).scan_tokens()
}

pub fn parse(tokens: Vec<Token>) -> Result<Program, ParseError> {
    Parser::new(tokens).parse()
}

/// Runs `source` on an existing interpreter, so state carries over between calls.
pub fn run<W: Write>(source: &str, interpreter: &mut Interpreter<W>) -> Result<(), Error> {
    let tokens = tokenize(source)?;
    let program = parse(tokens)?;
    interpreter.evaluate(&program)?;
    Ok(())
}
