pub mod token;

use crate::keywords::Keywords;
use crate::scanner::token::{Delimiter, Operator, Token, TokenType};
use crate::span::Span;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message} (line {}, column {})", span.line, span.col)]
pub struct ScanError {
    pub span: Span,
    pub message: String,
}

/// Turns source text into tokens. Stops at the first character it cannot place.
pub struct Scanner<'k> {
    source: Vec<char>,
    tokens: Vec<Token>,
    start: usize,
    current: usize,
    line: usize,
    line_start: usize,
    keywords: &'k Keywords,
}

impl<'k> Scanner<'k> {
    pub fn new(source: &str, keywords: &'k Keywords) -> Self {
        Scanner {
            source: source.chars().collect(),
            tokens: Vec::new(),
            start: 0,
            current: 0,
            line: 1,
            line_start: 0,
            keywords,
        }
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.source.len()
    }

    pub fn scan_tokens(mut self) -> Result<Vec<Token>, ScanError> {
        while !self.is_at_end() {
            self.start = self.current;
            self.scan_token()?;
        }

        let eof_span = Span {
            line: self.line,
            col: self.current - self.line_start + 1,
            length: 0,
        };
        self.tokens.push(Token::new(TokenType::Eof, "", eof_span));
        debug!(count = self.tokens.len(), "scanned tokens");
        Ok(self.tokens)
    }

    fn scan_token(&mut self) -> Result<(), ScanError> {
        let c = self.advance();
        match c {
            // Whitespace (not newlines)
            ' ' | '\r' | '\t' => {}

            // Newlines are tokens of their own; the parser treats them as soft separators
            '\n' => {
                let span = Span {
                    line: self.line,
                    col: self.start - self.line_start + 1,
                    length: 1,
                };
                self.tokens.push(Token::new(TokenType::Newline, "\n", span));
                self.line += 1;
                self.line_start = self.current;
            }

            '#' => {
                while self.peek() != Some('\n') && !self.is_at_end() {
                    self.advance();
                }
            }

            '"' => self.handle_string(),

            c if c.is_ascii_digit() => self.handle_number()?,

            c if is_identifier_start(c) => self.handle_identifier(),

            '=' => self.two_char_operator('=', Operator::Equal, Operator::Assign),
            '!' => self.two_char_operator('=', Operator::NotEqual, Operator::Bang),
            '<' => self.two_char_operator('=', Operator::LessEqual, Operator::Less),
            '>' => self.two_char_operator('=', Operator::GreaterEqual, Operator::Greater),
            '&' => self.two_char_operator('&', Operator::And, Operator::Ampersand),
            '|' => self.two_char_operator('|', Operator::Or, Operator::Pipe),
            '+' => self.add_token(TokenType::Operator(Operator::Plus)),
            '-' => self.add_token(TokenType::Operator(Operator::Minus)),
            '*' => self.add_token(TokenType::Operator(Operator::Star)),
            '/' => self.add_token(TokenType::Operator(Operator::Slash)),
            '%' => self.add_token(TokenType::Operator(Operator::Percent)),

            '(' => self.add_token(TokenType::Delimiter(Delimiter::LeftParen)),
            ')' => self.add_token(TokenType::Delimiter(Delimiter::RightParen)),
            '{' => self.add_token(TokenType::Delimiter(Delimiter::LeftBrace)),
            '}' => self.add_token(TokenType::Delimiter(Delimiter::RightBrace)),
            '[' => self.add_token(TokenType::Delimiter(Delimiter::LeftBracket)),
            ']' => self.add_token(TokenType::Delimiter(Delimiter::RightBracket)),
            ',' => self.add_token(TokenType::Delimiter(Delimiter::Comma)),
            '.' => self.add_token(TokenType::Delimiter(Delimiter::Dot)),
            ';' => self.add_token(TokenType::Delimiter(Delimiter::Semicolon)),

            _ => return Err(self.error(format!("Unknown character: '{}'", c))),
        }
        Ok(())
    }

    fn advance(&mut self) -> char {
        let ch = self.source[self.current];
        self.current += 1;
        ch
    }

    fn peek(&self) -> Option<char> {
        self.source.get(self.current).copied()
    }

    fn match_char(&mut self, expected: char) -> bool {
        match self.peek() {
            Some(ch) if ch == expected => {
                self.current += 1;
                true
            }
            _ => false,
        }
    }

    fn two_char_operator(&mut self, second: char, long: Operator, short: Operator) {
        let op = if self.match_char(second) { long } else { short };
        self.add_token(TokenType::Operator(op));
    }

    fn handle_string(&mut self) {
        let line = self.line;
        let col = self.start - self.line_start + 1;

        while let Some(c) = self.peek() {
            if c == '"' {
                break;
            }
            self.advance();
            match c {
                // the escaped char is kept as-is, only stepped over
                '\\' => {
                    if let Some(next) = self.peek() {
                        self.advance();
                        self.track_newline(next);
                    }
                }
                _ => self.track_newline(c),
            }
        }

        // an unterminated string simply runs to the end of input
        let value_end = self.current;
        if !self.is_at_end() {
            self.advance(); // closing quote
        }

        let value: String = self.source[self.start + 1..value_end].iter().collect();
        let lexeme: String = self.source[self.start..self.current].iter().collect();
        let span = Span {
            line,
            col,
            length: self.current - self.start,
        };
        self.tokens.push(Token::new(TokenType::Str(value), lexeme, span));
    }

    fn track_newline(&mut self, c: char) {
        if c == '\n' {
            self.line += 1;
            self.line_start = self.current;
        }
    }

    fn handle_number(&mut self) -> Result<(), ScanError> {
        // First character is already consumed and is a digit
        let mut seen_dot = false;
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                self.advance();
            } else if c == '.' && !seen_dot {
                seen_dot = true;
                self.advance();
            } else {
                break;
            }
        }

        let raw: String = self.source[self.start..self.current].iter().collect();
        // "1." is a complete literal here
        match raw.trim_end_matches('.').parse::<f64>() {
            Ok(num) => {
                self.add_token(TokenType::Number(num));
                Ok(())
            }
            Err(_) => Err(self.error(format!("Invalid number: '{}'", raw))),
        }
    }

    fn handle_identifier(&mut self) {
        while self.peek().is_some_and(is_identifier_continue) {
            self.advance();
        }

        let text: String = self.source[self.start..self.current].iter().collect();
        let token_type = match self.keywords.get(&text) {
            Some(keyword) => TokenType::Keyword(*keyword),
            None => TokenType::Identifier,
        };
        self.add_token(token_type);
    }

    fn add_token(&mut self, t: TokenType) {
        let text = self.source[self.start..self.current]
            .iter()
            .collect::<String>();
        let span = Span {
            line: self.line,
            col: self.start - self.line_start + 1,
            length: self.current - self.start,
        };
        self.tokens.push(Token::new(t, text, span));
    }

    fn error(&self, message: impl Into<String>) -> ScanError {
        let col = if self.start >= self.line_start {
            self.start - self.line_start + 1
        } else {
            1
        };
        ScanError {
            span: Span {
                line: self.line,
                col,
                length: (self.current - self.start).max(1),
            },
            message: message.into(),
        }
    }
}

// Anything outside ASCII counts as a letter, so CJK names work without a table.
fn is_identifier_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || !c.is_ascii()
}

fn is_identifier_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || !c.is_ascii()
}
