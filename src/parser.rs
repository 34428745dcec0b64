pub mod ast;
pub mod printer;

use crate::parser::ast::{Block, ElseBranch, Expr, ExprKind, IfStmt, Program, Stmt, StmtKind};
use crate::scanner::token::{Delimiter, Keyword, Operator, Token, TokenType};
use crate::span::Span;
use std::rc::Rc;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message} (line {}, column {})", span.line, span.col)]
pub struct ParseError {
    pub span: Span,
    pub message: String,
}

/// Recursive-descent parser. Binary operators have no precedence: a chain such as
/// `a + b * c` groups strictly left to right as `(a + b) * c`.
pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
}

impl Parser {
    /// Token streams that do not end in `Eof`, including an empty one, get one appended
    /// after the last token.
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if tokens.last().map(|t| &t.token_type) != Some(&TokenType::Eof) {
            let span = tokens
                .last()
                .map(|t| Span::new(t.span.line, t.span.col + t.span.length, 0))
                .unwrap_or_else(|| Span::new(1, 1, 0));
            tokens.push(Token::new(TokenType::Eof, "", span));
        }
        Self { tokens, current: 0 }
    }

    // utility methods
    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn peek_next(&self) -> Option<&Token> {
        self.tokens.get(self.current + 1)
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.current - 1]
    }

    fn is_at_end(&self) -> bool {
        self.peek().token_type == TokenType::Eof
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous()
    }

    fn check(&self, token_type: &TokenType) -> bool {
        &self.peek().token_type == token_type
    }

    fn check_keyword(&self, keyword: Keyword) -> bool {
        self.check(&TokenType::Keyword(keyword))
    }

    fn check_delimiter(&self, delimiter: Delimiter) -> bool {
        self.check(&TokenType::Delimiter(delimiter))
    }

    fn skip_newlines(&mut self) {
        while self.check(&TokenType::Newline) {
            self.advance();
        }
    }

    fn error_expected(&self, expected: &str) -> ParseError {
        let current = self.peek();
        let context = if self.current > 0 {
            format!(" after '{}'", self.previous().lexeme.escape_debug())
        } else {
            String::new()
        };
        ParseError {
            span: current.span,
            message: format!("Expected {}{}, got {}", expected, context, describe(current)),
        }
    }

    fn consume(&mut self, token_type: TokenType, expected: &str) -> Result<&Token, ParseError> {
        if self.check(&token_type) {
            Ok(self.advance())
        } else {
            Err(self.error_expected(expected))
        }
    }

    fn consume_delimiter(&mut self, delimiter: Delimiter, expected: &str) -> Result<Span, ParseError> {
        Ok(self.consume(TokenType::Delimiter(delimiter), expected)?.span)
    }

    fn consume_identifier(&mut self, expected: &str) -> Result<String, ParseError> {
        Ok(self
            .consume(TokenType::Identifier, expected)?
            .lexeme
            .clone())
    }

    pub fn parse(mut self) -> Result<Program, ParseError> {
        self.program()
    }

    fn program(&mut self) -> Result<Program, ParseError> {
        let mut statements = Vec::new();

        self.skip_newlines();
        while !self.is_at_end() {
            statements.push(self.statement()?);
            self.skip_newlines();
        }

        debug!(count = statements.len(), "parsed program");
        Ok(Program { statements })
    }

    fn statement(&mut self) -> Result<Stmt, ParseError> {
        let TokenType::Keyword(keyword) = self.peek().token_type else {
            return self.expr_stmt();
        };
        match keyword {
            Keyword::Print => self.print_stmt(),
            Keyword::Variable => self.var_decl(false),
            Keyword::Constant => self.var_decl(true),
            Keyword::If => self.if_stmt(),
            Keyword::Loop => self.loop_stmt(),
            Keyword::Function => self.fn_decl(),
            Keyword::Return => self.return_stmt(),
            Keyword::Else => self.expr_stmt(),
        }
    }

    fn print_stmt(&mut self) -> Result<Stmt, ParseError> {
        let span = self.peek().span;
        self.advance(); // consume 输出
        let value = self.expression()?;
        self.consume_delimiter(Delimiter::Semicolon, "';' after print statement")?;

        Ok(Stmt {
            kind: StmtKind::Print(value),
            span,
        })
    }

    fn var_decl(&mut self, is_constant: bool) -> Result<Stmt, ParseError> {
        let span = self.peek().span; // capture before consuming
        self.advance(); // consume 变量/常量
        let name = self.consume_identifier("variable name")?;
        self.consume(TokenType::Operator(Operator::Assign), "'='")?;
        let initializer = self.expression()?;
        self.consume_delimiter(Delimiter::Semicolon, "';' after variable declaration")?;

        Ok(Stmt {
            kind: StmtKind::VarDecl {
                name,
                initializer,
                is_constant,
            },
            span,
        })
    }

    fn if_stmt(&mut self) -> Result<Stmt, ParseError> {
        let span = self.peek().span;
        Ok(Stmt {
            kind: StmtKind::If(self.if_chain()?),
            span,
        })
    }

    fn if_chain(&mut self) -> Result<IfStmt, ParseError> {
        self.advance(); // consume 如果

        self.consume_delimiter(Delimiter::LeftParen, "'(' before condition")?;
        let condition = self.expression()?;
        self.consume_delimiter(Delimiter::RightParen, "')' after condition")?;
        let then_branch = self.braced_block()?;

        // 否则 must sit on the same line as the closing brace
        let else_branch = if self.check_keyword(Keyword::Else) {
            self.advance();
            if self.check_keyword(Keyword::If) {
                Some(ElseBranch::If(Box::new(self.if_chain()?)))
            } else {
                Some(ElseBranch::Block(self.braced_block()?))
            }
        } else {
            None
        };

        Ok(IfStmt {
            condition,
            then_branch,
            else_branch,
        })
    }

    fn loop_stmt(&mut self) -> Result<Stmt, ParseError> {
        let span = self.peek().span;
        self.advance(); // consume 循环
        self.consume_delimiter(Delimiter::LeftParen, "'(' before loop condition")?;
        let condition = self.expression()?;
        self.consume_delimiter(Delimiter::RightParen, "')' after loop condition")?;
        let body = self.braced_block()?;

        Ok(Stmt {
            kind: StmtKind::Loop { condition, body },
            span,
        })
    }

    fn fn_decl(&mut self) -> Result<Stmt, ParseError> {
        let span = self.peek().span;
        self.advance(); // consume 函数

        let name = self.consume_identifier("function name")?;

        self.consume_delimiter(Delimiter::LeftParen, "'(' after function name")?;
        let mut params = Vec::new();
        if !self.check_delimiter(Delimiter::RightParen) {
            params.push(self.consume_identifier("parameter name")?);

            while self.check_delimiter(Delimiter::Comma) {
                self.advance();
                params.push(self.consume_identifier("parameter name")?);
            }
        }
        self.consume_delimiter(Delimiter::RightParen, "')' after parameters")?;

        let body = Rc::new(self.braced_block()?);

        Ok(Stmt {
            kind: StmtKind::Function { name, params, body },
            span,
        })
    }

    fn return_stmt(&mut self) -> Result<Stmt, ParseError> {
        let span = self.peek().span;
        self.advance(); // consume 返回
        let value = self.expression()?;
        self.consume_delimiter(Delimiter::Semicolon, "';' after return value")?;

        Ok(Stmt {
            kind: StmtKind::Return(Some(value)),
            span,
        })
    }

    fn expr_stmt(&mut self) -> Result<Stmt, ParseError> {
        let span = self.peek().span;
        let expr = self.expression()?;
        self.consume_delimiter(Delimiter::Semicolon, "';' after expression")?;

        Ok(Stmt {
            kind: StmtKind::Expression(expr),
            span,
        })
    }

    // '{' statements '}'
    fn braced_block(&mut self) -> Result<Block, ParseError> {
        let span = self.consume_delimiter(Delimiter::LeftBrace, "'{'")?;
        let mut statements = Vec::new();

        self.skip_newlines();
        while !self.check_delimiter(Delimiter::RightBrace) {
            if self.is_at_end() {
                return Err(ParseError {
                    span: self.peek().span,
                    message: "Unclosed block, expected '}'".to_string(),
                });
            }
            statements.push(self.statement()?);
            self.skip_newlines();
        }
        self.advance(); // consume '}'

        Ok(Block { statements, span })
    }

    fn expression(&mut self) -> Result<Expr, ParseError> {
        let is_assignment = self.check(&TokenType::Identifier)
            && self
                .peek_next()
                .is_some_and(|t| t.token_type == TokenType::Operator(Operator::Assign));

        if is_assignment {
            let span = self.peek().span;
            let name = self.advance().lexeme.clone();
            self.advance(); // consume '='
            let value = Box::new(self.expression()?); // right-associative

            return Ok(Expr {
                kind: ExprKind::Assign { name, value },
                span,
            });
        }

        self.binary_chain()
    }

    fn binary_chain(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.primary()?;

        while let TokenType::Operator(operator) = self.peek().token_type {
            if !is_binary(operator) {
                return Err(ParseError {
                    span: self.peek().span,
                    message: format!("Unsupported operator '{}'", operator.symbol()),
                });
            }
            let span = self.advance().span;
            let right = self.primary()?;
            expr = Expr {
                kind: ExprKind::Binary {
                    left: Box::new(expr),
                    operator,
                    right: Box::new(right),
                },
                span,
            };
        }

        Ok(expr)
    }

    fn primary(&mut self) -> Result<Expr, ParseError> {
        let token = self.peek().clone();
        let kind = match token.token_type {
            TokenType::Number(n) => {
                self.advance();
                ExprKind::Num(n)
            }
            TokenType::Str(s) => {
                self.advance();
                ExprKind::Str(s)
            }
            TokenType::Identifier => {
                self.advance();
                if self.check_delimiter(Delimiter::LeftParen) {
                    return self.call(token);
                }
                ExprKind::Variable(token.lexeme)
            }
            TokenType::Delimiter(Delimiter::LeftParen) => {
                self.advance();
                let inner = self.expression()?;
                self.consume_delimiter(Delimiter::RightParen, "')' after expression")?;
                ExprKind::Grouping(Box::new(inner))
            }
            TokenType::Operator(operator @ (Operator::Minus | Operator::Bang)) => {
                self.advance();
                let operand = self.primary()?;
                ExprKind::Unary {
                    operator,
                    operand: Box::new(operand),
                }
            }
            _ => return Err(self.error_expected("expression")),
        };

        Ok(Expr {
            kind,
            span: token.span,
        })
    }

    fn call(&mut self, callee: Token) -> Result<Expr, ParseError> {
        self.advance(); // consume '('
        let mut arguments = Vec::new();
        if !self.check_delimiter(Delimiter::RightParen) {
            arguments.push(self.expression()?);
            while self.check_delimiter(Delimiter::Comma) {
                self.advance();
                arguments.push(self.expression()?);
            }
        }
        self.consume_delimiter(Delimiter::RightParen, "')' after arguments")?;

        Ok(Expr {
            kind: ExprKind::Call {
                callee: callee.lexeme,
                arguments,
            },
            span: callee.span,
        })
    }
}

fn is_binary(operator: Operator) -> bool {
    matches!(
        operator,
        Operator::Plus
            | Operator::Minus
            | Operator::Star
            | Operator::Slash
            | Operator::Percent
            | Operator::Equal
            | Operator::NotEqual
            | Operator::Less
            | Operator::LessEqual
            | Operator::Greater
            | Operator::GreaterEqual
            | Operator::And
            | Operator::Or
    )
}

fn describe(token: &Token) -> String {
    match token.token_type {
        TokenType::Eof => "end of input".to_string(),
        TokenType::Newline => "newline".to_string(),
        _ => format!("'{}'", token.lexeme),
    }
}
