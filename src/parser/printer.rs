//! Renders an AST back to canonical source text.
//!
//! Output re-parses to the same tree: one statement per line, four-space indentation, `否则`
//! kept on the closing-brace line, binary chains written flat.

use crate::keywords::{default_keywords, spelling_of, Keywords};
use crate::parser::ast::{Block, ElseBranch, Expr, ExprKind, IfStmt, Program, Stmt, StmtKind};
use crate::scanner::token::Keyword;
use std::fmt;

const INDENT: &str = "    ";

pub struct Printer<'k> {
    keywords: &'k Keywords,
    out: String,
    depth: usize,
}

impl<'k> Printer<'k> {
    pub fn new(keywords: &'k Keywords) -> Self {
        Self {
            keywords,
            out: String::new(),
            depth: 0,
        }
    }

    pub fn print_program(mut self, program: &Program) -> String {
        for stmt in &program.statements {
            self.statement(stmt);
        }
        self.out
    }

    fn keyword(&self, keyword: Keyword) -> &str {
        spelling_of(self.keywords, keyword).unwrap_or(match keyword {
            Keyword::Variable => "变量",
            Keyword::Constant => "常量",
            Keyword::If => "如果",
            Keyword::Else => "否则",
            Keyword::Loop => "循环",
            Keyword::Function => "函数",
            Keyword::Return => "返回",
            Keyword::Print => "输出",
        })
    }

    fn line(&mut self, text: &str) {
        for _ in 0..self.depth {
            self.out.push_str(INDENT);
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn statement(&mut self, stmt: &Stmt) {
        match &stmt.kind {
            StmtKind::Expression(expr) => {
                let text = format!("{};", expression(expr));
                self.line(&text);
            }
            StmtKind::Print(expr) => {
                let text = format!("{} {};", self.keyword(Keyword::Print), expression(expr));
                self.line(&text);
            }
            StmtKind::Return(value) => {
                let text = match value {
                    Some(expr) => format!("{} {};", self.keyword(Keyword::Return), expression(expr)),
                    None => format!("{};", self.keyword(Keyword::Return)),
                };
                self.line(&text);
            }
            StmtKind::VarDecl {
                name,
                initializer,
                is_constant,
            } => {
                let keyword = if *is_constant {
                    Keyword::Constant
                } else {
                    Keyword::Variable
                };
                let text = format!(
                    "{} {} = {};",
                    self.keyword(keyword),
                    name,
                    expression(initializer)
                );
                self.line(&text);
            }
            StmtKind::Block(block) => {
                self.line("{");
                self.block_body(block);
                self.line("}");
            }
            StmtKind::If(if_stmt) => {
                let header = self.if_header(if_stmt);
                self.line(&header);
                self.if_rest(if_stmt);
            }
            StmtKind::Loop { condition, body } => {
                let text = format!("{} ({}) {{", self.keyword(Keyword::Loop), expression(condition));
                self.line(&text);
                self.block_body(body);
                self.line("}");
            }
            StmtKind::Function { name, params, body } => {
                let text = format!(
                    "{} {}({}) {{",
                    self.keyword(Keyword::Function),
                    name,
                    params.join(", ")
                );
                self.line(&text);
                self.block_body(body);
                self.line("}");
            }
        }
    }

    fn if_header(&self, if_stmt: &IfStmt) -> String {
        format!(
            "{} ({}) {{",
            self.keyword(Keyword::If),
            expression(&if_stmt.condition)
        )
    }

    // then-branch body, then the else chain with each `否则` on its closing-brace line
    fn if_rest(&mut self, if_stmt: &IfStmt) {
        self.block_body(&if_stmt.then_branch);

        let else_word = self.keyword(Keyword::Else).to_string();
        match &if_stmt.else_branch {
            None => self.line("}"),
            Some(ElseBranch::If(next)) => {
                let text = format!("}} {} {}", else_word, self.if_header(next));
                self.line(&text);
                self.if_rest(next);
            }
            Some(ElseBranch::Block(block)) => {
                let text = format!("}} {} {{", else_word);
                self.line(&text);
                self.block_body(block);
                self.line("}");
            }
        }
    }

    fn block_body(&mut self, block: &Block) {
        self.depth += 1;
        for stmt in &block.statements {
            self.statement(stmt);
        }
        self.depth -= 1;
    }
}

/// Single-line source form of an expression.
pub fn expression(expr: &Expr) -> String {
    match &expr.kind {
        ExprKind::Num(n) => n.to_string(),
        ExprKind::Str(s) => format!("\"{}\"", s),
        ExprKind::Variable(name) => name.clone(),
        ExprKind::Grouping(inner) => format!("({})", expression(inner)),
        ExprKind::Call { callee, arguments } => {
            let args: Vec<String> = arguments.iter().map(expression).collect();
            format!("{}({})", callee, args.join(", "))
        }
        ExprKind::Binary {
            left,
            operator,
            right,
        } => {
            // the right operand of a chain is always a primary
            let right = match right.kind {
                ExprKind::Binary { .. } | ExprKind::Assign { .. } => {
                    format!("({})", expression(right))
                }
                _ => expression(right),
            };
            let left = match left.kind {
                ExprKind::Assign { .. } => format!("({})", expression(left)),
                _ => expression(left),
            };
            format!("{} {} {}", left, operator.symbol(), right)
        }
        ExprKind::Unary { operator, operand } => {
            format!("{}{}", operator.symbol(), expression(operand))
        }
        ExprKind::Assign { name, value } => format!("{} = {}", name, expression(value)),
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keywords = default_keywords();
        f.write_str(&Printer::new(&keywords).print_program(self))
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&expression(self))
    }
}
