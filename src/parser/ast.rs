use crate::scanner::token::Operator;
use crate::span::Span;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub statements: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

/// Statements of a braced body, in order. Shared by `Rc` when it is a function body so the
/// function table can hold it without cloning the tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub statements: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    Expression(Expr),
    VarDecl {
        name: String,
        initializer: Expr,
        is_constant: bool,
    },
    Block(Block),
    If(IfStmt),
    Loop {
        condition: Expr,
        body: Block,
    },
    Function {
        name: String,
        params: Vec<String>,
        body: Rc<Block>,
    },
    Return(Option<Expr>),
    Print(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfStmt {
    pub condition: Expr,
    pub then_branch: Block,
    pub else_branch: Option<ElseBranch>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ElseBranch {
    // `否则 如果 (...) { ... }`
    If(Box<IfStmt>),
    Block(Block),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    // Primary Expressions
    Num(f64),
    Str(String),
    Variable(String),
    Grouping(Box<Expr>),
    Call {
        callee: String,
        arguments: Vec<Expr>,
    },

    // Operator Expressions
    Binary {
        left: Box<Expr>,
        operator: Operator,
        right: Box<Expr>,
    },
    Unary {
        operator: Operator,
        operand: Box<Expr>,
    },
    Assign {
        name: String,
        value: Box<Expr>,
    },
}
