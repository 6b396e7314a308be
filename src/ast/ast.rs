use crate::Span;

use super::{
    expressions::{BinaryExpr, CallExpr, CastExpr, Literal, StructGetExpr, UnaryExpr},
    statements::{
        BlockStmt, FnDeclStmt, ForStmt, IfStmt, ReturnStmt, StructDeclStmt, StructSetStmt,
        VarDeclStmt, VarSetStmt,
    },
};

/// The root of a parsed compilation unit.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub statements: Vec<Stmt>,
}

impl Program {
    pub fn new(statements: Vec<Stmt>) -> Self {
        Program { statements }
    }
}

/// Statement kinds
///
/// The node set is closed, lowering matches on it exhaustively.
#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    FnDecl(FnDeclStmt),
    StructDecl(StructDeclStmt),
    VarDecl(VarDeclStmt),
    VarSet(VarSetStmt),
    StructSet(StructSetStmt),
    If(IfStmt),
    For(ForStmt),
    Break,
    Return(ReturnStmt),
    Block(BlockStmt),
    Expression(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

impl Stmt {
    pub fn new(kind: StmtKind, span: Span) -> Self {
        Stmt { kind, span }
    }
}

/// Expression kinds
#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    /// A reference to a named binding. Its type is resolved lazily through inference.
    Variable(String),
    Literal(Literal),
    Unary(UnaryExpr),
    Binary(BinaryExpr),
    Call(CallExpr),
    /// A parenthesised expression
    Group(Box<Expr>),
    Cast(CastExpr),
    StructGet(StructGetExpr),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Expr { kind, span }
    }
}
