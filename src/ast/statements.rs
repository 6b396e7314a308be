use super::{
    ast::{Expr, Stmt},
    types::TavType,
};

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub identifier: String,
    pub tav_type: TavType,
}

/// `fn identifier(params) -> return_type { body }`
#[derive(Debug, Clone, PartialEq)]
pub struct FnDeclStmt {
    pub identifier: String,
    pub params: Vec<Param>,
    pub return_type: TavType,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub identifier: String,
    pub tav_type: TavType,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructDeclStmt {
    pub identifier: String,
    pub fields: Vec<Field>,
    pub packed: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VarDeclStmt {
    pub identifier: String,
    pub tav_type: TavType,
    pub assignment: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VarSetStmt {
    pub identifier: String,
    pub value: Expr,
}

/// `object.member = value`
#[derive(Debug, Clone, PartialEq)]
pub struct StructSetStmt {
    pub object: Expr,
    pub member: String,
    pub value: Expr,
}

/// A condition together with the statements it guards.
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionalBranch {
    pub condition: Expr,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfStmt {
    pub if_branch: ConditionalBranch,
    pub elif_branches: Vec<ConditionalBranch>,
    pub else_body: Option<Vec<Stmt>>,
}

/// `for condition { body }`
#[derive(Debug, Clone, PartialEq)]
pub struct ForStmt {
    pub condition: Expr,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReturnStmt {
    pub value: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BlockStmt {
    pub body: Vec<Stmt>,
}
