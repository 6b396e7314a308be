/// AST (Abstract Syntax Tree) module
/// Contains the node set handed over by the parser
///
/// Submodules:
/// - ast: Program root and the statement/expression sum types
/// - expressions: Payloads of the expression kinds
/// - statements: Payloads of the statement kinds
/// - types: Semantic types and literal values
pub mod ast;
pub mod expressions;
pub mod statements;
pub mod types;
