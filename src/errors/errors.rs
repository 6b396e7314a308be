use std::fmt::Display;

use thiserror::Error;

use crate::Position;

/// How a report affects generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Logged, generation continues.
    Warning,
    /// Generation halts at the first one.
    Critical,
}

#[derive(Debug, Clone)]
pub struct Error {
    internal_error: ErrorImpl,
    position: Position,
}

impl Error {
    pub fn new(error_impl: ErrorImpl, position: Position) -> Self {
        Error {
            internal_error: error_impl,
            position,
        }
    }

    pub fn get_position(&self) -> &Position {
        &self.position
    }

    pub fn get_internal_error(&self) -> &ErrorImpl {
        &self.internal_error
    }

    pub fn get_severity(&self) -> Severity {
        self.internal_error.severity()
    }

    pub fn get_error_name(&self) -> &str {
        match &self.internal_error {
            ErrorImpl::SymbolAlreadyDeclared { .. } => "SymbolAlreadyDeclared",
            ErrorImpl::SymbolNotFound { .. } => "SymbolNotFound",
            ErrorImpl::TypesCannotBeJoined { .. } => "TypesCannotBeJoined",
            ErrorImpl::NotCallable { .. } => "NotCallable",
            ErrorImpl::CannotDereference { .. } => "CannotDereference",
            ErrorImpl::NotAStruct { .. } => "NotAStruct",
            ErrorImpl::UnknownField { .. } => "UnknownField",
            ErrorImpl::RecursiveStruct { .. } => "RecursiveStruct",
            ErrorImpl::NotAValue { .. } => "NotAValue",
            ErrorImpl::NotAssignable { .. } => "NotAssignable",
            ErrorImpl::CapturedVariable { .. } => "CapturedVariable",
            ErrorImpl::VoidValue => "VoidValue",
            ErrorImpl::TypeMismatch { .. } => "TypeMismatch",
            ErrorImpl::InvalidCast { .. } => "InvalidCast",
            ErrorImpl::InvalidOperands { .. } => "InvalidOperands",
            ErrorImpl::ConditionNotBoolean { .. } => "ConditionNotBoolean",
            ErrorImpl::LiteralMismatch { .. } => "LiteralMismatch",
            ErrorImpl::BreakOutsideLoop => "BreakOutsideLoop",
            ErrorImpl::MissingReturn { .. } => "MissingReturn",
            ErrorImpl::StatementOutsideFunction => "StatementOutsideFunction",
            ErrorImpl::ScopeUnderflow => "ScopeUnderflow",
            ErrorImpl::BackendError { .. } => "BackendError",
            ErrorImpl::UnreachableCode { .. } => "UnreachableCode",
            ErrorImpl::FormatArguments { .. } => "FormatArguments",
        }
    }

    pub fn get_tip(&self) -> ErrorTip {
        match &self.internal_error {
            ErrorImpl::SymbolAlreadyDeclared { identifier } => ErrorTip::Suggestion(format!(
                "`{}` is already declared in this scope",
                identifier
            )),
            ErrorImpl::SymbolNotFound { identifier } => ErrorTip::Suggestion(format!(
                "`{}` is not declared, declarations must come before their use",
                identifier
            )),
            ErrorImpl::TypesCannotBeJoined { left, right } => ErrorTip::Suggestion(format!(
                "`{}` and `{}` cannot be combined, add a cast",
                left, right
            )),
            ErrorImpl::NotCallable { callee } => {
                ErrorTip::Suggestion(format!("`{}` is not a function", callee))
            }
            ErrorImpl::CannotDereference { type_ } => {
                ErrorTip::Suggestion(format!("`{}` is not a pointer", type_))
            }
            ErrorImpl::NotAStruct { type_ } => {
                ErrorTip::Suggestion(format!("`{}` has no fields", type_))
            }
            ErrorImpl::UnknownField { structure, field } => ErrorTip::Suggestion(format!(
                "struct `{}` has no field `{}`",
                structure, field
            )),
            ErrorImpl::RecursiveStruct { structure } => ErrorTip::Suggestion(format!(
                "struct `{}` contains itself, use a pointer field instead",
                structure
            )),
            ErrorImpl::NotAValue { identifier } => {
                ErrorTip::Suggestion(format!("`{}` names a type, not a value", identifier))
            }
            ErrorImpl::NotAssignable { identifier } => {
                ErrorTip::Suggestion(format!("`{}` cannot be assigned to", identifier))
            }
            ErrorImpl::CapturedVariable { identifier } => ErrorTip::Suggestion(format!(
                "`{}` belongs to an enclosing function, pass it as a parameter instead",
                identifier
            )),
            ErrorImpl::VoidValue => ErrorTip::Suggestion(String::from(
                "this call returns nothing and cannot be used as a value",
            )),
            ErrorImpl::TypeMismatch { expected, received } => ErrorTip::Suggestion(format!(
                "Expected type `{}`, received `{}`",
                expected, received
            )),
            ErrorImpl::InvalidCast { from, to } => {
                ErrorTip::Suggestion(format!("`{}` cannot be cast to `{}`", from, to))
            }
            ErrorImpl::InvalidOperands {
                operator,
                left,
                right,
            } => ErrorTip::Suggestion(format!(
                "`{}` is not defined for `{}` and `{}`",
                operator, left, right
            )),
            ErrorImpl::ConditionNotBoolean { type_ } => ErrorTip::Suggestion(format!(
                "conditions must be `bool` or an integer, found `{}`",
                type_
            )),
            ErrorImpl::LiteralMismatch { expected, value } => ErrorTip::Suggestion(format!(
                "literal {} cannot have type `{}`",
                value, expected
            )),
            ErrorImpl::BreakOutsideLoop => {
                ErrorTip::Suggestion(String::from("`break` can only be used inside a loop"))
            }
            ErrorImpl::MissingReturn { function } => ErrorTip::Suggestion(format!(
                "function `{}` can reach its end without returning a value",
                function
            )),
            ErrorImpl::StatementOutsideFunction => ErrorTip::Suggestion(String::from(
                "only functions and structs can be declared at the top level",
            )),
            ErrorImpl::ScopeUnderflow => ErrorTip::None,
            ErrorImpl::BackendError { .. } => ErrorTip::None,
            ErrorImpl::UnreachableCode { statements } => ErrorTip::Suggestion(format!(
                "{} statement(s) after this point are never executed",
                statements
            )),
            ErrorImpl::FormatArguments { expected, received } => ErrorTip::Suggestion(format!(
                "format string expects {} argument(s), received {}",
                expected, received
            )),
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} at {}", self.internal_error, self.position)
    }
}

impl std::error::Error for Error {}

pub enum ErrorTip {
    None,
    Suggestion(String),
}

impl Display for ErrorTip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorTip::None => write!(f, ""),
            ErrorTip::Suggestion(suggestion) => write!(f, "{}", suggestion),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ErrorImpl {
    #[error("symbol {identifier:?} already declared in this scope")]
    SymbolAlreadyDeclared { identifier: String },
    #[error("symbol {identifier:?} not found")]
    SymbolNotFound { identifier: String },
    #[error("types cannot be joined: {left} and {right}")]
    TypesCannotBeJoined { left: String, right: String },
    #[error("{callee:?} is not callable")]
    NotCallable { callee: String },
    #[error("cannot dereference {type_}")]
    CannotDereference { type_: String },
    #[error("{type_} is not a struct")]
    NotAStruct { type_: String },
    #[error("struct {structure:?} has no field {field:?}")]
    UnknownField { structure: String, field: String },
    #[error("struct {structure:?} contains itself by value")]
    RecursiveStruct { structure: String },
    #[error("{identifier:?} is not a value")]
    NotAValue { identifier: String },
    #[error("{identifier:?} is not assignable")]
    NotAssignable { identifier: String },
    #[error("{identifier:?} is a local of an enclosing function")]
    CapturedVariable { identifier: String },
    #[error("void value used as an operand")]
    VoidValue,
    #[error("types do not match: expected {expected:?}, received {received:?}")]
    TypeMismatch { expected: String, received: String },
    #[error("invalid cast from {from} to {to}")]
    InvalidCast { from: String, to: String },
    #[error("invalid operands for {operator}: {left} and {right}")]
    InvalidOperands {
        operator: String,
        left: String,
        right: String,
    },
    #[error("condition of type {type_} is not boolean")]
    ConditionNotBoolean { type_: String },
    #[error("literal {value} does not match type {expected}")]
    LiteralMismatch { expected: String, value: String },
    #[error("break outside of a loop")]
    BreakOutsideLoop,
    #[error("function {function:?} is missing a return")]
    MissingReturn { function: String },
    #[error("statement outside of a function")]
    StatementOutsideFunction,
    #[error("attempted to pop the root scope")]
    ScopeUnderflow,
    #[error("backend error: {message}")]
    BackendError { message: String },
    #[error("{statements} unreachable statement(s)")]
    UnreachableCode { statements: usize },
    #[error("format string expects {expected} argument(s), received {received}")]
    FormatArguments { expected: usize, received: usize },
}

impl ErrorImpl {
    pub fn severity(&self) -> Severity {
        match self {
            ErrorImpl::UnreachableCode { .. } | ErrorImpl::FormatArguments { .. } => {
                Severity::Warning
            }
            _ => Severity::Critical,
        }
    }
}
