use crate::{
    ast::{
        ast::{Expr, ExprKind},
        expressions::UnaryOperator,
        statements::ReturnStmt,
        types::{TavType, TypeKind},
    },
    errors::errors::{Error, ErrorImpl},
    symbols::symbols::SymbolTable,
    Position,
};

/// Infers the semantic type of an expression.
///
/// Variable references are resolved through `symbols`, every other kind is
/// derived from its operands.
pub fn infer_type<H>(expression: &Expr, symbols: &SymbolTable<H>) -> Result<TavType, Error> {
    let position = &expression.span.start;

    match &expression.kind {
        ExprKind::Variable(identifier) => Ok(symbols.get(identifier, position)?.tav_type.clone()),
        ExprKind::Literal(literal) => Ok(literal.tav_type.clone()),
        ExprKind::Unary(unary) => {
            let operand = infer_type(&unary.operand, symbols)?;
            match unary.operator {
                UnaryOperator::AddressOf => operand.with_indirection(1).ok_or_else(|| {
                    Error::new(
                        ErrorImpl::TypeMismatch {
                            expected: String::from("an addressable value"),
                            received: operand.to_string(),
                        },
                        position.clone(),
                    )
                }),
                UnaryOperator::Deref => operand.with_indirection(-1).ok_or_else(|| {
                    Error::new(
                        ErrorImpl::CannotDereference {
                            type_: operand.to_string(),
                        },
                        position.clone(),
                    )
                }),
            }
        }
        ExprKind::Binary(binary) => {
            let joined = join_inferred(
                &infer_type(&binary.left, symbols)?,
                &infer_type(&binary.right, symbols)?,
                position,
            )?;
            if binary.operator.is_comparison() || binary.operator.is_logical() {
                Ok(TavType::new(TypeKind::Bool))
            } else {
                Ok(joined)
            }
        }
        ExprKind::Call(call) => {
            let callee = infer_type(&call.callee, symbols)?;
            match callee.return_type() {
                Some(return_type) if callee.indirection == 0 => Ok(return_type.clone()),
                _ => Err(Error::new(
                    ErrorImpl::NotCallable {
                        callee: callee.to_string(),
                    },
                    position.clone(),
                )),
            }
        }
        ExprKind::Group(inner) => infer_type(inner, symbols),
        ExprKind::Cast(cast) => Ok(cast.tav_type.clone()),
        ExprKind::StructGet(get) => {
            let object = infer_type(&get.object, symbols)?;
            let structure = struct_name(&object, position)?;
            let (_, field) = symbols.field_offset(structure, &get.member, position)?;
            if get.address {
                field.tav_type.with_indirection(1).ok_or_else(|| {
                    Error::new(
                        ErrorImpl::TypeMismatch {
                            expected: String::from("an addressable value"),
                            received: field.tav_type.to_string(),
                        },
                        position.clone(),
                    )
                })
            } else {
                Ok(field.tav_type.clone())
            }
        }
    }
}

/// The type a return statement yields: its operand's, or void when bare.
pub fn infer_return<H>(statement: &ReturnStmt, symbols: &SymbolTable<H>) -> Result<TavType, Error> {
    match &statement.value {
        Some(value) => infer_type(value, symbols),
        None => Ok(TavType::void()),
    }
}

/// Resolves the type of a binary operation from its operand types.
///
/// Equal kinds join to themselves. Two integers or two floats take the left
/// operand's kind, mixing an integer with a float gives the float.
pub fn join_inferred(
    left: &TavType,
    right: &TavType,
    current_position: &Position,
) -> Result<TavType, Error> {
    if left.kind == right.kind {
        return Ok(left.clone());
    }

    if left.is_int() && right.is_int() {
        Ok(left.clone())
    } else if left.is_float() && right.is_float() {
        Ok(left.clone())
    } else if left.is_float() && right.is_int() {
        Ok(left.clone())
    } else if left.is_int() && right.is_float() {
        Ok(right.clone())
    } else {
        Err(Error::new(
            ErrorImpl::TypesCannotBeJoined {
                left: left.to_string(),
                right: right.to_string(),
            },
            current_position.clone(),
        ))
    }
}

/// Name of the struct an expression of type `tav_type` gives access to.
///
/// Both a struct value and a single pointer to one qualify.
pub fn struct_name<'t>(tav_type: &'t TavType, current_position: &Position) -> Result<&'t str, Error> {
    match &tav_type.kind {
        TypeKind::Struct(name) if tav_type.indirection <= 1 => Ok(name),
        _ => Err(Error::new(
            ErrorImpl::NotAStruct {
                type_: tav_type.to_string(),
            },
            current_position.clone(),
        )),
    }
}
