use inkwell::{
    values::{BasicMetadataValueEnum, BasicValueEnum, FunctionValue, IntValue, PointerValue},
    AddressSpace, FloatPredicate, IntPredicate,
};

use crate::{
    ast::{
        ast::{Expr, ExprKind},
        expressions::{BinaryExpr, BinaryOperator, CallExpr, Literal, UnaryExpr, UnaryOperator},
        types::{TavType, TavValue, TypeKind},
    },
    errors::errors::{Error, ErrorImpl},
    inference::inference::{infer_type, join_inferred, struct_name},
    MK_COMPARE, MK_NUMERIC_OP,
};

use super::{
    compiler::{Compiler, Handle},
    runtime::check_format_arguments,
};

/// Generates LLVM IR for the given expression.
///
/// Struct-typed expressions evaluate to the address of their storage rather
/// than to a loaded aggregate; [`coerce`] loads them where a value is needed.
pub fn gen_expression<'a>(
    compiler: &mut Compiler<'a>,
    expression: &Expr,
) -> Result<BasicValueEnum<'a>, Error> {
    compiler.position = expression.span.start.clone();

    match &expression.kind {
        ExprKind::Variable(identifier) => {
            let symbol = compiler.lookup(identifier)?;
            match symbol.handle {
                Some(Handle::Storage(storage)) if symbol.tav_type.is_aggregate() => {
                    Ok(storage.into())
                }
                Some(Handle::Storage(storage)) => {
                    compiler.emit(compiler.builder.build_load(storage, identifier))
                }
                Some(Handle::Function(function)) => {
                    Ok(function.as_global_value().as_pointer_value().into())
                }
                Some(Handle::Struct(_)) | None => compiler.fail(ErrorImpl::NotAValue {
                    identifier: identifier.clone(),
                }),
            }
        }
        ExprKind::Literal(literal) => gen_literal(compiler, literal),
        ExprKind::Unary(unary) => gen_unary(compiler, unary),
        ExprKind::Binary(binary) => gen_binary(compiler, binary),
        ExprKind::Call(call) => match gen_call(compiler, call)? {
            Some(value) => Ok(value),
            None => compiler.fail(ErrorImpl::VoidValue),
        },
        ExprKind::Group(inner) => gen_expression(compiler, inner),
        ExprKind::Cast(cast) => {
            let source = infer_type(&cast.expr, &compiler.symbols)?;
            let value = gen_expression(compiler, &cast.expr)?;
            compiler.position = expression.span.start.clone();
            gen_cast(compiler, value, &source, &cast.tav_type)
        }
        ExprKind::StructGet(get) => {
            let (field, field_type) = gen_field_address(compiler, &get.object, &get.member)?;
            if get.address || field_type.is_aggregate() {
                Ok(field.into())
            } else {
                compiler.emit(compiler.builder.build_load(field, &get.member))
            }
        }
    }
}

/// Generates `expression` and converts it to `target`.
pub fn gen_coerced<'a>(
    compiler: &mut Compiler<'a>,
    expression: &Expr,
    target: &TavType,
) -> Result<BasicValueEnum<'a>, Error> {
    let source = infer_type(expression, &compiler.symbols)?;
    let value = gen_expression(compiler, expression)?;
    compiler.position = expression.span.start.clone();
    coerce(compiler, value, &source, target)
}

/// Converts a value of type `source` so it can be stored or returned as `target`.
///
/// Numeric values are cast between widths and kinds, struct addresses are
/// loaded. Anything that still doesn't fit is a `TypeMismatch`.
pub fn coerce<'a>(
    compiler: &mut Compiler<'a>,
    value: BasicValueEnum<'a>,
    source: &TavType,
    target: &TavType,
) -> Result<BasicValueEnum<'a>, Error> {
    let expected = compiler.basic_type(target)?;

    let value = if target.is_aggregate() && source.is_aggregate() && value.is_pointer_value() {
        compiler.emit(
            compiler
                .builder
                .build_load(value.into_pointer_value(), ""),
        )?
    } else if source != target && source.is_numeric() && target.is_numeric() {
        gen_cast(compiler, value, source, target)?
    } else if is_function_value(source) && is_function_value(target) && value.is_pointer_value() {
        // Function values share one variadic pointer type per return type
        compiler
            .emit(compiler.builder.build_pointer_cast(
                value.into_pointer_value(),
                expected.into_pointer_type(),
                "",
            ))?
            .into()
    } else {
        value
    };

    if value.get_type() != expected {
        return compiler.fail(ErrorImpl::TypeMismatch {
            expected: target.to_string(),
            received: source.to_string(),
        });
    }

    Ok(value)
}

fn is_function_value(tav_type: &TavType) -> bool {
    tav_type.indirection == 0 && tav_type.return_type().is_some()
}

fn gen_literal<'a>(compiler: &mut Compiler<'a>, literal: &Literal) -> Result<BasicValueEnum<'a>, Error> {
    let mismatch = || ErrorImpl::LiteralMismatch {
        expected: literal.tav_type.to_string(),
        value: literal.value.to_string(),
    };

    if !literal.value.matches(&literal.tav_type) {
        return compiler.fail(mismatch());
    }

    match &literal.value {
        TavValue::Int(value) => {
            let int_type = compiler.basic_type(&literal.tav_type)?.into_int_type();
            Ok(int_type.const_int(*value as u64, true).into())
        }
        TavValue::Float(value) => {
            let float_type = compiler.basic_type(&literal.tav_type)?.into_float_type();
            Ok(float_type.const_float(*value).into())
        }
        TavValue::Bool(value) => Ok(compiler
            .context
            .bool_type()
            .const_int(*value as u64, false)
            .into()),
        TavValue::String(value) => {
            // Copied into a stack buffer, so each evaluation yields a fresh mutable string
            let constant = compiler.context.const_string(value.as_bytes(), true);
            let buffer = compiler.build_entry_alloca(constant.get_type(), "str")?;
            compiler.emit(compiler.builder.build_store(buffer, constant))?;

            let byte_pointer = compiler.context.i8_type().ptr_type(AddressSpace::default());
            let first = compiler.emit(
                compiler
                    .builder
                    .build_pointer_cast(buffer, byte_pointer, ""),
            )?;
            Ok(first.into())
        }
    }
}

fn gen_unary<'a>(compiler: &mut Compiler<'a>, unary: &UnaryExpr) -> Result<BasicValueEnum<'a>, Error> {
    match unary.operator {
        UnaryOperator::AddressOf => gen_address(compiler, &unary.operand).map(Into::into),
        UnaryOperator::Deref => {
            let pointer_type = infer_type(&unary.operand, &compiler.symbols)?;
            let Some(pointee) = pointer_type.with_indirection(-1) else {
                return compiler.fail(ErrorImpl::CannotDereference {
                    type_: pointer_type.to_string(),
                });
            };

            let pointer = gen_expression(compiler, &unary.operand)?;
            let BasicValueEnum::PointerValue(pointer) = pointer else {
                return compiler.fail(ErrorImpl::CannotDereference {
                    type_: pointer_type.to_string(),
                });
            };

            if pointee.is_aggregate() {
                Ok(pointer.into())
            } else {
                compiler.emit(compiler.builder.build_load(pointer, ""))
            }
        }
    }
}

/// Generates the address `expression` lives at.
///
/// Named storage, fields and dereferenced pointers have one. Anything else is
/// first spilled to a fresh stack slot.
pub fn gen_address<'a>(compiler: &mut Compiler<'a>, expression: &Expr) -> Result<PointerValue<'a>, Error> {
    compiler.position = expression.span.start.clone();

    match &expression.kind {
        ExprKind::Variable(identifier) => {
            match compiler.lookup(identifier)?.handle {
                Some(Handle::Storage(storage)) => Ok(storage),
                Some(Handle::Function(function)) => Ok(function.as_global_value().as_pointer_value()),
                Some(Handle::Struct(_)) | None => compiler.fail(ErrorImpl::NotAValue {
                    identifier: identifier.clone(),
                }),
            }
        }
        ExprKind::StructGet(get) => {
            gen_field_address(compiler, &get.object, &get.member).map(|(field, _)| field)
        }
        ExprKind::Unary(UnaryExpr {
            operator: UnaryOperator::Deref,
            operand,
        }) => match gen_expression(compiler, operand)? {
            BasicValueEnum::PointerValue(pointer) => Ok(pointer),
            _ => {
                let operand_type = infer_type(operand, &compiler.symbols)?;
                compiler.fail(ErrorImpl::CannotDereference {
                    type_: operand_type.to_string(),
                })
            }
        },
        ExprKind::Group(inner) => gen_address(compiler, inner),
        _ => {
            let tav_type = infer_type(expression, &compiler.symbols)?;
            let value = gen_expression(compiler, expression)?;
            match value {
                BasicValueEnum::PointerValue(pointer) if tav_type.is_aggregate() => Ok(pointer),
                _ => spill(compiler, value),
            }
        }
    }
}

fn spill<'a>(compiler: &mut Compiler<'a>, value: BasicValueEnum<'a>) -> Result<PointerValue<'a>, Error> {
    let storage = compiler.build_entry_alloca(value.get_type(), "tmp")?;
    compiler.emit(compiler.builder.build_store(storage, value))?;
    Ok(storage)
}

/// Generates the address of `object.member` together with the member's type.
///
/// The object may be a struct value or a pointer to one.
pub fn gen_field_address<'a>(
    compiler: &mut Compiler<'a>,
    object: &Expr,
    member: &str,
) -> Result<(PointerValue<'a>, TavType), Error> {
    let position = object.span.start.clone();
    let object_type = infer_type(object, &compiler.symbols)?;
    let structure = struct_name(&object_type, &position)?;
    let (index, field_type) = {
        let (index, field) = compiler.symbols.field_offset(structure, member, &position)?;
        (index, field.tav_type.clone())
    };

    let base = match gen_expression(compiler, object)? {
        BasicValueEnum::PointerValue(pointer) => pointer,
        value => spill(compiler, value)?,
    };

    let field = compiler.emit(compiler.builder.build_struct_gep(base, index, member))?;
    Ok((field, field_type))
}

fn gen_binary<'a>(compiler: &mut Compiler<'a>, binary: &BinaryExpr) -> Result<BasicValueEnum<'a>, Error> {
    let position = compiler.position.clone();
    let left_type = infer_type(&binary.left, &compiler.symbols)?;
    let right_type = infer_type(&binary.right, &compiler.symbols)?;
    let joined = join_inferred(&left_type, &right_type, &position)?;

    let operator = binary.operator;
    let valid = if operator.is_logical() {
        joined.is_bool()
    } else if operator.is_comparison() {
        joined.is_numeric() || joined.is_bool()
    } else {
        joined.is_numeric()
    };
    if !valid || left_type.is_pointer() || right_type.is_pointer() {
        return compiler.fail(ErrorImpl::InvalidOperands {
            operator: operator.to_string(),
            left: left_type.to_string(),
            right: right_type.to_string(),
        });
    }

    let left = gen_expression(compiler, &binary.left)?;
    let left = coerce(compiler, left, &left_type, &joined)?;
    let right = gen_expression(compiler, &binary.right)?;
    let right = coerce(compiler, right, &right_type, &joined)?;
    compiler.position = position;

    let is_float = joined.is_float();
    match operator {
        BinaryOperator::Add => MK_NUMERIC_OP!(compiler, is_float, left, right, build_int_add, build_float_add),
        BinaryOperator::Sub => MK_NUMERIC_OP!(compiler, is_float, left, right, build_int_sub, build_float_sub),
        BinaryOperator::Mul => MK_NUMERIC_OP!(compiler, is_float, left, right, build_int_mul, build_float_mul),
        BinaryOperator::Div => {
            MK_NUMERIC_OP!(compiler, is_float, left, right, build_int_signed_div, build_float_div)
        }
        BinaryOperator::Mod => {
            MK_NUMERIC_OP!(compiler, is_float, left, right, build_int_signed_rem, build_float_rem)
        }
        BinaryOperator::Equals => MK_COMPARE!(compiler, is_float, left, right, EQ, OEQ),
        BinaryOperator::NotEquals => MK_COMPARE!(compiler, is_float, left, right, NE, ONE),
        BinaryOperator::Less => MK_COMPARE!(compiler, is_float, left, right, SLT, OLT),
        BinaryOperator::LessEquals => MK_COMPARE!(compiler, is_float, left, right, SLE, OLE),
        BinaryOperator::Greater => MK_COMPARE!(compiler, is_float, left, right, SGT, OGT),
        BinaryOperator::GreaterEquals => MK_COMPARE!(compiler, is_float, left, right, SGE, OGE),
        BinaryOperator::And => {
            let value = compiler
                .builder
                .build_and(left.into_int_value(), right.into_int_value(), "");
            compiler.emit(value).map(BasicValueEnum::from)
        }
        BinaryOperator::Or => {
            let value = compiler
                .builder
                .build_or(left.into_int_value(), right.into_int_value(), "");
            compiler.emit(value).map(BasicValueEnum::from)
        }
    }
}

/// Generates a call. Returns `None` when the callee returns void.
///
/// The callee is a declared function or a variable holding a function
/// value, which is called through the loaded pointer.
pub fn gen_call<'a>(
    compiler: &mut Compiler<'a>,
    call: &CallExpr,
) -> Result<Option<BasicValueEnum<'a>>, Error> {
    let mut callee = call.callee.as_ref();
    while let ExprKind::Group(inner) = &callee.kind {
        callee = inner;
    }

    let ExprKind::Variable(identifier) = &callee.kind else {
        let callee_type = infer_type(callee, &compiler.symbols)?;
        return compiler.fail(ErrorImpl::NotCallable {
            callee: callee_type.to_string(),
        });
    };

    let position = callee.span.start.clone();
    compiler.position = position.clone();
    let symbol = compiler.lookup(identifier)?;
    let callee_value = match symbol.handle {
        Some(Handle::Function(function)) => Callee::Direct(function),
        Some(Handle::Storage(storage)) if is_function_value(&symbol.tav_type) => {
            let pointer = compiler.emit(compiler.builder.build_load(storage, identifier))?;
            Callee::Indirect(pointer.into_pointer_value(), symbol.tav_type.clone())
        }
        _ => {
            return compiler.fail(ErrorImpl::NotCallable {
                callee: identifier.clone(),
            })
        }
    };

    check_format_arguments(compiler, identifier, &call.arguments, &position);

    let mut arguments: Vec<BasicMetadataValueEnum<'a>> = vec![];
    for argument in call.arguments.iter() {
        let argument_type = infer_type(argument, &compiler.symbols)?;
        let value = gen_expression(compiler, argument)?;
        // Struct arguments are passed by value
        let value = coerce(compiler, value, &argument_type, &argument_type)?;
        arguments.push(value.into());
    }

    compiler.position = position;
    let call_site = match callee_value {
        Callee::Direct(function) => {
            compiler.emit(compiler.builder.build_call(function, &arguments, ""))?
        }
        Callee::Indirect(pointer, tav_type) => {
            let return_type = tav_type.return_type().cloned().unwrap_or_else(TavType::void);
            let function_type = compiler.function_type(&return_type, &[], true)?;
            compiler.emit(compiler.builder.build_indirect_call(
                function_type,
                pointer,
                &arguments,
                "",
            ))?
        }
    };
    Ok(call_site.try_as_basic_value().left())
}

enum Callee<'a> {
    Direct(FunctionValue<'a>),
    /// A function pointer loaded from storage
    Indirect(PointerValue<'a>, TavType),
}

/// Generates a boolean condition.
///
/// Booleans are used as-is, other integers are compared against zero.
pub fn gen_condition<'a>(compiler: &mut Compiler<'a>, condition: &Expr) -> Result<IntValue<'a>, Error> {
    let condition_type = infer_type(condition, &compiler.symbols)?;
    let value = gen_expression(compiler, condition)?;

    match value {
        BasicValueEnum::IntValue(int) if condition_type.is_bool() => Ok(int),
        BasicValueEnum::IntValue(int) if condition_type.is_int() => compiler.emit(
            compiler.builder.build_int_compare(
                IntPredicate::NE,
                int,
                int.get_type().const_zero(),
                "",
            ),
        ),
        _ => compiler.fail(ErrorImpl::ConditionNotBoolean {
            type_: condition_type.to_string(),
        }),
    }
}

/// Converts `value` from `from` to `to`.
///
/// Integers are sign-extended or truncated, floats extended or truncated,
/// and the two convert into each other with signed semantics. Booleans
/// widen with zeros and integers narrow to a boolean by comparing against
/// zero. Pointers convert to other pointers and to and from integers.
pub fn gen_cast<'a>(
    compiler: &mut Compiler<'a>,
    value: BasicValueEnum<'a>,
    from: &TavType,
    to: &TavType,
) -> Result<BasicValueEnum<'a>, Error> {
    if from == to {
        return Ok(value);
    }

    let invalid = || ErrorImpl::InvalidCast {
        from: from.to_string(),
        to: to.to_string(),
    };
    let target = compiler.basic_type(to)?;

    if to.is_pointer() || to.kind == TypeKind::String {
        let pointer_type = target.into_pointer_type();
        let cast = match value {
            BasicValueEnum::PointerValue(pointer) => compiler.emit(
                compiler
                    .builder
                    .build_pointer_cast(pointer, pointer_type, ""),
            )?,
            BasicValueEnum::IntValue(int) if from.is_int() => compiler.emit(
                compiler
                    .builder
                    .build_int_to_ptr(int, pointer_type, ""),
            )?,
            _ => return compiler.fail(invalid()),
        };
        return Ok(cast.into());
    }

    let cast: BasicValueEnum<'a> = match value {
        BasicValueEnum::PointerValue(pointer) if to.is_int() => compiler
            .emit(
                compiler
                    .builder
                    .build_ptr_to_int(pointer, target.into_int_type(), ""),
            )?
            .into(),
        BasicValueEnum::IntValue(int) if from.is_bool() && to.is_int() => compiler
            .emit(
                compiler
                    .builder
                    .build_int_z_extend(int, target.into_int_type(), ""),
            )?
            .into(),
        BasicValueEnum::IntValue(int) if from.is_int() && to.is_bool() => compiler
            .emit(compiler.builder.build_int_compare(
                IntPredicate::NE,
                int,
                int.get_type().const_zero(),
                "",
            ))?
            .into(),
        BasicValueEnum::IntValue(int) if from.is_int() && to.is_int() => {
            let int_type = target.into_int_type();
            let (from_width, to_width) = (int.get_type().get_bit_width(), int_type.get_bit_width());
            if from_width < to_width {
                compiler
                    .emit(compiler.builder.build_int_s_extend(int, int_type, ""))?
                    .into()
            } else if from_width > to_width {
                compiler
                    .emit(compiler.builder.build_int_truncate(int, int_type, ""))?
                    .into()
            } else {
                int.into()
            }
        }
        BasicValueEnum::IntValue(int) if from.is_int() && to.is_float() => compiler
            .emit(
                compiler
                    .builder
                    .build_signed_int_to_float(int, target.into_float_type(), ""),
            )?
            .into(),
        BasicValueEnum::FloatValue(float) if to.is_float() => {
            let float_type = target.into_float_type();
            match (from.bit_width(), to.bit_width()) {
                (Some(from_width), Some(to_width)) if from_width < to_width => compiler
                    .emit(compiler.builder.build_float_ext(float, float_type, ""))?
                    .into(),
                (Some(from_width), Some(to_width)) if from_width > to_width => compiler
                    .emit(compiler.builder.build_float_trunc(float, float_type, ""))?
                    .into(),
                _ => float.into(),
            }
        }
        BasicValueEnum::FloatValue(float) if to.is_int() => compiler
            .emit(
                compiler
                    .builder
                    .build_float_to_signed_int(float, target.into_int_type(), ""),
            )?
            .into(),
        _ => return compiler.fail(invalid()),
    };

    Ok(cast)
}
