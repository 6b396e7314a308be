//! Utility macros for the code generator.
//!
//! This module defines helper macros used by the expression lowering:
//!
//! - `MK_NUMERIC_OP!` - Emits the integer or floating-point variant of an operation
//! - `MK_COMPARE!` - Emits an integer or floating-point comparison
//!
//! These macros reduce the boilerplate of dispatching on operand kinds.

/// Emits the integer or floating-point variant of an arithmetic instruction.
///
/// Evaluates to `Result<BasicValueEnum, Error>`.
///
/// # Arguments
///
/// * `$compiler` - The Compiler
/// * `$is_float` - Whether the operands are floating-point
/// * `$left`, `$right` - The operand values
/// * `$int_op` - Builder method for integer operands
/// * `$float_op` - Builder method for floating-point operands
///
/// # Example
///
/// ```ignore
/// let sum = MK_NUMERIC_OP!(compiler, is_float, left, right, build_int_add, build_float_add)?;
/// ```
#[macro_export]
macro_rules! MK_NUMERIC_OP {
    ($compiler:expr, $is_float:expr, $left:expr, $right:expr, $int_op:ident, $float_op:ident) => {
        if $is_float {
            let value = $compiler.builder.$float_op(
                $left.into_float_value(),
                $right.into_float_value(),
                "",
            );
            $compiler.emit(value).map(BasicValueEnum::from)
        } else {
            let value =
                $compiler
                    .builder
                    .$int_op($left.into_int_value(), $right.into_int_value(), "");
            $compiler.emit(value).map(BasicValueEnum::from)
        }
    };
}

/// Emits a comparison, signed predicates for integers and ordered ones for floats.
///
/// # Example
///
/// ```ignore
/// let less = MK_COMPARE!(compiler, is_float, left, right, SLT, OLT)?;
/// ```
#[macro_export]
macro_rules! MK_COMPARE {
    ($compiler:expr, $is_float:expr, $left:expr, $right:expr, $int_pred:ident, $float_pred:ident) => {
        if $is_float {
            let value = $compiler.builder.build_float_compare(
                FloatPredicate::$float_pred,
                $left.into_float_value(),
                $right.into_float_value(),
                "",
            );
            $compiler.emit(value).map(BasicValueEnum::from)
        } else {
            let value = $compiler.builder.build_int_compare(
                IntPredicate::$int_pred,
                $left.into_int_value(),
                $right.into_int_value(),
                "",
            );
            $compiler.emit(value).map(BasicValueEnum::from)
        }
    };
}
