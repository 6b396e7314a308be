//! Runtime primitives.
//!
//! Generated modules print through the C library. The primitives are
//! declared in every module before user code is lowered and bound in the
//! root scope, so they resolve and type-check like user functions.

use inkwell::{module::Linkage, types::BasicMetadataTypeEnum};
use lazy_static::lazy_static;
use regex::Regex;

use crate::{
    ast::{
        ast::{Expr, ExprKind},
        types::{TavType, TavValue, TypeKind},
    },
    errors::errors::{Error, ErrorImpl},
    Position,
};

use super::compiler::{Compiler, Handle};

/// An external function every module can call.
pub struct RuntimePrimitive {
    pub name: &'static str,
    pub params: Vec<TavType>,
    pub is_variadic: bool,
    pub return_type: TavType,
}

lazy_static! {
    pub static ref RUNTIME_PRIMITIVES: Vec<RuntimePrimitive> = vec![
        // i32 printf(i8* format, ...)
        RuntimePrimitive {
            name: "printf",
            params: vec![TavType::new(TypeKind::String)],
            is_variadic: true,
            return_type: TavType::new(TypeKind::I32),
        },
        // i32 puts(i8* s)
        RuntimePrimitive {
            name: "puts",
            params: vec![TavType::new(TypeKind::String)],
            is_variadic: false,
            return_type: TavType::new(TypeKind::I32),
        },
    ];

    /// A printf conversion specification, flags through conversion character.
    static ref FORMAT_SPECIFIER: Regex =
        Regex::new(r"%(?:%|[-+ #0]*(?:\d+|\*)?(?:\.(?:\d+|\*)?)?(?:hh|h|ll|l|z|j|t|L)?[diouxXeEfFgGaAcsp])")
            .unwrap();
}

/// Declares the runtime primitives and binds them in the root scope.
pub fn declare_runtime(compiler: &mut Compiler) -> Result<(), Error> {
    for primitive in RUNTIME_PRIMITIVES.iter() {
        let mut param_types: Vec<BasicMetadataTypeEnum> = vec![];
        for param in primitive.params.iter() {
            param_types.push(compiler.basic_type(param)?.into());
        }

        let function_type =
            compiler.function_type(&primitive.return_type, &param_types, primitive.is_variadic)?;
        let function = compiler
            .module
            .add_function(primitive.name, function_type, Some(Linkage::External));

        compiler.symbols.add(
            primitive.name,
            TavType::function(primitive.return_type.clone()),
            Some(Handle::Function(function)),
            &compiler.position,
        )?;
    }

    log::trace!("declared {} runtime primitives", RUNTIME_PRIMITIVES.len());
    Ok(())
}

/// Number of arguments a printf format string consumes. `%%` takes none.
pub fn format_argument_count(format: &str) -> usize {
    FORMAT_SPECIFIER
        .find_iter(format)
        .filter(|specifier| specifier.as_str() != "%%")
        .map(|specifier| 1 + specifier.as_str().matches('*').count())
        .sum()
}

/// Warns when a `printf` call with a literal format receives the wrong number of arguments.
pub fn check_format_arguments(
    compiler: &mut Compiler,
    callee: &str,
    arguments: &[Expr],
    position: &Position,
) {
    if callee != "printf" {
        return;
    }

    let Some(ExprKind::Literal(literal)) = arguments.first().map(|format| &format.kind) else {
        return;
    };
    let TavValue::String(format) = &literal.value else {
        return;
    };

    let expected = format_argument_count(format);
    let received = arguments.len() - 1;
    if expected != received {
        compiler.diagnostics.warning(Error::new(
            ErrorImpl::FormatArguments { expected, received },
            position.clone(),
        ));
    }
}
