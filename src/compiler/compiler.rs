//! Main compiler module.
//!
//! This module contains the Compiler structure that lowers a parsed program
//! into an LLVM module. It owns the generator state (block stack, current
//! function, break targets, symbol table) and the conversion from semantic
//! types to LLVM types.

use std::{path::PathBuf, rc::Rc};

use inkwell::{
    attributes::{Attribute, AttributeLoc},
    basic_block::BasicBlock,
    builder::{Builder, BuilderError},
    context::Context,
    module::{Linkage, Module},
    types::{BasicMetadataTypeEnum, BasicType, BasicTypeEnum, FunctionType, StructType},
    values::{FunctionValue, InstructionOpcode, PointerValue},
    AddressSpace,
};

use crate::{
    ast::{
        ast::Program,
        types::{TavType, TypeKind},
    },
    errors::{
        diagnostics::Diagnostics,
        errors::{Error, ErrorImpl},
    },
    symbols::symbols::{Scope, Symbol, SymbolTable},
    Position,
};

use super::{runtime::declare_runtime, stmt::gen_statement};

/// What a symbol refers to in the module being built.
///
/// These are plain LLVM handles: copying one never duplicates what it points at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Handle<'a> {
    /// Stack storage of a variable or spilled parameter
    Storage(PointerValue<'a>),
    Function(FunctionValue<'a>),
    Struct(StructType<'a>),
}

/// Per-function state saved while a nested function is lowered.
pub struct FunctionState<'a> {
    function: Option<FunctionValue<'a>>,
    return_type: Option<TavType>,
    break_targets: Vec<BasicBlock<'a>>,
    block_count: u32,
    function_scope: usize,
}

/// The main compiler structure that holds the state of one generation run.
///
/// # Type Parameters
///
/// * `'a` - Lifetime of the LLVM context
pub struct Compiler<'a> {
    /// Scoped bindings from identifiers to types and LLVM handles
    pub symbols: SymbolTable<Handle<'a>>,
    /// Active insertion blocks, one per open control construct
    pub blocks: Vec<BasicBlock<'a>>,
    /// The function currently being lowered
    pub current_function: Option<FunctionValue<'a>>,
    /// Declared return type of the current function
    pub return_type: Option<TavType>,
    /// End blocks of the enclosing loops, innermost last
    pub break_targets: Vec<BasicBlock<'a>>,
    /// Counter used to give blocks unique names within a function
    pub block_count: u32,
    /// Index of the outermost scope belonging to the current function
    pub function_scope: usize,
    /// Position of the node being lowered
    pub position: Position,
    /// Warnings raised so far
    pub diagnostics: Diagnostics,

    /// Reference to the LLVM context
    pub context: &'a Context,
    /// The LLVM module being built
    pub module: Module<'a>,
    /// The LLVM IR builder
    pub builder: Builder<'a>,
}

impl<'a> Compiler<'a> {
    /// Creates a new Compiler instance.
    ///
    /// # Arguments
    ///
    /// * `context` - Reference to the LLVM context
    /// * `file_name` - Name of the file being compiled (used for module naming)
    pub fn new(context: &'a Context, file_name: &str) -> Self {
        Compiler {
            symbols: SymbolTable::new(),
            blocks: vec![],
            current_function: None,
            return_type: None,
            break_targets: vec![],
            block_count: 0,
            function_scope: 0,
            position: Position(0, Rc::new(file_name.to_string())),
            diagnostics: Diagnostics::new(),
            module: context.create_module(file_name),
            builder: context.create_builder(),
            context,
        }
    }

    /// Lowers a whole program into the module.
    ///
    /// The runtime primitives are declared first so user code can call them
    /// like any other function.
    pub fn run(&mut self, program: &Program) -> Result<(), Error> {
        log::info!(
            "generating {} ({} top-level statements)",
            self.position.1,
            program.statements.len()
        );

        declare_runtime(self)?;

        for statement in program.statements.iter() {
            gen_statement(self, statement)?;
        }

        debug_assert_eq!(self.symbols.depth(), 1);
        debug_assert!(self.blocks.is_empty());
        Ok(())
    }

    /// Runs the LLVM verifier over the module.
    pub fn verify(&self) -> Result<(), Error> {
        self.module.verify().map_err(|message| {
            Error::new(
                ErrorImpl::BackendError {
                    message: message.to_string(),
                },
                self.position.clone(),
            )
        })
    }

    /// Returns the textual IR of the module.
    pub fn print_ir(&self) -> String {
        self.module.print_to_string().to_string()
    }

    /// Saves the current LLVM module to a file.
    ///
    /// # Arguments
    ///
    /// * `output_file` - Path where the module file should be written
    pub fn save_module_to_file(&self, output_file: PathBuf) -> Result<(), Error> {
        self.module.print_to_file(output_file).map_err(|message| {
            Error::new(
                ErrorImpl::BackendError {
                    message: message.to_string(),
                },
                self.position.clone(),
            )
        })
    }

    pub fn error(&self, error: ErrorImpl) -> Error {
        Error::new(error, self.position.clone())
    }

    pub fn fail<T>(&self, error: ErrorImpl) -> Result<T, Error> {
        Err(self.error(error))
    }

    /// Converts a builder failure into a critical error at the current position.
    pub fn emit<T>(&self, result: Result<T, BuilderError>) -> Result<T, Error> {
        result.map_err(|error| {
            self.error(ErrorImpl::BackendError {
                message: format!("{:?}", error),
            })
        })
    }

    /// Converts a semantic type to an LLVM type.
    ///
    /// Each level of indirection wraps the base type in a pointer. Void has
    /// no basic type and is returned as `None`; `any` degrades to void, and
    /// a pointer to void becomes `i8*`.
    pub fn convert_type(&self, tav_type: &TavType) -> Result<Option<BasicTypeEnum<'a>>, Error> {
        let base: Option<BasicTypeEnum<'a>> = match &tav_type.kind {
            TypeKind::Bool => Some(self.context.bool_type().into()),
            TypeKind::I8 => Some(self.context.i8_type().into()),
            TypeKind::I16 => Some(self.context.i16_type().into()),
            TypeKind::I32 => Some(self.context.i32_type().into()),
            TypeKind::I64 => Some(self.context.i64_type().into()),
            TypeKind::F32 => Some(self.context.f32_type().into()),
            TypeKind::F64 => Some(self.context.f64_type().into()),
            TypeKind::String => Some(
                self.context
                    .i8_type()
                    .ptr_type(AddressSpace::default())
                    .into(),
            ),
            TypeKind::Struct(name) => match self.symbols.get(name, &self.position)?.handle {
                Some(Handle::Struct(struct_type)) => Some(struct_type.into()),
                _ => {
                    return self.fail(ErrorImpl::NotAStruct {
                        type_: name.clone(),
                    })
                }
            },
            TypeKind::Function(return_type) => {
                let function_type = self.function_type(return_type, &[], true)?;
                Some(function_type.ptr_type(AddressSpace::default()).into())
            }
            TypeKind::Void => None,
            TypeKind::Any => {
                log::debug!("type `any` lowered as void");
                None
            }
        };

        let mut converted = match base {
            Some(base) => base,
            None if tav_type.indirection == 0 => return Ok(None),
            None => self.context.i8_type().into(),
        };
        for _ in 0..tav_type.indirection {
            converted = converted.ptr_type(AddressSpace::default()).into();
        }
        Ok(Some(converted))
    }

    /// Like [`Compiler::convert_type`], for places where void cannot appear.
    pub fn basic_type(&self, tav_type: &TavType) -> Result<BasicTypeEnum<'a>, Error> {
        match self.convert_type(tav_type)? {
            Some(converted) => Ok(converted),
            None => self.fail(ErrorImpl::VoidValue),
        }
    }

    pub fn function_type(
        &self,
        return_type: &TavType,
        params: &[BasicMetadataTypeEnum<'a>],
        is_variadic: bool,
    ) -> Result<FunctionType<'a>, Error> {
        Ok(match self.convert_type(return_type)? {
            Some(converted) => converted.fn_type(params, is_variadic),
            None => self.context.void_type().fn_type(params, is_variadic),
        })
    }

    /// Declares a function with external linkage.
    ///
    /// Adds the 'uwtable' and 'nounwind' attributes.
    pub fn create_function(&self, name: &str, function_type: FunctionType<'a>) -> FunctionValue<'a> {
        let function = self
            .module
            .add_function(name, function_type, Some(Linkage::External));

        let attributes = [
            self.context
                .create_enum_attribute(Attribute::get_named_enum_kind_id("uwtable"), 0),
            self.context
                .create_enum_attribute(Attribute::get_named_enum_kind_id("nounwind"), 0),
        ];

        for attribute in attributes.iter() {
            function.add_attribute(AttributeLoc::Function, *attribute);
        }

        function
    }

    /// Makes `function` current and hands back the state of the enclosing one.
    ///
    /// Must be called right after the function's body scope is pushed.
    pub fn enter_function(
        &mut self,
        function: FunctionValue<'a>,
        return_type: TavType,
    ) -> FunctionState<'a> {
        FunctionState {
            function: self.current_function.replace(function),
            return_type: self.return_type.replace(return_type),
            break_targets: std::mem::take(&mut self.break_targets),
            block_count: std::mem::replace(&mut self.block_count, 0),
            function_scope: std::mem::replace(
                &mut self.function_scope,
                self.symbols.depth().saturating_sub(1),
            ),
        }
    }

    pub fn leave_function(&mut self, outer: FunctionState<'a>) {
        self.current_function = outer.function;
        self.return_type = outer.return_type;
        self.break_targets = outer.break_targets;
        self.block_count = outer.block_count;
        self.function_scope = outer.function_scope;
    }

    /// Resolves `identifier` for use as a value of the current function.
    ///
    /// Stack storage bound in an enclosing function's scopes is not reachable
    /// from here and is rejected.
    pub fn lookup(&self, identifier: &str) -> Result<Symbol<Handle<'a>>, Error> {
        let symbol = self.symbols.get(identifier, &self.position)?.clone();

        let captured = matches!(symbol.handle, Some(Handle::Storage(_)))
            && self
                .symbols
                .scope_of(identifier)
                .map_or(false, |scope| scope < self.function_scope);
        if captured {
            return self.fail(ErrorImpl::CapturedVariable {
                identifier: identifier.to_string(),
            });
        }

        Ok(symbol)
    }

    /// Allocates stack storage in the entry block of the current function.
    ///
    /// Allocas are kept together at the top of `entry`, in declaration
    /// order, so storage declared inside a loop is reserved once per call.
    pub fn build_entry_alloca<T: BasicType<'a>>(
        &self,
        storage_type: T,
        name: &str,
    ) -> Result<PointerValue<'a>, Error> {
        let Some(entry) = self
            .current_function
            .and_then(|function| function.get_first_basic_block())
        else {
            return self.fail(ErrorImpl::StatementOutsideFunction);
        };

        let builder = self.context.create_builder();
        let mut instruction = entry.get_first_instruction();
        while let Some(current) = instruction {
            if current.get_opcode() != InstructionOpcode::Alloca {
                break;
            }
            instruction = current.get_next_instruction();
        }
        match instruction {
            Some(instruction) => builder.position_before(&instruction),
            None => builder.position_at_end(entry),
        }

        self.emit(builder.build_alloca(storage_type, name))
    }

    /// Returns a fresh suffix for the blocks of one control construct.
    pub fn next_block_id(&mut self) -> u32 {
        let id = self.block_count;
        self.block_count += 1;
        id
    }

    /// Appends a block to the current function.
    pub fn append_block(&self, name: &str) -> Result<BasicBlock<'a>, Error> {
        match self.current_function {
            Some(function) => Ok(self.context.append_basic_block(function, name)),
            None => self.fail(ErrorImpl::StatementOutsideFunction),
        }
    }

    /// The block instructions are currently emitted into.
    pub fn block(&self) -> Option<BasicBlock<'a>> {
        self.blocks.last().copied()
    }

    /// Whether the current block already ends in a branch or return.
    pub fn block_terminated(&self) -> bool {
        self.block()
            .map_or(false, |block| block.get_terminator().is_some())
    }

    pub fn push_block(&mut self, block: BasicBlock<'a>) {
        self.builder.position_at_end(block);
        self.blocks.push(block);
    }

    /// Pops the current block and resumes emission in the one beneath it.
    pub fn exit_block(&mut self) {
        self.blocks.pop();
        match self.block() {
            Some(block) => self.builder.position_at_end(block),
            None => self.builder.clear_insertion_position(),
        }
    }

    /// Continues the current construct in `block`, e.g. the end block of a branch.
    pub fn replace_block(&mut self, block: BasicBlock<'a>) {
        self.blocks.pop();
        self.push_block(block);
    }

    pub fn pop_scope(&mut self) -> Result<Scope<Handle<'a>>, Error> {
        match self.symbols.pop_scope() {
            Some(scope) => Ok(scope),
            None => self.fail(ErrorImpl::ScopeUnderflow),
        }
    }
}

/// Lowers a program into a new module.
///
/// This is the primary entry point for generation. Generation stops at the
/// first critical error; warnings are available on the returned compiler's
/// `diagnostics`.
///
/// # Arguments
///
/// * `program` - The parsed program
/// * `file_name` - Name of the file being compiled (for module naming)
/// * `context` - Reference to the LLVM context
pub fn generate<'a>(
    program: &Program,
    file_name: &str,
    context: &'a Context,
) -> Result<Compiler<'a>, Error> {
    let mut compiler = Compiler::new(context, file_name);

    compiler.run(program)?;

    Ok(compiler)
}
