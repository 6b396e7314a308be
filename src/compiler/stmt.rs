use inkwell::{basic_block::BasicBlock, types::BasicMetadataTypeEnum};

use crate::{
    ast::{
        ast::{ExprKind, Stmt, StmtKind},
        statements::{
            FnDeclStmt, ForStmt, IfStmt, ReturnStmt, StructDeclStmt, StructSetStmt, VarDeclStmt,
            VarSetStmt,
        },
        types::TavType,
    },
    errors::errors::{Error, ErrorImpl},
    inference::inference::infer_return,
};

use super::{
    compiler::{Compiler, Handle},
    expr::{coerce, gen_call, gen_coerced, gen_condition, gen_expression, gen_field_address},
};

pub fn gen_statement<'a>(compiler: &mut Compiler<'a>, statement: &Stmt) -> Result<(), Error> {
    compiler.position = statement.span.start.clone();

    match &statement.kind {
        StmtKind::FnDecl(declaration) => gen_function(compiler, declaration),
        StmtKind::StructDecl(declaration) => gen_struct(compiler, declaration),
        _ if compiler.block().is_none() => compiler.fail(ErrorImpl::StatementOutsideFunction),
        StmtKind::VarDecl(declaration) => gen_var_decl(compiler, declaration),
        StmtKind::VarSet(assignment) => gen_var_set(compiler, assignment),
        StmtKind::StructSet(assignment) => gen_struct_set(compiler, assignment),
        StmtKind::If(if_stmt) => gen_if(compiler, if_stmt),
        StmtKind::For(for_stmt) => gen_for(compiler, for_stmt),
        StmtKind::Break => match compiler.break_targets.last().copied() {
            Some(target) => {
                compiler.emit(compiler.builder.build_unconditional_branch(target))?;
                Ok(())
            }
            None => compiler.fail(ErrorImpl::BreakOutsideLoop),
        },
        StmtKind::Return(return_stmt) => gen_return(compiler, return_stmt),
        StmtKind::Block(block) => {
            compiler
                .symbols
                .new_scope(&format!("block_{}", compiler.symbols.depth()));
            gen_body(compiler, &block.body)?;
            compiler.pop_scope()?;
            Ok(())
        }
        StmtKind::Expression(expression) => match &expression.kind {
            ExprKind::Call(call) => gen_call(compiler, call).map(|_| ()),
            _ => gen_expression(compiler, expression).map(|_| ()),
        },
    }
}

/// Lowers a sequence of statements into the current block.
///
/// Once the block is terminated the remaining statements can never run: they
/// are reported once and skipped.
pub fn gen_body<'a>(compiler: &mut Compiler<'a>, body: &[Stmt]) -> Result<(), Error> {
    for (index, statement) in body.iter().enumerate() {
        if compiler.block_terminated() {
            compiler.diagnostics.warning(Error::new(
                ErrorImpl::UnreachableCode {
                    statements: body.len() - index,
                },
                statement.span.start.clone(),
            ));
            break;
        }
        gen_statement(compiler, statement)?;
    }

    Ok(())
}

fn gen_function<'a>(compiler: &mut Compiler<'a>, declaration: &FnDeclStmt) -> Result<(), Error> {
    let identifier = declaration.identifier.as_str();
    let position = compiler.position.clone();

    if compiler.symbols.contains_local(identifier) {
        return compiler.fail(ErrorImpl::SymbolAlreadyDeclared {
            identifier: identifier.to_string(),
        });
    }

    log::debug!(
        "lowering function {} ({} params)",
        identifier,
        declaration.params.len()
    );

    compiler
        .symbols
        .new_scope(&format!("{}_body", identifier));

    let mut param_types: Vec<BasicMetadataTypeEnum<'a>> = vec![];
    for param in declaration.params.iter() {
        param_types.push(compiler.basic_type(&param.tav_type)?.into());
    }

    let function_type = compiler.function_type(&declaration.return_type, &param_types, false)?;
    let function = compiler.create_function(identifier, function_type);

    let outer = compiler.enter_function(function, declaration.return_type.clone());
    let entry = compiler.context.append_basic_block(function, "entry");
    compiler.push_block(entry);

    // Parameters are spilled so they can be reassigned and addressed like locals
    for (param, value) in declaration.params.iter().zip(function.get_params()) {
        value.set_name(&param.identifier);

        let storage = compiler.build_entry_alloca(value.get_type(), &param.identifier)?;
        compiler.emit(compiler.builder.build_store(storage, value))?;

        compiler.symbols.add(
            &param.identifier,
            param.tav_type.clone(),
            Some(Handle::Storage(storage)),
            &compiler.position,
        )?;
    }

    gen_body(compiler, &declaration.body)?;

    if let Some(block) = compiler.block() {
        if block.get_terminator().is_none() {
            if function_type.get_return_type().is_none() {
                compiler.emit(compiler.builder.build_return(None))?;
            } else if block != entry && block.get_first_use().is_none() {
                // Every branch above returned, nothing jumps here
                compiler.emit(compiler.builder.build_unreachable())?;
            } else {
                compiler.position = position;
                return compiler.fail(ErrorImpl::MissingReturn {
                    function: identifier.to_string(),
                });
            }
        }
    }

    compiler.exit_block();
    compiler.leave_function(outer);
    compiler.pop_scope()?;

    compiler.position = position;
    compiler.symbols.add(
        identifier,
        TavType::function(declaration.return_type.clone()),
        Some(Handle::Function(function)),
        &compiler.position,
    )
}

fn gen_struct<'a>(compiler: &mut Compiler<'a>, declaration: &StructDeclStmt) -> Result<(), Error> {
    let identifier = declaration.identifier.as_str();

    compiler
        .symbols
        .new_scope(&format!("{}_members", identifier));
    for field in declaration.fields.iter() {
        if field.tav_type == TavType::structure(identifier) {
            return compiler.fail(ErrorImpl::RecursiveStruct {
                structure: identifier.to_string(),
            });
        }
        compiler
            .symbols
            .add(&field.identifier, field.tav_type.clone(), None, &compiler.position)?;
    }
    let members = compiler.pop_scope()?;

    if compiler.symbols.contains_local(identifier) {
        return compiler.fail(ErrorImpl::SymbolAlreadyDeclared {
            identifier: identifier.to_string(),
        });
    }

    // Registered before the body is set so fields may point back at the struct
    let struct_type = compiler.context.opaque_struct_type(identifier);
    compiler.symbols.add(
        identifier,
        TavType::structure(identifier),
        Some(Handle::Struct(struct_type)),
        &compiler.position,
    )?;

    let mut field_types = vec![];
    for field in declaration.fields.iter() {
        field_types.push(compiler.basic_type(&field.tav_type)?);
    }
    struct_type.set_body(&field_types, declaration.packed);

    log::debug!(
        "declared struct {} with {} fields",
        identifier,
        field_types.len()
    );

    compiler.symbols.add_members(identifier, members);
    Ok(())
}

fn gen_var_decl<'a>(compiler: &mut Compiler<'a>, declaration: &VarDeclStmt) -> Result<(), Error> {
    let storage_type = compiler.basic_type(&declaration.tav_type)?;
    let storage = compiler.build_entry_alloca(storage_type, &declaration.identifier)?;

    if let Some(assignment) = &declaration.assignment {
        let value = gen_coerced(compiler, assignment, &declaration.tav_type)?;
        compiler.emit(compiler.builder.build_store(storage, value))?;
    }

    compiler.symbols.add(
        &declaration.identifier,
        declaration.tav_type.clone(),
        Some(Handle::Storage(storage)),
        &compiler.position,
    )
}

fn gen_var_set<'a>(compiler: &mut Compiler<'a>, assignment: &VarSetStmt) -> Result<(), Error> {
    let symbol = compiler.lookup(&assignment.identifier)?;

    let Some(Handle::Storage(storage)) = symbol.handle else {
        return compiler.fail(ErrorImpl::NotAssignable {
            identifier: assignment.identifier.clone(),
        });
    };

    let value = gen_coerced(compiler, &assignment.value, &symbol.tav_type)?;
    compiler.emit(compiler.builder.build_store(storage, value))?;
    Ok(())
}

fn gen_struct_set<'a>(compiler: &mut Compiler<'a>, assignment: &StructSetStmt) -> Result<(), Error> {
    let (field, field_type) = gen_field_address(compiler, &assignment.object, &assignment.member)?;

    let value = gen_coerced(compiler, &assignment.value, &field_type)?;
    compiler.emit(compiler.builder.build_store(field, value))?;
    Ok(())
}

/// Lowers one arm of a conditional into `block`, falling through to `end`.
fn gen_branch<'a>(
    compiler: &mut Compiler<'a>,
    block: BasicBlock<'a>,
    body: &[Stmt],
    end: BasicBlock<'a>,
) -> Result<(), Error> {
    compiler.push_block(block);
    compiler
        .symbols
        .new_scope(&block.get_name().to_string_lossy());

    gen_body(compiler, body)?;

    compiler.pop_scope()?;
    if !compiler.block_terminated() {
        compiler.emit(compiler.builder.build_unconditional_branch(end))?;
    }
    compiler.exit_block();
    Ok(())
}

fn gen_if<'a>(compiler: &mut Compiler<'a>, if_stmt: &IfStmt) -> Result<(), Error> {
    let id = compiler.next_block_id();

    let if_body = compiler.append_block(&format!("if_body_{}", id))?;
    let mut elif_blocks = vec![];
    for index in 0..if_stmt.elif_branches.len() {
        let condition = compiler.append_block(&format!("elif_cond_{}_{}", index, id))?;
        let body = compiler.append_block(&format!("elif_body_{}_{}", index, id))?;
        elif_blocks.push((condition, body));
    }
    let else_body = match if_stmt.else_body {
        Some(_) => Some(compiler.append_block(&format!("else_body_{}", id))?),
        None => None,
    };
    let end = compiler.append_block(&format!("if_end_{}", id))?;

    // Where control goes when the condition guarding arm `index` fails
    let next_target = |index: usize| {
        elif_blocks
            .get(index)
            .map(|(condition, _)| *condition)
            .or(else_body)
            .unwrap_or(end)
    };

    let condition = gen_condition(compiler, &if_stmt.if_branch.condition)?;
    compiler.emit(
        compiler
            .builder
            .build_conditional_branch(condition, if_body, next_target(0)),
    )?;
    gen_branch(compiler, if_body, &if_stmt.if_branch.body, end)?;

    for (index, branch) in if_stmt.elif_branches.iter().enumerate() {
        let (condition_block, body_block) = elif_blocks[index];

        compiler.push_block(condition_block);
        let condition = gen_condition(compiler, &branch.condition)?;
        compiler.emit(compiler.builder.build_conditional_branch(
            condition,
            body_block,
            next_target(index + 1),
        ))?;
        compiler.exit_block();

        gen_branch(compiler, body_block, &branch.body, end)?;
    }

    if let (Some(block), Some(body)) = (else_body, &if_stmt.else_body) {
        gen_branch(compiler, block, body, end)?;
    }

    compiler.replace_block(end);
    Ok(())
}

fn gen_for<'a>(compiler: &mut Compiler<'a>, for_stmt: &ForStmt) -> Result<(), Error> {
    let id = compiler.next_block_id();

    let condition_block = compiler.append_block(&format!("for_cond_{}", id))?;
    let body = compiler.append_block(&format!("for_body_{}", id))?;
    let end = compiler.append_block(&format!("for_end_{}", id))?;

    compiler.emit(compiler.builder.build_unconditional_branch(condition_block))?;

    compiler.push_block(condition_block);
    let condition = gen_condition(compiler, &for_stmt.condition)?;
    compiler.emit(
        compiler
            .builder
            .build_conditional_branch(condition, body, end),
    )?;
    compiler.exit_block();

    compiler.break_targets.push(end);
    compiler.push_block(body);
    compiler.symbols.new_scope(&format!("for_body_{}", id));

    gen_body(compiler, &for_stmt.body)?;

    compiler.pop_scope()?;
    if !compiler.block_terminated() {
        compiler.emit(compiler.builder.build_unconditional_branch(condition_block))?;
    }
    compiler.exit_block();
    compiler.break_targets.pop();

    compiler.replace_block(end);
    Ok(())
}

fn gen_return<'a>(compiler: &mut Compiler<'a>, return_stmt: &ReturnStmt) -> Result<(), Error> {
    let Some(return_type) = compiler.return_type.clone() else {
        return compiler.fail(ErrorImpl::StatementOutsideFunction);
    };
    let returns_void = compiler.convert_type(&return_type)?.is_none();
    let received = infer_return(return_stmt, &compiler.symbols)?;

    match &return_stmt.value {
        Some(value) if !returns_void => {
            let value = gen_expression(compiler, value)?;
            let value = coerce(compiler, value, &received, &return_type)?;
            compiler.emit(compiler.builder.build_return(Some(&value)))?;
        }
        None if returns_void => {
            compiler.emit(compiler.builder.build_return(None))?;
        }
        _ => {
            return compiler.fail(ErrorImpl::TypeMismatch {
                expected: return_type.to_string(),
                received: received.to_string(),
            })
        }
    }

    Ok(())
}
