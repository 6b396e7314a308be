//! Integration tests for end-to-end generation.
//!
//! These tests build programs directly as ASTs, lower them with `generate`
//! and inspect the resulting LLVM module.

use inkwell::{
    context::Context,
    values::{AnyValue, InstructionOpcode},
};
use tav::{
    ast::{
        ast::{Expr, ExprKind, Program, Stmt, StmtKind},
        expressions::{
            BinaryExpr, BinaryOperator, CallExpr, CastExpr, Literal, StructGetExpr, UnaryExpr,
            UnaryOperator,
        },
        statements::{
            ConditionalBranch, Field, FnDeclStmt, ForStmt, IfStmt, Param, ReturnStmt,
            StructDeclStmt, StructSetStmt, VarDeclStmt, VarSetStmt,
        },
        types::{TavType, TavValue, TypeKind},
    },
    compiler::compiler::Compiler,
    errors::errors::Error,
    generate, Span,
};

fn ty(kind: TypeKind) -> TavType {
    TavType::new(kind)
}

fn stmt(kind: StmtKind) -> Stmt {
    Stmt::new(kind, Span::null())
}

fn expr(kind: ExprKind) -> Expr {
    Expr::new(kind, Span::null())
}

fn literal(tav_type: TavType, value: TavValue) -> Expr {
    expr(ExprKind::Literal(Literal { tav_type, value }))
}

fn int(value: i64) -> Expr {
    literal(ty(TypeKind::I32), TavValue::Int(value))
}

fn boolean(value: bool) -> Expr {
    literal(ty(TypeKind::Bool), TavValue::Bool(value))
}

fn string(value: &str) -> Expr {
    literal(ty(TypeKind::String), TavValue::String(value.to_string()))
}

fn var(name: &str) -> Expr {
    expr(ExprKind::Variable(name.to_string()))
}

fn binary(operator: BinaryOperator, left: Expr, right: Expr) -> Expr {
    expr(ExprKind::Binary(BinaryExpr {
        operator,
        left: Box::new(left),
        right: Box::new(right),
    }))
}

fn call(callee: &str, arguments: Vec<Expr>) -> Expr {
    expr(ExprKind::Call(CallExpr {
        callee: Box::new(var(callee)),
        arguments,
    }))
}

fn function(name: &str, params: Vec<(&str, TavType)>, return_type: TavType, body: Vec<Stmt>) -> Stmt {
    stmt(StmtKind::FnDecl(FnDeclStmt {
        identifier: name.to_string(),
        params: params
            .into_iter()
            .map(|(identifier, tav_type)| Param {
                identifier: identifier.to_string(),
                tav_type,
            })
            .collect(),
        return_type,
        body,
    }))
}

fn point_struct() -> Stmt {
    stmt(StmtKind::StructDecl(StructDeclStmt {
        identifier: "Point".to_string(),
        fields: vec![
            Field {
                identifier: "x".to_string(),
                tav_type: ty(TypeKind::I32),
            },
            Field {
                identifier: "y".to_string(),
                tav_type: ty(TypeKind::I32),
            },
        ],
        packed: false,
    }))
}

fn let_var(name: &str, tav_type: TavType, assignment: Option<Expr>) -> Stmt {
    stmt(StmtKind::VarDecl(VarDeclStmt {
        identifier: name.to_string(),
        tav_type,
        assignment,
    }))
}

fn ret(value: Option<Expr>) -> Stmt {
    stmt(StmtKind::Return(ReturnStmt { value }))
}

fn branch(condition: Expr, body: Vec<Stmt>) -> ConditionalBranch {
    ConditionalBranch { condition, body }
}

fn compile<'a>(context: &'a Context, statements: Vec<Stmt>) -> Compiler<'a> {
    generate(&Program::new(statements), "test.tav", context).unwrap()
}

fn compile_error(statements: Vec<Stmt>) -> Error {
    let context = Context::create();
    let error = match generate(&Program::new(statements), "test.tav", &context) {
        Ok(_) => panic!("generation should have failed"),
        Err(error) => error,
    };
    error
}

fn block_opcodes(compiler: &Compiler, function: &str, block: &str) -> Vec<InstructionOpcode> {
    let block = compiler
        .module
        .get_function(function)
        .unwrap()
        .get_basic_blocks()
        .into_iter()
        .find(|candidate| candidate.get_name().to_str() == Ok(block))
        .unwrap();

    let mut opcodes = vec![];
    let mut instruction = block.get_first_instruction();
    while let Some(current) = instruction {
        opcodes.push(current.get_opcode());
        instruction = current.get_next_instruction();
    }
    opcodes
}

fn block_names(compiler: &Compiler, function: &str) -> Vec<String> {
    compiler
        .module
        .get_function(function)
        .unwrap()
        .get_basic_blocks()
        .iter()
        .map(|block| block.get_name().to_str().unwrap().to_string())
        .collect()
}

#[test]
fn test_return_constant_sum() {
    let context = Context::create();
    let compiler = compile(
        &context,
        vec![function(
            "main",
            vec![],
            ty(TypeKind::I32),
            vec![ret(Some(binary(BinaryOperator::Add, int(41), int(1))))],
        )],
    );

    let main = compiler.module.get_function("main").unwrap();
    assert_eq!(main.count_basic_blocks(), 1);
    assert!(main.print_to_string().to_string().contains("ret i32 42"));

    let defined = compiler
        .module
        .get_functions()
        .filter(|function| function.count_basic_blocks() > 0)
        .count();
    assert_eq!(defined, 1);

    assert_eq!(compiler.symbols.depth(), 1);
    assert!(compiler.verify().is_ok());
}

#[test]
fn test_struct_layout() {
    let context = Context::create();
    let compiler = compile(&context, vec![point_struct()]);

    let point = compiler.module.get_struct_type("Point").unwrap();
    assert_eq!(point.count_fields(), 2);
    assert!(!point.is_packed());
    for field in point.get_field_types() {
        assert_eq!(field, context.i32_type().into());
    }
}

#[test]
fn test_self_referencing_struct() {
    let context = Context::create();
    let compiler = compile(
        &context,
        vec![stmt(StmtKind::StructDecl(StructDeclStmt {
            identifier: "Node".to_string(),
            fields: vec![
                Field {
                    identifier: "value".to_string(),
                    tav_type: ty(TypeKind::I64),
                },
                Field {
                    identifier: "next".to_string(),
                    tav_type: TavType::pointer(TypeKind::Struct("Node".to_string()), 1),
                },
            ],
            packed: true,
        }))],
    );

    let node = compiler.module.get_struct_type("Node").unwrap();
    assert!(node.is_packed());
    assert!(node.get_field_type_at_index(1).unwrap().is_pointer_type());

    let error = compile_error(vec![stmt(StmtKind::StructDecl(StructDeclStmt {
        identifier: "Bad".to_string(),
        fields: vec![Field {
            identifier: "inner".to_string(),
            tav_type: TavType::structure("Bad"),
        }],
        packed: false,
    }))]);
    assert_eq!(error.get_error_name(), "RecursiveStruct");
}

#[test]
fn test_if_else_blocks() {
    let context = Context::create();
    let compiler = compile(
        &context,
        vec![function(
            "choose",
            vec![("flag", ty(TypeKind::Bool))],
            ty(TypeKind::I32),
            vec![stmt(StmtKind::If(IfStmt {
                if_branch: branch(var("flag"), vec![ret(Some(int(1)))]),
                elif_branches: vec![],
                else_body: Some(vec![ret(Some(int(2)))]),
            }))],
        )],
    );

    assert_eq!(
        block_names(&compiler, "choose"),
        vec!["entry", "if_body_0", "else_body_0", "if_end_0"]
    );

    let choose = compiler.module.get_function("choose").unwrap();
    assert!(choose
        .print_to_string()
        .to_string()
        .contains("label %if_body_0, label %else_body_0"));
    assert!(compiler.verify().is_ok());
}

#[test]
fn test_elif_chain_blocks() {
    let context = Context::create();
    let equals = |value| binary(BinaryOperator::Equals, var("x"), int(value));
    let compiler = compile(
        &context,
        vec![function(
            "classify",
            vec![("x", ty(TypeKind::I32))],
            ty(TypeKind::I32),
            vec![stmt(StmtKind::If(IfStmt {
                if_branch: branch(equals(0), vec![ret(Some(int(0)))]),
                elif_branches: vec![
                    branch(equals(1), vec![ret(Some(int(1)))]),
                    branch(equals(2), vec![ret(Some(int(2)))]),
                ],
                else_body: Some(vec![ret(Some(int(3)))]),
            }))],
        )],
    );

    assert_eq!(
        block_names(&compiler, "classify"),
        vec![
            "entry",
            "if_body_0",
            "elif_cond_0_0",
            "elif_body_0_0",
            "elif_cond_1_0",
            "elif_body_1_0",
            "else_body_0",
            "if_end_0",
        ]
    );
    assert!(compiler.verify().is_ok());
}

#[test]
fn test_parameters_keep_count_and_order() {
    let context = Context::create();
    let compiler = compile(
        &context,
        vec![function(
            "mix",
            vec![
                ("a", ty(TypeKind::I32)),
                ("b", ty(TypeKind::I64)),
                ("c", ty(TypeKind::F32)),
            ],
            TavType::void(),
            vec![],
        )],
    );

    let mix = compiler.module.get_function("mix").unwrap();
    assert_eq!(mix.count_params(), 3);

    let params = mix.get_params();
    assert_eq!(params[0].get_type(), context.i32_type().into());
    assert_eq!(params[1].get_type(), context.i64_type().into());
    assert_eq!(params[2].get_type(), context.f32_type().into());
    assert!(mix.print_to_string().to_string().contains("ret void"));
}

#[test]
fn test_return_is_coerced_to_declared_width() {
    let context = Context::create();
    let compiler = compile(
        &context,
        vec![function(
            "small",
            vec![],
            ty(TypeKind::I8),
            vec![ret(Some(int(7)))],
        )],
    );

    let small = compiler.module.get_function("small").unwrap();
    assert!(small.print_to_string().to_string().contains("ret i8 7"));
}

#[test]
fn test_duplicate_variable() {
    let error = compile_error(vec![function(
        "main",
        vec![],
        TavType::void(),
        vec![
            let_var("x", ty(TypeKind::I32), Some(int(1))),
            let_var("x", ty(TypeKind::I32), Some(int(2))),
        ],
    )]);
    assert_eq!(error.get_error_name(), "SymbolAlreadyDeclared");
}

#[test]
fn test_nested_loops_break_to_their_own_end() {
    let context = Context::create();
    let inner = stmt(StmtKind::For(ForStmt {
        condition: boolean(true),
        body: vec![stmt(StmtKind::Break)],
    }));
    let increment = stmt(StmtKind::VarSet(VarSetStmt {
        identifier: "i".to_string(),
        value: binary(BinaryOperator::Add, var("i"), int(1)),
    }));
    let compiler = compile(
        &context,
        vec![function(
            "main",
            vec![],
            TavType::void(),
            vec![
                let_var("i", ty(TypeKind::I32), Some(int(0))),
                stmt(StmtKind::For(ForStmt {
                    condition: binary(BinaryOperator::Less, var("i"), int(10)),
                    body: vec![inner, increment],
                })),
            ],
        )],
    );

    let main = compiler.module.get_function("main").unwrap();
    let inner_body = main
        .get_basic_blocks()
        .into_iter()
        .find(|block| block.get_name().to_str() == Ok("for_body_1"))
        .unwrap();
    let terminator = inner_body.get_terminator().unwrap();
    assert!(terminator
        .print_to_string()
        .to_string()
        .contains("br label %for_end_1"));
    assert!(compiler.verify().is_ok());
}

#[test]
fn test_break_outside_loop() {
    let error = compile_error(vec![function(
        "main",
        vec![],
        TavType::void(),
        vec![stmt(StmtKind::Break)],
    )]);
    assert_eq!(error.get_error_name(), "BreakOutsideLoop");
}

#[test]
fn test_struct_field_set_and_get() {
    let context = Context::create();
    let get_y = expr(ExprKind::StructGet(StructGetExpr {
        object: Box::new(var("p")),
        member: "y".to_string(),
        address: false,
    }));
    let compiler = compile(
        &context,
        vec![
            point_struct(),
            function(
                "main",
                vec![],
                ty(TypeKind::I32),
                vec![
                    let_var("p", TavType::structure("Point"), None),
                    stmt(StmtKind::StructSet(StructSetStmt {
                        object: var("p"),
                        member: "y".to_string(),
                        value: int(5),
                    })),
                    ret(Some(get_y)),
                ],
            ),
        ],
    );

    let ir = compiler.print_ir();
    assert!(ir.contains("i32 0, i32 1"));
    assert!(!ir.contains("i32 0, i32 0"));
    assert!(compiler.verify().is_ok());
}

#[test]
fn test_address_of_and_deref() {
    let context = Context::create();
    let address = expr(ExprKind::Unary(UnaryExpr {
        operator: UnaryOperator::AddressOf,
        operand: Box::new(var("x")),
    }));
    let deref = expr(ExprKind::Unary(UnaryExpr {
        operator: UnaryOperator::Deref,
        operand: Box::new(var("p")),
    }));
    let compiler = compile(
        &context,
        vec![function(
            "main",
            vec![],
            ty(TypeKind::I32),
            vec![
                let_var("x", ty(TypeKind::I32), Some(int(1))),
                let_var("p", TavType::pointer(TypeKind::I32, 1), Some(address)),
                ret(Some(deref)),
            ],
        )],
    );

    let ir = compiler.print_ir();
    assert!(ir.contains("store i32* %x, i32** %p"));
    assert!(compiler.verify().is_ok());
}

#[test]
fn test_string_literal_is_copied_to_stack() {
    let context = Context::create();
    let compiler = compile(
        &context,
        vec![function(
            "main",
            vec![],
            TavType::void(),
            vec![stmt(StmtKind::Expression(call("puts", vec![string("hi")])))],
        )],
    );

    let ir = compiler.print_ir();
    assert!(ir.contains("alloca [3 x i8]"));
    assert!(ir.contains("call i32 @puts"));
    assert!(compiler.verify().is_ok());
}

#[test]
fn test_casts() {
    let context = Context::create();
    let cast = |tav_type, value| {
        expr(ExprKind::Cast(CastExpr {
            tav_type,
            expr: Box::new(value),
        }))
    };
    let compiler = compile(
        &context,
        vec![
            function(
                "widen",
                vec![("v", ty(TypeKind::I8))],
                ty(TypeKind::I64),
                vec![ret(Some(cast(ty(TypeKind::I64), var("v"))))],
            ),
            function(
                "to_float",
                vec![("v", ty(TypeKind::I32))],
                ty(TypeKind::F64),
                vec![ret(Some(cast(ty(TypeKind::F64), var("v"))))],
            ),
            function(
                "truthy",
                vec![("v", ty(TypeKind::I16))],
                ty(TypeKind::Bool),
                vec![ret(Some(cast(ty(TypeKind::Bool), var("v"))))],
            ),
        ],
    );

    let ir = compiler.print_ir();
    assert!(ir.contains("sext i8"));
    assert!(ir.contains("sitofp i32"));
    assert!(ir.contains("icmp ne i16"));
    assert!(compiler.verify().is_ok());

    let error = compile_error(vec![function(
        "main",
        vec![],
        TavType::void(),
        vec![stmt(StmtKind::Expression(cast(
            ty(TypeKind::F32),
            boolean(true),
        )))],
    )]);
    assert_eq!(error.get_error_name(), "InvalidCast");
}

#[test]
fn test_warnings_are_collected() {
    let context = Context::create();
    let compiler = compile(
        &context,
        vec![function(
            "main",
            vec![],
            ty(TypeKind::I32),
            vec![
                stmt(StmtKind::Expression(call(
                    "printf",
                    vec![string("%d and %d\n"), int(1)],
                ))),
                ret(Some(int(0))),
                let_var("late", ty(TypeKind::I32), Some(int(2))),
            ],
        )],
    );

    let names: Vec<&str> = compiler
        .diagnostics
        .warnings()
        .iter()
        .map(|warning| warning.get_error_name())
        .collect();
    assert_eq!(names, vec!["FormatArguments", "UnreachableCode"]);
    assert!(compiler.verify().is_ok());
}

#[test]
fn test_call_before_declaration() {
    let error = compile_error(vec![
        function(
            "main",
            vec![],
            ty(TypeKind::I32),
            vec![ret(Some(call("later", vec![])))],
        ),
        function("later", vec![], ty(TypeKind::I32), vec![ret(Some(int(1)))]),
    ]);
    assert_eq!(error.get_error_name(), "SymbolNotFound");
}

#[test]
fn test_missing_return() {
    let error = compile_error(vec![function(
        "main",
        vec![],
        ty(TypeKind::I32),
        vec![let_var("x", ty(TypeKind::I32), Some(int(1)))],
    )]);
    assert_eq!(error.get_error_name(), "MissingReturn");
}

#[test]
fn test_statement_outside_function() {
    let error = compile_error(vec![let_var("x", ty(TypeKind::I32), Some(int(1)))]);
    assert_eq!(error.get_error_name(), "StatementOutsideFunction");
}

#[test]
fn test_nested_function() {
    let context = Context::create();
    let compiler = compile(
        &context,
        vec![function(
            "outer",
            vec![],
            ty(TypeKind::I32),
            vec![
                function("inner", vec![], ty(TypeKind::I32), vec![ret(Some(int(2)))]),
                ret(Some(call("inner", vec![]))),
            ],
        )],
    );

    assert_eq!(block_names(&compiler, "outer"), vec!["entry"]);
    assert_eq!(block_names(&compiler, "inner"), vec!["entry"]);
    assert!(compiler.symbols.get("inner", &compiler.position).is_err());
    assert!(compiler.verify().is_ok());
}

#[test]
fn test_condition_must_be_boolean() {
    let error = compile_error(vec![function(
        "main",
        vec![],
        TavType::void(),
        vec![stmt(StmtKind::If(IfStmt {
            if_branch: branch(string("yes"), vec![]),
            elif_branches: vec![],
            else_body: None,
        }))],
    )]);
    assert_eq!(error.get_error_name(), "ConditionNotBoolean");
}

#[test]
fn test_return_i8_literal() {
    let context = Context::create();
    let compiler = compile(
        &context,
        vec![function(
            "small",
            vec![],
            ty(TypeKind::I8),
            vec![ret(Some(literal(ty(TypeKind::I8), TavValue::Int(7))))],
        )],
    );

    let small = compiler.module.get_function("small").unwrap();
    assert!(small.print_to_string().to_string().contains("ret i8 7"));
    assert!(compiler.verify().is_ok());
}

#[test]
fn test_elif_chain_without_else_falls_through_to_end() {
    let context = Context::create();
    let equals = |value| binary(BinaryOperator::Equals, var("x"), int(value));
    let compiler = compile(
        &context,
        vec![function(
            "classify",
            vec![("x", ty(TypeKind::I32))],
            ty(TypeKind::I32),
            vec![
                stmt(StmtKind::If(IfStmt {
                    if_branch: branch(equals(0), vec![ret(Some(int(0)))]),
                    elif_branches: vec![
                        branch(equals(1), vec![ret(Some(int(1)))]),
                        branch(equals(2), vec![ret(Some(int(2)))]),
                    ],
                    else_body: None,
                })),
                ret(Some(int(3))),
            ],
        )],
    );

    assert_eq!(
        block_names(&compiler, "classify"),
        vec![
            "entry",
            "if_body_0",
            "elif_cond_0_0",
            "elif_body_0_0",
            "elif_cond_1_0",
            "elif_body_1_0",
            "if_end_0",
        ]
    );

    let classify = compiler.module.get_function("classify").unwrap();
    let last_condition = classify
        .get_basic_blocks()
        .into_iter()
        .find(|block| block.get_name().to_str() == Ok("elif_cond_1_0"))
        .unwrap();
    let terminator = last_condition
        .get_terminator()
        .unwrap()
        .print_to_string()
        .to_string();
    assert!(terminator.contains("label %elif_body_1_0"));
    assert!(terminator.contains("label %if_end_0"));
    assert!(compiler.verify().is_ok());
}

#[test]
fn test_struct_argument_is_passed_by_value() {
    let context = Context::create();
    let get_x = expr(ExprKind::StructGet(StructGetExpr {
        object: Box::new(var("p")),
        member: "x".to_string(),
        address: false,
    }));
    let compiler = compile(
        &context,
        vec![
            point_struct(),
            function(
                "take",
                vec![("p", TavType::structure("Point"))],
                ty(TypeKind::I32),
                vec![ret(Some(get_x))],
            ),
            function(
                "main",
                vec![],
                ty(TypeKind::I32),
                vec![
                    let_var("q", TavType::structure("Point"), None),
                    stmt(StmtKind::StructSet(StructSetStmt {
                        object: var("q"),
                        member: "x".to_string(),
                        value: int(4),
                    })),
                    ret(Some(call("take", vec![var("q")]))),
                ],
            ),
        ],
    );

    let main = compiler.module.get_function("main").unwrap();
    let ir = main.print_to_string().to_string();
    assert!(ir.contains("load %Point, %Point* %q"));
    assert!(ir.contains("call i32 @take(%Point %"));
    assert!(compiler.verify().is_ok());
}

#[test]
fn test_nested_function_cannot_read_enclosing_locals() {
    let error = compile_error(vec![function(
        "outer",
        vec![],
        ty(TypeKind::I32),
        vec![
            let_var("x", ty(TypeKind::I32), Some(int(1))),
            function("inner", vec![], ty(TypeKind::I32), vec![ret(Some(var("x")))]),
            ret(Some(call("inner", vec![]))),
        ],
    )]);
    assert_eq!(error.get_error_name(), "CapturedVariable");
}

#[test]
fn test_nested_function_cannot_assign_enclosing_locals() {
    let error = compile_error(vec![function(
        "outer",
        vec![("x", ty(TypeKind::I32))],
        TavType::void(),
        vec![function(
            "inner",
            vec![],
            TavType::void(),
            vec![stmt(StmtKind::VarSet(VarSetStmt {
                identifier: "x".to_string(),
                value: int(2),
            }))],
        )],
    )]);
    assert_eq!(error.get_error_name(), "CapturedVariable");
}

#[test]
fn test_loop_body_allocas_are_hoisted_to_entry() {
    let context = Context::create();
    let increment = stmt(StmtKind::VarSet(VarSetStmt {
        identifier: "i".to_string(),
        value: binary(BinaryOperator::Add, var("i"), int(1)),
    }));
    let compiler = compile(
        &context,
        vec![function(
            "main",
            vec![],
            TavType::void(),
            vec![
                let_var("i", ty(TypeKind::I32), Some(int(0))),
                stmt(StmtKind::For(ForStmt {
                    condition: binary(BinaryOperator::Less, var("i"), int(3)),
                    body: vec![
                        let_var("doubled", ty(TypeKind::I32), Some(var("i"))),
                        stmt(StmtKind::Expression(call("puts", vec![string("tick")]))),
                        increment,
                    ],
                })),
            ],
        )],
    );

    let entry = block_opcodes(&compiler, "main", "entry");
    assert_eq!(
        &entry[..3],
        &[
            InstructionOpcode::Alloca,
            InstructionOpcode::Alloca,
            InstructionOpcode::Alloca,
        ]
    );
    assert!(!block_opcodes(&compiler, "main", "for_body_0").contains(&InstructionOpcode::Alloca));
    assert!(compiler.verify().is_ok());
}

#[test]
fn test_call_through_function_parameter() {
    let context = Context::create();
    let compiler = compile(
        &context,
        vec![
            function("seven", vec![], ty(TypeKind::I32), vec![ret(Some(int(7)))]),
            function(
                "apply",
                vec![("f", TavType::function(ty(TypeKind::I32)))],
                ty(TypeKind::I32),
                vec![ret(Some(call("f", vec![])))],
            ),
            function(
                "main",
                vec![],
                ty(TypeKind::I32),
                vec![ret(Some(call("apply", vec![var("seven")])))],
            ),
        ],
    );

    let apply = compiler.module.get_function("apply").unwrap();
    assert!(apply.print_to_string().to_string().contains("call i32 (...)"));
    assert!(compiler.verify().is_ok());
}

#[test]
fn test_saved_module_matches_printed_ir() {
    let context = Context::create();
    let compiler = compile(
        &context,
        vec![function("main", vec![], ty(TypeKind::I32), vec![ret(Some(int(0)))])],
    );

    let output_file = std::env::temp_dir().join("tav_saved_module.ll");
    compiler.save_module_to_file(output_file.clone()).unwrap();

    let written = std::fs::read_to_string(&output_file).unwrap();
    assert!(written.contains("define i32 @main()"));
    assert_eq!(written, compiler.print_ir());

    std::fs::remove_file(output_file).unwrap();
}
