//! Unit tests for the symbol table.

use crate::ast::types::{TavType, TypeKind};
use crate::Position;

use super::symbols::{Scope, SymbolTable};

fn i32_type() -> TavType {
    TavType::new(TypeKind::I32)
}

#[test]
fn test_add_and_get() {
    let mut table: SymbolTable<u32> = SymbolTable::new();
    table.add("x", i32_type(), Some(7), &Position::null()).unwrap();

    let symbol = table.get("x", &Position::null()).unwrap();
    assert_eq!(symbol.identifier, "x");
    assert_eq!(symbol.tav_type, i32_type());
    assert_eq!(symbol.handle, Some(7));
}

#[test]
fn test_duplicate_in_same_scope_is_rejected() {
    let mut table: SymbolTable<u32> = SymbolTable::new();
    table.add("x", i32_type(), Some(1), &Position::null()).unwrap();

    let error = table
        .add("x", TavType::new(TypeKind::Bool), Some(2), &Position::null())
        .unwrap_err();
    assert_eq!(error.get_error_name(), "SymbolAlreadyDeclared");

    // the first binding is untouched
    assert_eq!(table.get("x", &Position::null()).unwrap().handle, Some(1));
}

#[test]
fn test_inner_scope_shadows_outer() {
    let mut table: SymbolTable<u32> = SymbolTable::new();
    table.add("x", i32_type(), Some(1), &Position::null()).unwrap();

    table.new_scope("body");
    table
        .add("x", TavType::new(TypeKind::F64), Some(2), &Position::null())
        .unwrap();
    assert_eq!(table.get("x", &Position::null()).unwrap().handle, Some(2));

    table.pop_scope().unwrap();
    assert_eq!(table.get("x", &Position::null()).unwrap().handle, Some(1));
}

#[test]
fn test_lookup_walks_outwards() {
    let mut table: SymbolTable<u32> = SymbolTable::new();
    table.add("outer", i32_type(), Some(1), &Position::null()).unwrap();
    table.new_scope("a");
    table.new_scope("b");

    assert_eq!(table.get("outer", &Position::null()).unwrap().handle, Some(1));
    assert!(!table.contains_local("outer"));
}

#[test]
fn test_unresolved_symbol() {
    let table: SymbolTable<u32> = SymbolTable::new();
    let error = table.get("missing", &Position::null()).unwrap_err();

    assert_eq!(error.get_error_name(), "SymbolNotFound");
}

#[test]
fn test_popped_bindings_are_gone() {
    let mut table: SymbolTable<u32> = SymbolTable::new();
    table.new_scope("if_body_0");
    table.add("y", i32_type(), Some(3), &Position::null()).unwrap();

    let scope = table.pop_scope().unwrap();
    assert_eq!(scope.name, "if_body_0");
    assert_eq!(scope.len(), 1);
    assert!(table.get("y", &Position::null()).is_err());
}

#[test]
fn test_root_scope_is_never_popped() {
    let mut table: SymbolTable<u32> = SymbolTable::new();
    assert_eq!(table.depth(), 1);
    assert!(table.pop_scope().is_none());
    assert_eq!(table.depth(), 1);

    table.new_scope("fn_body");
    table.new_scope("for_body_0");
    assert_eq!(table.depth(), 3);
    table.pop_scope();
    table.pop_scope();
    assert_eq!(table.depth(), 1);
}

#[test]
fn test_field_offset_follows_declaration_order() {
    let mut table: SymbolTable<u32> = SymbolTable::new();
    table.new_scope("Point_members");
    table.add("x", i32_type(), None, &Position::null()).unwrap();
    table.add("y", i32_type(), None, &Position::null()).unwrap();
    table
        .add("label", TavType::new(TypeKind::String), None, &Position::null())
        .unwrap();
    let members = table.pop_scope().unwrap();
    table.add_members("Point", members);

    let (index, symbol) = table.field_offset("Point", "y", &Position::null()).unwrap();
    assert_eq!(index, 1);
    assert_eq!(symbol.tav_type, i32_type());
    assert!(symbol.handle.is_none());

    let (index, _) = table.field_offset("Point", "label", &Position::null()).unwrap();
    assert_eq!(index, 2);
}

#[test]
fn test_field_offset_errors() {
    let mut table: SymbolTable<u32> = SymbolTable::new();
    let mut members = Scope::new("Point_members");
    assert!(members.is_empty());
    table.new_scope("Point_members");
    table.add("x", i32_type(), None, &Position::null()).unwrap();
    members = table.pop_scope().unwrap();
    table.add_members("Point", members);

    let error = table.field_offset("Point", "z", &Position::null()).unwrap_err();
    assert_eq!(error.get_error_name(), "UnknownField");

    let error = table.field_offset("Line", "x", &Position::null()).unwrap_err();
    assert_eq!(error.get_error_name(), "NotAStruct");
}

#[test]
fn test_members_are_scoped() {
    let mut table: SymbolTable<u32> = SymbolTable::new();
    table.new_scope("main_body");
    table.add_members("Local", Scope::new("Local_members"));
    assert!(table.members("Local").is_some());

    table.pop_scope();
    assert!(table.members("Local").is_none());
}

#[test]
fn test_scope_of_reports_binding_depth() {
    let mut table: SymbolTable<u32> = SymbolTable::new();
    table.add("main", i32_type(), Some(1), &Position::null()).unwrap();
    table.new_scope("main_body");
    table.add("x", i32_type(), Some(2), &Position::null()).unwrap();
    table.new_scope("for_body_0");
    table.add("x", i32_type(), Some(3), &Position::null()).unwrap();

    assert_eq!(table.scope_of("main"), Some(0));
    assert_eq!(table.scope_of("x"), Some(2));
    assert_eq!(table.scope_of("missing"), None);

    table.pop_scope();
    assert_eq!(table.scope_of("x"), Some(1));
}

#[test]
fn test_scope_keeps_declaration_order() {
    let mut table: SymbolTable<u32> = SymbolTable::new();
    table.new_scope("Pair_members");
    table.add("second", i32_type(), None, &Position::null()).unwrap();
    table.add("first", i32_type(), None, &Position::null()).unwrap();
    let members = table.pop_scope().unwrap();

    let names: Vec<&str> = members
        .symbols()
        .iter()
        .map(|symbol| symbol.identifier.as_str())
        .collect();
    assert_eq!(names, vec!["second", "first"]);
    assert_eq!(members.index_of("first"), Some(1));
}
