//! Code generation module.
//!
//! This module contains the LLVM-based code generator that lowers the AST
//! into LLVM IR. It handles:
//!
//! - Lowering of statements and expressions
//! - Type conversion from semantic types to LLVM types
//! - Declaration of the runtime primitives
//! - Control flow through a stack of insertion blocks

pub mod compiler;
pub mod expr;
pub mod runtime;
pub mod stmt;
