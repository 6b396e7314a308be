//! Type inference over expressions.
//!
//! Literals carry their types from the parser and variables are resolved
//! lazily through the symbol table. Binary operations combine their operand
//! types with the join rules in [`inference::join_inferred`].

pub mod inference;
