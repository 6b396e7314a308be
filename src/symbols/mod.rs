//! Scoped symbol table.
//!
//! Bindings are keyed by name and resolved innermost scope first, which gives
//! lexical shadowing. Scopes follow the nesting of the constructs being
//! lowered: one is pushed on entry and popped on exit.

pub mod symbols;

#[cfg(test)]
mod tests;
