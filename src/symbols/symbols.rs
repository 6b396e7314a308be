use std::collections::HashMap;

use crate::{
    ast::types::TavType,
    errors::errors::{Error, ErrorImpl},
    Position,
};

/// A named binding.
///
/// The handle is a non-owning reference to something the generator created
/// (stack storage, a function, a struct type). Struct members carry none.
#[derive(Debug, Clone)]
pub struct Symbol<H> {
    pub identifier: String,
    pub tav_type: TavType,
    pub handle: Option<H>,
}

/// An ordered set of bindings plus the struct layouts declared alongside them.
#[derive(Debug, Clone)]
pub struct Scope<H> {
    pub name: String,
    symbols: Vec<Symbol<H>>,
    lookup: HashMap<String, usize>,
    members: HashMap<String, Scope<H>>,
}

impl<H> Scope<H> {
    pub fn new(name: &str) -> Self {
        Scope {
            name: name.to_string(),
            symbols: vec![],
            lookup: HashMap::new(),
            members: HashMap::new(),
        }
    }

    pub fn get(&self, identifier: &str) -> Option<&Symbol<H>> {
        self.lookup.get(identifier).map(|index| &self.symbols[*index])
    }

    /// Position of `identifier` in declaration order.
    pub fn index_of(&self, identifier: &str) -> Option<usize> {
        self.lookup.get(identifier).copied()
    }

    pub fn symbols(&self) -> &[Symbol<H>] {
        &self.symbols
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

/// Scope-chained mapping from identifier to type and handle.
///
/// Scopes form a stack: the innermost scope is searched first and the root
/// scope is never popped.
#[derive(Debug)]
pub struct SymbolTable<H> {
    scopes: Vec<Scope<H>>,
}

impl<H> Default for SymbolTable<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> SymbolTable<H> {
    pub fn new() -> Self {
        SymbolTable {
            scopes: vec![Scope::new("global")],
        }
    }

    pub fn new_scope(&mut self, name: &str) {
        log::trace!("enter scope {} (depth {})", name, self.scopes.len() + 1);
        self.scopes.push(Scope::new(name));
    }

    /// Discards the innermost scope and hands it back.
    ///
    /// Returns `None` instead of popping the root scope.
    pub fn pop_scope(&mut self) -> Option<Scope<H>> {
        if self.scopes.len() == 1 {
            return None;
        }
        let scope = self.scopes.pop();
        if let Some(scope) = &scope {
            log::trace!("leave scope {}", scope.name);
        }
        scope
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    pub fn current(&self) -> &Scope<H> {
        // The root scope is never popped.
        &self.scopes[self.scopes.len() - 1]
    }

    /// Whether `identifier` is bound in the innermost scope.
    pub fn contains_local(&self, identifier: &str) -> bool {
        self.current().lookup.contains_key(identifier)
    }

    pub fn add(
        &mut self,
        identifier: &str,
        tav_type: TavType,
        handle: Option<H>,
        current_position: &Position,
    ) -> Result<(), Error> {
        if self.contains_local(identifier) {
            return Err(Error::new(
                ErrorImpl::SymbolAlreadyDeclared {
                    identifier: identifier.to_string(),
                },
                current_position.clone(),
            ));
        }

        let Some(scope) = self.scopes.last_mut() else {
            return Err(Error::new(
                ErrorImpl::ScopeUnderflow,
                current_position.clone(),
            ));
        };
        scope
            .lookup
            .insert(identifier.to_string(), scope.symbols.len());
        scope.symbols.push(Symbol {
            identifier: identifier.to_string(),
            tav_type,
            handle,
        });
        Ok(())
    }

    pub fn get(&self, identifier: &str, current_position: &Position) -> Result<&Symbol<H>, Error> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(identifier))
            .ok_or_else(|| {
                Error::new(
                    ErrorImpl::SymbolNotFound {
                        identifier: identifier.to_string(),
                    },
                    current_position.clone(),
                )
            })
    }

    /// Index of the innermost scope binding `identifier`, the root scope being 0.
    pub fn scope_of(&self, identifier: &str) -> Option<usize> {
        self.scopes
            .iter()
            .rposition(|scope| scope.get(identifier).is_some())
    }

    /// Attaches the member scope of `structure` to the innermost scope.
    pub fn add_members(&mut self, structure: &str, members: Scope<H>) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.members.insert(structure.to_string(), members);
        }
    }

    pub fn members(&self, structure: &str) -> Option<&Scope<H>> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.members.get(structure))
    }

    /// Resolves the declaration index of `member` within `structure`.
    pub fn field_offset(
        &self,
        structure: &str,
        member: &str,
        current_position: &Position,
    ) -> Result<(u32, &Symbol<H>), Error> {
        let members = self.members(structure).ok_or_else(|| {
            Error::new(
                ErrorImpl::NotAStruct {
                    type_: structure.to_string(),
                },
                current_position.clone(),
            )
        })?;

        match (members.index_of(member), members.get(member)) {
            (Some(index), Some(symbol)) => Ok((index as u32, symbol)),
            _ => Err(Error::new(
                ErrorImpl::UnknownField {
                    structure: structure.to_string(),
                    field: member.to_string(),
                },
                current_position.clone(),
            )),
        }
    }
}
