//! Scoped symbol table for name binding
//!
//! The table tracks:
//! - A stack of lexical scopes, innermost last
//! - Declarations within each scope (name → symbol, unique per scope)
//!
//! Resolution walks the stack from innermost to outermost
//! ([`SymbolTable::lookup_global`]); duplicate checks only look at the
//! innermost scope ([`SymbolTable::lookup_local`]).
//!
//! A struct's fields live in a [`FieldTable`], a single detached scope that
//! is owned by its struct definition symbol. It is a separate type with no
//! push/pop, so it can never end up on the ambient stack.

use crate::symbol::Symbol;
use std::collections::HashMap;
use std::rc::Rc;

/// Failures of table operations. None of them stop name analysis.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TableError {
    #[error("cannot pop a scope: no scope is active")]
    ScopeUnderflow,

    #[error("symbol table has no active scope")]
    TableEmpty,

    #[error("'{0}' is already declared in this scope")]
    DuplicateName(String),
}

/// One level of name bindings.
#[derive(Debug, Default)]
struct Scope {
    /// Declarations: name → symbol
    symbols: HashMap<String, Rc<Symbol>>,
    /// Names in declaration order
    order: Vec<String>,
}

impl Scope {
    fn get(&self, name: &str) -> Option<Rc<Symbol>> {
        self.symbols.get(name).cloned()
    }

    fn insert(&mut self, name: &str, symbol: Rc<Symbol>) -> Result<(), TableError> {
        if self.symbols.contains_key(name) {
            return Err(TableError::DuplicateName(name.to_string()));
        }
        self.symbols.insert(name.to_string(), symbol);
        self.order.push(name.to_string());
        Ok(())
    }
}

/// Declaration target shared by the scoped table and struct field tables.
///
/// Declaration code checks for duplicates and inserts through this trait so
/// the same routine serves block scopes and struct bodies.
pub trait DeclScope {
    /// Look up a name in the scope that receives declarations.
    fn lookup_local(&self, name: &str) -> Result<Option<Rc<Symbol>>, TableError>;

    /// Insert a declaration; fails on a duplicate without inserting.
    fn declare(&mut self, name: &str, symbol: Rc<Symbol>) -> Result<(), TableError>;
}

/// Stack of lexical scopes.
#[derive(Debug, Default)]
pub struct SymbolTable {
    scopes: Vec<Scope>,
}

impl SymbolTable {
    /// Create a table with a single, empty scope.
    pub fn new() -> Self {
        let mut table = Self::default();
        table.push_scope();
        table
    }

    /// Create a table with no scopes at all.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Add a new innermost scope.
    pub fn push_scope(&mut self) {
        self.scopes.push(Scope::default());
    }

    /// Remove the innermost scope.
    pub fn pop_scope(&mut self) -> Result<(), TableError> {
        self.scopes.pop().map(|_| ()).ok_or(TableError::ScopeUnderflow)
    }

    /// Number of live scopes.
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    /// Look up a name in the innermost scope only.
    pub fn lookup_local(&self, name: &str) -> Result<Option<Rc<Symbol>>, TableError> {
        let scope = self.scopes.last().ok_or(TableError::TableEmpty)?;
        Ok(scope.get(name))
    }

    /// Look up a name walking from the innermost scope outwards.
    pub fn lookup_global(&self, name: &str) -> Result<Option<Rc<Symbol>>, TableError> {
        if self.scopes.is_empty() {
            return Err(TableError::TableEmpty);
        }
        Ok(self.scopes.iter().rev().find_map(|scope| scope.get(name)))
    }

    /// Declare a name in the innermost scope.
    pub fn declare(&mut self, name: &str, symbol: Rc<Symbol>) -> Result<(), TableError> {
        let scope = self.scopes.last_mut().ok_or(TableError::TableEmpty)?;
        scope.insert(name, symbol)
    }
}

impl DeclScope for SymbolTable {
    fn lookup_local(&self, name: &str) -> Result<Option<Rc<Symbol>>, TableError> {
        SymbolTable::lookup_local(self, name)
    }

    fn declare(&mut self, name: &str, symbol: Rc<Symbol>) -> Result<(), TableError> {
        SymbolTable::declare(self, name, symbol)
    }
}

/// The detached namespace of one struct's fields.
#[derive(Debug, Default)]
pub struct FieldTable {
    scope: Scope,
}

impl FieldTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lookup_local(&self, name: &str) -> Option<Rc<Symbol>> {
        self.scope.get(name)
    }

    /// Same as [`FieldTable::lookup_local`]: a field table is one scope.
    pub fn lookup_global(&self, name: &str) -> Option<Rc<Symbol>> {
        self.scope.get(name)
    }

    pub fn declare(&mut self, name: &str, symbol: Rc<Symbol>) -> Result<(), TableError> {
        self.scope.insert(name, symbol)
    }

    pub fn len(&self) -> usize {
        self.scope.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scope.order.is_empty()
    }

    /// Field names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.scope.order.iter().map(String::as_str)
    }
}

impl DeclScope for FieldTable {
    fn lookup_local(&self, name: &str) -> Result<Option<Rc<Symbol>>, TableError> {
        Ok(FieldTable::lookup_local(self, name))
    }

    fn declare(&mut self, name: &str, symbol: Rc<Symbol>) -> Result<(), TableError> {
        FieldTable::declare(self, name, symbol)
    }
}
