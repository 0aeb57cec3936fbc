//! Scopes and name binding
//!
//! `table` holds the scoped symbol table and the detached struct field
//! tables; `resolver` is the name analysis pass that drives them over a
//! syntax tree.

pub mod resolver;
pub mod table;

pub use resolver::{DeclScopes, NameAnalyzer, analyze};
pub use table::{DeclScope, FieldTable, SymbolTable, TableError};
