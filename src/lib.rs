//! # bach-resolve - name analysis for the bach language
//!
//! Binds every identifier in a bach syntax tree to the declaration it
//! refers to.
//!
//! bach-resolve provides:
//! - A syntax tree model with a JSON form and a pretty-printer
//! - Symbols for plain values, functions, struct instances and struct types
//! - A scoped symbol table plus detached struct field tables
//! - The name analysis pass, reporting errors through a diagnostic sink

pub mod ast;
pub mod symbol;
pub mod scope;
pub mod diagnostics;
pub mod output;
pub mod config;
pub mod ui;

// Re-exports for convenient access
pub use ast::{Program, unparse};
pub use symbol::{Symbol, SymbolKind};
pub use scope::{FieldTable, NameAnalyzer, SymbolTable, analyze};
pub use diagnostics::{Diagnostic, DiagnosticKind, DiagnosticSink, Diagnostics};

/// Result type alias for bach-resolve operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for bach-resolve operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Unknown symbol kind: {0}")]
    InvalidKind(String),

    #[error("Malformed syntax tree: {0}")]
    Tree(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
