//! Syntax tree model
//!
//! The tree is built by an external parser. The command-line driver reads it
//! from its JSON serialization instead.

pub mod nodes;
pub mod unparse;
pub mod walk;

pub use nodes::*;
pub use unparse::{unparse, unparse_expr};
pub use walk::{IdentRole, Visitor, identifiers, unbound_references, walk_program};

use crate::Result;
use std::path::Path;

/// Deserialize a program from its JSON form.
pub fn parse_program(json: &str) -> Result<Program> {
    Ok(serde_json::from_str(json)?)
}

/// Read a program from a JSON file.
pub fn read_program(path: &Path) -> Result<Program> {
    let contents = std::fs::read_to_string(path)?;
    parse_program(&contents)
}
