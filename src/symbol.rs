//! Symbol types - what a bound name denotes
//!
//! Every declared name maps to one of four symbol kinds:
//! - `Plain`: a variable or formal of a scalar type (`boolean`, `integer`)
//! - `Function`: a return type plus ordered parameter types
//! - `StructInstance`: a variable or field whose type is a named struct
//! - `StructDefinition`: a struct type, owning its own field namespace

use crate::scope::FieldTable;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::cell::OnceCell;
use std::str::FromStr;

/// Symbol kinds, used for filtering and display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolKind {
    /// Scalar variable or formal
    Plain,
    /// Function with a signature
    Function,
    /// Value of a named struct type
    StructInstance,
    /// Struct type definition
    StructDefinition,
}

impl SymbolKind {
    /// Get the string representation of the symbol kind
    pub fn as_str(&self) -> &'static str {
        match self {
            SymbolKind::Plain => "plain",
            SymbolKind::Function => "function",
            SymbolKind::StructInstance => "struct_instance",
            SymbolKind::StructDefinition => "struct_definition",
        }
    }

    /// Get all symbol kinds
    pub fn all() -> &'static [SymbolKind] {
        &[
            SymbolKind::Plain,
            SymbolKind::Function,
            SymbolKind::StructInstance,
            SymbolKind::StructDefinition,
        ]
    }
}

impl FromStr for SymbolKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "plain" | "value" | "var" | "variable" => Ok(SymbolKind::Plain),
            "function" | "func" | "fn" => Ok(SymbolKind::Function),
            "struct_instance" | "instance" => Ok(SymbolKind::StructInstance),
            "struct_definition" | "struct" | "definition" => Ok(SymbolKind::StructDefinition),
            _ => Err(Error::InvalidKind(s.to_string())),
        }
    }
}

impl std::fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Signature of a declared function.
///
/// The function is declared before its formals are analyzed so that the
/// body can refer to it; parameter types are attached afterwards, once.
#[derive(Debug)]
pub struct FnSignature {
    return_type: String,
    param_types: OnceCell<Vec<String>>,
}

impl FnSignature {
    pub fn new(return_type: impl Into<String>) -> Self {
        Self {
            return_type: return_type.into(),
            param_types: OnceCell::new(),
        }
    }

    pub fn return_type(&self) -> &str {
        &self.return_type
    }

    /// Attach the ordered parameter types. Returns `false` if they were
    /// already attached, in which case the first list is kept.
    pub fn attach_params(&self, types: Vec<String>) -> bool {
        self.param_types.set(types).is_ok()
    }

    /// Parameter types, empty until attached.
    pub fn param_types(&self) -> &[String] {
        self.param_types.get().map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has_params_attached(&self) -> bool {
        self.param_types.get().is_some()
    }
}

/// A struct type definition. Owns the field namespace for its whole life.
#[derive(Debug)]
pub struct StructDefinition {
    fields: FieldTable,
}

impl StructDefinition {
    pub fn new(fields: FieldTable) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &FieldTable {
        &self.fields
    }
}

/// What a declared name denotes.
#[derive(Debug)]
pub enum Symbol {
    Plain { ty: String },
    Function(FnSignature),
    StructInstance { struct_name: String },
    StructDefinition(StructDefinition),
}

impl Symbol {
    pub fn plain(ty: impl Into<String>) -> Self {
        Symbol::Plain { ty: ty.into() }
    }

    pub fn function(return_type: impl Into<String>) -> Self {
        Symbol::Function(FnSignature::new(return_type))
    }

    pub fn struct_instance(struct_name: impl Into<String>) -> Self {
        Symbol::StructInstance {
            struct_name: struct_name.into(),
        }
    }

    pub fn struct_definition(fields: FieldTable) -> Self {
        Symbol::StructDefinition(StructDefinition::new(fields))
    }

    pub fn kind(&self) -> SymbolKind {
        match self {
            Symbol::Plain { .. } => SymbolKind::Plain,
            Symbol::Function(_) => SymbolKind::Function,
            Symbol::StructInstance { .. } => SymbolKind::StructInstance,
            Symbol::StructDefinition(_) => SymbolKind::StructDefinition,
        }
    }

    pub fn as_function(&self) -> Option<&FnSignature> {
        match self {
            Symbol::Function(sig) => Some(sig),
            _ => None,
        }
    }

    /// Name of the struct type, for struct instances.
    pub fn struct_name(&self) -> Option<&str> {
        match self {
            Symbol::StructInstance { struct_name } => Some(struct_name),
            _ => None,
        }
    }

    pub fn as_struct_definition(&self) -> Option<&StructDefinition> {
        match self {
            Symbol::StructDefinition(def) => Some(def),
            _ => None,
        }
    }

    /// Type descriptor shown next to resolved identifiers.
    ///
    /// Functions render as `p1,p2->ret`; struct definitions have no
    /// descriptor of their own.
    pub fn descriptor(&self) -> String {
        match self {
            Symbol::Plain { ty } => ty.clone(),
            Symbol::Function(sig) => {
                format!("{}->{}", sig.param_types().join(","), sig.return_type())
            }
            Symbol::StructInstance { struct_name } => struct_name.clone(),
            Symbol::StructDefinition(_) => String::new(),
        }
    }
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.descriptor())
    }
}
