use crate::ast::{Program, identifiers};
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::symbol::SymbolKind;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

#[derive(Tabled)]
pub struct TableRow {
    #[tabled(rename = "Diagnostic")]
    pub kind: String,
    #[tabled(rename = "Count")]
    pub count: String,
}

pub struct TableBuilder {
    rows: Vec<TableRow>,
}

impl TableBuilder {
    pub fn new() -> Self {
        Self { rows: Vec::new() }
    }

    pub fn add_row(&mut self, kind: &str, count: usize) {
        self.rows.push(TableRow {
            kind: kind.to_string(),
            count: count.to_string(),
        });
    }

    pub fn build(&self) -> String {
        if self.rows.is_empty() {
            return String::new();
        }

        Table::new(&self.rows).with(Style::rounded()).to_string()
    }
}

impl Default for TableBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Summary of diagnostic counts, one row per kind that occurred plus a
/// total. Empty when there is nothing to report.
pub fn diagnostics_table(diags: &Diagnostics) -> String {
    let mut builder = TableBuilder::new();
    for (kind, count) in diags.counts_by_kind() {
        builder.add_row(kind_label(kind), count);
    }
    if !diags.unclassified().is_empty() {
        builder.add_row("Other", diags.unclassified().len());
    }
    if !diags.is_empty() {
        builder.add_row("Total", diags.len());
    }
    builder.build()
}

fn kind_label(kind: DiagnosticKind) -> &'static str {
    match kind {
        DiagnosticKind::NonFunctionVoid => "Non-function void",
        DiagnosticKind::InvalidStructType => "Invalid struct type",
        DiagnosticKind::MultiplyDeclared => "Multiply declared",
        DiagnosticKind::Undeclared => "Undeclared",
        DiagnosticKind::ColonAccessOfNonStruct => "Colon-access of non-struct",
        DiagnosticKind::InvalidStructFieldName => "Invalid struct field",
    }
}

/// One identifier occurrence in a bindings listing.
#[derive(Debug, Clone, Tabled, Serialize)]
pub struct BindingRow {
    #[tabled(rename = "Position")]
    pub position: String,
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "Role")]
    pub role: String,
    #[tabled(rename = "Kind")]
    pub kind: String,
    #[tabled(rename = "Type")]
    pub descriptor: String,
}

/// Rows for every identifier occurrence in source order. With a kind
/// filter, only occurrences bound to a symbol of that kind are kept.
pub fn binding_rows(program: &Program, kind: Option<SymbolKind>) -> Vec<BindingRow> {
    identifiers(program)
        .into_iter()
        .filter(|(ident, _)| match kind {
            Some(kind) => ident.symbol().is_some_and(|sym| sym.kind() == kind),
            None => true,
        })
        .map(|(ident, role)| BindingRow {
            position: ident.pos.to_string(),
            name: ident.name.clone(),
            role: role.as_str().to_string(),
            kind: ident.symbol().map(|sym| sym.kind().to_string()).unwrap_or_else(|| "-".to_string()),
            descriptor: ident.symbol().map(|sym| sym.descriptor()).unwrap_or_default(),
        })
        .collect()
}

pub fn bindings_table(rows: &[BindingRow]) -> String {
    if rows.is_empty() {
        return String::new();
    }
    Table::new(rows).with(Style::rounded()).to_string()
}
