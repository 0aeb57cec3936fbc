//! Diagnostics produced by name analysis
//!
//! Every error is reported through a [`DiagnosticSink`] at the point it is
//! detected and analysis carries on. [`Diagnostics`] is the default sink: an
//! append-only record that the driver inspects once the pass is done.

use crate::ast::Position;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The kinds of error name analysis can detect.
///
/// `Display` yields the message text reported to the user.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, thiserror::Error,
)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// A variable or formal declared with type `void`
    #[error("Non-function declared void")]
    NonFunctionVoid,

    /// A struct-typed declaration names something that is not a struct type
    #[error("Name of struct type invalid")]
    InvalidStructType,

    /// A name declared twice in the same scope
    #[error("Identifier multiply-declared")]
    MultiplyDeclared,

    /// A reference with no visible binding
    #[error("Identifier undeclared")]
    Undeclared,

    /// The base of a colon-access is not a struct
    #[error("Colon-access of non-struct type")]
    ColonAccessOfNonStruct,

    /// The base of a chained colon-access has nothing to chain from
    #[error("Name of struct field invalid")]
    InvalidStructFieldName,
}

impl DiagnosticKind {
    pub fn message(&self) -> String {
        self.to_string()
    }

    pub fn all() -> &'static [DiagnosticKind] {
        &[
            DiagnosticKind::NonFunctionVoid,
            DiagnosticKind::InvalidStructType,
            DiagnosticKind::MultiplyDeclared,
            DiagnosticKind::Undeclared,
            DiagnosticKind::ColonAccessOfNonStruct,
            DiagnosticKind::InvalidStructFieldName,
        ]
    }
}

/// One recorded error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub pos: Position,
    pub message: String,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, pos: Position) -> Self {
        Self {
            kind,
            pos,
            message: kind.message(),
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{} ***ERROR*** {}", self.pos.line, self.pos.column, self.message)
    }
}

/// Receiver of fatal messages.
///
/// Implementations format, print or count the message; they must return
/// normally so that analysis can continue.
pub trait DiagnosticSink {
    fn report_fatal(&mut self, line: u32, column: u32, message: &str);

    /// Report a classified error. Sinks that only care about text can rely
    /// on the default, which forwards to [`DiagnosticSink::report_fatal`].
    fn report(&mut self, kind: DiagnosticKind, pos: Position) {
        self.report_fatal(pos.line, pos.column, &kind.message());
    }
}

/// Append-only record of every diagnostic reported during a run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
    /// Messages reported without a kind through `report_fatal`
    unclassified: Vec<(Position, String)>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len() + self.unclassified.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn has_errors(&self) -> bool {
        !self.is_empty()
    }

    /// Number of recorded diagnostics of one kind.
    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.entries.iter().filter(|d| d.kind == kind).count()
    }

    pub fn kinds(&self) -> Vec<DiagnosticKind> {
        self.entries.iter().map(|d| d.kind).collect()
    }

    /// Counts per kind, only for kinds that occurred.
    pub fn counts_by_kind(&self) -> BTreeMap<DiagnosticKind, usize> {
        let mut counts = BTreeMap::new();
        for entry in &self.entries {
            *counts.entry(entry.kind).or_insert(0) += 1;
        }
        counts
    }

    pub fn unclassified(&self) -> &[(Position, String)] {
        &self.unclassified
    }
}

impl DiagnosticSink for Diagnostics {
    fn report_fatal(&mut self, line: u32, column: u32, message: &str) {
        self.unclassified.push((Position::new(line, column), message.to_string()));
    }

    fn report(&mut self, kind: DiagnosticKind, pos: Position) {
        tracing::trace!("{} at {}", kind, pos);
        self.entries.push(Diagnostic::new(kind, pos));
    }
}
