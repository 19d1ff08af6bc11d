//! Diagnostics
//!
//! Collects errors found while compiling a schema so that problems in
//! independent parts of one schema are reported together.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::{self, Write};

// =============================================================================
// Diagnostic Codes
// =============================================================================

/// Diagnostic code for categorizing issues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagnosticCode {
    // === Unsupported shape ===
    /// Source text is not JSON
    InvalidJson,
    /// JSON value is neither a type name, an object nor a union array
    UnsupportedShape,
    /// `type` attribute is not a usable type designator
    UnknownType,

    // === Structural ===
    /// Required attribute is absent
    MissingAttribute,
    /// Attribute present with the wrong JSON shape or value
    InvalidAttribute,

    // === Naming ===
    /// Name is not a string, is malformed, or is reserved
    InvalidName,
    /// Fullname declared twice
    DuplicateName,
    /// Reference to a name that is never defined
    UndefinedName,

    // === Composition ===
    /// Two fields with the same name in one record
    DuplicateField,
    /// Two identical enum symbols
    DuplicateSymbol,
    /// Two union branches of the same kind or fullname
    DuplicateUnionBranch,
    /// Union directly inside a union
    NestedUnion,

    // === Defaults ===
    /// Default literal does not conform to the field type
    InvalidDefault,
}

impl DiagnosticCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidJson => "E001",
            Self::UnsupportedShape => "E002",
            Self::UnknownType => "E003",
            Self::MissingAttribute => "E004",
            Self::InvalidAttribute => "E005",
            Self::InvalidName => "E006",
            Self::DuplicateName => "E007",
            Self::UndefinedName => "E008",
            Self::DuplicateField => "E009",
            Self::DuplicateSymbol => "E010",
            Self::DuplicateUnionBranch => "E011",
            Self::NestedUnion => "E012",
            Self::InvalidDefault => "E013",
        }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Diagnostic Item
// =============================================================================

/// A single diagnostic item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticItem {
    /// Diagnostic code
    pub code: DiagnosticCode,
    /// Where in the schema document the problem was found (e.g. `$.fields[1].type`)
    pub location: String,
    /// Human-readable message
    pub message: String,
}

impl DiagnosticItem {
    pub fn new(
        code: DiagnosticCode,
        location: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            code,
            location: location.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for DiagnosticItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} (at {})", self.code, self.message, self.location)
    }
}

// =============================================================================
// Diagnostics Collection
// =============================================================================

/// Ordered queue of diagnostics recorded during one compile
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostics {
    items: Vec<DiagnosticItem>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a diagnostic
    pub fn record(
        &mut self,
        code: DiagnosticCode,
        location: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.push(DiagnosticItem::new(code, location, message));
    }

    /// Add a diagnostic item
    pub fn push(&mut self, item: DiagnosticItem) {
        self.items.push(item);
    }

    /// True once anything has been recorded and not yet drained
    pub fn has_errored(&self) -> bool {
        !self.items.is_empty()
    }

    /// Write every queued diagnostic to `sink`, one per line, and clear the queue
    pub fn drain_into<W: Write + ?Sized>(&mut self, sink: &mut W) -> io::Result<()> {
        for item in self.items.drain(..) {
            writeln!(sink, "{}", item)?;
        }
        Ok(())
    }

    /// Drop every queued diagnostic
    pub fn discard(&mut self) {
        // io::sink never fails
        let _ = self.drain_into(&mut io::sink());
    }

    /// Get all items
    pub fn all(&self) -> &[DiagnosticItem] {
        &self.items
    }

    /// Iterate the messages only
    pub fn messages(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(|i| i.message.as_str())
    }

    /// True if any item carries `code`
    pub fn contains(&self, code: DiagnosticCode) -> bool {
        self.items.iter().any(|i| i.code == code)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for item in &self.items {
            writeln!(f, "{}", item)?;
        }
        Ok(())
    }
}

impl IntoIterator for Diagnostics {
    type Item = DiagnosticItem;
    type IntoIter = std::vec::IntoIter<DiagnosticItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a DiagnosticItem;
    type IntoIter = std::slice::Iter<'a, DiagnosticItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_sets_flag() {
        let mut diags = Diagnostics::new();
        assert!(!diags.has_errored());

        diags.record(DiagnosticCode::UndefinedName, "$.fields[1].type", "undefined name: Foo");
        diags.record(DiagnosticCode::DuplicateSymbol, "$", "duplicate symbol: AA");

        assert!(diags.has_errored());
        assert_eq!(diags.len(), 2);
        assert!(diags.contains(DiagnosticCode::DuplicateSymbol));
        assert!(!diags.contains(DiagnosticCode::NestedUnion));
    }

    #[test]
    fn test_drain_writes_in_order_and_resets() {
        let mut diags = Diagnostics::new();
        diags.record(DiagnosticCode::MissingAttribute, "$", "no fields");
        diags.record(DiagnosticCode::InvalidName, "$.fields[0]", "name not a string");

        let mut out = Vec::new();
        diags.drain_into(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert_eq!(
            text,
            "[E004] no fields (at $)\n[E006] name not a string (at $.fields[0])\n"
        );
        assert!(!diags.has_errored());
        assert!(diags.is_empty());
    }

    #[test]
    fn test_discard_clears() {
        let mut diags = Diagnostics::new();
        diags.record(DiagnosticCode::InvalidJson, "$", "expected value");
        diags.discard();
        assert!(!diags.has_errored());
    }
}
