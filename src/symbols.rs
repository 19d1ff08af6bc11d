//! Symbol table for named types
//!
//! Registration is two-phase: a name is declared before its type is built
//! and defined once construction finishes, so a type may refer to itself.
//! Uses of unknown names open a forward slot that a later declaration of the
//! same fullname fills; slots never filled are reported when the compile
//! finishes.

use std::collections::HashMap;
use thiserror::Error;
use tracing::trace;

use crate::name::Name;
use crate::schema::NamedSchema;

/// Handle to a named type in a [`SymbolTable`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId(usize);

/// A fullname was declared twice
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("duplicate name: {0}")]
pub struct DuplicateName(pub Name);

#[derive(Debug, Clone)]
enum Slot {
    /// Referenced before any declaration; holds the location of first use
    Forward(String),
    /// Declared, type under construction
    Declared,
    Defined(NamedSchema),
    /// Declared, but the type failed to build
    Abandoned,
}

#[derive(Debug, Clone)]
struct Symbol {
    name: Name,
    slot: Slot,
}

/// Maps fullnames to named types for one compilation unit
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    symbols: Vec<Symbol>,
    by_name: HashMap<Name, SymbolId>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve `name` ahead of its definition
    pub fn declare(&mut self, name: Name) -> Result<SymbolId, DuplicateName> {
        if let Some(&id) = self.by_name.get(&name) {
            let symbol = &mut self.symbols[id.0];
            return match symbol.slot {
                Slot::Forward(_) => {
                    trace!(name = %name, "declaring forward-referenced name");
                    symbol.slot = Slot::Declared;
                    Ok(id)
                }
                _ => Err(DuplicateName(name)),
            };
        }
        trace!(name = %name, "declaring name");
        Ok(self.push(name, Slot::Declared))
    }

    /// Fill in a declared name
    pub fn define(&mut self, id: SymbolId, schema: NamedSchema) {
        self.symbols[id.0].slot = Slot::Defined(schema);
    }

    /// Mark a declared name whose type failed to build
    pub fn abandon(&mut self, id: SymbolId) {
        self.symbols[id.0].slot = Slot::Abandoned;
    }

    /// Handle for a by-name use of `reference` inside namespace `enclosing`.
    ///
    /// Tries the namespace-qualified name first, then the bare name. An
    /// unknown name opens a forward slot for the qualified name.
    pub fn reference(
        &mut self,
        reference: &str,
        enclosing: Option<&str>,
        location: &str,
    ) -> SymbolId {
        let candidates = Name::candidates(reference, enclosing);
        if let Some(id) = candidates.iter().find_map(|n| self.by_name.get(n).copied()) {
            return id;
        }
        let name = candidates
            .into_iter()
            .next()
            .unwrap_or_else(|| Name::new(reference, enclosing));
        trace!(name = %name, "forward reference");
        self.push(name, Slot::Forward(location.to_string()))
    }

    /// Look up a handle by fullname
    pub fn lookup(&self, fullname: &str) -> Option<SymbolId> {
        self.by_name.get(&Name::new(fullname, None)).copied()
    }

    /// Look up a defined type by fullname
    pub fn resolve(&self, fullname: &str) -> Option<&NamedSchema> {
        self.lookup(fullname).and_then(|id| self.get(id))
    }

    /// The type behind `id`, once defined
    pub fn get(&self, id: SymbolId) -> Option<&NamedSchema> {
        match &self.symbols.get(id.0)?.slot {
            Slot::Defined(schema) => Some(schema),
            _ => None,
        }
    }

    /// Fullname behind `id`
    pub fn name(&self, id: SymbolId) -> &Name {
        &self.symbols[id.0].name
    }

    /// Names used but never declared, with the location of their first use
    pub fn undefined(&self) -> impl Iterator<Item = (&Name, &str)> {
        self.symbols.iter().filter_map(|s| match &s.slot {
            Slot::Forward(location) => Some((&s.name, location.as_str())),
            _ => None,
        })
    }

    /// Defined types in declaration order
    pub fn iter(&self) -> impl Iterator<Item = &NamedSchema> {
        self.symbols.iter().filter_map(|s| match &s.slot {
            Slot::Defined(schema) => Some(schema),
            _ => None,
        })
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn push(&mut self, name: Name, slot: Slot) -> SymbolId {
        let id = SymbolId(self.symbols.len());
        self.by_name.insert(name.clone(), id);
        self.symbols.push(Symbol { name, slot });
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Declaration, FixedSchema};

    fn fixed(name: &str, size: u64) -> NamedSchema {
        NamedSchema::Fixed(FixedSchema {
            decl: Declaration {
                name: Name::new(name, None),
                name_attr: name.to_string(),
                namespace_attr: None,
                aliases: Vec::new(),
                doc: None,
            },
            size,
        })
    }

    #[test]
    fn test_declare_then_define() {
        let mut table = SymbolTable::new();
        let id = table.declare(Name::new("Md5", None)).unwrap();
        assert!(table.get(id).is_none());

        table.define(id, fixed("Md5", 16));
        assert!(matches!(table.resolve("Md5"), Some(NamedSchema::Fixed(f)) if f.size == 16));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_duplicate_declaration() {
        let mut table = SymbolTable::new();
        table.declare(Name::new("a.T", None)).unwrap();
        let err = table.declare(Name::new("T", Some("a"))).unwrap_err();
        assert_eq!(err.to_string(), "duplicate name: a.T");
    }

    #[test]
    fn test_reference_to_declared_name() {
        let mut table = SymbolTable::new();
        let id = table.declare(Name::new("LongList", None)).unwrap();
        assert_eq!(table.reference("LongList", None, "$"), id);
        assert_eq!(table.undefined().count(), 0);
    }

    #[test]
    fn test_reference_falls_back_to_bare_name() {
        let mut table = SymbolTable::new();
        let id = table.declare(Name::new("Top", None)).unwrap();
        assert_eq!(table.reference("Top", Some("com.example"), "$"), id);
    }

    #[test]
    fn test_forward_reference_filled_later() {
        let mut table = SymbolTable::new();
        let fwd = table.reference("Later", Some("ns"), "$.fields[0].type");
        assert_eq!(table.undefined().count(), 1);

        let id = table.declare(Name::new("Later", Some("ns"))).unwrap();
        assert_eq!(fwd, id);
        table.define(id, fixed("ns.Later", 4));
        assert_eq!(table.undefined().count(), 0);
    }

    #[test]
    fn test_unfilled_forward_reference_is_undefined() {
        let mut table = SymbolTable::new();
        table.reference("LongListA", None, "$.fields[1].type[0]");
        let undefined: Vec<_> = table.undefined().collect();
        assert_eq!(undefined.len(), 1);
        assert_eq!(undefined[0].0.fullname(), "LongListA");
        assert_eq!(undefined[0].1, "$.fields[1].type[0]");
    }

    #[test]
    fn test_abandoned_is_not_undefined() {
        let mut table = SymbolTable::new();
        let id = table.declare(Name::new("Broken", None)).unwrap();
        table.abandon(id);
        assert_eq!(table.undefined().count(), 0);
        assert!(table.resolve("Broken").is_none());
        assert!(table.declare(Name::new("Broken", None)).is_err());
    }
}
