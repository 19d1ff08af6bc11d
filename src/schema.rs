//! Schema node model and the compiled schema
//!
//! The compiled type graph is a tree of [`SchemaNode`]s. Unnamed kinds own
//! their children directly. Named kinds (record, error, enum, fixed) live in
//! the [`SymbolTable`]; the tree holds a [`SchemaNode::Named`] handle where
//! the type is defined and a [`SchemaNode::Reference`] handle everywhere it
//! is used by name. This is what lets a record mention itself while it is
//! still being built.

use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::canonical;
use crate::compiler::{self, CompileFailure};
use crate::fingerprint::Fingerprint;
use crate::name::Name;
use crate::symbols::{SymbolId, SymbolTable};

/// Type names that always denote a primitive
pub const PRIMITIVE_NAMES: [&str; 8] = [
    "null", "boolean", "int", "long", "float", "double", "bytes", "string",
];

/// The closed set of schema kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaKind {
    Null,
    Boolean,
    Int,
    Long,
    Float,
    Double,
    Bytes,
    String,
    Record,
    Error,
    Enum,
    Array,
    Map,
    Union,
    Fixed,
    NamedReference,
}

impl SchemaKind {
    /// Name of the kind as written in the `type` attribute
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Boolean => "boolean",
            Self::Int => "int",
            Self::Long => "long",
            Self::Float => "float",
            Self::Double => "double",
            Self::Bytes => "bytes",
            Self::String => "string",
            Self::Record => "record",
            Self::Error => "error",
            Self::Enum => "enum",
            Self::Array => "array",
            Self::Map => "map",
            Self::Union => "union",
            Self::Fixed => "fixed",
            Self::NamedReference => "reference",
        }
    }

    pub fn is_primitive(&self) -> bool {
        matches!(
            self,
            Self::Null
                | Self::Boolean
                | Self::Int
                | Self::Long
                | Self::Float
                | Self::Double
                | Self::Bytes
                | Self::String
        )
    }

    pub fn is_named(&self) -> bool {
        matches!(self, Self::Record | Self::Error | Self::Enum | Self::Fixed)
    }
}

impl fmt::Display for SchemaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A node of the compiled type graph
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaNode {
    Null,
    Boolean,
    Int,
    Long,
    Float,
    Double,
    Bytes,
    String,
    Array(ArraySchema),
    Map(MapSchema),
    Union(UnionSchema),
    /// Definition site of a named type
    Named(SymbolId),
    /// Use of a named type by name
    Reference(SymbolId),
}

impl SchemaNode {
    /// Primitive node for a primitive type name
    pub fn primitive(name: &str) -> Option<Self> {
        Some(match name {
            "null" => Self::Null,
            "boolean" => Self::Boolean,
            "int" => Self::Int,
            "long" => Self::Long,
            "float" => Self::Float,
            "double" => Self::Double,
            "bytes" => Self::Bytes,
            "string" => Self::String,
            _ => return None,
        })
    }

    /// Kind of this node. Named definitions need the symbol table to tell
    /// records, errors, enums and fixed apart; see [`Schema::kind_of`].
    pub fn kind(&self, symbols: &SymbolTable) -> SchemaKind {
        match self {
            Self::Null => SchemaKind::Null,
            Self::Boolean => SchemaKind::Boolean,
            Self::Int => SchemaKind::Int,
            Self::Long => SchemaKind::Long,
            Self::Float => SchemaKind::Float,
            Self::Double => SchemaKind::Double,
            Self::Bytes => SchemaKind::Bytes,
            Self::String => SchemaKind::String,
            Self::Array(_) => SchemaKind::Array,
            Self::Map(_) => SchemaKind::Map,
            Self::Union(_) => SchemaKind::Union,
            Self::Named(id) => symbols
                .get(*id)
                .map(NamedSchema::kind)
                .unwrap_or(SchemaKind::NamedReference),
            Self::Reference(_) => SchemaKind::NamedReference,
        }
    }

    /// Type name of a primitive node
    pub fn primitive_name(&self) -> Option<&'static str> {
        Some(match self {
            Self::Null => "null",
            Self::Boolean => "boolean",
            Self::Int => "int",
            Self::Long => "long",
            Self::Float => "float",
            Self::Double => "double",
            Self::Bytes => "bytes",
            Self::String => "string",
            _ => return None,
        })
    }

    /// Handle of the named type this node defines or refers to
    pub fn symbol(&self) -> Option<SymbolId> {
        match self {
            Self::Named(id) | Self::Reference(id) => Some(*id),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArraySchema {
    pub items: Box<SchemaNode>,
    pub doc: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapSchema {
    pub values: Box<SchemaNode>,
    pub doc: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnionSchema {
    pub branches: Vec<SchemaNode>,
}

/// Naming attributes shared by every named kind
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    /// Resolved fullname
    pub name: Name,
    /// `name` attribute as written
    pub name_attr: String,
    /// `namespace` attribute as written, if present
    pub namespace_attr: Option<String>,
    pub aliases: Vec<String>,
    pub doc: Option<String>,
}

/// A named type, owned by the symbol table
#[derive(Debug, Clone, PartialEq)]
pub enum NamedSchema {
    Record(RecordSchema),
    Error(RecordSchema),
    Enum(EnumSchema),
    Fixed(FixedSchema),
}

impl NamedSchema {
    pub fn kind(&self) -> SchemaKind {
        match self {
            Self::Record(_) => SchemaKind::Record,
            Self::Error(_) => SchemaKind::Error,
            Self::Enum(_) => SchemaKind::Enum,
            Self::Fixed(_) => SchemaKind::Fixed,
        }
    }

    pub fn declaration(&self) -> &Declaration {
        match self {
            Self::Record(r) | Self::Error(r) => &r.decl,
            Self::Enum(e) => &e.decl,
            Self::Fixed(f) => &f.decl,
        }
    }

    pub fn name(&self) -> &Name {
        &self.declaration().name
    }

    pub fn doc(&self) -> Option<&str> {
        self.declaration().doc.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordSchema {
    pub decl: Declaration,
    pub fields: Vec<Field>,
}

impl RecordSchema {
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// A record field
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub schema: SchemaNode,
    pub doc: Option<String>,
    pub default: Option<Value>,
    pub order: Option<FieldOrder>,
    pub aliases: Vec<String>,
}

/// Sort order of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldOrder {
    Ascending,
    Descending,
    Ignore,
}

impl FieldOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ascending => "ascending",
            Self::Descending => "descending",
            Self::Ignore => "ignore",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ascending" => Some(Self::Ascending),
            "descending" => Some(Self::Descending),
            "ignore" => Some(Self::Ignore),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumSchema {
    pub decl: Declaration,
    pub symbols: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FixedSchema {
    pub decl: Declaration,
    pub size: u64,
}

// =============================================================================
// Compiled Schema
// =============================================================================

/// A compiled, validated schema: the root node plus every named type it defines.
///
/// Immutable once built; dropping it releases the whole graph.
#[derive(Debug, Clone)]
pub struct Schema {
    root: SchemaNode,
    symbols: SymbolTable,
}

impl Schema {
    pub(crate) fn new(root: SchemaNode, symbols: SymbolTable) -> Self {
        Self { root, symbols }
    }

    /// Compile schema source text with default options
    pub fn parse_str(source: &str) -> std::result::Result<Self, CompileFailure> {
        compiler::compile(source)
    }

    pub fn root(&self) -> &SchemaNode {
        &self.root
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    /// Kind of any node belonging to this schema
    pub fn kind_of(&self, node: &SchemaNode) -> SchemaKind {
        node.kind(&self.symbols)
    }

    /// Named type a definition or reference node stands for
    pub fn named(&self, node: &SchemaNode) -> Option<&NamedSchema> {
        node.symbol().and_then(|id| self.symbols.get(id))
    }

    /// Look up a named type by fullname
    pub fn resolve(&self, fullname: &str) -> Option<&NamedSchema> {
        self.symbols.resolve(fullname)
    }

    /// Every named type, in declaration order
    pub fn named_types(&self) -> impl Iterator<Item = &NamedSchema> {
        self.symbols.iter()
    }

    /// Serialize to JSON text, formatted or compact
    pub fn to_json(&self, pretty: bool) -> String {
        canonical::to_json(self, pretty)
    }

    /// Canonical JSON value of this schema
    pub fn to_value(&self) -> Value {
        canonical::to_value(self)
    }

    /// Normalized text used for fingerprinting
    pub fn parsing_canonical_form(&self) -> String {
        canonical::parsing_canonical_form(self)
    }

    /// SHA-256 of the parsing canonical form
    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::of(self)
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_json(false))
    }
}

impl FromStr for Schema {
    type Err = CompileFailure;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::parse_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitive_lookup() {
        for name in PRIMITIVE_NAMES {
            let node = SchemaNode::primitive(name).unwrap();
            assert_eq!(node.primitive_name(), Some(name));
        }
        assert!(SchemaNode::primitive("record").is_none());
    }

    #[test]
    fn test_field_order_parse() {
        assert_eq!(FieldOrder::parse("descending"), Some(FieldOrder::Descending));
        assert_eq!(FieldOrder::parse("up"), None);
        assert_eq!(FieldOrder::Ignore.as_str(), "ignore");
    }

    #[test]
    fn test_kind_of_named_definitions() {
        let schema: Schema = r#"{"type":"error","name":"Oops","fields":[]}"#.parse().unwrap();
        assert_eq!(schema.kind_of(schema.root()), SchemaKind::Error);
        assert!(SchemaKind::Error.is_named());
        assert!(!SchemaKind::Array.is_primitive());
    }
}
