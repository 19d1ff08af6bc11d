//! Canonical serializer
//!
//! Writes a compiled schema back out as JSON. Formatted and compact output
//! share one key order and differ only in whitespace:
//!
//! - named types: `type`, `namespace`, `name`, `aliases`, `doc`, then
//!   `fields` / `symbols` / `size`
//! - arrays and maps: `type`, `doc`, `items` / `values`
//! - fields: `name`, `type`, `doc`, `default`, `order`, `aliases`
//!
//! The parsing canonical form is a separate, normalized rendering used for
//! fingerprints.

use serde_json::{Map, Value};

use crate::schema::{Field, NamedSchema, Schema, SchemaNode};
use crate::symbols::SymbolTable;

/// Serialize `schema` to JSON text
pub fn to_json(schema: &Schema, pretty: bool) -> String {
    let value = to_value(schema);
    let text = if pretty {
        serde_json::to_string_pretty(&value)
    } else {
        serde_json::to_string(&value)
    };
    text.unwrap_or_default()
}

/// Canonical JSON value of `schema`
pub fn to_value(schema: &Schema) -> Value {
    Writer {
        symbols: schema.symbols(),
    }
    .node(schema.root(), None)
}

/// Parsing canonical form of `schema` as compact text
pub fn parsing_canonical_form(schema: &Schema) -> String {
    let value = ParsingForm {
        symbols: schema.symbols(),
    }
    .node(schema.root());
    serde_json::to_string(&value).unwrap_or_default()
}

struct Writer<'a> {
    symbols: &'a SymbolTable,
}

impl Writer<'_> {
    fn node(&self, node: &SchemaNode, namespace: Option<&str>) -> Value {
        match node {
            SchemaNode::Null
            | SchemaNode::Boolean
            | SchemaNode::Int
            | SchemaNode::Long
            | SchemaNode::Float
            | SchemaNode::Double
            | SchemaNode::Bytes
            | SchemaNode::String => Value::from(node.primitive_name().unwrap_or_default()),
            SchemaNode::Array(array) => {
                let mut obj = Map::new();
                obj.insert("type".into(), "array".into());
                insert_opt(&mut obj, "doc", &array.doc);
                obj.insert("items".into(), self.node(&array.items, namespace));
                Value::Object(obj)
            }
            SchemaNode::Map(map) => {
                let mut obj = Map::new();
                obj.insert("type".into(), "map".into());
                insert_opt(&mut obj, "doc", &map.doc);
                obj.insert("values".into(), self.node(&map.values, namespace));
                Value::Object(obj)
            }
            SchemaNode::Union(union) => {
                Value::Array(union.branches.iter().map(|b| self.node(b, namespace)).collect())
            }
            SchemaNode::Named(id) => match self.symbols.get(*id) {
                Some(named) => self.named(named),
                None => Value::from(self.symbols.name(*id).relative_to(namespace)),
            },
            SchemaNode::Reference(id) => Value::from(self.symbols.name(*id).relative_to(namespace)),
        }
    }

    fn named(&self, named: &NamedSchema) -> Value {
        let decl = named.declaration();
        let namespace = decl.name.namespace();

        let mut obj = Map::new();
        obj.insert("type".into(), named.kind().as_str().into());
        insert_opt(&mut obj, "namespace", &decl.namespace_attr);
        obj.insert("name".into(), decl.name_attr.clone().into());
        insert_aliases(&mut obj, &decl.aliases);
        insert_opt(&mut obj, "doc", &decl.doc);

        match named {
            NamedSchema::Record(record) | NamedSchema::Error(record) => {
                let fields = record.fields.iter().map(|f| self.field(f, namespace)).collect();
                obj.insert("fields".into(), Value::Array(fields));
            }
            NamedSchema::Enum(e) => {
                obj.insert("symbols".into(), e.symbols.clone().into());
            }
            NamedSchema::Fixed(f) => {
                obj.insert("size".into(), f.size.into());
            }
        }
        Value::Object(obj)
    }

    fn field(&self, field: &Field, namespace: Option<&str>) -> Value {
        let mut obj = Map::new();
        obj.insert("name".into(), field.name.clone().into());
        obj.insert("type".into(), self.node(&field.schema, namespace));
        insert_opt(&mut obj, "doc", &field.doc);
        if let Some(default) = &field.default {
            obj.insert("default".into(), default.clone());
        }
        if let Some(order) = field.order {
            obj.insert("order".into(), order.as_str().into());
        }
        insert_aliases(&mut obj, &field.aliases);
        Value::Object(obj)
    }
}

/// Normalized rendering: fullnames only, no documentation or defaults,
/// fixed key order `name, type, fields, symbols, items, values, size`.
struct ParsingForm<'a> {
    symbols: &'a SymbolTable,
}

impl ParsingForm<'_> {
    fn node(&self, node: &SchemaNode) -> Value {
        match node {
            SchemaNode::Null
            | SchemaNode::Boolean
            | SchemaNode::Int
            | SchemaNode::Long
            | SchemaNode::Float
            | SchemaNode::Double
            | SchemaNode::Bytes
            | SchemaNode::String => Value::from(node.primitive_name().unwrap_or_default()),
            SchemaNode::Array(array) => {
                let mut obj = Map::new();
                obj.insert("type".into(), "array".into());
                obj.insert("items".into(), self.node(&array.items));
                Value::Object(obj)
            }
            SchemaNode::Map(map) => {
                let mut obj = Map::new();
                obj.insert("type".into(), "map".into());
                obj.insert("values".into(), self.node(&map.values));
                Value::Object(obj)
            }
            SchemaNode::Union(union) => {
                Value::Array(union.branches.iter().map(|b| self.node(b)).collect())
            }
            SchemaNode::Named(id) => match self.symbols.get(*id) {
                Some(named) => self.named(named),
                None => Value::from(self.symbols.name(*id).fullname()),
            },
            SchemaNode::Reference(id) => Value::from(self.symbols.name(*id).fullname()),
        }
    }

    fn named(&self, named: &NamedSchema) -> Value {
        let mut obj = Map::new();
        obj.insert("name".into(), named.name().fullname().into());
        match named {
            // errors are records on the wire
            NamedSchema::Record(record) | NamedSchema::Error(record) => {
                obj.insert("type".into(), "record".into());
                let fields = record
                    .fields
                    .iter()
                    .map(|f| {
                        let mut field = Map::new();
                        field.insert("name".into(), f.name.clone().into());
                        field.insert("type".into(), self.node(&f.schema));
                        Value::Object(field)
                    })
                    .collect();
                obj.insert("fields".into(), Value::Array(fields));
            }
            NamedSchema::Enum(e) => {
                obj.insert("type".into(), "enum".into());
                obj.insert("symbols".into(), e.symbols.clone().into());
            }
            NamedSchema::Fixed(f) => {
                obj.insert("type".into(), "fixed".into());
                obj.insert("size".into(), f.size.into());
            }
        }
        Value::Object(obj)
    }
}

fn insert_opt(obj: &mut Map<String, Value>, key: &str, value: &Option<String>) {
    if let Some(value) = value {
        obj.insert(key.to_string(), value.clone().into());
    }
}

fn insert_aliases(obj: &mut Map<String, Value>, aliases: &[String]) {
    if !aliases.is_empty() {
        obj.insert("aliases".into(), aliases.to_vec().into());
    }
}
