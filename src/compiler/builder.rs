//! Node builder
//!
//! Walks a JSON value depth-first and materializes schema nodes. Problems go
//! to the diagnostics queue; a sub-tree that fails to build reports
//! [`Reported`] to its parent, which keeps checking its other children.

use serde_json::{Map, Value};
use std::collections::HashSet;
use tracing::trace;

use crate::diagnostics::{DiagnosticCode, Diagnostics};
use crate::name::{check_identifier, Name};
use crate::schema::{
    ArraySchema, Declaration, EnumSchema, Field, FieldOrder, FixedSchema, MapSchema, NamedSchema,
    RecordSchema, SchemaNode, UnionSchema,
};
use crate::symbols::{SymbolId, SymbolTable};

use super::validate::{describe, json_kind, union_violations, DefaultChecker, UnionViolation};
use super::CompileOptions;

/// Marker for a sub-tree whose problems are already in the diagnostics queue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Reported;

pub(crate) type Built<T> = Result<T, Reported>;

/// Complex kinds that only exist in object form
const COMPLEX_KINDS: [&str; 6] = ["record", "error", "enum", "array", "map", "fixed"];

/// Default whose check has to wait for a named type to be finished
#[derive(Debug)]
struct DeferredDefault {
    field: String,
    location: String,
    pending: Vec<(SymbolId, Value)>,
}

pub(crate) struct Builder {
    options: CompileOptions,
    symbols: SymbolTable,
    diagnostics: Diagnostics,
    deferred: Vec<DeferredDefault>,
}

impl Builder {
    pub(crate) fn new(options: CompileOptions) -> Self {
        Self {
            options,
            symbols: SymbolTable::new(),
            diagnostics: Diagnostics::new(),
            deferred: Vec::new(),
        }
    }

    /// Report names that were never defined, settle deferred defaults, and
    /// hand back the symbol table and everything recorded
    pub(crate) fn finish(mut self) -> (SymbolTable, Diagnostics) {
        let undefined: Vec<(String, String)> = self
            .symbols
            .undefined()
            .map(|(name, location)| (name.fullname(), location.to_string()))
            .collect();
        for (name, location) in undefined {
            self.diagnostics.record(
                DiagnosticCode::UndefinedName,
                location,
                format!("undefined name: {}", name),
            );
        }

        for deferred in std::mem::take(&mut self.deferred) {
            trace!(field = %deferred.field, "checking deferred default");
            let mut checker = DefaultChecker::new(&self.symbols);
            let conforms = deferred.pending.iter().all(|(id, value)| match self.symbols.get(*id) {
                Some(named) => checker.conforms_named(named, value),
                None => true,
            });
            if !conforms {
                self.diagnostics.record(
                    DiagnosticCode::InvalidDefault,
                    deferred.location,
                    format!("invalid default value for field {}", deferred.field),
                );
            }
        }

        (self.symbols, self.diagnostics)
    }

    /// Build any schema value: a type name, an object, or a union array
    pub(crate) fn build(
        &mut self,
        value: &Value,
        namespace: Option<&str>,
        loc: &str,
    ) -> Built<SchemaNode> {
        match value {
            Value::String(name) => self.build_name(name, namespace, loc),
            Value::Object(obj) => self.build_object(obj, namespace, loc),
            Value::Array(branches) => self.build_union(branches, namespace, loc),
            other => self.fail(
                DiagnosticCode::UnsupportedShape,
                loc,
                format!("not a valid schema: {}", json_kind(other)),
            ),
        }
    }

    fn build_name(&mut self, name: &str, namespace: Option<&str>, loc: &str) -> Built<SchemaNode> {
        if let Some(node) = SchemaNode::primitive(name) {
            return Ok(node);
        }
        if COMPLEX_KINDS.contains(&name) {
            return self.fail(
                DiagnosticCode::UnknownType,
                loc,
                format!("{} is a complex type and must be written as an object", name),
            );
        }
        Ok(SchemaNode::Reference(self.symbols.reference(name, namespace, loc)))
    }

    fn build_object(
        &mut self,
        obj: &Map<String, Value>,
        namespace: Option<&str>,
        loc: &str,
    ) -> Built<SchemaNode> {
        let Some(type_value) = obj.get("type") else {
            return self.fail(DiagnosticCode::MissingAttribute, loc, "no type");
        };

        match type_value {
            Value::String(kind) => match kind.as_str() {
                "record" => self.build_record(obj, false, namespace, loc),
                "error" => self.build_record(obj, true, namespace, loc),
                "enum" => self.build_enum(obj, namespace, loc),
                "array" => self.build_array(obj, namespace, loc),
                "map" => self.build_map(obj, namespace, loc),
                "fixed" => self.build_fixed(obj, namespace, loc),
                other => self.build_name(other, namespace, &format!("{}.type", loc)),
            },
            Value::Object(_) | Value::Array(_) => {
                self.build(type_value, namespace, &format!("{}.type", loc))
            }
            other => self.fail(
                DiagnosticCode::UnknownType,
                loc,
                format!("type must be a string, object or array, found {}", json_kind(other)),
            ),
        }
    }

    // =========================================================================
    // Named kinds
    // =========================================================================

    fn build_record(
        &mut self,
        obj: &Map<String, Value>,
        is_error: bool,
        enclosing: Option<&str>,
        loc: &str,
    ) -> Built<SchemaNode> {
        let decl = self.declaration(obj, enclosing, loc)?;
        // Declared before the fields so that they can refer back to it
        let id = self.declare(&decl.name, loc)?;

        match self.record_fields(obj, decl.name.namespace(), loc) {
            Ok(fields) => {
                let record = RecordSchema { decl, fields };
                let named = if is_error {
                    NamedSchema::Error(record)
                } else {
                    NamedSchema::Record(record)
                };
                self.symbols.define(id, named);
                Ok(SchemaNode::Named(id))
            }
            Err(reported) => {
                self.symbols.abandon(id);
                Err(reported)
            }
        }
    }

    fn record_fields(
        &mut self,
        obj: &Map<String, Value>,
        namespace: Option<&str>,
        loc: &str,
    ) -> Built<Vec<Field>> {
        let items = match obj.get("fields") {
            None => return self.fail(DiagnosticCode::MissingAttribute, loc, "no fields"),
            Some(Value::Array(items)) => items,
            Some(_) => {
                return self.fail(DiagnosticCode::InvalidAttribute, loc, "fields not an array")
            }
        };

        let mut fields = Vec::with_capacity(items.len());
        let mut seen = HashSet::new();
        let mut failed = false;

        for (i, item) in items.iter().enumerate() {
            let field_loc = format!("{}.fields[{}]", loc, i);
            match self.build_field(item, namespace, &field_loc) {
                Ok(field) => {
                    if !seen.insert(field.name.clone()) {
                        self.diagnostics.record(
                            DiagnosticCode::DuplicateField,
                            &field_loc,
                            format!("duplicate field name: {}", field.name),
                        );
                        failed = true;
                    }
                    fields.push(field);
                }
                Err(Reported) => failed = true,
            }
        }

        if failed {
            Err(Reported)
        } else {
            Ok(fields)
        }
    }

    fn build_field(&mut self, item: &Value, namespace: Option<&str>, loc: &str) -> Built<Field> {
        let Value::Object(obj) = item else {
            return self.fail(
                DiagnosticCode::InvalidAttribute,
                loc,
                format!("field must be an object, found {}", json_kind(item)),
            );
        };

        let name = match obj.get("name") {
            None => self.fail(DiagnosticCode::MissingAttribute, loc, "field has no name"),
            Some(Value::String(name)) => self.identifier(name, loc).map(|_| name.clone()),
            Some(_) => self.fail(DiagnosticCode::InvalidName, loc, "field name not a string"),
        };
        let schema = match obj.get("type") {
            None => self.fail(DiagnosticCode::MissingAttribute, loc, "field has no type"),
            Some(type_value) => self.build(type_value, namespace, &format!("{}.type", loc)),
        };
        let doc = self.doc(obj, loc);
        let order = self.order(obj, loc);
        let aliases = self.aliases(obj, loc);

        let (name, schema, doc, order, aliases) = (name?, schema?, doc?, order?, aliases?);
        let default = obj.get("default").cloned();

        if let Some(value) = &default {
            if self.options.validate_defaults {
                self.check_default(&name, &schema, value, loc)?;
            }
        }

        Ok(Field {
            name,
            schema,
            doc,
            default,
            order,
            aliases,
        })
    }

    fn build_enum(
        &mut self,
        obj: &Map<String, Value>,
        enclosing: Option<&str>,
        loc: &str,
    ) -> Built<SchemaNode> {
        let decl = self.declaration(obj, enclosing, loc);
        let id = self.declare_if_valid(&decl, loc);
        let symbols = self.enum_symbols(obj, loc);
        let (decl, id) = (decl?, id?);

        match symbols {
            Ok(symbols) => {
                self.symbols.define(id, NamedSchema::Enum(EnumSchema { decl, symbols }));
                Ok(SchemaNode::Named(id))
            }
            Err(reported) => {
                self.symbols.abandon(id);
                Err(reported)
            }
        }
    }

    fn enum_symbols(&mut self, obj: &Map<String, Value>, loc: &str) -> Built<Vec<String>> {
        let items = match obj.get("symbols") {
            None => return self.fail(DiagnosticCode::MissingAttribute, loc, "no symbols"),
            Some(Value::Array(items)) => items,
            Some(_) => {
                return self.fail(DiagnosticCode::InvalidAttribute, loc, "symbols not an array")
            }
        };
        if items.is_empty() {
            return self.fail(DiagnosticCode::InvalidAttribute, loc, "enum has no symbols");
        }

        let mut symbols: Vec<String> = Vec::with_capacity(items.len());
        let mut failed = false;
        for (i, item) in items.iter().enumerate() {
            let symbol_loc = format!("{}.symbols[{}]", loc, i);
            let Value::String(symbol) = item else {
                self.diagnostics.record(
                    DiagnosticCode::InvalidAttribute,
                    symbol_loc,
                    format!("enum symbol not a string: {}", item),
                );
                failed = true;
                continue;
            };
            if self.identifier(symbol, &symbol_loc).is_err() {
                failed = true;
            }
            if symbols.contains(symbol) {
                self.diagnostics.record(
                    DiagnosticCode::DuplicateSymbol,
                    symbol_loc,
                    format!("duplicate symbol: {}", symbol),
                );
                failed = true;
            }
            symbols.push(symbol.clone());
        }

        if failed {
            Err(Reported)
        } else {
            Ok(symbols)
        }
    }

    fn build_fixed(
        &mut self,
        obj: &Map<String, Value>,
        enclosing: Option<&str>,
        loc: &str,
    ) -> Built<SchemaNode> {
        let decl = self.declaration(obj, enclosing, loc);
        let id = self.declare_if_valid(&decl, loc);
        let size = match obj.get("size") {
            None => self.fail(DiagnosticCode::MissingAttribute, loc, "no size"),
            Some(value) => match value.as_u64() {
                Some(size) if size > 0 => Ok(size),
                _ => self.fail(
                    DiagnosticCode::InvalidAttribute,
                    loc,
                    format!("size must be a positive integer, found {}", value),
                ),
            },
        };
        let (decl, id) = (decl?, id?);

        match size {
            Ok(size) => {
                self.symbols.define(id, NamedSchema::Fixed(FixedSchema { decl, size }));
                Ok(SchemaNode::Named(id))
            }
            Err(reported) => {
                self.symbols.abandon(id);
                Err(reported)
            }
        }
    }

    /// Name, namespace, aliases and doc of a named type
    fn declaration(
        &mut self,
        obj: &Map<String, Value>,
        enclosing: Option<&str>,
        loc: &str,
    ) -> Built<Declaration> {
        let namespace_attr = match obj.get("namespace") {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(ns)) => Ok(Some(ns.clone())),
            Some(_) => self.fail(DiagnosticCode::InvalidAttribute, loc, "namespace not a string"),
        };
        let name_attr = match obj.get("name") {
            None => self.fail(DiagnosticCode::MissingAttribute, loc, "no name"),
            Some(Value::String(name)) => Ok(name.clone()),
            Some(_) => self.fail(DiagnosticCode::InvalidName, loc, "name not a string"),
        };
        let aliases = self.aliases(obj, loc);
        let doc = self.doc(obj, loc);
        let (namespace_attr, name_attr, aliases, doc) =
            (namespace_attr?, name_attr?, aliases?, doc?);

        let name = Name::new(&name_attr, namespace_attr.as_deref().or(enclosing));
        if self.options.validate_names {
            if let Err(message) = name.check() {
                return self.fail(DiagnosticCode::InvalidName, loc, message);
            }
        }

        Ok(Declaration {
            name,
            name_attr,
            namespace_attr,
            aliases,
            doc,
        })
    }

    /// Reserve the name of a type whose declaration parsed, so that uses of
    /// it resolve even when the rest of its definition is rejected
    fn declare_if_valid(&mut self, decl: &Built<Declaration>, loc: &str) -> Built<SymbolId> {
        match decl {
            Ok(decl) => self.declare(&decl.name, loc),
            Err(reported) => Err(*reported),
        }
    }

    fn declare(&mut self, name: &Name, loc: &str) -> Built<SymbolId> {
        match self.symbols.declare(name.clone()) {
            Ok(id) => Ok(id),
            Err(e) => self.fail(DiagnosticCode::DuplicateName, loc, e.to_string()),
        }
    }

    // =========================================================================
    // Unnamed complex kinds
    // =========================================================================

    fn build_array(
        &mut self,
        obj: &Map<String, Value>,
        namespace: Option<&str>,
        loc: &str,
    ) -> Built<SchemaNode> {
        let doc = self.doc(obj, loc);
        let items = match obj.get("items") {
            None => self.fail(DiagnosticCode::MissingAttribute, loc, "no items"),
            Some(items) => self.build(items, namespace, &format!("{}.items", loc)),
        };
        let (doc, items) = (doc?, items?);
        Ok(SchemaNode::Array(ArraySchema {
            items: Box::new(items),
            doc,
        }))
    }

    fn build_map(
        &mut self,
        obj: &Map<String, Value>,
        namespace: Option<&str>,
        loc: &str,
    ) -> Built<SchemaNode> {
        let doc = self.doc(obj, loc);
        let values = match obj.get("values") {
            None => self.fail(DiagnosticCode::MissingAttribute, loc, "no values"),
            Some(values) => self.build(values, namespace, &format!("{}.values", loc)),
        };
        let (doc, values) = (doc?, values?);
        Ok(SchemaNode::Map(MapSchema {
            values: Box::new(values),
            doc,
        }))
    }

    fn build_union(
        &mut self,
        items: &[Value],
        namespace: Option<&str>,
        loc: &str,
    ) -> Built<SchemaNode> {
        let mut branches = Vec::with_capacity(items.len());
        let mut failed = false;
        for (i, item) in items.iter().enumerate() {
            match self.build(item, namespace, &format!("{}[{}]", loc, i)) {
                Ok(node) => branches.push((i, node)),
                Err(Reported) => failed = true,
            }
        }

        for violation in union_violations(&branches, &self.symbols) {
            failed = true;
            match violation {
                UnionViolation::Duplicate { position, type_name } => self.diagnostics.record(
                    DiagnosticCode::DuplicateUnionBranch,
                    format!("{}[{}]", loc, position),
                    format!("duplicate type in union: {}", type_name),
                ),
                UnionViolation::Nested { position } => self.diagnostics.record(
                    DiagnosticCode::NestedUnion,
                    format!("{}[{}]", loc, position),
                    "union may not immediately contain another union",
                ),
            }
        }

        if failed {
            return Err(Reported);
        }
        Ok(SchemaNode::Union(UnionSchema {
            branches: branches.into_iter().map(|(_, node)| node).collect(),
        }))
    }

    // =========================================================================
    // Attributes
    // =========================================================================

    fn doc(&mut self, obj: &Map<String, Value>, loc: &str) -> Built<Option<String>> {
        match obj.get("doc") {
            None => Ok(None),
            Some(Value::String(doc)) => Ok(Some(doc.clone())),
            Some(_) => self.fail(DiagnosticCode::InvalidAttribute, loc, "doc not a string"),
        }
    }

    fn aliases(&mut self, obj: &Map<String, Value>, loc: &str) -> Built<Vec<String>> {
        let items = match obj.get("aliases") {
            None => return Ok(Vec::new()),
            Some(Value::Array(items)) => items,
            Some(_) => {
                return self.fail(DiagnosticCode::InvalidAttribute, loc, "aliases not an array")
            }
        };

        let mut aliases = Vec::with_capacity(items.len());
        for item in items {
            let Value::String(alias) = item else {
                return self.fail(
                    DiagnosticCode::InvalidAttribute,
                    loc,
                    format!("alias not a string: {}", item),
                );
            };
            if self.options.validate_names {
                if let Some(bad) = alias.split('.').find(|part| check_identifier(part).is_err()) {
                    return self.fail(
                        DiagnosticCode::InvalidName,
                        loc,
                        format!("invalid alias: {} ({:?})", alias, bad),
                    );
                }
            }
            aliases.push(alias.clone());
        }
        Ok(aliases)
    }

    fn order(&mut self, obj: &Map<String, Value>, loc: &str) -> Built<Option<FieldOrder>> {
        match obj.get("order") {
            None => Ok(None),
            Some(value) => match value.as_str().and_then(FieldOrder::parse) {
                Some(order) => Ok(Some(order)),
                None => self.fail(
                    DiagnosticCode::InvalidAttribute,
                    loc,
                    format!("order must be ascending, descending or ignore, found {}", value),
                ),
            },
        }
    }

    /// Field names and enum symbols
    fn identifier(&mut self, s: &str, loc: &str) -> Built<()> {
        if !self.options.validate_names {
            return Ok(());
        }
        match check_identifier(s) {
            Ok(()) => Ok(()),
            Err(message) => self.fail(DiagnosticCode::InvalidName, loc, message),
        }
    }

    fn check_default(
        &mut self,
        field: &str,
        schema: &SchemaNode,
        value: &Value,
        loc: &str,
    ) -> Built<()> {
        let (conforms, pending) = {
            let mut checker = DefaultChecker::new(&self.symbols);
            let conforms = checker.conforms(schema, value);
            (conforms, checker.into_deferred())
        };
        if !conforms {
            let expected = describe(schema, &self.symbols);
            return self.fail(
                DiagnosticCode::InvalidDefault,
                loc,
                format!(
                    "invalid default value for field {}: {} does not match {}",
                    field,
                    json_kind(value),
                    expected
                ),
            );
        }

        if !pending.is_empty() {
            trace!(field, "default check deferred");
            self.deferred.push(DeferredDefault {
                field: field.to_string(),
                location: loc.to_string(),
                pending,
            });
        }
        Ok(())
    }

    fn fail<T>(&mut self, code: DiagnosticCode, loc: &str, message: impl Into<String>) -> Built<T> {
        self.diagnostics.record(code, loc, message);
        Err(Reported)
    }
}
