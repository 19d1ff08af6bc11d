//! Union composition and default value rules

use serde_json::Value;
use std::collections::HashMap;

use crate::schema::{NamedSchema, RecordSchema, SchemaKind, SchemaNode};
use crate::symbols::{SymbolId, SymbolTable};

/// What makes two union branches the same
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum BranchKey {
    /// Unnamed kinds: at most one of each
    Kind(SchemaKind),
    /// Named kinds: at most one per fullname
    Named(SymbolId),
}

fn branch_key(node: &SchemaNode, symbols: &SymbolTable) -> BranchKey {
    match node.symbol() {
        Some(id) => BranchKey::Named(id),
        None => BranchKey::Kind(node.kind(symbols)),
    }
}

/// A rule broken by one union branch
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum UnionViolation {
    /// Same unnamed kind or same fullname as an earlier branch
    Duplicate { position: usize, type_name: String },
    Nested { position: usize },
}

/// Check union composition over `(position, branch)` pairs
pub(crate) fn union_violations(
    branches: &[(usize, SchemaNode)],
    symbols: &SymbolTable,
) -> Vec<UnionViolation> {
    let mut seen: HashMap<BranchKey, usize> = HashMap::new();
    let mut violations = Vec::new();

    for (position, branch) in branches {
        if matches!(branch, SchemaNode::Union(_)) {
            violations.push(UnionViolation::Nested { position: *position });
            continue;
        }
        let key = branch_key(branch, symbols);
        if seen.insert(key, *position).is_some() {
            violations.push(UnionViolation::Duplicate {
                position: *position,
                type_name: describe(branch, symbols),
            });
        }
    }

    violations
}

/// Short type description for messages
pub(crate) fn describe(node: &SchemaNode, symbols: &SymbolTable) -> String {
    match node.symbol() {
        Some(id) => symbols.name(id).fullname(),
        None => node.kind(symbols).as_str().to_string(),
    }
}

/// JSON kind of a literal, for messages
pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "fractional number",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Length of a bytes or fixed literal: a string of U+0000..U+00FF, one
/// character per byte
fn byte_string_len(value: &Value) -> Option<u64> {
    let s = value.as_str()?;
    if s.chars().all(|c| u32::from(c) <= 0xff) {
        Some(s.chars().count() as u64)
    } else {
        None
    }
}

/// Checks a default literal against a type.
///
/// Parts of the literal that meet a named type still under construction
/// are set aside in `deferred` and checked once the whole schema is built.
pub(crate) struct DefaultChecker<'a> {
    symbols: &'a SymbolTable,
    deferred: Vec<(SymbolId, Value)>,
}

impl<'a> DefaultChecker<'a> {
    pub(crate) fn new(symbols: &'a SymbolTable) -> Self {
        Self {
            symbols,
            deferred: Vec::new(),
        }
    }

    pub(crate) fn into_deferred(self) -> Vec<(SymbolId, Value)> {
        self.deferred
    }

    pub(crate) fn conforms(&mut self, node: &SchemaNode, value: &Value) -> bool {
        let symbols = self.symbols;
        match node {
            SchemaNode::Null => value.is_null(),
            SchemaNode::Boolean => value.is_boolean(),
            SchemaNode::Int => value
                .as_i64()
                .map(|n| i32::try_from(n).is_ok())
                .unwrap_or(false),
            SchemaNode::Long => value.as_i64().is_some(),
            SchemaNode::Float | SchemaNode::Double => value.is_number(),
            SchemaNode::Bytes => byte_string_len(value).is_some(),
            SchemaNode::String => value.is_string(),
            SchemaNode::Array(array) => match value.as_array() {
                Some(items) => items.iter().all(|item| self.conforms(&array.items, item)),
                None => false,
            },
            SchemaNode::Map(map) => match value.as_object() {
                Some(entries) => entries.values().all(|v| self.conforms(&map.values, v)),
                None => false,
            },
            SchemaNode::Union(union) => self.conforms_first(&union.branches, value),
            SchemaNode::Named(id) | SchemaNode::Reference(id) => match symbols.get(*id) {
                Some(named) => self.conforms_named(named, value),
                None => {
                    self.deferred.push((*id, value.clone()));
                    true
                }
            },
        }
    }

    pub(crate) fn conforms_named(&mut self, named: &NamedSchema, value: &Value) -> bool {
        match named {
            NamedSchema::Record(record) | NamedSchema::Error(record) => {
                self.conforms_record(record, value)
            }
            NamedSchema::Enum(e) => value
                .as_str()
                .map(|s| e.symbols.iter().any(|sym| sym == s))
                .unwrap_or(false),
            NamedSchema::Fixed(f) => byte_string_len(value) == Some(f.size),
        }
    }

    fn conforms_record(&mut self, record: &RecordSchema, value: &Value) -> bool {
        let Some(object) = value.as_object() else {
            return false;
        };
        record.fields.iter().all(|field| match object.get(&field.name) {
            Some(v) => self.conforms(&field.schema, v),
            None => field.default.is_some(),
        })
    }

    /// A union default is a value of the first branch
    fn conforms_first(&mut self, branches: &[SchemaNode], value: &Value) -> bool {
        match branches.first() {
            Some(first) => self.conforms(first, value),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn check(node: &SchemaNode, value: Value) -> bool {
        let symbols = SymbolTable::new();
        DefaultChecker::new(&symbols).conforms(node, &value)
    }

    #[test]
    fn test_numeric_defaults() {
        assert!(check(&SchemaNode::Double, json!(2)));
        assert!(check(&SchemaNode::Double, json!(1.2)));
        assert!(!check(&SchemaNode::Double, json!(null)));
        assert!(!check(&SchemaNode::Double, json!("string")));

        assert!(check(&SchemaNode::Long, json!(-7)));
        assert!(!check(&SchemaNode::Long, json!(1.5)));
        assert!(check(&SchemaNode::Int, json!(2147483647)));
        assert!(!check(&SchemaNode::Int, json!(2147483648i64)));
    }

    #[test]
    fn test_scalar_defaults() {
        assert!(check(&SchemaNode::Null, json!(null)));
        assert!(!check(&SchemaNode::Null, json!(0)));
        assert!(check(&SchemaNode::Boolean, json!(true)));
        assert!(check(&SchemaNode::Bytes, json!("\u{00ff}")));
        assert!(!check(&SchemaNode::Bytes, json!("\u{0100}")));
        assert!(!check(&SchemaNode::String, json!(1)));
    }

    #[test]
    fn test_collection_defaults() {
        use crate::schema::{ArraySchema, MapSchema, UnionSchema};

        let array = SchemaNode::Array(ArraySchema {
            items: Box::new(SchemaNode::Int),
            doc: None,
        });
        assert!(check(&array, json!([1, 2, 3])));
        assert!(!check(&array, json!([1, "two"])));
        assert!(!check(&array, json!({})));

        let map = SchemaNode::Map(MapSchema {
            values: Box::new(SchemaNode::String),
            doc: None,
        });
        assert!(check(&map, json!({"a": "b"})));
        assert!(!check(&map, json!({"a": 1})));

        let union = SchemaNode::Union(UnionSchema {
            branches: vec![SchemaNode::Null, SchemaNode::Long],
        });
        assert!(check(&union, json!(null)));
        assert!(!check(&union, json!(5)));
        assert!(!check(&union, json!("x")));
    }

    #[test]
    fn test_fixed_default_matches_size() {
        use crate::name::Name;
        use crate::schema::{Declaration, FixedSchema};

        let fixed = NamedSchema::Fixed(FixedSchema {
            decl: Declaration {
                name: Name::new("Md5", None),
                name_attr: "Md5".to_string(),
                namespace_attr: None,
                aliases: Vec::new(),
                doc: None,
            },
            size: 4,
        });
        let symbols = SymbolTable::new();
        let mut checker = DefaultChecker::new(&symbols);
        assert!(checker.conforms_named(&fixed, &json!("\u{00}\u{01}\u{fe}\u{ff}")));
        assert!(!checker.conforms_named(&fixed, &json!("abc")));
        assert!(!checker.conforms_named(&fixed, &json!("twelve chars")));
        assert!(!checker.conforms_named(&fixed, &json!("\u{0100}bcd")));
    }

    #[test]
    fn test_union_violations() {
        let symbols = SymbolTable::new();
        let branches = vec![
            (0, SchemaNode::String),
            (1, SchemaNode::Long),
            (2, SchemaNode::Long),
        ];
        let violations = union_violations(&branches, &symbols);
        assert_eq!(
            violations,
            vec![UnionViolation::Duplicate {
                position: 2,
                type_name: "long".to_string()
            }]
        );
    }

    #[test]
    fn test_json_kind() {
        assert_eq!(json_kind(&json!(1)), "integer");
        assert_eq!(json_kind(&json!(1.5)), "fractional number");
        assert_eq!(json_kind(&json!([])), "array");
    }
}
