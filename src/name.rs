//! Fullnames of named types
//!
//! A fullname is `namespace.simplename`, or just `simplename` without a
//! namespace. Nested named types inherit the enclosing namespace unless they
//! carry their own.

use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

use crate::schema::PRIMITIVE_NAMES;

/// Fully-qualified name of a record, error, enum or fixed type
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Name {
    name: String,
    namespace: Option<String>,
}

impl Name {
    /// Build a fullname from a `name` attribute and the namespace in effect.
    ///
    /// A dotted `name` is already a fullname and ignores `namespace`. An
    /// empty namespace string means no namespace.
    pub fn new(name: &str, namespace: Option<&str>) -> Self {
        match name.rsplit_once('.') {
            Some((ns, simple)) => Self {
                name: simple.to_string(),
                namespace: non_empty(ns),
            },
            None => Self {
                name: name.to_string(),
                namespace: namespace.and_then(non_empty),
            },
        }
    }

    /// Simple name, without namespace
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub fn fullname(&self) -> String {
        match &self.namespace {
            Some(ns) => format!("{}.{}", ns, self.name),
            None => self.name.clone(),
        }
    }

    /// Names a by-name reference may denote, most specific first
    pub fn candidates(reference: &str, enclosing: Option<&str>) -> Vec<Name> {
        let qualified = Name::new(reference, enclosing);
        if reference.contains('.') || qualified.namespace.is_none() {
            return vec![qualified];
        }
        vec![qualified, Name::new(reference, None)]
    }

    /// How a reference to this name is written inside `enclosing`
    pub fn relative_to(&self, enclosing: Option<&str>) -> String {
        if self.namespace.is_some() && self.namespace.as_deref() == enclosing {
            self.name.clone()
        } else {
            self.fullname()
        }
    }

    /// Check simple name syntax, namespace components, and reserved words
    pub fn check(&self) -> std::result::Result<(), String> {
        if PRIMITIVE_NAMES.contains(&self.name.as_str()) {
            return Err(format!("{} is a primitive type and can not be redefined", self.name));
        }
        check_identifier(&self.name)?;
        if let Some(ns) = &self.namespace {
            for part in ns.split('.') {
                check_identifier(part).map_err(|_| format!("invalid namespace: {}", ns))?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{}.{}", ns, self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

fn identifier_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap())
}

/// Check that `s` is a legal simple name, field name or enum symbol
pub fn check_identifier(s: &str) -> std::result::Result<(), String> {
    if identifier_pattern().is_match(s) {
        Ok(())
    } else {
        Err(format!("invalid name: {:?}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespace_inheritance() {
        let n = Name::new("MyFixed", Some("org.apache.hadoop.avro"));
        assert_eq!(n.fullname(), "org.apache.hadoop.avro.MyFixed");
        assert_eq!(n.name(), "MyFixed");

        let bare = Name::new("Test", None);
        assert_eq!(bare.fullname(), "Test");
        assert_eq!(bare.namespace(), None);
    }

    #[test]
    fn test_dotted_name_overrides_namespace() {
        let n = Name::new("a.b.C", Some("x.y"));
        assert_eq!(n.namespace(), Some("a.b"));
        assert_eq!(n.fullname(), "a.b.C");
    }

    #[test]
    fn test_empty_namespace_is_none() {
        assert_eq!(Name::new("T", Some("")).fullname(), "T");
    }

    #[test]
    fn test_candidates() {
        let c = Name::candidates("Node", Some("com.example"));
        assert_eq!(c.len(), 2);
        assert_eq!(c[0].fullname(), "com.example.Node");
        assert_eq!(c[1].fullname(), "Node");

        let dotted = Name::candidates("x.Node", Some("com.example"));
        assert_eq!(dotted.len(), 1);
        assert_eq!(dotted[0].fullname(), "x.Node");
    }

    #[test]
    fn test_relative_to() {
        let n = Name::new("Node", Some("com.example"));
        assert_eq!(n.relative_to(Some("com.example")), "Node");
        assert_eq!(n.relative_to(None), "com.example.Node");
        assert_eq!(Name::new("Top", None).relative_to(Some("com.example")), "Top");
    }

    #[test]
    fn test_check() {
        assert!(Name::new("LongList", None).check().is_ok());
        assert!(Name::new("Missing size", None).check().is_err());
        assert!(Name::new("int", None).check().is_err());
        assert!(Name::new("T", Some("org.9bad")).check().is_err());
        assert!(check_identifier("_f1").is_ok());
        assert!(check_identifier("1f").is_err());
    }
}
