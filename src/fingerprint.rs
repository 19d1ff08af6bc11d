//! Schema fingerprints

use sha2::{Digest, Sha256};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::schema::Schema;

/// SHA-256 of a schema's parsing canonical form, as lowercase hex
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Fingerprint of a compiled schema
    pub fn of(schema: &Schema) -> Self {
        Self::from_bytes(schema.parsing_canonical_form().as_bytes())
    }

    /// Compute from raw bytes
    pub fn from_bytes(data: &[u8]) -> Self {
        let hash = Sha256::digest(data);
        Self(format!("{:x}", hash))
    }

    /// Get the hex string representation
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_digest() {
        assert_eq!(
            Fingerprint::from_bytes(b"\"int\"").as_str().len(),
            64
        );
        assert_eq!(
            Fingerprint::from_bytes(b"").as_str(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_documentation_does_not_change_fingerprint() {
        let plain =
            Schema::parse_str(r#"{"type":"enum","name":"Test","symbols":["A","B"]}"#).unwrap();
        let documented = Schema::parse_str(
            r#"{"type":"enum","doc":"enum_doc","name":"Test","symbols":["A","B"]}"#,
        )
        .unwrap();
        assert_eq!(plain.fingerprint(), documented.fingerprint());
    }

    #[test]
    fn test_namespace_changes_fingerprint() {
        let a = Schema::parse_str(r#"{"type":"fixed","name":"Test","size":1}"#).unwrap();
        let b =
            Schema::parse_str(r#"{"type":"fixed","namespace":"n","name":"Test","size":1}"#)
                .unwrap();
        assert_ne!(a.fingerprint(), b.fingerprint());
    }
}
