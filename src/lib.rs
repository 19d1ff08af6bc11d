//! schemac
//!
//! Compiler, validator and canonical serializer for JSON schema definitions
//! of typed records, enums, arrays, maps, unions, fixed-size byte blocks and
//! primitives.
//!
//! ## Pipeline
//!
//! ```text
//! source text ──► JSON value ──► Builder ──► Schema ──► JSON text
//!                                  │  ▲                (pretty / compact)
//!                       SymbolTable┘  └Validator
//!                                  │
//!                                  ▼
//!                             Diagnostics
//! ```
//!
//! ## Example
//!
//! ```
//! let source = r#"{"type":"record","name":"LongList","fields":[
//!     {"name":"value","type":"long"},
//!     {"name":"next","type":["LongList","null"]}]}"#;
//!
//! let schema = schemac::compile(source).unwrap();
//! assert_eq!(
//!     schema.to_json(false),
//!     r#"{"type":"record","name":"LongList","fields":[{"name":"value","type":"long"},{"name":"next","type":["LongList","null"]}]}"#
//! );
//!
//! let failure = schemac::compile(r#"["string","long","long"]"#).unwrap_err();
//! assert!(failure.diagnostics().messages().any(|m| m == "duplicate type in union: long"));
//! ```

pub mod canonical;
pub mod compiler;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod fingerprint;
pub mod name;
pub mod schema;
pub mod source;
pub mod symbols;

pub use compiler::{compile, CompileFailure, CompileOptions, Compiler};
pub use config::{OutputFormat, SchemacConfig};
pub use diagnostics::{DiagnosticCode, DiagnosticItem, Diagnostics};
pub use error::{Result, SchemaError};
pub use fingerprint::Fingerprint;
pub use name::Name;
pub use schema::{
    ArraySchema, Declaration, EnumSchema, Field, FieldOrder, FixedSchema, MapSchema, NamedSchema,
    RecordSchema, Schema, SchemaKind, SchemaNode, UnionSchema,
};
pub use symbols::{SymbolId, SymbolTable};
