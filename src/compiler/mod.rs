//! Schema compiler
//!
//! Turns schema source text (or an already parsed JSON value) into a
//! validated [`Schema`]. Every compile starts from an empty symbol table and
//! an empty diagnostics queue; problems are returned in a [`CompileFailure`]
//! rather than kept in shared state.

mod builder;
mod validate;

use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::diagnostics::{DiagnosticCode, Diagnostics};
use crate::schema::Schema;
use crate::source;

use self::builder::Builder;

/// Switches for the optional checks of a compile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompileOptions {
    /// Enforce name syntax and reject primitive names as type names
    pub validate_names: bool,
    /// Check field defaults against field types
    pub validate_defaults: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            validate_names: true,
            validate_defaults: true,
        }
    }
}

/// A compile that recorded at least one diagnostic
#[derive(Error, Debug, Clone)]
#[error("schema compilation failed with {} error(s)\n{diagnostics}", diagnostics.len())]
pub struct CompileFailure {
    diagnostics: Diagnostics,
}

impl CompileFailure {
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Diagnostics {
        self.diagnostics
    }
}

/// Schema compiler with a fixed set of options
#[derive(Debug, Clone, Copy, Default)]
pub struct Compiler {
    options: CompileOptions,
}

impl Compiler {
    pub fn new(options: CompileOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> CompileOptions {
        self.options
    }

    /// Compile schema source text
    pub fn compile(&self, source: &str) -> Result<Schema, CompileFailure> {
        let text = source::relax_control_chars(source);
        match serde_json::from_str::<Value>(&text) {
            Ok(value) => self.compile_value(&value),
            Err(e) => {
                let mut diagnostics = Diagnostics::new();
                diagnostics.record(
                    DiagnosticCode::InvalidJson,
                    "$",
                    format!("not valid JSON: {}", e),
                );
                Err(CompileFailure { diagnostics })
            }
        }
    }

    /// Compile an already parsed JSON value
    pub fn compile_value(&self, value: &Value) -> Result<Schema, CompileFailure> {
        debug!(options = ?self.options, "compiling schema");

        let mut builder = Builder::new(self.options);
        let root = builder.build(value, None, "$");
        let (symbols, diagnostics) = builder.finish();

        match root {
            Ok(root) if diagnostics.is_empty() => {
                debug!(named_types = symbols.len(), "schema compiled");
                Ok(Schema::new(root, symbols))
            }
            _ => {
                debug!(errors = diagnostics.len(), "schema rejected");
                Err(CompileFailure { diagnostics })
            }
        }
    }
}

/// Compile schema source text with default options
pub fn compile(source: &str) -> Result<Schema, CompileFailure> {
    Compiler::default().compile(source)
}
