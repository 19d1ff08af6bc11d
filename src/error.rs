//! Error types for the schema compiler

use thiserror::Error;

use crate::compiler::CompileFailure;

/// Result type for schema operations
pub type Result<T> = std::result::Result<T, SchemaError>;

/// Schema compiler errors
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error(transparent)]
    Compile(#[from] CompileFailure),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config_crate::ConfigError),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::ser::Error),
}
