//! Configuration management for the schema compiler
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (schemac.toml)
//! - Environment variables (SCHEMAC__*)
//!
//! ## Example config file (schemac.toml):
//! ```toml
//! [compiler]
//! validate_names = true
//! validate_defaults = true
//!
//! [output]
//! format = "compact"
//!
//! [check]
//! extensions = ["avsc", "json"]
//! ```

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::compiler::CompileOptions;
use crate::error::Result;

/// Main configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemacConfig {
    /// Compiler switches
    #[serde(default)]
    pub compiler: CompilerConfig,

    /// Serialization settings
    #[serde(default)]
    pub output: OutputConfig,

    /// Settings for `schemac check`
    #[serde(default)]
    pub check: CheckConfig,
}

/// Compiler configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompilerConfig {
    /// Enforce name syntax on type names, field names and symbols
    #[serde(default = "default_true")]
    pub validate_names: bool,

    /// Check field defaults against field types
    #[serde(default = "default_true")]
    pub validate_defaults: bool,
}

/// Output configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
}

/// Output format for JSON
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Pretty,
    Compact,
}

impl OutputFormat {
    pub fn is_pretty(&self) -> bool {
        matches!(self, Self::Pretty)
    }
}

/// Directory walking configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckConfig {
    /// File extensions treated as schema files
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

fn default_true() -> bool {
    true
}

fn default_extensions() -> Vec<String> {
    vec!["avsc".to_string(), "json".to_string()]
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            validate_names: true,
            validate_defaults: true,
        }
    }
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
        }
    }
}

impl From<&CompilerConfig> for CompileOptions {
    fn from(config: &CompilerConfig) -> Self {
        Self {
            validate_names: config.validate_names,
            validate_defaults: config.validate_defaults,
        }
    }
}

impl SchemacConfig {
    /// Load configuration from default locations
    pub fn load() -> std::result::Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration, adding a specific file on top of the defaults
    pub fn load_from(config_path: Option<&Path>) -> std::result::Result<Self, ConfigError> {
        let mut builder = Config::builder();

        let config_locations = ["schemac.toml", ".schemac.toml", "config/schemac.toml"];

        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        // Per-user config directory
        if let Some(dirs) = directories::ProjectDirs::from("dev", "schemac", "schemac") {
            let user_config = dirs.config_dir().join("schemac.toml");
            if user_config.exists() {
                builder = builder.add_source(File::from(user_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path).required(true));
        }

        // Environment variables (SCHEMAC__COMPILER__VALIDATE_NAMES=false)
        builder = builder.add_source(
            Environment::with_prefix("SCHEMAC")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    /// Render as TOML
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Compile options for the `[compiler]` section
    pub fn compile_options(&self) -> CompileOptions {
        CompileOptions::from(&self.compiler)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SchemacConfig::default();
        assert!(config.compiler.validate_names);
        assert!(config.compiler.validate_defaults);
        assert_eq!(config.output.format, OutputFormat::Pretty);
        assert_eq!(config.check.extensions, vec!["avsc", "json"]);
        assert_eq!(config.compile_options(), CompileOptions::default());
    }

    #[test]
    fn test_serialize_config() {
        let config = SchemacConfig::default();
        let toml_str = config.to_toml().unwrap();
        assert!(toml_str.contains("[compiler]"));
        assert!(toml_str.contains("[output]"));
        assert!(toml_str.contains("format = \"pretty\""));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(
            &path,
            "[compiler]\nvalidate_names = false\n\n[output]\nformat = \"compact\"\n",
        )
        .unwrap();

        let config = SchemacConfig::load_from(Some(&path)).unwrap();
        assert!(!config.compiler.validate_names);
        assert!(config.compiler.validate_defaults);
        assert_eq!(config.output.format, OutputFormat::Compact);
    }

    #[test]
    fn test_save_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schemac.toml");

        let mut config = SchemacConfig::default();
        config.check.extensions = vec!["avsc".to_string()];
        config.save(&path).unwrap();

        let loaded = SchemacConfig::load_from(Some(&path)).unwrap();
        assert_eq!(loaded.check.extensions, vec!["avsc"]);
    }
}
