//! Schema Compiler CLI
//!
//! Checks schema files, prints their canonical form and fingerprints.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use similar::{ChangeTag, TextDiff};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

use schemac::{Compiler, Schema, SchemacConfig};

#[derive(Parser)]
#[command(name = "schemac")]
#[command(about = "Compile, validate and format JSON record schemas")]
#[command(version)]
struct Cli {
    /// Configuration file (layered over schemac.toml and SCHEMAC__* variables)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile schema files and report every diagnostic
    Check {
        /// Files or directories to check
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Print a schema in canonical form
    Fmt {
        /// Schema file
        file: PathBuf,
        /// Compact output
        #[arg(long, conflicts_with = "pretty")]
        compact: bool,
        /// Formatted output
        #[arg(long)]
        pretty: bool,
        /// Compare with the file instead of printing; fail on differences
        #[arg(long)]
        check: bool,
    },

    /// Print the SHA-256 fingerprint of a schema
    Fingerprint {
        /// Schema file
        file: PathBuf,
        /// Also print the parsing canonical form
        #[arg(long)]
        show_form: bool,
    },

    /// Inspect or create configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Write the default configuration
    Init {
        #[arg(default_value = "schemac.toml")]
        path: PathBuf,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = SchemacConfig::load_from(cli.config.as_deref()).context("loading configuration")?;
    debug!(?config, "configuration loaded");
    let compiler = Compiler::new(config.compile_options());

    match cli.command {
        Commands::Check { paths } => {
            let files = collect_files(&paths, &config.check.extensions);
            info!(files = files.len(), "checking schemas");

            let mut failed = 0;
            for file in &files {
                let source = fs::read_to_string(file)
                    .with_context(|| format!("reading {}", file.display()))?;
                match compiler.compile(&source) {
                    Ok(_) => println!("ok {}", file.display()),
                    Err(failure) => {
                        failed += 1;
                        println!("FAILED {}", file.display());
                        for item in failure.into_diagnostics() {
                            println!("  {}", item);
                        }
                    }
                }
            }

            println!();
            println!("{} checked, {} failed", files.len(), failed);
            if failed > 0 {
                std::process::exit(1);
            }
            Ok(())
        }

        Commands::Fmt {
            file,
            compact,
            pretty,
            check,
        } => {
            let source = fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let schema = compile_file(&compiler, &file, &source)?;

            let pretty = if compact {
                false
            } else {
                pretty || config.output.format.is_pretty()
            };
            let mut formatted = schema.to_json(pretty);
            if pretty {
                formatted.push('\n');
            }

            if !check {
                print!("{}", formatted);
                if !pretty {
                    println!();
                }
                return Ok(());
            }

            if source.trim_end() == formatted.trim_end() {
                println!("{} is canonical", file.display());
                return Ok(());
            }
            let diff = TextDiff::from_lines(source.as_str(), formatted.as_str());
            for change in diff.iter_all_changes() {
                let sign = match change.tag() {
                    ChangeTag::Delete => "-",
                    ChangeTag::Insert => "+",
                    ChangeTag::Equal => " ",
                };
                print!("{}{}", sign, change);
                if change.missing_newline() {
                    println!();
                }
            }
            std::process::exit(1);
        }

        Commands::Fingerprint { file, show_form } => {
            let source = fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let schema = compile_file(&compiler, &file, &source)?;
            if show_form {
                println!("{}", schema.parsing_canonical_form());
            }
            println!("{}", schema.fingerprint());
            Ok(())
        }

        Commands::Config { action } => match action {
            ConfigAction::Show => {
                print!("{}", config.to_toml()?);
                Ok(())
            }
            ConfigAction::Init { path } => {
                if path.exists() {
                    bail!("{} already exists", path.display());
                }
                SchemacConfig::default().save(&path)?;
                println!("wrote {}", path.display());
                Ok(())
            }
        },
    }
}

fn compile_file(compiler: &Compiler, file: &Path, source: &str) -> anyhow::Result<Schema> {
    compiler
        .compile(source)
        .with_context(|| format!("compiling {}", file.display()))
}

/// Expand directories into the schema files below them
fn collect_files(paths: &[PathBuf], extensions: &[String]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for path in paths {
        if !path.is_dir() {
            files.push(path.clone());
            continue;
        }
        let mut found: Vec<PathBuf> = WalkDir::new(path)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| {
                e.path()
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .map(|ext| extensions.iter().any(|want| want == ext))
                    .unwrap_or(false)
            })
            .map(|e| e.into_path())
            .collect();
        found.sort();
        files.extend(found);
    }
    files
}
