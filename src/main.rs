//! bach-resolve CLI - name analysis over bach syntax trees

use bach_resolve::ast::{self, Program};
use bach_resolve::config::{self, BachConfig, OutputFormat};
use bach_resolve::{Diagnostics, SymbolKind, output, ui};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::str::FromStr;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "bach-resolve")]
#[command(version = "0.0.1")]
#[command(about = "Name analysis for bach programs - binds identifiers to their declarations")]
#[command(long_about = r#"
bach-resolve reads a bach syntax tree (JSON, as produced by the parser),
binds every identifier to its declaration and reports naming errors:
  • undeclared and multiply-declared identifiers
  • void variables and invalid struct types
  • colon-access on non-struct values

Example usage:
  bach-resolve check demos/point.json
  bach-resolve unparse demos/point.json --annotate
  bach-resolve bindings demos/point.json --kind function
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the config file (defaults to ./bach.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output format, overrides the config file
    #[arg(short, long, global = true, value_enum)]
    format: Option<OutputFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run name analysis and report diagnostics
    Check {
        /// Syntax tree to analyze (JSON)
        file: PathBuf,
    },

    /// Print a program as source text
    Unparse {
        /// Syntax tree to print (JSON)
        file: PathBuf,

        /// Analyze first and annotate identifiers with their types
        #[arg(short, long)]
        annotate: bool,
    },

    /// List identifier occurrences and what they are bound to
    Bindings {
        /// Syntax tree to analyze (JSON)
        file: PathBuf,

        /// Only list occurrences bound to symbols of this kind
        #[arg(short, long)]
        kind: Option<String>,
    },

    /// Write a default bach.toml
    Init {
        /// Overwrite an existing config
        #[arg(long)]
        force: bool,
    },
}

/// Settings after merging the config file with command-line flags.
struct Settings {
    format: OutputFormat,
    indent: usize,
    annotate: bool,
}

impl Settings {
    fn resolve(config: &BachConfig, format: Option<OutputFormat>) -> Self {
        Self {
            format: format.unwrap_or_else(|| config.format()),
            indent: config.indent(),
            annotate: config.annotate(),
        }
    }
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    // `init` creates the config, so there is nothing to load yet.
    let config = match cli.command {
        Commands::Init { .. } => BachConfig::default(),
        _ => config::load_config(cli.config.as_deref())?.unwrap_or_default(),
    };
    let settings = Settings::resolve(&config, cli.format);

    match cli.command {
        Commands::Check { file } => {
            let mut program = read_tree(&file)?;
            let diags = bach_resolve::analyze(&mut program);
            report_check(&file, &program, &diags, &settings)?;
            Ok(exit_code(&diags))
        }

        Commands::Unparse { file, annotate } => {
            let mut program = read_tree(&file)?;
            let diags = if annotate || settings.annotate {
                bach_resolve::analyze(&mut program)
            } else {
                Diagnostics::new()
            };

            match settings.format {
                OutputFormat::Json => {
                    let text = ast::unparse(&program, settings.indent);
                    let out = serde_json::json!({ "source": text, "diagnostics": diags });
                    println!("{}", serde_json::to_string_pretty(&out)?);
                }
                OutputFormat::Human => {
                    print!("{}", ast::unparse(&program, settings.indent));
                    for diag in diags.entries() {
                        ui::diagnostic(diag);
                    }
                }
            }
            Ok(exit_code(&diags))
        }

        Commands::Bindings { file, kind } => {
            let kind = kind.as_deref().map(SymbolKind::from_str).transpose()?;
            let mut program = read_tree(&file)?;
            let diags = bach_resolve::analyze(&mut program);
            let rows = ui::binding_rows(&program, kind);

            match settings.format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&rows)?),
                OutputFormat::Human => {
                    if rows.is_empty() {
                        ui::warn("No matching identifiers.");
                    } else {
                        println!("{}", ui::bindings_table(&rows));
                    }
                    if !output::is_quiet() {
                        ui::summary_row("Identifiers:", &rows.len().to_string());
                        ui::summary_row("Diagnostics:", &diags.len().to_string());
                    }
                }
            }
            Ok(exit_code(&diags))
        }

        Commands::Init { force } => {
            let path = cli.config.unwrap_or_else(config::default_config_path);
            config::write_config(&path, &BachConfig::starter(), force)?;
            if !output::is_quiet() {
                ui::success(&format!("Wrote {}", path.display()));
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn read_tree(path: &Path) -> anyhow::Result<Program> {
    tracing::info!("Reading syntax tree from {}", path.display());
    let program = ast::read_program(path)?;
    tracing::debug!("{} top-level declarations", program.decls.len());
    Ok(program)
}

fn report_check(file: &Path, program: &Program, diags: &Diagnostics, settings: &Settings) -> anyhow::Result<()> {
    if settings.format == OutputFormat::Json {
        let out = serde_json::json!({
            "file": file.display().to_string(),
            "diagnostics": diags.entries(),
            "counts": diags.counts_by_kind(),
            "unbound": ast::unbound_references(program).len(),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    let quiet = output::is_quiet();
    if !quiet {
        ui::header(&format!("Name analysis: {}", file.display()));
    }

    for diag in diags.entries() {
        ui::diagnostic(diag);
    }
    for (pos, message) in diags.unclassified() {
        println!("{} ***ERROR*** {}", pos, message);
    }

    if settings.annotate {
        ui::section("Annotated source");
        print!("{}", ast::unparse(program, settings.indent));
    }

    if quiet {
        return Ok(());
    }

    if diags.is_empty() {
        ui::success("No naming errors.");
    } else {
        ui::section("Summary");
        println!("{}", ui::diagnostics_table(diags));
        ui::error(&format!("{} error(s) found", diags.len()));
    }
    Ok(())
}

fn exit_code(diags: &Diagnostics) -> ExitCode {
    if diags.has_errors() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
