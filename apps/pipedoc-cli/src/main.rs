//! pipedoc CLI
//!
//! Generates pipeline documentation from heterogeneous input files.

mod commands;
mod output;
mod telemetry;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use colored::Colorize;

#[derive(Parser)]
#[command(
    name = "pipedoc",
    version,
    about = "Generate pipeline documentation from source files",
    long_about = "Ingests pipeline definitions, spreadsheets, and free-form notes,\n\
                  extracts pipeline metadata through pattern matching and catalog\n\
                  reconciliation, and renders a structured documentation artifact."
)]
struct Cli {
    /// Log level when RUST_LOG is not set (trace, debug, info, warn, error)
    #[arg(long, env = "PIPEDOC_LOG", default_value = "warn")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    /// Enable verbose error output
    #[arg(short, long)]
    verbose: bool,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a documentation artifact from input files
    Generate {
        /// Input files (.zip .json .docx .txt .pdf .xlsx .csv ...)
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output file
        #[arg(short, long, default_value = "pipeline-documentation.md")]
        output: PathBuf,

        /// Catalog file overriding the built-in source/sink catalog
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Document title (defaults to the detected data-flow name)
        #[arg(long)]
        title: Option<String>,

        /// Author recorded in the change log
        #[arg(long, default_value = "pipedoc")]
        author: String,

        /// Per-document analysis timeout in seconds
        #[arg(long)]
        timeout_secs: Option<u64>,
    },

    /// Catalog operations
    #[command(subcommand)]
    Catalog(CatalogCommands),

    /// Analyze a single file and print the extracted metadata
    Inspect {
        /// File to analyze
        file: PathBuf,

        /// Catalog file overriding the built-in source/sink catalog
        #[arg(long)]
        catalog: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum CatalogCommands {
    /// List the known source and sink systems
    List {
        /// Catalog file overriding the built-in catalog
        #[arg(long)]
        catalog: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }
    if let Err(e) = telemetry::init(&cli.log_level, cli.json_logs) {
        eprintln!("{}: {}", "Error".red().bold(), e);
        return ExitCode::FAILURE;
    }

    let result = match cli.command {
        Commands::Generate {
            inputs,
            output,
            catalog,
            title,
            author,
            timeout_secs,
        } => {
            commands::generate::run(
                &inputs,
                &output,
                catalog.as_deref(),
                title,
                author,
                timeout_secs,
            )
            .await
        }
        Commands::Catalog(CatalogCommands::List { catalog }) => {
            commands::catalog::list(catalog.as_deref())
        }
        Commands::Inspect { file, catalog } => {
            commands::inspect::run(&file, catalog.as_deref()).await
        }
    };

    match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}: {}", "Error".red().bold(), e);
            if cli.verbose {
                for cause in e.chain().skip(1) {
                    eprintln!("{}: {}", "Caused by".yellow(), cause);
                }
            }
            ExitCode::FAILURE
        }
    }
}
