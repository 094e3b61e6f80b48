//! sbom-forge: SBOM generation and format conversion toolkit
//!
//! Catalogs the software packages present in a filesystem and emits the
//! result in any registered SBOM format.

#![allow(clippy::needless_pass_by_value)]

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use sbom_forge::{cli, config::ForgeConfig};
use std::io;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Build long version string with format support info
const fn build_long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        "\n\nOutput Formats:",
        "\n  forge-json, cyclonedx-json, cyclonedx-xml, spdx-json, spdx-tag-value, table, text",
        "\n\nCatalogers:",
        "\n  cargo-lock, npm-package-lock, python-pipfile-lock"
    )
}

#[derive(Parser)]
#[command(name = "sbom-forge")]
#[command(author = "Binarly.io")]
#[command(version, long_version = build_long_version())]
#[command(about = "SBOM generation and format conversion toolkit", long_about = None)]
#[command(after_help = "EXAMPLES:
    # Catalog a directory and print a package table
    sbom-forge scan ./my-project

    # Produce a machine-readable document
    sbom-forge scan ./my-project -o forge-json -O sbom.json

    # Convert an existing document between formats
    sbom-forge convert sbom.json -o cyclonedx-json")]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Arguments for the `scan` subcommand
#[derive(Parser)]
struct ScanArgs {
    /// Directory to catalog
    path: PathBuf,

    /// Output format (name or alias; see `sbom-forge formats`)
    #[arg(short, long, default_value = "table")]
    output: String,

    /// Required format version (empty accepts the format's default)
    #[arg(long, default_value = "")]
    format_version: String,

    /// Output file path (stdout if not specified)
    #[arg(short = 'O', long)]
    output_file: Option<PathBuf>,

    /// Catalogers to run (comma-separated; default runs all)
    #[arg(long, value_delimiter = ',')]
    catalogers: Option<Vec<String>>,

    /// Glob patterns to exclude from indexing. Can be specified multiple times.
    #[arg(long = "exclude", value_name = "GLOB")]
    exclusions: Vec<String>,

    /// Record filesystem metadata for every indexed file
    #[arg(long)]
    file_metadata: bool,

    /// Compute sha256 digests for every indexed file
    #[arg(long)]
    file_digests: bool,
}

/// Arguments for the `convert` subcommand
#[derive(Parser)]
struct ConvertArgs {
    /// Document to convert (format is auto-identified)
    input: PathBuf,

    /// Output format (name or alias)
    #[arg(short, long, default_value = "forge-json")]
    output: String,

    /// Required format version (empty accepts the format's default)
    #[arg(long, default_value = "")]
    format_version: String,

    /// Output file path (stdout if not specified)
    #[arg(short = 'O', long)]
    output_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Catalog a directory and produce an SBOM
    Scan(ScanArgs),

    /// Convert an SBOM document between formats
    Convert(ConvertArgs),

    /// List registered document formats
    Formats,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| log_level.to_string()),
        ))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(io::stderr),
        )
        .init();

    match cli.command {
        Commands::Scan(args) => {
            let config = ForgeConfig {
                catalogers: args.catalogers,
                exclusions: args.exclusions,
                file_metadata: args.file_metadata,
                file_digests: args.file_digests,
                ..Default::default()
            };
            cli::run_scan(cli::ScanOptions {
                path: args.path,
                format_name: args.output,
                format_version: args.format_version,
                output_file: args.output_file,
                config,
            })?;
            Ok(())
        }

        Commands::Convert(args) => {
            cli::run_convert(cli::ConvertOptions {
                input: args.input,
                format_name: args.output,
                format_version: args.format_version,
                output_file: args.output_file,
            })?;
            Ok(())
        }

        Commands::Formats => {
            cli::run_formats()?;
            Ok(())
        }

        Commands::Completions { shell } => {
            generate(shell, &mut Cli::command(), "sbom-forge", &mut io::stdout());
            Ok(())
        }
    }
}
