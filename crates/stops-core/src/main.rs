//! stopstats: traffic-stop statistics CLI.
//!
//! Builds the statewide rollup and the compact scatterplot index from a
//! directory of per-agency JSON documents.

use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use serde_json::json;
use std::path::PathBuf;
use stops_common::{Error, OutputFormat, SCHEMA_VERSION};
use stops_config::{ensure_valid, resolve_config, Config, ConfigPaths, ResolvedConfig};
use stops_core::exit_codes::ExitCode;
use stops_core::logging::{init_logging, LogFormat};
use stops_core::pipeline::{run_all, run_index, run_rollup, IndexOutcome, RollupOutcome};
use stops_core::source::{load_directory, SourceSet};
use stops_report::{render_index_summary, render_rollup, render_scan_summary, ScanSummary};
use tracing::debug;

// ============================================================================
// CLI definition
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "stopstats")]
#[command(version, about = "Traffic-stop statistics rollup and index builder")]
struct Cli {
    #[command(flatten)]
    global: GlobalOpts,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
struct GlobalOpts {
    /// Config file (TOML or JSON)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Directory of per-agency JSON documents
    #[arg(long, global = true, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Directory receiving the rollup and index files
    #[arg(long, global = true, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Output format for stdout
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Log line format (logs go to stderr)
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build the statewide rollup for one year
    Rollup {
        /// Target year (overrides config)
        #[arg(long)]
        year: Option<i32>,
    },
    /// Build the compact multi-year index
    Index,
    /// Build both outputs concurrently
    Run {
        /// Target year for the rollup (overrides config)
        #[arg(long)]
        year: Option<i32>,
    },
    /// Configuration commands
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Print the resolved configuration
    Show,
}

// ============================================================================
// Entry point
// ============================================================================

fn main() {
    let cli = Cli::parse();
    init_logging(
        cli.global.log_format,
        cli.global.verbose,
        cli.global.quiet,
    );

    let format = cli.global.format;
    let code = match execute(cli) {
        Ok(()) => ExitCode::Clean,
        Err(err) => {
            report_error(&err, format);
            ExitCode::from(&err)
        }
    };
    std::process::exit(code.as_i32());
}

fn execute(cli: Cli) -> Result<(), Error> {
    let year_override = match &cli.command {
        Commands::Rollup { year } | Commands::Run { year } => *year,
        Commands::Index | Commands::Config { .. } => None,
    };
    let resolved = load_config(&cli.global, year_override)?;
    let format = cli.global.format;
    let config = &resolved.config;

    match cli.command {
        Commands::Config {
            command: ConfigCommands::Show,
        } => show_config(&resolved, format),
        Commands::Rollup { .. } => {
            let (source, scan) = scan_source(config);
            let outcome = run_rollup(config, &source)?;
            emit(format, &scan, &outcome, || print_rollup(&scan, &outcome))
        }
        Commands::Index => {
            let (source, scan) = scan_source(config);
            let outcome = run_index(config, &source)?;
            emit(format, &scan, &outcome, || print_index(&scan, &outcome))
        }
        Commands::Run { .. } => {
            let (source, scan) = scan_source(config);
            let outcome = run_all(config, &source)?;
            emit(format, &scan, &outcome, || {
                print_rollup(&scan, &outcome.rollup);
                println!();
                print_index_body(&outcome.index);
            })
        }
    }
}

fn scan_source(config: &Config) -> (SourceSet, ScanSummary) {
    let source = load_directory(&config.data_dir);
    let scan = source.summary();
    (source, scan)
}

/// Resolve the config file and environment, then apply CLI flags on top.
fn load_config(global: &GlobalOpts, year: Option<i32>) -> Result<ResolvedConfig, Error> {
    let paths = ConfigPaths::discover(global.config.clone());
    let mut resolved = resolve_config(&paths, |var| std::env::var(var).ok())?;

    let config = &mut resolved.config;
    if let Some(dir) = &global.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(dir) = &global.output_dir {
        config.output_dir = dir.clone();
    }
    if let Some(year) = year {
        config.rollup.year = year;
    }
    ensure_valid(config)?;

    debug!(
        source = %resolved.source,
        data_dir = %resolved.config.data_dir.display(),
        output_dir = %resolved.config.output_dir.display(),
        year = resolved.config.rollup.year,
        "configuration ready"
    );
    Ok(resolved)
}

// ============================================================================
// Output
// ============================================================================

#[derive(Serialize)]
struct Envelope<'a, T: Serialize> {
    schema_version: &'static str,
    scan: &'a ScanSummary,
    #[serde(flatten)]
    result: &'a T,
}

fn emit<T: Serialize>(
    format: OutputFormat,
    scan: &ScanSummary,
    result: &T,
    text: impl FnOnce(),
) -> Result<(), Error> {
    match format {
        OutputFormat::Json => {
            let envelope = Envelope {
                schema_version: SCHEMA_VERSION,
                scan,
                result,
            };
            println!("{}", serde_json::to_string_pretty(&envelope)?);
        }
        OutputFormat::Text => text(),
    }
    Ok(())
}

fn print_rollup(scan: &ScanSummary, outcome: &RollupOutcome) {
    println!("{}", render_scan_summary(scan));
    println!();
    println!("{}", render_rollup(&outcome.report));
    println!();
    println!("Wrote {}", outcome.path.display());
    if !outcome.skipped_files.is_empty() {
        println!(
            "{} file(s) left out of the rollup:",
            outcome.skipped_files.len()
        );
        for path in &outcome.skipped_files {
            println!("  - {}", path.display());
        }
    }
}

fn print_index(scan: &ScanSummary, outcome: &IndexOutcome) {
    println!("{}", render_scan_summary(scan));
    print_index_body(outcome);
}

fn print_index_body(outcome: &IndexOutcome) {
    println!("Wrote {}", outcome.path.display());
    println!("{}", render_index_summary(&outcome.summary));
    if outcome.invalid_cells > 0 {
        println!("  {} non-numeric values written as null", outcome.invalid_cells);
    }
}

fn show_config(resolved: &ResolvedConfig, format: OutputFormat) -> Result<(), Error> {
    let doc = json!({
        "source": resolved.source.to_string(),
        "config": resolved.config,
    });
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&doc)?),
        OutputFormat::Text => {
            println!("# source: {}", resolved.source);
            println!("{}", serde_json::to_string_pretty(&resolved.config)?);
        }
    }
    Ok(())
}

fn report_error(err: &Error, format: OutputFormat) {
    debug!(code = err.code(), error = %err, "stopstats failed");
    match format {
        OutputFormat::Json => {
            let doc = json!({
                "schema_version": SCHEMA_VERSION,
                "error": { "code": err.code(), "message": err.to_string() },
            });
            println!("{doc}");
        }
        OutputFormat::Text => eprintln!("stopstats: {err}"),
    }
}
