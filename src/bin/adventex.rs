//! Adventex CLI - advent sheet LaTeX to JSON converter

#[cfg(feature = "cli")]
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
#[cfg(feature = "cli")]
use std::io::{self, Write};
#[cfg(feature = "cli")]
use std::path::{Path, PathBuf};
#[cfg(feature = "cli")]
use std::process::ExitCode;

#[cfg(feature = "cli")]
use adventex::{
    batch::{DEFAULT_DAY_PATTERN, DEFAULT_SOURCE_PATTERN},
    calendar::output::{write_output, DEFAULT_COLLECTION_PATH, DEFAULT_SPLIT_DIR},
    cleanup::DEFAULT_DAYS_DIR,
    clean_batch, convert_batch, expand_inputs, split_collection,
    utils::logging::{init_logging, resolve_spec, LOG_ENV},
    AdventError, AdventResult, BodyMode, CalendarConfig, DuplicatePolicy, OutputForm,
    SchemaVersion,
};

#[cfg(feature = "cli")]
#[derive(Parser)]
#[command(name = "adventex")]
#[command(version)]
#[command(about = "Adventex - convert advent LaTeX sheets to JSON day records", long_about = None)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[cfg(feature = "cli")]
#[derive(Clone, Copy, ValueEnum)]
enum Schema {
    /// Six arguments, closing text after the macro
    Legacy,
    /// Seven arguments, closing text as the last one
    TwoCol,
}

#[cfg(feature = "cli")]
impl From<Schema> for SchemaVersion {
    fn from(schema: Schema) -> Self {
        match schema {
            Schema::Legacy => SchemaVersion::Legacy,
            Schema::TwoCol => SchemaVersion::TwoCol,
        }
    }
}

#[cfg(feature = "cli")]
#[derive(Clone, Copy, ValueEnum)]
enum Duplicates {
    /// Keep the record from the file processed last
    LastWins,
    /// Fail the later file
    Reject,
}

#[cfg(feature = "cli")]
impl From<Duplicates> for DuplicatePolicy {
    fn from(duplicates: Duplicates) -> Self {
        match duplicates {
            Duplicates::LastWins => DuplicatePolicy::LastWins,
            Duplicates::Reject => DuplicatePolicy::Reject,
        }
    }
}

#[cfg(feature = "cli")]
#[derive(Subcommand)]
enum Commands {
    /// Convert advent sheets into a JSON collection
    Convert {
        /// Files, directories or name patterns (default: ./advent*.tex)
        patterns: Vec<String>,

        /// Output file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write metadata.json and days/dayNN.json into this directory instead
        #[arg(long, conflicts_with_all = ["output", "days_only"])]
        split: Option<PathBuf>,

        /// Write only the array of day records
        #[arg(long)]
        days_only: bool,

        /// Calendar year
        #[arg(long)]
        year: Option<i32>,

        /// Lock every day after this one
        #[arg(long)]
        lock_after: Option<u32>,

        /// Macro schema
        #[arg(long, value_enum)]
        schema: Option<Schema>,

        /// What to do when two files yield the same day
        #[arg(long, value_enum)]
        duplicates: Option<Duplicates>,

        /// Skip advent00 instead of mapping it to the prologue date
        #[arg(long)]
        no_prologue: bool,

        /// Flat paragraph splitting instead of the structural scanner
        #[arg(long)]
        flat: bool,
    },

    /// Split a collection file into metadata.json and per-day files
    Split {
        /// Collection file (default: public/advent_data.json)
        input: Option<PathBuf>,

        /// Output directory (default: public/data)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Clean up HTML in day files
    Clean {
        /// Files, directories or name patterns (default: public/data/days)
        patterns: Vec<String>,
    },

    /// Show version and effective configuration
    Info,
}

#[cfg(feature = "cli")]
fn main() -> ExitCode {
    let cli = Cli::parse();

    let env_spec = std::env::var(LOG_ENV).ok();
    let spec = resolve_spec(cli.verbose, env_spec.as_deref());
    let _logger = match init_logging(&spec) {
        Ok(handle) => Some(handle),
        Err(e) => {
            eprintln!("warning: {}", e);
            None
        }
    };

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("✗ {}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(feature = "cli")]
fn load_config(path: Option<&Path>) -> AdventResult<CalendarConfig> {
    match path {
        Some(path) => CalendarConfig::from_toml_file(path),
        None => Ok(CalendarConfig::default()),
    }
}

#[cfg(feature = "cli")]
fn progress_error(err: io::Error) -> AdventError {
    AdventError::Io {
        path: "<stdout>".to_string(),
        message: err.to_string(),
    }
}

#[cfg(feature = "cli")]
fn run(cli: Cli) -> AdventResult<()> {
    let mut config = load_config(cli.config.as_deref())?;
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Commands::Convert {
            patterns,
            output,
            split,
            days_only,
            year,
            lock_after,
            schema,
            duplicates,
            no_prologue,
            flat,
        } => {
            if let Some(year) = year {
                config = config.with_year(year);
            }
            if let Some(k) = lock_after {
                config.lock_after_day = k;
            }
            if let Some(schema) = schema {
                config.schema = schema.into();
            }
            if let Some(duplicates) = duplicates {
                config.duplicate_policy = duplicates.into();
            }
            if no_prologue {
                config.prologue.enabled = false;
            }
            if flat {
                config.body_mode = BodyMode::Flat;
            }
            config.validate()?;

            let files = expand_inputs(&patterns, DEFAULT_SOURCE_PATTERN)?;
            let (collection, summary) = convert_batch(&files, &config, &mut out)?;

            let form = match (split, days_only) {
                (Some(dir), _) => OutputForm::Split(dir),
                (None, true) => OutputForm::DaysOnly(
                    output.unwrap_or_else(|| PathBuf::from(DEFAULT_COLLECTION_PATH)),
                ),
                (None, false) => OutputForm::Single(
                    output.unwrap_or_else(|| PathBuf::from(DEFAULT_COLLECTION_PATH)),
                ),
            };
            let written = write_output(&form, &collection)?;

            writeln!(out).map_err(progress_error)?;
            for path in &written {
                writeln!(out, "✓ Output written to: {}", path.display()).map_err(progress_error)?;
            }
            writeln!(out, "{}", summary).map_err(progress_error)?;
        }

        Commands::Split { input, output } => {
            let input = input.unwrap_or_else(|| PathBuf::from(DEFAULT_COLLECTION_PATH));
            let dir = output.unwrap_or_else(|| PathBuf::from(DEFAULT_SPLIT_DIR));
            let days = split_collection(&input, &dir, &mut out)?;
            writeln!(out, "\nSplit complete: {} day files", days).map_err(progress_error)?;
        }

        Commands::Clean { patterns } => {
            let patterns = if patterns.is_empty() {
                vec![DEFAULT_DAYS_DIR.to_string()]
            } else {
                patterns
            };
            let files = expand_inputs(&patterns, DEFAULT_DAY_PATTERN)?;
            let summary = clean_batch(&files, &mut out)?;
            writeln!(
                out,
                "\nCleanup complete: {} succeeded, {} failed",
                summary.succeeded, summary.failed
            )
            .map_err(progress_error)?;
        }

        Commands::Info => {
            writeln!(out, "Adventex - advent sheet LaTeX to JSON converter")
                .map_err(progress_error)?;
            writeln!(out, "Version: {}", env!("CARGO_PKG_VERSION")).map_err(progress_error)?;
            writeln!(out).map_err(progress_error)?;
            writeln!(out, "Features:").map_err(progress_error)?;
            writeln!(out, "  ✓ \\AdventSheetTwoCol argument extraction (6 or 7 arguments)")
                .map_err(progress_error)?;
            writeln!(out, "  ✓ LaTeX → HTML with math passed through verbatim")
                .map_err(progress_error)?;
            writeln!(out, "  ✓ Bibliography extraction").map_err(progress_error)?;
            writeln!(out, "  ✓ Single-file and split JSON output").map_err(progress_error)?;
            writeln!(out, "  ✓ HTML cleanup of existing day files").map_err(progress_error)?;
            writeln!(out).map_err(progress_error)?;
            writeln!(out, "Effective configuration:").map_err(progress_error)?;
            writeln!(out, "{}", config.to_toml_string()?).map_err(progress_error)?;
        }
    }

    Ok(())
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI feature not enabled. Build with --features cli");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  cargo install adventex --features cli");
    eprintln!("  adventex <convert|split|clean|info> [OPTIONS]");
}
