// medir CLI - measurement validation and period comparison for construction spreadsheets

mod analyze;
mod compare;
mod exit_codes;
mod settings;
mod stats;
mod util;
mod validate;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};

use medir_core::{MedirError, Settings};
use medir_io::{ImportOptions, IoError, MeasurementImport};

use exit_codes::{io_exit_code, EXIT_ERROR, EXIT_INVALID_CONFIG, EXIT_IO, EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "medir")]
#[command(about = "Check construction measurement sheets and compare periods or price tables")]
#[command(version)]
struct Cli {
    /// Settings file (default: <config dir>/medir/config.toml when present)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// More log output on stderr (-v info, -vv debug)
    #[arg(long, short = 'v', global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check every row's stated total against quantity x unit price
    #[command(after_help = "\
Examples:
  medir validate medicao-03.xlsx
  medir validate medicao-03.csv --only-errors
  medir validate medicao-03.xlsx --sheet 'Boletim' --json
  medir validate medicao-03.csv --strict && echo clean")]
    Validate {
        /// Measurement sheet (csv, tsv, xlsx, xls, ods)
        file: PathBuf,

        /// Output JSON to stdout instead of a table
        #[arg(long)]
        json: bool,

        /// List only rows with a calculation error
        #[arg(long)]
        only_errors: bool,

        /// Worksheet name for workbooks
        #[arg(long)]
        sheet: Option<String>,

        /// Exit with code 5 when any row has a calculation error
        #[arg(long)]
        strict: bool,
    },

    /// Run all row checks (calculation, missing, duplicate, inconsistent)
    #[command(after_help = "\
Examples:
  medir analyze medicao-03.xlsx
  medir analyze medicao-03.csv --json | jq '.alerts[] | select(.severity == \"error\")'")]
    Analyze {
        /// Measurement sheet (csv, tsv, xlsx, xls, ods)
        file: PathBuf,

        /// Output JSON to stdout instead of a table
        #[arg(long)]
        json: bool,

        /// Worksheet name for workbooks
        #[arg(long)]
        sheet: Option<String>,

        /// Exit with code 5 when any error-level alert is raised
        #[arg(long)]
        strict: bool,
    },

    /// Compare two periods (medicao) or two unit-price tables (tpu)
    #[command(after_help = "\
Examples:
  medir compare sinapi-2024-12.csv sinapi-2025-03.csv --kind tpu
  medir compare medicao-02.xlsx medicao-03.xlsx --kind medicao --json
  medir compare fev.csv mar.csv --kind medicao --base-label Fev --comparison-label Mar --output diff.json")]
    Compare {
        /// Base (earlier) file
        base: PathBuf,

        /// Comparison (later) file
        comparison: PathBuf,

        /// What the files contain
        #[arg(long, value_enum)]
        kind: KindArg,

        /// Label for the base side (default: base file name)
        #[arg(long)]
        base_label: Option<String>,

        /// Label for the comparison side (default: comparison file name)
        #[arg(long)]
        comparison_label: Option<String>,

        /// Worksheet name, applied to both files
        #[arg(long)]
        sheet: Option<String>,

        /// Output JSON to stdout instead of a table
        #[arg(long)]
        json: bool,

        /// Write JSON output to file
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Batch totals grouped by discipline, location or responsible
    #[command(after_help = "\
Examples:
  medir stats medicao-03.xlsx
  medir stats medicao-03.csv --by location --json")]
    Stats {
        /// Measurement sheet (csv, tsv, xlsx, xls, ods)
        file: PathBuf,

        /// Grouping column
        #[arg(long, value_enum, default_value = "discipline")]
        by: GroupArg,

        /// Output JSON to stdout instead of a table
        #[arg(long)]
        json: bool,

        /// Worksheet name for workbooks
        #[arg(long)]
        sheet: Option<String>,
    },

    /// Print the effective settings as TOML
    Config {
        /// Print only the settings file path that would be used
        #[arg(long)]
        path: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum KindArg {
    /// Unit-price tables (TPU)
    Tpu,
    /// Measurement periods
    Medicao,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum GroupArg {
    Discipline,
    Location,
    Responsible,
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp(None)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = run(cli);

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    if let Commands::Config { path } = cli.command {
        return settings::cmd_config(cli.config.as_deref(), path);
    }

    let settings = settings::resolve(cli.config.as_deref())?;

    match cli.command {
        Commands::Validate { file, json, only_errors, sheet, strict } => {
            validate::cmd_validate(&settings, file, json, only_errors, sheet, strict)
        }
        Commands::Analyze { file, json, sheet, strict } => {
            analyze::cmd_analyze(&settings, file, json, sheet, strict)
        }
        Commands::Compare {
            base,
            comparison,
            kind,
            base_label,
            comparison_label,
            sheet,
            json,
            output,
        } => compare::cmd_compare(
            &settings,
            base,
            comparison,
            kind,
            base_label,
            comparison_label,
            sheet,
            json,
            output,
        ),
        Commands::Stats { file, by, json, sheet } => stats::cmd_stats(&settings, file, by, json, sheet),
        Commands::Config { .. } => Ok(()),
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into(), hint: None }
    }

    pub fn args(msg: impl Into<String>) -> Self {
        Self::new(EXIT_USAGE, msg)
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self::new(EXIT_IO, msg)
    }

    /// Ingestion error with the registry's exit code and a hint where one helps.
    pub fn ingest(path: &Path, err: IoError) -> Self {
        let hint = match &err {
            IoError::MissingColumn { kind: "measurement", .. } => Some(
                "the header row needs a quantity column and a description or code column".to_string(),
            ),
            IoError::MissingColumn { .. } => {
                Some("the header row needs a code column and a unit price column".to_string())
            }
            IoError::UnsupportedFormat(_) => {
                Some("export the sheet as .csv or .xlsx".to_string())
            }
            IoError::Spreadsheet(msg) if msg.starts_with("no sheet named") => {
                Some("use --sheet with one of the listed names".to_string())
            }
            _ => None,
        };
        let code = match &err {
            IoError::Spreadsheet(msg) if msg.starts_with("no sheet named") => EXIT_USAGE,
            other => io_exit_code(other),
        };
        Self {
            code,
            message: format!("{}: {}", path.display(), err),
            hint,
        }
    }

    pub fn config(err: MedirError) -> Self {
        let code = match err {
            MedirError::Io(_) => EXIT_IO,
            MedirError::ConfigParse(_) | MedirError::ConfigValidation(_) => EXIT_INVALID_CONFIG,
        };
        Self::new(code, err.to_string())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(EXIT_ERROR, msg)
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

// ============================================================================
// shared helpers
// ============================================================================

pub(crate) fn import_options(settings: &Settings, sheet: Option<String>) -> ImportOptions {
    ImportOptions {
        sheet,
        delimiter: None,
        outlier_sigma: settings.validation.outlier_sigma,
    }
}

pub(crate) fn load_measurements(
    settings: &Settings,
    file: &Path,
    sheet: Option<String>,
) -> Result<MeasurementImport, CliError> {
    if !file.exists() {
        return Err(CliError::io(format!("{}: file not found", file.display())));
    }
    medir_io::import_measurements(file, &import_options(settings, sheet))
        .map_err(|e| CliError::ingest(file, e))
}

/// Pretty JSON to stdout and/or a file.
pub(crate) fn emit_json<T: serde::Serialize>(
    value: &T,
    to_stdout: bool,
    output: Option<&Path>,
) -> Result<(), CliError> {
    let json_str = serde_json::to_string_pretty(value)
        .map_err(|e| CliError::internal(format!("JSON serialization error: {e}")))?;

    if let Some(path) = output {
        std::fs::write(path, &json_str)
            .map_err(|e| CliError::io(format!("cannot write {}: {e}", path.display())))?;
        eprintln!("wrote {}", path.display());
    }

    if to_stdout {
        println!("{json_str}");
    }
    Ok(())
}

/// File name without directories, used as the default side label.
pub(crate) fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
