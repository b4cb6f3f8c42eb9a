// qwtt - per-SKU stock reconciliation from the command line

mod config;
mod exit_codes;
mod run;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use qwtt_io::IoError;
use qwtt_recon::{ReconConfig, ReconError};

use exit_codes::{io_exit_code, recon_exit_code, EXIT_IO, EXIT_SUCCESS};

#[derive(Parser)]
#[command(name = "qwtt")]
#[command(about = "Reconcile marketplace sales against inventory, per SKU")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// Log run details to stderr (RUST_LOG overrides)
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile orders and inventory, enrich from the product master, write both reports
    #[command(after_help = "\
Examples:
  qwtt run --orders orders.csv --inventory inventory.csv --master master.xlsx
  qwtt run --orders orders.csv --inventory inventory.csv --master master.xlsx --out reports/
  qwtt run --orders orders.csv --inventory inventory.csv --master master.csv --format csv --json
  qwtt run --orders orders.csv --inventory inventory.csv --master master.xlsx --config amazon.toml")]
    Run {
        /// Orders table (needs Marketplace, SKU, Quantity columns)
        #[arg(long)]
        orders: PathBuf,

        /// Inventory table (needs sku, old_quantity columns)
        #[arg(long)]
        inventory: PathBuf,

        /// Product master table (columns matched by role)
        #[arg(long)]
        master: PathBuf,

        /// TOML config (defaults reproduce the Flipkart QWTT report)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Directory for the detailed and cleaned reports
        #[arg(long, default_value = ".")]
        out: PathBuf,

        /// Report file format
        #[arg(long, value_enum, default_value_t = ReportFormat::Xlsx)]
        format: ReportFormat,

        /// Print the JSON document to stdout instead of the human summary
        #[arg(long)]
        json: bool,

        /// Suppress the human summary
        #[arg(long, short = 'q')]
        quiet: bool,
    },

    /// Show which product master column fills each role
    #[command(after_help = "\
Examples:
  qwtt roles master.xlsx
  qwtt roles master.csv --json")]
    Roles {
        /// Product master table
        master: PathBuf,

        /// TOML config with role overrides
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output JSON
        #[arg(long)]
        json: bool,
    },

    /// Inspect and validate reconciliation configs
    Config {
        #[command(subcommand)]
        command: config::ConfigCommands,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Xlsx,
    Csv,
}

impl ReportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Xlsx => "xlsx",
            Self::Csv => "csv",
        }
    }
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("QWTT_GIT_HASH"), ")",
        "\ntarget:  ", env!("QWTT_TARGET"),
    )
}

fn init_logging(verbose: bool) {
    let default = if verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp(None)
        .format_target(false)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Run {
            orders,
            inventory,
            master,
            config,
            out,
            format,
            json,
            quiet,
        } => run::cmd_run(run::RunArgs {
            orders,
            inventory,
            master,
            config,
            out,
            format,
            json,
            quiet,
        }),
        Commands::Roles { master, config, json } => run::cmd_roles(master, config, json),
        Commands::Config { command } => config::cmd_config(command),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(e) => {
            if !e.message.is_empty() {
                eprintln!("error: {}", e.message);
            }
            if let Some(hint) = &e.hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(e.code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn io(msg: impl Into<String>) -> Self {
        Self { code: EXIT_IO, message: msg.into(), hint: None }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<ReconError> for CliError {
    fn from(err: ReconError) -> Self {
        let hint = match &err {
            ReconError::MissingColumn { .. } => {
                Some("check the header row, or map the column name in the config's [orders] / [inventory] table".to_string())
            }
            ReconError::ConfigParse(_) | ReconError::ConfigValidation(_) => {
                Some("run `qwtt config default` for a complete example".to_string())
            }
            ReconError::Csv(_) => None,
        };
        Self { code: recon_exit_code(&err), message: err.to_string(), hint }
    }
}

impl From<IoError> for CliError {
    fn from(err: IoError) -> Self {
        Self { code: io_exit_code(&err), message: err.to_string(), hint: None }
    }
}

/// Load and validate the config at `path`, or the built-in default.
pub fn load_config(path: Option<&Path>) -> Result<ReconConfig, CliError> {
    let Some(path) = path else {
        return Ok(ReconConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .map_err(|e| CliError::io(format!("{}: {}", path.display(), e)))?;
    ReconConfig::from_toml(&text).map_err(|e| {
        let mut err = CliError::from(e);
        err.message = format!("{}: {}", path.display(), err.message);
        err
    })
}
