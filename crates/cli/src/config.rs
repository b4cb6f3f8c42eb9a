//! `qwtt config`: inspect and validate reconciliation configs.

use std::path::PathBuf;

use clap::Subcommand;
use qwtt_recon::ReconConfig;

use crate::{load_config, CliError};

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Parse and validate a config without running
    #[command(after_help = "\
Examples:
  qwtt config validate amazon.toml")]
    Validate {
        /// Path to the TOML config
        config: PathBuf,
    },

    /// Print the built-in default config as TOML
    #[command(after_help = "\
Examples:
  qwtt config default > qwtt.toml")]
    Default,
}

pub fn cmd_config(cmd: ConfigCommands) -> Result<(), CliError> {
    match cmd {
        ConfigCommands::Validate { config } => {
            let parsed = load_config(Some(&config))?;
            println!(
                "ok: {} (marketplace '{}', {} role override(s))",
                parsed.name,
                parsed.marketplace,
                parsed.roles.len()
            );
            Ok(())
        }
        ConfigCommands::Default => {
            let text = ReconConfig::default().to_toml()?;
            print!("{}", text);
            Ok(())
        }
    }
}
