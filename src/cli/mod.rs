//! CLI command implementations

use anyhow::Result;
use clap::{ArgMatches, Command};

pub mod commands;

/// Main CLI application
pub struct CliApp;

impl CliApp {
    /// Create the CLI application
    pub fn app() -> Command {
        Command::new("einkd")
            .version(env!("CARGO_PKG_VERSION"))
            .about("Plugin-driven info display daemon for e-ink panels")
            .subcommand_negates_reqs(true)
            .subcommand(commands::init::command())
            .subcommand(commands::daemon::command())
            .subcommand(commands::run::command())
            .subcommand(commands::clear::command())
            .subcommand(commands::test::command())
            .subcommand(commands::status::command())
    }

    /// Run the CLI application
    pub async fn run(matches: &ArgMatches) -> Result<()> {
        match matches.subcommand() {
            Some(("init", sub_matches)) => commands::init::run(sub_matches).await,
            Some(("daemon", sub_matches)) => commands::daemon::run(sub_matches).await,
            Some(("run", sub_matches)) => commands::run::run(sub_matches).await,
            Some(("clear", sub_matches)) => commands::clear::run(sub_matches).await,
            Some(("test", sub_matches)) => commands::test::run(sub_matches).await,
            Some(("status", sub_matches)) => commands::status::run(sub_matches).await,
            _ => {
                // No subcommand provided, show help
                let _ = Self::app().print_help();
                Ok(())
            }
        }
    }
}

/// Common CLI utilities
pub mod utils {
    use anyhow::{anyhow, Result};
    use std::path::PathBuf;
    use tracing::info;

    /// Get configuration file path from arguments or use default
    pub fn get_config_path(matches: &clap::ArgMatches) -> Result<Option<PathBuf>> {
        if let Some(config_path) = matches.get_one::<String>("config") {
            let path = PathBuf::from(config_path);
            if !path.exists() {
                return Err(anyhow!("Configuration file not found: {:?}", path));
            }
            return Ok(Some(path));
        }

        let mut candidates = vec![PathBuf::from("einkd.yaml"), PathBuf::from("einkd.yml")];
        if let Some(config_dir) = dirs::config_dir() {
            candidates.push(config_dir.join("einkd").join("config.yaml"));
        }

        Ok(candidates.into_iter().find(|p| p.exists()))
    }

    /// Load configuration, falling back to defaults when no file exists
    pub fn load_config(matches: &clap::ArgMatches) -> Result<crate::Config> {
        match get_config_path(matches)? {
            Some(path) => {
                info!("Loading configuration from {:?}", path);
                crate::Config::from_file(&path)
            }
            None => {
                info!("No configuration file found, using defaults");
                Ok(crate::Config::default())
            }
        }
    }

    /// Shared --config argument
    pub fn config_arg() -> clap::Arg {
        clap::Arg::new("config")
            .short('c')
            .long("config")
            .help("Configuration file path")
            .value_name("FILE")
    }
}
