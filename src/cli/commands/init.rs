//! Init command implementation

use crate::Config;
use anyhow::Result;
use clap::{ArgMatches, Command};
use std::path::PathBuf;
use tracing::info;

pub fn command() -> Command {
    Command::new("init")
        .about("Write a default configuration file")
        .arg(
            clap::Arg::new("output")
                .short('o')
                .long("output")
                .help("Output file path")
                .value_name("FILE")
                .default_value("einkd.yaml"),
        )
        .arg(
            clap::Arg::new("force")
                .short('f')
                .long("force")
                .help("Overwrite an existing file")
                .action(clap::ArgAction::SetTrue),
        )
}

pub async fn run(matches: &ArgMatches) -> Result<()> {
    let output_path = PathBuf::from(matches.get_one::<String>("output").unwrap());

    if output_path.exists() && !matches.get_flag("force") {
        anyhow::bail!(
            "Configuration file already exists: {:?} (use --force to overwrite)",
            output_path
        );
    }

    let config = Config::default();
    config.save_to_file(&output_path)?;
    info!("Configuration file created: {:?}", output_path);

    println!("Default configuration written to {}.", output_path.display());
    println!("Add API keys under api_keys to enable the weather and stock plugins.");

    Ok(())
}
