//! Clear command implementation

use crate::cli::utils;
use crate::InfoDisplay;
use anyhow::Result;
use clap::{ArgMatches, Command};

pub fn command() -> Command {
    Command::new("clear")
        .about("Blank the display")
        .arg(utils::config_arg())
}

pub async fn run(matches: &ArgMatches) -> Result<()> {
    let config = utils::load_config(matches)?;
    let app = InfoDisplay::new(config)?;

    app.clear().await?;

    println!("Display cleared.");
    Ok(())
}
