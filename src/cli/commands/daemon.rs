//! Daemon command implementation

use crate::cli::utils;
use crate::InfoDisplay;
use anyhow::Result;
use clap::{ArgMatches, Command};
use tracing::info;

pub fn command() -> Command {
    Command::new("daemon")
        .about("Run the display scheduler until interrupted")
        .arg(utils::config_arg())
}

pub async fn run(matches: &ArgMatches) -> Result<()> {
    let config = utils::load_config(matches)?;
    let app = InfoDisplay::new(config)?;

    let daemon = app.start().await?;
    info!("daemon started, press Ctrl-C to stop");

    tokio::signal::ctrl_c().await?;
    info!("shutdown signal received");

    daemon.stop().await?;
    Ok(())
}
