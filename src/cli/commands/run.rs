//! Run command implementation

use crate::cli::utils;
use crate::InfoDisplay;
use anyhow::Result;
use clap::{ArgMatches, Command};

pub fn command() -> Command {
    Command::new("run")
        .about("Render one plugin to the display and exit")
        .arg(utils::config_arg())
        .arg(
            clap::Arg::new("plugin")
                .help("Plugin name (defaults to the configured default plugin)")
                .value_name("PLUGIN"),
        )
}

pub async fn run(matches: &ArgMatches) -> Result<()> {
    let config = utils::load_config(matches)?;
    let app = InfoDisplay::new(config)?;

    let plugin = matches.get_one::<String>("plugin").map(String::as_str);
    app.run_once(plugin).await?;

    println!("Display updated.");
    Ok(())
}
