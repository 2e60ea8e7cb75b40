//! Status command implementation

use crate::cli::utils;
use crate::InfoDisplay;
use anyhow::Result;
use clap::{ArgMatches, Command};

pub fn command() -> Command {
    Command::new("status")
        .about("Show the registered plugins and their configuration")
        .arg(utils::config_arg())
        .arg(
            clap::Arg::new("json")
                .long("json")
                .help("Emit machine-readable JSON")
                .action(clap::ArgAction::SetTrue),
        )
}

pub async fn run(matches: &ArgMatches) -> Result<()> {
    let config = utils::load_config(matches)?;
    let app = InfoDisplay::new(config)?;
    app.register_enabled().await?;

    let snapshot = app.status_snapshot().await;

    if matches.get_flag("json") {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    println!("Configured plugins:");
    for status in snapshot {
        println!(
            "  {:<10} {:<28} every {}s{}",
            status.name,
            status.description,
            status.interval_secs,
            if status.name == app.config().plugins.default {
                "  (default)"
            } else {
                ""
            }
        );
    }
    println!(
        "\nDisplay: {}x{} ({:?})",
        app.config().display.width,
        app.config().display.height,
        app.config().display.color_mode
    );

    Ok(())
}
