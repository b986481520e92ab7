//! Replay tool entry point
//!
//! Loads the field configuration, builds the configured index, applies a
//! replay script to it and prints the JSON report on stdout.

mod cli;
mod config;
mod logging;
mod script;

use anyhow::{Context, Result};
use pursuit_field::build_index;
use tracing::{error, info};

use crate::cli::CliArgs;
use crate::config::AppConfig;
use crate::logging::setup_logging;
use crate::script::Script;

fn main() -> Result<()> {
    let args = CliArgs::parse();

    let mut config = AppConfig::load_from_file(&args.config_path)?;
    config.apply_overrides(&args);
    config.validate().context("Invalid configuration")?;

    setup_logging(&config.logging)?;

    info!(
        config = %args.config_path.display(),
        kind = %config.kind(),
        "Starting pursuit-replay v{}",
        env!("CARGO_PKG_VERSION")
    );

    let script = match Script::load(&args.script_path) {
        Ok(script) => script,
        Err(err) => {
            error!("{:#}", err);
            return Err(err);
        }
    };

    let mut index = build_index(&config.field);
    let report = script.run(index.as_mut());

    let json = serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
    println!("{json}");
    Ok(())
}
