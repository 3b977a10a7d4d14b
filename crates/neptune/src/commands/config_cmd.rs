//! `neptune config show|path`: no controller connection needed.

use std::path::Path;

use neptune_config::Config;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

pub fn handle(
    args: &ConfigArgs,
    config: &Config,
    path: &Path,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let out = match args.command {
        ConfigCommand::Show => config.to_redacted_toml()?,
        ConfigCommand::Path => path.display().to_string(),
    };
    output::print_output(&out, global.quiet);
    Ok(())
}
