mod cli;
mod commands;
mod error;
mod output;

use std::path::Path;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use neptune_config::Config;
use neptune_core::Controller;

use crate::cli::{Cli, Command, GlobalOpts};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let path = cli
        .global
        .config
        .clone()
        .unwrap_or_else(neptune_config::config_path);
    let mut config = neptune_config::load_config(&path)?;

    match cli.command {
        // Config commands don't need a controller
        Command::Config(ref args) => commands::config_cmd::handle(args, &config, &path, &cli.global),

        cmd => {
            apply_overrides(&mut config, &cli.global);
            let controller = build_controller(&config, &path)?;

            tracing::debug!(command = ?cmd, "dispatching command");
            commands::dispatch(cmd, &controller, &cli.global).await
        }
    }
}

fn apply_overrides(config: &mut Config, global: &GlobalOpts) {
    if global.insecure {
        config.device.insecure = true;
    }
    if let Some(timeout) = global.timeout {
        config.device.timeout = timeout;
    }
}

fn build_controller(config: &Config, path: &Path) -> Result<Controller, CliError> {
    if config.device.host.trim().is_empty() && !path.exists() {
        return Err(CliError::NoConfig {
            path: path.display().to_string(),
        });
    }

    let descriptors = neptune_config::build_descriptors(config)?;
    let controller_config = neptune_config::to_controller_config(config)?;
    Ok(Controller::new(controller_config, descriptors)?)
}
