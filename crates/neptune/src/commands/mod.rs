//! Command handlers, one module per subcommand.

pub mod config_cmd;
pub mod feed;
pub mod outlet;
pub mod status;
pub mod util;
pub mod watch;

use neptune_core::Controller;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Route a controller-backed command to its handler.
pub async fn dispatch(
    cmd: Command,
    controller: &Controller,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Status => status::handle(controller, global).await,
        Command::Outlet(args) => outlet::handle(controller, args, global).await,
        Command::Feed(args) => feed::handle(controller, args, global).await,
        Command::Watch => watch::handle(controller, global).await,
        Command::Config(_) => Err(CliError::Internal(
            "config commands do not use a controller".into(),
        )),
    }
}
