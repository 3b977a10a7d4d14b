//! `neptune outlet <name> on|off|auto`

use serde::Serialize;

use neptune_core::{Controller, DeviceKind, OutletCommand, Reading};

use crate::cli::{GlobalOpts, OutletAction, OutletArgs};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Debug, Serialize)]
struct OutletResult {
    outlet: String,
    command: OutletCommand,
    code: u8,
    /// State read back after the post-command refresh.
    state: Reading,
}

impl From<OutletAction> for OutletCommand {
    fn from(action: OutletAction) -> Self {
        match action {
            OutletAction::On => OutletCommand::On,
            OutletAction::Off => OutletCommand::Off,
            OutletAction::Auto => OutletCommand::Auto,
        }
    }
}

pub async fn handle(
    controller: &Controller,
    args: OutletArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let descriptor = controller.find(DeviceKind::Outlet, &args.name)?;
    controller.connect().await?;

    let command = OutletCommand::from(args.state);
    controller.set_outlet_state(&descriptor, command).await;
    let state = controller
        .outlet_state(&descriptor, descriptor.auto_off_shows_on())
        .await;

    let result = OutletResult {
        outlet: descriptor.name().to_owned(),
        command,
        code: command.code(),
        state: Reading::Outlet(state),
    };
    let out = output::render_single(global.output, &result, |r| {
        format!(
            "{}: sent {} ({}), now {}",
            r.outlet,
            r.command,
            r.code,
            util::describe(r.state)
        )
    })?;
    output::print_output(&out, global.quiet);
    Ok(())
}
