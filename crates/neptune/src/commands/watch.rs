//! `neptune watch`: run the pollers and print every reading until Ctrl-C.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use tracing::{debug, info};

use neptune_core::{Controller, DeviceDescriptor, DeviceKind, Reading, ReadingSink};

use crate::cli::{GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Serialize)]
struct WatchEvent<'a> {
    time: String,
    kind: DeviceKind,
    name: &'a str,
    reading: Reading,
}

/// Prints each reading as a line (text or JSON).
struct PrintSink {
    format: OutputFormat,
    quiet: bool,
}

impl ReadingSink for PrintSink {
    fn publish(&self, descriptor: &DeviceDescriptor, reading: Reading) {
        debug!(device = descriptor.name(), ?reading, "reading");
        let time = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
        let line = match self.format {
            OutputFormat::Json | OutputFormat::JsonCompact => {
                let event = WatchEvent {
                    time,
                    kind: descriptor.kind(),
                    name: descriptor.name(),
                    reading,
                };
                serde_json::to_string(&event).unwrap_or_default()
            }
            OutputFormat::Table | OutputFormat::Plain => format!(
                "{time}  {:<9} {:<12} {}",
                descriptor.kind().to_string(),
                descriptor.name(),
                util::describe(reading)
            ),
        };
        output::print_output(&line, self.quiet);
    }
}

pub async fn handle(controller: &Controller, global: &GlobalOpts) -> Result<(), CliError> {
    controller.connect().await?;

    let sink = Arc::new(PrintSink {
        format: global.output,
        quiet: global.quiet,
    });
    // A terminal session has no persisted accessories: everything is new.
    let plan = controller.start(sink, &HashSet::new()).await;
    info!(devices = plan.len(), "watching, Ctrl-C to stop");

    tokio::signal::ctrl_c().await?;
    controller.shutdown().await;
    Ok(())
}
