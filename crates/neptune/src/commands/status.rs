//! `neptune status`: one fetch, every configured probe and outlet.

use serde::Serialize;
use tabled::Tabled;

use neptune_core::{Controller, DeviceKind, Reading, StatusSnapshot};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Debug, Serialize)]
struct StatusEntry {
    kind: DeviceKind,
    name: String,
    id: String,
    /// Value or state exactly as the controller reported it.
    raw: Option<String>,
    reading: Reading,
}

#[derive(Tabled)]
struct StatusRow {
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Raw")]
    raw: String,
    #[tabled(rename = "Value")]
    value: String,
}

impl From<&StatusEntry> for StatusRow {
    fn from(e: &StatusEntry) -> Self {
        Self {
            kind: e.kind.to_string(),
            name: e.name.clone(),
            id: e.id.clone(),
            raw: e.raw.clone().unwrap_or_else(|| "-".into()),
            value: util::describe(e.reading),
        }
    }
}

fn raw_value(snapshot: &StatusSnapshot, kind: DeviceKind, name: &str, id: &str) -> Option<String> {
    match kind {
        DeviceKind::Probe => snapshot.probe(name).map(|p| p.value.to_string()),
        DeviceKind::Outlet => snapshot.outlet(id).map(|o| o.state.to_string()),
        DeviceKind::Feed => None,
    }
}

pub async fn handle(controller: &Controller, global: &GlobalOpts) -> Result<(), CliError> {
    controller.connect().await?;
    let snapshot = controller.cache().snapshot();

    let mut entries = Vec::new();
    for descriptor in controller.descriptors() {
        let Some(reading) = controller.reading(descriptor).await else {
            continue;
        };
        entries.push(StatusEntry {
            kind: descriptor.kind(),
            name: descriptor.name().to_owned(),
            id: descriptor.id().to_owned(),
            raw: raw_value(&snapshot, descriptor.kind(), descriptor.name(), descriptor.id()),
            reading,
        });
    }

    let out = output::render_list(global.output, &entries, |e| StatusRow::from(e), |e| {
        format!("{}\t{}", e.name, util::describe(e.reading))
    })?;
    output::print_output(&out, global.quiet);
    Ok(())
}
