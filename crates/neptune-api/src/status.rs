// Status document parser
//
// Decodes `/cgi-bin/status.xml` into typed probe and outlet readings.
// Only the `probes` and `outlets` sections are required; everything else
// in the document (hostname, power events, firmware info) is ignored.

use serde::Deserialize;
use tracing::trace;

use crate::error::Error;
use crate::models::{DeviceStatus, OutletReading, OutletState, ProbeReading, ProbeType};

// ── Raw document shape ───────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct RawStatus {
    probes: RawProbes,
    outlets: RawOutlets,
}

#[derive(Debug, Deserialize)]
struct RawProbes {
    #[serde(default)]
    probe: Vec<RawProbe>,
}

#[derive(Debug, Deserialize)]
struct RawProbe {
    name: String,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    value: String,
    #[serde(rename = "type", default)]
    probe_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawOutlets {
    #[serde(default)]
    outlet: Vec<RawOutlet>,
}

#[derive(Debug, Deserialize)]
struct RawOutlet {
    name: String,
    #[serde(default)]
    state: String,
    #[serde(rename = "deviceID")]
    device_id: String,
    #[serde(rename = "outputID", default)]
    output_id: Option<String>,
}

// ── Allow-list ───────────────────────────────────────────────────────

/// A configured outlet, identified by its name and `deviceID` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OutletKey {
    pub name: String,
    pub device_id: String,
}

impl OutletKey {
    pub fn new(name: impl Into<String>, device_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            device_id: device_id.into(),
        }
    }

    fn matches(&self, outlet: &RawOutlet) -> bool {
        self.name == outlet.name && self.device_id == outlet.device_id
    }
}

// ── Parser ───────────────────────────────────────────────────────────

/// Decodes status documents, keeping only allow-listed outlets.
///
/// Pure: the same body always yields the same [`DeviceStatus`].
#[derive(Debug, Clone, Default)]
pub struct StatusParser {
    allowed_outlets: Vec<OutletKey>,
}

impl StatusParser {
    pub fn new(allowed_outlets: Vec<OutletKey>) -> Self {
        Self { allowed_outlets }
    }

    pub fn parse(&self, body: &str) -> Result<DeviceStatus, Error> {
        let raw: RawStatus = quick_xml::de::from_str(body).map_err(|e| Error::Parse {
            message: e.to_string(),
            body: body.to_owned(),
        })?;

        let probes = raw
            .probes
            .probe
            .into_iter()
            .map(|p| {
                let probe_type = p
                    .probe_type
                    .as_deref()
                    .map_or(ProbeType::Other, ProbeType::from_device_type);
                ProbeReading {
                    id: p.id.unwrap_or_else(|| p.name.clone()),
                    value: coerce_number(&p.value),
                    name: p.name,
                    probe_type,
                }
            })
            .collect();

        let total_outlets = raw.outlets.outlet.len();
        let outlets: Vec<OutletReading> = raw
            .outlets
            .outlet
            .into_iter()
            .filter(|o| self.allowed_outlets.iter().any(|key| key.matches(o)))
            .map(|o| OutletReading {
                state: OutletState::parse(&o.state),
                name: o.name,
                device_id: o.device_id,
                output_id: o.output_id,
            })
            .collect();

        trace!(
            kept = outlets.len(),
            dropped = total_outlets - outlets.len(),
            "filtered outlets against allow-list"
        );

        Ok(DeviceStatus { probes, outlets })
    }
}

/// Coerce a probe value to a number: blank reads as `0`, anything that
/// isn't a decimal number reads as NaN.
fn coerce_number(raw: &str) -> f64 {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    trimmed.parse().unwrap_or(f64::NAN)
}
