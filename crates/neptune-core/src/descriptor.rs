// ── Device descriptors ──
//
// One descriptor per configured probe, outlet or feed mode. Built once
// from configuration and shared behind `Arc`; nothing mutates them
// afterwards, so a descriptor's kind and probe type are fixed for the
// life of the process.

use std::fmt;
use std::time::Duration;

use neptune_api::{FeedMode, OutletCommand, OutletKey, ProbeType};
use serde::Serialize;

use crate::store::NOT_FOUND;

/// Multiplier the temperature conversion has always used. Not exactly
/// 5/9; kept as-is so readings match what existing users see.
pub const FAHRENHEIT_TO_CELSIUS_FACTOR: f64 = 0.5556;

/// Class of device, which decides TTL and polling behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DeviceKind {
    Probe,
    Outlet,
    Feed,
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Probe => "probe",
            Self::Outlet => "outlet",
            Self::Feed => "feed mode",
        })
    }
}

/// Immutable description of one configured device.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceDescriptor {
    id: String,
    name: String,
    kind: DeviceKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    probe_type: Option<ProbeType>,
    use_fahrenheit: bool,
    auto_off_shows_on: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    default_on: Option<OutletCommand>,
    #[serde(skip_serializing_if = "Option::is_none")]
    feed_mode: Option<FeedMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    feed_duration: Option<Duration>,
}

impl DeviceDescriptor {
    pub fn probe(
        id: impl Into<String>,
        name: impl Into<String>,
        probe_type: ProbeType,
        use_fahrenheit: bool,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind: DeviceKind::Probe,
            probe_type: Some(probe_type),
            use_fahrenheit,
            auto_off_shows_on: false,
            default_on: None,
            feed_mode: None,
            feed_duration: None,
        }
    }

    /// An outlet identified on the controller by `device_id` (e.g. `1_1`).
    ///
    /// `default_on` is the write command sent when the outlet is toggled
    /// on: [`OutletCommand::On`] forces it, [`OutletCommand::Auto`] hands
    /// it back to the controller's program.
    pub fn outlet(
        device_id: impl Into<String>,
        name: impl Into<String>,
        auto_off_shows_on: bool,
        default_on: OutletCommand,
    ) -> Self {
        Self {
            id: device_id.into(),
            name: name.into(),
            kind: DeviceKind::Outlet,
            probe_type: None,
            use_fahrenheit: false,
            auto_off_shows_on,
            default_on: Some(default_on),
            feed_mode: None,
            feed_duration: None,
        }
    }

    pub fn feed(
        id: impl Into<String>,
        name: impl Into<String>,
        mode: FeedMode,
        duration: Duration,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind: DeviceKind::Feed,
            probe_type: None,
            use_fahrenheit: false,
            auto_off_shows_on: false,
            default_on: None,
            feed_mode: Some(mode),
            feed_duration: Some(duration),
        }
    }

    /// The three probes a Trident module reports under one base id:
    /// `Alk{id}`, `Ca{id}` and `Mg{id}`.
    pub fn trident(base_id: &str) -> [Self; 3] {
        [
            ("Alk", ProbeType::Alkalinity),
            ("Ca", ProbeType::Calcium),
            ("Mg", ProbeType::Magnesium),
        ]
        .map(|(prefix, probe_type)| {
            let name = format!("{prefix}{base_id}");
            Self::probe(name.clone(), name, probe_type, false)
        })
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> DeviceKind {
        self.kind
    }

    pub fn probe_type(&self) -> Option<ProbeType> {
        self.probe_type
    }

    pub fn use_fahrenheit(&self) -> bool {
        self.use_fahrenheit
    }

    pub fn auto_off_shows_on(&self) -> bool {
        self.auto_off_shows_on
    }

    pub fn default_on(&self) -> Option<OutletCommand> {
        self.default_on
    }

    pub fn feed_mode(&self) -> Option<FeedMode> {
        self.feed_mode
    }

    pub fn feed_duration(&self) -> Option<Duration> {
        self.feed_duration
    }

    /// Allow-list entry for this outlet, `None` for other kinds.
    pub fn outlet_key(&self) -> Option<OutletKey> {
        (self.kind == DeviceKind::Outlet).then(|| OutletKey::new(&self.name, &self.id))
    }

    /// Value handed to the sink for a raw probe reading.
    ///
    /// Temperature probes flagged `use_fahrenheit` report in °F and are
    /// converted with `(v - 32) * 0.5556`. The not-found sentinel passes
    /// through untouched.
    pub fn display_value(&self, raw: f64) -> f64 {
        #[allow(clippy::float_cmp)]
        let is_sentinel = raw == NOT_FOUND;
        if is_sentinel {
            return raw;
        }
        if self.use_fahrenheit && self.probe_type == Some(ProbeType::Temperature) {
            (raw - 32.0) * FAHRENHEIT_TO_CELSIUS_FACTOR
        } else {
            raw
        }
    }
}
