// Apex wire models
//
// Typed views of the controller's status document plus the two command
// encodings. The read side reports outlet state as a string code
// (ON/OFF/AON/AOF) while the write side takes a numeric code with a
// different ordering (0=auto, 1=off, 2=on). The two are deliberately
// separate types.

use std::fmt;

use serde::{Deserialize, Serialize, Serializer};
use strum::{Display, EnumString};

use crate::error::Error;

// ── Probes ───────────────────────────────────────────────────────────

/// Kind of measurement a probe reports.
///
/// Resolved once, either from configuration or from the `<type>` element
/// of the status document. Never inferred from the probe name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ProbeType {
    Temperature,
    Ph,
    Orp,
    Salinity,
    Alkalinity,
    Calcium,
    Magnesium,
    Other,
}

impl ProbeType {
    /// Decode the controller's `<type>` element.
    pub fn from_device_type(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "temp" => Self::Temperature,
            "ph" => Self::Ph,
            "orp" => Self::Orp,
            "cond" | "salt" => Self::Salinity,
            "alk" => Self::Alkalinity,
            "ca" => Self::Calcium,
            "mg" => Self::Magnesium,
            _ => Self::Other,
        }
    }
}

/// A single probe reading from the status document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbeReading {
    pub name: String,
    /// The document carries no separate probe id; it mirrors `name` unless
    /// the firmware reports one.
    pub id: String,
    pub probe_type: ProbeType,
    pub value: f64,
}

// ── Outlets ──────────────────────────────────────────────────────────

/// Read-side outlet state as reported in `<state>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutletState {
    /// `ON`: manual override on.
    On,
    /// `OFF`: manual override off.
    Off,
    /// `AON`: automation currently has it on.
    AutoOn,
    /// `AOF`: automation currently has it off.
    AutoOff,
    /// Anything else the firmware reports (e.g. `TBL`).
    Unknown(String),
}

impl OutletState {
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "ON" => Self::On,
            "OFF" => Self::Off,
            "AON" => Self::AutoOn,
            "AOF" => Self::AutoOff,
            other => Self::Unknown(other.to_owned()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::On => "ON",
            Self::Off => "OFF",
            Self::AutoOn => "AON",
            Self::AutoOff => "AOF",
            Self::Unknown(raw) => raw,
        }
    }
}

impl fmt::Display for OutletState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for OutletState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// A single outlet entry from the status document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutletReading {
    pub name: String,
    pub device_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_id: Option<String>,
    pub state: OutletState,
}

/// Probes and allow-listed outlets decoded from one status document.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DeviceStatus {
    pub probes: Vec<ProbeReading>,
    pub outlets: Vec<OutletReading>,
}

// ── Commands ─────────────────────────────────────────────────────────

/// Write-side outlet code sent as `{name}_state={code}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum OutletCommand {
    Auto,
    Off,
    On,
}

impl OutletCommand {
    pub fn code(self) -> u8 {
        match self {
            Self::Auto => 0,
            Self::Off => 1,
            Self::On => 2,
        }
    }
}

impl TryFrom<u8> for OutletCommand {
    type Error = Error;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::Auto),
            1 => Ok(Self::Off),
            2 => Ok(Self::On),
            other => Err(Error::InvalidCommand(format!(
                "outlet code must be 0, 1 or 2, got {other}"
            ))),
        }
    }
}

/// One of the four feed cycles (A–D), sent as `$FeedSel={index}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum FeedMode {
    A,
    B,
    C,
    D,
}

impl FeedMode {
    pub fn index(self) -> u8 {
        match self {
            Self::A => 0,
            Self::B => 1,
            Self::C => 2,
            Self::D => 3,
        }
    }

    /// Resolve `FeedA`..`FeedD` (case-insensitive) to a mode.
    pub fn from_name(name: &str) -> Option<Self> {
        let lower = name.trim().to_ascii_lowercase();
        let letter = lower.strip_prefix("feed")?;
        match letter {
            "a" => Some(Self::A),
            "b" => Some(Self::B),
            "c" => Some(Self::C),
            "d" => Some(Self::D),
            _ => None,
        }
    }
}

impl TryFrom<u8> for FeedMode {
    type Error = Error;

    fn try_from(index: u8) -> Result<Self, Self::Error> {
        match index {
            0 => Ok(Self::A),
            1 => Ok(Self::B),
            2 => Ok(Self::C),
            3 => Ok(Self::D),
            other => Err(Error::InvalidCommand(format!(
                "feed index must be in 0..=3, got {other}"
            ))),
        }
    }
}
