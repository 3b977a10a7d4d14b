use chrono::{DateTime, Utc};
use neptune_api::{DeviceStatus, OutletReading, ProbeReading};
use serde::Serialize;

/// One decoded status document and the moment it was fetched.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusSnapshot {
    pub probes: Vec<ProbeReading>,
    pub outlets: Vec<OutletReading>,
    pub fetched_at: DateTime<Utc>,
}

impl StatusSnapshot {
    /// The pre-fetch snapshot: no readings, stamped at the Unix epoch so
    /// the first read of any class is stale.
    pub fn empty() -> Self {
        Self {
            probes: Vec::new(),
            outlets: Vec::new(),
            fetched_at: DateTime::UNIX_EPOCH,
        }
    }

    pub fn new(status: DeviceStatus, fetched_at: DateTime<Utc>) -> Self {
        Self {
            probes: status.probes,
            outlets: status.outlets,
            fetched_at,
        }
    }

    /// Whether a refresh has ever succeeded.
    pub fn is_fetched(&self) -> bool {
        self.fetched_at != DateTime::UNIX_EPOCH
    }

    /// First probe whose name or id equals `name`.
    pub fn probe(&self, name: &str) -> Option<&ProbeReading> {
        self.probes.iter().find(|p| p.name == name || p.id == name)
    }

    pub fn outlet(&self, device_id: &str) -> Option<&OutletReading> {
        self.outlets.iter().find(|o| o.device_id == device_id)
    }
}

impl Default for StatusSnapshot {
    fn default() -> Self {
        Self::empty()
    }
}
