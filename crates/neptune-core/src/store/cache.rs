// ── Status cache ──
//
// Owns the current snapshot and decides when a read has to refetch.
// Refresh failures never reach callers: the previous snapshot (and its
// timestamp) stays in place and the next stale read tries again.
//
// There is no single-flight guard. Two reads that both find the
// snapshot stale both fetch; the GET is idempotent and the later
// replace wins.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use neptune_api::{OutletState, StatusParser};
use tokio::sync::watch;
use tracing::{debug, warn};

use super::snapshot::StatusSnapshot;
use super::{NOT_FOUND, OUTLET_UNKNOWN};
use crate::config::RefreshConfig;
use crate::descriptor::{DeviceDescriptor, DeviceKind};
use crate::device::DeviceApi;
use crate::error::CoreError;

pub struct StatusCache {
    api: Arc<dyn DeviceApi>,
    parser: StatusParser,
    refresh: RefreshConfig,
    snapshot: watch::Sender<Arc<StatusSnapshot>>,
}

impl StatusCache {
    pub fn new(api: Arc<dyn DeviceApi>, parser: StatusParser, refresh: RefreshConfig) -> Self {
        let (snapshot, _) = watch::channel(Arc::new(StatusSnapshot::empty()));
        Self {
            api,
            parser,
            refresh,
            snapshot,
        }
    }

    pub fn refresh_config(&self) -> &RefreshConfig {
        &self.refresh
    }

    // ── Reads ────────────────────────────────────────────────────────

    /// Value of the probe whose name or id equals the descriptor's name,
    /// refreshing first if the probe TTL has lapsed. [`NOT_FOUND`] when
    /// the snapshot has no such probe.
    pub async fn probe_value(&self, descriptor: &DeviceDescriptor) -> f64 {
        self.refresh_if_stale(DeviceKind::Probe).await;

        let snapshot = self.snapshot();
        if let Some(probe) = snapshot.probe(descriptor.name()) {
            probe.value
        } else {
            debug!(probe = descriptor.name(), "probe not in snapshot");
            NOT_FOUND
        }
    }

    /// Outlet state code for the descriptor's `deviceID`, refreshing
    /// first if the outlet TTL has lapsed. See [`decode_outlet_state`].
    pub async fn outlet_state(&self, descriptor: &DeviceDescriptor, auto_off_shows_on: bool) -> i8 {
        self.refresh_if_stale(DeviceKind::Outlet).await;

        let snapshot = self.snapshot();
        match snapshot.outlet(descriptor.id()) {
            Some(outlet) => decode_outlet_state(&outlet.state, auto_off_shows_on),
            None => {
                debug!(
                    outlet = descriptor.name(),
                    device_id = descriptor.id(),
                    "outlet not in snapshot"
                );
                OUTLET_UNKNOWN
            }
        }
    }

    /// Current snapshot without any freshness check.
    pub fn snapshot(&self) -> Arc<StatusSnapshot> {
        Arc::clone(&self.snapshot.borrow())
    }

    /// Receiver that observes every snapshot replacement.
    pub fn subscribe(&self) -> watch::Receiver<Arc<StatusSnapshot>> {
        self.snapshot.subscribe()
    }

    /// Age of the current snapshot, `None` before the first successful
    /// refresh.
    pub fn data_age(&self) -> Option<TimeDelta> {
        let snapshot = self.snapshot();
        snapshot
            .is_fetched()
            .then(|| Utc::now() - snapshot.fetched_at)
    }

    // ── Refresh ──────────────────────────────────────────────────────

    /// Fetch and parse a fresh status document, replacing the snapshot on
    /// success. On error the current snapshot is left untouched.
    pub async fn try_refresh(&self) -> Result<(), CoreError> {
        let body = self.api.fetch_status().await?;
        let status = self.parser.parse(&body)?;
        let snapshot = StatusSnapshot::new(status, Utc::now());

        debug!(
            probes = snapshot.probes.len(),
            outlets = snapshot.outlets.len(),
            "status refreshed"
        );
        self.snapshot.send_replace(Arc::new(snapshot));
        Ok(())
    }

    /// Refresh regardless of staleness. Failures are logged and dropped.
    pub async fn force_refresh(&self) {
        if let Err(e) = self.try_refresh().await {
            warn!(error = %e, "status refresh failed, keeping previous snapshot");
        }
    }

    /// Refresh if the snapshot is older than the TTL for `kind` at `now`.
    /// Returns whether a refresh was attempted.
    pub async fn refresh_if_stale_at(&self, kind: DeviceKind, now: DateTime<Utc>) -> bool {
        let fetched_at = self.snapshot.borrow().fetched_at;
        if !is_stale(fetched_at, now, self.refresh.ttl_for(kind)) {
            return false;
        }
        self.force_refresh().await;
        true
    }

    async fn refresh_if_stale(&self, kind: DeviceKind) -> bool {
        self.refresh_if_stale_at(kind, Utc::now()).await
    }
}

/// `|now - fetched_at| > ttl`. The absolute value keeps a backwards clock
/// step from pinning the snapshot forever.
pub fn is_stale(fetched_at: DateTime<Utc>, now: DateTime<Utc>, ttl: Duration) -> bool {
    let ttl = TimeDelta::from_std(ttl).unwrap_or(TimeDelta::MAX);
    (now - fetched_at).abs() > ttl
}

/// Read-side outlet state to sink code: `ON`/`AON` are 1, `OFF`/`AOF`
/// are 1 when `auto_off_shows_on` is set and 0 otherwise, anything else
/// is [`OUTLET_UNKNOWN`].
pub fn decode_outlet_state(state: &OutletState, auto_off_shows_on: bool) -> i8 {
    match state {
        OutletState::On | OutletState::AutoOn => 1,
        OutletState::Off | OutletState::AutoOff => i8::from(auto_off_shows_on),
        OutletState::Unknown(_) => OUTLET_UNKNOWN,
    }
}
