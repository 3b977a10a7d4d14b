// ── Runtime connection configuration ──
//
// These types describe *how* to reach an Apex controller and how stale
// its cached status may get. They carry credential data and tuning, but
// never touch disk. neptune-config builds a `ControllerConfig` and hands
// it in.

use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use crate::descriptor::DeviceKind;

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict). Default: most controllers speak plain HTTP.
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(std::path::PathBuf),
    /// Skip verification (self-signed proxies).
    DangerAcceptInvalid,
}

/// Per-class cache lifetimes and poll jitter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshConfig {
    /// Maximum snapshot age before a probe read refetches.
    pub probe_ttl: Duration,
    /// Maximum snapshot age before an outlet read refetches.
    pub outlet_ttl: Duration,
    /// Half-width of the window each poll period is drawn from.
    pub jitter: Duration,
}

impl RefreshConfig {
    /// TTL for a device class. Feed modes are never polled and share the
    /// outlet TTL.
    pub fn ttl_for(&self, kind: DeviceKind) -> Duration {
        match kind {
            DeviceKind::Probe => self.probe_ttl,
            DeviceKind::Outlet | DeviceKind::Feed => self.outlet_ttl,
        }
    }
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            probe_ttl: Duration::from_secs(60),
            outlet_ttl: Duration::from_secs(60),
            jitter: Duration::from_secs(10),
        }
    }
}

/// Configuration for connecting to a single controller.
///
/// Built by neptune-config, passed to `Controller` -- core never reads
/// config files.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Controller root URL (e.g., `http://192.168.1.50:80/`).
    pub url: Url,
    pub username: String,
    pub password: SecretString,
    /// Serial number, used to derive stable accessory keys.
    pub serial_number: String,
    pub tls: TlsVerification,
    /// Request timeout.
    pub timeout: Duration,
    pub refresh: RefreshConfig,
}
