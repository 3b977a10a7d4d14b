//! Configuration for neptune.
//!
//! TOML file + `NEPTUNE_` environment overrides, password resolution
//! (env + keyring + plaintext), and translation into the
//! `neptune_core::ControllerConfig` and device descriptors the core
//! runs on. Every setting is validated here, once, so core never sees a
//! half-formed device.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use neptune_core::{
    ControllerConfig, DeviceDescriptor, FeedMode, OutletCommand, ProbeType, RefreshConfig,
    TlsVerification,
};

const KEYRING_SERVICE: &str = "neptune";
const PASSWORD_ENV: &str = "NEPTUNE_PASSWORD";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no password configured for controller '{host}'")]
    NoCredentials { host: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

fn invalid(field: impl Into<String>, reason: impl Into<String>) -> ConfigError {
    ConfigError::Validation {
        field: field.into(),
        reason: reason.into(),
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub device: DeviceSection,

    #[serde(default)]
    pub refresh: RefreshSection,

    #[serde(default)]
    pub probes: Vec<ProbeEntry>,

    /// Trident modules; each expands into Alk/Ca/Mg probes.
    #[serde(default)]
    pub tridents: Vec<TridentEntry>,

    #[serde(default)]
    pub outlets: Vec<OutletEntry>,

    #[serde(default)]
    pub feed_modes: Vec<FeedModeEntry>,
}

/// How to reach the controller.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DeviceSection {
    /// Hostname or IP address.
    #[serde(default)]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// `http` or `https`.
    #[serde(default = "default_scheme")]
    pub scheme: String,

    #[serde(default = "default_username")]
    pub username: String,

    /// Plaintext password (prefer keyring or env var).
    pub password: Option<String>,

    /// Environment variable name containing the password.
    pub password_env: Option<String>,

    /// Stable identity for accessory keys. Defaults to `host`.
    pub serial_number: Option<String>,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    #[serde(default)]
    pub insecure: bool,

    /// Path to a custom CA certificate.
    pub ca_cert: Option<PathBuf>,
}

impl Default for DeviceSection {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: default_port(),
            scheme: default_scheme(),
            username: default_username(),
            password: None,
            password_env: None,
            serial_number: None,
            timeout: default_timeout(),
            insecure: false,
            ca_cert: None,
        }
    }
}

fn default_port() -> u16 {
    80
}
fn default_scheme() -> String {
    "http".into()
}
fn default_username() -> String {
    "admin".into()
}
fn default_timeout() -> u64 {
    10
}

/// Cache lifetimes in seconds. Also the base poll period per class.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RefreshSection {
    #[serde(default = "default_ttl")]
    pub probe_secs: u64,

    #[serde(default = "default_ttl")]
    pub outlet_secs: u64,

    #[serde(default = "default_jitter")]
    pub jitter_secs: u64,
}

impl Default for RefreshSection {
    fn default() -> Self {
        Self {
            probe_secs: default_ttl(),
            outlet_secs: default_ttl(),
            jitter_secs: default_jitter(),
        }
    }
}

fn default_ttl() -> u64 {
    60
}
fn default_jitter() -> u64 {
    10
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProbeEntry {
    /// Name as reported in the status document (e.g. `Tmp`).
    pub name: String,

    /// Defaults to `name`.
    pub id: Option<String>,

    #[serde(rename = "type")]
    pub probe_type: ProbeType,

    /// Probe reports °F; convert for display.
    #[serde(default)]
    pub use_fahrenheit: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TridentEntry {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutletEntry {
    pub name: String,

    /// The outlet's `deviceID` (e.g. `1_1`).
    pub id: String,

    #[serde(default)]
    pub default_on: DefaultOn,

    /// Report automation-off as on.
    #[serde(default)]
    pub auto_off_shows_on: bool,
}

/// What "turn on" means for an outlet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DefaultOn {
    /// Force on.
    #[default]
    On,
    /// Hand control back to the controller's program.
    Auto,
}

impl From<DefaultOn> for OutletCommand {
    fn from(value: DefaultOn) -> Self {
        match value {
            DefaultOn::On => OutletCommand::On,
            DefaultOn::Auto => OutletCommand::Auto,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FeedModeEntry {
    pub name: String,

    /// 0..=3. Derived from a `FeedA`..`FeedD` name when omitted.
    pub index: Option<u8>,

    /// Local countdown after which the mode reads as off.
    pub duration_secs: u64,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("io", "neptune", "neptune").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("neptune");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the Config from `path` + environment. A missing file yields the
/// defaults (plus any env overrides).
///
/// Environment keys nest on `__`: `NEPTUNE_DEVICE__HOST=10.0.0.5`.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    debug!(path = %path.display(), "loading config");
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("NEPTUNE_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

impl Config {
    /// Pretty TOML with any plaintext password masked.
    pub fn to_redacted_toml(&self) -> Result<String, ConfigError> {
        let mut shown = self.clone();
        if shown.device.password.is_some() {
            shown.device.password = Some("********".into());
        }
        Ok(toml::to_string_pretty(&shown)?)
    }
}

// ── Credential resolution ───────────────────────────────────────────

/// Resolve the controller password: `password_env` variable, then
/// `NEPTUNE_PASSWORD`, then the system keyring, then plaintext config.
pub fn resolve_password(device: &DeviceSection) -> Result<SecretString, ConfigError> {
    resolve_password_with(
        device,
        |name| std::env::var(name).ok(),
        |host| {
            keyring::Entry::new(KEYRING_SERVICE, &format!("{host}/password"))
                .and_then(|entry| entry.get_password())
                .ok()
        },
    )
}

fn resolve_password_with(
    device: &DeviceSection,
    env: impl Fn(&str) -> Option<String>,
    keyring: impl Fn(&str) -> Option<String>,
) -> Result<SecretString, ConfigError> {
    // 1. Configured env var
    if let Some(ref env_name) = device.password_env {
        if let Some(pw) = env(env_name) {
            return Ok(SecretString::from(pw));
        }
    }

    // 2. Well-known env var
    if let Some(pw) = env(PASSWORD_ENV) {
        return Ok(SecretString::from(pw));
    }

    // 3. Keyring
    if let Some(pw) = keyring(&device.host) {
        return Ok(SecretString::from(pw));
    }

    // 4. Plaintext in config
    if let Some(ref pw) = device.password {
        return Ok(SecretString::from(pw.clone()));
    }

    Err(ConfigError::NoCredentials {
        host: device.host.clone(),
    })
}

// ── Translation to core types ───────────────────────────────────────

/// Controller root URL, `{scheme}://{host}:{port}/`.
pub fn controller_url(device: &DeviceSection) -> Result<url::Url, ConfigError> {
    if device.host.trim().is_empty() {
        return Err(invalid("device.host", "must be set"));
    }
    if !matches!(device.scheme.as_str(), "http" | "https") {
        return Err(invalid(
            "device.scheme",
            format!("expected 'http' or 'https', got '{}'", device.scheme),
        ));
    }
    let raw = format!("{}://{}:{}/", device.scheme, device.host.trim(), device.port);
    raw.parse()
        .map_err(|_| invalid("device.host", format!("not a valid address: {}", device.host)))
}

pub fn refresh_config(refresh: &RefreshSection) -> Result<RefreshConfig, ConfigError> {
    if refresh.probe_secs == 0 {
        return Err(invalid("refresh.probe_secs", "must be greater than zero"));
    }
    if refresh.outlet_secs == 0 {
        return Err(invalid("refresh.outlet_secs", "must be greater than zero"));
    }
    Ok(RefreshConfig {
        probe_ttl: Duration::from_secs(refresh.probe_secs),
        outlet_ttl: Duration::from_secs(refresh.outlet_secs),
        jitter: Duration::from_secs(refresh.jitter_secs),
    })
}

/// Build a `ControllerConfig`, resolving the password.
pub fn to_controller_config(config: &Config) -> Result<ControllerConfig, ConfigError> {
    let device = &config.device;
    let url = controller_url(device)?;
    let password = resolve_password(device)?;

    let tls = if device.insecure {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = device.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    };

    Ok(ControllerConfig {
        url,
        username: device.username.clone(),
        password,
        serial_number: device
            .serial_number
            .clone()
            .unwrap_or_else(|| device.host.clone()),
        tls,
        timeout: Duration::from_secs(device.timeout),
        refresh: refresh_config(&config.refresh)?,
    })
}

/// Every configured device as a descriptor, in file order: probes,
/// Trident probes, outlets, feed modes.
pub fn build_descriptors(config: &Config) -> Result<Vec<DeviceDescriptor>, ConfigError> {
    let mut out = Vec::new();

    for (i, probe) in config.probes.iter().enumerate() {
        if probe.name.trim().is_empty() {
            return Err(invalid(format!("probes[{i}].name"), "must not be empty"));
        }
        let id = probe.id.clone().unwrap_or_else(|| probe.name.clone());
        out.push(DeviceDescriptor::probe(
            id,
            probe.name.clone(),
            probe.probe_type,
            probe.use_fahrenheit,
        ));
    }

    for (i, trident) in config.tridents.iter().enumerate() {
        if trident.id.trim().is_empty() {
            return Err(invalid(format!("tridents[{i}].id"), "must not be empty"));
        }
        out.extend(DeviceDescriptor::trident(&trident.id));
    }

    for (i, outlet) in config.outlets.iter().enumerate() {
        if outlet.name.trim().is_empty() {
            return Err(invalid(format!("outlets[{i}].name"), "must not be empty"));
        }
        if outlet.id.trim().is_empty() {
            return Err(invalid(format!("outlets[{i}].id"), "must not be empty"));
        }
        out.push(DeviceDescriptor::outlet(
            outlet.id.clone(),
            outlet.name.clone(),
            outlet.auto_off_shows_on,
            outlet.default_on.into(),
        ));
    }

    for (i, feed) in config.feed_modes.iter().enumerate() {
        let mode = feed_mode(feed).map_err(|reason| invalid(format!("feed_modes[{i}]"), reason))?;
        if feed.duration_secs == 0 {
            return Err(invalid(
                format!("feed_modes[{i}].duration_secs"),
                "must be greater than zero",
            ));
        }
        out.push(DeviceDescriptor::feed(
            feed.name.clone(),
            feed.name.clone(),
            mode,
            Duration::from_secs(feed.duration_secs),
        ));
    }

    Ok(out)
}

fn feed_mode(feed: &FeedModeEntry) -> Result<FeedMode, String> {
    match feed.index {
        Some(index) => FeedMode::try_from(index).map_err(|e| e.to_string()),
        None => FeedMode::from_name(&feed.name).ok_or_else(|| {
            format!(
                "no index given and '{}' is not one of FeedA..FeedD",
                feed.name
            )
        }),
    }
}
