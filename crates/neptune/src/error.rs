//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use neptune_config::ConfigError;
use neptune_core::CoreError;

pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach controller at {url}")]
    #[diagnostic(
        code(neptune::connection_failed),
        help(
            "Check the host and port in [device], and that the Apex web interface is enabled.\n\
             Wrong credentials are reported the same way: check username and password too."
        )
    )]
    ConnectionFailed {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Controller request timed out")]
    #[diagnostic(
        code(neptune::timeout),
        help("Increase timeout with --timeout or check controller responsiveness.")
    )]
    Timeout,

    #[error("Controller returned an unreadable status document")]
    #[diagnostic(
        code(neptune::parse),
        help("The address may point at something other than an Apex: {message}")
    )]
    ParseFailed { message: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("No password configured for controller '{host}'")]
    #[diagnostic(
        code(neptune::no_credentials),
        help(
            "Set NEPTUNE_PASSWORD, point password_env at a variable,\n\
             or store it in the system keyring under service 'neptune', user '{host}/password'."
        )
    )]
    NoCredentials { host: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(neptune::not_found),
        help("Run: neptune status to see configured devices")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
    },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(neptune::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Configuration file not found")]
    #[diagnostic(
        code(neptune::no_config),
        help(
            "Create one with a [device] section and your outlets.\n\
             Expected at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(neptune::config))]
    Config(Box<figment::Error>),

    // ── Internal / IO ────────────────────────────────────────────────
    #[error("Internal error: {0}")]
    #[diagnostic(code(neptune::internal))]
    Internal(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Could not render JSON: {0}")]
    #[diagnostic(code(neptune::json))]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } | Self::ParseFailed { .. } => exit_code::CONNECTION,
            Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Timeout => exit_code::TIMEOUT,
            Self::Validation { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => CliError::ConnectionFailed {
                url,
                source: reason.into(),
            },
            CoreError::Timeout => CliError::Timeout,
            CoreError::Parse { message } => CliError::ParseFailed { message },
            CoreError::NotFound { kind, identifier } => CliError::NotFound {
                resource_type: kind,
                identifier,
            },
            CoreError::Validation { message } => CliError::Validation {
                field: "input".into(),
                reason: message,
            },
            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },
            CoreError::Internal(message) => CliError::Internal(message),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::NoCredentials { host } => CliError::NoCredentials { host },
            ConfigError::Figment(e) => CliError::Config(e),
            ConfigError::Serialization(e) => CliError::Internal(e.to_string()),
        }
    }
}
