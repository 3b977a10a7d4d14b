// ── Core error types ──
//
// Errors surfaced by neptune-core. Consumers never see raw HTTP status
// codes or XML decoder messages; the `From<neptune_api::Error>` impl
// folds them into the three classes the cache and gateway care about:
// the controller is unreachable, the document was unreadable, or the
// requested device isn't in the snapshot.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Network errors ───────────────────────────────────────────────
    /// Connect failure, non-2xx status or rejected credentials. The
    /// controller answers bad credentials the same way it answers any
    /// other refusal, so auth failures land here too.
    #[error("Cannot reach controller at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Controller request timed out")]
    Timeout,

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Unreadable status document: {message}")]
    Parse { message: String },

    #[error("{kind} '{identifier}' not found in controller status")]
    NotFound { kind: String, identifier: String },

    // ── Input errors ─────────────────────────────────────────────────
    #[error("Validation failed: {message}")]
    Validation { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Whether this is a network-class failure (including auth).
    pub fn is_network(&self) -> bool {
        matches!(self, Self::ConnectionFailed { .. } | Self::Timeout)
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<neptune_api::Error> for CoreError {
    fn from(err: neptune_api::Error) -> Self {
        let unauthorized = err.is_unauthorized();
        match err {
            neptune_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout
                } else {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                }
            }
            neptune_api::Error::Status { status, url } => CoreError::ConnectionFailed {
                url,
                reason: if unauthorized {
                    format!("credentials rejected (HTTP {status})")
                } else {
                    format!("HTTP {status}")
                },
            },
            neptune_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            neptune_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            neptune_api::Error::Parse { message, body: _ } => CoreError::Parse { message },
            neptune_api::Error::InvalidCommand(message) => CoreError::Validation { message },
        }
    }
}
