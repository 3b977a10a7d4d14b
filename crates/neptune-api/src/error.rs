use thiserror::Error;

/// Top-level error type for the `neptune-api` crate.
///
/// Covers every failure mode of the controller's HTTP interface:
/// transport, HTTP status, and status-document decoding.
/// `neptune-core` maps these into its own diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Non-success HTTP status. The controller answers bad credentials
    /// with 401, which lands here as well.
    #[error("Controller returned HTTP {status} for {url}")]
    Status { status: u16, url: String },

    /// TLS setup error (bad CA file, client build failure).
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Data ────────────────────────────────────────────────────────
    /// The status document was malformed or missing a required section.
    #[error("Failed to parse status document: {message}")]
    Parse { message: String, body: String },

    /// A command value outside the range the controller accepts.
    #[error("Invalid command: {0}")]
    InvalidCommand(String),
}

impl Error {
    /// Returns `true` if this is a transient error worth retrying on the
    /// next poll.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Status { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Returns `true` if the controller rejected the credentials.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Status { status: 401 | 403, .. })
    }

    /// Returns `true` if the failure happened while decoding the document.
    pub fn is_parse(&self) -> bool {
        matches!(self, Self::Parse { .. })
    }
}
