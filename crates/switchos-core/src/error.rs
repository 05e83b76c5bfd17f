// ── Core error types ──
//
// Coordinator-level errors. Consumers never see HTTP status codes or
// notation decode failures directly; the `From<switchos_api::Error>`
// impl folds transport-layer errors into connect / auth / parse.

use thiserror::Error;

/// Unified error type for the core crate.
///
/// `Clone` so the coordinator can keep the last refresh error in its
/// shared state and still hand a copy to every caller that joined the
/// failing refresh.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    // ── Fetch errors ─────────────────────────────────────────────────
    #[error("Cannot connect to switch at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Switch did not answer within {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Unexpected response from switch: {message}")]
    Parse { message: String },

    // ── Coordinator errors ───────────────────────────────────────────
    #[error("No data available yet: the first refresh has not succeeded")]
    Unavailable,

    #[error("Coordinator has been torn down")]
    ShutDown,

    // ── Sensor errors ────────────────────────────────────────────────
    #[error("Port {port} does not exist (device has {available} ports)")]
    PortOutOfRange { port: usize, available: usize },

    #[error("Invalid sensor binding for '{key}': {reason}")]
    InvalidSensor { key: String, reason: String },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Credentials were rejected. The host should ask for new ones rather
    /// than wait for the next tick to fix it.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::AuthenticationFailed { .. })
    }

    /// A failure of the remote fetch (as opposed to a local usage error).
    pub fn is_fetch_failure(&self) -> bool {
        matches!(
            self,
            Self::ConnectionFailed { .. }
                | Self::Timeout { .. }
                | Self::AuthenticationFailed { .. }
                | Self::Parse { .. }
        )
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<switchos_api::Error> for CoreError {
    fn from(err: switchos_api::Error) -> Self {
        match err {
            switchos_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            switchos_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout { timeout_secs: 0 }
                } else if e.is_decode() || e.is_body() {
                    CoreError::Parse {
                        message: e.to_string(),
                    }
                } else {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                }
            }
            switchos_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            switchos_api::Error::Timeout { timeout_secs } => CoreError::Timeout { timeout_secs },
            switchos_api::Error::Http { status, page } => CoreError::ConnectionFailed {
                url: page,
                reason: format!("HTTP {status}"),
            },
            switchos_api::Error::Deserialization { message, body: _ } => {
                CoreError::Parse { message }
            }
        }
    }
}
