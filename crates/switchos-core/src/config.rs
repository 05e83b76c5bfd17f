// ── Runtime coordinator configuration ──
//
// These types describe *how* to reach a switch and how often to poll it.
// They carry credential data and timing, but never touch disk.
// The CLI constructs a `CoordinatorConfig` and hands it in.

use std::time::Duration;

use secrecy::SecretString;
use url::Url;

/// Poll cadence suited to a switch on the local network.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(10);

/// Per-request timeout. Kept at or below the refresh interval so a hung
/// request cannot overlap the next tick.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Credentials for the switch's web interface.
#[derive(Debug, Clone)]
pub struct AuthCredentials {
    pub username: String,
    pub password: SecretString,
}

/// Configuration for polling a single switch.
///
/// Built by the CLI, passed to `HttpSource` and `Coordinator`.
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Switch URL (e.g., `http://192.168.88.1`).
    pub url: Url,
    /// `None` for switches with an empty admin password disabled.
    pub auth: Option<AuthCredentials>,
    /// Request timeout.
    pub timeout: Duration,
    /// How often to refresh. `Duration::ZERO` = never (one-shot use).
    pub refresh_interval: Duration,
}

impl CoordinatorConfig {
    /// Config with default timing and no credentials.
    pub fn new(url: Url) -> Self {
        Self {
            url,
            auth: None,
            timeout: DEFAULT_TIMEOUT,
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
        }
    }

    pub fn with_auth(mut self, username: impl Into<String>, password: SecretString) -> Self {
        self.auth = Some(AuthCredentials {
            username: username.into(),
            password,
        });
        self
    }

    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Whether a periodic refresh task should be spawned.
    pub fn polls(&self) -> bool {
        !self.refresh_interval.is_zero()
    }
}
