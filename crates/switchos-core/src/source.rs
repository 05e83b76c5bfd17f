// ── Snapshot sources ──
//
// The coordinator only knows how to ask for "the whole device, now".
// `HttpSource` answers that by fetching the switch's pages; tests plug in
// scripted sources through the same trait.

use async_trait::async_trait;
use tracing::debug;

use switchos_api::{Credentials, SwitchClient, TransportConfig};

use crate::config::CoordinatorConfig;
use crate::error::CoreError;
use crate::model::Snapshot;

/// A remote read of the full device state.
///
/// Implementations may be slow and may fail; they are not transactional
/// across fields. The coordinator never calls `fetch_snapshot` twice
/// concurrently.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    async fn fetch_snapshot(&self) -> Result<Snapshot, CoreError>;

    /// Human-readable description, used in log lines.
    fn describe(&self) -> String;
}

/// Fetches snapshots over HTTP from the switch's web interface.
pub struct HttpSource {
    client: SwitchClient,
}

impl HttpSource {
    /// Build the HTTP client described by `config`.
    pub fn from_config(config: &CoordinatorConfig) -> Result<Self, CoreError> {
        let client = SwitchClient::new(config.url.clone(), &build_transport(config))?;
        Ok(Self { client })
    }

    /// Wrap an existing client.
    pub fn with_client(client: SwitchClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SnapshotSource for HttpSource {
    async fn fetch_snapshot(&self) -> Result<Snapshot, CoreError> {
        let pages = self.client.fetch_all().await?;
        let snapshot = Snapshot::from(pages);
        debug!(
            serial = %snapshot.identity.serial_number,
            ports = snapshot.port_count(),
            poe = snapshot.supports_poe(),
            "snapshot fetched"
        );
        Ok(snapshot)
    }

    fn describe(&self) -> String {
        self.client.base_url().to_string()
    }
}

/// Build a [`TransportConfig`] from the coordinator configuration.
fn build_transport(config: &CoordinatorConfig) -> TransportConfig {
    TransportConfig {
        timeout: config.timeout,
        credentials: config
            .auth
            .as_ref()
            .map(|a| Credentials::new(a.username.clone(), a.password.clone())),
    }
}
