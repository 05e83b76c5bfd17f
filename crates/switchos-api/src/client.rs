// SwitchOS page client
//
// Wraps `reqwest::Client` with page URL construction, credential
// attachment, status mapping, and notation decoding. Page-specific
// accessors live alongside the request helpers; there are only three.

use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::models::{DevicePages, LinkPayload, PoePayload, SystemPayload};
use crate::notation;
use crate::transport::{Credentials, TransportConfig};

/// HTTP client for a single switch's web management pages.
///
/// Every page is fetched with the configured credentials, checked for
/// an auth failure, and decoded into its typed payload.
pub struct SwitchClient {
    http: reqwest::Client,
    base_url: Url,
    credentials: Option<Credentials>,
    timeout_secs: u64,
}

impl SwitchClient {
    /// Create a new client from a `TransportConfig`.
    ///
    /// The `base_url` is the switch root, e.g. `http://192.168.88.1`.
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self {
            http,
            base_url,
            credentials: transport.credentials.clone(),
            timeout_secs: transport.timeout_secs(),
        })
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(
        http: reqwest::Client,
        base_url: Url,
        credentials: Option<Credentials>,
    ) -> Self {
        Self {
            http,
            base_url,
            credentials,
            timeout_secs: 0,
        }
    }

    /// The switch base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── Pages ────────────────────────────────────────────────────────

    /// Fetch system identity and health.
    ///
    /// `GET /sys.b`
    pub async fn get_system(&self) -> Result<SystemPayload, Error> {
        self.get_page("sys.b").await
    }

    /// Fetch per-port PoE output.
    ///
    /// `GET /poe.b`. Models without PoE hardware answer 404, reported
    /// here as `Ok(None)`.
    pub async fn get_poe(&self) -> Result<Option<PoePayload>, Error> {
        match self.get_page("poe.b").await {
            Ok(poe) => Ok(Some(poe)),
            Err(e) if e.is_not_found() => {
                debug!("no PoE page on this model");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Fetch port names and count.
    ///
    /// `GET /link.b`
    pub async fn get_links(&self) -> Result<LinkPayload, Error> {
        self.get_page("link.b").await
    }

    /// Fetch every page needed for one device snapshot, concurrently.
    pub async fn fetch_all(&self) -> Result<DevicePages, Error> {
        let (system, poe, links) =
            tokio::join!(self.get_system(), self.get_poe(), self.get_links());
        Ok(DevicePages {
            system: system?,
            poe: poe?,
            links: links?,
        })
    }

    // ── Request helpers ──────────────────────────────────────────────

    fn page_url(&self, page: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(page)?)
    }

    /// Send a GET for a page and decode its body.
    pub(crate) async fn get_page<T: DeserializeOwned>(&self, page: &str) -> Result<T, Error> {
        let url = self.page_url(page)?;
        debug!("GET {}", url);

        let mut request = self.http.get(url);
        if let Some(ref creds) = self.credentials {
            request = request.basic_auth(&creds.username, Some(creds.password.expose_secret()));
        }

        let resp = request.send().await.map_err(|e| self.map_transport(e))?;

        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(Error::Authentication {
                message: format!("{page} rejected credentials (HTTP {status})"),
            });
        }
        if !status.is_success() {
            return Err(Error::Http {
                status: status.as_u16(),
                page: page.to_owned(),
            });
        }

        let body = resp.text().await.map_err(|e| self.map_transport(e))?;
        let value = notation::to_json(&body)?;
        serde_json::from_value(value).map_err(|e| Error::Deserialization {
            message: format!("{page}: {e}"),
            body,
        })
    }

    fn map_transport(&self, err: reqwest::Error) -> Error {
        if err.is_timeout() && self.timeout_secs > 0 {
            Error::Timeout {
                timeout_secs: self.timeout_secs,
            }
        } else {
            Error::Transport(err)
        }
    }
}
