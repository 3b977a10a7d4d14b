// Apex HTTP client
//
// Wraps `reqwest::Client` with the controller's URL layout and basic auth.
// Status reads go to `/cgi-bin/status.xml`; every command is a POST to
// `/status.sht` with the instruction carried in the query string.

use secrecy::{ExposeSecret, SecretString};
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::models::{FeedMode, OutletCommand};
use crate::transport::TransportConfig;

const STATUS_PATH: &str = "cgi-bin/status.xml";
const COMMAND_PATH: &str = "status.sht";

/// Basic-auth credentials for the controller's web interface.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
}

/// Raw HTTP client for a single Apex controller.
///
/// Performs no retries and keeps no state beyond the connection pool:
/// every failure is returned to the caller as an [`Error`].
pub struct ApexClient {
    http: reqwest::Client,
    base_url: Url,
    credentials: Credentials,
}

impl ApexClient {
    /// Create a new client from a `TransportConfig`.
    ///
    /// `base_url` is the controller root, e.g. `http://192.168.1.50:80`.
    pub fn new(
        base_url: Url,
        credentials: Credentials,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self {
            http,
            base_url,
            credentials,
        })
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url, credentials: Credentials) -> Self {
        Self {
            http,
            base_url,
            credentials,
        }
    }

    // ── URL builders ─────────────────────────────────────────────────

    pub(crate) fn status_url(&self) -> Result<Url, Error> {
        Ok(self.base_url.join(STATUS_PATH)?)
    }

    /// Build `{base}/status.sht?{query}`.
    ///
    /// The query is set verbatim: the controller expects `$FeedSel` and
    /// `Feed%20Cancel` exactly as written, not form-encoded.
    pub(crate) fn command_url(&self, query: &str) -> Result<Url, Error> {
        let mut url = self.base_url.join(COMMAND_PATH)?;
        url.set_query(Some(query));
        Ok(url)
    }

    // ── Requests ─────────────────────────────────────────────────────

    /// Fetch the raw status document.
    ///
    /// `GET /cgi-bin/status.xml`
    pub async fn fetch_status(&self) -> Result<String, Error> {
        let url = self.status_url()?;
        debug!("GET {}", url);

        let resp = self
            .http
            .get(url)
            .basic_auth(
                &self.credentials.username,
                Some(self.credentials.password.expose_secret()),
            )
            .send()
            .await?;

        let resp = check_status(resp)?;
        Ok(resp.text().await?)
    }

    /// Set an outlet to auto, off or on.
    ///
    /// `POST /status.sht?{name}_state={0|1|2}&Update=Update`
    pub async fn set_outlet_state(
        &self,
        outlet_name: &str,
        command: OutletCommand,
    ) -> Result<(), Error> {
        debug!(outlet = outlet_name, %command, code = command.code(), "setting outlet state");
        let query = format!("{outlet_name}_state={}&Update=Update", command.code());
        self.post_command(&query).await
    }

    /// Start one of the four feed cycles.
    ///
    /// `POST /status.sht?$FeedSel={0..3}&FeedCycle=Feed`
    pub async fn set_feed_mode(&self, mode: FeedMode) -> Result<(), Error> {
        debug!(%mode, index = mode.index(), "starting feed cycle");
        let query = format!("$FeedSel={}&FeedCycle=Feed", mode.index());
        self.post_command(&query).await
    }

    /// Cancel whichever feed cycle is running.
    ///
    /// `POST /status.sht?FeedCycle=Feed%20Cancel`
    pub async fn cancel_feed_mode(&self) -> Result<(), Error> {
        debug!("cancelling feed cycle");
        self.post_command("FeedCycle=Feed%20Cancel").await
    }

    async fn post_command(&self, query: &str) -> Result<(), Error> {
        let url = self.command_url(query)?;
        debug!("POST {}", url);

        let resp = self
            .http
            .post(url)
            .basic_auth(
                &self.credentials.username,
                Some(self.credentials.password.expose_secret()),
            )
            .send()
            .await?;

        check_status(resp)?;
        Ok(())
    }
}

/// Turn a non-2xx response into [`Error::Status`].
fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, Error> {
    let status = resp.status();
    if status.is_success() {
        Ok(resp)
    } else {
        Err(Error::Status {
            status: status.as_u16(),
            url: resp.url().to_string(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client(base: &str) -> ApexClient {
        ApexClient::with_client(
            reqwest::Client::new(),
            Url::parse(base).unwrap(),
            Credentials {
                username: "admin".into(),
                password: SecretString::from("1234".to_string()),
            },
        )
    }

    #[test]
    fn status_url_is_under_cgi_bin() {
        let url = client("http://10.0.0.5:8080/").status_url().unwrap();
        assert_eq!(url.as_str(), "http://10.0.0.5:8080/cgi-bin/status.xml");
    }

    #[test]
    fn command_url_keeps_query_verbatim() {
        let c = client("http://10.0.0.5/");
        let url = c.command_url("$FeedSel=2&FeedCycle=Feed").unwrap();
        assert_eq!(url.as_str(), "http://10.0.0.5/status.sht?$FeedSel=2&FeedCycle=Feed");

        let url = c.command_url("FeedCycle=Feed%20Cancel").unwrap();
        assert_eq!(url.as_str(), "http://10.0.0.5/status.sht?FeedCycle=Feed%20Cancel");
    }
}
