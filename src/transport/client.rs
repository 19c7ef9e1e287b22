//! Blocking HTTP client for the router's JSON-RPC style API.

use super::cookies::SessionCookies;
use reqwest::blocking::{Client, RequestBuilder};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Path every API call is posted to, whatever the service being invoked.
pub const API_PATH: &str = "/ws/NeMo/Intf/lan:getMIBs";

/// Content type the router expects on API calls.
pub const CONTENT_TYPE: &str = "application/x-sah-ws-4-call+json";

/// Errors raised by a single HTTP exchange.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to build HTTP client: {0}")]
    Build(#[source] reqwest::Error),

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("http status {status}: {body}")]
    Status { status: u16, body: String },
}

/// How a request authenticates against the router.
#[derive(Debug, Clone, Copy)]
pub enum Credential<'a> {
    /// The login call itself (`Authorization: X-Sah-Login`).
    Login,
    /// An established session (`Authorization: X-Sah <token>` and `x-context`).
    Session(&'a str),
}

impl Credential<'_> {
    fn apply(self, builder: RequestBuilder) -> RequestBuilder {
        match self {
            Credential::Login => builder.header("Authorization", "X-Sah-Login"),
            Credential::Session(token) => builder
                .header("Authorization", format!("X-Sah {token}"))
                .header("x-context", token),
        }
    }
}

/// Pooled HTTP client bound to one router.
///
/// Safe to share between threads; the connection pool and the cookie store
/// are both internally synchronized.
pub struct HttpTransport {
    client: Client,
    cookies: Arc<SessionCookies>,
    base_url: String,
    timeout: Duration,
}

impl HttpTransport {
    /// Creates a transport for the router at `base_url` (e.g. `http://192.168.2.254`).
    ///
    /// `timeout` bounds the client as a whole and every individual request.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, TransportError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let cookies = Arc::new(SessionCookies::new());
        let client = Client::builder()
            .timeout(timeout)
            .cookie_provider(Arc::clone(&cookies))
            .build()
            .map_err(TransportError::Build)?;

        Ok(Self {
            client,
            cookies,
            base_url,
            timeout,
        })
    }

    /// The router root, without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// URL API calls are posted to.
    pub fn api_url(&self) -> String {
        format!("{}{}", self.base_url, API_PATH)
    }

    /// URL of the router's landing page.
    pub fn root_url(&self) -> String {
        format!("{}/", self.base_url)
    }

    /// Configured request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Cookie store attached to the client.
    pub fn cookies(&self) -> &SessionCookies {
        &self.cookies
    }

    /// POSTs a JSON body to the API endpoint and returns the response body.
    ///
    /// Any non-2xx status is reported as [`TransportError::Status`].
    pub fn post(&self, credential: Credential<'_>, body: String) -> Result<Vec<u8>, TransportError> {
        let request = self
            .browser_headers(self.client.post(self.api_url()))
            .header("content-type", CONTENT_TYPE)
            .body(body);
        self.send(credential.apply(request))
    }

    /// GETs the router landing page.
    pub fn get_root(&self, credential: Credential<'_>) -> Result<Vec<u8>, TransportError> {
        let request = self.browser_headers(self.client.get(self.root_url()));
        self.send(credential.apply(request))
    }

    fn browser_headers(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("accept", "*/*")
            .header("accept-language", "en-US,en;q=0.7")
            .header("sec-gpc", "1")
            .header("Origin", self.base_url.as_str())
            .header("Referer", self.root_url())
    }

    fn send(&self, request: RequestBuilder) -> Result<Vec<u8>, TransportError> {
        let response = request.timeout(self.timeout).send()?;
        let status = response.status();
        let body = response.bytes()?;

        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }
        Ok(body.to_vec())
    }
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
