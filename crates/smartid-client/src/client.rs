//! Blocking OCSP responder client.

use reqwest::blocking::Client as HttpClient;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use smartid_core::{Result, SmartIdError};
use smartid_trust::OcspTransport;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Media type of a DER OCSP request
pub const OCSP_REQUEST_CONTENT_TYPE: &str = "application/ocsp-request";

/// Media type of a DER OCSP response
pub const OCSP_RESPONSE_CONTENT_TYPE: &str = "application/ocsp-response";

/// Default request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Posts OCSP requests over HTTP(S).
#[derive(Clone, Debug)]
pub struct OcspClient {
    inner: Arc<ClientInner>,
}

#[derive(Debug)]
struct ClientInner {
    http: HttpClient,
}

impl OcspClient {
    /// Client with the default timeout and user agent
    pub fn new() -> Result<Self> {
        OcspClientBuilder::new().build()
    }

    /// Create a builder for custom configuration
    #[must_use]
    pub fn builder() -> OcspClientBuilder {
        OcspClientBuilder::new()
    }

    /// POST `request_der` to `url` and return the response body.
    pub fn post(&self, url: &str, request_der: &[u8]) -> Result<Vec<u8>> {
        debug!(url = %url, bytes = request_der.len(), "POST OCSP request");

        let response = self
            .inner
            .http
            .post(url)
            .header(CONTENT_TYPE, OCSP_REQUEST_CONTENT_TYPE)
            .header(ACCEPT, OCSP_RESPONSE_CONTENT_TYPE)
            .body(request_der.to_vec())
            .send()
            .map_err(|e| SmartIdError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            warn!(url = %url, status = status.as_u16(), "OCSP responder rejected the request");
            return Err(SmartIdError::Http(format!(
                "OCSP responder returned HTTP {}",
                status.as_u16()
            )));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_owned();
        if !content_type.starts_with(OCSP_RESPONSE_CONTENT_TYPE) {
            debug!(content_type = %content_type, "unexpected OCSP response content type");
        }

        let body = response
            .bytes()
            .map_err(|e| SmartIdError::Http(e.to_string()))?;
        debug!(url = %url, bytes = body.len(), "OCSP response received");
        Ok(body.to_vec())
    }
}

impl OcspTransport for OcspClient {
    fn send(&self, url: &str, request_der: &[u8]) -> Result<Vec<u8>> {
        self.post(url, request_der)
    }
}

/// Builder for configuring an [`OcspClient`]
#[derive(Debug, Clone)]
pub struct OcspClientBuilder {
    timeout: Duration,
    user_agent: String,
}

impl Default for OcspClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl OcspClientBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            user_agent: format!("smartid-rust/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Set the request timeout
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the User-Agent header
    #[must_use]
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = agent.into();
        self
    }

    /// Build the client
    pub fn build(self) -> Result<OcspClient> {
        let http = HttpClient::builder()
            .timeout(self.timeout)
            .user_agent(&self.user_agent)
            .build()
            .map_err(|e| SmartIdError::Http(format!("failed to build HTTP client: {e}")))?;

        Ok(OcspClient {
            inner: Arc::new(ClientInner { http }),
        })
    }
}
