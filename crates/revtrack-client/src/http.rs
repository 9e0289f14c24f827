//! HTTP client for the revtrack resolution endpoint

use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use tracing::debug;
use url::Url;

use revtrack_api::{PhonehomeRequest, PhonehomeResponse};

use crate::error::{ClientError, Result};

/// HTTP client posting phonehome reports
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    endpoint: Url,
    headers: HeaderMap,
    timeout: Option<Duration>,
}

impl HttpClient {
    /// Create a new HTTP client for the given phonehome URL
    ///
    /// # Errors
    /// Returns an error if the URL is invalid.
    ///
    /// # Example
    /// ```no_run
    /// use revtrack_client::HttpClient;
    ///
    /// let client = HttpClient::new("http://localhost:8080/phonehome")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn new(endpoint: impl AsRef<str>) -> Result<Self> {
        Self::with_client(endpoint, Client::new())
    }

    /// Create a new HTTP client with custom `reqwest::Client`
    ///
    /// # Errors
    /// Returns an error if the URL is invalid.
    pub fn with_client(endpoint: impl AsRef<str>, client: Client) -> Result<Self> {
        let endpoint = Url::parse(endpoint.as_ref())?;
        Ok(Self {
            client,
            endpoint,
            headers: HeaderMap::new(),
            timeout: None,
        })
    }

    /// Per-request timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Extra headers attached to every phonehome request
    ///
    /// # Errors
    /// Returns `ClientError::InvalidHeader` if a name or value is not valid
    /// in an HTTP header.
    pub fn with_headers(mut self, headers: &BTreeMap<String, String>) -> Result<Self> {
        for (name, value) in headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| ClientError::InvalidHeader(format!("{name}: {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| ClientError::InvalidHeader(format!("{name}: {e}")))?;
            self.headers.insert(name, value);
        }
        Ok(self)
    }

    /// Send a report and read the resolved revision
    ///
    /// # Errors
    /// - `ClientError::Http` if the request could not be sent or timed out
    /// - `ClientError::Api` on a non-2xx status
    /// - `ClientError::EmptyBody` / `ClientError::InvalidResponse` if the
    ///   body is missing or not a phonehome response
    pub async fn phonehome(&self, report: &PhonehomeRequest) -> Result<PhonehomeResponse> {
        let mut request = self
            .client
            .post(self.endpoint.clone())
            .headers(self.headers.clone())
            .json(report);
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await?;
        let status = response.status();
        debug!(status = status.as_u16(), url = %self.endpoint, "phonehome response");

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ClientError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.bytes().await?;
        if body.iter().all(u8::is_ascii_whitespace) {
            return Err(ClientError::EmptyBody);
        }

        serde_json::from_slice(&body).map_err(|e| ClientError::InvalidResponse(e.to_string()))
    }
}
