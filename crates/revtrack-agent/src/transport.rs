//! HTTP phonehome transport

use async_trait::async_trait;
use revtrack_api::{PhonehomeRequest, PhonehomeResponse};
use revtrack_client::{ClientError, HttpClient};
use revtrack_core::{ClientConfig, CoreError, PhonehomeTransport};

/// Sends reports to the authority over HTTP
pub struct HttpTransport {
    client: HttpClient,
}

impl HttpTransport {
    /// Build a transport from the client's endpoint, timeout and headers
    ///
    /// # Errors
    /// Returns `ClientError` if the URL or a header is invalid
    pub fn from_config(config: &ClientConfig) -> Result<Self, ClientError> {
        let client = HttpClient::new(&config.url)?
            .with_timeout(config.timeout())
            .with_headers(&config.headers)?;
        Ok(Self { client })
    }
}

/// Classify a client error into the core failure kinds
pub fn classify(err: ClientError) -> CoreError {
    match err {
        ClientError::Api { status, .. } => CoreError::BadHttpStatus(status),
        err if err.is_malformed() => CoreError::MalformedResponseBody(err.to_string()),
        err => CoreError::NetworkFailure(err.to_string()),
    }
}

#[async_trait]
impl PhonehomeTransport for HttpTransport {
    async fn send(&self, request: &PhonehomeRequest) -> Result<PhonehomeResponse, CoreError> {
        self.client.phonehome(request).await.map_err(classify)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        assert_eq!(
            classify(ClientError::Api {
                status: 503,
                message: String::new(),
            }),
            CoreError::BadHttpStatus(503)
        );
        assert!(matches!(
            classify(ClientError::EmptyBody),
            CoreError::MalformedResponseBody(_)
        ));
        assert!(matches!(
            classify(ClientError::InvalidResponse("eof".into())),
            CoreError::MalformedResponseBody(_)
        ));
        assert!(matches!(
            classify(ClientError::InvalidHeader("x".into())),
            CoreError::NetworkFailure(_)
        ));
    }

    #[test]
    fn test_from_config_rejects_bad_url() {
        let config = ClientConfig::new("web", "not a url");
        assert!(HttpTransport::from_config(&config).is_err());
    }
}
