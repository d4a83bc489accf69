//! `LookupTransport` backed by the pooled hyper client.

use async_trait::async_trait;
use bytes::Bytes;
use lookup_http::{HttpClient, HttpClientConfig, HttpError};
use part_lookup_sdk::{HttpMethod, LookupTransport, TransportFailure, TransportRequest};

/// Sends lookup requests through a shared [`HttpClient`].
///
/// Cloning is cheap; clones share the connection pool.
#[derive(Clone, Debug)]
pub struct HttpLookupTransport {
    client: HttpClient,
}

impl HttpLookupTransport {
    #[must_use]
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }

    /// Build a transport with its own client.
    ///
    /// # Errors
    /// Returns [`HttpError`] if the TLS connector cannot be initialized.
    pub fn with_config(config: HttpClientConfig) -> Result<Self, HttpError> {
        Ok(Self::new(HttpClient::with_config(config)?))
    }
}

#[async_trait]
impl LookupTransport for HttpLookupTransport {
    async fn send(&self, request: TransportRequest) -> Result<Bytes, TransportFailure> {
        let method = match request.method {
            HttpMethod::Post => http::Method::POST,
        };
        self.client
            .send(method, &request.url, &request.headers, request.body)
            .await
            .map_err(|e| map_http_error(&e))
    }
}

/// Translate a client error into a chunk-level failure.
///
/// URL-bearing variants are reduced to their reason so the query string
/// (which carries the API key) never reaches a report or a log line.
pub(crate) fn map_http_error(error: &HttpError) -> TransportFailure {
    match error {
        HttpError::Timeout(after) => TransportFailure::Timeout {
            after_ms: u64::try_from(after.as_millis()).unwrap_or(u64::MAX),
        },
        HttpError::HttpStatus {
            status,
            body_preview,
        } => TransportFailure::HttpStatus {
            status: status.as_u16(),
            body_preview: body_preview.clone(),
        },
        HttpError::BodyTooLarge { limit } => TransportFailure::BodyTooLarge { limit: *limit },
        HttpError::Transport(source) | HttpError::Tls(source) => {
            TransportFailure::connect(error_chain(source.as_ref()))
        }
        HttpError::InvalidUri { reason, .. } => {
            TransportFailure::invalid_request(format!("invalid URL: {reason}"))
        }
        HttpError::InvalidScheme { scheme, reason } => {
            TransportFailure::invalid_request(format!("scheme '{scheme}' rejected: {reason}"))
        }
        e if e.is_request_error() => TransportFailure::invalid_request(e.to_string()),
        other => TransportFailure::other(other.to_string()),
    }
}

fn error_chain(error: &(dyn std::error::Error + 'static)) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}
