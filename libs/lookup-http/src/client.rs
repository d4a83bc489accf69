use crate::config::{HttpClientConfig, TransportSecurity};
use crate::error::{HttpError, InvalidUriKind};
use crate::tls;
use bytes::Bytes;
use http::header::{HeaderName, HeaderValue, USER_AGENT};
use http::{Method, Request, Uri};
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper_rustls::HttpsConnector;
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::{TokioExecutor, TokioTimer};
use std::time::Duration;

/// Number of body characters kept in [`HttpError::HttpStatus`] previews.
const BODY_PREVIEW_CHARS: usize = 256;

type HyperClient = Client<HttpsConnector<HttpConnector>, Full<Bytes>>;

/// Pooled HTTP client.
///
/// `HttpClient` is `Clone + Send + Sync`; clones share the connection pool.
/// Every [`send`](HttpClient::send) builds its own `http::Request`, so
/// concurrent calls never share request state.
#[derive(Clone)]
pub struct HttpClient {
    inner: HyperClient,
    user_agent: HeaderValue,
    request_timeout: Duration,
    max_body_size: usize,
    transport_security: TransportSecurity,
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("user_agent", &self.user_agent)
            .field("request_timeout", &self.request_timeout)
            .field("max_body_size", &self.max_body_size)
            .field("transport_security", &self.transport_security)
            .finish_non_exhaustive()
    }
}

impl HttpClient {
    /// Create a new HTTP client with default configuration
    ///
    /// # Errors
    /// Returns an error if TLS initialization fails
    pub fn new() -> Result<Self, HttpError> {
        Self::with_config(HttpClientConfig::default())
    }

    /// Create a client from an explicit configuration
    ///
    /// # Errors
    /// Returns an error if TLS initialization fails or the user agent is not a
    /// valid header value
    pub fn with_config(config: HttpClientConfig) -> Result<Self, HttpError> {
        if config.transport == TransportSecurity::AllowInsecureHttp {
            tracing::warn!(
                "insecure HTTP enabled (TransportSecurity::AllowInsecureHttp); \
                 use only for testing with mock servers"
            );
        }

        let https = tls::build_https_connector(config.tls_roots, config.transport)?;

        let mut builder = Client::builder(TokioExecutor::new());
        // pool_timer is required for pool_idle_timeout to take effect
        builder
            .pool_timer(TokioTimer::new())
            .pool_max_idle_per_host(config.pool_max_idle_per_host);
        if let Some(idle_timeout) = config.pool_idle_timeout {
            builder.pool_idle_timeout(idle_timeout);
        }
        let inner = builder.build::<_, Full<Bytes>>(https);

        let user_agent = HeaderValue::try_from(config.user_agent.as_str())?;

        Ok(Self {
            inner,
            user_agent,
            request_timeout: config.request_timeout,
            max_body_size: config.max_body_size,
            transport_security: config.transport,
        })
    }

    /// Send one request and return the full response body.
    ///
    /// `headers` are applied in order after the User-Agent header. The whole
    /// exchange, body included, must finish within the configured request
    /// timeout.
    ///
    /// # Errors
    ///
    /// - [`HttpError::InvalidUri`] / [`HttpError::InvalidScheme`] for a bad URL
    /// - [`HttpError::InvalidHeaderName`] / [`HttpError::InvalidHeaderValue`]
    /// - [`HttpError::Timeout`] when the deadline passes
    /// - [`HttpError::Transport`] for connection level failures
    /// - [`HttpError::BodyTooLarge`] when the body exceeds the size limit
    /// - [`HttpError::HttpStatus`] for any non-2xx status
    pub async fn send(
        &self,
        method: Method,
        url: &str,
        headers: &[(String, String)],
        body: Bytes,
    ) -> Result<Bytes, HttpError> {
        let uri = self.parse_uri(url)?;

        let mut request = Request::builder()
            .method(method)
            .uri(uri)
            .header(USER_AGENT, self.user_agent.clone());
        for (name, value) in headers {
            request = request.header(
                HeaderName::try_from(name.as_str())?,
                HeaderValue::try_from(value.as_str())?,
            );
        }
        let request = request.body(Full::new(body))?;

        tokio::time::timeout(self.request_timeout, self.execute(request))
            .await
            .map_err(|_| HttpError::Timeout(self.request_timeout))?
    }

    async fn execute(&self, request: Request<Full<Bytes>>) -> Result<Bytes, HttpError> {
        let response = self.inner.request(request).await?;
        let status = response.status();

        let collected = Limited::new(response.into_body(), self.max_body_size)
            .collect()
            .await
            .map_err(|e| {
                if e.is::<LengthLimitError>() {
                    HttpError::BodyTooLarge {
                        limit: self.max_body_size,
                    }
                } else {
                    HttpError::Transport(e)
                }
            })?;
        let body = collected.to_bytes();

        if !status.is_success() {
            let body_preview: String = String::from_utf8_lossy(&body)
                .chars()
                .take(BODY_PREVIEW_CHARS)
                .collect();
            return Err(HttpError::HttpStatus {
                status,
                body_preview,
            });
        }

        Ok(body)
    }

    fn parse_uri(&self, url: &str) -> Result<Uri, HttpError> {
        let uri: Uri = url.parse().map_err(|e: http::uri::InvalidUri| {
            HttpError::InvalidUri {
                url: url.to_owned(),
                kind: InvalidUriKind::ParseError,
                reason: e.to_string(),
            }
        })?;

        let Some(scheme) = uri.scheme_str().map(str::to_ascii_lowercase) else {
            return Err(HttpError::InvalidUri {
                url: url.to_owned(),
                kind: InvalidUriKind::MissingScheme,
                reason: "absolute URL with http:// or https:// required".to_owned(),
            });
        };
        if uri.authority().is_none() {
            return Err(HttpError::InvalidUri {
                url: url.to_owned(),
                kind: InvalidUriKind::MissingAuthority,
                reason: "URL has no host".to_owned(),
            });
        }

        match (scheme.as_str(), self.transport_security) {
            ("https", _) | ("http", TransportSecurity::AllowInsecureHttp) => Ok(uri),
            ("http", _) => Err(HttpError::InvalidScheme {
                scheme,
                reason: "plain HTTP requires TransportSecurity::AllowInsecureHttp".to_owned(),
            }),
            _ => Err(HttpError::InvalidScheme {
                scheme,
                reason: "only http and https are supported".to_owned(),
            }),
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn test_client() -> HttpClient {
        HttpClient::with_config(HttpClientConfig::for_testing()).unwrap()
    }

    fn json_headers() -> Vec<(String, String)> {
        vec![
            ("accept".to_owned(), "application/json".to_owned()),
            ("content-type".to_owned(), "application/json".to_owned()),
        ]
    }

    #[tokio::test]
    async fn test_post_returns_body() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/search")
                .header("content-type", "application/json")
                .header("accept", "application/json")
                .body(r#"{"q":1}"#);
            then.status(200).json_body(json!({"ok": true}));
        });

        let client = test_client();
        let url = format!("{}/search", server.base_url());
        let body = client
            .send(
                Method::POST,
                &url,
                &json_headers(),
                Bytes::from_static(br#"{"q":1}"#),
            )
            .await
            .unwrap();

        mock.assert();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value, json!({"ok": true}));
    }

    #[tokio::test]
    async fn test_user_agent_is_sent() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/ua").header("user-agent", "custom/1.0");
            then.status(200);
        });

        let client = HttpClient::with_config(HttpClientConfig {
            user_agent: "custom/1.0".to_owned(),
            ..HttpClientConfig::for_testing()
        })
        .unwrap();
        let url = format!("{}/ua", server.base_url());
        client.send(Method::GET, &url, &[], Bytes::new()).await.unwrap();

        mock.assert();
    }

    #[tokio::test]
    async fn test_non_2xx_returns_http_status_error() {
        let server = MockServer::start();
        let _m = server.mock(|when, then| {
            when.method(POST).path("/error");
            then.status(503).body("service unavailable");
        });

        let client = test_client();
        let url = format!("{}/error", server.base_url());
        let result = client.send(Method::POST, &url, &[], Bytes::new()).await;

        match result {
            Err(HttpError::HttpStatus {
                status,
                body_preview,
            }) => {
                assert_eq!(status, http::StatusCode::SERVICE_UNAVAILABLE);
                assert_eq!(body_preview, "service unavailable");
            }
            other => panic!("Expected HttpStatus error, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_body_size_limit() {
        let server = MockServer::start();
        let large_body = "x".repeat(64 * 1024);
        let _m = server.mock(|when, then| {
            when.method(GET).path("/large");
            then.status(200).body(&large_body);
        });

        let client = HttpClient::with_config(HttpClientConfig {
            max_body_size: 1024,
            ..HttpClientConfig::for_testing()
        })
        .unwrap();
        let url = format!("{}/large", server.base_url());
        let result = client.send(Method::GET, &url, &[], Bytes::new()).await;

        assert!(matches!(result, Err(HttpError::BodyTooLarge { limit: 1024 })));
    }

    #[tokio::test]
    async fn test_timeout() {
        let server = MockServer::start();
        let _m = server.mock(|when, then| {
            when.method(GET).path("/slow");
            then.status(200).delay(Duration::from_millis(500));
        });

        let client = HttpClient::with_config(HttpClientConfig {
            request_timeout: Duration::from_millis(50),
            ..HttpClientConfig::for_testing()
        })
        .unwrap();
        let url = format!("{}/slow", server.base_url());
        let result = client.send(Method::GET, &url, &[], Bytes::new()).await;

        assert!(matches!(result, Err(HttpError::Timeout(_))));
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        // Bind then drop a listener so the port is very likely closed.
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let client = test_client();
        let url = format!("http://127.0.0.1:{port}/nothing");
        let result = client.send(Method::GET, &url, &[], Bytes::new()).await;

        assert!(matches!(result, Err(HttpError::Transport(_))));
    }

    #[tokio::test]
    async fn test_http_rejected_when_tls_only() {
        let client = HttpClient::new().unwrap();
        let result = client
            .send(Method::GET, "http://example.com/", &[], Bytes::new())
            .await;
        assert!(matches!(result, Err(HttpError::InvalidScheme { .. })));
    }

    #[tokio::test]
    async fn test_relative_url_rejected() {
        let client = test_client();
        let result = client.send(Method::GET, "/search", &[], Bytes::new()).await;
        match result {
            Err(HttpError::InvalidUri { kind, .. }) => {
                assert_eq!(kind, InvalidUriKind::MissingScheme);
            }
            other => panic!("Expected InvalidUri, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_invalid_header_name_rejected() {
        let client = test_client();
        let headers = vec![("bad header".to_owned(), "v".to_owned())];
        let result = client
            .send(Method::GET, "http://127.0.0.1:1/", &headers, Bytes::new())
            .await;
        assert!(matches!(result, Err(HttpError::InvalidHeaderName(_))));
    }

    #[test]
    fn test_client_is_clone_send_sync() {
        fn assert_traits<T: Clone + Send + Sync>() {}
        assert_traits::<HttpClient>();
    }
}
