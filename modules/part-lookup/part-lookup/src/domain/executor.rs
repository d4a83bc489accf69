//! Execution of a single chunk against the search service.

use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use part_lookup_sdk::{
    ChunkOutcome, HttpMethod, LookupTransport, PartSearchOption, TransportFailure,
    TransportRequest,
};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use tracing::instrument;
use url::Url;

use super::chunker::Chunk;
use super::decoder::decode;
use super::routes::ServiceRoutes;

/// Separator between part numbers in one search expression.
pub const PART_SEPARATOR: &str = "|";

#[derive(Serialize)]
struct SearchByPartBody<'a> {
    #[serde(rename = "SearchByPartRequest")]
    request: SearchByPartRequest<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchByPartRequest<'a> {
    mouser_part_number: &'a str,
    part_search_options: PartSearchOption,
}

/// Sends one chunk and classifies the response.
///
/// Holds no per-call state; concurrent `execute` calls each build their
/// own request.
#[derive(Clone)]
pub struct ChunkExecutor {
    transport: Arc<dyn LookupTransport>,
    search_url: Url,
    search_option: PartSearchOption,
}

impl ChunkExecutor {
    #[must_use]
    pub fn new(
        transport: Arc<dyn LookupTransport>,
        routes: &ServiceRoutes,
        search_option: PartSearchOption,
    ) -> Self {
        Self {
            transport,
            search_url: routes.part_search().clone(),
            search_option,
        }
    }

    /// Run one chunk. Never fails; every problem becomes a [`ChunkOutcome`].
    #[instrument(skip_all, fields(chunk = chunk.index, size = chunk.len()))]
    pub async fn execute(&self, chunk: &Chunk, api_key: &SecretString) -> ChunkOutcome {
        let start = Instant::now();
        let outcome = match self.build_request(chunk, api_key) {
            Ok(request) => match self.transport.send(request).await {
                Ok(body) => classify(&body),
                Err(failure) => ChunkOutcome::TransportFailure(failure),
            },
            Err(failure) => ChunkOutcome::TransportFailure(failure),
        };

        // Elapsed time of a single call always fits in u64
        #[allow(clippy::cast_possible_truncation)]
        let elapsed_ms = start.elapsed().as_millis() as u64;

        match &outcome {
            ChunkOutcome::Success(records) => tracing::debug!(
                elapsed_ms,
                records = records.len(),
                "chunk succeeded"
            ),
            ChunkOutcome::ServiceError(messages) => tracing::warn!(
                elapsed_ms,
                errors = messages.len(),
                first_error = messages.first().map_or("", String::as_str),
                "search service reported errors"
            ),
            ChunkOutcome::TransportFailure(cause) => tracing::warn!(
                elapsed_ms,
                kind = cause.kind(),
                error = %cause,
                "chunk call failed"
            ),
        }
        outcome
    }

    /// Build the search request for `chunk`.
    ///
    /// # Errors
    /// Returns [`TransportFailure::InvalidRequest`] if the payload cannot be
    /// serialized.
    pub fn build_request(
        &self,
        chunk: &Chunk,
        api_key: &SecretString,
    ) -> Result<TransportRequest, TransportFailure> {
        let expression = search_expression(&chunk.identifiers);
        let body = serde_json::to_vec(&SearchByPartBody {
            request: SearchByPartRequest {
                mouser_part_number: &expression,
                part_search_options: self.search_option,
            },
        })
        .map_err(|e| TransportFailure::invalid_request(format!("cannot encode payload: {e}")))?;

        let mut url = self.search_url.clone();
        url.query_pairs_mut()
            .append_pair("apiKey", api_key.expose_secret());

        Ok(TransportRequest {
            method: HttpMethod::Post,
            url: url.into(),
            body: Bytes::from(body),
            headers: default_headers(),
        })
    }
}

/// Join trimmed identifiers into one search expression.
#[must_use]
pub fn search_expression(identifiers: &[String]) -> String {
    identifiers
        .iter()
        .map(|id| id.trim())
        .collect::<Vec<_>>()
        .join(PART_SEPARATOR)
}

fn default_headers() -> Vec<(String, String)> {
    vec![
        ("accept".to_owned(), "application/json".to_owned()),
        ("content-type".to_owned(), "application/json".to_owned()),
    ]
}

fn classify(body: &[u8]) -> ChunkOutcome {
    match decode(body) {
        Ok(decoded) if !decoded.errors.is_empty() => ChunkOutcome::ServiceError(decoded.errors),
        Ok(decoded) => ChunkOutcome::Success(decoded.records),
        Err(e) => ChunkOutcome::TransportFailure(TransportFailure::decode(e.to_string())),
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct RecordingTransport {
        response: Result<Bytes, TransportFailure>,
        seen: Mutex<Vec<TransportRequest>>,
    }

    impl RecordingTransport {
        fn new(response: Result<Bytes, TransportFailure>) -> Arc<Self> {
            Arc::new(Self {
                response,
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl LookupTransport for RecordingTransport {
        async fn send(&self, request: TransportRequest) -> Result<Bytes, TransportFailure> {
            self.seen.lock().unwrap().push(request);
            self.response.clone()
        }
    }

    fn executor(transport: Arc<RecordingTransport>, option: PartSearchOption) -> ChunkExecutor {
        let routes = ServiceRoutes::new("https://api.mouser.com/api", "v1").unwrap();
        ChunkExecutor::new(transport, &routes, option)
    }

    fn chunk(ids: &[&str]) -> Chunk {
        Chunk {
            index: 0,
            start: 0,
            identifiers: ids.iter().map(|s| (*s).to_owned()).collect(),
        }
    }

    fn key() -> SecretString {
        SecretString::from("test-key".to_owned())
    }

    #[test]
    fn test_search_expression_trims_and_joins() {
        let ids = vec![" 595-LM358P ".to_owned(), "\t511-L7805CV".to_owned()];
        assert_eq!(search_expression(&ids), "595-LM358P|511-L7805CV");
    }

    #[test]
    fn test_request_shape() {
        let transport = RecordingTransport::new(Ok(Bytes::new()));
        let request = executor(transport, PartSearchOption::Exact)
            .build_request(&chunk(&["A1", " B2"]), &key())
            .unwrap();

        assert_eq!(request.method, HttpMethod::Post);
        assert_eq!(
            request.url,
            "https://api.mouser.com/api/v1/search/partnumber?apiKey=test-key"
        );
        let body: serde_json::Value = serde_json::from_slice(&request.body).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "SearchByPartRequest": {"mouserPartNumber": "A1|B2", "partSearchOptions": "Exact"}
            })
        );
        assert!(
            request
                .headers
                .contains(&("accept".to_owned(), "application/json".to_owned()))
        );
        assert!(
            request
                .headers
                .contains(&("content-type".to_owned(), "application/json".to_owned()))
        );
    }

    #[test]
    fn test_default_option_is_empty_string() {
        let transport = RecordingTransport::new(Ok(Bytes::new()));
        let request = executor(transport, PartSearchOption::None)
            .build_request(&chunk(&["A1"]), &key())
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&request.body).unwrap();
        assert_eq!(body["SearchByPartRequest"]["partSearchOptions"], "");
    }

    #[test]
    fn test_api_key_is_url_encoded() {
        let transport = RecordingTransport::new(Ok(Bytes::new()));
        let request = executor(transport, PartSearchOption::None)
            .build_request(&chunk(&["A1"]), &SecretString::from("a b&c".to_owned()))
            .unwrap();
        assert!(request.url.ends_with("?apiKey=a+b%26c"));
    }

    #[tokio::test]
    async fn test_success_outcome() {
        let transport = RecordingTransport::new(Ok(Bytes::from_static(
            br#"{"Errors":[],"SearchResults":{"Parts":[{"MouserPartNumber":"A1"}]}}"#,
        )));
        let outcome = executor(transport.clone(), PartSearchOption::None)
            .execute(&chunk(&["A1"]), &key())
            .await;
        let ChunkOutcome::Success(records) = outcome else {
            panic!("expected a successful chunk");
        };
        assert_eq!(records[0].part_number, "A1");
        assert_eq!(transport.seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_service_errors_discard_records() {
        let transport = RecordingTransport::new(Ok(Bytes::from_static(
            br#"{"Errors":["Invalid key"],"SearchResults":{"Parts":[{"MouserPartNumber":"A1"}]}}"#,
        )));
        let outcome = executor(transport, PartSearchOption::None)
            .execute(&chunk(&["A1"]), &key())
            .await;
        assert_eq!(
            outcome,
            ChunkOutcome::ServiceError(vec!["Invalid key".to_owned()])
        );
    }

    #[tokio::test]
    async fn test_malformed_body_is_a_decode_failure() {
        let transport = RecordingTransport::new(Ok(Bytes::from_static(b"<html>busy</html>")));
        let outcome = executor(transport, PartSearchOption::None)
            .execute(&chunk(&["A1"]), &key())
            .await;
        assert!(matches!(
            outcome,
            ChunkOutcome::TransportFailure(TransportFailure::Decode { .. })
        ));
    }

    #[tokio::test]
    async fn test_transport_failure_is_passed_through() {
        let transport = RecordingTransport::new(Err(TransportFailure::connect("refused")));
        let outcome = executor(transport, PartSearchOption::None)
            .execute(&chunk(&["A1"]), &key())
            .await;
        assert_eq!(
            outcome,
            ChunkOutcome::TransportFailure(TransportFailure::connect("refused"))
        );
    }
}
