//! Collaborator traits consumed by the part-lookup module.

use async_trait::async_trait;
use bytes::Bytes;
use secrecy::SecretString;

use crate::error::TransportFailure;
use crate::models::TransportRequest;

/// Performs exactly one network call.
///
/// Implementations own connection pooling, TLS and timeouts. A call that
/// does not finish in time must return [`TransportFailure::Timeout`].
/// Non-2xx statuses are failures, not bodies.
///
/// ```ignore
/// let body = transport.send(request).await?;
/// ```
#[async_trait]
pub trait LookupTransport: Send + Sync {
    /// Send the request and return the raw response body.
    ///
    /// # Errors
    /// Returns a [`TransportFailure`] describing why no usable body was received.
    async fn send(&self, request: TransportRequest) -> Result<Bytes, TransportFailure>;
}

/// Supplies the search API key.
///
/// Injected into the lookup service at construction; the key is resolved
/// once per batch, before any network activity.
pub trait ApiKeyProvider: Send + Sync {
    /// Current search API key, or `None` when no key is available.
    fn search_api_key(&self) -> Option<SecretString>;

    /// Human readable description of where the key comes from.
    ///
    /// Used in error messages; must never contain the key itself.
    fn describe(&self) -> String;
}
