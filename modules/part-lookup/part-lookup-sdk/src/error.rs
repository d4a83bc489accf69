//! Part lookup error types.

use serde::Serialize;
use thiserror::Error;

/// Errors that fail a whole batch before any network activity.
///
/// Per-chunk problems never surface here; they are recorded in the
/// [`ChunkReport`](crate::ChunkReport)s of the returned report.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    /// Invalid limits, URLs or concurrency settings.
    #[error("invalid configuration: {message}")]
    Configuration { message: String },

    /// The API key provider returned no usable key.
    #[error("search API key is not available ({provider})")]
    MissingApiKey { provider: String },
}

impl LookupError {
    /// Create a configuration error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a missing API key error.
    #[must_use]
    pub fn missing_api_key(provider: impl Into<String>) -> Self {
        Self::MissingApiKey {
            provider: provider.into(),
        }
    }
}

/// Why a chunk call produced no usable response.
///
/// Messages never include the API key or the request query string.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TransportFailure {
    /// The call did not complete within the transport timeout.
    #[error("request timed out after {after_ms} ms")]
    Timeout { after_ms: u64 },

    /// Network or connection level failure.
    #[error("connection failed: {message}")]
    Connect { message: String },

    /// The service answered with a non-2xx status.
    #[error("HTTP {status}: {body_preview}")]
    HttpStatus { status: u16, body_preview: String },

    /// The response body exceeded the transport size limit.
    #[error("response body exceeded {limit} bytes")]
    BodyTooLarge { limit: usize },

    /// The request could not be built (bad URL, header, or scheme).
    #[error("invalid request: {message}")]
    InvalidRequest { message: String },

    /// The body was received but could not be decoded.
    #[error("malformed response: {message}")]
    Decode { message: String },

    /// Any other transport failure.
    #[error("transport failure: {message}")]
    Other { message: String },
}

impl TransportFailure {
    /// Create a connection failure.
    #[must_use]
    pub fn connect(message: impl Into<String>) -> Self {
        Self::Connect {
            message: message.into(),
        }
    }

    /// Create a decode failure.
    #[must_use]
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Create an invalid request failure.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Create an unclassified failure.
    #[must_use]
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    /// Short stable label for logs and metrics.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Timeout { .. } => "timeout",
            Self::Connect { .. } => "connect",
            Self::HttpStatus { .. } => "http_status",
            Self::BodyTooLarge { .. } => "body_too_large",
            Self::InvalidRequest { .. } => "invalid_request",
            Self::Decode { .. } => "decode",
            Self::Other { .. } => "other",
        }
    }
}
