//! Part lookup data model.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use bytes::Bytes;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{LookupError, TransportFailure};

/// Maximum number of identifiers the search service accepts in one call.
pub const MAX_PER_CALL: usize = 10;

/// Maximum number of identifiers submitted for one batch.
pub const MAX_TOTAL: usize = 300;

// ---------------------------------------------------------------------------
// Service records
// ---------------------------------------------------------------------------

/// One part record returned by the search service.
///
/// The service payload carries many more fields than are modelled here;
/// anything not named explicitly is kept in `attributes`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoundRecord {
    /// Vendor part number the record was found under. Used for matching.
    #[serde(rename = "MouserPartNumber")]
    pub part_number: String,

    #[serde(
        rename = "ManufacturerPartNumber",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub manufacturer_part_number: Option<String>,

    #[serde(rename = "Manufacturer", default, skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,

    #[serde(rename = "Description", default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Remaining service fields, passed through unchanged.
    #[serde(flatten)]
    pub attributes: serde_json::Map<String, serde_json::Value>,
}

impl FoundRecord {
    /// Build a record carrying only a part number.
    #[must_use]
    pub fn new(part_number: impl Into<String>) -> Self {
        Self {
            part_number: part_number.into(),
            manufacturer_part_number: None,
            manufacturer: None,
            description: None,
            attributes: serde_json::Map::new(),
        }
    }
}

/// Match mode sent with every part search.
///
/// Parsed from configuration by name (`none`, `exact`, `begins_with`) or by
/// the service's numeric code (1, 2, 3). Serialized as the wire value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PartSearchOption {
    /// No option; the service applies its default matching.
    #[default]
    None,
    Exact,
    BeginsWith,
}

impl PartSearchOption {
    /// Value placed in the `partSearchOptions` request field.
    #[must_use]
    pub fn wire_value(self) -> &'static str {
        match self {
            Self::None => "",
            Self::Exact => "Exact",
            Self::BeginsWith => "BeginsWith",
        }
    }

    /// Map the service's numeric option code.
    ///
    /// # Errors
    /// Returns [`LookupError::Configuration`] for unknown codes.
    pub fn from_code(code: u64) -> Result<Self, LookupError> {
        match code {
            1 => Ok(Self::None),
            2 => Ok(Self::Exact),
            3 => Ok(Self::BeginsWith),
            other => Err(LookupError::configuration(format!(
                "unknown part search option code {other}"
            ))),
        }
    }
}

impl fmt::Display for PartSearchOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::None => "none",
            Self::Exact => "exact",
            Self::BeginsWith => "begins_with",
        })
    }
}

impl FromStr for PartSearchOption {
    type Err = LookupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['_', '-'], "");
        match normalized.as_str() {
            "" | "none" => Ok(Self::None),
            "exact" => Ok(Self::Exact),
            "beginswith" => Ok(Self::BeginsWith),
            other => match other.parse::<u64>() {
                Ok(code) => Self::from_code(code),
                Err(_) => Err(LookupError::configuration(format!(
                    "unknown part search option '{s}'"
                ))),
            },
        }
    }
}

impl Serialize for PartSearchOption {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.wire_value())
    }
}

impl<'de> Deserialize<'de> for PartSearchOption {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Code(u64),
            Name(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Code(code) => Self::from_code(code).map_err(serde::de::Error::custom),
            Raw::Name(name) => name.parse().map_err(serde::de::Error::custom),
        }
    }
}

// ---------------------------------------------------------------------------
// Transport request
// ---------------------------------------------------------------------------

/// HTTP method for a transport request. The search API takes POST only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Post,
}

impl HttpMethod {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Post => "POST",
        }
    }
}

/// One outgoing call handed to a [`LookupTransport`](crate::LookupTransport).
///
/// `url` carries the API key in its query string. The `Debug` output strips
/// the query so requests can be logged safely.
#[derive(Clone)]
pub struct TransportRequest {
    pub method: HttpMethod,
    pub url: String,
    pub body: Bytes,
    pub headers: Vec<(String, String)>,
}

impl TransportRequest {
    /// The request URL without its query string.
    #[must_use]
    pub fn redacted_url(&self) -> &str {
        self.url
            .split_once('?')
            .map_or(self.url.as_str(), |(path, _)| path)
    }
}

impl fmt::Debug for TransportRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportRequest")
            .field("method", &self.method.as_str())
            .field("url", &self.redacted_url())
            .field("body_len", &self.body.len())
            .field("headers", &self.headers)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Chunk outcomes
// ---------------------------------------------------------------------------

/// Result of executing one chunk.
#[derive(Debug, Clone, PartialEq)]
pub enum ChunkOutcome {
    /// The service answered without errors.
    Success(Vec<FoundRecord>),
    /// The service answered with one or more error messages.
    ServiceError(Vec<String>),
    /// No usable response was received.
    TransportFailure(TransportFailure),
}

impl ChunkOutcome {
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

/// Reported status of one chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ChunkStatus {
    Succeeded { records: usize },
    ServiceError { messages: Vec<String> },
    TransportFailure { cause: TransportFailure },
    /// The chunk was never sent because the batch was cancelled.
    Skipped,
}

/// What happened to one chunk of a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChunkReport {
    /// Zero-based chunk position.
    pub index: usize,
    /// Position of the chunk's first identifier within the submitted list.
    pub start: usize,
    /// Identifiers as submitted, in order.
    pub identifiers: Vec<String>,
    #[serde(flatten)]
    pub status: ChunkStatus,
}

impl ChunkReport {
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self.status, ChunkStatus::Succeeded { .. })
    }

    /// Submitted-list positions covered by this chunk.
    #[must_use]
    pub fn positions(&self) -> std::ops::Range<usize> {
        self.start..self.start + self.identifiers.len()
    }
}

fn collect_service_errors(chunks: &[ChunkReport]) -> Vec<&str> {
    chunks
        .iter()
        .filter_map(|c| match &c.status {
            ChunkStatus::ServiceError { messages } => Some(messages),
            _ => None,
        })
        .flatten()
        .map(String::as_str)
        .collect()
}

fn collect_transport_failures(chunks: &[ChunkReport]) -> Vec<(usize, &TransportFailure)> {
    chunks
        .iter()
        .filter_map(|c| match &c.status {
            ChunkStatus::TransportFailure { cause } => Some((c.index, cause)),
            _ => None,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Batch results
// ---------------------------------------------------------------------------

/// Records of a batch lookup over plain identifiers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchResult {
    /// Records of all successful chunks, in chunk order.
    pub records: Vec<FoundRecord>,
    pub chunks: Vec<ChunkReport>,
    /// Identifiers dropped because the batch exceeded the total limit.
    pub excluded: Vec<String>,
    /// True when cancellation stopped the batch before every chunk ran.
    pub cancelled: bool,
    /// True when every chunk succeeded and none were skipped.
    pub all_succeeded: bool,
}

impl BatchResult {
    /// All service error messages, in chunk order.
    #[must_use]
    pub fn service_errors(&self) -> Vec<&str> {
        collect_service_errors(&self.chunks)
    }

    /// Transport failures with their chunk index.
    #[must_use]
    pub fn transport_failures(&self) -> Vec<(usize, &TransportFailure)> {
        collect_transport_failures(&self.chunks)
    }
}

/// Lookup status of one entity.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EntityStatus {
    /// A returned record matched the entity's identifier.
    Matched { record: Arc<FoundRecord> },
    /// The entity was searched and no record matched.
    Unmatched,
    /// The entity was past the total limit or its chunk was skipped.
    NotSearched,
    /// The entity's chunk failed and no record matched it.
    SearchFailed { chunk: usize },
}

/// One entity with its identifier and lookup status.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityOutcome<E> {
    pub entity: E,
    /// Identifier as extracted from the entity.
    pub identifier: String,
    #[serde(flatten)]
    pub status: EntityStatus,
}

/// Per-entity reconciliation of a batch run.
///
/// Entities appear in submission order. Every submitted entity appears
/// exactly once.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchReport<E> {
    pub entities: Vec<EntityOutcome<E>>,
    pub chunks: Vec<ChunkReport>,
    /// Returned records whose part number matched no searched entity.
    pub unclaimed_records: Vec<FoundRecord>,
    /// True when cancellation stopped the batch before every chunk ran.
    pub cancelled: bool,
    /// True when every chunk succeeded and every searched entity matched.
    pub all_succeeded: bool,
}

impl<E> BatchReport<E> {
    /// Matched entities with their record.
    pub fn matched(&self) -> impl Iterator<Item = (&E, &FoundRecord)> {
        self.entities.iter().filter_map(|o| match &o.status {
            EntityStatus::Matched { record } => Some((&o.entity, record.as_ref())),
            _ => None,
        })
    }

    /// Searched entities that no record matched.
    pub fn unmatched(&self) -> impl Iterator<Item = &E> {
        self.filter_status(|s| matches!(s, EntityStatus::Unmatched))
    }

    /// Entities that were never submitted to the service.
    pub fn not_searched(&self) -> impl Iterator<Item = &E> {
        self.filter_status(|s| matches!(s, EntityStatus::NotSearched))
    }

    /// Entities whose chunk failed, with the failed chunk index.
    pub fn search_failed(&self) -> impl Iterator<Item = (&E, usize)> {
        self.entities.iter().filter_map(|o| match o.status {
            EntityStatus::SearchFailed { chunk } => Some((&o.entity, chunk)),
            _ => None,
        })
    }

    /// All service error messages, in chunk order.
    #[must_use]
    pub fn service_errors(&self) -> Vec<&str> {
        collect_service_errors(&self.chunks)
    }

    /// Transport failures with their chunk index.
    #[must_use]
    pub fn transport_failures(&self) -> Vec<(usize, &TransportFailure)> {
        collect_transport_failures(&self.chunks)
    }

    fn filter_status(&self, pred: impl Fn(&EntityStatus) -> bool) -> impl Iterator<Item = &E> {
        self.entities
            .iter()
            .filter(move |o| pred(&o.status))
            .map(|o| &o.entity)
    }
}
