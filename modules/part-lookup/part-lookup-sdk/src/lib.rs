#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Part Lookup SDK
//!
//! This crate provides the public contract of the part-lookup module.
//!
//! ## Collaborator traits
//!
//! - `LookupTransport` - performs one network call for one chunk
//! - `ApiKeyProvider` - supplies the search API key
//!
//! ## Report types
//!
//! - `BatchReport` - per-entity reconciliation of a batch run
//! - `BatchResult` - raw records of a batch lookup without entity matching
//! - `ChunkReport` - what happened to each submitted chunk
//!
//! ## Usage
//!
//! ```ignore
//! use part_lookup::PartLookupService;
//!
//! let report = service
//!     .run(line_items, |item| item.vendor_part_no.clone())
//!     .await?;
//!
//! for (item, record) in report.matched() {
//!     println!("{} -> {:?}", item.id, record.description);
//! }
//! ```

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]

pub mod api;
pub mod error;
pub mod models;

pub use api::{ApiKeyProvider, LookupTransport};
pub use error::{LookupError, TransportFailure};
pub use models::{
    BatchReport, BatchResult, ChunkOutcome, ChunkReport, ChunkStatus, EntityOutcome,
    EntityStatus, FoundRecord, HttpMethod, MAX_PER_CALL, MAX_TOTAL, PartSearchOption,
    TransportRequest,
};

// Re-exported so implementors of `ApiKeyProvider` need no direct dependency.
pub use secrecy::{ExposeSecret, SecretString};
