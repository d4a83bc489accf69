#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Part Lookup Module Implementation
//!
//! Looks up vendor part numbers against the Mouser search API in batches
//! that respect the service limits, then reconciles the returned records
//! with the caller's entities.
//!
//! The public contract lives in `part-lookup-sdk` and is re-exported here.

pub use part_lookup_sdk::{
    ApiKeyProvider, BatchReport, BatchResult, ChunkOutcome, ChunkReport, ChunkStatus,
    EntityOutcome, EntityStatus, FoundRecord, LookupError, LookupTransport, MAX_PER_CALL,
    MAX_TOTAL, PartSearchOption, TransportFailure, TransportRequest,
};

pub mod config;
pub use config::PartLookupConfig;

pub mod module;
pub use module::{build_service, build_service_with_keys};

pub use domain::routes::ServiceRoutes;
pub use domain::service::{LookupOptions, PartLookupService};
pub use infra::credentials::{EnvApiKeyProvider, StaticApiKeyProvider};
pub use infra::http_transport::HttpLookupTransport;

#[doc(hidden)]
pub mod domain;
#[doc(hidden)]
pub mod infra;
