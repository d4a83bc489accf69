//! Batch orchestration: chunking, execution and reconciliation.

use std::sync::Arc;

use futures::StreamExt;
use part_lookup_sdk::{
    ApiKeyProvider, BatchReport, BatchResult, ChunkOutcome, ChunkReport, ChunkStatus,
    FoundRecord, LookupError, LookupTransport, MAX_PER_CALL, MAX_TOTAL, PartSearchOption,
};
use secrecy::{ExposeSecret, SecretString};
use tokio_util::sync::CancellationToken;
use tracing::instrument;

use super::chunker::{ChunkPlan, chunk};
use super::executor::ChunkExecutor;
use super::matching::reconcile;
use super::routes::ServiceRoutes;

/// Upper bound for chunks in flight at once.
pub const MAX_CONCURRENT_CHUNKS: usize = 8;

/// Limits and search mode of a [`PartLookupService`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LookupOptions {
    pub max_per_call: usize,
    pub max_total: usize,
    /// Chunks in flight at once; 1 runs chunks one after another.
    pub max_concurrent_chunks: usize,
    pub search_option: PartSearchOption,
}

impl Default for LookupOptions {
    fn default() -> Self {
        Self {
            max_per_call: MAX_PER_CALL,
            max_total: MAX_TOTAL,
            max_concurrent_chunks: 1,
            search_option: PartSearchOption::None,
        }
    }
}

impl LookupOptions {
    /// Check the limits against the service caps.
    ///
    /// # Errors
    /// Returns [`LookupError::Configuration`] for a limit outside its range.
    pub fn validate(&self) -> Result<(), LookupError> {
        check_range("max_per_call", self.max_per_call, MAX_PER_CALL)?;
        check_range("max_total", self.max_total, MAX_TOTAL)?;
        check_range(
            "max_concurrent_chunks",
            self.max_concurrent_chunks,
            MAX_CONCURRENT_CHUNKS,
        )
    }
}

fn check_range(name: &str, value: usize, max: usize) -> Result<(), LookupError> {
    if (1..=max).contains(&value) {
        Ok(())
    } else {
        Err(LookupError::configuration(format!(
            "{name} must be between 1 and {max}, got {value}"
        )))
    }
}

/// Chunk reports and records of one executed batch.
struct ExecutedBatch {
    records: Vec<FoundRecord>,
    chunks: Vec<ChunkReport>,
    excluded: Vec<String>,
    cancelled: bool,
}

impl ExecutedBatch {
    fn all_chunks_succeeded(&self) -> bool {
        self.chunks.iter().all(ChunkReport::is_success)
    }
}

/// Looks up part numbers in batches and reconciles the results.
///
/// Chunk failures never abort a batch; they are recorded per chunk and
/// surface as `SearchFailed` entities in the report.
#[derive(Clone)]
pub struct PartLookupService {
    executor: ChunkExecutor,
    keys: Arc<dyn ApiKeyProvider>,
    options: LookupOptions,
}

impl PartLookupService {
    /// Create a service.
    ///
    /// # Errors
    /// Returns [`LookupError::Configuration`] if `options` are out of range.
    pub fn new(
        transport: Arc<dyn LookupTransport>,
        keys: Arc<dyn ApiKeyProvider>,
        routes: &ServiceRoutes,
        options: LookupOptions,
    ) -> Result<Self, LookupError> {
        options.validate()?;
        Ok(Self {
            executor: ChunkExecutor::new(transport, routes, options.search_option),
            keys,
            options,
        })
    }

    /// Look up every entity and reconcile the returned records.
    ///
    /// `identifier_of` yields the part number of an entity. Entities keep
    /// their submission order in the report.
    ///
    /// # Errors
    /// Returns [`LookupError`] before any network call when the limits are
    /// invalid or no API key is available.
    pub async fn run<E, F>(
        &self,
        entities: impl IntoIterator<Item = E>,
        identifier_of: F,
    ) -> Result<BatchReport<E>, LookupError>
    where
        F: Fn(&E) -> String,
    {
        self.run_with_cancellation(entities, identifier_of, &CancellationToken::new())
            .await
    }

    /// [`run`](Self::run) that stops issuing chunks once `cancel` fires.
    ///
    /// Chunks already in flight complete; chunks not yet started are
    /// skipped and their entities reported as not searched.
    ///
    /// # Errors
    /// Same as [`run`](Self::run).
    #[instrument(skip_all)]
    pub async fn run_with_cancellation<E, F>(
        &self,
        entities: impl IntoIterator<Item = E>,
        identifier_of: F,
        cancel: &CancellationToken,
    ) -> Result<BatchReport<E>, LookupError>
    where
        F: Fn(&E) -> String,
    {
        let identified: Vec<(E, String)> = entities
            .into_iter()
            .map(|entity| {
                let identifier = identifier_of(&entity);
                (entity, identifier)
            })
            .collect();
        let identifiers = identified.iter().map(|(_, id)| id.clone()).collect();

        let batch = self.execute_batch(identifiers, cancel).await?;
        let all_chunks_succeeded = batch.all_chunks_succeeded();
        let reconciled = reconcile(identified, &batch.chunks, batch.records);
        let all_succeeded =
            all_chunks_succeeded && !batch.cancelled && reconciled.all_searched_matched();

        Ok(BatchReport {
            entities: reconciled.entities,
            chunks: batch.chunks,
            unclaimed_records: reconciled.unclaimed_records,
            cancelled: batch.cancelled,
            all_succeeded,
        })
    }

    /// Look up plain identifiers without entity matching.
    ///
    /// # Errors
    /// Same as [`run`](Self::run).
    pub async fn lookup(
        &self,
        identifiers: impl IntoIterator<Item = String>,
    ) -> Result<BatchResult, LookupError> {
        self.lookup_with_cancellation(identifiers, &CancellationToken::new())
            .await
    }

    /// [`lookup`](Self::lookup) that stops issuing chunks once `cancel` fires.
    ///
    /// # Errors
    /// Same as [`run`](Self::run).
    #[instrument(skip_all)]
    pub async fn lookup_with_cancellation(
        &self,
        identifiers: impl IntoIterator<Item = String>,
        cancel: &CancellationToken,
    ) -> Result<BatchResult, LookupError> {
        let batch = self
            .execute_batch(identifiers.into_iter().collect(), cancel)
            .await?;
        let all_succeeded = batch.all_chunks_succeeded() && !batch.cancelled;
        Ok(BatchResult {
            records: batch.records,
            chunks: batch.chunks,
            excluded: batch.excluded,
            cancelled: batch.cancelled,
            all_succeeded,
        })
    }

    fn resolve_api_key(&self) -> Result<SecretString, LookupError> {
        self.keys
            .search_api_key()
            .filter(|key| !key.expose_secret().trim().is_empty())
            .ok_or_else(|| LookupError::missing_api_key(self.keys.describe()))
    }

    async fn execute_batch(
        &self,
        identifiers: Vec<String>,
        cancel: &CancellationToken,
    ) -> Result<ExecutedBatch, LookupError> {
        let submitted = identifiers.len();
        let ChunkPlan { chunks, excluded } =
            chunk(identifiers, self.options.max_per_call, self.options.max_total)?;
        let api_key = self.resolve_api_key()?;

        if !excluded.is_empty() {
            tracing::warn!(
                submitted,
                excluded = excluded.len(),
                max_total = self.options.max_total,
                "identifiers beyond the batch limit are not searched"
            );
        }
        tracing::info!(
            submitted,
            chunks = chunks.len(),
            concurrency = self.options.max_concurrent_chunks,
            "starting part lookup"
        );

        let outcomes: Vec<Option<ChunkOutcome>> = futures::stream::iter(chunks.iter().map(|c| {
            let api_key = &api_key;
            async move {
                if cancel.is_cancelled() {
                    tracing::debug!(chunk = c.index, "batch cancelled, chunk skipped");
                    return None;
                }
                Some(self.executor.execute(c, api_key).await)
            }
        }))
        .buffered(self.options.max_concurrent_chunks)
        .collect()
        .await;

        let mut records = Vec::new();
        let mut reports = Vec::with_capacity(chunks.len());
        for (c, outcome) in chunks.into_iter().zip(outcomes) {
            let status = match outcome {
                None => ChunkStatus::Skipped,
                Some(ChunkOutcome::Success(found)) => {
                    let count = found.len();
                    records.extend(found);
                    ChunkStatus::Succeeded { records: count }
                }
                Some(ChunkOutcome::ServiceError(messages)) => ChunkStatus::ServiceError { messages },
                Some(ChunkOutcome::TransportFailure(cause)) => {
                    ChunkStatus::TransportFailure { cause }
                }
            };
            reports.push(ChunkReport {
                index: c.index,
                start: c.start,
                identifiers: c.identifiers,
                status,
            });
        }

        let cancelled = reports
            .iter()
            .any(|r| matches!(r.status, ChunkStatus::Skipped));
        let failed = reports
            .iter()
            .filter(|r| !r.is_success() && !matches!(r.status, ChunkStatus::Skipped))
            .count();
        tracing::info!(
            chunks = reports.len(),
            failed,
            cancelled,
            records = records.len(),
            "part lookup finished"
        );

        Ok(ExecutedBatch {
            records,
            chunks: reports,
            excluded,
            cancelled,
        })
    }
}
