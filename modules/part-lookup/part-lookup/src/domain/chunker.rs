//! Splitting of identifier lists into service-sized chunks.

use part_lookup_sdk::LookupError;

/// An ordered group of identifiers submitted in one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Zero-based chunk position.
    pub index: usize,
    /// Position of the first identifier in the submitted list.
    pub start: usize,
    pub identifiers: Vec<String>,
}

impl Chunk {
    #[must_use]
    pub fn len(&self) -> usize {
        self.identifiers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.identifiers.is_empty()
    }
}

/// Chunks to submit plus the identifiers cut off by the total limit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChunkPlan {
    pub chunks: Vec<Chunk>,
    pub excluded: Vec<String>,
}

impl ChunkPlan {
    /// Number of identifiers that will be submitted.
    #[must_use]
    pub fn searched_len(&self) -> usize {
        self.chunks.iter().map(Chunk::len).sum()
    }
}

/// Split `identifiers` into chunks of at most `max_per_chunk`.
///
/// Only the first `max_total` identifiers are chunked; the rest are returned
/// in `excluded`. Order is preserved and identifiers are not modified.
///
/// # Errors
/// Returns [`LookupError::Configuration`] when either limit is zero.
pub fn chunk(
    mut identifiers: Vec<String>,
    max_per_chunk: usize,
    max_total: usize,
) -> Result<ChunkPlan, LookupError> {
    if max_per_chunk == 0 {
        return Err(LookupError::configuration(
            "max_per_chunk must be at least 1",
        ));
    }
    if max_total == 0 {
        return Err(LookupError::configuration("max_total must be at least 1"));
    }

    let excluded = if identifiers.len() > max_total {
        identifiers.split_off(max_total)
    } else {
        Vec::new()
    };

    let mut chunks = Vec::with_capacity(identifiers.len().div_ceil(max_per_chunk));
    let mut start = 0;
    let mut rest = identifiers.into_iter().peekable();
    while rest.peek().is_some() {
        let group: Vec<String> = rest.by_ref().take(max_per_chunk).collect();
        let len = group.len();
        chunks.push(Chunk {
            index: chunks.len(),
            start,
            identifiers: group,
        });
        start += len;
    }

    Ok(ChunkPlan { chunks, excluded })
}
