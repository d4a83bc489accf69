//! Reconciliation of returned records with the caller's entities.

use std::collections::HashMap;
use std::sync::Arc;

use part_lookup_sdk::{ChunkReport, ChunkStatus, EntityOutcome, EntityStatus, FoundRecord};

/// Matching key of an identifier: surrounding whitespace removed, ASCII
/// letters upper-cased.
#[must_use]
pub fn normalize(identifier: &str) -> String {
    identifier.trim().to_ascii_uppercase()
}

/// Entities with their final status, plus records nobody claimed.
#[derive(Debug)]
pub struct Reconciled<E> {
    pub entities: Vec<EntityOutcome<E>>,
    pub unclaimed_records: Vec<FoundRecord>,
}

impl<E> Reconciled<E> {
    /// True when every entity that was sent to the service got a record.
    #[must_use]
    pub fn all_searched_matched(&self) -> bool {
        self.entities.iter().all(|o| {
            matches!(
                o.status,
                EntityStatus::Matched { .. } | EntityStatus::NotSearched
            )
        })
    }
}

/// Attach records to entities.
///
/// `identified[i]` is the entity at submitted position `i` with its
/// identifier. An entity is searched when a non-skipped chunk covers its
/// position. Each record is attached to every searched entity with an equal
/// normalized identifier; the first matching record wins. Searched entities
/// left without a record are `SearchFailed` when their chunk failed, else
/// `Unmatched`.
pub fn reconcile<E>(
    identified: Vec<(E, String)>,
    chunks: &[ChunkReport],
    records: Vec<FoundRecord>,
) -> Reconciled<E> {
    let mut chunk_of: Vec<Option<&ChunkReport>> = vec![None; identified.len()];
    for report in chunks {
        if matches!(report.status, ChunkStatus::Skipped) {
            continue;
        }
        for pos in report.positions() {
            if let Some(slot) = chunk_of.get_mut(pos) {
                *slot = Some(report);
            }
        }
    }

    let mut by_key: HashMap<String, Vec<usize>> = HashMap::new();
    for (pos, (_, identifier)) in identified.iter().enumerate() {
        if chunk_of[pos].is_some() {
            by_key.entry(normalize(identifier)).or_default().push(pos);
        }
    }

    let mut matched: Vec<Option<Arc<FoundRecord>>> = vec![None; identified.len()];
    let mut unclaimed_records = Vec::new();
    for record in records {
        let Some(positions) = by_key.get(&normalize(&record.part_number)) else {
            tracing::debug!(
                part_number = %record.part_number,
                "returned record matches no searched entity"
            );
            unclaimed_records.push(record);
            continue;
        };
        let record = Arc::new(record);
        for &pos in positions {
            if matched[pos].is_none() {
                matched[pos] = Some(Arc::clone(&record));
            }
        }
    }

    let entities = identified
        .into_iter()
        .zip(matched)
        .zip(chunk_of)
        .map(|(((entity, identifier), record), chunk)| {
            let status = match (record, chunk) {
                (Some(record), _) => EntityStatus::Matched { record },
                (None, None) => EntityStatus::NotSearched,
                (None, Some(report)) if report.is_success() => EntityStatus::Unmatched,
                (None, Some(report)) => EntityStatus::SearchFailed {
                    chunk: report.index,
                },
            };
            EntityOutcome {
                entity,
                identifier,
                status,
            }
        })
        .collect();

    Reconciled {
        entities,
        unclaimed_records,
    }
}
