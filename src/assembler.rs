//! Dataset Assembly
//!
//! Combines the per-source batches produced by the normalizer into one flat
//! dataset and applies the caller's filters.
//!
//! ## Merge Rules
//!
//! - **Source Order**: batches are concatenated in the order the sources were
//!   configured, and records keep their order within a batch
//! - **Unique Ids**: ids are `{date}-{brand}-{row}` per source, so two sources
//!   can produce the same id. A repeated id gets a `-s{sourceIndex}` suffix;
//!   no record is dropped by the merge
//! - **No Content Dedup**: sources are assumed disjoint by account and brand
//!
//! ## Filters
//!
//! - `brand` - exact brand match
//! - `from` / `to` - inclusive date bounds, either may be omitted

use crate::models::{AdRecord, AdsQuery};
use crate::normalizer::NormalizedBatch;
use std::collections::HashSet;
use tracing::debug;

pub struct DatasetAssembler;

impl DatasetAssembler {
    pub fn merge(batches: Vec<NormalizedBatch>) -> Vec<AdRecord> {
        let capacity = batches.iter().map(|b| b.records.len()).sum();
        let mut seen: HashSet<String> = HashSet::with_capacity(capacity);
        let mut merged = Vec::with_capacity(capacity);
        let mut renamed = 0usize;

        for (source_index, batch) in batches.into_iter().enumerate() {
            for mut record in batch.records {
                if seen.contains(&record.id) {
                    let base = format!("{}-s{}", record.id, source_index);
                    let mut candidate = base.clone();
                    let mut attempt = 1;
                    while seen.contains(&candidate) {
                        candidate = format!("{}-{}", base, attempt);
                        attempt += 1;
                    }
                    record.id = candidate;
                    renamed += 1;
                }
                seen.insert(record.id.clone());
                merged.push(record);
            }
        }

        if renamed > 0 {
            debug!(renamed, total = merged.len(), "Disambiguated colliding record ids");
        }
        merged
    }

    pub fn matches(record: &AdRecord, query: &AdsQuery) -> bool {
        if query.brand.is_some_and(|brand| brand != record.brand) {
            return false;
        }
        if query.from.is_some_and(|from| record.date < from) {
            return false;
        }
        if query.to.is_some_and(|to| record.date > to) {
            return false;
        }
        true
    }

    pub fn filter(records: &[AdRecord], query: &AdsQuery) -> Vec<AdRecord> {
        records
            .iter()
            .filter(|record| Self::matches(record, query))
            .cloned()
            .collect()
    }
}
