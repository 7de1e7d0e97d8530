//! Retrieval ranking: filter, order, slice, consume.

use musing_core::{InsightKind, InsightRecord};
use std::cmp::Ordering;
use tracing::debug;

/// What a caller asks for. `None` fields fall back to the store's defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetrievalQuery {
    pub kind: Option<InsightKind>,
    pub limit: Option<usize>,
    pub min_significance: Option<u8>,
}

impl RetrievalQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn kind(mut self, kind: InsightKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn min_significance(mut self, min: u8) -> Self {
        self.min_significance = Some(min);
        self
    }
}

/// Three-level order, earlier levels dominate:
/// 1. both aggregated → higher similar count first
/// 2. higher significance first
/// 3. newer first
pub fn compare(a: &InsightRecord, b: &InsightRecord) -> Ordering {
    if let (Some(ca), Some(cb)) = (a.similar_count, b.similar_count) {
        if ca != cb {
            return cb.cmp(&ca);
        }
    }
    b.significance
        .cmp(&a.significance)
        .then_with(|| b.created_at.cmp(&a.created_at))
}

/// Stable insertion sort by [`compare`].
///
/// `compare` is not transitive once aggregated and plain records mix, so this
/// avoids library sorts that may reject such comparators. Same input, same output.
pub fn rank(records: &mut [&InsightRecord]) {
    for i in 1..records.len() {
        let mut j = i;
        while j > 0 && compare(records[j - 1], records[j]) == Ordering::Greater {
            records.swap(j - 1, j);
            j -= 1;
        }
    }
}

/// Select, mark, and evict. `records` is the store's working set after pruning
/// and aggregation. Returned records are copies with `consumed` already set.
pub fn retrieve(
    records: &mut Vec<InsightRecord>,
    kind: Option<InsightKind>,
    limit: usize,
    min_significance: u8,
    evict_similar_count: u32,
) -> Vec<InsightRecord> {
    let mut candidates: Vec<&InsightRecord> = records
        .iter()
        .filter(|r| !r.consumed && r.significance >= min_significance)
        .filter(|r| kind.map_or(true, |k| r.kind == k))
        .collect();
    rank(&mut candidates);
    let selected: Vec<String> = candidates
        .into_iter()
        .take(limit)
        .map(|r| r.id.clone())
        .collect();

    let mut results = Vec::with_capacity(selected.len());
    for id in &selected {
        if let Some(record) = records.iter_mut().find(|r| &r.id == id) {
            record.consumed = true;
            results.push(record.clone());
        }
    }

    records.retain(|r| {
        let exhausted = r.similar_count.is_some_and(|c| c > evict_similar_count)
            && selected.contains(&r.id);
        if exhausted {
            debug!(
                "evicting exhausted insight {} ({} similar)",
                r.id,
                r.similar_count.unwrap_or(0)
            );
        }
        !exhausted
    });

    results
}
