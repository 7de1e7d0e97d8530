//! InsightStore: the bounded set of insights, keyed by id.
//!
//! Records keep arrival order (aggregation depends on it) until a capacity
//! eviction re-sorts them by significance. Ids, including ids absorbed into
//! aggregated representatives, are unique across the store.

use crate::aggregate::aggregate;
use crate::config::MemoryConfig;
use crate::ranker::{self, RetrievalQuery};
use chrono::{DateTime, Utc};
use musing_core::{clamp_significance, InsightRecord, MemoryStats};
use tracing::{debug, info};

pub struct InsightStore {
    records: Vec<InsightRecord>,
    config: MemoryConfig,
    threshold: u8,
}

impl Default for InsightStore {
    fn default() -> Self {
        Self::new(MemoryConfig::default())
    }
}

impl InsightStore {
    pub fn new(config: MemoryConfig) -> Self {
        let threshold = clamp_significance(config.default_threshold as i64);
        Self {
            records: Vec::new(),
            config,
            threshold,
        }
    }

    pub fn config(&self) -> &MemoryConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in store order.
    pub fn records(&self) -> &[InsightRecord] {
        &self.records
    }

    /// Find a record by its own id or by an id it absorbed.
    pub fn get(&self, id: &str) -> Option<&InsightRecord> {
        self.records.iter().find(|r| r.answers_to(id))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Default minimum significance for retrieval.
    pub fn threshold(&self) -> u8 {
        self.threshold
    }

    /// Set the default minimum significance, clamped to 1..=10. Returns the value applied.
    pub fn set_threshold(&mut self, threshold: i64) -> u8 {
        self.threshold = clamp_significance(threshold);
        info!("Insight threshold set to {}", self.threshold);
        self.threshold
    }

    /// Append a newly observed record. A record whose id is already known is
    /// dropped. A full store evicts its least significant record, which may be
    /// the new one. Returns whether the record is held afterwards.
    pub fn ingest(&mut self, record: InsightRecord) -> bool {
        if self.contains(&record.id) {
            debug!("ignoring duplicate insight {}", record.id);
            return false;
        }
        debug!(
            "ingested {} insight {} (significance {})",
            record.kind, record.id, record.significance
        );
        let id = record.id.clone();
        self.records.push(record);
        if self.enforce_capacity() == 0 {
            return true;
        }
        let kept = self.records.iter().any(|r| r.id == id);
        debug!("store at capacity, evicted on ingest (new record kept: {})", kept);
        kept
    }

    /// Evict the least significant records until the store fits its capacity.
    fn enforce_capacity(&mut self) -> usize {
        let capacity = self.config.capacity;
        if self.records.len() <= capacity {
            return 0;
        }
        let before = self.records.len();
        // stable: equal significance keeps arrival order
        self.records.sort_by(|a, b| b.significance.cmp(&a.significance));
        self.records.truncate(capacity);
        before - self.records.len()
    }

    /// Drop consumed, low-significance records older than the age ceiling,
    /// then evict the least significant down to capacity. Returns how many went.
    pub fn prune(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.records.len();
        let max_age = self.config.max_age();
        let retain = self.config.retain_significance;

        self.records.retain(|r| {
            let expired = now.signed_duration_since(r.created_at) > max_age;
            !(expired && r.consumed && r.significance < retain)
        });

        self.enforce_capacity();

        let removed = before - self.records.len();
        if removed > 0 {
            debug!("pruned {} insights, {} remain", removed, self.records.len());
        }
        removed
    }

    /// Fold near-duplicate unconsumed records together. Returns how many were absorbed.
    pub fn aggregate(&mut self) -> usize {
        let result = aggregate(std::mem::take(&mut self.records));
        self.records = result.records;
        result.merged
    }

    /// Full retrieval pass at `now`: prune, aggregate, then rank and consume.
    pub fn retrieve_at(&mut self, query: &RetrievalQuery, now: DateTime<Utc>) -> Vec<InsightRecord> {
        self.prune(now);
        self.aggregate();

        let limit = query.limit.unwrap_or(self.config.default_limit);
        let min_significance = query.min_significance.unwrap_or(self.threshold);
        let results = ranker::retrieve(
            &mut self.records,
            query.kind,
            limit,
            min_significance,
            self.config.evict_similar_count,
        );
        debug!(
            "retrieved {} insights (kind {:?}, min significance {}), {} remain",
            results.len(),
            query.kind,
            min_significance,
            self.records.len()
        );
        results
    }

    pub fn retrieve(&mut self, query: &RetrievalQuery) -> Vec<InsightRecord> {
        self.retrieve_at(query, Utc::now())
    }

    pub fn stats(&self) -> MemoryStats {
        let total = self.records.len();
        let limit = self.config.capacity;
        MemoryStats {
            total,
            unused: self.records.iter().filter(|r| !r.consumed).count(),
            high_significance: self
                .records
                .iter()
                .filter(|r| r.significance >= self.config.retain_significance)
                .count(),
            aggregated_count: self.records.iter().filter(|r| r.is_aggregated()).count(),
            limit,
            threshold: self.threshold,
            usage_percent: if limit == 0 {
                0.0
            } else {
                total as f64 / limit as f64 * 100.0
            },
        }
    }
}
