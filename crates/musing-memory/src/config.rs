//! Memory limits and retention knobs.

use musing_core::{Error, Result, MAX_SIGNIFICANCE, MIN_SIGNIFICANCE};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// Maximum records kept after pruning.
    pub capacity: usize,
    /// Consumed records older than this are dropped (unless highly significant).
    pub max_age_secs: u64,
    /// Records at or above this significance survive age-based pruning.
    pub retain_significance: u8,
    /// Minimum significance for retrieval when the caller gives none.
    pub default_threshold: u8,
    /// Result count when the caller gives none.
    pub default_limit: usize,
    /// A returned representative whose similar count exceeds this is evicted.
    pub evict_similar_count: u32,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            capacity: 100,
            max_age_secs: 24 * 60 * 60,
            retain_significance: 8,
            default_threshold: 5,
            default_limit: 10,
            evict_similar_count: 3,
        }
    }
}

impl MemoryConfig {
    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(Error::Config("memory.capacity must be at least 1".into()));
        }
        for (name, value) in [
            ("memory.retain_significance", self.retain_significance),
            ("memory.default_threshold", self.default_threshold),
        ] {
            if !(MIN_SIGNIFICANCE..=MAX_SIGNIFICANCE).contains(&value) {
                return Err(Error::Config(format!(
                    "{} must be between {} and {}, got {}",
                    name, MIN_SIGNIFICANCE, MAX_SIGNIFICANCE, value
                )));
            }
        }
        Ok(())
    }

    pub fn max_age(&self) -> chrono::Duration {
        // a century is "forever" and keeps chrono clear of its range limits
        chrono::Duration::seconds(self.max_age_secs.min(100 * 365 * 24 * 60 * 60) as i64)
    }
}
