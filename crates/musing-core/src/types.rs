//! Core types for Musing

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lowest and highest significance a producer may assign.
pub const MIN_SIGNIFICANCE: u8 = 1;
pub const MAX_SIGNIFICANCE: u8 = 10;

/// Significance used when the producer sends none, or sends garbage.
pub const DEFAULT_SIGNIFICANCE: u8 = 5;

/// What sort of insight (or thought) a record is.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum InsightKind {
    Pattern,
    Connection,
    Question,
    #[default]
    General,
}

impl InsightKind {
    pub const ALL: [InsightKind; 4] = [
        InsightKind::Pattern,
        InsightKind::Connection,
        InsightKind::Question,
        InsightKind::General,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pattern => "pattern",
            Self::Connection => "connection",
            Self::Question => "question",
            Self::General => "general",
        }
    }

    /// Parse a kind coming off the wire. Anything unrecognised is `General`.
    pub fn from_wire(s: &str) -> Self {
        s.parse().unwrap_or_default()
    }
}

impl fmt::Display for InsightKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InsightKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pattern" => Ok(Self::Pattern),
            "connection" => Ok(Self::Connection),
            "question" => Ok(Self::Question),
            "general" => Ok(Self::General),
            other => Err(format!("unknown insight kind: {}", other)),
        }
    }
}

/// Clamp a significance value into 1..=10.
pub fn clamp_significance(value: i64) -> u8 {
    value.clamp(MIN_SIGNIFICANCE as i64, MAX_SIGNIFICANCE as i64) as u8
}

/// Read a significance from loosely-typed JSON.
/// Integers in 1..=10 pass through, as do strings holding one (`"9"`);
/// everything else becomes the default.
pub fn significance_from_json(value: Option<&serde_json::Value>) -> u8 {
    value
        .and_then(|v| v.as_i64().or_else(|| v.as_str().and_then(|s| s.trim().parse().ok())))
        .filter(|n| (MIN_SIGNIFICANCE as i64..=MAX_SIGNIFICANCE as i64).contains(n))
        .map(|n| n as u8)
        .unwrap_or(DEFAULT_SIGNIFICANCE)
}

/// One insight held by the store.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InsightRecord {
    pub id: String,
    pub kind: InsightKind,
    pub content: String,
    pub significance: u8,
    /// When the store first observed the record, not when the producer made it.
    pub created_at: DateTime<Utc>,
    pub consumed: bool,
    /// Present only on aggregated representatives; counts the representative itself.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similar_count: Option<u32>,
    /// Ids absorbed into this representative, its own id first.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member_ids: Option<Vec<String>>,
}

impl InsightRecord {
    pub fn new(
        id: impl Into<String>,
        kind: InsightKind,
        content: impl Into<String>,
        significance: u8,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            content: content.into(),
            significance: significance.clamp(MIN_SIGNIFICANCE, MAX_SIGNIFICANCE),
            created_at,
            consumed: false,
            similar_count: None,
            member_ids: None,
        }
    }

    pub fn is_aggregated(&self) -> bool {
        self.similar_count.is_some()
    }

    /// True if `id` is this record's own id or one it absorbed.
    pub fn answers_to(&self, id: &str) -> bool {
        self.id == id
            || self
                .member_ids
                .as_ref()
                .is_some_and(|ids| ids.iter().any(|m| m == id))
    }

    /// Absorb `other` into this record: bump the count, remember its id, keep the higher significance.
    /// An already-aggregated `other` hands over its whole member list and count.
    pub fn absorb(&mut self, other: &InsightRecord) {
        let count = self.similar_count.get_or_insert(1);
        *count += other.similar_count.unwrap_or(1);
        let own_id = self.id.clone();
        let members = self.member_ids.get_or_insert_with(|| vec![own_id]);
        match &other.member_ids {
            Some(ids) => members.extend(ids.iter().cloned()),
            None => members.push(other.id.clone()),
        }
        self.significance = self.significance.max(other.significance);
    }
}

/// Snapshot of the store's occupancy.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MemoryStats {
    pub total: usize,
    pub unused: usize,
    pub high_significance: usize,
    pub aggregated_count: usize,
    pub limit: usize,
    pub threshold: u8,
    pub usage_percent: f64,
}

/// Locally cached view of the thinker subprocess.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BridgeStatus {
    pub running: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,
    pub queue_size: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_content: Option<String>,
}
