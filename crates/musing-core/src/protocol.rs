//! Thinker protocol: one JSON object per line over the subprocess pipes
//!
//! Bridge → thinker (stdin):
//!   { "action": "add_thought", "thought_type": "pattern", "content": "...", "priority": 5, "thought_id": "..." }
//!   { "action": "status" }
//!   { "action": "stop" }
//!
//! Thinker → bridge (stdout):
//!   { "has_insight": true, "thought_id": "...", "thought_type": "pattern", "insight": "...", "significance": 7 }
//!
//! Lines that fail to parse or carry no `has_insight` are ignored.

use crate::types::{significance_from_json, InsightKind, InsightRecord};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

// ---------------------------------------------------------------------------
// Bridge → thinker
// ---------------------------------------------------------------------------

/// A command written to the thinker's stdin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ThinkerCommand {
    AddThought {
        thought_type: InsightKind,
        content: String,
        priority: u8,
        thought_id: String,
    },
    Status,
    Stop,
}

impl ThinkerCommand {
    pub fn add_thought(
        kind: InsightKind,
        content: impl Into<String>,
        priority: u8,
        thought_id: impl Into<String>,
    ) -> Self {
        Self::AddThought {
            thought_type: kind,
            content: content.into(),
            priority,
            thought_id: thought_id.into(),
        }
    }

    /// Wire name of the action, for logs and errors.
    pub fn action(&self) -> &'static str {
        match self {
            Self::AddThought { .. } => "add_thought",
            Self::Status => "status",
            Self::Stop => "stop",
        }
    }

    /// Serialize to a single line, newline included.
    pub fn to_line(&self) -> serde_json::Result<String> {
        let mut line = serde_json::to_string(self)?;
        line.push('\n');
        Ok(line)
    }
}

// ---------------------------------------------------------------------------
// Thinker → bridge
// ---------------------------------------------------------------------------

/// A message read from the thinker's stdout.
#[derive(Debug, Clone, Deserialize)]
pub struct ThinkerMessage {
    pub has_insight: bool,
    #[serde(default)]
    pub thought_id: Option<String>,
    #[serde(default)]
    pub thought_type: Option<String>,
    #[serde(default)]
    pub insight: Option<String>,
    #[serde(default)]
    pub significance: Option<serde_json::Value>,
}

impl ThinkerMessage {
    /// Parse one raw stdout line. Malformed lines yield `None`.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        match serde_json::from_str::<Self>(line) {
            Ok(msg) => Some(msg),
            Err(e) => {
                debug!("ignoring thinker line ({}): {}", e, truncate(line, 120));
                None
            }
        }
    }

    /// The thought this message answers, if it names one.
    pub fn thought_id(&self) -> Option<&str> {
        self.thought_id.as_deref().filter(|id| !id.is_empty())
    }

    /// Build the insight this message carries, stamped with `observed_at`.
    /// Requires the insight flag, a thought id, and non-empty insight text.
    pub fn to_record(&self, observed_at: DateTime<Utc>) -> Option<InsightRecord> {
        if !self.has_insight {
            return None;
        }
        let id = self.thought_id()?;
        let content = self.insight.as_deref().map(str::trim).filter(|c| !c.is_empty())?;
        let kind = self
            .thought_type
            .as_deref()
            .map(InsightKind::from_wire)
            .unwrap_or_default();
        let significance = significance_from_json(self.significance.as_ref());
        Some(InsightRecord::new(id, kind, content, significance, observed_at))
    }
}

fn truncate(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut idx = max;
    while idx > 0 && !s.is_char_boundary(idx) {
        idx -= 1;
    }
    &s[..idx]
}
