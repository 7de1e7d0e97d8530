//! Fold near-duplicate unconsumed insights into representatives.
//!
//! Unconsumed records are visited in store order. Each one merges into the
//! FIRST representative it is similar to (first match, not best match), or
//! becomes a representative itself. Consumed records never take part and are
//! appended after the representatives unchanged.

use crate::similarity::similar;
use musing_core::InsightRecord;
use tracing::debug;

/// Result of one aggregation pass.
#[derive(Debug)]
pub struct Aggregated {
    /// Representatives in first-seen order, followed by consumed records.
    pub records: Vec<InsightRecord>,
    /// How many records were absorbed into a representative.
    pub merged: usize,
}

pub fn aggregate(records: Vec<InsightRecord>) -> Aggregated {
    let (consumed, fresh): (Vec<_>, Vec<_>) = records.into_iter().partition(|r| r.consumed);

    let mut representatives: Vec<InsightRecord> = Vec::with_capacity(fresh.len());
    let mut merged = 0;

    for candidate in fresh {
        match representatives
            .iter_mut()
            .find(|rep| similar(&candidate.content, &rep.content))
        {
            Some(rep) => {
                debug!(
                    "aggregating insight {} into {} ({} similar)",
                    candidate.id,
                    rep.id,
                    rep.similar_count.unwrap_or(1) + candidate.similar_count.unwrap_or(1)
                );
                rep.absorb(&candidate);
                merged += 1;
            }
            None => representatives.push(candidate),
        }
    }

    representatives.extend(consumed);
    Aggregated {
        records: representatives,
        merged,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use musing_core::InsightKind;

    fn rec(id: &str, content: &str, significance: u8) -> InsightRecord {
        InsightRecord::new(id, InsightKind::Pattern, content, significance, Utc::now())
    }

    #[test]
    fn first_match_wins_over_better_match() {
        let out = aggregate(vec![
            rec("a", "red green blue", 5),
            rec("b", "cyan magenta yellow black", 5),
            // 2 of 3 against "a" (0.67), 4 of 4 against "b"; "a" is scanned first
            rec("c", "red green cyan magenta yellow black", 7),
        ]);
        assert_eq!(out.records.len(), 2);
        assert_eq!(out.merged, 1);
        assert_eq!(out.records[0].id, "a");
        assert_eq!(out.records[0].similar_count, Some(2));
        assert_eq!(out.records[0].significance, 7);
        assert_eq!(out.records[1].id, "b");
        assert!(!out.records[1].is_aggregated());
    }

    #[test]
    fn chain_of_similar_records_collapses_into_one() {
        let out = aggregate(vec![
            rec("a", "alpha beta gamma delta", 5),
            rec("b", "alpha beta gamma epsilon zeta", 5),
            rec("c", "alpha beta gamma epsilon zeta", 5),
        ]);
        assert_eq!(out.records.len(), 1);
        assert_eq!(out.merged, 2);
        assert_eq!(out.records[0].similar_count, Some(3));
        assert_eq!(
            out.records[0].member_ids.as_deref(),
            Some(&["a".to_string(), "b".to_string(), "c".to_string()][..])
        );
    }

    #[test]
    fn consumed_records_are_untouched_and_trail() {
        let mut old = rec("old", "user likes dark mode UI", 9);
        old.consumed = true;
        let out = aggregate(vec![
            old.clone(),
            rec("new", "user prefers dark UI mode", 4),
        ]);
        assert_eq!(out.merged, 0);
        assert_eq!(out.records.len(), 2);
        assert_eq!(out.records[0].id, "new");
        assert_eq!(out.records[1], old);
    }

    #[test]
    fn empty_input_is_empty_output() {
        let out = aggregate(Vec::new());
        assert!(out.records.is_empty());
        assert_eq!(out.merged, 0);
    }
}
