//! Tests for musing-core: insight types, thinker protocol, errors

use chrono::{TimeZone, Utc};
use musing_core::*;
use serde_json::json;

fn at(secs: i64) -> chrono::DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
}

// ===========================================================================
// InsightKind
// ===========================================================================

#[test]
fn insight_kind_parses_case_insensitively() {
    assert_eq!("Pattern".parse::<InsightKind>().unwrap(), InsightKind::Pattern);
    assert_eq!(" question ".parse::<InsightKind>().unwrap(), InsightKind::Question);
    assert!("opinion".parse::<InsightKind>().is_err());
}

#[test]
fn insight_kind_from_wire_falls_back_to_general() {
    assert_eq!(InsightKind::from_wire("connection"), InsightKind::Connection);
    assert_eq!(InsightKind::from_wire("mystery"), InsightKind::General);
    assert_eq!(InsightKind::from_wire(""), InsightKind::General);
}

#[test]
fn insight_kind_serializes_lowercase() {
    for kind in InsightKind::ALL {
        let json = serde_json::to_string(&kind).unwrap();
        assert_eq!(json, format!("\"{}\"", kind.as_str()));
    }
}

// ===========================================================================
// Significance
// ===========================================================================

#[test]
fn significance_defaults_when_absent_or_invalid() {
    assert_eq!(significance_from_json(None), 5);
    assert_eq!(significance_from_json(Some(&json!("high"))), 5);
    assert_eq!(significance_from_json(Some(&json!(0))), 5);
    assert_eq!(significance_from_json(Some(&json!(11))), 5);
    assert_eq!(significance_from_json(Some(&json!(7.5))), 5);
    assert_eq!(significance_from_json(Some(&json!(null))), 5);
}

#[test]
fn significance_passes_valid_integers() {
    assert_eq!(significance_from_json(Some(&json!(1))), 1);
    assert_eq!(significance_from_json(Some(&json!(10))), 10);
}

#[test]
fn significance_accepts_integer_strings() {
    assert_eq!(significance_from_json(Some(&json!("9"))), 9);
    assert_eq!(significance_from_json(Some(&json!(" 7 "))), 7);
    assert_eq!(significance_from_json(Some(&json!("12"))), 5);
    assert_eq!(significance_from_json(Some(&json!("7.5"))), 5);
    assert_eq!(significance_from_json(Some(&json!(""))), 5);
}

#[test]
fn clamp_significance_bounds() {
    assert_eq!(clamp_significance(-3), 1);
    assert_eq!(clamp_significance(8), 8);
    assert_eq!(clamp_significance(99), 10);
}

// ===========================================================================
// InsightRecord
// ===========================================================================

#[test]
fn new_record_is_unconsumed_and_plain() {
    let r = InsightRecord::new("a", InsightKind::Pattern, "text", 7, at(0));
    assert!(!r.consumed);
    assert!(!r.is_aggregated());
    assert!(r.member_ids.is_none());
    assert!(r.answers_to("a"));
    assert!(!r.answers_to("b"));
}

#[test]
fn absorb_tracks_members_and_max_significance() {
    let mut rep = InsightRecord::new("a", InsightKind::Pattern, "x", 4, at(0));
    let b = InsightRecord::new("b", InsightKind::Pattern, "x", 6, at(1));
    let c = InsightRecord::new("c", InsightKind::General, "x", 2, at(2));

    rep.absorb(&b);
    assert_eq!(rep.similar_count, Some(2));
    assert_eq!(rep.member_ids.as_deref(), Some(&["a".to_string(), "b".to_string()][..]));
    assert_eq!(rep.significance, 6);

    rep.absorb(&c);
    assert_eq!(rep.similar_count, Some(3));
    assert_eq!(rep.significance, 6);
    assert!(rep.answers_to("c"));
    assert_eq!(rep.kind, InsightKind::Pattern);
}

#[test]
fn record_serializes_camel_case_and_skips_empty_aggregation() {
    let r = InsightRecord::new("a", InsightKind::Question, "why?", 5, at(0));
    let v = serde_json::to_value(&r).unwrap();
    assert!(v.get("createdAt").is_some());
    assert!(v.get("similarCount").is_none());
    assert!(v.get("memberIds").is_none());
    assert_eq!(v["kind"], "question");
}

// ===========================================================================
// ThinkerCommand
// ===========================================================================

#[test]
fn add_thought_wire_shape() {
    let cmd = ThinkerCommand::add_thought(InsightKind::Connection, "link these", 7, "t-1");
    let line = cmd.to_line().unwrap();
    assert!(line.ends_with('\n'));
    assert_eq!(line.matches('\n').count(), 1);
    let v: serde_json::Value = serde_json::from_str(line.trim()).unwrap();
    assert_eq!(
        v,
        json!({
            "action": "add_thought",
            "thought_type": "connection",
            "content": "link these",
            "priority": 7,
            "thought_id": "t-1"
        })
    );
}

#[test]
fn status_and_stop_wire_shape() {
    assert_eq!(ThinkerCommand::Status.to_line().unwrap(), "{\"action\":\"status\"}\n");
    assert_eq!(ThinkerCommand::Stop.to_line().unwrap(), "{\"action\":\"stop\"}\n");
    assert_eq!(ThinkerCommand::Stop.action(), "stop");
}

#[test]
fn multiline_content_stays_on_one_line() {
    let cmd = ThinkerCommand::add_thought(InsightKind::General, "one\ntwo", 5, "t");
    let line = cmd.to_line().unwrap();
    assert_eq!(line.matches('\n').count(), 1);
}

// ===========================================================================
// ThinkerMessage
// ===========================================================================

#[test]
fn message_with_insight_builds_record() {
    let msg = ThinkerMessage::parse(
        r#"{"has_insight":true,"thought_id":"t-9","thought_type":"pattern","insight":"users return on mondays","significance":8}"#,
    )
    .unwrap();
    let r = msg.to_record(at(5)).unwrap();
    assert_eq!(r.id, "t-9");
    assert_eq!(r.kind, InsightKind::Pattern);
    assert_eq!(r.content, "users return on mondays");
    assert_eq!(r.significance, 8);
    assert_eq!(r.created_at, at(5));
    assert!(!r.consumed);
}

#[test]
fn message_without_insight_flag_is_not_a_record() {
    let msg = ThinkerMessage::parse(r#"{"has_insight":false,"thought_id":"t-1"}"#).unwrap();
    assert_eq!(msg.thought_id(), Some("t-1"));
    assert!(msg.to_record(at(0)).is_none());
}

#[test]
fn malformed_lines_are_dropped() {
    assert!(ThinkerMessage::parse("").is_none());
    assert!(ThinkerMessage::parse("   ").is_none());
    assert!(ThinkerMessage::parse("thinking...").is_none());
    assert!(ThinkerMessage::parse(r#"{"insight":"no flag"}"#).is_none());
    assert!(ThinkerMessage::parse(r#"{"has_insight":"yes"}"#).is_none());
}

#[test]
fn message_missing_id_or_text_is_not_a_record() {
    let no_id = ThinkerMessage::parse(r#"{"has_insight":true,"insight":"x"}"#).unwrap();
    assert!(no_id.to_record(at(0)).is_none());
    let empty_text =
        ThinkerMessage::parse(r#"{"has_insight":true,"thought_id":"t","insight":"  "}"#).unwrap();
    assert!(empty_text.to_record(at(0)).is_none());
}

#[test]
fn message_reads_string_significance() {
    let msg = ThinkerMessage::parse(
        r#"{"has_insight":true,"thought_id":"t","insight":"x","thought_type":"question","significance":"9"}"#,
    )
    .unwrap();
    let r = msg.to_record(at(0)).unwrap();
    assert_eq!(r.kind, InsightKind::Question);
    assert_eq!(r.significance, 9);
}

#[test]
fn message_defaults_kind_and_significance() {
    let msg = ThinkerMessage::parse(
        r#"{"has_insight":true,"thought_id":"t","insight":"x","thought_type":"musing","significance":"very"}"#,
    )
    .unwrap();
    let r = msg.to_record(at(0)).unwrap();
    assert_eq!(r.kind, InsightKind::General);
    assert_eq!(r.significance, 5);
}

// ===========================================================================
// Error
// ===========================================================================

#[test]
fn error_display_and_classification() {
    let e = Error::not_running("send thought");
    assert_eq!(e.to_string(), "thinker not running: cannot send thought");
    assert!(e.is_precondition());

    let e = Error::spawn("thinker", std::io::Error::new(std::io::ErrorKind::NotFound, "nope"));
    assert!(e.to_string().contains("thinker"));
    assert!(!e.is_precondition());

    let e: Error = std::io::Error::new(std::io::ErrorKind::Other, "disk").into();
    assert!(matches!(e, Error::Io(_)));
}

#[test]
fn absorb_aggregated_record_keeps_its_provenance() {
    let mut rep = InsightRecord::new("a", InsightKind::Pattern, "x", 3, at(0));
    let mut other = InsightRecord::new("b", InsightKind::Pattern, "x", 5, at(1));
    other.absorb(&InsightRecord::new("c", InsightKind::Pattern, "x", 9, at(2)));

    rep.absorb(&other);
    assert_eq!(rep.similar_count, Some(3));
    assert_eq!(
        rep.member_ids.as_deref(),
        Some(&["a".to_string(), "b".to_string(), "c".to_string()][..])
    );
    assert_eq!(rep.significance, 9);
}
