//! Line-oriented console over the insight manager.
//!
//! Each stdin line is parsed as one command; each reply is one JSON line on
//! stdout. Logs go to stderr so stdout stays machine-readable.

use clap::{Parser, Subcommand};
use musing_bridge::InsightManager;
use musing_core::InsightKind;
use musing_memory::RetrievalQuery;
use serde_json::{json, Value};

#[derive(Parser, Debug)]
#[command(no_binary_name = true, disable_version_flag = true, name = "musing")]
struct ConsoleLine {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// Send a thought to the thinker
    Think {
        #[arg(short, long, default_value = "general")]
        kind: InsightKind,
        /// 1-10, defaults to 5
        #[arg(short, long)]
        priority: Option<u8>,
        #[arg(required = true, trailing_var_arg = true)]
        content: Vec<String>,
    },
    /// Retrieve (and consume) the best insights
    Insights {
        #[arg(short, long)]
        kind: Option<InsightKind>,
        #[arg(short, long)]
        limit: Option<usize>,
        #[arg(short, long)]
        min: Option<u8>,
    },
    /// Set the default significance threshold
    Threshold {
        #[arg(allow_negative_numbers = true)]
        value: i64,
    },
    /// Memory statistics
    Stats,
    /// Thinker status
    Status,
    /// Remove all scratch day directories
    Clear,
    /// Start the thinker
    Start,
    /// Stop the thinker
    Stop,
    /// Stop the thinker and exit
    #[command(alias = "exit")]
    Quit,
}

/// Parse one console line. `Ok(None)` for a blank line; `Err` carries the
/// rendered clap message (including help output).
pub fn parse(line: &str) -> Result<Option<Command>, String> {
    let words: Vec<&str> = line.split_whitespace().collect();
    if words.is_empty() {
        return Ok(None);
    }
    ConsoleLine::try_parse_from(words)
        .map(|parsed| Some(parsed.command))
        .map_err(|e| e.render().to_string())
}

pub enum Outcome {
    Reply(Value),
    Quit,
}

/// Run one command against the manager.
pub async fn execute(manager: &mut InsightManager, command: Command) -> Outcome {
    let reply = match command {
        Command::Think {
            kind,
            priority,
            content,
        } => match manager.send_thought(kind, &content.join(" "), priority).await {
            Ok(id) => json!({ "thoughtId": id }),
            Err(e) => error_reply(e),
        },
        Command::Insights { kind, limit, min } => {
            let mut query = RetrievalQuery::new();
            query.kind = kind;
            query.limit = limit;
            query.min_significance = min;
            json!({ "insights": manager.get_insights(&query) })
        }
        Command::Threshold { value } => json!({ "threshold": manager.set_threshold(value) }),
        Command::Stats => json!({ "stats": manager.get_memory_stats() }),
        Command::Status => json!({ "status": manager.get_status().await }),
        Command::Clear => match manager.clear_scratch() {
            Ok(removed) => json!({ "cleared": removed }),
            Err(e) => error_reply(e),
        },
        Command::Start => match manager.start().await {
            Ok(pid) => json!({ "started": true, "pid": pid }),
            Err(e) => error_reply(e),
        },
        Command::Stop => json!({ "stopped": manager.stop().await }),
        Command::Quit => {
            manager.stop().await;
            return Outcome::Quit;
        }
    };
    Outcome::Reply(reply)
}

fn error_reply(e: musing_core::Error) -> Value {
    json!({ "error": e.to_string() })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_line_is_nothing() {
        assert_eq!(parse("   "), Ok(None));
    }

    #[test]
    fn think_joins_content_words() {
        let cmd = parse("think -k pattern -p 7 user likes dark mode").unwrap();
        assert_eq!(
            cmd,
            Some(Command::Think {
                kind: InsightKind::Pattern,
                priority: Some(7),
                content: vec!["user", "likes", "dark", "mode"]
                    .into_iter()
                    .map(String::from)
                    .collect(),
            })
        );
    }

    #[test]
    fn think_defaults_to_general() {
        match parse("think hello there").unwrap() {
            Some(Command::Think { kind, priority, .. }) => {
                assert_eq!(kind, InsightKind::General);
                assert_eq!(priority, None);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn think_needs_content() {
        assert!(parse("think").is_err());
    }

    #[test]
    fn insights_filters() {
        assert_eq!(
            parse("insights --kind question --limit 3 --min 6").unwrap(),
            Some(Command::Insights {
                kind: Some(InsightKind::Question),
                limit: Some(3),
                min: Some(6),
            })
        );
        assert!(parse("insights --kind nonsense").is_err());
    }

    #[test]
    fn threshold_accepts_out_of_range_values() {
        assert_eq!(
            parse("threshold -4").unwrap(),
            Some(Command::Threshold { value: -4 })
        );
        assert_eq!(
            parse("threshold 99").unwrap(),
            Some(Command::Threshold { value: 99 })
        );
    }

    #[test]
    fn exit_is_quit() {
        assert_eq!(parse("exit").unwrap(), Some(Command::Quit));
        assert_eq!(parse("quit").unwrap(), Some(Command::Quit));
    }

    #[test]
    fn unknown_command_is_an_error() {
        assert!(parse("dance").is_err());
    }
}
