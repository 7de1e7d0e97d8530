//! musing — background thinker with an insight memory
//!
//! Usage:
//!   musing                                  → start the thinker, read commands from stdin
//!   musing --config ~/.musing/musing.toml   → use a specific config
//!   musing --thinker python3 -- thinker.py  → override the thinker command
//!   musing --dump-config                    → print the default config and exit
//!
//! Commands (one per line): think, insights, threshold, stats, status,
//! clear, start, stop, quit. Every reply is a single JSON line.

mod console;

use clap::Parser;
use console::Outcome;
use musing_bridge::{BridgeConfig, InsightManager};
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(
    name = "musing",
    about = "Background thinker with a ranked, self-aggregating insight memory",
    version = env!("CARGO_PKG_VERSION")
)]
struct Cli {
    /// Path to config file (TOML). Default: ~/.musing/musing.toml
    #[arg(long)]
    config: Option<String>,

    /// Dump the effective config as TOML and exit
    #[arg(long, default_value_t = false)]
    dump_config: bool,

    /// Thinker program, overriding the config
    #[arg(long)]
    thinker: Option<String>,

    /// Arguments for the thinker program
    #[arg(last = true)]
    thinker_args: Vec<String>,

    /// Also write daily log files into this directory
    #[arg(long)]
    log_dir: Option<String>,

    /// Don't start the thinker until asked
    #[arg(long, default_value_t = false)]
    no_start: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_path = cli
        .config
        .as_deref()
        .map(expand_tilde)
        .unwrap_or_else(|| expand_tilde("~/.musing/musing.toml"));
    let mut config = BridgeConfig::load(&config_path);
    if let Some(program) = &cli.thinker {
        config.thinker.program = program.clone();
        config.thinker.args = cli.thinker_args.clone();
    }

    if cli.dump_config {
        print!("{}", config.to_toml());
        return Ok(());
    }

    let _guard = init_tracing(cli.log_dir.as_deref());

    let mut manager = InsightManager::new(config)?;
    if !cli.no_start {
        if let Err(e) = manager.start().await {
            tracing::error!("Thinker failed to start: {}", e);
        }
    }

    run_console(&mut manager).await?;
    manager.stop().await;
    Ok(())
}

/// Stderr logging, plus a daily rolling file when `log_dir` is set.
/// The returned guard flushes the file writer on drop.
fn init_tracing(log_dir: Option<&str>) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "musing=info,musing_bridge=info,musing_memory=info".into());

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(expand_tilde(dir), "musing.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();
    guard
}

async fn run_console(manager: &mut InsightManager) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                let command = match console::parse(&line) {
                    Ok(Some(command)) => command,
                    Ok(None) => continue,
                    Err(message) => {
                        println!("{}", serde_json::json!({ "error": message.trim_end() }));
                        continue;
                    }
                };
                match console::execute(manager, command).await {
                    Outcome::Reply(reply) => println!("{}", reply),
                    Outcome::Quit => break,
                }
            }
            _ = manager.process_next_event() => {}
        }
    }
    Ok(())
}

fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home).join(stripped);
        }
    }
    PathBuf::from(path)
}
