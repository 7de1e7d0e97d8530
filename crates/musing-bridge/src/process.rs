//! Thinker subprocess handle
//!
//! Spawns the thinker with piped stdio. A reader task turns stdout into
//! `ThinkerEvent`s on an unbounded channel; a second task forwards stderr
//! into the log. The handle exclusively owns the child: dropping it kills
//! the process, `shutdown()` asks politely first.

use crate::config::ThinkerConfig;
use musing_core::{Error, Result, ThinkerCommand};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Something the thinker did, queued for the manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThinkerEvent {
    /// One line from stdout, newline stripped.
    Line(String),
    /// Stdout reached EOF; the process has exited or closed its output.
    Closed,
}

pub struct ThinkerProcess {
    child: Child,
    stdin: ChildStdin,
    pid: Option<u32>,
    cancel: CancellationToken,
    reader: JoinHandle<()>,
    stderr: JoinHandle<()>,
}

impl ThinkerProcess {
    /// Spawn the thinker. Returns the handle and the receiving end of its event queue.
    pub fn spawn(config: &ThinkerConfig) -> Result<(Self, mpsc::UnboundedReceiver<ThinkerEvent>)> {
        let mut command = Command::new(&config.program);
        command
            .args(&config.args)
            .envs(&config.env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &config.working_dir {
            command.current_dir(dir);
        }

        let mut child = command
            .spawn()
            .map_err(|e| Error::spawn(&config.program, e))?;
        let pid = child.id();

        let missing = |pipe: &str| {
            Error::spawn(
                &config.program,
                std::io::Error::other(format!("{} pipe not captured", pipe)),
            )
        };
        let stdin = child.stdin.take().ok_or_else(|| missing("stdin"))?;
        let stdout = child.stdout.take().ok_or_else(|| missing("stdout"))?;
        let stderr_pipe = child.stderr.take().ok_or_else(|| missing("stderr"))?;

        let (tx, rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        let reader_cancel = cancel.clone();
        let reader = tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            loop {
                tokio::select! {
                    _ = reader_cancel.cancelled() => break,
                    line = lines.next_line() => match line {
                        Ok(Some(line)) => {
                            if tx.send(ThinkerEvent::Line(line)).is_err() {
                                break;
                            }
                        }
                        Ok(None) => {
                            let _ = tx.send(ThinkerEvent::Closed);
                            break;
                        }
                        Err(e) => {
                            warn!("thinker stdout read failed: {}", e);
                            let _ = tx.send(ThinkerEvent::Closed);
                            break;
                        }
                    }
                }
            }
        });

        let stderr_cancel = cancel.clone();
        let stderr = tokio::spawn(async move {
            let mut lines = BufReader::new(stderr_pipe).lines();
            loop {
                tokio::select! {
                    _ = stderr_cancel.cancelled() => break,
                    line = lines.next_line() => match line {
                        Ok(Some(line)) => debug!(pid = ?pid, "thinker: {}", line),
                        _ => break,
                    }
                }
            }
        });

        info!("Thinker spawned: {} (pid {:?})", config.program, pid);

        Ok((
            Self {
                child,
                stdin,
                pid,
                cancel,
                reader,
                stderr,
            },
            rx,
        ))
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Write one command line to the thinker's stdin. No reply is awaited.
    pub async fn send(&mut self, command: &ThinkerCommand) -> Result<()> {
        let line = command.to_line()?;
        self.stdin.write_all(line.as_bytes()).await?;
        self.stdin.flush().await?;
        debug!("sent {} to thinker", command.action());
        Ok(())
    }

    /// Exit status if the process has already exited.
    pub fn try_exit_code(&mut self) -> Option<i32> {
        match self.child.try_wait() {
            Ok(Some(status)) => status.code(),
            _ => None,
        }
    }

    /// Send `stop`, then kill. Output not yet read is discarded.
    pub async fn shutdown(mut self) {
        if let Err(e) = self.send(&ThinkerCommand::Stop).await {
            debug!("stop command not delivered: {}", e);
        }
        self.cancel.cancel();
        if let Err(e) = self.child.kill().await {
            debug!("thinker kill: {}", e);
        }
        self.reader.abort();
        self.stderr.abort();
        info!("Thinker stopped (pid {:?})", self.pid);
    }
}
