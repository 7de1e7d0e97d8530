//! InsightManager owns the thinker and the insight store.
//!
//! Construct one per process and hand it to whatever front end drives it.
//! All methods take `&mut self`; queued thinker output is drained before each
//! operation, so every event handler runs to completion before the next
//! ingestion or retrieval begins.

use crate::config::BridgeConfig;
use crate::process::{ThinkerEvent, ThinkerProcess};
use crate::scratch::ScratchDir;
use chrono::Utc;
use musing_core::{
    BridgeStatus, Error, InsightKind, InsightRecord, MemoryStats, Result, ThinkerCommand,
    ThinkerMessage, DEFAULT_SIGNIFICANCE, MAX_SIGNIFICANCE, MIN_SIGNIFICANCE,
};
use musing_memory::{InsightStore, RetrievalQuery};
use std::collections::HashSet;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

pub struct InsightManager {
    config: BridgeConfig,
    store: InsightStore,
    scratch: ScratchDir,
    process: Option<ThinkerProcess>,
    events: Option<mpsc::UnboundedReceiver<ThinkerEvent>>,
    /// Thought ids sent but not yet answered.
    pending: HashSet<String>,
    last_content: Option<String>,
}

impl InsightManager {
    pub fn new(config: BridgeConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            store: InsightStore::new(config.memory.clone()),
            scratch: ScratchDir::new(&config.scratch.dir),
            config,
            process: None,
            events: None,
            pending: HashSet::new(),
            last_content: None,
        })
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn store(&self) -> &InsightStore {
        &self.store
    }

    pub fn scratch(&self) -> &ScratchDir {
        &self.scratch
    }

    pub fn is_running(&self) -> bool {
        self.process.is_some()
    }

    pub fn pid(&self) -> Option<u32> {
        self.process.as_ref().and_then(|p| p.pid())
    }

    /// Thoughts sent but not yet answered.
    pub fn queue_size(&self) -> usize {
        self.pending.len()
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Spawn the thinker and wait out the startup grace period.
    /// On spawn failure the manager stays stopped; retrying is up to the caller.
    pub async fn start(&mut self) -> Result<Option<u32>> {
        self.pump();
        if let Some(process) = &self.process {
            return Err(Error::AlreadyRunning { pid: process.pid() });
        }

        let (process, events) = ThinkerProcess::spawn(&self.config.thinker)?;
        let pid = process.pid();
        self.process = Some(process);
        self.events = Some(events);

        let grace = self.config.thinker.startup_grace();
        if !grace.is_zero() {
            debug!("Waiting {:?} for thinker startup", grace);
            tokio::time::sleep(grace).await;
        }
        info!("Thinker ready (pid {:?})", pid);
        Ok(pid)
    }

    /// Send `stop`, then kill. Lines already queued but not yet handled are
    /// dropped. Returns whether a thinker was running.
    pub async fn stop(&mut self) -> bool {
        self.events = None;
        self.pending.clear();
        match self.process.take() {
            Some(process) => {
                process.shutdown().await;
                true
            }
            None => false,
        }
    }

    // ------------------------------------------------------------------
    // Outbound commands
    // ------------------------------------------------------------------

    /// Submit a thought. Returns the locally generated thought id immediately;
    /// the insight, if any, arrives later on the thinker's output.
    pub async fn send_thought(
        &mut self,
        kind: InsightKind,
        content: &str,
        priority: Option<u8>,
    ) -> Result<String> {
        self.pump();
        let priority = priority
            .unwrap_or(DEFAULT_SIGNIFICANCE)
            .clamp(MIN_SIGNIFICANCE, MAX_SIGNIFICANCE);
        let thought_id = uuid::Uuid::new_v4().to_string();
        let command = ThinkerCommand::add_thought(kind, content, priority, &thought_id);
        self.send_command(&command).await?;

        self.pending.insert(thought_id.clone());
        self.last_content = Some(content.to_string());
        info!("Thought {} sent ({}, priority {})", thought_id, kind, priority);
        Ok(thought_id)
    }

    /// Ask the thinker for its status. Fire-and-forget: nothing waits for a reply.
    pub async fn request_status(&mut self) -> Result<()> {
        self.pump();
        self.send_command(&ThinkerCommand::Status).await
    }

    async fn send_command(&mut self, command: &ThinkerCommand) -> Result<()> {
        let process = self
            .process
            .as_mut()
            .ok_or_else(|| Error::not_running(command.action()))?;
        process.send(command).await
    }

    // ------------------------------------------------------------------
    // Retrieval surface
    // ------------------------------------------------------------------

    /// Prune, aggregate, then return and consume the best matching insights.
    pub fn get_insights(&mut self, query: &RetrievalQuery) -> Vec<InsightRecord> {
        self.pump();
        self.store.retrieve(query)
    }

    /// Set the default minimum significance. Returns the clamped value applied.
    pub fn set_threshold(&mut self, threshold: i64) -> u8 {
        self.store.set_threshold(threshold)
    }

    pub fn get_memory_stats(&mut self) -> MemoryStats {
        self.pump();
        self.store.stats()
    }

    /// Status from local state. When a thinker is running a `status` command
    /// is also sent, but its reply is not waited for.
    pub async fn get_status(&mut self) -> BridgeStatus {
        self.pump();
        if self.process.is_some() {
            if let Err(e) = self.send_command(&ThinkerCommand::Status).await {
                warn!("status request not delivered: {}", e);
            }
        }
        BridgeStatus {
            running: self.process.is_some(),
            pid: self.pid(),
            queue_size: self.queue_size(),
            last_content: self.last_content.clone(),
        }
    }

    /// Remove every day directory under the scratch root. Returns files removed.
    pub fn clear_scratch(&self) -> Result<usize> {
        self.scratch.clear()
    }

    // ------------------------------------------------------------------
    // Inbound events
    // ------------------------------------------------------------------

    /// Handle everything already queued without waiting. Returns events handled.
    pub fn pump(&mut self) -> usize {
        let mut handled = 0;
        loop {
            let Some(events) = self.events.as_mut() else {
                break;
            };
            match events.try_recv() {
                Ok(event) => {
                    self.handle_event(event);
                    handled += 1;
                }
                Err(_) => break,
            }
        }
        handled
    }

    /// Wait for the next thinker event and handle it. Never resolves while no
    /// thinker is running, so it can sit in a `select!` next to other inputs.
    pub async fn process_next_event(&mut self) {
        let event = match self.events.as_mut() {
            Some(events) => events.recv().await,
            None => std::future::pending().await,
        };
        match event {
            Some(event) => self.handle_event(event),
            // reader task ended without a Closed event
            None => self.handle_event(ThinkerEvent::Closed),
        }
    }

    /// Wait up to `timeout` for one event, then drain whatever else is queued.
    /// Returns whether anything was handled.
    pub async fn wait_for_event(&mut self, timeout: Duration) -> bool {
        let waited = tokio::time::timeout(timeout, self.process_next_event())
            .await
            .is_ok();
        let drained = self.pump();
        waited || drained > 0
    }

    fn handle_event(&mut self, event: ThinkerEvent) {
        match event {
            ThinkerEvent::Line(line) => {
                self.handle_line(&line);
            }
            ThinkerEvent::Closed => self.on_closed(),
        }
    }

    /// Feed one raw thinker line through the protocol adapter. Returns whether
    /// it produced a stored insight; anything unparseable is dropped.
    pub fn handle_line(&mut self, line: &str) -> bool {
        let Some(message) = ThinkerMessage::parse(line) else {
            return false;
        };
        if let Some(id) = message.thought_id() {
            self.pending.remove(id);
        }
        let Some(record) = message.to_record(Utc::now()) else {
            return false;
        };

        let id = record.id.clone();
        let scratch_copy = self.config.scratch.record_insights.then(|| record.clone());
        if !self.store.ingest(record) {
            return false;
        }
        if let Some(record) = scratch_copy {
            if let Err(e) = self.scratch.record(&record) {
                warn!("Failed to write scratch note for {}: {}", id, e);
            }
        }
        true
    }

    fn on_closed(&mut self) {
        self.events = None;
        self.pending.clear();
        if let Some(mut process) = self.process.take() {
            let code = process.try_exit_code();
            info!(
                "Thinker exited (pid {:?}, code {:?})",
                process.pid(),
                code
            );
        }
    }
}
