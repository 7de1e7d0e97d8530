//! Musing Bridge — owns the thinker subprocess and the insight store
//!
//! The thinker speaks one JSON object per line. Its stdout is read by a
//! background task and queued; the `InsightManager` drains that queue at the
//! start of every operation, so ingestion and retrieval never overlap and the
//! store needs no lock.

pub mod config;
pub mod manager;
pub mod process;
pub mod scratch;

pub use config::{BridgeConfig, ScratchConfig, ThinkerConfig};
pub use manager::InsightManager;
pub use process::{ThinkerEvent, ThinkerProcess};
pub use scratch::ScratchDir;
