//! Error types for Musing

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("thinker not running: cannot {action}")]
    NotRunning { action: String },

    #[error("thinker already running (pid {pid:?})")]
    AlreadyRunning { pid: Option<u32> },

    #[error("failed to spawn thinker '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("config error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn not_running(action: impl Into<String>) -> Self {
        Self::NotRunning {
            action: action.into(),
        }
    }

    pub fn spawn(program: impl Into<String>, source: std::io::Error) -> Self {
        Self::Spawn {
            program: program.into(),
            source,
        }
    }

    /// Precondition failures are fatal to the call only; the manager stays usable.
    pub fn is_precondition(&self) -> bool {
        matches!(self, Self::NotRunning { .. } | Self::AlreadyRunning { .. })
    }
}
