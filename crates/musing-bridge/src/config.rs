//! Bridge configuration
//!
//! All tunable parameters in one place. Loaded from TOML at startup,
//! falls back to defaults if no config file exists.

use musing_core::{Error, Result};
use musing_memory::MemoryConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level bridge configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Store limits and retention.
    pub memory: MemoryConfig,
    /// How to launch the thinker subprocess.
    pub thinker: ThinkerConfig,
    /// Scratch note directory.
    pub scratch: ScratchConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThinkerConfig {
    /// Executable to run. Looked up on PATH when not absolute.
    pub program: String,
    /// Arguments passed to the program.
    pub args: Vec<String>,
    /// Working directory for the subprocess. Inherited when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<PathBuf>,
    /// Fixed wait after spawning before the thinker is considered up.
    /// There is no readiness handshake.
    pub startup_grace_ms: u64,
    /// Extra environment for the subprocess.
    pub env: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScratchConfig {
    /// Root of the day-organized scratch tree.
    pub dir: PathBuf,
    /// Also write every ingested insight as a note under today's directory.
    pub record_insights: bool,
}

// ============================================================
// Defaults
// ============================================================

impl Default for ThinkerConfig {
    fn default() -> Self {
        Self {
            program: "musing-thinker".into(),
            args: Vec::new(),
            working_dir: None,
            startup_grace_ms: 2_000,
            env: BTreeMap::new(),
        }
    }
}

impl Default for ScratchConfig {
    fn default() -> Self {
        let base = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        Self {
            dir: base.join(".musing").join("scratch"),
            record_insights: false,
        }
    }
}

impl ThinkerConfig {
    pub fn startup_grace(&self) -> Duration {
        Duration::from_millis(self.startup_grace_ms)
    }
}

// ============================================================
// Loading
// ============================================================

impl BridgeConfig {
    /// Load config from a TOML file, falling back to defaults.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => {
                    tracing::info!("Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!("Failed to parse {}: {}, using defaults", path.display(), e);
                    Self::default()
                }
            },
            Err(_) => {
                tracing::info!("No config at {}, using defaults", path.display());
                Self::default()
            }
        }
    }

    /// Render the config as TOML (for generating a default config file).
    pub fn to_toml(&self) -> String {
        toml::to_string_pretty(self).unwrap_or_default()
    }

    pub fn validate(&self) -> Result<()> {
        self.memory.validate()?;
        if self.thinker.program.trim().is_empty() {
            return Err(Error::Config("thinker.program must not be empty".into()));
        }
        Ok(())
    }
}
