//! Command-line client configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tvremote_core::RemoteConfig;

/// Top-level configuration for the `tvremote` binary.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Session settings handed to the core.
    pub remote: RemoteConfig,
    /// External protocol engine.
    pub engine: EngineConfig,
    /// Logging.
    pub logging: LoggingConfig,
}

/// How to launch the protocol engine process.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Executable speaking the JSON-lines engine protocol.
    pub program: String,
    /// Extra arguments.
    pub args: Vec<String>,
}

/// Logging.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Install a log subscriber at all.
    pub enabled: bool,
    /// Filter directive, overridden by `RUST_LOG`.
    pub level: String,
}

// ── Defaults ─────────────────────────────────────────────────────

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            program: "tvremote-engine".into(),
            args: Vec::new(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: "warn".into(),
        }
    }
}

// ── Loading ──────────────────────────────────────────────────────

impl CliConfig {
    /// Load from a TOML file, falling back to defaults.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => toml::from_str(&contents).unwrap_or_else(|e| {
                tracing::warn!("invalid config {}: {e}; using defaults", path.display());
                Self::default()
            }),
            Err(_) => {
                tracing::info!("no config at {}; using defaults", path.display());
                Self::default()
            }
        }
    }

    /// The defaults as TOML.
    pub fn default_toml() -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(&Self::default())
    }
}

// ── Tests ────────────────────────────────────────────────────────
