//! Application configuration: defaults, overlaid by an optional TOML file,
//! overlaid by command-line flags (see `main.rs`).
//!
//! ```toml
//! [interpreter]
//! pinch_threshold = 0.06
//!
//! [scene]
//! ornament_count = 64
//! initial_formation = "chaos"
//!
//! [source]
//! kind = "command"
//! command = ".venv/bin/python"
//! args = ["hand_stream.py"]
//!
//! [window]
//! fps = 30
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use gesture_intent::InterpreterConfig;
use serde::Deserialize;
use thiserror::Error;
use tree_scene::SceneConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Read {
        path:   PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ════════════════════════════════════════════════════════════════════════════
// Sections
// ════════════════════════════════════════════════════════════════════════════

/// Where landmark samples come from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Synthetic hand driven by mouse and keyboard.
    #[default]
    Sim,
    /// External recognizer process writing JSON Lines to stdout.
    Command,
    /// Recorded JSON Lines file.
    Replay,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SourceConfig {
    pub kind:        SourceKind,
    pub command:     Option<String>,
    pub args:        Vec<String>,
    /// First line the recognizer prints once its model is loaded.
    pub ready_line:  String,
    pub replay_path: Option<PathBuf>,
    pub replay_fps:  f32,
}

impl Default for SourceConfig {
    fn default() -> Self {
        SourceConfig {
            kind:        SourceKind::Sim,
            command:     None,
            args:        Vec::new(),
            ready_line:  "READY".to_string(),
            replay_path: None,
            replay_fps:  30.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WindowConfig {
    pub width:  usize,
    pub height: usize,
    pub fps:    u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        WindowConfig { width: 960, height: 720, fps: 60 }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// AppConfig
// ════════════════════════════════════════════════════════════════════════════

/// Configuration for the full application.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub interpreter: InterpreterConfig,
    pub scene:       SceneConfig,
    pub source:      SourceConfig,
    pub window:      WindowConfig,
}

impl AppConfig {
    /// Parse only.  Command-line overrides are merged afterwards, so
    /// [`validate`](Self::validate) runs once the final values are known.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        AppConfig::from_toml_str(&raw)
    }

    /// Reject values the rest of the app cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let i = &self.interpreter;
        if !(0.0..=1.0).contains(&i.formation_confidence) {
            return Err(ConfigError::Invalid("interpreter.formation_confidence must be 0–1".into()));
        }
        if i.pinch_threshold <= 0.0 || i.rotation_dead_zone < 0.0 {
            return Err(ConfigError::Invalid("interpreter thresholds must be positive".into()));
        }
        if self.window.width < 160 || self.window.height < 120 {
            return Err(ConfigError::Invalid("window must be at least 160×120".into()));
        }
        if self.window.fps == 0 || self.source.replay_fps <= 0.0 {
            return Err(ConfigError::Invalid("frame rates must be positive".into()));
        }
        match self.source.kind {
            SourceKind::Command if self.source.command.is_none() => {
                Err(ConfigError::Invalid("source.kind = \"command\" needs source.command".into()))
            }
            SourceKind::Replay if self.source.replay_path.is_none() => {
                Err(ConfigError::Invalid("source.kind = \"replay\" needs source.replay_path".into()))
            }
            _ => Ok(()),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
