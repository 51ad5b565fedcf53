//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/habitual/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/habitual/` (~/.config/habitual/)
//! - Data: `$XDG_DATA_HOME/habitual/` (~/.local/share/habitual/)
//! - State/Logs: `$XDG_STATE_HOME/habitual/` (~/.local/state/habitual/)

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_DATA_HOME or ~/.local/share
fn xdg_data_home() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/share"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default, Clone)]
pub struct Config {
    /// Transcript collection settings
    #[serde(default)]
    pub collector: CollectorConfig,

    /// Pattern mining thresholds
    #[serde(default)]
    pub miner: MinerConfig,

    /// Classification thresholds
    #[serde(default)]
    pub classifier: ClassifierConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where transcripts come from and how much of them to read.
#[derive(Debug, Deserialize, Clone)]
pub struct CollectorConfig {
    /// Root of the transcript source (`<root>/<project>/<session>.jsonl`).
    /// Defaults to `~/.claude/projects`.
    pub source_dir: Option<PathBuf>,

    /// Only sessions newer than this many days are collected
    #[serde(default = "default_days")]
    pub days: u32,

    /// Byte budget for the collected documents, in KB
    #[serde(default = "default_limit_kb")]
    pub limit_kb: u64,

    /// Session files whose name contains any of these are skipped
    #[serde(default = "default_exclude_patterns")]
    pub exclude_patterns: Vec<String>,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            source_dir: None,
            days: default_days(),
            limit_kb: default_limit_kb(),
            exclude_patterns: default_exclude_patterns(),
        }
    }
}

impl CollectorConfig {
    /// Resolved transcript root.
    pub fn source_dir(&self) -> PathBuf {
        self.source_dir
            .clone()
            .unwrap_or_else(|| home_dir().join(".claude").join("projects"))
    }

    /// Byte budget in bytes.
    pub fn limit_bytes(&self) -> u64 {
        self.limit_kb.saturating_mul(1024)
    }
}

fn default_days() -> u32 {
    30
}

fn default_limit_kb() -> u64 {
    100
}

fn default_exclude_patterns() -> Vec<String> {
    vec!["agent-".to_string()]
}

/// Pattern mining thresholds
#[derive(Debug, Deserialize, Clone)]
pub struct MinerConfig {
    /// Minimum occurrences for a mined candidate to be kept
    #[serde(default = "default_min_frequency")]
    pub min_frequency: usize,

    /// Window width for tool-sequence n-grams
    #[serde(default = "default_ngram_size")]
    pub ngram_size: usize,

    /// How many of the most frequent keywords are considered
    #[serde(default = "default_keyword_top_n")]
    pub keyword_top_n: usize,
}

impl Default for MinerConfig {
    fn default() -> Self {
        Self {
            min_frequency: default_min_frequency(),
            ngram_size: default_ngram_size(),
            keyword_top_n: default_keyword_top_n(),
        }
    }
}

fn default_min_frequency() -> usize {
    3
}

fn default_ngram_size() -> usize {
    3
}

fn default_keyword_top_n() -> usize {
    10
}

/// Classification thresholds
#[derive(Debug, Deserialize, Clone)]
pub struct ClassifierConfig {
    /// Tool sequences at or above this frequency become skills
    #[serde(default = "default_min_skill_frequency")]
    pub min_skill_frequency: usize,

    /// Prompt templates at or above this frequency become slash commands
    #[serde(default = "default_min_slash_frequency")]
    pub min_slash_frequency: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            min_skill_frequency: default_min_skill_frequency(),
            min_slash_frequency: default_min_slash_frequency(),
        }
    }
}

fn default_min_skill_frequency() -> usize {
    3
}

fn default_min_slash_frequency() -> usize {
    3
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Maximum number of log files to keep
    #[serde(default = "default_max_log_files")]
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            max_files: default_max_log_files(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_log_files() -> usize {
    5
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            return Ok(Config::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would make the pipeline degenerate.
    pub fn validate(&self) -> Result<()> {
        if self.miner.ngram_size == 0 {
            return Err(Error::Config(
                "miner.ngram_size must be at least 1".to_string(),
            ));
        }
        if self.miner.min_frequency == 0 {
            return Err(Error::Config(
                "miner.min_frequency must be at least 1".to_string(),
            ));
        }
        if self.collector.limit_kb == 0 {
            return Err(Error::Config(
                "collector.limit_kb must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/habitual/config.toml` (~/.config/habitual/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("habitual").join("config.toml")
    }

    /// Returns the data directory path
    ///
    /// `$XDG_DATA_HOME/habitual/` (~/.local/share/habitual/)
    pub fn data_dir() -> PathBuf {
        xdg_data_home().join("habitual")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/habitual/` (~/.local/state/habitual/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("habitual")
    }

    /// Returns the default directory for run artifacts
    ///
    /// `$XDG_DATA_HOME/habitual/analysis/`
    pub fn output_dir() -> PathBuf {
        Self::data_dir().join("analysis")
    }

    /// Returns the log file path
    ///
    /// `$XDG_STATE_HOME/habitual/habitual.log` (~/.local/state/habitual/habitual.log)
    pub fn log_path() -> PathBuf {
        Self::state_dir().join("habitual.log")
    }

    /// Ensure XDG base directory environment variables are set.
    ///
    /// This is mainly for CLI binaries that want explicit, stable path behavior
    /// before invoking other components that read these env vars.
    pub fn ensure_xdg_env() {
        let home = home_dir();

        if std::env::var("XDG_DATA_HOME").is_err() {
            std::env::set_var("XDG_DATA_HOME", home.join(".local/share"));
        }

        if std::env::var("XDG_STATE_HOME").is_err() {
            std::env::set_var("XDG_STATE_HOME", home.join(".local/state"));
        }

        if std::env::var("XDG_CONFIG_HOME").is_err() {
            std::env::set_var("XDG_CONFIG_HOME", home.join(".config"));
        }
    }
}
