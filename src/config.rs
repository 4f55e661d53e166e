//! Configuration for recap.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (GEMINI_API_KEY, RECAP_WATCH_DIR)
//! 2. Config file (~/.recap/config.yaml, or RECAP_CONFIG)
//! 3. Defaults
//!
//! All options are static: read once at startup, no runtime
//! reconfiguration.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::adapters::gemini;
use crate::ingest::{SettleConfig, WatcherConfig};
use crate::ingest::watcher::{default_extensions, default_watch_dir};

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    /// Directory to watch for new recordings
    pub watch_dir: Option<PathBuf>,

    /// Supported video extensions (without leading dots)
    pub extensions: Option<Vec<String>>,

    /// Settle detection: time between size/mtime samples
    pub poll_interval_ms: Option<u64>,

    /// Settle detection: consecutive identical samples required
    pub required_stable_reads: Option<u32>,

    /// Settle detection: overall limit per file
    pub settle_timeout_secs: Option<u64>,

    /// Debounce window for raw filesystem events
    pub debounce_secs: Option<u64>,

    /// Gemini model name
    pub model: Option<String>,

    /// Summarization prompt template override
    pub summary_prompt: Option<String>,

    /// API key (GEMINI_API_KEY env var takes precedence)
    pub api_key: Option<String>,
}

/// Resolved settings consumed at startup
#[derive(Debug, Clone)]
pub struct Settings {
    pub watch_dir: PathBuf,
    pub extensions: Vec<String>,
    pub debounce: Duration,
    pub settle: SettleConfig,
    pub model: String,
    pub summary_prompt: String,
    pub config_file: Option<PathBuf>,
    api_key: Option<String>,
}

impl Settings {
    /// Load settings from the config file and environment.
    pub fn load() -> Result<Self> {
        let path = config_file_path();

        let file = match &path {
            Some(p) if p.exists() => {
                let content = std::fs::read_to_string(p)
                    .with_context(|| format!("Failed to read config file: {}", p.display()))?;
                Some(
                    serde_yaml::from_str::<ConfigFile>(&content)
                        .with_context(|| format!("Failed to parse config file: {}", p.display()))?,
                )
            }
            _ => None,
        };

        let config_file = path.filter(|p| p.exists());

        Ok(Self::resolve(
            file,
            config_file,
            std::env::var("GEMINI_API_KEY").ok(),
            std::env::var("RECAP_WATCH_DIR").ok().map(PathBuf::from),
        ))
    }

    fn resolve(
        file: Option<ConfigFile>,
        config_file: Option<PathBuf>,
        env_api_key: Option<String>,
        env_watch_dir: Option<PathBuf>,
    ) -> Self {
        let file = file.unwrap_or_default();

        let settle = SettleConfig {
            poll_interval: file
                .poll_interval_ms
                .map(Duration::from_millis)
                .unwrap_or(SettleConfig::default().poll_interval),
            required_stable_reads: file
                .required_stable_reads
                .unwrap_or(SettleConfig::default().required_stable_reads),
            timeout: file
                .settle_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(SettleConfig::default().timeout),
        };

        Self {
            watch_dir: env_watch_dir
                .or(file.watch_dir)
                .unwrap_or_else(default_watch_dir),
            extensions: file.extensions.unwrap_or_else(default_extensions),
            debounce: file
                .debounce_secs
                .map(Duration::from_secs)
                .unwrap_or(Duration::from_secs(2)),
            settle,
            model: file.model.unwrap_or_else(|| gemini::DEFAULT_MODEL.to_string()),
            summary_prompt: file
                .summary_prompt
                .unwrap_or_else(|| gemini::DEFAULT_SUMMARY_PROMPT.to_string()),
            config_file,
            api_key: env_api_key.filter(|k| !k.is_empty()).or(file.api_key),
        }
    }

    /// The service credential. Errors when none is configured; callers
    /// treat that as fatal at startup.
    pub fn api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .context("No API key configured. Set GEMINI_API_KEY or add api_key to the config file")
    }

    /// Whether a credential is configured (for `recap config` output).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Watcher configuration derived from these settings.
    pub fn watcher_config(&self) -> WatcherConfig {
        WatcherConfig {
            watch_dir: self.watch_dir.clone(),
            extensions: self.extensions.clone(),
            debounce: self.debounce,
            settle: self.settle.clone(),
        }
    }
}

/// Config file location: `RECAP_CONFIG` or `~/.recap/config.yaml`.
pub fn config_file_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("RECAP_CONFIG") {
        return Some(PathBuf::from(path));
    }

    dirs::home_dir().map(|home| home.join(".recap").join("config.yaml"))
}
