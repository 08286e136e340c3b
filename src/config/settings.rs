//! Configuration settings for Referent.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub transcription: TranscriptionSettings,
    pub summarize: SummarizeSettings,
    pub streaming: StreamingSettings,
    pub prompts: PromptSettings,
}

/// Transcription provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptionSettings {
    /// Base URL of the transcription API.
    pub base_url: String,
    /// Seconds between consecutive status checks for one job.
    pub poll_interval_secs: u64,
    /// Wall-clock budget in seconds for one job to reach a terminal state.
    pub max_wait_secs: u64,
    /// Consecutive status-check transport failures tolerated before giving up.
    pub max_status_retries: u32,
    /// Per-request HTTP timeout in seconds.
    pub http_timeout_secs: u64,
}

impl Default for TranscriptionSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.assemblyai.com".to_string(),
            poll_interval_secs: 3,
            max_wait_secs: 600, // 10 minutes
            max_status_retries: 3,
            http_timeout_secs: 120,
        }
    }
}

impl TranscriptionSettings {
    /// Interval between status checks.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Wall-clock wait budget.
    pub fn max_wait(&self) -> Duration {
        Duration::from_secs(self.max_wait_secs)
    }

    /// Per-request HTTP timeout.
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

/// Summarization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummarizeSettings {
    /// Generate a summary for completed batch transcripts.
    pub enabled: bool,
    /// Chat model used for summaries.
    pub model: String,
}

impl Default for SummarizeSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            model: "gpt-4o-mini".to_string(),
        }
    }
}

/// What happens to chunks still in flight when a stream's intake closes.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ClosePolicy {
    /// Stop polling in-flight chunks as soon as intake closes (default).
    #[default]
    Abandon,
    /// Let already-submitted chunks poll to a terminal state.
    Drain,
}

impl std::str::FromStr for ClosePolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "abandon" => Ok(ClosePolicy::Abandon),
            "drain" => Ok(ClosePolicy::Drain),
            _ => Err(format!("Unknown close policy: {}", s)),
        }
    }
}

impl std::fmt::Display for ClosePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClosePolicy::Abandon => write!(f, "abandon"),
            ClosePolicy::Drain => write!(f, "drain"),
        }
    }
}

/// Streaming pipeline settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamingSettings {
    /// Maximum chunks transcribing concurrently per stream.
    pub max_in_flight: usize,
    /// Policy for chunks still in flight when intake closes.
    pub close_policy: ClosePolicy,
    /// Largest accepted chunk, in bytes.
    pub max_chunk_bytes: usize,
}

impl Default for StreamingSettings {
    fn default() -> Self {
        Self {
            max_in_flight: 4,
            close_policy: ClosePolicy::Abandon,
            max_chunk_bytes: 10 * 1024 * 1024, // 10 MiB
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Override for the summary system prompt.
    pub summary_system: Option<String>,
    /// Override for the summary user template ({{transcript}} is substituted).
    pub summary_user: Option<String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to the default configuration file.
    pub fn save(&self) -> crate::error::Result<()> {
        self.save_to(&Self::default_config_path())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::ReferentError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("referent")
            .join("config.toml")
    }
}
