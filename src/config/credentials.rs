//! API credentials loaded from the process environment.
//!
//! Keys never live in the settings file; they are read once at startup and
//! passed into the clients that need them.

use crate::error::{ReferentError, Result};

/// Environment variable holding the transcription provider key.
pub const ASSEMBLYAI_KEY_VAR: &str = "ASSEMBLYAI_API_KEY";
/// Environment variable holding the summarizer key.
pub const OPENAI_KEY_VAR: &str = "OPENAI_API_KEY";

/// Provider API keys read from the environment.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub assemblyai_api_key: String,
    pub openai_api_key: Option<String>,
}

impl Credentials {
    /// Read provider keys from the environment.
    ///
    /// The transcription key is required; the summarizer key is optional so
    /// transcription-only setups can run without it.
    pub fn from_env() -> Result<Self> {
        let assemblyai_api_key = std::env::var(ASSEMBLYAI_KEY_VAR)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                ReferentError::Config(format!(
                    "{} environment variable not set",
                    ASSEMBLYAI_KEY_VAR
                ))
            })?;

        let openai_api_key = std::env::var(OPENAI_KEY_VAR)
            .ok()
            .filter(|k| !k.trim().is_empty());

        Ok(Self {
            assemblyai_api_key,
            openai_api_key,
        })
    }

    /// Get the summarizer key, or a configuration error naming the fix.
    pub fn require_openai(&self) -> Result<&str> {
        self.openai_api_key.as_deref().ok_or_else(|| {
            ReferentError::Config(format!(
                "{} environment variable not set (set it, or disable summarize in config)",
                OPENAI_KEY_VAR
            ))
        })
    }
}
