//! Pre-flight checks before network operations.
//!
//! Validates that the required API keys are present before starting work
//! that would otherwise fail midway.

use crate::config::{Settings, ASSEMBLYAI_KEY_VAR, OPENAI_KEY_VAR};
use crate::error::{ReferentError, Result};

/// Check the environment for every key the configured pipeline will need.
///
/// All commands talk to the transcription provider; the summarizer key is
/// only required while summarization is enabled.
pub fn check(settings: &Settings) -> Result<()> {
    check_env_key(ASSEMBLYAI_KEY_VAR)?;
    if settings.summarize.enabled {
        check_env_key(OPENAI_KEY_VAR)?;
    }
    Ok(())
}

fn check_env_key(name: &str) -> Result<()> {
    match std::env::var(name) {
        Ok(key) if !key.trim().is_empty() => Ok(()),
        Ok(_) => Err(ReferentError::Config(format!(
            "{} is empty. Set it with: export {}='...'",
            name, name
        ))),
        Err(_) => Err(ReferentError::Config(format!(
            "{} not set. Set it with: export {}='...'",
            name, name
        ))),
    }
}
