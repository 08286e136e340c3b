//! Prompt templates for Referent.
//!
//! Defaults are embedded; either prompt can be overridden from the settings file.

use crate::config::PromptSettings;

const DEFAULT_SUMMARY_SYSTEM: &str = "You are a helpful meeting assistant.";
const DEFAULT_SUMMARY_USER: &str =
    "Summarize the following meeting transcript:\n{{transcript}}";

/// Prompt pair for transcript summarization.
#[derive(Debug, Clone)]
pub struct SummaryPrompts {
    pub system: String,
    pub user: String,
}

impl Default for SummaryPrompts {
    fn default() -> Self {
        Self {
            system: DEFAULT_SUMMARY_SYSTEM.to_string(),
            user: DEFAULT_SUMMARY_USER.to_string(),
        }
    }
}

impl SummaryPrompts {
    /// Build prompts from settings, falling back to the embedded defaults.
    pub fn from_settings(overrides: &PromptSettings) -> Self {
        let defaults = Self::default();
        Self {
            system: overrides.summary_system.clone().unwrap_or(defaults.system),
            user: overrides.summary_user.clone().unwrap_or(defaults.user),
        }
    }

    /// Render the user prompt with the transcript substituted in.
    pub fn render_user(&self, transcript: &str) -> String {
        self.user.replace("{{transcript}}", transcript)
    }
}
