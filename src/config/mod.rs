//! Configuration module for Referent.
//!
//! Handles loading and managing application settings, prompt templates, and
//! environment credentials.

mod credentials;
mod prompts;
mod settings;

pub use credentials::{Credentials, ASSEMBLYAI_KEY_VAR, OPENAI_KEY_VAR};
pub use prompts::SummaryPrompts;
pub use settings::{
    ClosePolicy, PromptSettings, Settings, StreamingSettings, SummarizeSettings,
    TranscriptionSettings,
};
