//! Error types for Referent.

use thiserror::Error;

/// Library-level error type for Referent operations.
#[derive(Error, Debug)]
pub enum ReferentError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Audio upload failed: {0}")]
    Upload(String),

    #[error("Provider rejected the request: {0}")]
    ProviderRejected(String),

    #[error("Transcription request failed: {0}")]
    Submit(String),

    #[error("Status query failed: {0}")]
    StatusQuery(String),

    #[error("Transcription failed: {0}")]
    ProviderFailed(String),

    #[error("Summarization failed: {0}")]
    Summarization(String),

    #[error("Timed out after {0}s waiting for the transcript")]
    TimedOut(u64),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl ReferentError {
    /// Stable machine-readable tag carried in HTTP error payloads and stream events.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Config(_) => "config_error",
            Self::InvalidInput(_) => "invalid_input",
            Self::Upload(_) => "upload_error",
            Self::ProviderRejected(_) => "provider_rejected",
            Self::Submit(_) => "submit_error",
            Self::StatusQuery(_) => "status_query_error",
            Self::ProviderFailed(_) => "provider_failed",
            Self::Summarization(_) => "summarization_error",
            Self::TimedOut(_) => "timed_out",
            Self::Cancelled => "cancelled",
            Self::Io(_) | Self::Json(_) | Self::TomlParse(_) | Self::Http(_) => "internal_error",
        }
    }
}

/// Result type alias for Referent operations.
pub type Result<T> = std::result::Result<T, ReferentError>;
