//! Transcription provider clients for Referent.
//!
//! Wraps the external transcription service behind a trait so the
//! orchestrators can run against the real API or an in-process fake.

mod assemblyai;
mod scripted;

pub use assemblyai::AssemblyAiClient;
pub use scripted::{ScriptStep, ScriptedProvider};

use crate::error::Result;
use async_trait::async_trait;

/// Provider-side state of one transcription, as reported by a status query.
///
/// A provider-reported failure is a normal value here, not an `Err`; transport
/// and parse problems are the errors.
#[derive(Debug, Clone, PartialEq)]
pub enum TranscriptStatus {
    /// Accepted, waiting for a worker.
    Queued,
    /// Being transcribed.
    Processing,
    /// Finished; transcript text available.
    Completed { transcript: String },
    /// The provider gave up on the job.
    Failed { reason: String },
}

impl TranscriptStatus {
    /// Whether the provider will never report anything further for this job.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TranscriptStatus::Completed { .. } | TranscriptStatus::Failed { .. }
        )
    }
}

/// Trait for asynchronous transcription services.
#[async_trait]
pub trait TranscriptionProvider: Send + Sync {
    /// Upload raw audio and return the provider's handle (audio URL) for it.
    async fn upload_audio(&self, audio: Vec<u8>, content_type: &str) -> Result<String>;

    /// Ask the provider to transcribe uploaded audio; returns the transcript id.
    async fn request_transcription(&self, audio_url: &str) -> Result<String>;

    /// Query the current state of one transcription.
    async fn get_status(&self, transcript_id: &str) -> Result<TranscriptStatus>;
}
