//! Transcript summarization for Referent.
//!
//! Summarization runs only in the batch pipeline, after a transcript
//! completes; a failure here never takes the transcript down with it.

mod fixed;
mod openai;

pub use fixed::FixedSummarizer;
pub use openai::OpenAiSummarizer;

use crate::error::Result;
use async_trait::async_trait;

/// Trait for summarization services.
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Produce a short summary of a transcript.
    async fn summarize(&self, transcript: &str) -> Result<String>;
}
