//! AssemblyAI transcription client.
//!
//! Speaks the v2 wire protocol: `POST /v2/upload` with the raw audio body,
//! `POST /v2/transcript` to start a job, `GET /v2/transcript/{id}` to poll it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{TranscriptStatus, TranscriptionProvider};
use crate::config::TranscriptionSettings;
use crate::error::{ReferentError, Result};

#[derive(Debug, Deserialize)]
struct UploadResponse {
    upload_url: Option<String>,
}

#[derive(Debug, Serialize)]
struct CreateTranscriptRequest<'a> {
    audio_url: &'a str,
}

#[derive(Debug, Deserialize)]
struct TranscriptResponse {
    id: Option<String>,
    status: Option<String>,
    text: Option<String>,
    error: Option<String>,
}

/// Client for the AssemblyAI v2 transcription API.
pub struct AssemblyAiClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl AssemblyAiClient {
    /// Create a client with an explicit API key and the configured endpoint.
    pub fn new(api_key: impl Into<String>, settings: &TranscriptionSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(settings.http_timeout())
            .build()
            .map_err(|e| ReferentError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl TranscriptionProvider for AssemblyAiClient {
    async fn upload_audio(&self, audio: Vec<u8>, content_type: &str) -> Result<String> {
        let url = format!("{}/v2/upload", self.base_url);
        debug!("Uploading {} bytes ({})", audio.len(), content_type);

        let response = self
            .client
            .post(&url)
            .header("authorization", &self.api_key)
            .header("content-type", content_type)
            .body(audio)
            .send()
            .await
            .map_err(|e| ReferentError::Upload(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ReferentError::Upload(format!("HTTP {}: {}", status, body)));
        }

        let parsed: UploadResponse = response
            .json()
            .await
            .map_err(|e| ReferentError::Upload(format!("Invalid upload response: {}", e)))?;

        extract_upload_url(parsed)
    }

    async fn request_transcription(&self, audio_url: &str) -> Result<String> {
        let url = format!("{}/v2/transcript", self.base_url);
        debug!("Requesting transcription of {}", audio_url);

        let response = self
            .client
            .post(&url)
            .header("authorization", &self.api_key)
            .json(&CreateTranscriptRequest { audio_url })
            .send()
            .await
            .map_err(|e| ReferentError::Submit(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ReferentError::Submit(format!("HTTP {}: {}", status, body)));
        }

        let parsed: TranscriptResponse = response
            .json()
            .await
            .map_err(|e| ReferentError::Submit(format!("Invalid transcript response: {}", e)))?;

        extract_transcript_id(parsed)
    }

    async fn get_status(&self, transcript_id: &str) -> Result<TranscriptStatus> {
        let url = format!("{}/v2/transcript/{}", self.base_url, transcript_id);

        let response = self
            .client
            .get(&url)
            .header("authorization", &self.api_key)
            .send()
            .await
            .map_err(|e| ReferentError::StatusQuery(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ReferentError::StatusQuery(format!(
                "HTTP {}: {}",
                status, body
            )));
        }

        let parsed: TranscriptResponse = response
            .json()
            .await
            .map_err(|e| ReferentError::StatusQuery(format!("Invalid status response: {}", e)))?;

        parse_status(parsed)
    }
}

fn extract_upload_url(response: UploadResponse) -> Result<String> {
    response.upload_url.ok_or_else(|| {
        ReferentError::ProviderRejected("upload response missing upload_url".to_string())
    })
}

fn extract_transcript_id(response: TranscriptResponse) -> Result<String> {
    response.id.ok_or_else(|| {
        ReferentError::ProviderRejected("transcript response missing id".to_string())
    })
}

/// Map a raw status payload onto [`TranscriptStatus`].
///
/// Unknown status strings and a completed payload without text fail fast
/// instead of being carried along as half-filled values.
fn parse_status(response: TranscriptResponse) -> Result<TranscriptStatus> {
    let status = response.status.as_deref().ok_or_else(|| {
        ReferentError::StatusQuery("status response missing the status field".to_string())
    })?;

    match status {
        "queued" => Ok(TranscriptStatus::Queued),
        "processing" => Ok(TranscriptStatus::Processing),
        "completed" => {
            let transcript = response.text.ok_or_else(|| {
                ReferentError::StatusQuery("completed transcript has no text".to_string())
            })?;
            Ok(TranscriptStatus::Completed { transcript })
        }
        "error" => {
            let reason = response
                .error
                .unwrap_or_else(|| "transcription failed (no detail from provider)".to_string());
            Ok(TranscriptStatus::Failed { reason })
        }
        other => Err(ReferentError::StatusQuery(format!(
            "unknown transcript status: {}",
            other
        ))),
    }
}
