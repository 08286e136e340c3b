//! Batch orchestrator for one-shot transcription jobs.
//!
//! Keeps an in-process registry of jobs it has seen; the registry doubles as
//! the summary cache, so a summary is computed at most once per job.

use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use crate::config::{Credentials, Settings, SummaryPrompts};
use crate::error::{ReferentError, Result};
use crate::job::{Job, JobStatus};
use crate::poller::{Poller, PollerConfig};
use crate::provider::{AssemblyAiClient, TranscriptStatus, TranscriptionProvider};
use crate::summarize::{OpenAiSummarizer, Summarizer};

/// Final outcome of one batch job.
#[derive(Debug, Clone, Serialize)]
pub struct JobResult {
    /// Provider-assigned job id.
    pub id: String,
    /// The transcript text.
    pub transcript: String,
    /// Summary, when summarization ran and succeeded.
    pub summary: Option<String>,
    /// Why the summary is missing, when summarization was attempted and failed.
    pub summary_error: Option<String>,
}

/// Point-in-time view of one job, from a single status query.
#[derive(Debug, Clone)]
pub enum JobSnapshot {
    /// Still waiting on the provider.
    Pending { status: JobStatus },
    /// Transcript ready; the summary is folded in when available.
    Completed {
        transcript: String,
        summary: Option<String>,
        summary_error: Option<String>,
    },
    /// The provider reported the job failed.
    Failed { reason: String },
}

/// Orchestrates the upload-poll-summarize pipeline for whole recordings.
pub struct BatchOrchestrator {
    provider: Arc<dyn TranscriptionProvider>,
    summarizer: Option<Arc<dyn Summarizer>>,
    poller: Poller,
    jobs: RwLock<HashMap<String, Job>>,
}

impl BatchOrchestrator {
    /// Create an orchestrator with custom components.
    pub fn new(
        provider: Arc<dyn TranscriptionProvider>,
        summarizer: Option<Arc<dyn Summarizer>>,
        poller_config: PollerConfig,
    ) -> Self {
        Self {
            provider: provider.clone(),
            summarizer,
            poller: Poller::new(provider, poller_config),
            jobs: RwLock::new(HashMap::new()),
        }
    }

    /// Wire up the real clients from settings and environment credentials.
    pub fn from_settings(settings: &Settings, credentials: &Credentials) -> Result<Self> {
        let provider: Arc<dyn TranscriptionProvider> = Arc::new(AssemblyAiClient::new(
            credentials.assemblyai_api_key.clone(),
            &settings.transcription,
        )?);

        let summarizer: Option<Arc<dyn Summarizer>> = if settings.summarize.enabled {
            let key = credentials.require_openai()?;
            let prompts = SummaryPrompts::from_settings(&settings.prompts);
            Some(Arc::new(
                OpenAiSummarizer::new(key, &settings.summarize.model).with_prompts(prompts),
            ))
        } else {
            None
        };

        Ok(Self::new(
            provider,
            summarizer,
            PollerConfig::from(&settings.transcription),
        ))
    }

    /// Handle to the transcription provider, shared with other pipelines.
    pub fn provider(&self) -> Arc<dyn TranscriptionProvider> {
        self.provider.clone()
    }

    /// Upload audio and start a transcription; returns the provider's job id
    /// without waiting for the transcript.
    #[instrument(skip(self, audio), fields(bytes = audio.len()))]
    pub async fn start_job(&self, audio: Vec<u8>, content_type: &str) -> Result<String> {
        if audio.is_empty() {
            return Err(ReferentError::InvalidInput(
                "audio payload is empty".to_string(),
            ));
        }

        let audio_url = self.provider.upload_audio(audio, content_type).await?;
        let transcript_id = self.provider.request_transcription(&audio_url).await?;
        info!("Started job {}", transcript_id);

        let mut jobs = self.jobs.write().unwrap();
        jobs.insert(transcript_id.clone(), Job::new(transcript_id.clone()));

        Ok(transcript_id)
    }

    /// Wait for the job to reach a terminal state and return the transcript
    /// with its summary.
    ///
    /// Transcript success and summary success are independent: a summarize
    /// failure still returns the transcript, with the error carried beside
    /// it, never an empty result.
    #[instrument(skip(self, cancel))]
    pub async fn get_result(&self, job_id: &str, cancel: &CancellationToken) -> Result<JobResult> {
        self.ensure_registered(job_id);

        match self.poller.wait_for_transcript(job_id, cancel).await {
            Ok(transcript) => {
                self.record_completion(job_id, &transcript);
                let (summary, summary_error) = self.summarize_completed(job_id, &transcript).await;
                Ok(JobResult {
                    id: job_id.to_string(),
                    transcript,
                    summary,
                    summary_error,
                })
            }
            Err(e) => {
                self.record_outcome(job_id, &e);
                Err(e)
            }
        }
    }

    /// Query the provider exactly once and report where the job stands.
    ///
    /// This is the non-blocking read behind the status endpoint; a completed
    /// answer folds in the summary the same cache-first way `get_result` does.
    #[instrument(skip(self))]
    pub async fn check_status(&self, job_id: &str) -> Result<JobSnapshot> {
        if job_id.trim().is_empty() {
            return Err(ReferentError::InvalidInput(
                "transcript id is empty".to_string(),
            ));
        }
        self.ensure_registered(job_id);

        match self.provider.get_status(job_id).await? {
            TranscriptStatus::Queued => Ok(JobSnapshot::Pending {
                status: JobStatus::Submitted,
            }),
            TranscriptStatus::Processing => {
                self.with_job(job_id, |job| {
                    if !job.status().is_terminal() {
                        if let Err(e) = job.mark_processing() {
                            warn!("Failed to record progress for {}: {}", job.id(), e);
                        }
                    }
                });
                Ok(JobSnapshot::Pending {
                    status: JobStatus::Processing,
                })
            }
            TranscriptStatus::Completed { transcript } => {
                self.record_completion(job_id, &transcript);
                let (summary, summary_error) = self.summarize_completed(job_id, &transcript).await;
                Ok(JobSnapshot::Completed {
                    transcript,
                    summary,
                    summary_error,
                })
            }
            TranscriptStatus::Failed { reason } => {
                self.with_job(job_id, |job| {
                    if !job.status().is_terminal() {
                        if let Err(e) = job.fail(reason.as_str()) {
                            warn!("Failed to record failure for {}: {}", job.id(), e);
                        }
                    }
                });
                Ok(JobSnapshot::Failed { reason })
            }
        }
    }

    /// Ids this instance never issued are served anyway; the provider is the
    /// source of truth. Register them on first sight so the cache applies.
    fn ensure_registered(&self, job_id: &str) {
        let mut jobs = self.jobs.write().unwrap();
        jobs.entry(job_id.to_string())
            .or_insert_with(|| Job::new(job_id));
    }

    fn with_job(&self, job_id: &str, f: impl FnOnce(&mut Job)) {
        let mut jobs = self.jobs.write().unwrap();
        if let Some(job) = jobs.get_mut(job_id) {
            f(job);
        }
    }

    fn record_completion(&self, job_id: &str, transcript: &str) {
        self.with_job(job_id, |job| {
            if !job.status().is_terminal() {
                if let Err(e) = job.complete(transcript) {
                    warn!("Failed to record completion for {}: {}", job.id(), e);
                }
            }
        });
    }

    /// Mirror a terminal poll error into the registry. Only a provider-reported
    /// failure is terminal for the job itself; timeouts, cancellation, and
    /// transport errors leave the provider-side job live, so the local entry
    /// stays pending and a later query can still find it completed.
    fn record_outcome(&self, job_id: &str, error: &ReferentError) {
        if let ReferentError::ProviderFailed(reason) = error {
            self.with_job(job_id, |job| {
                if !job.status().is_terminal() {
                    if let Err(e) = job.fail(reason.as_str()) {
                        warn!("Failed to record failure for {}: {}", job.id(), e);
                    }
                }
            });
        }
    }

    /// Summary for a completed transcript: cache first, then at most one
    /// summarize call. A failed call is reported but not cached, so the next
    /// query retries it.
    async fn summarize_completed(
        &self,
        job_id: &str,
        transcript: &str,
    ) -> (Option<String>, Option<String>) {
        {
            let jobs = self.jobs.read().unwrap();
            if let Some(summary) = jobs.get(job_id).and_then(|job| job.summary()) {
                return (Some(summary.to_string()), None);
            }
        }

        let Some(summarizer) = &self.summarizer else {
            return (None, None);
        };

        match summarizer.summarize(transcript).await {
            Ok(summary) => {
                self.with_job(job_id, |job| {
                    if let Err(e) = job.attach_summary(summary.as_str()) {
                        warn!("Failed to cache summary for {}: {}", job.id(), e);
                    }
                });
                (Some(summary), None)
            }
            Err(e) => {
                warn!("Summarization failed for {}: {}", job_id, e);
                (None, Some(e.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{ScriptStep, ScriptedProvider};
    use crate::summarize::FixedSummarizer;
    use std::time::Duration;

    fn fast_poller_config() -> PollerConfig {
        PollerConfig {
            interval: Duration::from_millis(10),
            max_wait: Duration::from_secs(5),
            max_status_retries: 3,
        }
    }

    fn orchestrator(
        provider: Arc<ScriptedProvider>,
        summarizer: Option<Arc<FixedSummarizer>>,
    ) -> BatchOrchestrator {
        let summarizer = summarizer.map(|s| s as Arc<dyn Summarizer>);
        BatchOrchestrator::new(provider, summarizer, fast_poller_config())
    }

    #[tokio::test]
    async fn test_start_job_returns_provider_id() {
        let provider = Arc::new(ScriptedProvider::new());
        let orch = orchestrator(provider.clone(), None);

        let id = orch.start_job(vec![1, 2, 3], "audio/wav").await.unwrap();

        assert_eq!(id, "scripted-1");
        assert_eq!(provider.upload_calls(), 1);
        assert_eq!(provider.submit_calls(), 1);
    }

    #[tokio::test]
    async fn test_start_job_rejects_empty_audio_before_any_network_call() {
        let provider = Arc::new(ScriptedProvider::new());
        let orch = orchestrator(provider.clone(), None);

        let err = orch.start_job(Vec::new(), "audio/wav").await.unwrap_err();

        assert_eq!(err.kind(), "invalid_input");
        assert_eq!(provider.upload_calls(), 0);
    }

    #[tokio::test]
    async fn test_upload_and_submit_failures_surface_verbatim() {
        let provider = Arc::new(ScriptedProvider::new());
        let orch = orchestrator(provider.clone(), None);

        provider.set_fail_uploads(true);
        let err = orch.start_job(vec![1], "audio/wav").await.unwrap_err();
        assert_eq!(err.kind(), "upload_error");

        provider.set_fail_uploads(false);
        provider.set_fail_submits(true);
        let err = orch.start_job(vec![1], "audio/wav").await.unwrap_err();
        assert_eq!(err.kind(), "submit_error");
    }

    #[tokio::test]
    async fn test_transcript_and_summary_after_repeated_polls() {
        let provider = Arc::new(ScriptedProvider::new());
        provider.queue_script(vec![
            ScriptStep::processing(),
            ScriptStep::processing(),
            ScriptStep::completed("hello world"),
        ]);
        let summarizer = Arc::new(FixedSummarizer::new("Greeting."));
        let orch = orchestrator(provider.clone(), Some(summarizer));

        let id = orch.start_job(vec![1, 2, 3], "audio/wav").await.unwrap();
        let cancel = CancellationToken::new();
        let result = orch.get_result(&id, &cancel).await.unwrap();

        assert_eq!(result.transcript, "hello world");
        assert_eq!(result.summary.as_deref(), Some("Greeting."));
        assert!(result.summary_error.is_none());
        assert_eq!(provider.status_calls(&id), 3);
    }

    #[tokio::test]
    async fn test_get_result_twice_summarizes_once() {
        let provider = Arc::new(ScriptedProvider::new());
        provider.queue_script(vec![ScriptStep::completed("hello world")]);
        let summarizer = Arc::new(FixedSummarizer::new("Greeting."));
        let orch = orchestrator(provider.clone(), Some(summarizer.clone()));

        let id = orch.start_job(vec![1], "audio/wav").await.unwrap();
        let cancel = CancellationToken::new();

        let first = orch.get_result(&id, &cancel).await.unwrap();
        let second = orch.get_result(&id, &cancel).await.unwrap();

        assert_eq!(first.transcript, "hello world");
        assert_eq!(second.transcript, "hello world");
        assert_eq!(first.summary, second.summary);
        assert_eq!(summarizer.calls(), 1);
    }

    #[tokio::test]
    async fn test_summarize_failure_still_returns_transcript() {
        let provider = Arc::new(ScriptedProvider::new());
        provider.queue_script(vec![ScriptStep::completed("hello world")]);
        let summarizer = Arc::new(FixedSummarizer::new("Greeting."));
        summarizer.set_fail(true);
        let orch = orchestrator(provider.clone(), Some(summarizer.clone()));

        let id = orch.start_job(vec![1], "audio/wav").await.unwrap();
        let cancel = CancellationToken::new();
        let result = orch.get_result(&id, &cancel).await.unwrap();

        assert_eq!(result.transcript, "hello world");
        assert!(result.summary.is_none());
        assert!(result
            .summary_error
            .as_deref()
            .unwrap()
            .contains("Summarization failed"));

        // a failed summary is not cached; the next query retries and succeeds
        summarizer.set_fail(false);
        let retried = orch.get_result(&id, &cancel).await.unwrap();
        assert_eq!(retried.summary.as_deref(), Some("Greeting."));
        assert_eq!(summarizer.calls(), 2);
    }

    #[tokio::test]
    async fn test_get_result_surfaces_provider_failure() {
        let provider = Arc::new(ScriptedProvider::new());
        provider.queue_script(vec![
            ScriptStep::processing(),
            ScriptStep::failed("audio too short"),
        ]);
        let summarizer = Arc::new(FixedSummarizer::new("unused"));
        let orch = orchestrator(provider.clone(), Some(summarizer.clone()));

        let id = orch.start_job(vec![1], "audio/wav").await.unwrap();
        let cancel = CancellationToken::new();
        let err = orch.get_result(&id, &cancel).await.unwrap_err();

        assert_eq!(err.kind(), "provider_failed");
        assert!(err.to_string().contains("audio too short"));
        assert_eq!(summarizer.calls(), 0);
    }

    #[tokio::test]
    async fn test_check_status_reports_each_stage() {
        let provider = Arc::new(ScriptedProvider::new());
        provider.insert_job(
            "ext-1",
            vec![
                ScriptStep::queued(),
                ScriptStep::processing(),
                ScriptStep::completed("hello world"),
            ],
        );
        let summarizer = Arc::new(FixedSummarizer::new("Greeting."));
        let orch = orchestrator(provider.clone(), Some(summarizer));

        match orch.check_status("ext-1").await.unwrap() {
            JobSnapshot::Pending { status } => assert_eq!(status, JobStatus::Submitted),
            other => panic!("expected pending, got {:?}", other),
        }
        match orch.check_status("ext-1").await.unwrap() {
            JobSnapshot::Pending { status } => assert_eq!(status, JobStatus::Processing),
            other => panic!("expected pending, got {:?}", other),
        }
        match orch.check_status("ext-1").await.unwrap() {
            JobSnapshot::Completed {
                transcript,
                summary,
                summary_error,
            } => {
                assert_eq!(transcript, "hello world");
                assert_eq!(summary.as_deref(), Some("Greeting."));
                assert!(summary_error.is_none());
            }
            other => panic!("expected completed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_check_status_serves_unknown_ids_and_caches_their_summary() {
        let provider = Arc::new(ScriptedProvider::new());
        provider.insert_job("ext-9", vec![ScriptStep::completed("external job")]);
        let summarizer = Arc::new(FixedSummarizer::new("About an external job."));
        let orch = orchestrator(provider.clone(), Some(summarizer.clone()));

        // never started through this orchestrator
        orch.check_status("ext-9").await.unwrap();
        orch.check_status("ext-9").await.unwrap();

        assert_eq!(summarizer.calls(), 1);
    }

    #[tokio::test]
    async fn test_check_status_reports_provider_failure_as_outcome() {
        let provider = Arc::new(ScriptedProvider::new());
        provider.insert_job("ext-2", vec![ScriptStep::failed("bad audio")]);
        let orch = orchestrator(provider.clone(), None);

        match orch.check_status("ext-2").await.unwrap() {
            JobSnapshot::Failed { reason } => assert_eq!(reason, "bad audio"),
            other => panic!("expected failed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_check_status_rejects_blank_id() {
        let provider = Arc::new(ScriptedProvider::new());
        let orch = orchestrator(provider.clone(), None);

        let err = orch.check_status("  ").await.unwrap_err();
        assert_eq!(err.kind(), "invalid_input");
        assert_eq!(provider.total_status_calls(), 0);
    }

    #[tokio::test]
    async fn test_check_status_propagates_transport_errors() {
        let provider = Arc::new(ScriptedProvider::new());
        provider.insert_job("ext-3", vec![ScriptStep::TransportError]);
        let orch = orchestrator(provider.clone(), None);

        let err = orch.check_status("ext-3").await.unwrap_err();
        assert_eq!(err.kind(), "status_query_error");
    }
}
