//! Scripted in-process transcription provider.
//!
//! Plays back a programmed sequence of status-query outcomes per job. Useful
//! for tests and for exercising the service without provider credentials.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use super::{TranscriptStatus, TranscriptionProvider};
use crate::error::{ReferentError, Result};

/// One scripted status-query outcome.
#[derive(Debug, Clone)]
pub enum ScriptStep {
    /// Report this status.
    Status(TranscriptStatus),
    /// Fail the query as a transport error.
    TransportError,
}

impl ScriptStep {
    /// A queued status.
    pub fn queued() -> Self {
        ScriptStep::Status(TranscriptStatus::Queued)
    }

    /// A processing status.
    pub fn processing() -> Self {
        ScriptStep::Status(TranscriptStatus::Processing)
    }

    /// A completed status carrying `transcript`.
    pub fn completed(transcript: &str) -> Self {
        ScriptStep::Status(TranscriptStatus::Completed {
            transcript: transcript.to_string(),
        })
    }

    /// A provider-reported failure carrying `reason`.
    pub fn failed(reason: &str) -> Self {
        ScriptStep::Status(TranscriptStatus::Failed {
            reason: reason.to_string(),
        })
    }
}

struct ScriptedJob {
    steps: Vec<ScriptStep>,
    cursor: usize,
    status_calls: usize,
    /// Counted against `active` until a terminal step is consumed.
    open: bool,
}

struct ScriptedState {
    jobs: HashMap<String, ScriptedJob>,
    queued_scripts: VecDeque<Vec<ScriptStep>>,
    default_script: Vec<ScriptStep>,
    upload_calls: usize,
    submit_calls: usize,
    fail_uploads: bool,
    fail_submits: bool,
    active: usize,
    max_active: usize,
}

/// In-process provider that replays scripted status sequences.
///
/// Each submitted job consumes the next queued script (or the default one) and
/// plays it back one step per status query; once a script runs out, its last
/// step repeats forever. An empty script reports `Processing` forever.
pub struct ScriptedProvider {
    state: Mutex<ScriptedState>,
}

impl ScriptedProvider {
    /// Create a provider whose jobs process once and then complete.
    pub fn new() -> Self {
        Self::with_default_script(vec![
            ScriptStep::processing(),
            ScriptStep::completed("(scripted transcript)"),
        ])
    }

    /// Create a provider with a default script applied to every new job.
    pub fn with_default_script(script: Vec<ScriptStep>) -> Self {
        Self {
            state: Mutex::new(ScriptedState {
                jobs: HashMap::new(),
                queued_scripts: VecDeque::new(),
                default_script: script,
                upload_calls: 0,
                submit_calls: 0,
                fail_uploads: false,
                fail_submits: false,
                active: 0,
                max_active: 0,
            }),
        }
    }

    /// Queue a script for the next submitted job; consumed in submission order.
    pub fn queue_script(&self, script: Vec<ScriptStep>) {
        let mut state = self.state.lock().unwrap();
        state.queued_scripts.push_back(script);
    }

    /// Register a job under a known id without going through submission.
    pub fn insert_job(&self, id: &str, script: Vec<ScriptStep>) {
        let mut state = self.state.lock().unwrap();
        state.jobs.insert(
            id.to_string(),
            ScriptedJob {
                steps: script,
                cursor: 0,
                status_calls: 0,
                open: false,
            },
        );
    }

    /// Make every upload fail with an `Upload` error.
    pub fn set_fail_uploads(&self, fail: bool) {
        self.state.lock().unwrap().fail_uploads = fail;
    }

    /// Make every transcription request fail with a `Submit` error.
    pub fn set_fail_submits(&self, fail: bool) {
        self.state.lock().unwrap().fail_submits = fail;
    }

    /// Number of uploads accepted.
    pub fn upload_calls(&self) -> usize {
        self.state.lock().unwrap().upload_calls
    }

    /// Number of transcriptions started.
    pub fn submit_calls(&self) -> usize {
        self.state.lock().unwrap().submit_calls
    }

    /// Number of status queries one job has received.
    pub fn status_calls(&self, transcript_id: &str) -> usize {
        let state = self.state.lock().unwrap();
        state
            .jobs
            .get(transcript_id)
            .map(|job| job.status_calls)
            .unwrap_or(0)
    }

    /// Total status queries across all jobs.
    pub fn total_status_calls(&self) -> usize {
        let state = self.state.lock().unwrap();
        state.jobs.values().map(|job| job.status_calls).sum()
    }

    /// Highest number of jobs that were simultaneously submitted-but-not-terminal.
    pub fn max_active(&self) -> usize {
        self.state.lock().unwrap().max_active
    }
}

impl Default for ScriptedProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TranscriptionProvider for ScriptedProvider {
    async fn upload_audio(&self, _audio: Vec<u8>, _content_type: &str) -> Result<String> {
        let mut state = self.state.lock().unwrap();
        if state.fail_uploads {
            return Err(ReferentError::Upload("scripted upload failure".to_string()));
        }
        state.upload_calls += 1;
        Ok(format!("memory://audio/{}", state.upload_calls))
    }

    async fn request_transcription(&self, _audio_url: &str) -> Result<String> {
        let mut state = self.state.lock().unwrap();
        if state.fail_submits {
            return Err(ReferentError::Submit("scripted submit failure".to_string()));
        }
        state.submit_calls += 1;
        let id = format!("scripted-{}", state.submit_calls);

        let steps = match state.queued_scripts.pop_front() {
            Some(script) => script,
            None => state.default_script.clone(),
        };
        state.jobs.insert(
            id.clone(),
            ScriptedJob {
                steps,
                cursor: 0,
                status_calls: 0,
                open: true,
            },
        );
        state.active += 1;
        if state.active > state.max_active {
            state.max_active = state.active;
        }

        Ok(id)
    }

    async fn get_status(&self, transcript_id: &str) -> Result<TranscriptStatus> {
        let mut state = self.state.lock().unwrap();

        let (step, newly_closed) = {
            let job = state.jobs.get_mut(transcript_id).ok_or_else(|| {
                ReferentError::StatusQuery(format!("unknown transcript id: {}", transcript_id))
            })?;
            job.status_calls += 1;

            let step = match job.steps.get(job.cursor) {
                Some(step) => {
                    job.cursor += 1;
                    step.clone()
                }
                None => job
                    .steps
                    .last()
                    .cloned()
                    .unwrap_or_else(ScriptStep::processing),
            };

            let newly_closed =
                job.open && matches!(&step, ScriptStep::Status(s) if s.is_terminal());
            if newly_closed {
                job.open = false;
            }
            (step, newly_closed)
        };

        if newly_closed {
            state.active -= 1;
        }

        match step {
            ScriptStep::TransportError => Err(ReferentError::StatusQuery(
                "scripted transport error".to_string(),
            )),
            ScriptStep::Status(status) => Ok(status),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_script_plays_back_in_order_and_repeats_last() {
        let provider = ScriptedProvider::new();
        provider.queue_script(vec![
            ScriptStep::queued(),
            ScriptStep::processing(),
            ScriptStep::completed("done"),
        ]);

        let url = provider.upload_audio(vec![1, 2, 3], "audio/wav").await.unwrap();
        let id = provider.request_transcription(&url).await.unwrap();

        assert_eq!(provider.get_status(&id).await.unwrap(), TranscriptStatus::Queued);
        assert_eq!(
            provider.get_status(&id).await.unwrap(),
            TranscriptStatus::Processing
        );
        for _ in 0..2 {
            assert_eq!(
                provider.get_status(&id).await.unwrap(),
                TranscriptStatus::Completed {
                    transcript: "done".to_string()
                }
            );
        }
        assert_eq!(provider.status_calls(&id), 4);
    }

    #[tokio::test]
    async fn test_queued_scripts_consumed_in_submission_order() {
        let provider = ScriptedProvider::new();
        provider.queue_script(vec![ScriptStep::completed("first")]);
        provider.queue_script(vec![ScriptStep::completed("second")]);

        let a = provider.request_transcription("memory://a").await.unwrap();
        let b = provider.request_transcription("memory://b").await.unwrap();

        assert_eq!(
            provider.get_status(&a).await.unwrap(),
            TranscriptStatus::Completed {
                transcript: "first".to_string()
            }
        );
        assert_eq!(
            provider.get_status(&b).await.unwrap(),
            TranscriptStatus::Completed {
                transcript: "second".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_unknown_id_is_a_status_query_error() {
        let provider = ScriptedProvider::new();
        let err = provider.get_status("missing").await.unwrap_err();
        assert_eq!(err.kind(), "status_query_error");
    }

    #[tokio::test]
    async fn test_transport_error_step_fails_the_query() {
        let provider = ScriptedProvider::new();
        provider.queue_script(vec![ScriptStep::TransportError, ScriptStep::completed("ok")]);
        let id = provider.request_transcription("memory://a").await.unwrap();

        assert!(provider.get_status(&id).await.is_err());
        assert_eq!(
            provider.get_status(&id).await.unwrap(),
            TranscriptStatus::Completed {
                transcript: "ok".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_max_active_tracks_open_jobs() {
        let provider = ScriptedProvider::with_default_script(vec![ScriptStep::completed("x")]);

        let a = provider.request_transcription("memory://a").await.unwrap();
        let b = provider.request_transcription("memory://b").await.unwrap();
        assert_eq!(provider.max_active(), 2);

        provider.get_status(&a).await.unwrap();
        provider.get_status(&b).await.unwrap();
        let c = provider.request_transcription("memory://c").await.unwrap();
        provider.get_status(&c).await.unwrap();

        // the third job never overlapped the first two
        assert_eq!(provider.max_active(), 2);
    }

    #[tokio::test]
    async fn test_failure_toggles() {
        let provider = ScriptedProvider::new();
        provider.set_fail_uploads(true);
        assert_eq!(
            provider
                .upload_audio(vec![0], "audio/wav")
                .await
                .unwrap_err()
                .kind(),
            "upload_error"
        );

        provider.set_fail_submits(true);
        assert_eq!(
            provider
                .request_transcription("memory://a")
                .await
                .unwrap_err()
                .kind(),
            "submit_error"
        );
    }
}
