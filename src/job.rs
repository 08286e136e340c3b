//! Job lifecycle tracking for transcription requests.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ReferentError, Result};

/// Lifecycle status of a transcription job.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Accepted by the provider, not yet picked up.
    Submitted,
    /// The provider is transcribing.
    Processing,
    /// Transcript available.
    Completed,
    /// The provider reported a terminal failure.
    Failed,
}

impl JobStatus {
    /// Whether this status admits no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Submitted => write!(f, "submitted"),
            JobStatus::Processing => write!(f, "processing"),
            JobStatus::Completed => write!(f, "completed"),
            JobStatus::Failed => write!(f, "failed"),
        }
    }
}

/// One transcription request tracked from submission to a terminal outcome.
///
/// Status only moves forward (`Submitted → Processing → Completed | Failed`);
/// fields are private so every change goes through the transition methods.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    id: String,
    status: JobStatus,
    transcript: Option<String>,
    summary: Option<String>,
    error: Option<String>,
    created_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl Job {
    /// Create a freshly submitted job with the provider-assigned id.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            status: JobStatus::Submitted,
            transcript: None,
            summary: None,
            error: None,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    /// Provider-assigned identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Current lifecycle status.
    pub fn status(&self) -> JobStatus {
        self.status
    }

    /// Transcript text, present only once `Completed`.
    pub fn transcript(&self) -> Option<&str> {
        self.transcript.as_deref()
    }

    /// Cached summary, present only for a summarized `Completed` job.
    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    /// Provider-supplied failure detail, present only when `Failed`.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// When the job was registered locally.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// When the job reached a terminal status, if it has.
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// Record that the provider has started transcribing.
    ///
    /// Idempotent while the job is live; rejected once terminal.
    pub fn mark_processing(&mut self) -> Result<()> {
        match self.status {
            JobStatus::Submitted | JobStatus::Processing => {
                self.status = JobStatus::Processing;
                Ok(())
            }
            terminal => Err(self.transition_error(terminal, JobStatus::Processing)),
        }
    }

    /// Move to `Completed` and store the transcript.
    ///
    /// The provider may finish between two status reads, so completing
    /// straight from `Submitted` is allowed. Completing twice is not.
    pub fn complete(&mut self, transcript: impl Into<String>) -> Result<()> {
        match self.status {
            JobStatus::Submitted | JobStatus::Processing => {
                self.status = JobStatus::Completed;
                self.transcript = Some(transcript.into());
                self.completed_at = Some(Utc::now());
                Ok(())
            }
            terminal => Err(self.transition_error(terminal, JobStatus::Completed)),
        }
    }

    /// Move to `Failed` and store the provider's failure detail.
    pub fn fail(&mut self, reason: impl Into<String>) -> Result<()> {
        match self.status {
            JobStatus::Submitted | JobStatus::Processing => {
                self.status = JobStatus::Failed;
                self.error = Some(reason.into());
                self.completed_at = Some(Utc::now());
                Ok(())
            }
            terminal => Err(self.transition_error(terminal, JobStatus::Failed)),
        }
    }

    /// Attach a summary to a completed job.
    pub fn attach_summary(&mut self, summary: impl Into<String>) -> Result<()> {
        if self.status != JobStatus::Completed {
            return Err(ReferentError::InvalidInput(format!(
                "job {}: cannot attach a summary while {}",
                self.id, self.status
            )));
        }
        self.summary = Some(summary.into());
        Ok(())
    }

    fn transition_error(&self, from: JobStatus, to: JobStatus) -> ReferentError {
        ReferentError::InvalidInput(format!(
            "job {}: cannot move from {} to {}",
            self.id, from, to
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_job_is_submitted() {
        let job = Job::new("t-1");
        assert_eq!(job.status(), JobStatus::Submitted);
        assert_eq!(job.id(), "t-1");
        assert!(job.transcript().is_none());
        assert!(job.completed_at().is_none());
    }

    #[test]
    fn test_forward_transitions() {
        let mut job = Job::new("t-1");
        job.mark_processing().unwrap();
        assert_eq!(job.status(), JobStatus::Processing);

        job.complete("hello world").unwrap();
        assert_eq!(job.status(), JobStatus::Completed);
        assert_eq!(job.transcript(), Some("hello world"));
        assert!(job.completed_at().is_some());
    }

    #[test]
    fn test_completion_straight_from_submitted() {
        let mut job = Job::new("t-1");
        job.complete("hello").unwrap();
        assert_eq!(job.status(), JobStatus::Completed);
    }

    #[test]
    fn test_terminal_status_never_regresses() {
        let mut job = Job::new("t-1");
        job.complete("hello").unwrap();

        assert!(job.mark_processing().is_err());
        assert!(job.fail("too late").is_err());
        assert_eq!(job.status(), JobStatus::Completed);
        assert!(job.error().is_none());
    }

    #[test]
    fn test_double_completion_rejected() {
        let mut job = Job::new("t-1");
        job.complete("first").unwrap();
        assert!(job.complete("second").is_err());
        assert_eq!(job.transcript(), Some("first"));
    }

    #[test]
    fn test_failed_job_has_reason_and_no_transcript() {
        let mut job = Job::new("t-1");
        job.mark_processing().unwrap();
        job.fail("audio too short").unwrap();

        assert_eq!(job.status(), JobStatus::Failed);
        assert_eq!(job.error(), Some("audio too short"));
        assert!(job.transcript().is_none());
        assert!(job.summary().is_none());
    }

    #[test]
    fn test_summary_only_attaches_when_completed() {
        let mut job = Job::new("t-1");
        assert!(job.attach_summary("too early").is_err());

        job.complete("hello world").unwrap();
        job.attach_summary("Greeting.").unwrap();
        assert_eq!(job.summary(), Some("Greeting."));
    }

    #[test]
    fn test_status_serializes_snake_case() {
        let json = serde_json::to_string(&JobStatus::Submitted).unwrap();
        assert_eq!(json, "\"submitted\"");
        let status: JobStatus = serde_json::from_str("\"failed\"").unwrap();
        assert_eq!(status, JobStatus::Failed);
    }
}
