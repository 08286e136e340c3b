//! Status command implementation.

use crate::cli::{preflight, Output};
use crate::config::{Credentials, Settings};
use crate::job::JobStatus;
use crate::orchestrator::{BatchOrchestrator, JobSnapshot};
use anyhow::Result;

/// Run the status command: one provider read, printed.
pub async fn run_status(transcript_id: &str, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(&settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'referent doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let credentials = Credentials::from_env()?;
    let orchestrator = BatchOrchestrator::from_settings(&settings, &credentials)?;

    match orchestrator.check_status(transcript_id).await? {
        JobSnapshot::Pending { status } => {
            let stage = match status {
                JobStatus::Submitted => "submitted (waiting for the provider to pick it up)",
                _ => "processing",
            };
            Output::info(&format!("{}: {}", transcript_id, stage));
        }
        JobSnapshot::Completed {
            transcript,
            summary,
            summary_error,
        } => {
            Output::success(&format!("{}: completed", transcript_id));
            Output::header("Transcript");
            println!("{}", transcript);
            if let Some(summary) = summary {
                Output::header("Summary");
                println!("{}", summary);
            } else if let Some(reason) = summary_error {
                println!();
                Output::warning(&format!("Summarization failed: {}", reason));
            }
        }
        JobSnapshot::Failed { reason } => {
            Output::error(&format!("{}: failed: {}", transcript_id, reason));
        }
    }

    Ok(())
}
