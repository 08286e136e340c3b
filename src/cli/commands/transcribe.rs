//! Transcribe command implementation.

use crate::cli::{preflight, Output};
use crate::config::{Credentials, Settings};
use crate::orchestrator::BatchOrchestrator;
use anyhow::Result;
use std::path::Path;
use tokio_util::sync::CancellationToken;

/// Run the transcribe command: one batch job from a local file.
pub async fn run_transcribe(
    file: &str,
    content_type: Option<String>,
    no_summary: bool,
    output: Option<String>,
    mut settings: Settings,
) -> Result<()> {
    if no_summary {
        settings.summarize.enabled = false;
    }

    if let Err(e) = preflight::check(&settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'referent doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let path = Path::new(file);
    if !path.is_file() {
        Output::error(&format!("No such file: {}", file));
        return Err(anyhow::anyhow!("no such file: {}", file));
    }

    let content_type = content_type.unwrap_or_else(|| guess_content_type(path).to_string());

    Output::info(&format!("Transcribing: {}", file));
    let audio = tokio::fs::read(path).await?;

    let credentials = Credentials::from_env()?;
    let orchestrator = BatchOrchestrator::from_settings(&settings, &credentials)?;

    let spinner = Output::spinner("Uploading audio...");
    let transcript_id = match orchestrator.start_job(audio, &content_type).await {
        Ok(id) => id,
        Err(e) => {
            spinner.finish_and_clear();
            Output::error(&format!("Failed to start the job: {}", e));
            return Err(e.into());
        }
    };
    spinner.finish_and_clear();
    Output::info(&format!("Job id: {}", transcript_id));

    let spinner = Output::spinner("Waiting for the transcript...");
    let cancel = CancellationToken::new();
    let result = match orchestrator.get_result(&transcript_id, &cancel).await {
        Ok(result) => result,
        Err(e) => {
            spinner.finish_and_clear();
            Output::error(&format!("Transcription failed: {}", e));
            return Err(e.into());
        }
    };
    spinner.finish_and_clear();

    if let Some(output_path) = output {
        let json = serde_json::to_string_pretty(&result)?;
        if output_path == "-" {
            println!("{}", json);
        } else {
            std::fs::write(&output_path, &json)?;
            Output::success(&format!("Result saved to {}", output_path));
        }
        return Ok(());
    }

    Output::header("Transcript");
    println!("{}", result.transcript);

    if let Some(summary) = &result.summary {
        Output::header("Summary");
        println!("{}", summary);
    } else if let Some(reason) = &result.summary_error {
        println!();
        Output::warning(&format!("Summarization failed: {}", reason));
    }

    Ok(())
}

/// Map common audio extensions; the provider accepts raw bytes either way.
fn guess_content_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());

    match ext.as_deref() {
        Some("wav") => "audio/wav",
        Some("mp3") => "audio/mpeg",
        Some("m4a") => "audio/mp4",
        Some("flac") => "audio/flac",
        Some("ogg") => "audio/ogg",
        Some("webm") => "audio/webm",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guess_content_type() {
        assert_eq!(guess_content_type(Path::new("meeting.wav")), "audio/wav");
        assert_eq!(guess_content_type(Path::new("meeting.MP3")), "audio/mpeg");
        assert_eq!(
            guess_content_type(Path::new("meeting.raw")),
            "application/octet-stream"
        );
        assert_eq!(
            guess_content_type(Path::new("meeting")),
            "application/octet-stream"
        );
    }
}
