//! HTTP API server command.

use crate::cli::{preflight, Output};
use crate::config::{Credentials, Settings};
use crate::orchestrator::BatchOrchestrator;
use crate::poller::PollerConfig;
use crate::provider::{ScriptedProvider, TranscriptionProvider};
use crate::server;
use crate::summarize::{FixedSummarizer, Summarizer};
use std::sync::Arc;

/// Run the HTTP/WebSocket server.
///
/// With `--scripted` the server runs against the in-process provider and a
/// canned summarizer, so it needs no credentials at all.
pub async fn run_serve(
    host: &str,
    port: u16,
    scripted: bool,
    settings: Settings,
) -> anyhow::Result<()> {
    let batch = if scripted {
        Output::warning("Scripted mode: transcripts are canned; no provider is contacted.");
        let provider: Arc<dyn TranscriptionProvider> = Arc::new(ScriptedProvider::new());
        let summarizer: Arc<dyn Summarizer> = Arc::new(FixedSummarizer::new("(scripted summary)"));
        BatchOrchestrator::new(
            provider,
            Some(summarizer),
            PollerConfig::from(&settings.transcription),
        )
    } else {
        if let Err(e) = preflight::check(&settings) {
            Output::error(&format!("{}", e));
            Output::info("Run 'referent doctor' for detailed diagnostics.");
            return Err(e.into());
        }
        let credentials = Credentials::from_env()?;
        BatchOrchestrator::from_settings(&settings, &credentials)?
    };

    let app = server::router(batch, settings);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("Referent API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET  /health");
    Output::kv("Upload", "POST /upload");
    Output::kv("Status", "GET  /status?transcript_id=...");
    Output::kv("Stream", "GET  /stream (WebSocket)");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}
