//! Stream orchestrator for chunked audio.
//!
//! Transport-agnostic: consumes audio chunks from an inbound channel and
//! emits per-chunk events on an outbound one. The WebSocket handler adapts
//! socket frames to these channels, which keeps ordering and cancellation
//! behavior testable without a socket.

use std::sync::Arc;

use tokio::sync::{mpsc, Semaphore};
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

use crate::config::{ClosePolicy, StreamingSettings};
use crate::error::{ReferentError, Result};
use crate::poller::{Poller, PollerConfig};
use crate::provider::TranscriptionProvider;

/// One unit of streamed audio, processed as its own job.
#[derive(Debug)]
pub struct Chunk {
    /// Arrival-order sequence number.
    pub seq: u64,
    /// Raw audio bytes.
    pub data: Vec<u8>,
}

/// Per-chunk outcome emitted on the outbound channel.
#[derive(Debug, Clone, PartialEq)]
pub enum ChunkEvent {
    /// Chunk transcribed.
    Transcript { seq: u64, text: String },
    /// Chunk failed; the stream stays open for later chunks.
    Error {
        seq: u64,
        kind: &'static str,
        message: String,
    },
}

/// Orchestrates per-chunk transcription over a long-lived channel pair.
pub struct StreamOrchestrator {
    provider: Arc<dyn TranscriptionProvider>,
    poller_config: PollerConfig,
    max_in_flight: usize,
    close_policy: ClosePolicy,
    max_chunk_bytes: usize,
    content_type: String,
}

impl StreamOrchestrator {
    /// Create an orchestrator for one stream.
    pub fn new(
        provider: Arc<dyn TranscriptionProvider>,
        poller_config: PollerConfig,
        settings: &StreamingSettings,
    ) -> Self {
        Self {
            provider,
            poller_config,
            // zero permits would admit nothing
            max_in_flight: settings.max_in_flight.max(1),
            close_policy: settings.close_policy.clone(),
            max_chunk_bytes: settings.max_chunk_bytes,
            content_type: "application/octet-stream".to_string(),
        }
    }

    /// Set the content type reported for every uploaded chunk.
    pub fn with_content_type(mut self, content_type: &str) -> Self {
        self.content_type = content_type.to_string();
        self
    }

    /// Consume audio chunks until the inbound channel closes or `close`
    /// fires, emitting one event per chunk.
    ///
    /// Uploads and transcription requests happen in arrival order, gated by
    /// `max_in_flight` permits; polling fans out, so events follow completion
    /// order, which may differ from arrival order. `close` ends intake even
    /// while it is blocked waiting for a permit: chunks not yet submitted
    /// are dropped, and submitted chunks are cancelled (`abandon`, emitting
    /// a `cancelled` error each) or polled to their terminal state
    /// (`drain`).
    #[instrument(skip_all)]
    pub async fn run(
        &self,
        mut audio: mpsc::Receiver<Vec<u8>>,
        events: mpsc::Sender<ChunkEvent>,
        close: &CancellationToken,
    ) {
        let semaphore = Arc::new(Semaphore::new(self.max_in_flight));
        let cancel = CancellationToken::new();
        let mut workers = Vec::new();
        let mut seq: u64 = 0;

        loop {
            let data = tokio::select! {
                biased;
                _ = close.cancelled() => break,
                received = audio.recv() => match received {
                    Some(data) => data,
                    None => break,
                },
            };
            let chunk = Chunk { seq, data };
            seq += 1;

            if let Err(e) = self.validate_chunk(&chunk) {
                let _ = events
                    .send(ChunkEvent::Error {
                        seq: chunk.seq,
                        kind: e.kind(),
                        message: e.to_string(),
                    })
                    .await;
                continue;
            }

            // close must stay observable here: a full fan-out blocks this
            // acquire long after the socket may have gone away
            let permit = tokio::select! {
                biased;
                _ = close.cancelled() => {
                    debug!("Dropping chunk {}; stream closed before submission", chunk.seq);
                    break;
                }
                acquired = semaphore.clone().acquire_owned() => match acquired {
                    Ok(permit) => permit,
                    // the semaphore is never closed while we run
                    Err(_) => break,
                },
            };

            let chunk_seq = chunk.seq;
            let transcript_id = match self.submit_chunk(chunk).await {
                Ok(id) => id,
                Err(e) => {
                    debug!("Chunk {} failed to submit: {}", chunk_seq, e);
                    let _ = events
                        .send(ChunkEvent::Error {
                            seq: chunk_seq,
                            kind: e.kind(),
                            message: e.to_string(),
                        })
                        .await;
                    continue;
                }
            };

            let poller = Poller::new(self.provider.clone(), self.poller_config.clone());
            let events = events.clone();
            let cancel = cancel.clone();
            workers.push(tokio::spawn(async move {
                let _permit = permit;
                let event = match poller.wait_for_transcript(&transcript_id, &cancel).await {
                    Ok(text) => ChunkEvent::Transcript {
                        seq: chunk_seq,
                        text,
                    },
                    Err(e) => {
                        debug!("Chunk {} did not complete: {}", chunk_seq, e);
                        ChunkEvent::Error {
                            seq: chunk_seq,
                            kind: e.kind(),
                            message: e.to_string(),
                        }
                    }
                };
                // the receiving side may already be gone; that loses only this event
                let _ = events.send(event).await;
            }));
        }

        debug!("Intake closed after {} chunks ({})", seq, self.close_policy);
        if self.close_policy == ClosePolicy::Abandon {
            cancel.cancel();
        }

        for worker in workers {
            if let Err(e) = worker.await {
                warn!("Chunk task failed: {}", e);
            }
        }
    }

    /// Upload one chunk and start its transcription, in the intake loop so
    /// submissions keep arrival order.
    async fn submit_chunk(&self, chunk: Chunk) -> Result<String> {
        let audio_url = self
            .provider
            .upload_audio(chunk.data, &self.content_type)
            .await?;
        let transcript_id = self.provider.request_transcription(&audio_url).await?;
        debug!("Chunk {} submitted as {}", chunk.seq, transcript_id);
        Ok(transcript_id)
    }

    fn validate_chunk(&self, chunk: &Chunk) -> Result<()> {
        if chunk.data.is_empty() {
            return Err(ReferentError::InvalidInput(
                "audio chunk is empty".to_string(),
            ));
        }
        if chunk.data.len() > self.max_chunk_bytes {
            return Err(ReferentError::InvalidInput(format!(
                "audio chunk of {} bytes exceeds the {} byte limit",
                chunk.data.len(),
                self.max_chunk_bytes
            )));
        }
        Ok(())
    }
}
