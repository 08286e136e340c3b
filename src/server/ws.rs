//! WebSocket endpoint for chunked streaming transcription.
//!
//! One binary frame in per audio chunk, one JSON text frame out per chunk
//! outcome. The socket only shuttles frames; ordering, fan-out, and teardown
//! all live in the stream orchestrator.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::IntoResponse,
};
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::{AppState, ErrorDetail, DEFAULT_CONTENT_TYPE};
use crate::orchestrator::{ChunkEvent, StreamOrchestrator};
use crate::poller::PollerConfig;

/// Frames buffered between the socket and the orchestrator.
const CHANNEL_CAPACITY: usize = 16;

#[derive(Deserialize)]
pub(crate) struct StreamParams {
    /// Content type reported to the provider for every chunk.
    content_type: Option<String>,
}

/// One outbound text frame per chunk outcome.
#[derive(Serialize)]
struct StreamFrame {
    seq: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    transcript: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ErrorDetail>,
}

impl From<ChunkEvent> for StreamFrame {
    fn from(event: ChunkEvent) -> Self {
        match event {
            ChunkEvent::Transcript { seq, text } => StreamFrame {
                seq,
                transcript: Some(text),
                error: None,
            },
            ChunkEvent::Error { seq, kind, message } => StreamFrame {
                seq,
                transcript: None,
                error: Some(ErrorDetail { kind, message }),
            },
        }
    }
}

/// Upgrade to a WebSocket and run one streaming session over it.
pub(crate) async fn stream(
    State(state): State<Arc<AppState>>,
    Query(params): Query<StreamParams>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| run_session(socket, state, params))
}

async fn run_session(socket: WebSocket, state: Arc<AppState>, params: StreamParams) {
    let content_type = params
        .content_type
        .as_deref()
        .unwrap_or(DEFAULT_CONTENT_TYPE);
    let orchestrator = StreamOrchestrator::new(
        state.batch.provider(),
        PollerConfig::from(&state.settings.transcription),
        &state.settings.streaming,
    )
    .with_content_type(content_type);

    let (audio_tx, audio_rx) = mpsc::channel(CHANNEL_CAPACITY);
    let (events_tx, mut events_rx) = mpsc::channel::<ChunkEvent>(CHANNEL_CAPACITY);
    let (mut socket_tx, mut socket_rx) = socket.split();
    let close = CancellationToken::new();

    let pipeline_close = close.clone();
    let pipeline = tokio::spawn(async move {
        orchestrator.run(audio_rx, events_tx, &pipeline_close).await
    });

    let writer = tokio::spawn(async move {
        while let Some(event) = events_rx.recv().await {
            let frame = StreamFrame::from(event);
            let text = match serde_json::to_string(&frame) {
                Ok(text) => text,
                Err(e) => {
                    warn!("Failed to encode stream frame: {}", e);
                    continue;
                }
            };
            // a send failure means the client went away
            if socket_tx.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(frame) = socket_rx.next().await {
        match frame {
            Ok(Message::Binary(data)) => {
                if audio_tx.send(data.to_vec()).await.is_err() {
                    break;
                }
            }
            Ok(Message::Close(_)) | Err(_) => break,
            Ok(_) => {}
        }
    }
    // the token ends intake even when it is blocked behind a full fan-out;
    // the orchestrator then applies its close policy to submitted chunks
    close.cancel();
    drop(audio_tx);

    if let Err(e) = pipeline.await {
        warn!("Streaming pipeline task failed: {}", e);
    }
    if let Err(e) = writer.await {
        warn!("Stream writer task failed: {}", e);
    }
    debug!("Streaming session closed");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transcript_frame_shape() {
        let frame = StreamFrame::from(ChunkEvent::Transcript {
            seq: 3,
            text: "hello".to_string(),
        });
        let json = serde_json::to_value(&frame).unwrap();
        assert_eq!(json, serde_json::json!({"seq": 3, "transcript": "hello"}));
    }

    #[test]
    fn test_error_frame_shape() {
        let frame = StreamFrame::from(ChunkEvent::Error {
            seq: 0,
            kind: "provider_failed",
            message: "audio too short".to_string(),
        });
        let json = serde_json::to_value(&frame).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "seq": 0,
                "error": {"kind": "provider_failed", "message": "audio too short"}
            })
        );
    }
}
