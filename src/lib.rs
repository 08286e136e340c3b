//! Referent - Transcription and Summarization Relay
//!
//! Relays audio to a hosted speech-to-text provider, polls until the
//! transcript is ready, and optionally condenses it with an LLM summarizer.
//! Whole recordings run as batch jobs over plain HTTP; chunked audio streams
//! over a WebSocket with bounded concurrent fan-out.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - settings, prompts, and environment credentials
//! - `job` - job lifecycle state machine
//! - `provider` - transcription provider trait and clients
//! - `poller` - bounded, cancellable status polling
//! - `summarize` - LLM summarization behind a trait
//! - `orchestrator` - batch and streaming pipelines
//! - `server` - axum HTTP/WebSocket surface
//!
//! # Example
//!
//! ```rust,no_run
//! use referent::config::{Credentials, Settings};
//! use referent::orchestrator::BatchOrchestrator;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let credentials = Credentials::from_env()?;
//!     let orchestrator = BatchOrchestrator::from_settings(&settings, &credentials)?;
//!
//!     let audio = std::fs::read("meeting.wav")?;
//!     let id = orchestrator.start_job(audio, "audio/wav").await?;
//!     let result = orchestrator
//!         .get_result(&id, &CancellationToken::new())
//!         .await?;
//!     println!("{}", result.transcript);
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod job;
pub mod openai;
pub mod orchestrator;
pub mod poller;
pub mod provider;
pub mod server;
pub mod summarize;

pub use error::{ReferentError, Result};
