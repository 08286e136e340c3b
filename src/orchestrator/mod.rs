//! Pipeline orchestrators for Referent.
//!
//! `BatchOrchestrator` runs the one-shot upload flow (upload, poll,
//! summarize); `StreamOrchestrator` runs the per-chunk streaming flow. Both
//! drive the same provider client and poller.

mod batch;
mod stream;

pub use batch::{BatchOrchestrator, JobResult, JobSnapshot};
pub use stream::{Chunk, ChunkEvent, StreamOrchestrator};
