//! Fixed-output summarizer.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use super::Summarizer;
use crate::error::{ReferentError, Result};

/// Summarizer that returns a canned summary.
///
/// Used by tests and by scripted mode, where no summarizer credentials exist.
pub struct FixedSummarizer {
    summary: String,
    fail: AtomicBool,
    calls: AtomicUsize,
}

impl FixedSummarizer {
    /// Create a summarizer that always answers with `summary`.
    pub fn new(summary: &str) -> Self {
        Self {
            summary: summary.to_string(),
            fail: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        }
    }

    /// Make every summarize call fail with a `Summarization` error.
    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Number of summarize calls received.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Summarizer for FixedSummarizer {
    async fn summarize(&self, _transcript: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(ReferentError::Summarization(
                "scripted summarizer failure".to_string(),
            ));
        }
        Ok(self.summary.clone())
    }
}
