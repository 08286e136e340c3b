//! Wait-until-terminal polling for transcription jobs.
//!
//! The provider only answers point-in-time status queries; the poller turns
//! those into "wait for the transcript", with a wall-clock budget, bounded
//! tolerance for transport hiccups, and cooperative cancellation.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::TranscriptionSettings;
use crate::error::{ReferentError, Result};
use crate::provider::{TranscriptStatus, TranscriptionProvider};

/// Poller tuning knobs.
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Interval between status checks.
    pub interval: Duration,
    /// Wall-clock budget for reaching a terminal state.
    pub max_wait: Duration,
    /// Consecutive transport failures tolerated before the error surfaces.
    pub max_status_retries: u32,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(3),
            max_wait: Duration::from_secs(600),
            max_status_retries: 3,
        }
    }
}

impl From<&TranscriptionSettings> for PollerConfig {
    fn from(settings: &TranscriptionSettings) -> Self {
        Self {
            interval: settings.poll_interval(),
            max_wait: settings.max_wait(),
            max_status_retries: settings.max_status_retries,
        }
    }
}

/// Drives one job's repeated status checks to a terminal outcome.
pub struct Poller {
    provider: Arc<dyn TranscriptionProvider>,
    config: PollerConfig,
}

impl Poller {
    /// Create a poller over the given provider.
    pub fn new(provider: Arc<dyn TranscriptionProvider>, config: PollerConfig) -> Self {
        Self { provider, config }
    }

    /// Poll until the job completes, fails, times out, or is cancelled.
    ///
    /// Returns the transcript on completion. Every other outcome is an error:
    /// `ProviderFailed` with the provider's detail, `TimedOut` when the wait
    /// budget runs out, `Cancelled` within one interval of the token firing,
    /// or `StatusQuery` once more than `max_status_retries` consecutive
    /// transport failures pile up (the counter resets on any answered query).
    pub async fn wait_for_transcript(
        &self,
        transcript_id: &str,
        cancel: &CancellationToken,
    ) -> Result<String> {
        let started = Instant::now();
        let mut consecutive_failures: u32 = 0;

        loop {
            if cancel.is_cancelled() {
                return Err(ReferentError::Cancelled);
            }

            match self.provider.get_status(transcript_id).await {
                Ok(TranscriptStatus::Completed { transcript }) => {
                    debug!(
                        "Transcript {} completed after {:?}",
                        transcript_id,
                        started.elapsed()
                    );
                    return Ok(transcript);
                }
                Ok(TranscriptStatus::Failed { reason }) => {
                    return Err(ReferentError::ProviderFailed(reason));
                }
                Ok(status) => {
                    consecutive_failures = 0;
                    debug!("Transcript {} is {:?}", transcript_id, status);
                }
                Err(e @ ReferentError::StatusQuery(_)) => {
                    consecutive_failures += 1;
                    if consecutive_failures > self.config.max_status_retries {
                        return Err(e);
                    }
                    warn!(
                        "Status check for {} failed ({}/{}): {}",
                        transcript_id, consecutive_failures, self.config.max_status_retries, e
                    );
                }
                Err(e) => return Err(e),
            }

            // never sleep past the budget
            if started.elapsed() + self.config.interval >= self.config.max_wait {
                return Err(ReferentError::TimedOut(self.config.max_wait.as_secs()));
            }

            tokio::select! {
                _ = cancel.cancelled() => return Err(ReferentError::Cancelled),
                _ = tokio::time::sleep(self.config.interval) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{ScriptStep, ScriptedProvider};

    fn fast_config() -> PollerConfig {
        PollerConfig {
            interval: Duration::from_millis(10),
            max_wait: Duration::from_secs(5),
            max_status_retries: 3,
        }
    }

    fn poller_with(script: Vec<ScriptStep>, config: PollerConfig) -> (Arc<ScriptedProvider>, Poller) {
        let provider = Arc::new(ScriptedProvider::new());
        provider.insert_job("t-1", script);
        let poller = Poller::new(provider.clone(), config);
        (provider, poller)
    }

    #[tokio::test]
    async fn test_returns_transcript_on_nth_poll() {
        let (provider, poller) = poller_with(
            vec![
                ScriptStep::queued(),
                ScriptStep::processing(),
                ScriptStep::completed("hello world"),
            ],
            fast_config(),
        );

        let cancel = CancellationToken::new();
        let transcript = poller.wait_for_transcript("t-1", &cancel).await.unwrap();

        assert_eq!(transcript, "hello world");
        assert_eq!(provider.status_calls("t-1"), 3);
    }

    #[tokio::test]
    async fn test_provider_failure_surfaces_detail() {
        let (_, poller) = poller_with(
            vec![ScriptStep::processing(), ScriptStep::failed("audio too short")],
            fast_config(),
        );

        let cancel = CancellationToken::new();
        let err = poller.wait_for_transcript("t-1", &cancel).await.unwrap_err();

        assert_eq!(err.kind(), "provider_failed");
        assert!(err.to_string().contains("audio too short"));
    }

    #[tokio::test]
    async fn test_times_out_when_provider_never_finishes() {
        let config = PollerConfig {
            interval: Duration::from_millis(10),
            max_wait: Duration::from_millis(60),
            max_status_retries: 3,
        };
        let (provider, poller) = poller_with(vec![ScriptStep::processing()], config);

        let cancel = CancellationToken::new();
        let started = Instant::now();
        let err = poller.wait_for_transcript("t-1", &cancel).await.unwrap_err();

        assert_eq!(err.kind(), "timed_out");
        assert!(started.elapsed() < Duration::from_secs(2));
        assert!(provider.status_calls("t-1") > 1);
    }

    #[tokio::test]
    async fn test_cancellation_interrupts_the_wait() {
        let (_, poller) = poller_with(vec![ScriptStep::processing()], fast_config());

        let cancel = CancellationToken::new();
        let handle = {
            let cancel = cancel.clone();
            tokio::spawn(async move { poller.wait_for_transcript("t-1", &cancel).await })
        };

        tokio::time::sleep(Duration::from_millis(25)).await;
        cancel.cancel();

        let err = handle.await.unwrap().unwrap_err();
        assert_eq!(err.kind(), "cancelled");
    }

    #[tokio::test]
    async fn test_transport_failures_surface_after_retries() {
        let config = PollerConfig {
            max_status_retries: 2,
            ..fast_config()
        };
        let (provider, poller) = poller_with(
            vec![
                ScriptStep::TransportError,
                ScriptStep::TransportError,
                ScriptStep::TransportError,
            ],
            config,
        );

        let cancel = CancellationToken::new();
        let err = poller.wait_for_transcript("t-1", &cancel).await.unwrap_err();

        assert_eq!(err.kind(), "status_query_error");
        // two retries allowed, the third consecutive failure surfaces
        assert_eq!(provider.status_calls("t-1"), 3);
    }

    #[tokio::test]
    async fn test_retry_counter_resets_on_answered_query() {
        let config = PollerConfig {
            max_status_retries: 2,
            ..fast_config()
        };
        let (_, poller) = poller_with(
            vec![
                ScriptStep::TransportError,
                ScriptStep::TransportError,
                ScriptStep::processing(),
                ScriptStep::TransportError,
                ScriptStep::TransportError,
                ScriptStep::completed("ok"),
            ],
            config,
        );

        let cancel = CancellationToken::new();
        let transcript = poller.wait_for_transcript("t-1", &cancel).await.unwrap();
        assert_eq!(transcript, "ok");
    }
}
