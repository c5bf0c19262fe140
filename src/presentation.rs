//! Simulated latency for interactive output.
//!
//! The engine computes results synchronously; [`DelayedReveal`] only holds
//! a finished result back for a configured time so the CLI can mimic the
//! dashboard's "running diagnostics" pause.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::config::PresentationConfig;

/// Cancellable delay before handing over a finished result
#[derive(Debug, Clone)]
pub struct DelayedReveal {
    delay: Duration,
    cancel: CancellationToken,
}

impl DelayedReveal {
    pub fn new(delay: Duration, cancel: CancellationToken) -> Self {
        Self { delay, cancel }
    }

    pub fn from_config(config: &PresentationConfig, cancel: CancellationToken) -> Self {
        Self::new(Duration::from_millis(config.reveal_delay_ms), cancel)
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Wait out the delay, then return `value`.
    ///
    /// Returns `None` if the token is cancelled first; the value is dropped.
    pub async fn reveal<T>(&self, value: T) -> Option<T> {
        if self.cancel.is_cancelled() {
            return None;
        }
        if self.delay.is_zero() {
            return Some(value);
        }

        debug!("Revealing result in {:?}", self.delay);
        tokio::select! {
            _ = self.cancel.cancelled() => {
                debug!("Reveal cancelled");
                None
            }
            _ = tokio::time::sleep(self.delay) => Some(value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_zero_delay_is_immediate() {
        let reveal = DelayedReveal::from_config(
            &PresentationConfig::default(),
            CancellationToken::new(),
        );
        assert!(reveal.delay().is_zero());
        assert_eq!(reveal.reveal(42).await, Some(42));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reveal_after_delay() {
        let reveal = DelayedReveal::new(Duration::from_millis(800), CancellationToken::new());
        let start = tokio::time::Instant::now();
        assert_eq!(reveal.reveal("report").await, Some("report"));
        assert!(start.elapsed() >= Duration::from_millis(800));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_drops_result() {
        let token = CancellationToken::new();
        let reveal = DelayedReveal::new(Duration::from_secs(60), token.clone());

        let handle = tokio::spawn(async move { reveal.reveal(1).await });
        tokio::task::yield_now().await;
        token.cancel();
        assert_eq!(handle.await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_already_cancelled() {
        let token = CancellationToken::new();
        token.cancel();
        let reveal = DelayedReveal::new(Duration::ZERO, token);
        assert_eq!(reveal.reveal(1).await, None);
    }
}
