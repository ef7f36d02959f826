use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::trace;

/// Shared flag for aborting an in-flight run, checked at every suspension point.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cancelled;

/// Yields to the scheduler for `duration`.
///
/// Returns `Err(Cancelled)` if the token was cancelled before or during the pause.
pub(crate) async fn pause(duration: Duration, cancel: &CancelToken) -> Result<(), Cancelled> {
    if cancel.is_cancelled() {
        return Err(Cancelled);
    }

    if duration.is_zero() {
        tokio::task::yield_now().await;
    } else {
        trace!("Pausing. duration: {:?}", duration);
        tokio::time::sleep(duration).await;
    }

    match cancel.is_cancelled() {
        true => Err(Cancelled),
        false => Ok(()),
    }
}

#[cfg(test)]
mod pause_tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn pause_completes_when_not_cancelled() {
        let cancel = CancelToken::new();
        assert_eq!(pause(Duration::from_millis(50), &cancel).await, Ok(()));
    }

    #[tokio::test(start_paused = true)]
    async fn pause_reports_cancellation() {
        // given
        let cancel = CancelToken::new();
        let clone = cancel.clone();

        // when
        clone.cancel();

        // then
        assert_eq!(pause(Duration::from_millis(50), &cancel).await, Err(Cancelled));
    }
}
