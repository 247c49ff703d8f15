//! Deferred best-effort CORS window cleanup
//!
//! A reap task is scheduled at credential-issue time and fires once after a
//! fixed delay, bounding how long the bucket policy stays relaxed when the
//! client never completes the upload. The success path cancels the task so a
//! completed upload does not pay for a wasteful late write.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Handle to a scheduled reap task
#[derive(Debug)]
pub struct ReapHandle {
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl ReapHandle {
    /// Cancels the pending reap without running its cleanup.
    ///
    /// Safe to call more than once and after the task has already fired.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Whether the reap task has finished, by firing or by cancellation
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Schedules `cleanup` to run once after `delay` unless cancelled first.
///
/// The cleanup future runs from a detached context, so it must handle its own
/// errors; store failures there are logged by the caller, never propagated.
pub fn schedule<F>(delay: Duration, cleanup: F) -> ReapHandle
where
    F: Future<Output = ()> + Send + 'static,
{
    let token = CancellationToken::new();
    let reap_token = token.clone();
    let task = tokio::spawn(async move {
        tokio::select! {
            () = reap_token.cancelled() => {
                debug!("reap cancelled; CORS window was closed by the success path");
            }
            () = tokio::time::sleep(delay) => cleanup.await,
        }
    });
    ReapHandle { token, task }
}
