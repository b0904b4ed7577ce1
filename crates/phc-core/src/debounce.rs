use std::future::Future;
use std::time::Duration;

use tokio::task::AbortHandle;

/// Runs only the most recently scheduled future, `delay` after it was
/// scheduled. Scheduling again, `cancel`, or dropping stops a future that is
/// still waiting out its delay. Once started, a future runs to completion on
/// its own task.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    pending: Option<AbortHandle>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn schedule<F>(&mut self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        let delay = self.delay;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            tokio::spawn(fut);
        });
        self.pending = Some(handle.abort_handle());
    }

    pub fn cancel(&mut self) {
        if let Some(h) = self.pending.take() {
            h.abort();
        }
    }

    /// True while a scheduled future is still waiting out its delay.
    pub fn is_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
