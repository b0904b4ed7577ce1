//! Metadata feed lifecycle: one subscription while playing, none while paused.

use std::time::Duration;

use phc_core::feed::{FeedEvent, FeedSubscription};
use tokio::sync::mpsc;
use tracing::info;

#[derive(Debug)]
pub struct FeedLink {
    url: String,
    reconnect: Duration,
    sub: Option<FeedSubscription>,
}

impl FeedLink {
    pub fn new(url: impl Into<String>, reconnect: Duration) -> Self {
        Self {
            url: url.into(),
            reconnect,
            sub: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.sub.is_some()
    }

    /// Open a fresh subscription, closing any previous one first.
    pub fn open<T>(&mut self, tx: mpsc::Sender<T>)
    where
        T: From<FeedEvent> + Send + 'static,
    {
        self.close();
        info!("feed: subscribing to {}", self.url);
        self.sub = Some(FeedSubscription::spawn(self.url.clone(), self.reconnect, tx));
    }

    pub fn close(&mut self) {
        if let Some(sub) = self.sub.take() {
            info!("feed: closing subscription");
            sub.close();
        }
    }
}

impl Drop for FeedLink {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_close_reopen() {
        // Nothing listens on port 1; the task just loops on connect errors.
        let mut link = FeedLink::new("http://127.0.0.1:1/sse", Duration::from_millis(20));
        let (tx, mut rx) = mpsc::channel::<FeedEvent>(16);

        assert!(!link.is_open());
        link.open(tx.clone());
        assert!(link.is_open());
        assert!(matches!(rx.recv().await, Some(FeedEvent::Error(_))));

        link.close();
        assert!(!link.is_open());
        link.close();

        link.open(tx);
        assert!(link.is_open());
        assert!(matches!(rx.recv().await, Some(FeedEvent::Error(_))));
    }

    #[tokio::test]
    async fn test_close_drops_sender() {
        let mut link = FeedLink::new("http://127.0.0.1:1/sse", Duration::from_secs(60));
        let (tx, mut rx) = mpsc::channel::<FeedEvent>(16);
        link.open(tx);
        link.close();
        // Aborted task drops its sender; the channel drains then ends.
        while rx.recv().await.is_some() {}
    }
}
