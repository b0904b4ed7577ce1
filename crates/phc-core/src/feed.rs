//! Server-sent event transport for the metadata feed.
//!
//! [`SseParser`] turns raw bytes into events; [`FeedSubscription`] owns the
//! HTTP connection and reconnects on its own after drops, reporting
//! `Open` / `Message` / `Error` to the UI loop.

use std::time::Duration;

use futures_util::StreamExt;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("feed request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("feed returned status {0}")]
    Status(reqwest::StatusCode),
    #[error("feed stream ended")]
    Ended,
}

/// What the subscription reports to its consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedEvent {
    Open,
    /// `data` of one `message` event.
    Message(String),
    Error(String),
}

/// One dispatched SSE event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    pub event: String,
    pub data: String,
    pub id: Option<String>,
}

/// Incremental `text/event-stream` parser. Chunks may split anywhere,
/// including inside a UTF-8 sequence.
#[derive(Debug, Default)]
pub struct SseParser {
    buf: Vec<u8>,
    event: String,
    data: String,
    last_id: Option<String>,
    retry: Option<Duration>,
}

impl SseParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reconnect delay requested by the server, if any.
    pub fn retry(&self) -> Option<Duration> {
        self.retry
    }

    pub fn last_event_id(&self) -> Option<&str> {
        self.last_id.as_deref()
    }

    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        self.buf.extend_from_slice(chunk);
        let mut out = Vec::new();

        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let mut line: Vec<u8> = self.buf.drain(..=pos).collect();
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            let line = String::from_utf8_lossy(&line).into_owned();
            if let Some(ev) = self.process_line(&line) {
                out.push(ev);
            }
        }
        out
    }

    fn process_line(&mut self, line: &str) -> Option<SseEvent> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((f, v)) => (f, v.strip_prefix(' ').unwrap_or(v)),
            None => (line, ""),
        };

        match field {
            "event" => self.event = value.to_string(),
            "data" => {
                self.data.push_str(value);
                self.data.push('\n');
            }
            "id" if !value.contains('\0') => self.last_id = Some(value.to_string()),
            "retry" => {
                if let Ok(ms) = value.parse::<u64>() {
                    self.retry = Some(Duration::from_millis(ms));
                }
            }
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<SseEvent> {
        let event = std::mem::take(&mut self.event);
        if self.data.is_empty() {
            return None;
        }
        let mut data = std::mem::take(&mut self.data);
        data.pop();
        Some(SseEvent {
            event: if event.is_empty() {
                "message".to_string()
            } else {
                event
            },
            data,
            id: self.last_id.clone(),
        })
    }
}

/// A live feed connection. Dropping or closing it stops the task and any
/// pending reconnect.
#[derive(Debug)]
pub struct FeedSubscription {
    task: JoinHandle<()>,
}

impl FeedSubscription {
    /// Start the subscription. Events are converted into the consumer's
    /// message type; the task stops once the receiver is gone.
    pub fn spawn<T>(url: String, reconnect: Duration, tx: mpsc::Sender<T>) -> Self
    where
        T: From<FeedEvent> + Send + 'static,
    {
        let task = tokio::spawn(run_feed(url, reconnect, tx));
        Self { task }
    }

    pub fn close(self) {
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for FeedSubscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run_feed<T>(url: String, reconnect: Duration, tx: mpsc::Sender<T>)
where
    T: From<FeedEvent> + Send + 'static,
{
    let client = match reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .build()
    {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("feed: failed to build HTTP client: {}", e);
            let _ = tx.send(FeedEvent::Error(e.to_string()).into()).await;
            return;
        }
    };

    let mut parser = SseParser::new();
    let mut delay = reconnect;

    loop {
        tracing::info!("feed: connecting to {}", url);
        let result = stream_once(&client, &url, &mut parser, &tx).await;
        if tx.is_closed() {
            tracing::debug!("feed: consumer gone, stopping");
            return;
        }

        let err = match result {
            Ok(()) => FeedError::Ended,
            Err(e) => e,
        };
        tracing::warn!("feed: {} (reconnecting in {:?})", err, delay);
        if tx.send(FeedEvent::Error(err.to_string()).into()).await.is_err() {
            return;
        }

        if let Some(server_delay) = parser.retry() {
            delay = server_delay;
        }
        tokio::time::sleep(delay).await;
        // Partial event from the dropped connection must not leak.
        let last_id = parser.last_event_id().map(str::to_string);
        parser = SseParser::new();
        parser.last_id = last_id;
    }
}

async fn stream_once<T>(
    client: &reqwest::Client,
    url: &str,
    parser: &mut SseParser,
    tx: &mpsc::Sender<T>,
) -> Result<(), FeedError>
where
    T: From<FeedEvent> + Send + 'static,
{
    let mut req = client
        .get(url)
        .header("Accept", "text/event-stream")
        .header("Cache-Control", "no-cache");
    if let Some(id) = parser.last_event_id() {
        req = req.header("Last-Event-ID", id);
    }

    let response = req.send().await?;
    if !response.status().is_success() {
        return Err(FeedError::Status(response.status()));
    }

    if tx.send(FeedEvent::Open.into()).await.is_err() {
        return Ok(());
    }

    let mut body = response.bytes_stream();
    while let Some(chunk) = body.next().await {
        let chunk = chunk?;
        for ev in parser.feed(&chunk) {
            if ev.event != "message" {
                tracing::trace!("feed: ignoring {:?} event", ev.event);
                continue;
            }
            if tx.send(FeedEvent::Message(ev.data).into()).await.is_err() {
                return Ok(());
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_event() {
        let mut p = SseParser::new();
        let evs = p.feed(b"data: {\"streamTitle\":\"A - B\"}\n\n");
        assert_eq!(evs.len(), 1);
        assert_eq!(evs[0].event, "message");
        assert_eq!(evs[0].data, r#"{"streamTitle":"A - B"}"#);
    }

    #[test]
    fn test_multiline_data_and_comments() {
        let mut p = SseParser::new();
        let evs = p.feed(b": keepalive\ndata: one\ndata: two\n\n");
        assert_eq!(evs.len(), 1);
        assert_eq!(evs[0].data, "one\ntwo");
    }

    #[test]
    fn test_crlf_and_split_chunks() {
        let mut p = SseParser::new();
        assert!(p.feed(b"data: hel").is_empty());
        assert!(p.feed(b"lo\r").is_empty());
        let evs = p.feed(b"\n\r\n");
        assert_eq!(evs.len(), 1);
        assert_eq!(evs[0].data, "hello");
    }

    #[test]
    fn test_split_utf8() {
        let mut p = SseParser::new();
        let bytes = "data: Beyoncé\n\n".as_bytes();
        let cut = bytes.iter().position(|&b| b == 0xC3).unwrap() + 1;
        assert!(p.feed(&bytes[..cut]).is_empty());
        let evs = p.feed(&bytes[cut..]);
        assert_eq!(evs[0].data, "Beyoncé");
    }

    #[test]
    fn test_event_type_id_and_retry() {
        let mut p = SseParser::new();
        let evs = p.feed(b"retry: 1500\nid: 7\nevent: ping\ndata: x\n\ndata: y\n\n");
        assert_eq!(p.retry(), Some(Duration::from_millis(1500)));
        assert_eq!(evs[0].event, "ping");
        assert_eq!(evs[0].id.as_deref(), Some("7"));
        assert_eq!(evs[1].event, "message");
        assert_eq!(p.last_event_id(), Some("7"));
    }

    #[test]
    fn test_blank_line_without_data_dispatches_nothing() {
        let mut p = SseParser::new();
        assert!(p.feed(b"event: x\n\n\n").is_empty());
        // The event type does not carry over to the next block.
        let evs = p.feed(b"data: z\n\n");
        assert_eq!(evs[0].event, "message");
    }

    #[test]
    fn test_invalid_retry_ignored() {
        let mut p = SseParser::new();
        p.feed(b"retry: soon\n\n");
        assert_eq!(p.retry(), None);
    }
}
