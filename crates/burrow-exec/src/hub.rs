//! Fan-out distribution of log lines to live subscribers and a log file.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::task::{Context, Poll};

use dashmap::DashMap;
use futures::Stream;
use tokio::sync::mpsc::{self, error::TrySendError};

/// Lines buffered per subscriber before new lines are dropped for it.
pub const SUBSCRIBER_CAPACITY: usize = 100;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Default log file location (`<cache_dir>/Mole/web-ui.log`).
pub fn default_log_path() -> Option<PathBuf> {
    dirs::cache_dir().map(|dir| dir.join("Mole").join("web-ui.log"))
}

/// Broadcasts log lines to every live subscriber.
///
/// Each subscriber owns a bounded queue. Publishing never waits: a full
/// queue loses the new line for that subscriber only, and queues whose
/// subscription was dropped are pruned. Every line is also appended to
/// the log file, when one is configured.
///
/// Cloning is cheap and every clone shares the same registry.
#[derive(Debug, Clone, Default)]
pub struct BroadcastHub {
    inner: Arc<HubInner>,
}

#[derive(Debug, Default)]
struct HubInner {
    subscribers: DashMap<u64, mpsc::Sender<String>>,
    next_id: AtomicU64,
    log_file: Option<LogFile>,
}

impl BroadcastHub {
    /// Create a hub that keeps no log file.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a hub that also appends every line to `path`.
    pub fn with_log_file(path: impl Into<PathBuf>) -> Self {
        Self {
            inner: Arc::new(HubInner {
                log_file: Some(LogFile::new(path.into())),
                ..Default::default()
            }),
        }
    }

    /// Path of the log file, if any.
    pub fn log_path(&self) -> Option<&Path> {
        self.inner.log_file.as_ref().map(|f| f.path.as_path())
    }

    /// Number of registered subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.len()
    }

    /// Register a new subscriber that receives every subsequent line.
    pub fn subscribe(&self) -> Subscription {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel(SUBSCRIBER_CAPACITY);
        self.inner.subscribers.insert(id, tx);
        tracing::debug!(target: "hub", "subscriber {id} registered");

        Subscription {
            id,
            rx,
            hub: Arc::downgrade(&self.inner),
        }
    }

    /// Deliver `line` to every subscriber without blocking.
    pub fn publish(&self, line: impl Into<String>) {
        let line = line.into();

        if let Some(file) = &self.inner.log_file {
            file.append(&line);
        }

        let mut closed = Vec::new();
        for subscriber in self.inner.subscribers.iter() {
            match subscriber.value().try_send(line.clone()) {
                Ok(()) | Err(TrySendError::Full(_)) => {}
                Err(TrySendError::Closed(_)) => closed.push(*subscriber.key()),
            }
        }
        // Removal must wait until the iteration guard is released.
        for id in closed {
            self.inner.subscribers.remove(&id);
        }
    }

    /// Emit `message` as an info event and publish it.
    pub fn log(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::info!(target: "hub", "{message}");
        self.publish(message);
    }
}

/// A live feed of published lines.
///
/// Dropping the subscription unregisters it.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    rx: mpsc::Receiver<String>,
    hub: Weak<HubInner>,
}

impl Subscription {
    /// Wait for the next line. Returns `None` once the hub is gone.
    pub async fn recv(&mut self) -> Option<String> {
        self.rx.recv().await
    }

    /// Take the next buffered line without waiting.
    pub fn try_recv(&mut self) -> Option<String> {
        self.rx.try_recv().ok()
    }
}

impl Stream for Subscription {
    type Item = String;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<String>> {
        self.rx.poll_recv(cx)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(hub) = self.hub.upgrade() {
            hub.subscribers.remove(&self.id);
            tracing::debug!(target: "hub", "subscriber {} dropped", self.id);
        }
    }
}

/// Append-only timestamped log file.
///
/// The file is opened on first use and the handle is kept for later lines.
#[derive(Debug)]
struct LogFile {
    path: PathBuf,
    file: Mutex<Option<File>>,
}

impl LogFile {
    fn new(path: PathBuf) -> Self {
        Self {
            path,
            file: Mutex::new(None),
        }
    }

    fn open(&self) -> std::io::Result<File> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        OpenOptions::new().create(true).append(true).open(&self.path)
    }

    /// Append `<timestamp> <line>`. Write failures are ignored.
    fn append(&self, line: &str) {
        let mut slot = self.file.lock().unwrap_or_else(PoisonError::into_inner);

        if slot.is_none() {
            match self.open() {
                Ok(file) => *slot = Some(file),
                Err(err) => {
                    tracing::debug!(target: "hub", "cannot open {}: {err}", self.path.display());
                    return;
                }
            }
        }
        let Some(file) = slot.as_mut() else {
            return;
        };

        let stamp = chrono::Local::now().format(TIMESTAMP_FORMAT);
        if writeln!(file, "{stamp} {line}").is_err() {
            // Reopen on the next line.
            *slot = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_without_subscribers() {
        let hub = BroadcastHub::new();
        hub.publish("nobody listening");
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[test]
    fn test_drop_unregisters() {
        let hub = BroadcastHub::new();
        let sub = hub.subscribe();
        assert_eq!(hub.subscriber_count(), 1);
        drop(sub);
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[test]
    fn test_lines_arrive_in_order() {
        let hub = BroadcastHub::new();
        let mut sub = hub.subscribe();
        hub.publish("one");
        hub.publish("two");
        assert_eq!(sub.try_recv().as_deref(), Some("one"));
        assert_eq!(sub.try_recv().as_deref(), Some("two"));
        assert_eq!(sub.try_recv(), None);
    }

    #[test]
    fn test_log_file_handle_is_reused() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("logs/web-ui.log");
        let moved = temp.path().join("moved.log");
        let hub = BroadcastHub::with_log_file(&path);

        hub.publish("first");
        fs::rename(&path, &moved).unwrap();
        hub.publish("second");

        assert!(!path.exists());
        let text = fs::read_to_string(&moved).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with(" first"));
        assert!(lines[1].ends_with(" second"));
    }

    #[test]
    fn test_full_queue_drops_newest() {
        let hub = BroadcastHub::new();
        let mut sub = hub.subscribe();
        for i in 0..SUBSCRIBER_CAPACITY + 5 {
            hub.publish(format!("line {i}"));
        }

        let mut received = Vec::new();
        while let Some(line) = sub.try_recv() {
            received.push(line);
        }
        assert_eq!(received.len(), SUBSCRIBER_CAPACITY);
        assert_eq!(received[0], "line 0");
        assert_eq!(received[SUBSCRIBER_CAPACITY - 1], format!("line {}", SUBSCRIBER_CAPACITY - 1));
    }
}
