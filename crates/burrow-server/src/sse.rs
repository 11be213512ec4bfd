//! Server-sent event streams for live logs and periodic status.
//!
//! Each stream yields plain payloads; [`into_sse`] wraps them as `data:`
//! events with no `event:` or `id:` fields. A stream ends when the client
//! disconnects and axum drops it, which also drops the hub subscription.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::response::sse::{Event, Sse};
use futures::stream::{self, Stream, StreamExt};
use tokio_stream::wrappers::IntervalStream;

use burrow_exec::Subscription;

use crate::metrics::MetricsProvider;

/// First event of the log stream.
pub const LOG_HELLO: &str = "Connected to log stream";

/// First event of the status stream.
pub const STATUS_HELLO: &str = "Connected to status stream";

/// Interval between status snapshots.
pub const STATUS_INTERVAL: Duration = Duration::from_secs(2);

/// Hello line followed by every line the subscription receives.
pub fn log_events(subscription: Subscription) -> impl Stream<Item = String> + Send {
    stream::once(async { LOG_HELLO.to_string() }).chain(subscription)
}

/// Hello line followed by a JSON snapshot on every tick of `period`.
pub fn status_events(
    metrics: Arc<dyn MetricsProvider>,
    period: Duration,
) -> impl Stream<Item = String> + Send {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    // The first tick completes immediately; skip it so snapshots start one
    // period after the hello.
    let ticks = IntervalStream::new(interval).skip(1);

    let snapshots = ticks.filter_map(move |_| {
        let metrics = Arc::clone(&metrics);
        async move {
            let status = tokio::task::spawn_blocking(move || metrics.snapshot())
                .await
                .ok()?;
            match serde_json::to_string(&status) {
                Ok(json) => Some(json),
                Err(err) => {
                    tracing::warn!(target: "sse", "cannot encode status: {err}");
                    None
                }
            }
        }
    });

    stream::once(async { STATUS_HELLO.to_string() }).chain(snapshots)
}

/// Wrap payloads as SSE `data:` events.
pub fn into_sse<S>(payloads: S) -> Sse<impl Stream<Item = Result<Event, Infallible>>>
where
    S: Stream<Item = String> + Send + 'static,
{
    Sse::new(payloads.map(|payload| Ok(Event::default().data(payload))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use burrow_exec::BroadcastHub;
    use std::path::Path;

    use crate::metrics::StaticMetrics;
    use burrow_scan::DiskUsage;

    #[tokio::test]
    async fn test_log_events_start_with_hello() {
        let hub = BroadcastHub::new();
        let events = log_events(hub.subscribe());
        hub.publish("cleaning caches");

        let first: Vec<String> = events.take(2).collect().await;
        assert_eq!(first, [LOG_HELLO, "cleaning caches"]);
    }

    #[tokio::test]
    async fn test_status_events_emit_json_snapshots() {
        let metrics: Arc<dyn MetricsProvider> =
            Arc::new(StaticMetrics::new(Path::new("/home/u"), DiskUsage::default()));
        let events = status_events(metrics, Duration::from_millis(10));

        let first: Vec<String> = events.take(3).collect().await;
        assert_eq!(first[0], STATUS_HELLO);
        for json in &first[1..] {
            let value: serde_json::Value = serde_json::from_str(json).unwrap();
            assert_eq!(value["home_dir"], "/home/u");
        }
    }
}
