//! Forwarding provider output to the caller under a deadline.

use std::time::Duration;

use futures::StreamExt;
use futures::stream::BoxStream;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::providers::TextStream;

/// One event on the way to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayEvent {
    /// A text chunk, exactly as the provider produced it.
    Delta(String),
    /// Terminal failure. Deltas already sent stay valid.
    Failed(String),
    /// Terminal success.
    Done,
}

impl RelayEvent {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RelayEvent::Delta(_))
    }
}

pub type RelayStream = BoxStream<'static, RelayEvent>;

/// Relay `upstream` chunk by chunk until it ends, fails, or `deadline` passes.
///
/// Every relay ends with exactly one terminal event. Nothing is buffered
/// and nothing is retried.
pub fn relay(mut upstream: TextStream, deadline: Instant, timeout: Duration) -> RelayStream {
    Box::pin(async_stream::stream! {
        let mut chunks = 0usize;
        loop {
            match tokio::time::timeout_at(deadline, upstream.next()).await {
                Ok(Some(Ok(text))) => {
                    chunks += 1;
                    yield RelayEvent::Delta(text);
                }
                Ok(Some(Err(e))) => {
                    warn!(chunks, error = %e, "provider stream failed");
                    yield RelayEvent::Failed(e.to_string());
                    return;
                }
                Ok(None) => {
                    debug!(chunks, "provider stream complete");
                    yield RelayEvent::Done;
                    return;
                }
                Err(_) => {
                    warn!(chunks, timeout_secs = timeout.as_secs(), "review deadline exceeded");
                    yield RelayEvent::Failed(super::ReviewError::Timeout(timeout.as_secs()).to_string());
                    return;
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProviderName;
    use crate::providers::ProviderError;

    fn far() -> Instant {
        Instant::now() + Duration::from_secs(60)
    }

    async fn collect(stream: RelayStream) -> Vec<RelayEvent> {
        stream.collect().await
    }

    #[tokio::test]
    async fn forwards_chunks_in_order_then_done() {
        let upstream: TextStream = Box::pin(futures::stream::iter(
            ["a", "b", "c"].map(|s| Ok::<_, ProviderError>(s.to_string())),
        ));
        let events = collect(relay(upstream, far(), Duration::from_secs(60))).await;
        assert_eq!(
            events,
            vec![
                RelayEvent::Delta("a".to_string()),
                RelayEvent::Delta("b".to_string()),
                RelayEvent::Delta("c".to_string()),
                RelayEvent::Done,
            ]
        );
    }

    #[tokio::test]
    async fn mid_stream_error_keeps_prior_chunks_and_stops() {
        let upstream: TextStream = Box::pin(futures::stream::iter(vec![
            Ok("partial".to_string()),
            Err(ProviderError::Stream {
                provider: ProviderName::Gemini,
                message: "connection reset".to_string(),
            }),
            Ok("never".to_string()),
        ]));
        let events = collect(relay(upstream, far(), Duration::from_secs(60))).await;
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], RelayEvent::Delta("partial".to_string()));
        assert!(matches!(&events[1], RelayEvent::Failed(m) if m.contains("connection reset")));
    }

    #[tokio::test]
    async fn deadline_ends_a_stalled_stream() {
        let upstream: TextStream = Box::pin(
            futures::stream::iter(vec![Ok::<_, ProviderError>("first".to_string())])
                .chain(futures::stream::pending()),
        );
        let timeout = Duration::from_millis(50);
        let events = collect(relay(upstream, Instant::now() + timeout, timeout)).await;
        assert_eq!(events[0], RelayEvent::Delta("first".to_string()));
        assert!(matches!(&events[1], RelayEvent::Failed(m) if m.contains("timed out")));
        assert_eq!(events.len(), 2);
    }

    #[tokio::test]
    async fn exactly_one_terminal_event() {
        let upstream: TextStream =
            Box::pin(futures::stream::empty::<Result<String, ProviderError>>());
        let events = collect(relay(upstream, far(), Duration::from_secs(1))).await;
        assert_eq!(events.iter().filter(|e| e.is_terminal()).count(), 1);
    }
}
