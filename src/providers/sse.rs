//! Server-Sent Events decoding shared by the HTTP providers.

use eventsource_stream::Eventsource;
use futures::StreamExt;
use tracing::{trace, warn};

use crate::models::ProviderName;

use super::{ProviderError, TextStream};

/// What one provider event means for the relay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Frame {
    Text(String),
    Done,
    Blocked(String),
    Failed(String),
}

/// Turns one event's `data` payload into frames.
pub(crate) type Decoder = fn(&str) -> Result<Vec<Frame>, serde_json::Error>;

/// Adapt a streaming response into text deltas.
///
/// Events that fail to decode are logged and skipped. A transport error,
/// a provider-reported error, or a safety block ends the stream with one
/// error item. Connection close without an explicit end marker counts as
/// normal completion.
pub(crate) fn text_stream(
    provider: ProviderName,
    response: reqwest::Response,
    decode: Decoder,
) -> TextStream {
    let mut events = Box::pin(response.bytes_stream().eventsource());

    Box::pin(async_stream::stream! {
        while let Some(event) = events.next().await {
            let event = match event {
                Ok(event) => event,
                Err(e) => {
                    yield Err(ProviderError::Stream { provider, message: e.to_string() });
                    return;
                }
            };
            if event.data.trim().is_empty() {
                continue;
            }

            let frames = match decode(&event.data) {
                Ok(frames) => frames,
                Err(e) => {
                    warn!(%provider, error = %e, data = %event.data, "skipping undecodable stream event");
                    continue;
                }
            };

            for frame in frames {
                match frame {
                    Frame::Text(text) if text.is_empty() => {}
                    Frame::Text(text) => {
                        trace!(%provider, bytes = text.len(), "delta");
                        yield Ok(text);
                    }
                    Frame::Done => return,
                    Frame::Blocked(reason) => {
                        yield Err(ProviderError::Blocked { provider, reason });
                        return;
                    }
                    Frame::Failed(message) => {
                        yield Err(ProviderError::Stream { provider, message });
                        return;
                    }
                }
            }
        }
    })
}
