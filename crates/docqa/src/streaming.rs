//! SSE relay with model attribution
//!
//! Upstream server-sent-event frames are forwarded verbatim. Exactly one
//! synthetic frame naming the generating model is injected per stream:
//! before the terminal `data: [DONE]` frame when one arrives, otherwise at
//! stream end. The model id is scraped from the first frame exposing a
//! `model` field.

use bytes::Bytes;
use futures_util::stream::{self, StreamExt};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::generation::{self, UNKNOWN_MODEL};
use crate::providers::EventByteStream;

static MODEL_FIELD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""model"\s*:\s*"([^"]+)""#).unwrap());

static DONE_FRAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*data:\s*\[DONE\]").unwrap());

/// Frame terminator in the upstream SSE wire format
const FRAME_END: &[u8] = b"\n\n";

/// Stateful frame splitter and attribution injector
pub struct AttributionRelay {
    buffer: Vec<u8>,
    model: Option<String>,
    injected: bool,
}

impl AttributionRelay {
    pub fn new() -> Self {
        Self {
            buffer: Vec::new(),
            model: None,
            injected: false,
        }
    }

    /// Feed upstream bytes, returning every frame now ready to forward.
    /// Incomplete frames stay buffered until their terminator arrives.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<Bytes> {
        self.buffer.extend_from_slice(chunk);

        let mut out = Vec::new();
        while let Some(end) = find_frame_end(&self.buffer) {
            let frame: Vec<u8> = self.buffer.drain(..end).collect();
            let text = String::from_utf8_lossy(&frame);

            if self.model.is_none() {
                if let Some(captures) = MODEL_FIELD.captures(&text) {
                    self.model = Some(captures[1].to_string());
                }
            }

            if !self.injected && DONE_FRAME.is_match(&text) {
                out.push(self.attribution_frame());
                self.injected = true;
            }
            out.push(Bytes::from(frame));
        }
        out
    }

    /// Flush trailing bytes and guarantee the attribution frame went out.
    pub fn finish(&mut self) -> Vec<Bytes> {
        let mut out = Vec::new();
        if !self.buffer.is_empty() {
            out.push(Bytes::from(std::mem::take(&mut self.buffer)));
        }
        if !self.injected {
            out.push(self.attribution_frame());
            self.injected = true;
        }
        out
    }

    fn attribution_frame(&self) -> Bytes {
        let model = self.model.as_deref().unwrap_or(UNKNOWN_MODEL);
        let content = serde_json::to_string(&generation::model_attribution(model))
            .unwrap_or_else(|_| String::from("\"\""));
        Bytes::from(format!(
            "data: {{\"choices\":[{{\"delta\":{{\"content\":{}}},\"index\":0,\"finish_reason\":null}}]}}\n\n",
            content
        ))
    }
}

impl Default for AttributionRelay {
    fn default() -> Self {
        Self::new()
    }
}

fn find_frame_end(buffer: &[u8]) -> Option<usize> {
    buffer
        .windows(FRAME_END.len())
        .position(|window| window == FRAME_END)
        .map(|pos| pos + FRAME_END.len())
}

/// Wrap an upstream frame stream with the relay. An upstream error is
/// surfaced as-is and terminates the relayed stream without attribution.
pub fn relay_stream(upstream: EventByteStream) -> EventByteStream {
    let relay = AttributionRelay::new();
    stream::unfold(
        (upstream, relay, false),
        |(mut upstream, mut relay, finished)| async move {
            if finished {
                return None;
            }
            let (items, finished) = match upstream.next().await {
                Some(Ok(chunk)) => {
                    let frames = relay.push(&chunk);
                    (frames.into_iter().map(Ok).collect::<Vec<_>>(), false)
                }
                Some(Err(e)) => (vec![Err(e)], true),
                None => {
                    let frames = relay.finish();
                    (frames.into_iter().map(Ok).collect(), true)
                }
            };
            Some((stream::iter(items), (upstream, relay, finished)))
        },
    )
    .flatten()
    .boxed()
}
