//! SSE streaming infrastructure for provider adapters.
//!
//! Receive a `reqwest::Response`, buffer chunks, split on `\n\n`, extract
//! `data:` payloads, and feed each payload to a provider-specific parser that
//! returns `Vec<Result<ModelDelta>>`.
//!
//! - [`drain_data_lines`] -- pull complete `data:` payloads from an SSE buffer
//! - [`sse_response_stream`] -- build a `BoxStream` from a response + parser closure

use std::time::Duration;

use crate::util::from_reqwest;
use wf_domain::error::{Error, Result};
use wf_domain::stream::{BoxStream, FinishReason, ModelDelta};
use wf_domain::text::Utf8Decoder;

/// Extract complete `data:` payloads from an SSE buffer.
///
/// SSE events are delimited by `\n\n`. Each event block may contain
/// `event:`, `data:`, `id:`, or `retry:` lines. We only care about
/// `data:` lines.
///
/// The buffer is drained in-place: consumed bytes are removed and any
/// trailing partial event remains for the next call.
pub(crate) fn drain_data_lines(buffer: &mut String) -> Vec<String> {
    let mut data_lines = Vec::new();

    while let Some(pos) = buffer.find("\n\n") {
        let block: String = buffer.drain(..pos).collect();
        buffer.drain(..2); // remove the \n\n delimiter

        for line in block.lines() {
            let line = line.trim();
            if let Some(data) = line.strip_prefix("data:") {
                let data = data.trim();
                if !data.is_empty() {
                    data_lines.push(data.to_string());
                }
            }
        }
    }

    data_lines
}

/// Build a [`BoxStream`] from an SSE `reqwest::Response` and a provider-specific
/// parser closure.
///
/// The stream:
/// 1. Buffers incoming chunks and drains complete SSE events
/// 2. Flushes the remaining buffer when the response body closes
/// 3. Emits at most one `Finish`, synthesizing `Finish(Stop)` when the body
///    closes without one
/// 4. Fails with [`Error::Timeout`] when `idle_timeout` elapses between chunks
pub(crate) fn sse_response_stream<F>(
    response: reqwest::Response,
    provider_id: String,
    idle_timeout: Option<Duration>,
    mut parse_data: F,
) -> BoxStream<'static, Result<ModelDelta>>
where
    F: FnMut(&str) -> Vec<Result<ModelDelta>> + Send + 'static,
{
    let stream = async_stream::stream! {
        let mut response = response;
        let mut decoder = Utf8Decoder::new();
        let mut buffer = String::new();
        let mut finished = false;

        loop {
            let next = match idle_timeout {
                Some(limit) => match tokio::time::timeout(limit, response.chunk()).await {
                    Ok(r) => r,
                    Err(_) => {
                        tracing::warn!(
                            provider = %provider_id,
                            idle_ms = u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
                            "model stream idle timeout"
                        );
                        yield Err(Error::Timeout(format!(
                            "no data from {provider_id} for {} ms",
                            limit.as_millis()
                        )));
                        return;
                    }
                },
                None => response.chunk().await,
            };

            match next {
                Ok(Some(bytes)) => {
                    // Carriage returns are dropped so only `\n\n` delimits events.
                    buffer.push_str(&decoder.push(&bytes).replace('\r', ""));

                    for data in drain_data_lines(&mut buffer) {
                        for delta in parse_data(&data) {
                            if matches!(&delta, Ok(ModelDelta::Finish(_))) {
                                if finished {
                                    continue;
                                }
                                finished = true;
                            }
                            yield delta;
                        }
                    }
                }
                Ok(None) => {
                    // Stream ended -- flush any remaining partial event.
                    buffer.push_str(&decoder.finish().replace('\r', ""));
                    if !buffer.trim().is_empty() {
                        buffer.push_str("\n\n");
                        for data in drain_data_lines(&mut buffer) {
                            for delta in parse_data(&data) {
                                if matches!(&delta, Ok(ModelDelta::Finish(_))) {
                                    if finished {
                                        continue;
                                    }
                                    finished = true;
                                }
                                yield delta;
                            }
                        }
                    }
                    break;
                }
                Err(e) => {
                    yield Err(from_reqwest(e));
                    return;
                }
            }
        }

        if !finished {
            yield Ok(ModelDelta::Finish(FinishReason::Stop));
        }
    };

    Box::pin(stream)
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
