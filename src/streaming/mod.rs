//! Streaming decoder: raw byte chunks to canonical events.
//!
//! Vendors stream newline-delimited frames, usually SSE `data:` lines and
//! sometimes bare JSON lines. Lines are framed with [`LinesCodec`], which only
//! decodes UTF-8 once a whole line is buffered. The decoder is a synchronous
//! state machine
//! ([`StreamDecoder`]) fed from an async byte source by [`decode_stream`];
//! keeping the two apart lets the state machine be tested against every
//! possible chunk split without a network.

use std::time::Duration;

use bytes::BytesMut;
use futures_util::{Stream, StreamExt};
use serde_json::Value;
use tokio_util::codec::{Decoder, LinesCodec, LinesCodecError};

use crate::error::LlmError;
use crate::providers::ProviderId;
use crate::standards::{StreamAccumulator, WireFormat, map_frame};
use crate::types::{CompletionEvent, CompletionResponse, CompletionStream, ModelDescriptor};

/// End-of-stream sentinel shared by OpenAI-style vendors.
pub const DONE_MARKER: &str = "[DONE]";

/// One classified line.
#[derive(Debug, PartialEq)]
enum Line {
    Skip,
    Done,
    Frame(Value),
}

fn classify(line: &str) -> Line {
    let line = line.trim();
    if line.is_empty() || line.starts_with(':') {
        return Line::Skip;
    }
    let payload = match line.strip_prefix("data:") {
        Some(rest) => rest.trim_start(),
        None if line.starts_with("event:")
            || line.starts_with("id:")
            || line.starts_with("retry:") =>
        {
            return Line::Skip;
        }
        None => line,
    };
    if payload.is_empty() {
        return Line::Skip;
    }
    if payload == DONE_MARKER {
        return Line::Done;
    }
    match serde_json::from_str(payload) {
        Ok(value) => Line::Frame(value),
        Err(e) => {
            tracing::debug!(error = %e, line = %payload, "skipping non-JSON stream line");
            Line::Skip
        }
    }
}

/// Chunk-boundary-invariant decoder for one streaming response.
#[derive(Debug)]
pub struct StreamDecoder {
    codec: LinesCodec,
    buffer: BytesMut,
    format: WireFormat,
    provider: ProviderId,
    descriptor: ModelDescriptor,
    acc: StreamAccumulator,
    sequence: u64,
    finished: bool,
}

impl StreamDecoder {
    pub fn new(format: WireFormat, provider: ProviderId, descriptor: ModelDescriptor) -> Self {
        Self {
            codec: LinesCodec::new(),
            buffer: BytesMut::new(),
            format,
            provider,
            descriptor,
            acc: StreamAccumulator::new(),
            sequence: 0,
            finished: false,
        }
    }

    /// Whether the terminal event (or an error) has been produced.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Feed one network chunk. Input after the terminal event is ignored.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<Result<CompletionEvent, LlmError>> {
        let mut events = Vec::new();
        if self.finished {
            return events;
        }
        self.buffer.extend_from_slice(bytes);
        while !self.finished {
            match self.codec.decode(&mut self.buffer) {
                Ok(Some(line)) => self.process(&line, &mut events),
                Ok(None) => break,
                Err(e) => self.fail(e, &mut events),
            }
        }
        events
    }

    /// Flush at end of input: a trailing unterminated line is processed,
    /// then the `Final` event is produced unless one already was.
    pub fn finish(&mut self) -> Vec<Result<CompletionEvent, LlmError>> {
        let mut events = Vec::new();
        if self.finished {
            return events;
        }
        while !self.finished {
            match self.codec.decode_eof(&mut self.buffer) {
                Ok(Some(line)) => self.process(&line, &mut events),
                Ok(None) => break,
                Err(e) => self.fail(e, &mut events),
            }
        }
        if !self.finished {
            events.push(Ok(self.finalize()));
        }
        events
    }

    fn process(&mut self, line: &str, events: &mut Vec<Result<CompletionEvent, LlmError>>) {
        match classify(line) {
            Line::Skip => {}
            Line::Done => events.push(Ok(self.finalize())),
            Line::Frame(frame) => match map_frame(self.format, self.provider, &frame, &mut self.acc) {
                Ok(update) => {
                    if let Some(text) = update.delta {
                        self.acc.push_text(&text);
                        events.push(Ok(CompletionEvent::Chunk {
                            text,
                            sequence_index: self.sequence,
                        }));
                        self.sequence += 1;
                    }
                    if update.terminal {
                        events.push(Ok(self.finalize()));
                    }
                }
                Err(e) => {
                    self.finished = true;
                    events.push(Err(e));
                }
            },
        }
    }

    fn fail(&mut self, error: LinesCodecError, events: &mut Vec<Result<CompletionEvent, LlmError>>) {
        self.finished = true;
        events.push(Err(LlmError::StreamError(format!("undecodable stream line: {error}"))));
    }

    fn finalize(&mut self) -> CompletionEvent {
        self.finished = true;
        let acc = std::mem::take(&mut self.acc);
        CompletionEvent::Final(acc.finish(&self.descriptor))
    }
}

/// Drive `decoder` from an async byte source.
///
/// The resulting stream ends after the `Final` event, after the first error,
/// or when no chunk arrives within `idle_timeout`. The byte source is dropped
/// on every exit path, releasing the connection. `on_final` sees the final
/// response before it is yielded.
pub fn decode_stream<S, B, F>(
    bytes: S,
    mut decoder: StreamDecoder,
    idle_timeout: Duration,
    on_final: F,
) -> CompletionStream
where
    S: Stream<Item = Result<B, LlmError>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    F: FnOnce(&CompletionResponse) + Send + 'static,
{
    let mut on_final = Some(on_final);
    let mut notify = move |event: &CompletionEvent| {
        if let CompletionEvent::Final(response) = event {
            if let Some(callback) = on_final.take() {
                callback(response);
            }
        }
    };

    let out = async_stream::stream! {
        let mut bytes = Box::pin(bytes);
        loop {
            let next = match tokio::time::timeout(idle_timeout, bytes.next()).await {
                Ok(next) => next,
                Err(_) => {
                    yield Err(LlmError::StreamError(format!(
                        "no data received for {}s",
                        idle_timeout.as_secs()
                    )));
                    return;
                }
            };
            let events = match next {
                Some(Ok(chunk)) => decoder.feed(chunk.as_ref()),
                Some(Err(e)) => {
                    yield Err(e);
                    return;
                }
                None => decoder.finish(),
            };
            for event in events {
                match event {
                    Ok(event) => {
                        notify(&event);
                        yield Ok(event);
                    }
                    Err(e) => {
                        yield Err(e);
                        return;
                    }
                }
            }
            if decoder.is_finished() {
                return;
            }
        }
    };
    Box::pin(out)
}
