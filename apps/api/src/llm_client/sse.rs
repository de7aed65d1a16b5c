//! Decoder for the provider's `text/event-stream` response body.
//!
//! The Messages API streams one JSON object per event. Every object carries a
//! `type` field, so the `event:` line is redundant and only `data:` lines are
//! read. `TextFragments` turns a blocking reader over that body into the
//! sequence of text fragments the model produced, skipping thinking deltas,
//! pings and bookkeeping events.

use std::io::BufRead;

use serde::Deserialize;

use super::LlmError;

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    MessageStart,
    ContentBlockStart,
    ContentBlockDelta { delta: Delta },
    ContentBlockStop,
    MessageDelta,
    MessageStop,
    Ping,
    Error { error: StreamErrorBody },
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Delta {
    TextDelta { text: String },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
pub struct StreamErrorBody {
    #[serde(rename = "type", default)]
    pub error_type: String,
    pub message: String,
}

/// Accumulates `data:` lines until the blank line that closes an event.
#[derive(Debug, Default)]
pub struct SseDecoder {
    data: Vec<String>,
}

impl SseDecoder {
    /// Feeds one line (without its terminator). Returns the event payload when
    /// the line completes an event.
    pub fn push_line(&mut self, line: &str) -> Option<String> {
        if line.is_empty() {
            return self.flush();
        }
        if line.starts_with(':') {
            return None;
        }
        if let Some(value) = line.strip_prefix("data:") {
            self.data
                .push(value.strip_prefix(' ').unwrap_or(value).to_string());
        }
        None
    }

    /// Flushes a trailing event that was not followed by a blank line.
    pub fn finish(&mut self) -> Option<String> {
        self.flush()
    }

    fn flush(&mut self) -> Option<String> {
        if self.data.is_empty() {
            return None;
        }
        let payload = self.data.join("\n");
        self.data.clear();
        Some(payload)
    }
}

/// Blocking iterator over the text fragments of a streamed completion.
///
/// Ends after `message_stop` or end of body. An in-stream `error` event, a
/// read failure or an undecodable event yields one `Err` and ends the sequence.
pub struct TextFragments<R> {
    reader: R,
    decoder: SseDecoder,
    line: String,
    finished: bool,
}

impl<R: BufRead> TextFragments<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            decoder: SseDecoder::default(),
            line: String::new(),
            finished: false,
        }
    }
}

impl<R: BufRead> Iterator for TextFragments<R> {
    type Item = Result<String, LlmError>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.finished {
            self.line.clear();
            let payload = match self.reader.read_line(&mut self.line) {
                Ok(0) => {
                    self.finished = true;
                    self.decoder.finish()
                }
                Ok(_) => self
                    .decoder
                    .push_line(self.line.trim_end_matches(&['\r', '\n'][..])),
                Err(e) => {
                    self.finished = true;
                    return Some(Err(LlmError::Io(e)));
                }
            };

            let Some(payload) = payload else {
                continue;
            };
            if payload == "[DONE]" {
                self.finished = true;
                break;
            }

            match serde_json::from_str::<StreamEvent>(&payload) {
                Ok(StreamEvent::ContentBlockDelta {
                    delta: Delta::TextDelta { text },
                }) => return Some(Ok(text)),
                Ok(StreamEvent::MessageStop) => self.finished = true,
                Ok(StreamEvent::Error { error }) => {
                    self.finished = true;
                    return Some(Err(LlmError::Stream(format!(
                        "{}: {}",
                        error.error_type, error.message
                    ))));
                }
                Ok(_) => {}
                Err(e) => {
                    self.finished = true;
                    return Some(Err(LlmError::Parse(e)));
                }
            }
        }
        None
    }
}
