//! Server-sent-events framing
//!
//! A frame is a run of `field: value` lines ended by a blank line. Only the
//! `event` and `data` fields are used; multiple `data` lines are joined with
//! `\n`. Lines starting with `:` are keep-alive comments.

use tokio_util::bytes::BytesMut;
use tokio_util::codec::Decoder;

use crate::error::CleanerError;

/// Event name used when a frame carries no `event` field
pub const DEFAULT_EVENT: &str = "message";

/// One decoded frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseFrame {
    /// Event name
    pub event: String,
    /// Raw data, usually JSON
    pub data: String,
}

/// Line-oriented decoder with a frame size bound
///
/// A frame growing past `max_frame_size` is dropped with a warning and the
/// decoder skips to the next blank line; the stream itself stays usable.
#[derive(Debug)]
pub struct SseCodec {
    max_frame_size: usize,
    event: Option<String>,
    data: String,
    discarding: bool,
}

impl SseCodec {
    /// Create a codec accepting frames up to `max_frame_size` bytes
    #[must_use]
    pub fn new(max_frame_size: usize) -> Self {
        Self {
            max_frame_size,
            event: None,
            data: String::new(),
            discarding: false,
        }
    }

    fn pending_len(&self) -> usize {
        self.data.len() + self.event.as_ref().map_or(0, String::len)
    }

    fn overflow(&mut self) {
        if !self.discarding {
            log::warn!(
                "Dropping push frame larger than {} bytes",
                self.max_frame_size
            );
        }
        self.event = None;
        self.data.clear();
        self.discarding = true;
    }

    fn take_frame(&mut self) -> Option<SseFrame> {
        let event = self.event.take();
        let data = std::mem::take(&mut self.data);
        if std::mem::replace(&mut self.discarding, false) {
            return None;
        }
        if event.is_none() && data.is_empty() {
            return None;
        }
        Some(SseFrame {
            event: event.unwrap_or_else(|| DEFAULT_EVENT.to_string()),
            data,
        })
    }

    fn field(&mut self, line: &str) {
        if self.discarding || line.starts_with(':') {
            return;
        }
        let (name, value) = match line.split_once(':') {
            Some((name, value)) => (name, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        match name {
            "event" => self.event = Some(value.to_string()),
            "data" => {
                if !self.data.is_empty() {
                    self.data.push('\n');
                }
                self.data.push_str(value);
            }
            _ => {}
        }
        if self.pending_len() > self.max_frame_size {
            self.overflow();
        }
    }
}

impl Decoder for SseCodec {
    type Item = SseFrame;
    type Error = CleanerError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<SseFrame>, CleanerError> {
        loop {
            let Some(newline) = src.iter().position(|b| *b == b'\n') else {
                if src.len() + self.pending_len() > self.max_frame_size {
                    src.clear();
                    self.overflow();
                }
                return Ok(None);
            };

            let raw = src.split_to(newline + 1);
            let mut line = &raw[..newline];
            if let Some(stripped) = line.strip_suffix(b"\r") {
                line = stripped;
            }

            if line.is_empty() {
                if let Some(frame) = self.take_frame() {
                    return Ok(Some(frame));
                }
                continue;
            }

            let line = String::from_utf8_lossy(line);
            self.field(&line);
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<SseFrame>, CleanerError> {
        if let Some(frame) = self.decode(src)? {
            return Ok(Some(frame));
        }
        if !src.is_empty() {
            let rest = src.split();
            let line = String::from_utf8_lossy(&rest).into_owned();
            self.field(line.trim_end_matches('\r'));
        }
        Ok(self.take_frame())
    }
}
