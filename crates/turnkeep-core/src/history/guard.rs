//! Persistence guard for rich payloads.
//!
//! Decides whether a finalized turn's messages may be stored as a versioned
//! envelope. `None` means "store the flat role/content only", which is an
//! expected degradation (e.g. a tool result embedding a huge file), not an
//! error.
//!
//! The size check serializes into a counting sink that aborts as soon as the
//! ceiling is passed, so oversized payloads are never fully serialized.

use std::io;

use super::types::{Envelope, Message};
use crate::config::HistoryConfig;

/// Wrap `messages` in an envelope if they fit under the configured ceiling.
///
/// The ceiling is inclusive. Messages are never truncated or rewritten.
pub fn guard_envelope(messages: Vec<Message>, config: &HistoryConfig) -> Option<Envelope> {
    if messages.is_empty() {
        return None;
    }

    let envelope = Envelope::new(config.sdk_version.clone(), messages);

    match serialized_len_within(&envelope, config.max_payload_bytes) {
        Ok(len) => {
            log::debug!(
                "Envelope with {} message(s) fits: {} of {} bytes",
                envelope.messages.len(),
                len,
                config.max_payload_bytes
            );
            Some(envelope)
        }
        Err(SizeCheck::TooLarge) => {
            log::warn!(
                "Envelope with {} message(s) exceeds {} bytes; storing flat content only",
                envelope.messages.len(),
                config.max_payload_bytes
            );
            None
        }
        Err(SizeCheck::Serialize(e)) => {
            log::warn!("Failed to serialize envelope: {}", e);
            None
        }
    }
}

#[derive(Debug)]
enum SizeCheck {
    TooLarge,
    Serialize(serde_json::Error),
}

/// Compact JSON byte length of `envelope`, or `TooLarge` once it passes `limit`.
fn serialized_len_within(envelope: &Envelope, limit: usize) -> Result<usize, SizeCheck> {
    let mut counter = ByteCounter::new(limit);

    match serde_json::to_writer(&mut counter, envelope) {
        Ok(()) => Ok(counter.written),
        Err(_) if counter.exceeded() => Err(SizeCheck::TooLarge),
        Err(e) => Err(SizeCheck::Serialize(e)),
    }
}

/// Write sink that counts bytes and fails once the limit is exceeded.
struct ByteCounter {
    written: usize,
    limit: usize,
}

impl ByteCounter {
    fn new(limit: usize) -> Self {
        Self { written: 0, limit }
    }

    fn exceeded(&self) -> bool {
        self.written > self.limit
    }
}

impl io::Write for ByteCounter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.written = self.written.saturating_add(buf.len());
        if self.exceeded() {
            return Err(io::Error::other("payload exceeds size ceiling"));
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
