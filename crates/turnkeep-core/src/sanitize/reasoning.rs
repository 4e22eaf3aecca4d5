//! Orphaned reasoning removal.
//!
//! A `reasoning` part is only valid when some non-reasoning part follows it
//! in the same message. The trailing run of reasoning parts (one that runs to
//! the end of the sequence) has nothing to attach to and is rejected by
//! providers on resubmission, so it is dropped:
//!
//! ```text
//! [reasoning, text]             -> [reasoning, text]
//! [text, reasoning]             -> [text]
//! [reasoning, tool-call, reasoning, reasoning] -> [reasoning, tool-call]
//! [reasoning, reasoning]        -> []
//! ```
//!
//! Kept parts are not touched; their `itemId` and
//! `reasoningEncryptedContent` stay intact.
//!
//! Discipline: consumes the message and returns the filtered one. Clone first
//! if the original is still needed.

use crate::history::types::{Content, Message, Part};

/// Number of leading parts to keep: everything up to the last non-reasoning part.
fn kept_prefix_len(parts: &[Part]) -> usize {
    parts
        .iter()
        .rposition(|part| !part.is_reasoning())
        .map_or(0, |last| last + 1)
}

/// Drop the trailing run of reasoning parts. String content is returned as-is.
pub fn filter_orphaned_reasoning(mut message: Message) -> Message {
    if let Content::Parts(parts) = &mut message.content {
        let keep = kept_prefix_len(parts);
        if keep < parts.len() {
            log::debug!(
                "Dropping {} orphaned reasoning part(s) from {} message",
                parts.len() - keep,
                message.role
            );
            parts.truncate(keep);
        }
    }
    message
}

/// Apply [`filter_orphaned_reasoning`] to every message, preserving order.
pub fn filter_orphaned_reasoning_all(messages: Vec<Message>) -> Vec<Message> {
    messages.into_iter().map(filter_orphaned_reasoning).collect()
}
