//! Stateful item reference stripping.
//!
//! Providers with server-side session state tag parts with an `itemId`. That
//! id only resolves inside the session that issued it; resubmitting it to any
//! other session fails with "Item with id '...' not found". Callers strip the
//! ids reactively (after such an error, or when switching provider/session).
//! The stored envelope keeps its ids so same-session continuation still works.
//!
//! Only `itemId` is removed. `reasoningEncryptedContent` and every other key
//! stay. A namespace bag emptied by the removal is deleted, and a container
//! emptied that way is deleted too:
//!
//! ```text
//! { openai: { itemId, reasoningEncryptedContent } } -> { openai: { reasoningEncryptedContent } }
//! { openai: { itemId } }                            -> (providerOptions removed)
//! ```
//!
//! Discipline: [`strip_item_ids`] mutates in place. Use [`without_item_ids`]
//! to get a stripped copy.

use crate::history::types::{Content, Message, Part, ProviderOptions};

/// Strip `itemId` from every part of every message. Returns the number removed.
pub fn strip_item_ids(messages: &mut [Message]) -> usize {
    let removed: usize = messages.iter_mut().map(strip_message).sum();
    if removed > 0 {
        log::debug!(
            "Stripped {} item id(s) across {} message(s)",
            removed,
            messages.len()
        );
    }
    removed
}

/// Stripped copy of `messages`; the input is left untouched.
pub fn without_item_ids(messages: &[Message]) -> Vec<Message> {
    let mut copy = messages.to_vec();
    strip_item_ids(&mut copy);
    copy
}

fn strip_message(message: &mut Message) -> usize {
    match &mut message.content {
        Content::Parts(parts) => parts.iter_mut().map(strip_part).sum(),
        Content::Text(_) => 0,
    }
}

/// Strip both the providerOptions map and the legacy providerMetadata field.
fn strip_part(part: &mut Part) -> usize {
    strip_container(&mut part.provider_options) + strip_container(&mut part.provider_metadata)
}

fn strip_container(container: &mut Option<ProviderOptions>) -> usize {
    let Some(options) = container.as_mut() else {
        return 0;
    };

    let removed = options.remove_item_ids();
    if removed > 0 && options.is_empty() {
        *container = None;
    }
    removed
}
