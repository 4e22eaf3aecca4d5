//! # turnkeep-core
//!
//! Message-history compatibility and provider-safety sanitization for
//! multi-turn chat.
//!
//! This crate does no I/O on the hot path and never fails on bad input:
//! every decode degrades to a safe representation instead of erroring.
//!
//! ## Key Concepts
//!
//! - **Envelope**: the versioned `{ sdkVersion, messages }` rich payload of a turn
//! - **Part**: one typed fragment of message content, with provider options
//! - **Orphaned reasoning**: trailing reasoning parts with no following output
//! - **Item id**: a provider-session reference that is invalid elsewhere

pub mod config;
pub mod history;
pub mod provider_error;
pub mod sanitize;

// Re-export commonly used types
pub use config::{load_config, ConfigError, HistoryConfig};
pub use history::{
    guard_envelope, parse_stored_record, parse_stored_record_with, Content, Envelope, Message,
    Part, PartKind, ProviderOptions, Role, StoredRecord, AI_MESSAGES_SDK_VERSION,
};
pub use provider_error::{error_chain_is_item_not_found, is_item_not_found_error};
pub use sanitize::{filter_orphaned_reasoning, strip_item_ids, without_item_ids};
