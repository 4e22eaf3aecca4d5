//! Message history: the typed model, the read path, and the write path.
//!
//! # Overview
//!
//! - **Types** - messages, parts, provider options, envelopes, stored records
//! - **Envelope** - decodes a stored record into canonical messages
//! - **Guard** - decides whether messages may be stored as a rich envelope
//!
//! # Data Flow
//!
//! ```text
//! read:  StoredRecord -> parse_stored_record -> Vec<Message> -> (strip_item_ids) -> provider
//! write: Vec<Message> -> guard_envelope -> Some(Envelope) | None (flat text only)
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use turnkeep_core::history::{guard_envelope, parse_stored_record};
//! ```

pub mod envelope;
pub mod guard;
pub mod types;

pub use envelope::{
    decode_payload, parse_stored_record, parse_stored_record_with, DecodedPayload, PayloadError,
};
pub use guard::guard_envelope;
pub use types::*;
