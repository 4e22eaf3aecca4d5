//! Provider-safety sanitization.
//!
//! Two independent transformations:
//!
//! - **reasoning** - drops orphaned trailing reasoning parts. Runs on every read.
//! - **item_ids** - strips stateful `itemId` references. Runs only when a caller asks.
//!
//! They are kept apart on purpose: stripping ids on every read breaks
//! same-session reasoning continuation.

pub mod item_ids;
pub mod reasoning;

pub use item_ids::{strip_item_ids, without_item_ids};
pub use reasoning::{filter_orphaned_reasoning, filter_orphaned_reasoning_all};
