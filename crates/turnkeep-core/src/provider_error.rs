//! Provider error classification.
//!
//! Recognizes the "stale stateful reference" failure a provider returns when
//! a resubmitted part carries an `itemId` from another session:
//!
//! ```text
//! Item with id 'rs_04332f...' not found
//! ```
//!
//! Matching is exact-phrase so unrelated failures never trigger a
//! strip-and-retry.

use std::error::Error;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

static ITEM_NOT_FOUND_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"Item with id (?:'[^']*'|"[^"]*"|`[^`]*`) not found"#).unwrap()
});

/// True if `message` is an item-not-found failure.
pub fn is_item_not_found_message(message: &str) -> bool {
    ITEM_NOT_FOUND_RE.is_match(message)
}

/// Pull the error message out of a JSON-shaped caught value.
///
/// Precedence: nested `error.message`, then the value's own `message`, then
/// the value itself when it is a string.
pub fn extract_error_message(value: &Value) -> Option<&str> {
    if let Some(nested) = value
        .get("error")
        .and_then(|error| error.get("message"))
        .and_then(Value::as_str)
    {
        return Some(nested);
    }

    if let Some(own) = value.get("message").and_then(Value::as_str) {
        return Some(own);
    }

    value.as_str()
}

/// Classify a JSON-shaped caught value. No extractable message means `false`.
pub fn is_item_not_found_error(value: &Value) -> bool {
    extract_error_message(value).is_some_and(is_item_not_found_message)
}

/// Classify a native error.
///
/// Checks the error's own message, then each `source()` down the chain.
/// Provider errors usually carry the message themselves and wrap a
/// transport failure as their source.
pub fn error_chain_is_item_not_found(error: &(dyn Error + 'static)) -> bool {
    let mut current = Some(error);
    while let Some(error) = current {
        if is_item_not_found_message(&error.to_string()) {
            return true;
        }
        current = error.source();
    }
    false
}
