//! Pagination accounting and generic list decoding.
//!
//! The original decodes scan hits into either an `unstructured.UnstructuredList`
//! or a concrete typed slice chosen via reflection at storage-construction
//! time. The idiomatic Rust translation is a compile-time generic: callers
//! ask for `ResourceList<T>` for whatever `T: DeserializeOwned` they need —
//! `serde_json::Value` covers the "unstructured" case, a concrete struct
//! covers the typed one. No runtime strategy object is needed.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::StorageResult;

/// A decoded page of results plus its pagination continuation (§4.6, §6).
#[derive(Debug, Clone)]
pub struct ResourceList<T> {
    pub items: Vec<T>,
    pub continue_token: Option<String>,
    /// May be negative when the caller's offset exceeded the total — this is
    /// preserved, not clamped, so callers can detect the condition.
    pub remaining_item_count: i64,
}

/// Computes `Continue`/`RemainingItemCount` for one page (§6 caller-visible
/// list output).
pub fn paginate(total: u64, offset: i64, limit: i64, page_len: usize, with_continue: bool) -> (Option<String>, i64) {
    let continue_token = if with_continue && page_len as i64 == limit {
        Some((offset + limit).to_string())
    } else {
        None
    };
    let remaining = total as i64 - offset - page_len as i64;
    (continue_token, remaining)
}

/// Decodes each object value into `T`.
pub fn decode_items<T: DeserializeOwned>(objects: Vec<Value>) -> StorageResult<Vec<T>> {
    objects
        .into_iter()
        .map(|v| serde_json::from_value(v).map_err(Into::into))
        .collect()
}
