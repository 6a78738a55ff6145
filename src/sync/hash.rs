//! Content hashing for cache change detection.
//!
//! Record lines are hashed so a re-export of an unchanged entity keeps its old
//! line (and its old `exported_at`), and whole files are hashed so an
//! unchanged cache file is not rewritten. Both keep `git status` quiet when a
//! save had nothing new to say.

use std::fs;
use std::path::Path;

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::sync::types::SyncResult;

/// SHA256 of the JSON serialization of `value`, as lowercase hex.
///
/// # Errors
///
/// Returns an error if the value cannot be serialized.
pub fn content_hash<T: Serialize>(value: &T) -> SyncResult<String> {
    let json = serde_json::to_string(value)?;
    Ok(text_hash(&json))
}

/// SHA256 of raw text, as lowercase hex.
#[must_use]
pub fn text_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Hash of a file's current content, or `None` if it does not exist.
///
/// # Errors
///
/// Returns an error if an existing file cannot be read.
pub fn file_hash(path: &Path) -> SyncResult<Option<String>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    Ok(Some(text_hash(&content)))
}

/// `true` when there is no stored hash or it differs from `current_hash`.
#[must_use]
pub fn has_changed(current_hash: &str, stored_hash: Option<&str>) -> bool {
    stored_hash.is_none_or(|h| h != current_hash)
}
