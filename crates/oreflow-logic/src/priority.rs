//! Ordered ore/item priority lists.
//!
//! A priority list is an ordered, duplicate-free sequence of item keys
//! (ore or component subtype ids). Position encodes priority: earlier
//! entries are processed first. Every operation is total — duplicates,
//! missing keys, and boundary moves are no-ops rather than errors, so a
//! stream of UI actions can be replayed blindly on any replica.
//!
//! ```
//! use oreflow_logic::priority::OrePriorityList;
//!
//! let mut list = OrePriorityList::default();
//! list.add("Iron");
//! list.add("Nickel");
//! list.add("Iron"); // already present, no-op
//! list.move_up("Nickel");
//! assert_eq!(list.items(), ["Nickel", "Iron"]);
//! ```

use serde::{Deserialize, Serialize};

/// Ordered, duplicate-free list of item keys. Earlier = higher priority.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrePriorityList {
    keys: Vec<String>,
}

impl OrePriorityList {
    /// Build a list from keys, dropping duplicates while keeping the first
    /// occurrence. Used when loading snapshots that may predate the
    /// uniqueness rule or were hand-edited.
    pub fn from_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut list = Self::default();
        for key in keys {
            let key = key.into();
            if !list.contains(&key) {
                list.keys.push(key);
            }
        }
        list
    }

    /// Append `key` at the lowest priority if it is not already present.
    pub fn add(&mut self, key: &str) {
        if !self.contains(key) {
            self.keys.push(key.to_string());
        }
    }

    /// Remove `key` if present. Later entries shift up one position.
    pub fn remove(&mut self, key: &str) {
        if let Some(index) = self.position(key) {
            self.keys.remove(index);
        }
    }

    /// Swap `key` with the entry before it. No-op if `key` is absent or
    /// already first.
    pub fn move_up(&mut self, key: &str) {
        if let Some(index) = self.position(key) {
            if index > 0 {
                self.keys.swap(index, index - 1);
            }
        }
    }

    /// Swap `key` with the entry after it. No-op if `key` is absent or
    /// already last.
    pub fn move_down(&mut self, key: &str) {
        if let Some(index) = self.position(key) {
            if index + 1 < self.keys.len() {
                self.keys.swap(index, index + 1);
            }
        }
    }

    /// Whether `key` is anywhere in the list.
    pub fn contains(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    /// Zero-based priority rank of `key`, if present.
    pub fn position(&self, key: &str) -> Option<usize> {
        self.keys.iter().position(|k| k == key)
    }

    /// Read-only ordered view of the keys.
    pub fn items(&self) -> &[String] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn clear(&mut self) {
        self.keys.clear();
    }
}
