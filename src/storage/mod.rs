//! Storage Module
//!
//! Persistent key/value media backing the durable cache.
//!
//! # Media
//! - `MemoryStorage`: shared in-process map with an optional byte quota
//! - `FileStorage`: JSON file on disk, written through on every change

mod file;
mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

use crate::error::Result;

// == Storage Trait ==
/// A string key/value medium that may outlive the process.
///
/// Keys are shared between every cache using the same medium, so callers
/// namespace them (see `DurableCache`).
pub trait Storage: Send + Sync {
    /// Returns the stored text, or None if the key is absent.
    fn get_item(&self, key: &str) -> Option<String>;

    /// Writes text under a key. On error the medium is left unchanged.
    fn set_item(&self, key: &str, value: &str) -> Result<()>;

    /// Removes a key. Absent keys are not an error.
    fn remove_item(&self, key: &str) -> Result<()>;

    /// Every key currently stored.
    fn keys(&self) -> Vec<String>;
}
