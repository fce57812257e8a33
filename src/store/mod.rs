//! Keyed storage module.
//!
//! Provides:
//! - The [`KeyValueStore`] abstraction (sets and hashes with atomic increments)
//! - An in-memory store with optional JSON snapshot persistence
//! - The retention store tracking reposted submission ids

pub mod kv;
pub mod memory;
pub mod retention;

pub use kv::{KeyValueStore, StoreError, StoreResult};
pub use memory::MemoryStore;
pub use retention::RetentionStore;

/// Build the key namespace shared by one (feed, channel) pair.
pub fn key_prefix(feed: &str, channel: &str) -> String {
    format!("{}_{}", feed, channel)
}
