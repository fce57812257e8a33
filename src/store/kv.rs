//! Keyed storage abstraction.

use std::collections::HashSet;

use async_trait::async_trait;
use thiserror::Error;

/// Errors raised by a keyed storage backend.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("key '{0}' holds a value of another type")]
    WrongType(String),

    #[error("value of '{key}.{field}' is not an integer")]
    NotAnInteger { key: String, field: String },

    #[error("snapshot IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot format error: {0}")]
    Snapshot(#[from] serde_json::Error),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Set and hash operations over string keys.
///
/// Every call is atomic with respect to other calls on the same store.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn sismember(&self, key: &str, member: &str) -> StoreResult<bool>;

    /// Returns `true` when the member was newly added.
    async fn sadd(&self, key: &str, member: &str) -> StoreResult<bool>;

    /// Returns `true` when the member was present.
    async fn srem(&self, key: &str, member: &str) -> StoreResult<bool>;

    async fn smembers(&self, key: &str) -> StoreResult<HashSet<String>>;

    async fn hget(&self, key: &str, field: &str) -> StoreResult<Option<String>>;

    async fn hset(&self, key: &str, field: &str, value: &str) -> StoreResult<()>;

    /// Returns `true` when the field was present.
    async fn hdel(&self, key: &str, field: &str) -> StoreResult<bool>;

    /// Add `delta` to an integer field, creating it at zero. Returns the new value.
    async fn hincrby(&self, key: &str, field: &str, delta: i64) -> StoreResult<i64>;

    /// Returns `true` when the key existed.
    async fn del(&self, key: &str) -> StoreResult<bool>;
}
