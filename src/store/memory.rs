//! In-memory keyed store with optional JSON snapshot.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::store::kv::{KeyValueStore, StoreError, StoreResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
enum Entry {
    Set(HashSet<String>),
    Hash(HashMap<String, String>),
}

/// Store keeping every key in memory.
///
/// When opened with a snapshot path, the whole keyspace is rewritten to that
/// file after each mutation and reloaded on the next [`MemoryStore::open`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Entry>>,
    snapshot_path: Option<PathBuf>,
}

impl MemoryStore {
    /// Create an empty, non-persistent store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a store backed by a snapshot file, loading it if present.
    pub async fn open(path: &Path) -> StoreResult<Self> {
        let entries: HashMap<String, Entry> = match tokio::fs::read(path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(e.into()),
        };

        tracing::debug!(
            "Opened store snapshot {} ({} keys)",
            path.display(),
            entries.len()
        );

        Ok(Self {
            entries: Mutex::new(entries),
            snapshot_path: Some(path.to_path_buf()),
        })
    }

    /// Write the current keyspace to the snapshot file, if any.
    pub async fn flush(&self) -> StoreResult<()> {
        let entries = self.entries.lock().await;
        self.persist(&entries).await
    }

    async fn persist(&self, entries: &HashMap<String, Entry>) -> StoreResult<()> {
        let Some(path) = &self.snapshot_path else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let bytes = serde_json::to_vec(entries)?;
        let tmp = path.with_extension("tmp");
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }

    /// Persist a mutation of `key`, putting back its `previous` value when the
    /// snapshot cannot be written.
    async fn commit(
        &self,
        entries: &mut HashMap<String, Entry>,
        key: &str,
        previous: Option<Entry>,
    ) -> StoreResult<()> {
        if let Err(e) = self.persist(entries).await {
            match previous {
                Some(entry) => entries.insert(key.to_string(), entry),
                None => entries.remove(key),
            };
            return Err(e);
        }
        Ok(())
    }
}

fn as_set<'a>(key: &str, entry: &'a mut Entry) -> StoreResult<&'a mut HashSet<String>> {
    match entry {
        Entry::Set(set) => Ok(set),
        Entry::Hash(_) => Err(StoreError::WrongType(key.to_string())),
    }
}

fn as_hash<'a>(key: &str, entry: &'a mut Entry) -> StoreResult<&'a mut HashMap<String, String>> {
    match entry {
        Entry::Hash(hash) => Ok(hash),
        Entry::Set(_) => Err(StoreError::WrongType(key.to_string())),
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn sismember(&self, key: &str, member: &str) -> StoreResult<bool> {
        let mut entries = self.entries.lock().await;
        match entries.get_mut(key) {
            Some(entry) => Ok(as_set(key, entry)?.contains(member)),
            None => Ok(false),
        }
    }

    async fn sadd(&self, key: &str, member: &str) -> StoreResult<bool> {
        let mut entries = self.entries.lock().await;
        let previous = entries.get(key).cloned();
        let entry = entries
            .entry(key.to_string())
            .or_insert_with(|| Entry::Set(HashSet::new()));
        let added = as_set(key, entry)?.insert(member.to_string());
        if added {
            self.commit(&mut entries, key, previous).await?;
        }
        Ok(added)
    }

    async fn srem(&self, key: &str, member: &str) -> StoreResult<bool> {
        let mut entries = self.entries.lock().await;
        let previous = entries.get(key).cloned();
        let Some(entry) = entries.get_mut(key) else {
            return Ok(false);
        };
        let set = as_set(key, entry)?;
        let removed = set.remove(member);
        if set.is_empty() {
            entries.remove(key);
        }
        if removed {
            self.commit(&mut entries, key, previous).await?;
        }
        Ok(removed)
    }

    async fn smembers(&self, key: &str) -> StoreResult<HashSet<String>> {
        let mut entries = self.entries.lock().await;
        match entries.get_mut(key) {
            Some(entry) => Ok(as_set(key, entry)?.clone()),
            None => Ok(HashSet::new()),
        }
    }

    async fn hget(&self, key: &str, field: &str) -> StoreResult<Option<String>> {
        let mut entries = self.entries.lock().await;
        match entries.get_mut(key) {
            Some(entry) => Ok(as_hash(key, entry)?.get(field).cloned()),
            None => Ok(None),
        }
    }

    async fn hset(&self, key: &str, field: &str, value: &str) -> StoreResult<()> {
        let mut entries = self.entries.lock().await;
        let previous = entries.get(key).cloned();
        let entry = entries
            .entry(key.to_string())
            .or_insert_with(|| Entry::Hash(HashMap::new()));
        as_hash(key, entry)?.insert(field.to_string(), value.to_string());
        self.commit(&mut entries, key, previous).await
    }

    async fn hdel(&self, key: &str, field: &str) -> StoreResult<bool> {
        let mut entries = self.entries.lock().await;
        let previous = entries.get(key).cloned();
        let Some(entry) = entries.get_mut(key) else {
            return Ok(false);
        };
        let hash = as_hash(key, entry)?;
        let removed = hash.remove(field).is_some();
        if hash.is_empty() {
            entries.remove(key);
        }
        if removed {
            self.commit(&mut entries, key, previous).await?;
        }
        Ok(removed)
    }

    async fn hincrby(&self, key: &str, field: &str, delta: i64) -> StoreResult<i64> {
        let mut entries = self.entries.lock().await;
        let previous = entries.get(key).cloned();
        let entry = entries
            .entry(key.to_string())
            .or_insert_with(|| Entry::Hash(HashMap::new()));
        let hash = as_hash(key, entry)?;

        let current = match hash.get(field) {
            Some(raw) => raw.parse::<i64>().map_err(|_| StoreError::NotAnInteger {
                key: key.to_string(),
                field: field.to_string(),
            })?,
            None => 0,
        };
        let updated = current + delta;
        hash.insert(field.to_string(), updated.to_string());

        self.commit(&mut entries, key, previous).await?;
        Ok(updated)
    }

    async fn del(&self, key: &str) -> StoreResult<bool> {
        let mut entries = self.entries.lock().await;
        let previous = entries.remove(key);
        let existed = previous.is_some();
        if existed {
            self.commit(&mut entries, key, previous).await?;
        }
        Ok(existed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_without_snapshot_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.json");

        let store = tokio_test::block_on(MemoryStore::open(&path)).unwrap();
        let members = tokio_test::block_on(store.smembers("any")).unwrap();

        assert!(members.is_empty());
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_set_operations() {
        let store = MemoryStore::new();

        assert!(!store.sismember("posted", "a").await.unwrap());
        assert!(store.sadd("posted", "a").await.unwrap());
        assert!(!store.sadd("posted", "a").await.unwrap());
        assert!(store.sismember("posted", "a").await.unwrap());

        assert!(store.srem("posted", "a").await.unwrap());
        assert!(!store.srem("posted", "a").await.unwrap());
        assert!(store.smembers("posted").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_hincrby_creates_and_accumulates() {
        let store = MemoryStore::new();

        assert_eq!(store.hincrby("totals", "image", 1).await.unwrap(), 1);
        assert_eq!(store.hincrby("totals", "image", 41).await.unwrap(), 42);
        assert_eq!(
            store.hget("totals", "image").await.unwrap().as_deref(),
            Some("42")
        );
    }

    #[tokio::test]
    async fn test_hincrby_rejects_non_integer() {
        let store = MemoryStore::new();
        store.hset("h", "f", "1.5").await.unwrap();

        let err = store.hincrby("h", "f", 1).await.unwrap_err();
        assert!(matches!(err, StoreError::NotAnInteger { .. }));
    }

    #[tokio::test]
    async fn test_wrong_type_is_reported() {
        let store = MemoryStore::new();
        store.sadd("k", "member").await.unwrap();

        let err = store.hget("k", "field").await.unwrap_err();
        assert!(matches!(err, StoreError::WrongType(_)));
    }

    #[tokio::test]
    async fn test_snapshot_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("store.json");

        {
            let store = MemoryStore::open(&path).await.unwrap();
            store.sadd("aww_@chan_posted", "abc").await.unwrap();
            store.hset("aww_@chan_post_time", "abc", "100").await.unwrap();
        }

        let reopened = MemoryStore::open(&path).await.unwrap();
        assert!(reopened.sismember("aww_@chan_posted", "abc").await.unwrap());
        assert_eq!(
            reopened
                .hget("aww_@chan_post_time", "abc")
                .await
                .unwrap()
                .as_deref(),
            Some("100")
        );
    }

    #[tokio::test]
    async fn test_failed_snapshot_write_leaves_state_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("sub");
        let store = MemoryStore::open(&sub.join("store.json")).await.unwrap();

        store.hset("totals", "image", "1").await.unwrap();
        store.sadd("posted", "abc").await.unwrap();

        // A regular file where the snapshot directory should be.
        std::fs::remove_dir_all(&sub).unwrap();
        std::fs::write(&sub, b"not a directory").unwrap();

        assert!(store.hincrby("totals", "image", 1).await.is_err());
        assert_eq!(
            store.hget("totals", "image").await.unwrap().as_deref(),
            Some("1")
        );

        assert!(store.hincrby("fresh", "image", 1).await.is_err());
        assert_eq!(store.hget("fresh", "image").await.unwrap(), None);

        assert!(store.srem("posted", "abc").await.is_err());
        assert!(store.sismember("posted", "abc").await.unwrap());

        assert!(store.del("totals").await.is_err());
        assert_eq!(
            store.hget("totals", "image").await.unwrap().as_deref(),
            Some("1")
        );
    }

    #[tokio::test]
    async fn test_del_removes_key() {
        let store = MemoryStore::new();
        store.hset("h", "f", "v").await.unwrap();

        assert!(store.del("h").await.unwrap());
        assert!(!store.del("h").await.unwrap());
        assert_eq!(store.hget("h", "f").await.unwrap(), None);
    }
}
