//! JSON-file-backed key-value store.
//!
//! Persists the whole map as one JSON object, rewritten on every mutation.
//! Values here are tiny (the window map, a login token), so the
//! read-modify-rewrite cycle is fine; the async mutex keeps concurrent
//! mutations from interleaving their rewrites within one context.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;

use super::KeyValueStore;
use crate::error::PlatformError;

#[derive(Debug)]
pub struct JsonFileKv {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileKv {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    fn load(&self) -> Result<HashMap<String, Value>, PlatformError> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }
        let raw = fs::read(&self.path)?;
        Ok(serde_json::from_slice(&raw)?)
    }

    fn save(&self, entries: &HashMap<String, Value>) -> Result<(), PlatformError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_vec(entries)?)?;
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for JsonFileKv {
    async fn get(&self, key: &str) -> Result<Option<Value>, PlatformError> {
        let _guard = self.lock.lock().await;
        Ok(self.load()?.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), PlatformError> {
        let _guard = self.lock.lock().await;
        let mut entries = self.load()?;
        entries.insert(key.to_string(), value);
        self.save(&entries)
    }

    async fn remove(&self, key: &str) -> Result<(), PlatformError> {
        let _guard = self.lock.lock().await;
        let mut entries = self.load()?;
        if entries.remove(key).is_some() {
            self.save(&entries)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn survives_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("bridge-store.json");

        let kv = JsonFileKv::new(&path);
        kv.set("udomain_ut", json!("tok_abc")).await.expect("set");
        drop(kv);

        let reopened = JsonFileKv::new(&path);
        assert_eq!(
            reopened.get("udomain_ut").await.expect("get"),
            Some(json!("tok_abc"))
        );
    }

    #[tokio::test]
    async fn missing_file_reads_as_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let kv = JsonFileKv::new(dir.path().join("never-written.json"));
        assert_eq!(kv.get("anything").await.expect("get"), None);
        kv.remove("anything").await.expect("remove on empty is ok");
    }

    #[tokio::test]
    async fn remove_deletes_only_named_key() {
        let dir = tempfile::tempdir().expect("tempdir");
        let kv = JsonFileKv::new(dir.path().join("store.json"));
        kv.set("a", json!(1)).await.expect("set a");
        kv.set("b", json!(2)).await.expect("set b");
        kv.remove("a").await.expect("remove a");
        assert_eq!(kv.get("a").await.expect("get a"), None);
        assert_eq!(kv.get("b").await.expect("get b"), Some(json!(2)));
    }

    #[tokio::test]
    async fn corrupt_file_surfaces_as_error_not_panic() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("store.json");
        fs::write(&path, b"{ not json").expect("write corrupt file");

        let kv = JsonFileKv::new(&path);
        assert!(kv.get("k").await.is_err());
    }
}
