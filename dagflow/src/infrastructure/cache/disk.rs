// /////////////////////////////////////////////////////////////////////////////
// dagflow
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Disk Cache Backend
//!
//! Persists each cache entry as two files under a root directory:
//! `<key>.meta.json` (the JSON metadata document -- state blob, metrics,
//! provenance) and `<key>.blob` (the concatenated raw byte arrays, when
//! any are present). No array payloads are modeled by the stages this
//! crate ships, so `<key>.blob` is typically empty, but the split mirrors
//! the cache payload's own `meta`/`arrays` structure.
//!
//! `SharedDiskCacheBackend` wraps this with an advisory `<key>.lock` file
//! held for the duration of a `get`/`put`, so two processes sharing a
//! cache directory don't interleave a read with a concurrent write.

use async_trait::async_trait;
use dagflow_domain::error::EngineError;
use dagflow_domain::repositories::{CacheBackend, CachePayload};
use std::collections::BTreeMap;
use std::path::PathBuf;

pub struct DiskCacheBackend {
    root: PathBuf,
}

impl DiskCacheBackend {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn meta_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.meta.json"))
    }

    fn blob_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.blob"))
    }

    async fn ensure_root(&self) -> Result<(), EngineError> {
        tokio::fs::create_dir_all(&self.root).await.map_err(EngineError::from)
    }
}

/// Wire format of `<key>.meta.json`: the payload's JSON metadata plus an
/// index of byte ranges so `<key>.blob` can hold every array back to
/// back without a separate file per array.
#[derive(serde::Serialize, serde::Deserialize)]
struct DiskMeta {
    meta: serde_json::Map<String, serde_json::Value>,
    array_offsets: BTreeMap<String, (usize, usize)>,
}

#[async_trait]
impl CacheBackend for DiskCacheBackend {
    async fn get(&self, key: &str) -> Result<Option<CachePayload>, EngineError> {
        let meta_path = self.meta_path(key);
        if !meta_path.exists() {
            return Ok(None);
        }

        let meta_bytes = tokio::fs::read(&meta_path).await?;
        let disk_meta: DiskMeta = serde_json::from_slice(&meta_bytes)?;

        let blob_path = self.blob_path(key);
        let blob = if blob_path.exists() { tokio::fs::read(&blob_path).await? } else { Vec::new() };

        let mut arrays = BTreeMap::new();
        for (name, (start, end)) in disk_meta.array_offsets {
            arrays.insert(name, blob.get(start..end).unwrap_or_default().to_vec());
        }

        Ok(Some(CachePayload { meta: disk_meta.meta, arrays }))
    }

    async fn put(&self, key: &str, payload: CachePayload) -> Result<(), EngineError> {
        self.ensure_root().await?;

        let mut blob = Vec::new();
        let mut array_offsets = BTreeMap::new();
        for (name, bytes) in &payload.arrays {
            let start = blob.len();
            blob.extend_from_slice(bytes);
            array_offsets.insert(name.clone(), (start, blob.len()));
        }

        let disk_meta = DiskMeta { meta: payload.meta, array_offsets };
        let meta_bytes = serde_json::to_vec_pretty(&disk_meta)?;

        tokio::fs::write(self.meta_path(key), meta_bytes).await?;
        tokio::fs::write(self.blob_path(key), blob).await?;
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, EngineError> {
        Ok(self.meta_path(key).exists())
    }
}

/// Wraps [`DiskCacheBackend`] with an advisory exclusive file lock per
/// key, held for the duration of each operation.
pub struct SharedDiskCacheBackend {
    inner: DiskCacheBackend,
    root: PathBuf,
}

impl SharedDiskCacheBackend {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self { inner: DiskCacheBackend::new(root.clone()), root }
    }

    fn lock_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.lock"))
    }
}

#[async_trait]
impl CacheBackend for SharedDiskCacheBackend {
    async fn get(&self, key: &str) -> Result<Option<CachePayload>, EngineError> {
        let lock_path = self.lock_path(key);
        let _guard = crate::infrastructure::cache::file_lock::FileLock::acquire(&lock_path).await?;
        self.inner.get(key).await
    }

    async fn put(&self, key: &str, payload: CachePayload) -> Result<(), EngineError> {
        self.inner.ensure_root().await?;
        let lock_path = self.lock_path(key);
        let _guard = crate::infrastructure::cache::file_lock::FileLock::acquire(&lock_path).await?;
        self.inner.put(key, payload).await
    }

    async fn exists(&self, key: &str) -> Result<bool, EngineError> {
        self.inner.exists(key).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_root(label: &str) -> PathBuf {
        std::env::temp_dir().join(format!("dagflow-disk-cache-test-{label}-{}", std::process::id()))
    }

    #[tokio::test]
    async fn put_then_get_round_trips() {
        let root = temp_root("roundtrip");
        let backend = DiskCacheBackend::new(&root);

        let mut meta = serde_json::Map::new();
        meta.insert("state_blob".to_string(), serde_json::json!("abc"));
        let mut payload = CachePayload::new(meta);
        payload.arrays.insert("a".to_string(), vec![1, 2, 3]);

        backend.put("key1", payload.clone()).await.unwrap();
        assert!(backend.exists("key1").await.unwrap());

        let fetched = backend.get("key1").await.unwrap().unwrap();
        assert_eq!(fetched.meta, payload.meta);
        assert_eq!(fetched.arrays.get("a"), Some(&vec![1, 2, 3]));

        tokio::fs::remove_dir_all(&root).await.ok();
    }

    #[tokio::test]
    async fn missing_key_returns_none() {
        let root = temp_root("missing");
        let backend = DiskCacheBackend::new(&root);
        assert_eq!(backend.get("nope").await.unwrap(), None);
    }

    #[tokio::test]
    async fn shared_backend_round_trips_under_lock() {
        let root = temp_root("shared");
        let backend = SharedDiskCacheBackend::new(&root);

        let payload = CachePayload::new(serde_json::Map::new());
        backend.put("key1", payload.clone()).await.unwrap();
        assert_eq!(backend.get("key1").await.unwrap(), Some(payload));

        tokio::fs::remove_dir_all(&root).await.ok();
    }
}
