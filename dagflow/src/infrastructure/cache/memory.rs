// /////////////////////////////////////////////////////////////////////////////
// dagflow
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # In-Memory Cache Backend
//!
//! A process-local `CacheBackend` used by tests and by `dagflow run
//! --no-cache`. Nothing here survives the process; it exists so callers
//! who want cache-key-driven dedup within one run don't have to stand up
//! a disk backend.

use async_trait::async_trait;
use dagflow_domain::error::EngineError;
use dagflow_domain::repositories::{CacheBackend, CachePayload};
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Default)]
pub struct MemoryCacheBackend {
    entries: RwLock<HashMap<String, CachePayload>>,
}

impl MemoryCacheBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheBackend for MemoryCacheBackend {
    async fn get(&self, key: &str) -> Result<Option<CachePayload>, EngineError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn put(&self, key: &str, payload: CachePayload) -> Result<(), EngineError> {
        self.entries.write().await.insert(key.to_string(), payload);
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, EngineError> {
        Ok(self.entries.read().await.contains_key(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_then_get_round_trips() {
        let backend = MemoryCacheBackend::new();
        let payload = CachePayload::new(serde_json::Map::new());
        backend.put("k1", payload.clone()).await.unwrap();

        assert!(backend.exists("k1").await.unwrap());
        assert_eq!(backend.get("k1").await.unwrap(), Some(payload));
        assert_eq!(backend.get("missing").await.unwrap(), None);
    }
}
