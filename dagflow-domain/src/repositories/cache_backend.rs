// /////////////////////////////////////////////////////////////////////////////
// dagflow
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Cache Backend Port
//!
//! A generic key/value store keyed by the cache key computed in
//! [`crate::hashing::cache_key`]. The domain knows nothing about disk
//! layout, file locking, or in-memory eviction -- those are infrastructure
//! concerns implemented in the `dagflow` crate's `infrastructure::cache`
//! module (`DiskCacheBackend`, `SharedDiskCacheBackend`,
//! `MemoryCacheBackend`).

use crate::error::EngineError;
use async_trait::async_trait;
use std::collections::BTreeMap;

/// What gets stored under a cache key: a JSON metadata document (state
/// blob, metrics, provenance) plus any raw byte arrays referenced from it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CachePayload {
    pub meta: serde_json::Map<String, serde_json::Value>,
    pub arrays: BTreeMap<String, Vec<u8>>,
}

impl CachePayload {
    pub fn new(meta: serde_json::Map<String, serde_json::Value>) -> Self {
        Self { meta, arrays: BTreeMap::new() }
    }
}

/// Content-addressed get/put/exists port. Implementations must treat a
/// `put` under an existing key as an idempotent overwrite -- the executor
/// relies on re-running a cache miss never corrupting a concurrently
/// readable entry.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<CachePayload>, EngineError>;
    async fn put(&self, key: &str, payload: CachePayload) -> Result<(), EngineError>;
    async fn exists(&self, key: &str) -> Result<bool, EngineError>;
}
