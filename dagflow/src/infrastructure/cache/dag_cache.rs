// /////////////////////////////////////////////////////////////////////////////
// dagflow
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Dag Cache
//!
//! Typed wrapper over a [`CacheBackend`]: encodes a completed node's
//! [`DagCacheEntry`] into the backend's opaque JSON/bytes shape and
//! decodes it back, so the executor never has to know how a state gets
//! serialized -- only that it does, via `serde`.
//!
//! The state itself is stored base64-encoded under `meta["state_blob"]`;
//! metrics and provenance are stored as plain JSON values alongside it.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use dagflow_domain::cache_entry::DagCacheEntry;
use dagflow_domain::error::EngineError;
use dagflow_domain::repositories::{CacheBackend, CachePayload};
use dagflow_domain::stage::MetricValue;
use dagflow_domain::state::State;
use std::collections::BTreeMap;
use std::sync::Arc;

pub struct DagCache {
    backend: Arc<dyn CacheBackend>,
}

impl DagCache {
    pub fn new(backend: Arc<dyn CacheBackend>) -> Self {
        Self { backend }
    }

    pub async fn get<S: State>(&self, key: &str) -> Result<Option<DagCacheEntry<S>>, EngineError> {
        let Some(payload) = self.backend.get(key).await? else {
            return Ok(None);
        };
        Self::decode(payload).map(Some)
    }

    pub async fn put<S: State>(&self, key: &str, entry: &DagCacheEntry<S>) -> Result<(), EngineError> {
        let payload = Self::encode(entry)?;
        self.backend.put(key, payload).await
    }

    pub async fn exists(&self, key: &str) -> Result<bool, EngineError> {
        self.backend.exists(key).await
    }

    fn encode<S: State>(entry: &DagCacheEntry<S>) -> Result<CachePayload, EngineError> {
        let state_bytes = serde_json::to_vec(&entry.state)?;
        let state_blob = BASE64.encode(state_bytes);

        let metrics_json: BTreeMap<&String, serde_json::Value> =
            entry.metrics.iter().map(|(k, v)| (k, metric_to_json(v))).collect();

        let mut meta = serde_json::Map::new();
        meta.insert("state_blob".to_string(), serde_json::json!(state_blob));
        meta.insert("metrics".to_string(), serde_json::to_value(metrics_json)?);
        meta.insert("provenance".to_string(), serde_json::Value::Object(entry.provenance.clone()));

        Ok(CachePayload::new(meta))
    }

    fn decode<S: State>(payload: CachePayload) -> Result<DagCacheEntry<S>, EngineError> {
        let state_blob = payload
            .meta
            .get("state_blob")
            .and_then(|v| v.as_str())
            .ok_or_else(|| EngineError::Serialization("cache entry missing state_blob".to_string()))?;
        let state_bytes = BASE64
            .decode(state_blob)
            .map_err(|e| EngineError::Serialization(format!("invalid base64 state_blob: {e}")))?;
        let state: S = serde_json::from_slice(&state_bytes)?;

        let metrics: BTreeMap<String, MetricValue> = payload
            .meta
            .get("metrics")
            .cloned()
            .map(json_to_metrics)
            .transpose()?
            .unwrap_or_default();

        let provenance = payload
            .meta
            .get("provenance")
            .and_then(|v| v.as_object())
            .cloned()
            .unwrap_or_default();

        Ok(DagCacheEntry::new(state, metrics, provenance))
    }
}

fn metric_to_json(value: &MetricValue) -> serde_json::Value {
    match value {
        MetricValue::Int(i) => serde_json::json!({"kind": "int", "value": i}),
        MetricValue::Float(f) => serde_json::json!({"kind": "float", "value": f}),
        MetricValue::Bool(b) => serde_json::json!({"kind": "bool", "value": b}),
        MetricValue::Str(s) => serde_json::json!({"kind": "str", "value": s}),
    }
}

fn json_to_metrics(value: serde_json::Value) -> Result<BTreeMap<String, MetricValue>, EngineError> {
    let object = value
        .as_object()
        .ok_or_else(|| EngineError::Serialization("cache metrics field is not an object".to_string()))?;

    let mut metrics = BTreeMap::new();
    for (key, entry) in object {
        let kind = entry.get("kind").and_then(|k| k.as_str()).unwrap_or_default();
        let value = entry.get("value").cloned().unwrap_or(serde_json::Value::Null);
        let metric = match kind {
            "int" => MetricValue::Int(value.as_i64().unwrap_or_default()),
            "float" => MetricValue::Float(value.as_f64().unwrap_or_default()),
            "bool" => MetricValue::Bool(value.as_bool().unwrap_or_default()),
            _ => MetricValue::Str(value.as_str().unwrap_or_default().to_string()),
        };
        metrics.insert(key.clone(), metric);
    }
    Ok(metrics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::cache::memory::MemoryCacheBackend;

    #[derive(Clone, serde::Serialize, serde::Deserialize)]
    struct NumState(i64);

    impl State for NumState {
        fn hashable_repr(&self) -> Vec<u8> {
            self.0.to_le_bytes().to_vec()
        }
    }

    #[tokio::test]
    async fn round_trips_state_metrics_and_provenance() {
        let backend = Arc::new(MemoryCacheBackend::new());
        let cache = DagCache::new(backend);

        let mut metrics = BTreeMap::new();
        metrics.insert("count".to_string(), MetricValue::Int(3));
        metrics.insert("ratio".to_string(), MetricValue::Float(0.5));

        let mut provenance = serde_json::Map::new();
        provenance.insert("source".to_string(), serde_json::json!("test"));

        let entry = DagCacheEntry::new(NumState(42), metrics, provenance);
        cache.put("key1", &entry).await.unwrap();

        let fetched: DagCacheEntry<NumState> = cache.get("key1").await.unwrap().unwrap();
        assert_eq!(fetched.state.0, 42);
        assert_eq!(fetched.metrics.get("count"), Some(&MetricValue::Int(3)));
        assert_eq!(fetched.provenance.get("source"), Some(&serde_json::json!("test")));
    }
}
