// /////////////////////////////////////////////////////////////////////////////
// dagflow
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Content-Addressed Hashing
//!
//! Every digest produced here is a lower-case hex SHA-256 string. This
//! module is the single place that knows how a config, a policy, a state,
//! or a stage result turns into bytes, and how those digests compose into
//! a node's cache key. Reproducibility of the whole engine rests on this
//! file: change anything here and every existing cache entry silently
//! stops matching (which is exactly what bumping [`CACHE_VERSION`] is for).
//!
//! ## Why JSON for config/policy hashing
//!
//! `serde_json::Map` is backed by a `BTreeMap` in this workspace (no crate
//! anywhere enables `preserve_order`), so `serde_json::to_vec` on a `Value`
//! already emits object keys in sorted order. That makes canonicalisation
//! free: we never hand-roll a sorted-keys encoder, we just never opt into
//! the feature that would make `serde_json` stop sorting for us.

use crate::config::StageConfig;
use crate::stage::{ArtifactValue, MetricValue, StageResult};
use crate::state::State;
use crate::value_objects::policy_bag::PolicyBag;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Bumping this string invalidates every existing cache entry. It is the
/// only versioning mechanism the cache key uses -- see `spec.md` §4.1 for
/// the rationale (cheaper than versioning each field independently).
pub const CACHE_VERSION: &str = "dagflow-cache-v1";

fn hex_sha256(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Canonical JSON of a value's field tree, hashed to hex SHA-256.
fn hash_value(value: &serde_json::Value) -> String {
    // `to_vec` is infallible for any `Value` built from well-formed Rust
    // data (no NaN floats survive `Serialize`), so collapsing the error
    // here to an empty-payload hash is acceptable: a malformed value would
    // already have failed at construction time.
    let bytes = serde_json::to_vec(value).unwrap_or_default();
    hex_sha256(&bytes)
}

/// `hash_config(cfg)` -- canonical JSON of the config's field tree, sorted
/// keys, SHA-256.
pub fn hash_config(cfg: &dyn StageConfig) -> String {
    hash_value(&cfg.canonical_json())
}

/// `hash_policy(p)` -- canonical JSON of the policy mapping, SHA-256.
/// Order-independent by construction: `PolicyBag` is backed by a
/// `BTreeMap`, so two policies with the same entries in different
/// insertion order produce the same `Value` and thus the same hash.
pub fn hash_policy(policy: &PolicyBag) -> String {
    hash_value(&policy.to_json())
}

/// `hash_state(s)` -- SHA-256 of `s.hashable_repr()`.
pub fn hash_state<S: State>(state: &S) -> String {
    hex_sha256(&state.hashable_repr())
}

/// `hash_array(a)` -- digest of `dtype || shape || contiguous-bytes`, for
/// numeric-array artifacts alongside scalar metrics. Not used by any
/// stage shipped in this workspace (none produce
/// arrays), but kept as a first-class hashing primitive since artifact
/// values may carry arrays in caller-supplied stages.
pub fn hash_array(dtype: &str, shape: &[usize], bytes: &[u8]) -> String {
    let mut buf = Vec::with_capacity(dtype.len() + shape.len() * 8 + bytes.len());
    buf.extend_from_slice(dtype.as_bytes());
    for dim in shape {
        buf.extend_from_slice(&(*dim as u64).to_le_bytes());
    }
    buf.extend_from_slice(bytes);
    hex_sha256(&buf)
}

fn hash_metric_value(value: &MetricValue) -> serde_json::Value {
    match value {
        MetricValue::Int(i) => serde_json::json!(i),
        MetricValue::Float(f) => serde_json::json!(f),
        MetricValue::Bool(b) => serde_json::json!(b),
        MetricValue::Str(s) => serde_json::json!(s),
    }
}

fn hash_artifact_value(value: &ArtifactValue) -> serde_json::Value {
    match value {
        // Eager artifacts hash their actual content.
        ArtifactValue::Eager(v) => v.clone(),
        // Lazy (callable) artifacts digest their symbolic name, never
        // their identity -- two runs that both defer the same named
        // producer must agree on the hash even though the closures
        // themselves are distinct objects in memory.
        ArtifactValue::Lazy(lazy) => serde_json::json!({ "lazy": lazy.symbolic_name }),
    }
}

/// `hash_stage_result(r)` -- digest of `{state_hash, metrics_value_hash,
/// artifacts_value_hash}`.
pub fn hash_stage_result<S: State>(result: &StageResult<S>) -> String {
    let metrics: BTreeMap<&String, serde_json::Value> =
        result.metrics.iter().map(|(k, v)| (k, hash_metric_value(v))).collect();
    let artifacts: BTreeMap<&String, serde_json::Value> = result
        .artifacts
        .iter()
        .map(|(k, v)| (k, hash_artifact_value(v)))
        .collect();

    let composite = serde_json::json!({
        "state_hash": hash_state(&result.state),
        "metrics": metrics,
        "artifacts": artifacts,
    });
    hash_value(&composite)
}

/// `hash_dependency_results(map)` -- mapping of `dep_id -> hash_stage_result`,
/// keys sorted lexicographically before digesting. `BTreeMap` already
/// iterates in sorted key order, so no explicit sort is needed here.
pub fn hash_dependency_results(results: &BTreeMap<String, String>) -> String {
    hash_value(&serde_json::to_value(results).unwrap_or_default())
}

/// The central formula (`spec.md` §4.1):
///
/// ```text
/// cache_key = SHA256( CACHE_VERSION || node_id || version
///                   || cfg_hash || policy_hash_or_empty
///                   || input_state_hash
///                   || "dep_id:dep_hash" for each dep, sorted by dep_id )
/// ```
///
/// `dep_hashes` must already be keyed by dependency id; iterating a
/// `BTreeMap` yields them in ascending id order, which is what removes
/// nondeterminism from fan-in arrival order.
pub fn cache_key(
    node_id: &str,
    version: &str,
    cfg_hash: &str,
    policy_hash: Option<&str>,
    input_state_hash: &str,
    dep_hashes: &BTreeMap<String, String>,
) -> String {
    let mut buf = String::new();
    buf.push_str(CACHE_VERSION);
    buf.push('\u{1f}');
    buf.push_str(node_id);
    buf.push('\u{1f}');
    buf.push_str(version);
    buf.push('\u{1f}');
    buf.push_str(cfg_hash);
    buf.push('\u{1f}');
    buf.push_str(policy_hash.unwrap_or(""));
    buf.push('\u{1f}');
    buf.push_str(input_state_hash);
    for (dep_id, dep_hash) in dep_hashes {
        buf.push('\u{1f}');
        buf.push_str(dep_id);
        buf.push(':');
        buf.push_str(dep_hash);
    }
    hex_sha256(buf.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value_objects::policy_bag::PolicyBag;
    use proptest::prelude::*;

    #[test]
    fn hash_policy_is_order_independent() {
        let mut a = PolicyBag::new();
        a.insert("n", serde_json::json!(4));
        a.insert("backend", serde_json::json!("cpu"));

        let mut b = PolicyBag::new();
        b.insert("backend", serde_json::json!("cpu"));
        b.insert("n", serde_json::json!(4));

        assert_eq!(hash_policy(&a), hash_policy(&b));
    }

    #[test]
    fn different_policy_values_hash_differently() {
        let mut a = PolicyBag::new();
        a.insert("n", serde_json::json!(4));
        let mut b = PolicyBag::new();
        b.insert("n", serde_json::json!(8));
        assert_ne!(hash_policy(&a), hash_policy(&b));
    }

    #[test]
    fn cache_key_is_deterministic_for_identical_inputs() {
        let deps: BTreeMap<String, String> =
            [("a".to_string(), "h1".to_string()), ("b".to_string(), "h2".to_string())]
                .into_iter()
                .collect();
        let k1 = cache_key("n1", "v1", "cfghash", Some("polhash"), "statehash", &deps);
        let k2 = cache_key("n1", "v1", "cfghash", Some("polhash"), "statehash", &deps);
        assert_eq!(k1, k2);
    }

    #[test]
    fn cache_key_changes_with_policy() {
        let deps = BTreeMap::new();
        let k1 = cache_key("n1", "v1", "cfghash", Some("p4"), "statehash", &deps);
        let k2 = cache_key("n1", "v1", "cfghash", Some("p8"), "statehash", &deps);
        assert_ne!(k1, k2);
    }

    proptest! {
        #[test]
        fn cache_key_is_independent_of_dep_insertion_order(
            a_hash in "[a-f0-9]{8}",
            b_hash in "[a-f0-9]{8}",
        ) {
            let mut deps_fwd = BTreeMap::new();
            deps_fwd.insert("a".to_string(), a_hash.clone());
            deps_fwd.insert("b".to_string(), b_hash.clone());

            let mut deps_rev = BTreeMap::new();
            deps_rev.insert("b".to_string(), b_hash);
            deps_rev.insert("a".to_string(), a_hash);

            let k_fwd = cache_key("n", "v1", "cfg", None, "state", &deps_fwd);
            let k_rev = cache_key("n", "v1", "cfg", None, "state", &deps_rev);
            prop_assert_eq!(k_fwd, k_rev);
        }
    }
}
