// /////////////////////////////////////////////////////////////////////////////
// dagflow
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Policy Bag
//!
//! A flat, order-independent map of per-run overrides (sweep parameters,
//! CLI `--set key=value` flags). Backed by a `BTreeMap` so equal contents
//! always produce equal canonical JSON regardless of insertion order,
//! which is what lets [`crate::hashing::hash_policy`] be a pure function
//! of the entries alone.

use serde::de::DeserializeOwned;
use std::collections::BTreeMap;

/// Order-independent mapping of override keys to arbitrary JSON values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PolicyBag(BTreeMap<String, serde_json::Value>);

impl PolicyBag {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn insert(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.0.insert(key.into(), value);
    }

    pub fn get_raw(&self, key: &str) -> Option<&serde_json::Value> {
        self.0.get(key)
    }

    /// Deserializes the value at `key` into `T`, if present.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.0.get(key).and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &serde_json::Value)> {
        self.0.iter()
    }

    /// Merges `other` over `self`, with `other`'s entries taking
    /// precedence on key collision. Used to layer a sweep's per-point
    /// overrides on top of a run-wide base policy.
    pub fn merged_over(&self, other: &PolicyBag) -> PolicyBag {
        let mut merged = self.0.clone();
        for (k, v) in &other.0 {
            merged.insert(k.clone(), v.clone());
        }
        PolicyBag(merged)
    }

    /// Canonical JSON object for this bag; keys are already sorted since
    /// the backing map is a `BTreeMap`.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(&self.0).unwrap_or(serde_json::Value::Object(Default::default()))
    }
}

impl FromIterator<(String, serde_json::Value)> for PolicyBag {
    fn from_iter<I: IntoIterator<Item = (String, serde_json::Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merged_over_prefers_other() {
        let mut base = PolicyBag::new();
        base.insert("n", serde_json::json!(4));
        let mut overrides = PolicyBag::new();
        overrides.insert("n", serde_json::json!(8));

        let merged = base.merged_over(&overrides);
        assert_eq!(merged.get::<i64>("n"), Some(8));
    }

    #[test]
    fn equal_contents_produce_equal_json_regardless_of_order() {
        let mut a = PolicyBag::new();
        a.insert("z", serde_json::json!(1));
        a.insert("a", serde_json::json!(2));

        let mut b = PolicyBag::new();
        b.insert("a", serde_json::json!(2));
        b.insert("z", serde_json::json!(1));

        assert_eq!(a.to_json(), b.to_json());
    }
}
