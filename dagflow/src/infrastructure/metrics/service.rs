// /////////////////////////////////////////////////////////////////////////////
// dagflow
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Metrics Service
//!
//! Registers and updates the executor's Prometheus metrics: how many
//! nodes ran, how many were served from cache, how long stages took, and
//! how many jobs are in flight. `get_metrics()` renders the current
//! registry in Prometheus text exposition format for [`super::endpoint`]
//! to serve.

use dagflow_domain::error::EngineError;
use prometheus::{Encoder, Gauge, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

pub struct MetricsService {
    registry: Registry,
    pub nodes_executed_total: IntCounter,
    pub cache_hits_total: IntCounter,
    pub cache_misses_total: IntCounter,
    pub node_failures_total: IntCounterVec,
    pub node_duration_seconds: Histogram,
    pub nodes_in_flight: Gauge,
}

impl MetricsService {
    pub fn new() -> Result<Self, EngineError> {
        let registry = Registry::new();

        let nodes_executed_total = IntCounter::with_opts(
            Opts::new("nodes_executed_total", "Total number of nodes executed").namespace("dagflow"),
        )
        .map_err(|e| EngineError::internal(format!("failed to create nodes_executed_total metric: {e}")))?;

        let cache_hits_total = IntCounter::with_opts(
            Opts::new("cache_hits_total", "Total number of cache hits").namespace("dagflow"),
        )
        .map_err(|e| EngineError::internal(format!("failed to create cache_hits_total metric: {e}")))?;

        let cache_misses_total = IntCounter::with_opts(
            Opts::new("cache_misses_total", "Total number of cache misses").namespace("dagflow"),
        )
        .map_err(|e| EngineError::internal(format!("failed to create cache_misses_total metric: {e}")))?;

        let node_failures_total = IntCounterVec::new(
            Opts::new("node_failures_total", "Total number of node failures by category").namespace("dagflow"),
            &["category"],
        )
        .map_err(|e| EngineError::internal(format!("failed to create node_failures_total metric: {e}")))?;

        let node_duration_seconds = Histogram::with_opts(
            HistogramOpts::new("node_duration_seconds", "Time spent executing a single node").namespace("dagflow"),
        )
        .map_err(|e| EngineError::internal(format!("failed to create node_duration_seconds metric: {e}")))?;

        let nodes_in_flight = Gauge::with_opts(
            Opts::new("nodes_in_flight", "Number of nodes currently dispatched to the scheduler")
                .namespace("dagflow"),
        )
        .map_err(|e| EngineError::internal(format!("failed to create nodes_in_flight metric: {e}")))?;

        registry
            .register(Box::new(nodes_executed_total.clone()))
            .map_err(|e| EngineError::internal(format!("failed to register nodes_executed_total: {e}")))?;
        registry
            .register(Box::new(cache_hits_total.clone()))
            .map_err(|e| EngineError::internal(format!("failed to register cache_hits_total: {e}")))?;
        registry
            .register(Box::new(cache_misses_total.clone()))
            .map_err(|e| EngineError::internal(format!("failed to register cache_misses_total: {e}")))?;
        registry
            .register(Box::new(node_failures_total.clone()))
            .map_err(|e| EngineError::internal(format!("failed to register node_failures_total: {e}")))?;
        registry
            .register(Box::new(node_duration_seconds.clone()))
            .map_err(|e| EngineError::internal(format!("failed to register node_duration_seconds: {e}")))?;
        registry
            .register(Box::new(nodes_in_flight.clone()))
            .map_err(|e| EngineError::internal(format!("failed to register nodes_in_flight: {e}")))?;

        Ok(Self {
            registry,
            nodes_executed_total,
            cache_hits_total,
            cache_misses_total,
            node_failures_total,
            node_duration_seconds,
            nodes_in_flight,
        })
    }

    pub fn record_failure(&self, category: &str) {
        self.node_failures_total.with_label_values(&[category]).inc();
    }

    /// Renders the registry in Prometheus text exposition format.
    pub fn get_metrics(&self) -> Result<String, EngineError> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|e| EngineError::internal(format!("failed to encode metrics: {e}")))?;
        String::from_utf8(buffer).map_err(|e| EngineError::internal(format!("non-utf8 metrics output: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_registers_all_metrics_without_error() {
        let service = MetricsService::new().unwrap();
        service.nodes_executed_total.inc();
        service.cache_hits_total.inc();
        service.record_failure("scheduler");

        let rendered = service.get_metrics().unwrap();
        assert!(rendered.contains("dagflow_nodes_executed_total"));
        assert!(rendered.contains("dagflow_cache_hits_total"));
        assert!(rendered.contains("dagflow_node_failures_total"));
    }
}
