// /////////////////////////////////////////////////////////////////////////////
// dagflow
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Executor Configuration
//!
//! `ExecutorConfig` is the top-level settings object a run is built from:
//! resource pool sizes, cache location, retry/timeout policy, and the
//! logging and metrics sub-settings. Loaded through [`ConfigService`],
//! which layers a `dagflow.toml` file (if present) over built-in defaults
//! and then lets `DAGFLOW_*` environment variables override either.

use dagflow_domain::error::EngineError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    pub level: String,
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self { level: "info".to_string(), format: "pretty".to_string() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSettings {
    pub enabled: bool,
    pub port: u16,
}

impl Default for MetricsSettings {
    fn default() -> Self {
        Self { enabled: true, port: 9090 }
    }
}

/// Executor-wide settings, loaded once at process start.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Concurrently runnable CPU-bound jobs.
    pub max_cpu: u32,
    /// Concurrently runnable GPU-bound jobs.
    pub max_gpu: u32,
    /// Root directory for the disk cache backend.
    pub cache_dir: PathBuf,
    /// Retries attempted for a node before the run fails.
    pub retry_limit: u32,
    /// Per-node wall-clock timeout.
    pub node_timeout_secs: u64,
    pub logging: LoggingSettings,
    pub metrics: MetricsSettings,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_cpu: num_cpus_fallback(),
            max_gpu: 0,
            cache_dir: PathBuf::from(".dagflow-cache"),
            retry_limit: 2,
            node_timeout_secs: 3600,
            logging: LoggingSettings::default(),
            metrics: MetricsSettings::default(),
        }
    }
}

/// Avoids a `num_cpus` dependency for a single default value; falls back
/// to 4 when the platform query is unavailable.
fn num_cpus_fallback() -> u32 {
    std::thread::available_parallelism().map(|n| n.get() as u32).unwrap_or(4)
}

/// Loads an [`ExecutorConfig`] from built-in defaults, an optional TOML
/// file, and `DAGFLOW_*` environment overrides.
pub struct ConfigService;

impl ConfigService {
    /// Loads configuration, preferring `config_path` when given and
    /// falling back to defaults (with environment overrides still
    /// applied) when no file exists at that path.
    pub fn load(config_path: Option<&Path>) -> Result<ExecutorConfig, EngineError> {
        let defaults = ExecutorConfig::default();
        let defaults_value = config::Config::try_from(&defaults)
            .map_err(|e| EngineError::invalid_config(format!("failed to seed config defaults: {e}")))?;

        let mut builder = config::Config::builder().add_source(defaults_value);

        if let Some(path) = config_path {
            if path.exists() {
                debug!("loading executor config from {:?}", path);
                builder = builder.add_source(config::File::from(path));
            } else {
                warn!("config file not found at {:?}, using defaults", path);
            }
        }

        let built = builder
            .add_source(config::Environment::with_prefix("DAGFLOW").separator("_"))
            .build()
            .map_err(|e| EngineError::invalid_config(format!("failed to build config: {e}")))?;

        built
            .try_deserialize()
            .map_err(|e| EngineError::invalid_config(format!("failed to deserialize config: {e}")))
    }

    /// Searches the current directory and up to three parent directories
    /// for `dagflow.toml`, loading it if found.
    pub fn load_default() -> Result<ExecutorConfig, EngineError> {
        let mut current_dir = std::env::current_dir()
            .map_err(|e| EngineError::invalid_config(format!("failed to get current directory: {e}")))?;

        for _ in 0..4 {
            let candidate = current_dir.join("dagflow.toml");
            if candidate.exists() {
                return Self::load(Some(&candidate));
            }
            match current_dir.parent() {
                Some(parent) => current_dir = parent.to_path_buf(),
                None => break,
            }
        }

        Self::load(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let cfg = ExecutorConfig::default();
        assert!(cfg.max_cpu >= 1);
        assert_eq!(cfg.max_gpu, 0);
        assert_eq!(cfg.retry_limit, 2);
    }

    #[test]
    fn load_falls_back_to_defaults_when_no_file() {
        let cfg = ConfigService::load(Some(Path::new("/nonexistent/dagflow.toml"))).unwrap();
        assert_eq!(cfg.retry_limit, ExecutorConfig::default().retry_limit);
    }

    #[test]
    fn load_reads_toml_file() {
        let dir = std::env::temp_dir().join(format!("dagflow-cfg-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("dagflow.toml");
        std::fs::write(&path, "max_cpu = 2\nmax_gpu = 1\nretry_limit = 5\n").unwrap();

        let cfg = ConfigService::load(Some(&path)).unwrap();
        assert_eq!(cfg.max_cpu, 2);
        assert_eq!(cfg.max_gpu, 1);
        assert_eq!(cfg.retry_limit, 5);

        std::fs::remove_dir_all(&dir).ok();
    }
}
